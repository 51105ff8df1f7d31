use base64::{Engine, prelude::BASE64_STANDARD};
use log::*;
use secrecy::SecretString;
use serde::Deserialize;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::error::{AutoshipError, Result};

/// Registry assumed when the repository has no explicit host.
pub const DEFAULT_REGISTRY: &str = "docker.io";
const DOCKER_HUB_KEYS: [&str; 3] = [
    "https://index.docker.io/v1/",
    "index.docker.io",
    "registry-1.docker.io",
];

/// Subset of `~/.docker/config.json` used to find registry credentials.
#[derive(Debug, Default, Deserialize)]
pub struct DockerConfigFile {
    #[serde(default)]
    pub auths: HashMap<String, AuthEntry>,
    #[serde(rename = "credsStore")]
    pub creds_store: Option<String>,
    #[serde(rename = "credHelpers", default)]
    pub cred_helpers: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthEntry {
    pub username: Option<String>,
    pub password: Option<String>,
    /// base64 of `username:password`
    pub auth: Option<String>,
}

/// How the build pipeline authenticates against the registry.
#[derive(Debug)]
pub enum RegistryAuth {
    /// Run `docker login` with these credentials.
    Login {
        registry: String,
        username: String,
        password: SecretString,
    },
    /// The engine's credential store already holds a session.
    ExistingSession { registry: String },
    /// No credentials anywhere and none required.
    Anonymous,
}

/// Credentials supplied on the command line or through the environment.
#[derive(Debug, Default, Clone)]
pub struct ExplicitCredentials {
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

/// Registry host of an image repository such as `ghcr.io/octo` or
/// `localhost:5000/team`. Bare Docker Hub namespaces map to `docker.io`.
pub fn registry_host(repository: &str) -> &str {
    match repository.split_once('/') {
        Some((first, _))
            if first.contains('.')
                || first.contains(':')
                || first == "localhost" =>
        {
            first
        }
        _ => DEFAULT_REGISTRY,
    }
}

/// `--docker-config`, else `$DOCKER_CONFIG/config.json`, else
/// `~/.docker/config.json`.
pub fn docker_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(dir) = std::env::var("DOCKER_CONFIG")
        && !dir.is_empty()
    {
        return Some(Path::new(&dir).join("config.json"));
    }

    dirs::home_dir().map(|home| home.join(".docker").join("config.json"))
}

/// Load the Docker config file. A missing file is not an error.
pub async fn load_docker_config(
    path: &Path,
) -> Result<Option<DockerConfigFile>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("no docker config at {}", path.display());
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };

    let config = serde_json::from_str(&content).map_err(|err| {
        AutoshipError::invalid_config(format!(
            "unable to parse docker config {}: {err}",
            path.display()
        ))
    })?;

    Ok(Some(config))
}

impl DockerConfigFile {
    fn has_credential_store(&self, registry: &str) -> bool {
        self.creds_store.as_deref().is_some_and(|s| !s.is_empty())
            || self.cred_helpers.contains_key(registry)
    }

    fn find_entry(&self, repository: &str) -> Option<(&str, &AuthEntry)> {
        let registry = registry_host(repository);
        let mut keys = vec![
            repository.to_string(),
            registry.to_string(),
            format!("https://{registry}"),
        ];
        if registry == DEFAULT_REGISTRY {
            keys.extend(DOCKER_HUB_KEYS.iter().map(|k| k.to_string()));
        }

        keys.iter().find_map(|key| {
            self.auths
                .get_key_value(key.as_str())
                .map(|(k, v)| (k.as_str(), v))
        })
    }
}

impl AuthEntry {
    fn credentials(&self) -> Result<Option<(String, SecretString)>> {
        if let (Some(user), Some(pass)) =
            (self.username.as_deref(), self.password.as_deref())
            && !user.is_empty()
            && !pass.is_empty()
        {
            let password = SecretString::from(pass.to_string());
            return Ok(Some((user.to_string(), password)));
        }

        let Some(encoded) = self.auth.as_deref().filter(|a| !a.is_empty())
        else {
            return Ok(None);
        };

        let decoded = BASE64_STANDARD.decode(encoded).map_err(|err| {
            AutoshipError::invalid_config(format!(
                "docker config auth field is not valid base64: {err}"
            ))
        })?;
        let decoded = String::from_utf8(decoded).map_err(|err| {
            AutoshipError::invalid_config(format!(
                "docker config auth field is not utf-8: {err}"
            ))
        })?;

        match decoded.split_once(':') {
            Some((user, pass)) if !user.is_empty() && !pass.is_empty() => Ok(
                Some((user.to_string(), SecretString::from(pass.to_string()))),
            ),
            _ => Err(AutoshipError::invalid_config(
                "docker config auth field must encode username:password",
            )),
        }
    }
}

/// Decide how to authenticate against the registry of `repository`.
///
/// Explicit credentials win over the Docker config file. This never touches
/// the network so it can fail before anything is built.
pub fn resolve_registry_auth(
    repository: &str,
    explicit: &ExplicitCredentials,
    docker_config: Option<&DockerConfigFile>,
    require_auth: bool,
) -> Result<RegistryAuth> {
    let registry = registry_host(repository).to_string();

    match (&explicit.username, &explicit.password) {
        (Some(username), Some(password)) => {
            return Ok(RegistryAuth::Login {
                registry,
                username: username.clone(),
                password: password.clone(),
            });
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err(AutoshipError::invalid_config(
                "registry username and password must be set together",
            ));
        }
        (None, None) => {}
    }

    if let Some(config) = docker_config
        && let Some((key, entry)) = config.find_entry(repository)
    {
        if let Some((username, password)) = entry.credentials()? {
            debug!("using docker config credentials for {key}");
            return Ok(RegistryAuth::Login {
                registry,
                username,
                password,
            });
        }

        if config.has_credential_store(&registry) {
            debug!("{key} is managed by a docker credential store");
            return Ok(RegistryAuth::ExistingSession { registry });
        }

        return Err(AutoshipError::invalid_config(format!(
            "docker config has an entry for {key} but no login credentials"
        )));
    }

    if require_auth {
        return Err(AutoshipError::invalid_config(format!(
            "registry {registry} requires authentication but no credentials are configured: \
             set REGISTRY_USERNAME and REGISTRY_PASSWORD or run docker login"
        )));
    }

    Ok(RegistryAuth::Anonymous)
}
