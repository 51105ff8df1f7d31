//! Resolved pipeline configuration.
//!
//! CLI flags win; empty flags fall back to environment variables. Required
//! values are checked here so a missing key fails before any side effect.
use secrecy::SecretString;
use std::{env, path::PathBuf, time::Duration};
use url::Url;

use crate::{
    cli::{BuildArgs, PushArgs},
    completion::config::{CompletionConfig, CompletionMode},
    container::{buildx::DEFAULT_PLATFORMS, credentials::ExplicitCredentials},
    error::{AutoshipError, Result},
    forge::config::RemoteConfig,
    git::RepoRef,
};

pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";
pub const GITHUB_REPOSITORY_VAR: &str = "GITHUB_REPOSITORY";
pub const APP_NAME_VAR: &str = "APP_NAME";
pub const DOCKER_REPO_VAR: &str = "DOCKER_REPO";
pub const BUILDER_NAME_VAR: &str = "BUILDER_NAME";
pub const REGISTRY_USERNAME_VAR: &str = "REGISTRY_USERNAME";
pub const REGISTRY_PASSWORD_VAR: &str = "REGISTRY_PASSWORD";
pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";

/// Settings shared by both pipelines.
#[derive(Debug, Clone, Copy)]
pub struct GlobalOptions {
    pub debug: bool,
    pub dry_run: bool,
    pub http_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct PushConfig {
    pub mainline: String,
    pub remote: String,
    /// Explicit owner/repo; the git remote is parsed when unset.
    pub repository: Option<RepoRef>,
    pub github_host: String,
    pub forge: RemoteConfig,
    pub completion: CompletionConfig,
    pub changelog_path: PathBuf,
    pub strip_prefixes: Vec<String>,
    pub verbose: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub app_name: String,
    pub docker_repo: String,
    pub builder_name: String,
    pub platforms: Vec<String>,
    pub version_file: PathBuf,
    pub context: String,
    pub credentials: ExplicitCredentials,
    pub docker_config: Option<PathBuf>,
    pub require_registry_auth: bool,
    pub remove_builder: bool,
    pub docker_bin: String,
    pub dry_run: bool,
}

/// `--debug`, or `LOG_LEVEL=DEBUG` in the environment.
pub fn debug_enabled(flag: bool) -> bool {
    flag || env::var(LOG_LEVEL_VAR)
        .is_ok_and(|level| level.trim().eq_ignore_ascii_case("debug"))
}

/// Flag value when set, else the non-empty environment variable.
fn flag_or_env(flag: &str, var: &str) -> Option<String> {
    if !flag.is_empty() {
        return Some(flag.to_string());
    }

    env::var(var).ok().filter(|value| !value.is_empty())
}

fn required(flag: &str, var: &str, option: &str) -> Result<String> {
    flag_or_env(flag, var).ok_or_else(|| {
        AutoshipError::invalid_config(format!(
            "{var} is not set: use --{option} or the {var} env var"
        ))
    })
}

fn parse_url(value: &str, option: &str) -> Result<Url> {
    Url::parse(value).map_err(|err| {
        AutoshipError::invalid_config(format!(
            "--{option} \"{value}\" is not a valid url: {err}"
        ))
    })
}

impl PushConfig {
    pub fn from_args(args: &PushArgs, global: GlobalOptions) -> Result<Self> {
        let api_key = required(
            &args.openai_api_key,
            OPENAI_API_KEY_VAR,
            "openai-api-key",
        )?;
        let token =
            required(&args.github_token, GITHUB_TOKEN_VAR, "github-token")?;

        let repository = flag_or_env(&args.github_repo, GITHUB_REPOSITORY_VAR)
            .map(|value| value.parse::<RepoRef>())
            .transpose()?;

        if args.mainline.trim().is_empty() {
            return Err(AutoshipError::invalid_config(
                "--mainline must not be empty",
            ));
        }

        let mode = if args.legacy_completions {
            CompletionMode::Legacy
        } else {
            CompletionMode::Chat
        };

        Ok(Self {
            mainline: args.mainline.clone(),
            remote: args.remote.clone(),
            repository,
            github_host: args.github_host.clone(),
            forge: RemoteConfig {
                api_url: parse_url(&args.github_api_url, "github-api-url")?,
                token: SecretString::from(token),
                timeout: global.http_timeout,
                dry_run: global.dry_run,
            },
            completion: CompletionConfig {
                api_url: parse_url(&args.openai_api_url, "openai-api-url")?,
                api_key: SecretString::from(api_key),
                model: args.openai_model.clone(),
                mode,
                timeout: global.http_timeout,
            },
            changelog_path: PathBuf::from(&args.changelog),
            strip_prefixes: args.strip_prefixes.clone(),
            verbose: args.verbose || debug_enabled(global.debug),
            dry_run: global.dry_run,
        })
    }
}

impl BuildConfig {
    pub fn from_args(args: &BuildArgs, global: GlobalOptions) -> Result<Self> {
        let app_name = required(&args.app_name, APP_NAME_VAR, "app-name")?;
        let docker_repo =
            required(&args.docker_repo, DOCKER_REPO_VAR, "docker-repo")?;
        let docker_repo = docker_repo.trim_end_matches('/').to_string();

        let builder_name = flag_or_env(&args.builder_name, BUILDER_NAME_VAR)
            .unwrap_or_else(|| app_name.clone());

        let platforms = if args.platforms.is_empty() {
            DEFAULT_PLATFORMS.iter().map(|p| p.to_string()).collect()
        } else {
            args.platforms.clone()
        };

        let credentials = ExplicitCredentials {
            username: flag_or_env(
                &args.registry_username,
                REGISTRY_USERNAME_VAR,
            ),
            password: flag_or_env(
                &args.registry_password,
                REGISTRY_PASSWORD_VAR,
            )
            .map(SecretString::from),
        };

        let docker_config = (!args.docker_config.is_empty())
            .then(|| PathBuf::from(&args.docker_config));

        Ok(Self {
            app_name,
            docker_repo,
            builder_name,
            platforms,
            version_file: PathBuf::from(&args.version_file),
            context: args.context.clone(),
            credentials,
            docker_config,
            require_registry_auth: args.require_registry_auth,
            remove_builder: args.remove_builder,
            docker_bin: args.docker_bin.clone(),
            dry_run: global.dry_run,
        })
    }

    /// Image name without a tag, e.g. `ghcr.io/octo/app`.
    pub fn image(&self) -> String {
        format!("{}/{}", self.docker_repo, self.app_name)
    }
}
