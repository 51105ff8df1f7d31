//! Build pipeline for the `build` subcommand.
use log::*;

use crate::{
    cli::BuildArgs,
    config::{BuildConfig, GlobalOptions},
    container::{
        buildx::{BuildRequest, Buildx},
        credentials::{self, DockerConfigFile, RegistryAuth},
    },
    error::Result,
    process::SystemRunner,
    version::Version,
};

/// Tag pushed alongside the version tag.
pub const LATEST_TAG: &str = "latest";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    /// Version the image was built as.
    pub version: Version,
    /// Version now stored in the version file.
    pub next_version: Version,
    pub tags: Vec<String>,
}

pub struct BuildPipeline<'a> {
    config: &'a BuildConfig,
    buildx: Buildx,
    docker_config: Option<DockerConfigFile>,
}

impl<'a> BuildPipeline<'a> {
    pub fn new(
        config: &'a BuildConfig,
        buildx: Buildx,
        docker_config: Option<DockerConfigFile>,
    ) -> Self {
        Self {
            config,
            buildx,
            docker_config,
        }
    }

    /// Image tags for `version`: the version itself and `latest`.
    pub fn tags(&self, version: &Version) -> Vec<String> {
        let image = self.config.image();
        vec![format!("{image}:{version}"), format!("{image}:{LATEST_TAG}")]
    }

    /// The version file is only written after the image was pushed; any
    /// earlier failure leaves it untouched.
    pub async fn run(&self) -> Result<BuildOutcome> {
        let version = Version::read(&self.config.version_file).await?;
        let next_version = version.increment()?;
        info!("building {} version {version}", self.config.image());

        let auth = credentials::resolve_registry_auth(
            &self.config.docker_repo,
            &self.config.credentials,
            self.docker_config.as_ref(),
            self.config.require_registry_auth,
        )?;

        let buildx_version = self.buildx.version().await?;
        debug!("using {buildx_version}");

        self.ensure_builder().await?;
        self.authenticate(auth).await?;

        let tags = self.tags(&version);
        let req = BuildRequest {
            platforms: self.config.platforms.clone(),
            tags: tags.clone(),
            context: self.config.context.clone(),
        };
        self.buildx.build_and_push(&req).await?;
        info!("pushed {}", tags.join(", "));

        if self.config.dry_run {
            warn!(
                "dry_run: would write version {next_version} to {}",
                self.config.version_file.display()
            );
        } else {
            next_version.write(&self.config.version_file).await?;
            info!(
                "bumped {} to {next_version}",
                self.config.version_file.display()
            );
        }

        if self.config.remove_builder
            && let Err(err) =
                self.buildx.remove_builder(&self.config.builder_name).await
        {
            warn!(
                "unable to remove builder {}: {err}",
                self.config.builder_name
            );
        }

        Ok(BuildOutcome {
            version,
            next_version,
            tags,
        })
    }

    /// Create the builder only when missing, then select and start it.
    async fn ensure_builder(&self) -> Result<()> {
        let name = self.config.builder_name.as_str();

        if self.buildx.builder_exists(name).await? {
            info!("using existing builder: {name}");
        } else {
            info!("creating builder: {name}");
            self.buildx.create_builder(name).await?;
        }

        self.buildx.use_builder(name).await?;
        self.buildx.bootstrap().await
    }

    async fn authenticate(&self, auth: RegistryAuth) -> Result<()> {
        match auth {
            RegistryAuth::Login {
                registry,
                username,
                password,
            } => {
                info!("logging in to {registry} as {username}");
                self.buildx.login(&registry, &username, password).await
            }
            RegistryAuth::ExistingSession { registry } => {
                info!("using existing docker session for {registry}");
                Ok(())
            }
            RegistryAuth::Anonymous => {
                warn!("no registry credentials found: pushing without login");
                Ok(())
            }
        }
    }
}

/// Execute the build pipeline with the real container engine.
pub async fn execute(args: &BuildArgs, global: GlobalOptions) -> Result<()> {
    let config = BuildConfig::from_args(args, global)?;

    let docker_config =
        match credentials::docker_config_path(config.docker_config.as_deref()) {
            Some(path) => credentials::load_docker_config(&path).await?,
            None => None,
        };

    let buildx =
        Buildx::new(Box::new(SystemRunner), &config.docker_bin, config.dry_run);
    let pipeline = BuildPipeline::new(&config, buildx, docker_config);

    let outcome = pipeline.run().await?;
    info!(
        "released {} as {}; next version is {}",
        config.image(),
        outcome.version,
        outcome.next_version
    );

    Ok(())
}
