use log::*;
use secrecy::SecretString;

use crate::{
    error::{AutoshipError, Result},
    process::{CommandOutput, CommandRunner, CommandSpec},
};

/// Platforms built when none are configured.
pub const DEFAULT_PLATFORMS: [&str; 2] = ["linux/amd64", "linux/arm64"];

/// A single cross-platform build that pushes every tag it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub platforms: Vec<String>,
    pub tags: Vec<String>,
    pub context: String,
}

impl BuildRequest {
    fn args(&self) -> Vec<String> {
        let mut args = vec![
            "buildx".to_string(),
            "build".to_string(),
            "--platform".to_string(),
            self.platforms.join(","),
        ];
        for tag in self.tags.iter() {
            args.push("--tag".into());
            args.push(tag.clone());
        }
        args.push("--push".into());
        args.push(self.context.clone());
        args
    }
}

pub struct Buildx {
    runner: Box<dyn CommandRunner>,
    program: String,
    dry_run: bool,
}

impl Buildx {
    pub fn new(
        runner: Box<dyn CommandRunner>,
        program: impl Into<String>,
        dry_run: bool,
    ) -> Self {
        Self {
            runner,
            program: program.into(),
            dry_run,
        }
    }

    fn spec<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new(&self.program, args)
    }

    async fn run_checked(&self, spec: CommandSpec) -> Result<CommandOutput> {
        self.runner.run(&spec).await?.check(&spec)
    }

    /// Skip a mutating call in dry-run mode, logging what would have run.
    fn skipped(&self, spec: &CommandSpec) -> bool {
        if self.dry_run {
            warn!("dry_run: would run: {spec}");
        }
        self.dry_run
    }

    /// `buildx version`; any failure means buildx is unusable.
    pub async fn version(&self) -> Result<String> {
        let spec = self.spec(["buildx", "version"]);
        let unavailable = |detail: String| {
            AutoshipError::environment(format!(
                "docker buildx not available, install it first: {detail}"
            ))
        };

        let output = self
            .runner
            .run(&spec)
            .await
            .map_err(|err| unavailable(err.to_string()))?;

        if !output.success() {
            return Err(unavailable(output.stderr.trim().to_string()));
        }

        Ok(output.stdout.trim().to_string())
    }

    pub async fn builder_exists(&self, name: &str) -> Result<bool> {
        let spec = self.spec(["buildx", "inspect", name]);
        let output = self.runner.run(&spec).await?;
        Ok(output.success())
    }

    pub async fn create_builder(&self, name: &str) -> Result<()> {
        let spec = self.spec(["buildx", "create", "--name", name]);
        if self.skipped(&spec) {
            return Ok(());
        }
        self.run_checked(spec).await?;
        Ok(())
    }

    pub async fn use_builder(&self, name: &str) -> Result<()> {
        let spec = self.spec(["buildx", "use", name]);
        if self.skipped(&spec) {
            return Ok(());
        }
        self.run_checked(spec).await?;
        Ok(())
    }

    /// Start the currently selected builder.
    pub async fn bootstrap(&self) -> Result<()> {
        let spec = self.spec(["buildx", "inspect", "--bootstrap"]);
        if self.skipped(&spec) {
            return Ok(());
        }
        self.run_checked(spec).await?;
        Ok(())
    }

    pub async fn remove_builder(&self, name: &str) -> Result<()> {
        let spec = self.spec(["buildx", "rm", name]);
        if self.skipped(&spec) {
            return Ok(());
        }
        self.run_checked(spec).await?;
        Ok(())
    }

    /// `login --password-stdin`; the password never appears in argv.
    pub async fn login(
        &self,
        registry: &str,
        username: &str,
        password: SecretString,
    ) -> Result<()> {
        let args =
            ["login", "--username", username, "--password-stdin", registry];
        let spec = self.spec(args).with_stdin(password);
        if self.skipped(&spec) {
            return Ok(());
        }

        let output = self.runner.run(&spec).await?;
        if !output.success() {
            return Err(AutoshipError::CommandFailed {
                command: spec.to_string(),
                code: output.code,
                stderr: format!(
                    "docker login failed, check your credentials: {}",
                    output.stderr.trim()
                ),
            });
        }

        Ok(())
    }

    pub async fn build_and_push(&self, req: &BuildRequest) -> Result<()> {
        let spec = self.spec(req.args());
        if self.skipped(&spec) {
            return Ok(());
        }

        info!("running: {spec}");
        self.run_checked(spec).await?;
        Ok(())
    }
}
