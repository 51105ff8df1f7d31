//! CLI argument parsing.
use clap::{Parser, Subcommand};

use crate::{
    changelog::DEFAULT_CHANGELOG_FILE,
    completion::config::{DEFAULT_COMPLETION_API_URL, DEFAULT_MODEL},
    forge::config::{DEFAULT_GITHUB_API_URL, DEFAULT_GITHUB_HOST},
    version::DEFAULT_VERSION_FILE,
};

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Global CLI arguments shared by every subcommand.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, default_value_t = false, global = true)]
    /// Enable debug logging. Also enabled by LOG_LEVEL=DEBUG.
    pub debug: bool,

    #[arg(long, default_value_t = false, global = true)]
    /// Log every mutating git, docker and API call instead of running it.
    pub dry_run: bool,

    #[arg(long, default_value_t = DEFAULT_HTTP_TIMEOUT_SECS, global = true)]
    /// Timeout in seconds for each HTTP request.
    pub http_timeout: u64,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Release workflow subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Commit, push and open a pull request, or tag a release on mainline.
    Push(PushArgs),

    /// Build and push a multi-arch image, then bump VERSION.
    Build(BuildArgs),
}

#[derive(clap::Args, Debug)]
pub struct PushArgs {
    #[arg(long, default_value = "main")]
    /// Branch that releases are tagged from and pull requests target.
    pub mainline: String,

    #[arg(long, default_value = "origin")]
    /// Git remote to read the repository from and push to.
    pub remote: String,

    #[arg(long, default_value = "")]
    /// Repository as owner/repo. Falls back to GITHUB_REPOSITORY env var,
    /// then to the remote url.
    pub github_repo: String,

    #[arg(long, default_value = "")]
    /// GitHub access token. Falls back to GITHUB_TOKEN env var.
    pub github_token: String,

    #[arg(long, default_value = DEFAULT_GITHUB_API_URL)]
    /// GitHub REST API root.
    pub github_api_url: String,

    #[arg(long, default_value = DEFAULT_GITHUB_HOST)]
    /// Host name that remote urls must point at.
    pub github_host: String,

    #[arg(long, default_value = "")]
    /// OpenAI API key. Falls back to OPENAI_API_KEY env var.
    pub openai_api_key: String,

    #[arg(long, default_value = DEFAULT_COMPLETION_API_URL)]
    /// Completion API root.
    pub openai_api_url: String,

    #[arg(long, default_value = DEFAULT_MODEL)]
    /// Model used to write commit messages.
    pub openai_model: String,

    #[arg(long, default_value_t = false)]
    /// Use the legacy `/completions` endpoint instead of chat.
    pub legacy_completions: bool,

    #[arg(long, default_value = DEFAULT_CHANGELOG_FILE)]
    /// Changelog file, rewritten on every branch push.
    pub changelog: String,

    #[arg(long = "strip-prefix", default_values_t = vec!["aider: ".to_string()])]
    /// Prefix removed from commit subjects in the changelog. Repeatable.
    pub strip_prefixes: Vec<String>,

    #[arg(long, default_value_t = false)]
    /// Log the full diff against mainline.
    pub verbose: bool,
}

#[derive(clap::Args, Debug)]
pub struct BuildArgs {
    #[arg(long, default_value = "")]
    /// Application name, used as the image name. Falls back to APP_NAME env
    /// var.
    pub app_name: String,

    #[arg(long, default_value = "")]
    /// Image repository, e.g. ghcr.io/octo. Falls back to DOCKER_REPO env
    /// var.
    pub docker_repo: String,

    #[arg(long, default_value = "")]
    /// buildx builder name. Falls back to BUILDER_NAME env var, then to the
    /// app name.
    pub builder_name: String,

    #[arg(long = "platform")]
    /// Target platform. Repeatable; defaults to linux/amd64 and linux/arm64.
    pub platforms: Vec<String>,

    #[arg(long, default_value = DEFAULT_VERSION_FILE)]
    /// Version counter file.
    pub version_file: String,

    #[arg(long, default_value = ".")]
    /// Build context.
    pub context: String,

    #[arg(long, default_value = "")]
    /// Registry username. Falls back to REGISTRY_USERNAME env var.
    pub registry_username: String,

    #[arg(long, default_value = "")]
    /// Registry password. Falls back to REGISTRY_PASSWORD env var.
    pub registry_password: String,

    #[arg(long, default_value = "")]
    /// Docker config file holding registry credentials.
    pub docker_config: String,

    #[arg(long, default_value_t = false)]
    /// Fail before building when no registry credentials can be found.
    pub require_registry_auth: bool,

    #[arg(long, default_value_t = false)]
    /// Remove the builder after a successful build.
    pub remove_builder: bool,

    #[arg(long, default_value = "docker")]
    /// Container engine binary.
    pub docker_bin: String,
}
