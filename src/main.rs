use autoship::{
    Args, Command,
    command::{build, push},
    config::{GlobalOptions, debug_enabled},
};
use clap::Parser;
use color_eyre::eyre::Result;
use std::time::Duration;

fn initialize_logger(debug: bool) -> Result<()> {
    let filter = if debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("autoship")
        .build();

    simplelog::TermLogger::init(
        filter,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli_args = Args::parse();

    let debug = debug_enabled(cli_args.debug);
    initialize_logger(debug)?;

    let global = GlobalOptions {
        debug,
        dry_run: cli_args.dry_run,
        http_timeout: Duration::from_secs(cli_args.http_timeout),
    };

    match &cli_args.command {
        Command::Push(args) => push::execute(args, global).await?,
        Command::Build(args) => build::execute(args, global).await?,
    }

    Ok(())
}
