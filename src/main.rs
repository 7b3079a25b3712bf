use clap::Parser;
use sdkgen::cli::{run_cli, Cli};
use sdkgen::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::from_env()
    };
    init_logging(&config)?;
    run_cli(cli)
}
