mod commands;
mod terminal;

use std::process::ExitCode;
use std::time::Duration;

use commands::{CommandLine, Commands, sweep, verify};
use terminal::logging;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let commands = CommandLine::parse_args();

    logging::init(commands.quiet, commands.verbose);

    match commands.command {
        Commands::Sweep(args) => {
            sweep::sweep(args, commands.quiet).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Verify { url, timeout, decoder } => {
            let working = verify::verify(&url, Duration::from_secs(timeout), decoder, commands.quiet).await?;
            Ok(if working { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}
