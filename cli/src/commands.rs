pub mod sweep;
pub mod verify;

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};

use camsweep_common::config::{self, DEFAULT_ADDRESS, DEFAULT_DECODER, DEFAULT_PATHS, DEFAULT_PORTS, ScanSettings};
use camsweep_common::error::ScanError;
use camsweep_common::models::{Credential, PathTemplate};

#[derive(Parser)]
#[command(name = "camsweep")]
#[command(version, about = "Finds RTSP cameras on a network and checks which streams actually play.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Less output (-q hides headers, -qq prints only working URLs)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true, conflicts_with = "quiet")]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sweep an address range for cameras and verify their streams
    #[command(alias = "s")]
    Sweep(SweepArgs),
    /// Try to grab one frame from a single RTSP URL
    #[command(alias = "v")]
    Verify {
        url: String,

        /// Seconds to wait for a frame
        #[arg(short, long, default_value_t = 10)]
        timeout: u64,

        /// Decoder binary
        #[arg(long, default_value = DEFAULT_DECODER)]
        decoder: PathBuf,
    },
}

#[derive(Args)]
pub struct SweepArgs {
    /// Address, CIDR block, range or comma separated list
    #[arg(short, long, default_value = DEFAULT_ADDRESS)]
    pub address: String,

    /// Ports to sweep, e.g. 554,8554,8000-8010
    #[arg(short, long, default_value = DEFAULT_PORTS)]
    pub ports: String,

    /// Credentials as user:pass, comma separated. Without this flag one
    /// anonymous attempt is made; with it, anonymous is tried only if `none`
    /// is listed
    #[arg(short, long)]
    pub credentials: Option<String>,

    /// Stream paths, comma separated
    #[arg(short = 'P', long, default_value = DEFAULT_PATHS, hide_default_value = true)]
    pub paths: String,

    /// Milliseconds allowed for each TCP connect during the sweep
    #[arg(long, default_value_t = 1000)]
    pub connect_timeout: u64,

    /// Seconds allowed for each probe and each frame grab
    #[arg(short, long, default_value_t = 10)]
    pub timeout: u64,

    /// Extra probe attempts after a failure
    #[arg(short, long, default_value_t = 1)]
    pub retries: u32,

    /// Maximum concurrent connections and decoder processes
    #[arg(short, long, default_value_t = 50)]
    pub workers: usize,

    /// Write the report as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Decoder binary
    #[arg(long, default_value = DEFAULT_DECODER)]
    pub decoder: PathBuf,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl SweepArgs {
    pub fn to_settings(&self) -> Result<ScanSettings, ScanError> {
        let credentials = match &self.credentials {
            Some(list) => Credential::parse_list(list)?,
            None => Vec::new(),
        };
        let per_attempt = Duration::from_secs(self.timeout);

        let settings = ScanSettings {
            address: self.address.clone(),
            ports: config::parse_ports(&self.ports)?,
            credentials,
            paths: PathTemplate::parse_list(&self.paths),
            connect_timeout: Duration::from_millis(self.connect_timeout),
            probe_timeout: per_attempt,
            verify_timeout: per_attempt,
            retries: self.retries,
            workers: self.workers,
            decoder: self.decoder.clone(),
        };
        settings.validate()?;
        Ok(settings)
    }
}
