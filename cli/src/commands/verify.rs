use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use colored::*;
use tracing::warn;

use camsweep_common::success;
use camsweep_core::decoder::{FfmpegDecoder, FrameDecoder};
use camsweep_core::verifier::StreamVerifier;

use crate::terminal::{colors, print};

pub async fn verify(url: &str, timeout: Duration, decoder: PathBuf, quiet: u8) -> anyhow::Result<bool> {
    let decoder = Arc::new(FfmpegDecoder::new(decoder));
    decoder.ensure_available().await?;

    print::header("stream check", quiet);
    print::aligned_line("URL", url.color(colors::URL));
    print::aligned_line("Timeout", format!("{}s", timeout.as_secs()));

    let verifier = StreamVerifier::new(decoder, timeout);
    match verifier.check_url(url).await {
        Ok(capture) => {
            success!("Stream is working, grabbed a {} byte frame", capture.bytes);
            Ok(true)
        }
        Err(failure) => {
            warn!("No frame from {url}: {failure}");
            Ok(false)
        }
    }
}
