use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Context;
use colored::*;
use tracing::{Instrument, info_span, warn};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use camsweep_common::config::ScanSettings;
use camsweep_common::models::{ScanReport, VerifiedStream};
use camsweep_common::success;
use camsweep_core::{CancellationToken, Discovery};

use crate::commands::SweepArgs;
use crate::mprint;
use crate::terminal::{colors, print, progress};

pub async fn sweep(args: SweepArgs, quiet: u8) -> anyhow::Result<()> {
    let settings: ScanSettings = args.to_settings()?;
    print_settings(&settings, quiet);

    let span = info_span!("discovery", indicatif.pb_show = true);
    span.pb_set_style(&progress::style()?);
    span.pb_set_message("starting");

    let discovery = Discovery::from_settings(settings).with_progress(progress::reporter(span.clone()));
    cancel_on_ctrl_c(discovery.cancellation_token());

    let start_time: Instant = Instant::now();
    let report: ScanReport = discovery.run().instrument(span).await?;
    let elapsed = start_time.elapsed();

    if let Some(path) = &args.output {
        write_report(&report, path)?;
    }

    sweep_ends(&report, elapsed, quiet);
    Ok(())
}

fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, wrapping up with what was found so far");
            token.cancel();
        }
    });
}

fn write_report(report: &ScanReport, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("failed to write report to {}", path.display()))?;
    success!("Report written to {}", path.display());
    Ok(())
}

fn print_settings(settings: &ScanSettings, quiet: u8) {
    if quiet > 0 {
        return;
    }

    print::banner(quiet);
    print::header("sweep settings", quiet);
    let ports: Vec<String> = settings.ports.iter().map(u16::to_string).collect();
    print::aligned_line("Address", settings.address.as_str());
    print::aligned_line("Ports", ports.join(", "));
    print::aligned_line("Paths", settings.paths.len().to_string());
    print::aligned_line("Credentials", credentials_summary(settings));
    print::aligned_line("Workers", settings.workers.to_string());
    print::aligned_line("Timeout", format!("{}s", settings.probe_timeout.as_secs()));
    print::aligned_line("Decoder", settings.decoder.display().to_string());
}

fn credentials_summary(settings: &ScanSettings) -> String {
    match settings.credentials.len() {
        0 => "anonymous only".to_string(),
        n => format!("{n} pairs"),
    }
}

fn sweep_ends(report: &ScanReport, total_time: Duration, quiet: u8) {
    if quiet >= 2 {
        for url in report.working_urls() {
            mprint!(url);
        }
        return;
    }

    if report.is_cancelled() {
        warn!("Sweep was cancelled, the report below is partial");
    }

    if report.open_ports.is_empty() {
        print::header("zero rtsp ports found", quiet);
        print::no_results();
        return;
    }

    if quiet > 0 {
        mprint!();
    }

    print::header("open rtsp ports", quiet);
    for open in &report.open_ports {
        print::bullet(&open.target.to_string().color(colors::PRIMARY).to_string());
    }

    if !report.working_streams.is_empty() {
        mprint!();
        print::header("working streams", quiet);
        print_streams(&report.working_streams);
    } else if !report.responsive_endpoints.is_empty() {
        mprint!();
        print::header("responsive, no frame", quiet);
        for url in &report.responsive_endpoints {
            print::bullet(url);
        }
    }

    print_summary(report, total_time, quiet);
}

fn print_streams(streams: &[VerifiedStream]) {
    for (idx, stream) in streams.iter().enumerate() {
        let candidate = &stream.candidate;
        print::stream_head(idx, &candidate.target.to_string());

        print::tree(&[
            ("URL", candidate.url.color(colors::URL)),
            ("Path", candidate.path.to_string().normal()),
            ("Auth", candidate.credential.to_string().normal()),
            ("Frame", stream.detail.normal()),
        ]);

        if idx + 1 != streams.len() {
            mprint!();
        }
    }
}

fn print_summary(report: &ScanReport, total_time: Duration, quiet: u8) {
    let working: ColoredString = format!("{} working streams", report.working_streams.len()).bold().green();
    let open: ColoredString = format!("{} open ports", report.open_ports.len()).bold();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: &ColoredString =
        &format!("Sweep Complete: {working} on {open} in {total_time}").color(colors::TEXT_DEFAULT);

    match quiet {
        0 => print::summary_box(&output.to_string()),
        _ => {
            mprint!();
            success!("{}", output)
        }
    }
}
