use std::fmt;

use colored::*;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::{FilterExt, filter_fn};
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

/// Report lines, written verbatim to stdout.
pub const PRINT_TARGET: &str = "camsweep::print";
const SUCCESS_TARGET: &str = "camsweep::success";

pub struct CamsweepFormatter;

impl<S, N> FormatEvent<S, N> for CamsweepFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let meta = event.metadata();

        if meta.target() == PRINT_TARGET {
            let mut raw = RawMessage::default();
            event.record(&mut raw);
            return writeln!(writer, "{}", raw.0);
        }

        let (symbol, color_func): (&str, fn(ColoredString) -> ColoredString) = match *meta.level() {
            Level::INFO if meta.target() == SUCCESS_TARGET => ("[+]", |s| s.green().bold()),
            Level::TRACE => ("[ ]", |s| s.dimmed()),
            Level::DEBUG => ("[?]", |s| s.blue()),
            Level::INFO => ("[*]", |s| s.cyan()),
            Level::WARN => ("[*]", |s| s.yellow().bold()),
            Level::ERROR => ("[-]", |s| s.red().bold()),
        };

        write!(writer, "{} ", color_func(symbol.into()))?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

#[derive(Default)]
struct RawMessage(String);

impl Visit for RawMessage {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "raw_msg" {
            self.0 = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "raw_msg" {
            self.0 = format!("{value:?}");
        }
    }
}

fn default_directive(quiet: u8, verbose: u8) -> &'static str {
    match (quiet, verbose) {
        (q, _) if q > 0 => "warn",
        (_, 0) => "info",
        (_, 1) => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber. Log lines and report lines both go
/// through the progress bar's writers so neither tears the bar.
pub fn init(quiet: u8, verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(quiet, verbose)));

    let indicatif_layer = IndicatifLayer::new();

    let report_layer = tracing_subscriber::fmt::layer()
        .event_format(CamsweepFormatter)
        .with_writer(indicatif_layer.get_stdout_writer())
        .with_filter(filter_fn(|meta| meta.target() == PRINT_TARGET));

    let log_layer = tracing_subscriber::fmt::layer()
        .event_format(CamsweepFormatter)
        .with_writer(indicatif_layer.get_stderr_writer())
        .with_filter(filter.and(filter_fn(|meta| meta.target() != PRINT_TARGET)));

    tracing_subscriber::registry()
        .with(report_layer)
        .with(log_layer)
        .with(indicatif_layer)
        .init();
}
