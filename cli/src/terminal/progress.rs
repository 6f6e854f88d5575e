//! Progress bar for a sweep, drawn by `tracing-indicatif` on the run's span.

use std::sync::Arc;

use indicatif::ProgressStyle;
use tracing::Span;
use tracing_indicatif::span_ext::IndicatifSpanExt;

use camsweep_core::progress::{Progress, ProgressEvent};

const TICKS: &[&str] = &["▁▁▁▁▁", "▁▂▂▂▁", "▁▄▂▄▁", "▂▄▆▄▂", "▄▆█▆▄", "▂▄▆▄▂", "▁▄▂▄▁", "▁▂▂▂▁"];

pub fn style() -> anyhow::Result<ProgressStyle> {
    let style = ProgressStyle::with_template("{spinner:.blue} {msg:<18} [{bar:30.green/bright_black}] {pos}/{len}")?
        .tick_strings(TICKS)
        .progress_chars("━╸ ");
    Ok(style)
}

/// Forwards pipeline events to the progress bar on `span`.
pub fn reporter(span: Span) -> Progress {
    Progress::new(Arc::new(move |event: ProgressEvent| {
        span.pb_set_message(&event.stage.to_string());
        span.pb_set_length(event.total as u64);
        span.pb_set_position(event.completed as u64);
    }))
}
