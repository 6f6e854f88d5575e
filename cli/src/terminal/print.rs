use std::fmt::Display;

use crate::terminal::colors;
use crate::terminal::logging::PRINT_TARGET;
use colored::*;
use tracing::info;
use unicode_width::UnicodeWidthStr;

pub const TOTAL_WIDTH: usize = 64;
const KEY_WIDTH: usize = 12;

#[macro_export]
macro_rules! mprint {
    () => {
        $crate::terminal::print::print("");
    };
    ($msg:expr) => {
        $crate::terminal::print::print($msg);
    };
}

pub fn print(msg: &str) {
    info!(target: PRINT_TARGET, raw_msg = msg);
}

/// `text` centred in a `TOTAL_WIDTH` line padded with `fill`. Width is
/// measured before `paint` adds escape codes.
fn ruled(text: &str, fill: &str, paint: impl Fn(&str) -> ColoredString) -> String {
    let pad = TOTAL_WIDTH.saturating_sub(UnicodeWidthStr::width(text));
    let left = pad / 2;
    format!(
        "{}{}{}",
        fill.repeat(left).color(colors::SEPARATOR),
        paint(text),
        fill.repeat(pad - left).color(colors::SEPARATOR)
    )
}

pub fn banner(q_level: u8) {
    if q_level > 0 {
        return;
    }
    let title = format!("⟦ CAMSWEEP v{} ⟧", env!("CARGO_PKG_VERSION"));
    print(&ruled(&title, "═", |t| t.bright_green().bold()));
}

pub fn header(msg: &str, q_level: u8) {
    if q_level > 0 {
        return;
    }
    let title = format!("⟦ {} ⟧", msg.to_uppercase());
    print(&ruled(&title, "─", |t| t.bright_green()));
}

/// `> Key.......: value`, keys padded to a shared column.
pub fn aligned_line(key: &str, value: impl Display) {
    let leader = format!("{}:", ".".repeat((KEY_WIDTH + 1).saturating_sub(key.len())));
    bullet(&format!(
        "{}{} {}",
        key.color(colors::PRIMARY),
        leader.color(colors::SEPARATOR),
        value.to_string().color(colors::TEXT_DEFAULT)
    ));
}

pub fn bullet(msg: &str) {
    print(&format!("{} {}", ">".color(colors::SEPARATOR), msg.color(colors::TEXT_DEFAULT)));
}

/// `[idx] name`, the head of a stream's detail tree.
pub fn stream_head(idx: usize, name: &str) {
    print(&format!(
        "{}{}{} {}",
        "[".color(colors::SEPARATOR),
        idx.to_string().color(colors::ACCENT),
        "]".color(colors::SEPARATOR),
        name.color(colors::PRIMARY)
    ));
}

pub fn tree(rows: &[(&str, ColoredString)]) {
    let key_width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

    for (i, (key, value)) in rows.iter().enumerate() {
        let branch = if i + 1 < rows.len() { "├─" } else { "└─" };
        let leader = format!("{}:", ".".repeat(key_width - key.len()));
        print(&format!(
            " {} {}{} {}",
            branch.color(colors::SEPARATOR),
            key.color(colors::TEXT_DEFAULT),
            leader.color(colors::SEPARATOR),
            value
        ));
    }
}

/// One centred line between two double rules.
pub fn summary_box(msg: &str) {
    let rule = "═".repeat(TOTAL_WIDTH).color(colors::SEPARATOR).to_string();
    let space = " ".repeat(TOTAL_WIDTH.saturating_sub(console::measure_text_width(msg)) / 2);

    print(&rule);
    print(&format!("{space}{msg}"));
    print(&rule);
}

const NO_RESULTS_0: &str = r#"
         _   _  ___     ____    _    __  __ _____ ____      _    ____
        | \ | |/ _ \   / ___|  / \  |  \/  | ____|  _ \    / \  / ___|
        |  \| | | | | | |     / _ \ | |\/| |  _| | |_) |  / _ \ \___ \
        | |\  | |_| | | |___ / ___ \| |  | | |___|  _ <  / ___ \ ___) |
        |_| \_|\___/   \____/_/   \_\_|  |_|_____|_| \_\/_/   \_\____/
"#;

pub fn no_results() {
    print(&format!("{}", NO_RESULTS_0.red().bold()));
}
