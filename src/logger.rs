//! Terminal output: prefixed log lines and an in-place progress line.
//!
//! - `log!` prints `[module] message` with a colored prefix
//! - `debug!` / `debug_do!` only run with `--verbose`
//! - [`ProgressLine`] keeps one line of counters updated while workers run
//!
//! ```ignore
//! log!("build"; "processing {} modules", count);
//!
//! let progress = ProgressLine::new("build", &[("modules", 40)]);
//! progress.inc("modules");
//! progress.finish();
//! ```
//!
//! While a progress line is active, `log` clears it first so messages never
//! interleave with the counters.

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{StdoutLock, Write, stdout},
    sync::atomic::{AtomicBool, Ordering},
};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set while a [`ProgressLine`] owns the current terminal line.
static PROGRESS_ACTIVE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// macros
// ============================================================================

/// Log a message with a colored module prefix
///
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a message only when `--verbose` is enabled
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Run a block only when `--verbose` is enabled, for debug output that is
/// expensive to compute.
#[macro_export]
macro_rules! debug_do {
    ($($body:tt)*) => {{
        if $crate::logger::is_verbose() {
            $($body)*
        }
    }};
}

// ============================================================================
// plain lines
// ============================================================================

pub fn log(module: &str, message: &str) {
    let mut out = stdout().lock();
    if PROGRESS_ACTIVE.load(Ordering::SeqCst) {
        clear_line(&mut out);
    }
    writeln!(out, "{} {message}", prefix(module)).ok();
    out.flush().ok();
}

fn prefix(module: &str) -> String {
    let tag = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "build" | "plan" => tag.bright_blue().bold().to_string(),
        "done" => tag.bright_green().bold().to_string(),
        "error" => tag.bright_red().bold().to_string(),
        _ => tag.bright_yellow().bold().to_string(),
    }
}

fn clear_line(out: &mut StdoutLock<'_>) {
    execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
}

// ============================================================================
// progress line
// ============================================================================

/// Named counters redrawn in place: `[build] modules(42/69) artifacts(5/10)`.
///
/// Redraws use `try_lock`, so a worker never waits on the terminal; a
/// skipped redraw is caught up by the next increment or by `finish`.
pub struct ProgressLine {
    module: &'static str,
    counters: Vec<(&'static str, usize, std::sync::atomic::AtomicUsize)>,
    draw: Mutex<()>,
}

impl ProgressLine {
    /// Counters with a zero total are left out.
    pub fn new(module: &'static str, items: &[(&'static str, usize)]) -> Self {
        let counters = items
            .iter()
            .filter(|(_, total)| *total > 0)
            .map(|&(name, total)| (name, total, Default::default()))
            .collect();
        PROGRESS_ACTIVE.store(true, Ordering::SeqCst);
        let progress = Self {
            module,
            counters,
            draw: Mutex::new(()),
        };
        progress.redraw(false);
        progress
    }

    #[inline]
    pub fn inc(&self, name: &str) {
        let Some((_, _, current)) = self.counters.iter().find(|(n, ..)| *n == name) else {
            return;
        };
        current.fetch_add(1, Ordering::Relaxed);
        if let Some(_guard) = self.draw.try_lock() {
            self.redraw(false);
        }
    }

    fn line(&self) -> String {
        self.counters
            .iter()
            .map(|(name, total, current)| format!("{name}({}/{total})", current.load(Ordering::Relaxed)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn redraw(&self, newline: bool) {
        let mut out = stdout().lock();
        clear_line(&mut out);
        write!(out, "{} {}", prefix(self.module), self.line()).ok();
        if newline {
            writeln!(out).ok();
        }
        out.flush().ok();
    }

    /// Draw the final counts and keep the line.
    pub fn finish(self) {
        {
            let _guard = self.draw.lock();
            self.redraw(true);
        }
        PROGRESS_ACTIVE.store(false, Ordering::SeqCst);
        std::mem::forget(self);
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        PROGRESS_ACTIVE.store(false, Ordering::SeqCst);
        let mut out = stdout().lock();
        clear_line(&mut out);
        out.flush().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_line_skips_empty_counters() {
        let progress = ProgressLine::new("build", &[("modules", 3), ("artifacts", 0)]);
        assert_eq!(progress.counters.len(), 1);
        progress.inc("modules");
        progress.inc("unknown");
        assert_eq!(progress.line(), "modules(1/3)");
    }

    #[test]
    fn test_prefix_contains_module() {
        assert!(prefix("plan").contains("[plan]"));
    }
}
