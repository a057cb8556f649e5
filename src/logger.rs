use std::fs::File;
use std::io::{Result as IoResult, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};
use std::{cell::RefCell, fmt::Display};

use crate::decode::DecodeProblem;

/// Sample of offending cells quoted in a per-column warning.
const SAMPLE_LIMIT: usize = 3;

static LOG_FILE: OnceLock<Arc<Mutex<File>>> = OnceLock::new();
thread_local! {
    static LOG_PREFIX: RefCell<Option<String>> = const { RefCell::new(None) };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Warning,
    Error,
}

impl Level {
    const fn label(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

fn with_prefix<F, R>(f: F) -> R
where
    F: FnOnce(Option<String>) -> R,
{
    LOG_PREFIX.with(|prefix| f(prefix.borrow().clone()))
}

fn format_with_prefix(message: impl Display) -> String {
    with_prefix(|prefix| prefix.map_or_else(|| message.to_string(), |p| format!("{p}: {message}")))
}

/// Mirrors warnings and errors of subsequent loads into `path`.
///
/// # Errors
///
/// Returns an error if the log file cannot be created.
pub fn set_log_file(path: &Path) -> IoResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    // First writer wins.
    let _ = LOG_FILE.set(Arc::new(Mutex::new(file)));
    Ok(())
}

/// Sets a thread-local prefix (the column being decoded) for subsequent log
/// messages. The previous prefix is restored when the guard drops.
pub fn set_log_prefix(prefix: impl Into<String>) -> LogPrefixGuard {
    let prefix = prefix.into();
    let previous = with_prefix(|p| p);
    LOG_PREFIX.with(|slot| {
        *slot.borrow_mut() = Some(prefix);
    });
    LogPrefixGuard { previous }
}

pub struct LogPrefixGuard {
    previous: Option<String>,
}

impl Drop for LogPrefixGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        LOG_PREFIX.with(|slot| {
            *slot.borrow_mut() = previous;
        });
    }
}

pub fn emit(level: Level, message: &str) {
    let message = format_with_prefix(message);
    eprintln!("{message}");
    if let Some(writer) = LOG_FILE.get()
        && let Ok(mut file) = writer.lock()
    {
        let _ = writeln!(file, "{}: {message}", level.label());
    }
}

pub fn log_warn(message: &str) {
    emit(Level::Warning, message);
}

pub fn log_error(message: &str) {
    emit(Level::Error, message);
}

/// Renders the single warning emitted for a column with unparsable cells.
#[must_use]
pub fn describe_problems(problems: &[DecodeProblem]) -> Option<String> {
    let first = problems.first()?;
    let sample = problems
        .iter()
        .take(SAMPLE_LIMIT)
        .map(|problem| format!("row {} {:?}", problem.row, problem.raw))
        .collect::<Vec<_>>()
        .join(", ");
    let more = problems.len().saturating_sub(SAMPLE_LIMIT);
    let suffix = if more > 0 {
        format!(" and {more} more")
    } else {
        String::new()
    };
    let noun = if problems.len() == 1 { "cell" } else { "cells" };
    Some(format!(
        "{} unparsable {noun} in column '{}' ({sample}{suffix})",
        problems.len(),
        first.column
    ))
}

/// Logs one warning for `column` if it has problems.
pub fn warn_decode_problems(column: &str, problems: &[DecodeProblem]) {
    if let Some(message) = describe_problems(problems) {
        let _guard = set_log_prefix(column);
        log_warn(&message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem(row: usize, raw: &str) -> DecodeProblem {
        DecodeProblem {
            row,
            column: "age".to_owned(),
            raw: raw.to_owned(),
        }
    }

    #[test]
    fn prefix_guard_restores_previous() {
        let outer = set_log_prefix("outer");
        {
            let _inner = set_log_prefix("inner");
            assert_eq!(format_with_prefix("x"), "inner: x");
        }
        assert_eq!(format_with_prefix("x"), "outer: x");
        drop(outer);
        assert_eq!(format_with_prefix("x"), "x");
    }

    #[test]
    fn problem_summary_samples_cells() {
        assert_eq!(describe_problems(&[]), None);
        assert_eq!(
            describe_problems(&[problem(1, "twenty")]).unwrap(),
            "1 unparsable cell in column 'age' (row 1 \"twenty\")"
        );
        let many: Vec<_> = (0..5).map(|row| problem(row, "x")).collect();
        assert!(describe_problems(&many).unwrap().ends_with("row 2 \"x\" and 2 more)"));
    }
}
