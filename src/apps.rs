//! Application context discovery.
//!
//! Runs a window-listing command and turns its output into the list of
//! application contexts a key can be overridden for.

use std::process::{Command, Stdio};

use tracing::{debug, instrument};

use crate::config::DEFAULT_CONTEXT;
use crate::error::{EditorError, Result};

/// Selector label for the default context.
pub const DEFAULT_APPLICATION: &str = "Default";

/// Window-listing command used when none is configured.
pub const DEFAULT_WINDOW_LIST_COMMAND: &str = "wmctrl -lx";

/// Context stored for a selector label: `Default` is the empty context.
#[must_use]
pub fn context_for(label: &str) -> &str {
    if label == DEFAULT_APPLICATION {
        DEFAULT_CONTEXT
    } else {
        label
    }
}

/// Selector label for a stored context.
#[must_use]
pub fn label_for(context: &str) -> &str {
    if context == DEFAULT_CONTEXT {
        DEFAULT_APPLICATION
    } else {
        context
    }
}

/// Run `command` through the shell and list the window classes it reports.
///
/// `Default` always comes first. A failing command is a recoverable
/// [`EditorError::WindowList`].
#[instrument]
pub fn list_applications(command: &str) -> Result<Vec<String>> {
    if command.trim().is_empty() {
        return Err(EditorError::WindowList(
            "Window list command is empty".to_string(),
        ));
    }
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| EditorError::WindowList(format!("Failed to run '{command}': {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(EditorError::WindowList(format!(
            "'{command}' exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    let applications = parse_window_list(&String::from_utf8_lossy(&output.stdout));
    debug!(count = applications.len(), "Listed applications");
    Ok(applications)
}

/// Window classes from listing output, deduplicated in order, `Default` first.
///
/// `wmctrl -lx` lines carry `instance.Class` in the third column; the
/// instance part is used. Lines with fewer columns are taken whole, so a
/// command printing one class per line also works.
#[must_use]
pub fn parse_window_list(output: &str) -> Vec<String> {
    let mut applications = vec![DEFAULT_APPLICATION.to_string()];
    for line in output.lines() {
        let columns: Vec<&str> = line.split_whitespace().collect();
        let class = match columns.as_slice() {
            [] => continue,
            [_, _, wm_class, ..] => wm_class.split('.').next().unwrap_or(*wm_class),
            _ => line.trim(),
        };
        if class.is_empty() || class == "N/A" {
            continue;
        }
        if !applications.iter().any(|a| a == class) {
            applications.push(class.to_string());
        }
    }
    applications
}
