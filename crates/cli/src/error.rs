// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator-facing failures of the command line.
//!
//! Rendered as a one-line summary, indented details, then numbered hints.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliError {
    summary: String,
    details: Vec<String>,
    hints: Vec<String>,
}

impl CliError {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            details: Vec::new(),
            hints: Vec::new(),
        }
    }

    /// Append a line describing the circumstances
    pub fn detail(mut self, line: impl Into<String>) -> Self {
        self.details.push(line.into());
        self
    }

    /// Append something the operator can try next
    pub fn hint(mut self, line: impl Into<String>) -> Self {
        self.hints.push(line.into());
        self
    }

    /// No backend is registered under `name`
    pub fn unsupported_backend(name: &str, available: &[String]) -> Self {
        let known_broker = matches!(
            name.to_ascii_lowercase().as_str(),
            "pulsar" | "kafka" | "rocksmq" | "woodpecker"
        );
        let err = Self::new(format!("unsupported backend '{name}'"));
        let err = if known_broker {
            err.detail(format!("{name} is not supported yet"))
        } else {
            err
        };
        err.detail(format!("available backends: {}", available.join(", ")))
            .hint("pick one of the available backends with --backend")
    }

    pub fn missing_data_dir(backend: &str) -> Self {
        Self::new(format!("backend '{backend}' requires a data directory"))
            .detail("data_dir is set neither in the config file nor on the command line")
            .hint("pass --data-dir <DIR>")
            .hint("or set data_dir in the config file")
    }

    pub fn too_few_pchannels(count: usize) -> Self {
        Self::new("at least 2 pchannels are required for comparison")
            .detail(format!("got {count}"))
            .hint("pass a comma-separated list: --pchannels a,b")
    }

    /// Building the backend failed for a reason other than configuration
    pub fn backend_failed(name: &str, reason: impl fmt::Display) -> Self {
        Self::new(format!("failed to create backend '{name}'")).detail(reason.to_string())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary)?;
        for line in &self.details {
            write!(f, "\n  -> {line}")?;
        }
        if self.hints.is_empty() {
            return Ok(());
        }
        f.write_str("\n\nhints:")?;
        for (n, line) in self.hints.iter().enumerate() {
            write!(f, "\n  {}. {line}", n + 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for CliError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
