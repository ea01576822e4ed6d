//! Terminal output.
//!
//! Long output goes through a pager when stdout is a terminal, and lists
//! are laid out in columns there. Redirected output is written plainly.

use std::{
    io::{self, IsTerminal, Write},
    process::{Command, Stdio},
};

use anyhow::{bail, Context, Result};
use clans_core::ListLayout;
use log::{debug, warn};

/// Pager used when `$PAGER` is unset; `-R` passes colors through.
const DEFAULT_PAGER: &str = "less -R";

/// Writes command output to stdout.
pub struct TerminalRenderer {
    interactive: bool,
}

impl TerminalRenderer {
    pub fn new(interactive: bool) -> Self {
        Self { interactive }
    }

    /// Interactive when stdout is a terminal.
    pub fn detect() -> Self {
        Self::new(io::stdout().is_terminal())
    }

    /// How lists should be laid out.
    pub fn layout(&self) -> ListLayout {
        if self.interactive {
            ListLayout::Columns
        } else {
            ListLayout::Plain
        }
    }

    /// Shows a document, paging it on a terminal. Falls back to plain
    /// output when the pager cannot be started.
    pub fn page(&self, text: &str) -> Result<()> {
        if self.interactive {
            let pager = choose_pager();
            match run_pager(&pager, text) {
                Ok(()) => return Ok(()),
                Err(err) => warn!("pager unavailable, writing directly: {err:#}"),
            }
        }
        let newline = if text.ends_with('\n') { "" } else { "\n" };
        let mut out = io::stdout().lock();
        write!(out, "{text}{newline}")
            .and_then(|()| out.flush())
            .context("Failed to write output")
    }

    /// Runs `print` against stdout.
    pub fn print<F>(&self, print: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()>,
    {
        let mut out = io::stdout().lock();
        print(&mut out)
            .and_then(|()| out.flush())
            .context("Failed to write output")
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::detect()
    }
}

/// `$PAGER`, else `less -R`.
fn choose_pager() -> String {
    std::env::var("PAGER")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PAGER.to_string())
}

/// Feeds `text` to `pager` on its stdin and waits for the user to quit it.
/// The pager may carry its own arguments.
fn run_pager(pager: &str, text: &str) -> Result<()> {
    let mut words = pager.split_whitespace();
    let Some(program) = words.next() else {
        bail!("No pager configured");
    };
    let mut child = Command::new(program)
        .args(words)
        .stdin(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to start pager '{pager}'"))?;

    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(text.as_bytes()),
        None => Ok(()),
    };
    let status = child
        .wait()
        .with_context(|| format!("Pager '{pager}' failed"))?;

    match written {
        // Quitting before the end closes the pipe early.
        Err(err) if err.kind() != io::ErrorKind::BrokenPipe => {
            Err(err).with_context(|| format!("Failed to write to pager '{pager}'"))
        }
        _ => {
            debug!("pager '{pager}' exited with {status}");
            Ok(())
        }
    }
}
