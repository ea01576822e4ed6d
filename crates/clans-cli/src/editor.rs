//! Interactive editing in the user's text editor.

use std::{io::Write, path::Path, process::Command};

use anyhow::{bail, Context, Result};

/// Editor used when neither the config file nor `$EDITOR` names one.
pub const FALLBACK_EDITOR: &str = "pico";

/// Picks the editor: the config file's, then `$EDITOR`, then pico.
pub fn choose_editor(configured: Option<&str>) -> String {
    configured
        .map(str::to_string)
        .filter(|e| !e.trim().is_empty())
        .or_else(|| std::env::var("EDITOR").ok().filter(|e| !e.trim().is_empty()))
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
}

/// Runs `editor` on `path` and waits for it to exit. The editor may carry
/// its own arguments, as in `code --wait`.
pub fn run_editor(editor: &str, path: &Path) -> Result<()> {
    let mut words = editor.split_whitespace();
    let Some(program) = words.next() else {
        bail!("No editor configured");
    };
    log::debug!("running {editor} on {}", path.display());
    let status = Command::new(program)
        .args(words)
        .arg(path)
        .status()
        .with_context(|| format!("Failed to run editor '{editor}'"))?;
    if !status.success() {
        bail!("Editor '{editor}' exited with {status}");
    }
    Ok(())
}

/// Opens `text` in `editor` through a temporary `.plan` file and returns
/// what the user saved.
pub fn edit_text(text: &str, editor: &str) -> Result<String> {
    let mut file = tempfile::Builder::new()
        .prefix("clans-")
        .suffix(".plan")
        .tempfile()
        .context("Failed to create temporary file")?;
    file.write_all(text.as_bytes())
        .and_then(|()| file.flush())
        .context("Failed to write temporary file")?;

    run_editor(editor, file.path())?;

    std::fs::read_to_string(file.path()).context("Failed to read edited plan")
}
