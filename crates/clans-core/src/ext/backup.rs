//! Local copies of the plan around an edit.

use std::{io::Write, path::PathBuf};

use crate::{
    error::{IoResultExt, Result},
    hooks::{Extension, HookFlow, SessionContext},
};

pub const NAME: &str = "backup";

/// Where to put the plan as fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupTarget {
    /// Print it and skip the update
    Stdout,
    File(PathBuf),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupOptions {
    pub backup: Option<BackupTarget>,
    /// Where to keep the edited text when it differs from the original
    pub save_edit: Option<PathBuf>,
    /// Stop after the backup, before editing
    pub skip_update: bool,
}

/// Saves the plan before editing and the edited text before submission.
#[derive(Debug, Clone)]
pub struct Backup {
    options: BackupOptions,
}

impl Backup {
    pub fn new(options: BackupOptions) -> Self {
        Self { options }
    }
}

impl Extension for Backup {
    fn name(&self) -> &'static str {
        NAME
    }

    fn post_get_edit_text(&self, ctx: &mut SessionContext, text: &str) -> Result<HookFlow> {
        ctx.set_state(NAME, text.to_string());

        let mut flow = if self.options.skip_update {
            HookFlow::Veto
        } else {
            HookFlow::Continue
        };
        match &self.options.backup {
            None => {}
            Some(BackupTarget::Stdout) => {
                let mut stdout = std::io::stdout().lock();
                stdout
                    .write_all(text.as_bytes())
                    .and_then(|()| stdout.flush())
                    .at_path("<stdout>")?;
                flow = HookFlow::Veto;
            }
            Some(BackupTarget::File(path)) => {
                std::fs::write(path, text).at_path(path)?;
                log::info!("backed up plan to {}", path.display());
            }
        }
        Ok(flow)
    }

    fn pre_set_edit_text(&self, ctx: &mut SessionContext, text: &mut String) -> Result<()> {
        let Some(path) = &self.options.save_edit else {
            return Ok(());
        };
        let changed = ctx.state::<String>(NAME).map_or(true, |original| original.as_str() != text.as_str());
        if changed {
            std::fs::write(path, text.as_bytes()).at_path(path)?;
            log::info!("saved edited plan to {}", path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn ctx(dir: &TempDir) -> SessionContext {
        SessionContext::new("baldwint", dir.path())
    }

    #[test]
    fn test_backup_to_file_continues() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.bak");
        let backup = Backup::new(BackupOptions {
            backup: Some(BackupTarget::File(path.clone())),
            ..Default::default()
        });
        let mut ctx = ctx(&dir);
        let flow = backup.post_get_edit_text(&mut ctx, "old\r\nplan").unwrap();
        assert_eq!(flow, HookFlow::Continue);
        assert_eq!(std::fs::read(&path).unwrap(), b"old\r\nplan");
    }

    #[test]
    fn test_skip_update_vetoes() {
        let dir = TempDir::new().unwrap();
        let backup = Backup::new(BackupOptions {
            skip_update: true,
            ..Default::default()
        });
        let flow = backup.post_get_edit_text(&mut ctx(&dir), "plan").unwrap();
        assert_eq!(flow, HookFlow::Veto);
    }

    #[test]
    fn test_save_only_when_changed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.edited");
        let backup = Backup::new(BackupOptions {
            save_edit: Some(path.clone()),
            ..Default::default()
        });
        let mut ctx = ctx(&dir);
        backup.post_get_edit_text(&mut ctx, "same").unwrap();

        let mut unchanged = String::from("same");
        backup.pre_set_edit_text(&mut ctx, &mut unchanged).unwrap();
        assert!(!path.exists());

        let mut edited = String::from("different");
        backup.pre_set_edit_text(&mut ctx, &mut edited).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "different");
    }
}
