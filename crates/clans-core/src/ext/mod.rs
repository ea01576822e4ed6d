//! Built-in extensions and the registry that enables them by name.

pub mod backup;
pub mod newlove;

use crate::hooks::Extension;

pub use backup::{Backup, BackupOptions, BackupTarget};
pub use newlove::{Newlove, NewloveOptions};

/// Names accepted in the `[extensions] enabled` list.
pub const BUILTIN_EXTENSIONS: &[&str] = &[backup::NAME, newlove::NAME];

/// Options for every built-in, merged from config and command line.
#[derive(Debug, Clone, Default)]
pub struct ExtensionSettings {
    pub backup: BackupOptions,
    pub newlove: NewloveOptions,
}

/// Instantiates the named extensions in the order given. Unknown names are
/// reported and skipped; duplicates are loaded once.
pub fn resolve_extensions(names: &[String], settings: &ExtensionSettings) -> Vec<Box<dyn Extension>> {
    let mut loaded: Vec<Box<dyn Extension>> = Vec::new();
    for name in names {
        if loaded.iter().any(|ext| ext.name() == name.as_str()) {
            continue;
        }
        match name.as_str() {
            backup::NAME => loaded.push(Box::new(Backup::new(settings.backup.clone()))),
            newlove::NAME => loaded.push(Box::new(Newlove::new(settings.newlove.clone()))),
            other => log::warn!(
                "unknown extension '{other}' (available: {})",
                BUILTIN_EXTENSIONS.join(", ")
            ),
        }
    }
    loaded
}
