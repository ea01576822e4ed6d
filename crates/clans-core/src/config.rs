//! Profile directory and the `clans.toml` configuration file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    display::FormatKind,
    error::{ClansError, IoResultExt, Result},
    ext::{BackupOptions, BackupTarget, ExtensionSettings, NewloveOptions},
};

/// Environment variable overriding the profile directory.
pub const PROFILE_ENV: &str = "CLANS_DIR";

pub const CONFIG_FILE: &str = "clans.toml";

/// Written when `clans config` finds no file to edit.
pub const CONFIG_TEMPLATE: &str = r#"# clans configuration
#
# [login]
# username = "baldwint"
# url = "http://www.grinnellplans.com"
#
# [clans]
# editor = "vim"
# format = "text"                 # raw, text, color or json
# timezone = "America/Chicago"
#
# [extensions]
# enabled = ["backup", "newlove"]
#
# [backup]
# backup_file = "plan.bak"
# save_edit = "plan.edited"
#
# [newlove]
# log_love = ""                   # "" tracks everyone, "a,b" tracks a and b
# log_search = "climb"
"#;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoginSection {
    pub username: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClansSection {
    pub editor: Option<String>,
    pub format: Option<FormatKind>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtensionsSection {
    pub enabled: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackupSection {
    pub backup_file: Option<PathBuf>,
    pub save_edit: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewloveSection {
    pub log_love: Option<String>,
    pub log_search: Option<String>,
}

/// Contents of `clans.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub login: LoginSection,
    pub clans: ClansSection,
    pub extensions: ExtensionsSection,
    pub backup: BackupSection,
    pub newlove: NewloveSection,
}

impl Config {
    /// Reads the config file, treating a missing file as empty.
    ///
    /// # Errors
    ///
    /// `Configuration` if the file is not valid TOML for this schema.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no config at {}", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e).at_path(path),
        };
        Self::parse(&text).map_err(|e| match e {
            ClansError::Configuration { message } => {
                ClansError::configuration(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ClansError::configuration(e.to_string()))
    }

    /// Extension options as configured, before command-line overrides.
    pub fn extension_settings(&self) -> ExtensionSettings {
        ExtensionSettings {
            backup: BackupOptions {
                backup: self.backup.backup_file.clone().map(BackupTarget::File),
                save_edit: self.backup.save_edit.clone(),
                skip_update: false,
            },
            newlove: NewloveOptions {
                log_love: self.newlove.log_love.clone(),
                log_search: self.newlove.log_search.clone(),
                ..Default::default()
            },
        }
    }
}

/// The profile directory: `$CLANS_DIR`, else the XDG data directory for
/// `clans`. Created with owner-only permissions if missing.
///
/// # Errors
///
/// `XdgDirectory` if no data directory can be determined, `FileSystem` if it
/// cannot be created.
pub fn profile_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os(PROFILE_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => xdg::BaseDirectories::with_prefix("clans")
            .create_data_directory("")
            .map_err(|e| ClansError::XdgDirectory(e.to_string()))?,
    };
    ensure_private_dir(&dir)?;
    Ok(dir)
}

/// Creates `dir` if needed and restricts it to its owner.
pub fn ensure_private_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).at_path(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700)).at_path(dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_empty_and_missing_config() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
        let dir = TempDir::new().unwrap();
        assert_eq!(
            Config::load(&dir.path().join(CONFIG_FILE)).unwrap(),
            Config::default()
        );
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
            [login]
            username = "baldwint"
            url = "http://localhost:8080/"

            [clans]
            format = "color"
            timezone = "UTC"

            [extensions]
            enabled = ["backup", "newlove"]

            [backup]
            backup_file = "plan.bak"

            [newlove]
            log_love = ""
            "#,
        )
        .unwrap();
        assert_eq!(config.login.username.as_deref(), Some("baldwint"));
        assert_eq!(config.clans.format, Some(FormatKind::Color));
        assert_eq!(config.extensions.enabled, vec!["backup", "newlove"]);

        let settings = config.extension_settings();
        assert_eq!(
            settings.backup.backup,
            Some(BackupTarget::File(PathBuf::from("plan.bak")))
        );
        assert_eq!(settings.newlove.log_love.as_deref(), Some(""));
        assert_eq!(settings.newlove.log_search, None);
    }

    #[test]
    fn test_template_parses_to_defaults() {
        assert_eq!(Config::parse(CONFIG_TEMPLATE).unwrap(), Config::default());
    }

    #[test]
    fn test_bad_config_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[clans]\nformat = \"html\"\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ClansError::Configuration { .. }));
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[cfg(unix)]
    #[test]
    fn test_private_dir() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let profile = dir.path().join("profile");
        ensure_private_dir(&profile).unwrap();
        let mode = std::fs::metadata(&profile).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
