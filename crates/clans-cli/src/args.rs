use std::path::PathBuf;

use clans_core::{
    ext::{BackupTarget, ExtensionSettings},
    FormatKind,
};
use clap::{Args as ClapArgs, Parser, Subcommand};

/// Command-line client for GrinnellPlans
///
/// Reads, searches and edits plans on a Plans server by driving its web
/// pages. Settings live in clans.toml in the profile directory; see
/// `clans config`.
#[derive(Parser)]
#[command(version, about, name = "clans")]
pub struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(ClapArgs)]
pub struct GlobalArgs {
    /// GrinnellPlans username, no brackets
    #[arg(short, long, global = true)]
    pub username: Option<String>,

    /// GrinnellPlans password. Omit for secure entry
    #[arg(short, long, global = true)]
    pub password: Option<String>,

    /// Log out before quitting
    #[arg(long, global = true)]
    pub logout: bool,

    /// Display format to use (raw, text, color, json)
    #[arg(long, global = true)]
    pub format: Option<FormatKind>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Edit your plan in $EDITOR
    Edit(EditArgs),
    /// Print a plan's contents
    Read {
        /// Name of plan to be read
        plan: String,
    },
    /// Check unread plans on your autoread list
    List,
    /// Search for other users giving you planlove
    Love(NewloveArgs),
    /// Search plans for any word or phrase
    Search(SearchArgs),
    /// See recently updated plans
    Watch {
        /// How many hours' worth of plan updates to show
        #[arg(default_value_t = 12)]
        hours: u32,
    },
    /// Edit the clans configuration file
    ///
    /// The clans config file sets the default behavior of the client. (Not
    /// to be confused with Plans preferences!)
    Config {
        /// Print the path to the clans profile directory
        #[arg(long)]
        dir: bool,
    },
}

#[derive(ClapArgs)]
pub struct EditArgs {
    /// Replace plan with the contents of FILE. Skips interactive editing
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Backup existing plan to file before editing. To print to stdout, omit
    /// filename (backup extension)
    #[arg(short, long, value_name = "FILE", num_args = 0..=1)]
    pub backup: Option<Option<PathBuf>>,

    /// Save a local copy of edited plan before submitting (backup extension)
    #[arg(short, long, value_name = "FILE")]
    pub save: Option<PathBuf>,

    /// Don't update the plan or open it for editing (backup extension)
    #[arg(long)]
    pub skip_update: bool,
}

impl EditArgs {
    pub fn uses_backup(&self) -> bool {
        self.backup.is_some() || self.save.is_some() || self.skip_update
    }

    /// Overlays these flags on the configured backup options.
    pub fn apply(&self, settings: &mut ExtensionSettings) {
        match &self.backup {
            Some(Some(path)) => settings.backup.backup = Some(BackupTarget::File(path.clone())),
            Some(None) => settings.backup.backup = Some(BackupTarget::Stdout),
            None => {}
        }
        if let Some(path) = &self.save {
            settings.backup.save_edit = Some(path.clone());
        }
        settings.backup.skip_update = self.skip_update;
    }
}

/// Result filters provided by the newlove extension.
#[derive(ClapArgs)]
pub struct NewloveArgs {
    /// Order results by time first seen
    #[arg(short, long)]
    pub time: bool,

    /// Only show new results
    #[arg(short, long)]
    pub new: bool,

    /// Preserve read state of any new results
    #[arg(long)]
    pub keep_unread: bool,
}

impl NewloveArgs {
    pub fn uses_newlove(&self) -> bool {
        self.time || self.new || self.keep_unread
    }

    pub fn apply(&self, settings: &mut ExtensionSettings) {
        settings.newlove.order_by_time = self.time;
        settings.newlove.only_new = self.new;
        settings.newlove.keep_unread = self.keep_unread;
    }
}

#[derive(ClapArgs)]
pub struct SearchArgs {
    /// Term to search for
    pub term: String,

    /// Restrict search to planlove
    #[arg(short, long)]
    pub love: bool,

    #[command(flatten)]
    pub newlove: NewloveArgs,
}
