//! Command handlers.
//!
//! Every command except `config` needs a logged-in [`PlansClient`]. The
//! session cookie saved by the previous run is tried first; only when the
//! server has forgotten it are credentials used, prompting for the password
//! if none was given. The session is saved again (or deleted, with
//! `--logout`) once the command finishes, whether or not it succeeded.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clans_core::{
    config::{CONFIG_FILE, CONFIG_TEMPLATE},
    credentials::{self, CookieFile, CredentialStore},
    ext::{backup, newlove, resolve_extensions, ExtensionSettings},
    Config, HookDispatcher, HookFlow, PlanFormatter, PlansClient, PlansClientBuilder,
    SessionContext,
};
use log::{debug, info};

use crate::{
    args::{Commands, EditArgs, GlobalArgs, NewloveArgs},
    editor,
    renderer::TerminalRenderer,
};

pub struct Cli {
    profile_dir: PathBuf,
    config: Config,
    global: GlobalArgs,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(
        profile_dir: PathBuf,
        config: Config,
        global: GlobalArgs,
        renderer: TerminalRenderer,
    ) -> Self {
        Self {
            profile_dir,
            config,
            global,
            renderer,
        }
    }

    /// Runs one command, then saves or clears the session.
    pub async fn run(&self, command: Commands) -> Result<()> {
        if let Commands::Config { dir } = command {
            return self.edit_config(dir);
        }

        let username = self.username()?;
        let store = CookieFile::for_user(&self.profile_dir, &username);
        let mut client = self.connect(&username, &store).await?;

        let result = self.dispatch(&mut client, command).await;
        let finished = self.finish(&client, &store);
        result.and(finished)
    }

    async fn dispatch(&self, client: &mut PlansClient, command: Commands) -> Result<()> {
        match command {
            Commands::Edit(args) => self.edit(client, &args).await,
            Commands::Read { plan } => self.read(client, &plan).await,
            Commands::List => self.list(client).await,
            Commands::Love(filters) => {
                let me = client
                    .username()
                    .context("Logged in, but the server did not say as whom")?
                    .to_string();
                self.search(client, &me, true, &filters).await
            }
            Commands::Search(args) => {
                self.search(client, &args.term, args.love, &args.newlove)
                    .await
            }
            Commands::Watch { hours } => self.watch(client, hours).await,
            Commands::Config { dir } => self.edit_config(dir),
        }
    }

    /// `--username`, else the configured one.
    fn username(&self) -> Result<String> {
        self.global
            .username
            .clone()
            .or_else(|| self.config.login.username.clone())
            .filter(|name| !name.is_empty())
            .with_context(|| {
                format!("No username given; pass --username or set [login] username in {CONFIG_FILE}")
            })
    }

    fn formatter(&self, client: &PlansClient) -> Box<dyn PlanFormatter> {
        let kind = self
            .global
            .format
            .or(self.config.clans.format)
            .unwrap_or_default();
        debug!("formatting as {kind}");
        kind.formatter(client.clock().timezone().clone())
    }

    async fn connect(&self, username: &str, store: &CookieFile) -> Result<PlansClient> {
        let mut client = PlansClientBuilder::new()
            .with_base_url(self.config.login.url.as_deref())
            .with_timezone(self.config.clans.timezone.as_deref())
            .build()
            .context("Failed to set up the Plans client")?;

        if credentials::restore_session(&client, store)? && client.login("", "").await? {
            debug!("reusing saved session for {username}");
            return Ok(client);
        }

        let password = match &self.global.password {
            Some(password) => password.clone(),
            None => rpassword::prompt_password(format!("[{username}]'s password: "))
                .context("Failed to read password")?,
        };
        client.login_as(username, &password).await?;
        Ok(client)
    }

    fn finish(&self, client: &PlansClient, store: &CookieFile) -> Result<()> {
        if self.global.logout {
            store.clear()?;
            info!("logged out; removed {}", store.path().display());
        } else {
            credentials::persist_session(client, store)?;
        }
        Ok(())
    }

    fn require_extension(&self, name: &str, flags: &str) -> Result<()> {
        if self.config.extensions.enabled.iter().any(|n| n == name) {
            return Ok(());
        }
        bail!(
            "{flags} need the {name} extension; add \"{name}\" to [extensions] enabled in {CONFIG_FILE}"
        )
    }

    fn hooks(&self, client: &PlansClient, settings: &ExtensionSettings) -> HookDispatcher {
        let username = client.username().unwrap_or_default();
        HookDispatcher::new(
            resolve_extensions(&self.config.extensions.enabled, settings),
            SessionContext::new(username, self.profile_dir.clone()),
        )
    }

    async fn edit(&self, client: &mut PlansClient, args: &EditArgs) -> Result<()> {
        if args.uses_backup() {
            self.require_extension(backup::NAME, "--backup, --save and --skip-update")?;
        }
        let mut settings = self.config.extension_settings();
        args.apply(&mut settings);
        let mut hooks = self.hooks(client, &settings);

        let buffer = client.fetch_edit_buffer(true).await?;
        let fingerprint = buffer
            .fingerprint
            .clone()
            .context("The edit page carried no fingerprint")?;
        if hooks.post_get_edit_text(&buffer.text)? == HookFlow::Veto {
            return Ok(());
        }

        let mut edited = match &args.file {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
            None => {
                let editor = editor::choose_editor(self.config.clans.editor.as_deref());
                editor::edit_text(&buffer.text, &editor)?
            }
        };
        hooks.pre_set_edit_text(&mut edited)?;

        if !buffer.is_changed_by(&edited) {
            eprintln!("plan unchanged, aborting update");
            return Ok(());
        }

        match client.submit_edit(&edited, &fingerprint).await {
            Ok(message) => {
                eprintln!("{message}");
                Ok(())
            }
            Err(err) => {
                let username = client.username().unwrap_or("clans");
                let unsubmitted = PathBuf::from(format!("{username}.plan.unsubmitted"));
                std::fs::write(&unsubmitted, &edited)
                    .with_context(|| format!("{err}; also failed to save {}", unsubmitted.display()))?;
                eprintln!("{err}");
                bail!(
                    "A copy of your unsubmitted edit was stored in {}",
                    unsubmitted.display()
                )
            }
        }
    }

    async fn read(&self, client: &mut PlansClient, name: &str) -> Result<()> {
        let plan = client.read_plan(name).await?;
        let formatter = self.formatter(client);
        let body = formatter.filter_html(&plan.body);
        self.renderer.page(&formatter.format_plan(&plan.header, &body))
    }

    async fn list(&self, client: &mut PlansClient) -> Result<()> {
        let roster = client.autoread_roster().await?;
        let formatter = self.formatter(client);
        let layout = self.renderer.layout();
        self.renderer
            .print(|out| formatter.print_autoread(out, &roster, layout))
    }

    async fn search(
        &self,
        client: &mut PlansClient,
        term: &str,
        planlove: bool,
        filters: &NewloveArgs,
    ) -> Result<()> {
        if filters.uses_newlove() {
            self.require_extension(newlove::NAME, "--time, --new and --keep-unread")?;
        }
        let mut settings = self.config.extension_settings();
        filters.apply(&mut settings);
        let mut hooks = self.hooks(client, &settings);

        hooks.pre_search(term, planlove)?;
        let mut results = client.search_plans(term, planlove).await?;
        hooks.post_search(&mut results)?;

        let formatter = self.formatter(client);
        self.renderer
            .print(|out| formatter.print_search_results(out, &results))
    }

    async fn watch(&self, client: &mut PlansClient, hours: u32) -> Result<()> {
        let updates = client.recent_activity(hours).await?;
        let names: Vec<String> = updates.into_iter().map(|u| u.username).collect();
        let formatter = self.formatter(client);
        let layout = self.renderer.layout();
        self.renderer
            .print(|out| formatter.print_list(out, &names, layout))
    }

    fn edit_config(&self, dir: bool) -> Result<()> {
        if dir {
            println!("{}", self.profile_dir.display());
            return Ok(());
        }
        let path = self.profile_dir.join(CONFIG_FILE);
        if !path.exists() {
            std::fs::write(&path, CONFIG_TEMPLATE)
                .with_context(|| format!("Failed to create {}", path.display()))?;
        }
        let editor = editor::choose_editor(self.config.clans.editor.as_deref());
        editor::run_editor(&editor, &path)
    }
}
