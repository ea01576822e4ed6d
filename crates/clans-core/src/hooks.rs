//! Hook points that extensions attach to.
//!
//! Extensions see the edit and search flows at four points:
//!
//! ```text
//! fetch edit text ─▶ post_get_edit_text ─(Veto stops here)─▶ edit ─▶ pre_set_edit_text ─▶ submit
//! pre_search ─▶ search ─▶ post_search ─▶ print
//! ```
//!
//! Each run owns one [`SessionContext`], handed to every hook. Extensions
//! keep whatever they need between hook points in its state map under their
//! own namespace, so nothing outlives the run.

use std::{
    any::Any,
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{error::Result, models::SearchResult};

/// Whether the edit flow should go on after a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookFlow {
    Continue,
    Veto,
}

/// Per-run state shared with every hook.
pub struct SessionContext {
    username: String,
    profile_dir: PathBuf,
    state: HashMap<String, Box<dyn Any + Send>>,
}

impl SessionContext {
    pub fn new(username: impl Into<String>, profile_dir: impl Into<PathBuf>) -> Self {
        Self {
            username: username.into(),
            profile_dir: profile_dir.into(),
            state: HashMap::new(),
        }
    }

    /// The logged-in user.
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    /// Stores `value` under `namespace`, replacing what was there.
    pub fn set_state<T: Any + Send>(&mut self, namespace: &str, value: T) {
        self.state.insert(namespace.to_string(), Box::new(value));
    }

    pub fn state<T: Any + Send>(&self, namespace: &str) -> Option<&T> {
        self.state.get(namespace)?.downcast_ref()
    }

    pub fn state_mut<T: Any + Send>(&mut self, namespace: &str) -> Option<&mut T> {
        self.state.get_mut(namespace)?.downcast_mut()
    }

    /// Removes and returns the state under `namespace`, if it has type `T`.
    pub fn take_state<T: Any + Send>(&mut self, namespace: &str) -> Option<T> {
        if !self.state.get(namespace)?.is::<T>() {
            return None;
        }
        let boxed = self.state.remove(namespace)?;
        boxed.downcast::<T>().ok().map(|value| *value)
    }
}

/// A built-in extension. Every hook defaults to doing nothing.
pub trait Extension: Send {
    /// Registry name, also used as the state namespace.
    fn name(&self) -> &'static str;

    /// Called with the plan text as fetched. Returning [`HookFlow::Veto`]
    /// ends the edit before the editor opens.
    fn post_get_edit_text(&self, _ctx: &mut SessionContext, _text: &str) -> Result<HookFlow> {
        Ok(HookFlow::Continue)
    }

    /// Called with the edited text just before submission; may rewrite it.
    fn pre_set_edit_text(&self, _ctx: &mut SessionContext, _text: &mut String) -> Result<()> {
        Ok(())
    }

    fn pre_search(&self, _ctx: &mut SessionContext, _term: &str, _planlove: bool) -> Result<()> {
        Ok(())
    }

    /// Called with the results before they are printed; may rewrite them.
    fn post_search(&self, _ctx: &mut SessionContext, _results: &mut Vec<SearchResult>) -> Result<()> {
        Ok(())
    }
}

/// Runs the enabled extensions, in order, at each hook point.
pub struct HookDispatcher {
    extensions: Vec<Box<dyn Extension>>,
    ctx: SessionContext,
}

impl HookDispatcher {
    pub fn new(extensions: Vec<Box<dyn Extension>>, ctx: SessionContext) -> Self {
        Self { extensions, ctx }
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn extension_names(&self) -> Vec<&'static str> {
        self.extensions.iter().map(|e| e.name()).collect()
    }

    /// Stops at, and reports, the first veto.
    pub fn post_get_edit_text(&mut self, text: &str) -> Result<HookFlow> {
        for ext in &self.extensions {
            if ext.post_get_edit_text(&mut self.ctx, text)? == HookFlow::Veto {
                log::debug!("{} vetoed the edit", ext.name());
                return Ok(HookFlow::Veto);
            }
        }
        Ok(HookFlow::Continue)
    }

    pub fn pre_set_edit_text(&mut self, text: &mut String) -> Result<()> {
        for ext in &self.extensions {
            ext.pre_set_edit_text(&mut self.ctx, text)?;
        }
        Ok(())
    }

    pub fn pre_search(&mut self, term: &str, planlove: bool) -> Result<()> {
        for ext in &self.extensions {
            ext.pre_search(&mut self.ctx, term, planlove)?;
        }
        Ok(())
    }

    pub fn post_search(&mut self, results: &mut Vec<SearchResult>) -> Result<()> {
        for ext in &self.extensions {
            ext.post_search(&mut self.ctx, results)?;
        }
        Ok(())
    }
}
