//! About panel model and view
//!
//! [`About`] owns the panel's state and the single [`AboutView`] it hands out
//! when the workspace opens [`ABOUT_URI`]. Once a view exists, every change
//! notification from the [`UpdateManager`] is forwarded through About's own
//! broadcaster and refreshes the view's props.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::{Deserialize, Serialize};

use about_core::prelude::*;
use about_core::release_notes_url_for_version;

use crate::broadcaster::StatusChangeBroadcaster;
use crate::subscription::{CompositeSubscription, Subscription};
use crate::update_manager::UpdateManager;

pub const ABOUT_URI: &str = "soldat://about";

/// Name written into serialized view state
pub const ABOUT_VIEW_DESERIALIZER: &str = "AboutView";

pub const HOMEPAGE_URL: &str = "https://soldat.io/";
pub const TERMS_OF_USE_URL: &str = "https://help.github.com/articles/github-terms-of-service";
pub const CONTRIBUTORS_URL: &str = "https://github.com/soldat/soldat/contributors";

// ─────────────────────────────────────────────────────────
// View
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AboutViewProps {
    pub uri: String,
    pub current_version: String,
    pub available_version: String,
}

/// Persisted form of an open About view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedAboutView {
    pub deserializer: String,
    pub uri: String,
}

/// Handle to the About pane item. Clones share props.
#[derive(Clone)]
pub struct AboutView {
    props: Arc<Mutex<AboutViewProps>>,
    destroyed: Arc<AtomicBool>,
}

impl AboutView {
    pub fn new(props: AboutViewProps) -> Self {
        Self {
            props: Arc::new(Mutex::new(props)),
            destroyed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn props(&self) -> AboutViewProps {
        self.lock().clone()
    }

    /// Replace the props. Ignored once the view is destroyed.
    pub fn update(&self, props: AboutViewProps) {
        if self.is_destroyed() {
            return;
        }
        let mut current = self.lock();
        if *current != props {
            trace!("About view props: {:?}", props);
            *current = props;
        }
    }

    pub fn uri(&self) -> String {
        self.lock().uri.clone()
    }

    pub fn title(&self) -> &'static str {
        "About"
    }

    pub fn icon_name(&self) -> &'static str {
        "info"
    }

    /// Version line shown in the header, e.g. `1.7.0 x86_64`
    pub fn version_label(&self) -> String {
        format!("{} {}", self.lock().current_version, std::env::consts::ARCH)
    }

    /// What clicking the version copies
    pub fn version_for_clipboard(&self) -> String {
        self.lock().current_version.clone()
    }

    /// Target of the header's "Release Notes" link
    pub fn release_notes_url(&self) -> String {
        release_notes_url_for_version(&self.lock().available_version)
    }

    /// Target of the logo link
    pub fn homepage_url(&self) -> &'static str {
        HOMEPAGE_URL
    }

    pub fn terms_of_use_url(&self) -> &'static str {
        TERMS_OF_USE_URL
    }

    pub fn contributors_url(&self) -> &'static str {
        CONTRIBUTORS_URL
    }

    pub fn serialize(&self) -> SerializedAboutView {
        SerializedAboutView {
            deserializer: ABOUT_VIEW_DESERIALIZER.to_string(),
            uri: self.uri(),
        }
    }

    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Whether two handles refer to the same view
    pub fn same_view(&self, other: &AboutView) -> bool {
        Arc::ptr_eq(&self.props, &other.props)
    }

    fn lock(&self) -> MutexGuard<'_, AboutViewProps> {
        self.props.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for AboutView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AboutView")
            .field("props", &*self.lock())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

impl SerializedAboutView {
    /// Parse persisted view state, rejecting other deserializers
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let state: SerializedAboutView = serde_json::from_value(value)?;
        if state.deserializer != ABOUT_VIEW_DESERIALIZER {
            return Err(Error::protocol(format!(
                "Cannot restore {} as {}",
                state.deserializer, ABOUT_VIEW_DESERIALIZER
            )));
        }
        Ok(state)
    }
}

// ─────────────────────────────────────────────────────────
// Model
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AboutState {
    pub uri: String,
    pub current_version: String,
    pub update_manager: Option<UpdateManager>,
}

impl AboutState {
    pub fn new(current_version: impl Into<String>, update_manager: UpdateManager) -> Self {
        Self {
            uri: ABOUT_URI.to_string(),
            current_version: current_version.into(),
            update_manager: Some(update_manager),
        }
    }
}

/// Partial update merged by [`About::set_state`]
#[derive(Debug, Default)]
pub struct AboutStatePatch {
    pub uri: Option<String>,
    pub current_version: Option<String>,
    pub update_manager: Option<Option<UpdateManager>>,
}

struct AboutInner {
    state: AboutState,
    view: Option<AboutView>,
    subscriptions: CompositeSubscription,
    destroyed: bool,
}

/// The About panel's model
#[derive(Clone)]
pub struct About {
    inner: Arc<Mutex<AboutInner>>,
    broadcaster: StatusChangeBroadcaster,
}

impl About {
    pub fn new(state: AboutState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AboutInner {
                state,
                view: None,
                subscriptions: CompositeSubscription::new(),
                destroyed: false,
            })),
            broadcaster: StatusChangeBroadcaster::new(),
        }
    }

    pub fn state(&self) -> AboutState {
        self.lock().state.clone()
    }

    /// The open view, if any
    pub fn view(&self) -> Option<AboutView> {
        self.lock().view.clone()
    }

    /// Merge `patch` into the state and notify
    pub fn set_state(&self, patch: AboutStatePatch) {
        {
            let mut inner = self.lock();
            if let Some(uri) = patch.uri {
                inner.state.uri = uri;
            }
            if let Some(version) = patch.current_version {
                inner.state.current_version = version;
            }
            if let Some(manager) = patch.update_manager {
                inner.state.update_manager = manager;
            }
        }
        self.broadcaster.notify();
    }

    pub fn on_did_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        self.broadcaster.subscribe(listener)
    }

    /// Workspace opener: the About view for [`ABOUT_URI`], `None` otherwise
    pub fn open(&self, uri: &str) -> Option<AboutView> {
        {
            let inner = self.lock();
            if inner.destroyed || uri != inner.state.uri {
                return None;
            }
        }
        Some(self.deserialize(None))
    }

    /// Rebuild the view from persisted workspace state
    pub fn restore(&self, value: serde_json::Value) -> Result<AboutView> {
        let state = SerializedAboutView::from_json(value)?;
        Ok(self.deserialize(Some(AboutStatePatch {
            uri: Some(state.uri),
            ..Default::default()
        })))
    }

    /// The single About view, created on first use
    fn deserialize(&self, patch: Option<AboutStatePatch>) -> AboutView {
        if let Some(view) = self.view() {
            return view;
        }
        if let Some(patch) = patch {
            self.set_state(patch);
        }

        let view = AboutView::new(self.view_props());
        self.lock().view = Some(view.clone());
        self.handle_state_changes();
        debug!("About view created for {}", view.uri());
        view
    }

    fn view_props(&self) -> AboutViewProps {
        view_props_for(&self.state())
    }

    fn handle_state_changes(&self) {
        let weak: Weak<Mutex<AboutInner>> = Arc::downgrade(&self.inner);
        let refresh = self.broadcaster.subscribe(move || {
            let Some(inner) = weak.upgrade() else {
                return Ok(());
            };
            let (view, state) = {
                let inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
                (inner.view.clone(), inner.state.clone())
            };
            if let Some(view) = view {
                view.update(view_props_for(&state));
            }
            Ok(())
        });

        let forward = self.state().update_manager.map(|manager| {
            let broadcaster = self.broadcaster.clone();
            manager.on_did_change(move || {
                broadcaster.notify();
                Ok(())
            })
        });

        let mut inner = self.lock();
        inner.subscriptions.add(refresh);
        if let Some(forward) = forward {
            inner.subscriptions.add(forward);
        }
    }

    /// Target of the `about:view-release-notes` command
    pub fn release_notes_url(&self) -> String {
        let state = self.state();
        match state.update_manager {
            Some(manager) => manager.release_notes_url_for_current_version(),
            None => release_notes_url_for_version(&state.current_version),
        }
    }

    /// Close the view, dispose the update manager, and drop subscriptions.
    /// Idempotent.
    pub fn destroy(&self) {
        let (view, manager) = {
            let mut inner = self.lock();
            if inner.destroyed {
                return;
            }
            inner.destroyed = true;
            (inner.view.take(), inner.state.update_manager.clone())
        };

        if let Some(view) = view {
            view.destroy();
        }
        if let Some(manager) = manager {
            manager.dispose();
        }
        self.set_state(AboutStatePatch {
            update_manager: Some(None),
            ..Default::default()
        });

        self.lock().subscriptions.dispose();
        info!("About panel destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.lock().destroyed
    }

    fn lock(&self) -> MutexGuard<'_, AboutInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn view_props_for(state: &AboutState) -> AboutViewProps {
    let available_version = state
        .update_manager
        .as_ref()
        .map(|m| m.available_version())
        .unwrap_or_else(|| state.current_version.clone());
    AboutViewProps {
        uri: state.uri.clone(),
        current_version: state.current_version.clone(),
        available_version,
    }
}

impl fmt::Debug for About {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("About")
            .field("uri", &inner.state.uri)
            .field("current_version", &inner.state.current_version)
            .field("view", &inner.view.is_some())
            .field("destroyed", &inner.destroyed)
            .finish()
    }
}
