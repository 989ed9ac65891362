//! UI-process side of the channel.
//!
//! The UI is a passive observer: each snapshot replaces its whole view, only
//! the latest one matters, and anything arriving after the UI closed its side
//! is ignored. Setting changes are committed once (not per drag tick), saved
//! to the settings store and then sent to the background.

use tracing::{debug, warn};

use crate::channel::UiEnd;
use crate::events::{BackgroundMessage, Snapshot, UiMessage};
use crate::storage::{SettingsStore, StoredSettings};

/// Something the user should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiNotice {
    /// Saving a setting failed; the running timer still got the update.
    StoreFailed(String),
    /// Stored settings could not be read; defaults are in effect.
    SettingsUnavailable(String),
    /// The background process is not reachable.
    BackgroundGone,
}

pub struct UiSession<S: SettingsStore> {
    end: UiEnd,
    store: S,
    user: String,
    latest: Option<Snapshot>,
    closed: bool,
}

impl<S: SettingsStore> UiSession<S> {
    pub fn new(end: UiEnd, store: S, user: impl Into<String>) -> Self {
        Self {
            end,
            store,
            user: user.into(),
            latest: None,
            closed: false,
        }
    }

    pub fn latest(&self) -> Option<Snapshot> {
        self.latest
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply one incoming message. Returns the snapshot now shown, or `None`
    /// when the message was ignored because the session is closed.
    pub fn apply(&mut self, message: BackgroundMessage) -> Option<Snapshot> {
        if self.closed {
            debug!("snapshot after close ignored");
            return None;
        }
        let BackgroundMessage::Snapshot(snapshot) = message;
        self.latest = Some(snapshot);
        self.latest
    }

    /// Wait for the newest snapshot not shown yet. `None` once the
    /// background side has gone away.
    pub async fn next_snapshot(&mut self) -> Option<Snapshot> {
        loop {
            let message = self.end.recv().await?;
            if let Some(snapshot) = self.apply(message) {
                return Some(snapshot);
            }
        }
    }

    /// Read this user's stored settings the way the background does at
    /// startup, so a failing store is reported where the user can see it.
    pub fn load_settings(&self) -> Result<StoredSettings, UiNotice> {
        self.store.get(&self.user).map_err(|e| {
            warn!(user = %self.user, error = %e, "stored settings unavailable");
            UiNotice::SettingsUnavailable(e.to_string())
        })
    }

    /// Commit a user action. Settings are persisted first; a store failure is
    /// reported but the update is still sent.
    pub fn commit(&mut self, message: UiMessage) -> Vec<UiNotice> {
        let mut notices = Vec::new();
        if self.closed {
            notices.push(UiNotice::BackgroundGone);
            return notices;
        }
        if let Some(partial) = StoredSettings::from_message(&message) {
            if let Err(e) = self.store.merge_set(&self.user, &partial) {
                warn!(error = %e, "could not save setting");
                notices.push(UiNotice::StoreFailed(e.to_string()));
            }
        }
        if !self.end.send(message) {
            notices.push(UiNotice::BackgroundGone);
        }
        if message == UiMessage::StopService {
            self.closed = true;
        }
        notices
    }

    /// Stop the background process and stop listening.
    pub fn stop(&mut self) -> Vec<UiNotice> {
        self.commit(UiMessage::StopService)
    }
}
