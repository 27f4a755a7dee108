//! Conversation synchronization.
//!
//! Every operation that awaits the network takes a token first and re-checks
//! it before touching the session afterwards. Only the most recently issued
//! token may mutate `conversation_id`, `messages` or `pending`; completions
//! holding an older token are dropped.

use crate::api::ChatBackend;
use crate::api::models::{ChatMessage, Profile};
use crate::config::DEFAULT_HISTORY_LIMIT;
use crate::error::TransportError;
use crate::session::ConversationSession;
use crate::storage::{LAST_CONVERSATION_KEY, LAST_PROFILE_KEY, Store};
use std::sync::{Mutex, MutexGuard};

/// How a submission or history refresh ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing was sent: empty input, a send already pending, or nothing to refresh.
    Skipped,
    /// The request failed; optimistic state was rolled back.
    Failed(String),
    /// A newer operation took over; this result was discarded.
    Superseded,
    /// The send succeeded but history could not be loaded.
    Degraded,
    /// Messages now mirror the server history.
    Reconciled,
}

struct Inner {
    session: ConversationSession,
    latest: u64,
}

impl Inner {
    fn issue_token(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    fn is_current(&self, token: u64) -> bool {
        self.latest == token
    }
}

pub struct SyncController<B> {
    backend: B,
    store: Store,
    history_limit: u32,
    inner: Mutex<Inner>,
}

impl<B: ChatBackend> SyncController<B> {
    pub fn new(backend: B, store: Store) -> Self {
        Self {
            backend,
            store,
            history_limit: DEFAULT_HISTORY_LIMIT,
            inner: Mutex::new(Inner {
                session: ConversationSession::default(),
                latest: 0,
            }),
        }
    }

    pub fn with_history_limit(mut self, limit: u32) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    // Never held across an await.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Copy of the current session for rendering.
    pub fn session(&self) -> ConversationSession {
        self.lock().session.clone()
    }

    /// Send `text` and reconcile with server history.
    pub async fn submit(&self, text: &str) -> SyncOutcome {
        let text = text.trim();
        let (token, prior, conversation_id) = {
            let mut inner = self.lock();
            if text.is_empty() || inner.session.pending {
                return SyncOutcome::Skipped;
            }
            let token = inner.issue_token();
            let prior = inner.session.messages.clone();
            inner.session.messages.push(ChatMessage::user(text));
            inner.session.pending = true;
            inner.session.last_error = None;
            (token, prior, inner.session.conversation_id.clone())
        };

        let sent = match self
            .backend
            .send_message(conversation_id.as_deref(), text)
            .await
        {
            Ok(sent) => sent,
            Err(e) => {
                let mut inner = self.lock();
                if !inner.is_current(token) {
                    log::debug!("send #{} failed after being superseded: {}", token, e);
                    return SyncOutcome::Superseded;
                }
                log::warn!("send failed: {}", e);
                let message = e.to_string();
                inner.session.messages = prior;
                inner.session.last_error = Some(message.clone());
                inner.session.pending = false;
                return SyncOutcome::Failed(message);
            }
        };

        {
            let mut inner = self.lock();
            if !inner.is_current(token) {
                log::debug!("dropping superseded send #{}", token);
                return SyncOutcome::Superseded;
            }
            inner
                .session
                .set_conversation_id(Some(sent.conversation_id.clone()), &self.store);
        }

        let fetched = self
            .backend
            .fetch_history(&sent.conversation_id, self.history_limit)
            .await;

        let mut inner = self.lock();
        if !inner.is_current(token) {
            log::debug!("dropping superseded history for send #{}", token);
            return SyncOutcome::Superseded;
        }
        inner.session.pending = false;
        match fetched {
            Ok(history) => {
                inner.session.messages = history;
                SyncOutcome::Reconciled
            }
            Err(e) => {
                log::warn!(
                    "history for {} unavailable, keeping local messages: {}",
                    sent.conversation_id,
                    e
                );
                SyncOutcome::Degraded
            }
        }
    }

    /// Replace messages with the server history of the current conversation.
    pub async fn refresh_history(&self) -> SyncOutcome {
        let (token, conversation_id) = {
            let mut inner = self.lock();
            if inner.session.pending {
                return SyncOutcome::Skipped;
            }
            let Some(id) = inner.session.conversation_id.clone() else {
                return SyncOutcome::Skipped;
            };
            (inner.issue_token(), id)
        };

        let fetched = self
            .backend
            .fetch_history(&conversation_id, self.history_limit)
            .await;

        let mut inner = self.lock();
        if !inner.is_current(token) {
            return SyncOutcome::Superseded;
        }
        match fetched {
            Ok(history) => {
                inner.session.messages = history;
                SyncOutcome::Reconciled
            }
            Err(e) => {
                log::warn!("could not load history for {}: {}", conversation_id, e);
                let message = format!("could not load history: {}", e);
                inner.session.last_error = Some(message.clone());
                SyncOutcome::Failed(message)
            }
        }
    }

    /// Forget the current conversation. In-flight sends are superseded.
    pub fn start_new_conversation(&self) {
        let mut inner = self.lock();
        inner.issue_token();
        inner.session.reset(&self.store);
        log::info!("started a new conversation");
    }

    /// Select `profile_id` locally, then apply it on the server.
    ///
    /// The local selection is kept even when the server rejects it.
    pub async fn switch_profile(&self, profile_id: &str) -> Result<(), TransportError> {
        self.lock()
            .session
            .set_active_profile(profile_id, &self.store);

        match self.backend.set_active_profile(profile_id).await {
            Ok(()) => {
                log::info!("profile {} applied", profile_id);
                Ok(())
            }
            Err(e) => {
                log::warn!("profile {} not applied: {}", profile_id, e);
                self.lock().session.last_error = Some(format!("could not apply profile: {}", e));
                Err(e)
            }
        }
    }

    /// Load the profile list and pick the initial profile.
    ///
    /// Prefers the saved profile when the server still offers it, otherwise
    /// the first one. Falls back to the built-in list when loading fails.
    pub async fn load_profiles(&self) -> String {
        let (profiles, initial, error) = match self.backend.list_profiles().await {
            Ok(list) => {
                let saved = self.store.get(LAST_PROFILE_KEY).unwrap_or_else(|e| {
                    log::warn!("could not read saved profile: {}", e);
                    None
                });
                let initial = saved
                    .filter(|s| list.iter().any(|p| &p.id == s))
                    .or_else(|| list.first().map(|p| p.id.clone()))
                    .unwrap_or_default();
                (list, initial, None)
            }
            Err(e) => {
                log::warn!("could not load profiles, using built-in list: {}", e);
                let fallback = Profile::fallback();
                let initial = fallback[0].id.clone();
                (fallback, initial, Some(format!("could not load profiles: {}", e)))
            }
        };

        {
            let mut inner = self.lock();
            inner.session.profiles = profiles;
            inner.session.profiles_error = error;
            inner.session.active_profile_id = initial.clone();
        }

        if !initial.is_empty() {
            if let Err(e) = self.backend.set_active_profile(&initial).await {
                log::warn!("initial profile {} not applied: {}", initial, e);
            }
        }
        initial
    }

    /// Reload the conversation saved by a previous run, if any.
    pub async fn restore(&self) -> SyncOutcome {
        let saved = self.store.get(LAST_CONVERSATION_KEY).unwrap_or_else(|e| {
            log::warn!("could not read saved conversation: {}", e);
            None
        });
        let Some(id) = saved else {
            return SyncOutcome::Skipped;
        };
        log::info!("restoring conversation {}", id);
        self.lock().session.conversation_id = Some(id);
        self.refresh_history().await
    }

    /// Startup sequence: restore the saved conversation and load profiles.
    pub async fn initialize(&self) -> SyncOutcome {
        let (restored, profile) = tokio::join!(self.restore(), self.load_profiles());
        log::info!("initialized with profile {:?}", profile);
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_monotonic() {
        let mut inner = Inner {
            session: ConversationSession::default(),
            latest: 0,
        };
        let a = inner.issue_token();
        let b = inner.issue_token();
        assert!(b > a);
        assert!(inner.is_current(b));
        assert!(!inner.is_current(a));
    }
}
