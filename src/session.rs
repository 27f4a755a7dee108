use crate::api::models::{ChatMessage, Profile};
use crate::storage::{LAST_CONVERSATION_KEY, LAST_PROFILE_KEY, Store};

/// Client-side view of the current conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationSession {
    /// `None` until the server assigns an id.
    pub conversation_id: Option<String>,
    /// Server order once reconciled; an optimistic entry is always last.
    pub messages: Vec<ChatMessage>,
    pub active_profile_id: String,
    pub pending: bool,
    pub last_error: Option<String>,
    pub profiles: Vec<Profile>,
    /// Why the built-in profile list is being shown, if it is.
    pub profiles_error: Option<String>,
}

impl ConversationSession {
    /// Sets the conversation id and mirrors it into the store.
    pub fn set_conversation_id(&mut self, id: Option<String>, store: &Store) {
        let res = match &id {
            Some(id) => store.set(LAST_CONVERSATION_KEY, id),
            None => store.remove(LAST_CONVERSATION_KEY),
        };
        if let Err(e) = res {
            log::warn!("could not persist conversation id: {}", e);
        }
        self.conversation_id = id;
    }

    /// Sets the active profile and mirrors it into the store.
    pub fn set_active_profile(&mut self, id: &str, store: &Store) {
        if let Err(e) = store.set(LAST_PROFILE_KEY, id) {
            log::warn!("could not persist profile id: {}", e);
        }
        self.active_profile_id = id.to_string();
    }

    /// Drops the conversation; profiles are kept.
    pub fn reset(&mut self, store: &Store) {
        self.set_conversation_id(None, store);
        self.messages.clear();
        self.last_error = None;
        self.pending = false;
    }

    pub fn active_profile(&self) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == self.active_profile_id)
    }
}
