pub mod client;
pub mod models;

use crate::error::TransportResult;
use async_trait::async_trait;
use models::{ChatMessage, Profile, SendOutcome};

/// The four operations the controller needs from the conversation service.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn list_profiles(&self) -> TransportResult<Vec<Profile>>;

    async fn set_active_profile(&self, profile_id: &str) -> TransportResult<()>;

    async fn send_message(
        &self,
        conversation_id: Option<&str>,
        text: &str,
    ) -> TransportResult<SendOutcome>;

    async fn fetch_history(
        &self,
        conversation_id: &str,
        limit: u32,
    ) -> TransportResult<Vec<ChatMessage>>;
}
