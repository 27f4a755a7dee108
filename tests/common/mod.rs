#![allow(dead_code)]

use async_trait::async_trait;
use debate_chat::api::ChatBackend;
use debate_chat::api::models::{ChatMessage, Profile, SendOutcome};
use debate_chat::error::{TransportError, TransportResult};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::oneshot;

/// What the fake server answers to a send: a conversation id or an HTTP status.
pub type SendReply = Result<String, u16>;

enum Reply {
    Now(SendReply),
    Gated(oneshot::Receiver<SendReply>),
}

fn status(code: u16) -> TransportError {
    TransportError::Status {
        status: code,
        body: format!("fake error {}", code),
    }
}

/// In-memory conversation service. Sends are answered immediately with
/// `conv-1` unless a reply or a gate was registered for the message text.
#[derive(Default)]
pub struct FakeBackend {
    profiles: Mutex<Option<Result<Vec<Profile>, u16>>>,
    replies: Mutex<HashMap<String, Reply>>,
    histories: Mutex<HashMap<String, Vec<ChatMessage>>>,
    history_fails: AtomicBool,
    apply_fails: AtomicBool,
    pub applied: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<(Option<String>, String)>>,
    pub history_calls: Mutex<Vec<(String, u32)>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(self, profiles: Result<Vec<Profile>, u16>) -> Self {
        *self.profiles.lock().unwrap() = Some(profiles);
        self
    }

    pub fn with_history(self, id: &str, messages: Vec<ChatMessage>) -> Self {
        self.histories.lock().unwrap().insert(id.to_string(), messages);
        self
    }

    pub fn reply(&self, text: &str, reply: SendReply) {
        self.replies
            .lock()
            .unwrap()
            .insert(text.to_string(), Reply::Now(reply));
    }

    /// The send for `text` blocks until the returned sender fires.
    pub fn gate(&self, text: &str) -> oneshot::Sender<SendReply> {
        let (tx, rx) = oneshot::channel();
        self.replies
            .lock()
            .unwrap()
            .insert(text.to_string(), Reply::Gated(rx));
        tx
    }

    pub fn fail_history(&self, fail: bool) {
        self.history_fails.store(fail, Ordering::SeqCst);
    }

    pub fn fail_apply(&self, fail: bool) {
        self.apply_fails.store(fail, Ordering::SeqCst);
    }

    pub fn history_of(&self, id: &str) -> Vec<ChatMessage> {
        self.histories
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn applied(&self) -> Vec<String> {
        self.applied.lock().unwrap().clone()
    }

    pub fn history_calls(&self) -> Vec<(String, u32)> {
        self.history_calls.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn list_profiles(&self) -> TransportResult<Vec<Profile>> {
        let configured = self.profiles.lock().unwrap().clone();
        match configured {
            Some(Ok(list)) => Ok(list),
            Some(Err(code)) => Err(status(code)),
            None => Ok(Vec::new()),
        }
    }

    async fn set_active_profile(&self, profile_id: &str) -> TransportResult<()> {
        self.applied.lock().unwrap().push(profile_id.to_string());
        if self.apply_fails.load(Ordering::SeqCst) {
            return Err(status(500));
        }
        Ok(())
    }

    async fn send_message(
        &self,
        conversation_id: Option<&str>,
        text: &str,
    ) -> TransportResult<SendOutcome> {
        self.sent
            .lock()
            .unwrap()
            .push((conversation_id.map(str::to_string), text.to_string()));
        let reply = self.replies.lock().unwrap().remove(text);
        let answer = match reply {
            Some(Reply::Now(answer)) => answer,
            Some(Reply::Gated(rx)) => rx.await.unwrap_or(Err(599)),
            None => Ok(conversation_id.unwrap_or("conv-1").to_string()),
        };
        let id = answer.map_err(status)?;
        let seed = {
            let mut histories = self.histories.lock().unwrap();
            let history = histories.entry(id.clone()).or_default();
            history.push(ChatMessage::user(text));
            history.push(ChatMessage::assistant(format!("counter: {}", text)));
            history.clone()
        };
        Ok(SendOutcome {
            conversation_id: id,
            seed,
        })
    }

    async fn fetch_history(
        &self,
        conversation_id: &str,
        limit: u32,
    ) -> TransportResult<Vec<ChatMessage>> {
        self.history_calls
            .lock()
            .unwrap()
            .push((conversation_id.to_string(), limit));
        if self.history_fails.load(Ordering::SeqCst) {
            return Err(status(503));
        }
        Ok(self.history_of(conversation_id))
    }
}

/// Yield until `cond` holds, so a concurrently polled future can make progress.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}
