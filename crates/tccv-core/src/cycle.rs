//! The send/receive cycle shared by every chat surface.
//!
//! A send is split in three steps so that all state changes happen on the
//! caller's thread and only the network call suspends:
//!
//! 1. [`ChatSession::submit`] appends the user message, clears the composer
//!    and raises the typing flag. It hands back an [`Outbound`] ticket.
//! 2. [`dispatch`] performs the request for a ticket. It touches no session
//!    state and can run in a spawned task.
//! 3. [`ChatSession::resolve`] appends the bot reply (or the error text) and
//!    lowers the typing flag once nothing is left pending.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::api::{ChatBackend, ChatResponse};
use crate::composer::Composer;
use crate::error::ApiError;
use crate::state::{Conversation, Message};

/// Shown in place of a reply when a send fails for any reason
pub const DEFAULT_ERROR_TEXT: &str = "Lỗi khi gửi tin nhắn.";

/// How a surface handles a send while another one is still pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendPolicy {
    /// Every send goes out at once; replies land in whatever order they
    /// come back.
    #[default]
    Concurrent,
    /// One request in flight at a time; later sends wait their turn, so
    /// replies follow send order.
    Serialized,
}

/// A request waiting to be dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub id: u64,
    pub text: String,
}

/// The outcome of one dispatched request
#[derive(Debug)]
pub struct Reply {
    pub id: u64,
    pub outcome: Result<ChatResponse, ApiError>,
}

/// Run the network call for one ticket.
pub async fn dispatch<B: ChatBackend>(backend: &B, outbound: Outbound) -> Reply {
    tracing::debug!(id = outbound.id, "dispatching message");
    let outcome = backend.send_message(&outbound.text).await;
    Reply {
        id: outbound.id,
        outcome,
    }
}

#[derive(Debug)]
pub struct ChatSession {
    conversation: Conversation,
    composer: Composer,
    policy: SendPolicy,
    error_text: String,
    in_flight: Vec<u64>,
    queued: VecDeque<Outbound>,
    next_id: u64,
    revision: u64,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(SendPolicy::default())
    }
}

impl ChatSession {
    pub fn new(policy: SendPolicy) -> Self {
        Self {
            conversation: Conversation::new(),
            composer: Composer::new(),
            policy,
            error_text: DEFAULT_ERROR_TEXT.to_string(),
            in_flight: Vec::new(),
            queued: VecDeque::new(),
            next_id: 0,
            revision: 0,
        }
    }

    pub fn with_error_text(mut self, text: impl Into<String>) -> Self {
        self.error_text = text.into();
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }

    pub fn policy(&self) -> SendPolicy {
        self.policy
    }

    /// True while any send of this session has not been resolved
    pub fn is_typing(&self) -> bool {
        !self.in_flight.is_empty() || !self.queued.is_empty()
    }

    /// Bumped on every append and every typing flag change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Start a send from the composer contents.
    ///
    /// Returns `None` when the input is blank (nothing changes) or when the
    /// request was queued behind one already in flight.
    pub fn submit(&mut self) -> Option<Outbound> {
        if self.composer.is_blank() {
            return None;
        }

        let text = self.composer.take();
        self.conversation.push(Message::user(text.clone()));
        self.revision += 1;

        let outbound = Outbound {
            id: self.next_id,
            text,
        };
        self.next_id += 1;

        if self.policy == SendPolicy::Serialized && !self.in_flight.is_empty() {
            tracing::debug!(id = outbound.id, queued = self.queued.len() + 1, "queueing message");
            self.queued.push_back(outbound);
            return None;
        }

        self.in_flight.push(outbound.id);
        Some(outbound)
    }

    /// Record the outcome of a dispatched request.
    ///
    /// Returns the next queued request to dispatch, if any.
    pub fn resolve(&mut self, reply: Reply) -> Option<Outbound> {
        let Some(pos) = self.in_flight.iter().position(|&id| id == reply.id) else {
            tracing::warn!(id = reply.id, "ignoring reply for unknown request");
            return None;
        };
        self.in_flight.remove(pos);

        let text = match reply.outcome {
            Ok(response) => response.response,
            Err(err) => {
                tracing::error!(id = reply.id, error = %err, "error sending message");
                self.error_text.clone()
            }
        };
        self.conversation.push(Message::bot(text));
        self.revision += 1;

        let next = self.queued.pop_front()?;
        self.in_flight.push(next.id);
        Some(next)
    }

    /// Submit and wait for the reply, including anything queued behind it.
    pub async fn send<B: ChatBackend>(&mut self, backend: &B) {
        let mut next = self.submit();
        while let Some(outbound) = next {
            let reply = dispatch(backend, outbound).await;
            next = self.resolve(reply);
        }
    }
}
