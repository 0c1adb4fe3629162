//! Assistant conversation state, shared by every front end.
//!
//! The session allows at most one backend call in flight. A second turn sent
//! while a reply is outstanding is rejected rather than queued, so replies can
//! only ever land directly after the user turn that triggered them.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::AssistantBackend;
use crate::error::StoreError;

/// Shown in place of a reply whenever the assistant call fails
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Opening message of the storefront assistant
pub const DEFAULT_GREETING: &str = "Hi! I'm your AI assistant. I can help you find apps, \
answer questions about the app store, or provide recommendations. What can I help you with today?";

/// Who wrote a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Assistant,
}

/// One message in the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub sender: Sender,
    pub text: String,
    /// Position in the transcript, starting at 0
    pub order: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingReply,
}

/// An accepted user turn whose assistant call has not run yet
#[derive(Debug, Clone)]
pub struct PendingTurn {
    query: String,
    ticket: u64,
}

impl PendingTurn {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub async fn execute<B>(self, backend: &B) -> TurnReply
    where
        B: AssistantBackend + ?Sized,
    {
        let outcome = backend.chat(&self.query).await;
        TurnReply {
            ticket: self.ticket,
            outcome,
        }
    }
}

/// Result of the assistant call for the turn that was issued `ticket`
#[derive(Debug)]
pub struct TurnReply {
    pub ticket: u64,
    pub outcome: Result<String, StoreError>,
}

#[derive(Debug, Default)]
pub struct ConversationSession {
    transcript: Vec<ConversationTurn>,
    state: SessionState,
    /// Ticket of the turn whose reply is outstanding
    outstanding: Option<u64>,
    /// Never reset, so a reply from before `reset` cannot match a later turn
    next_ticket: u64,
    greeting: Option<String>,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that opens with an assistant greeting, re-sent after every reset
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        let mut session = Self {
            greeting: Some(greeting.into()),
            ..Self::default()
        };
        session.seed_greeting();
        session
    }

    /// Accept a user turn, or `None` if the text is blank or a reply is still pending
    pub fn send_turn(&mut self, text: &str) -> Option<PendingTurn> {
        if text.trim().is_empty() {
            return None;
        }
        if self.state == SessionState::AwaitingReply {
            debug!("turn rejected: reply still outstanding");
            return None;
        }

        self.append(Sender::User, text.to_string());
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.state = SessionState::AwaitingReply;
        self.outstanding = Some(ticket);

        Some(PendingTurn {
            query: text.to_string(),
            ticket,
        })
    }

    /// Close out the outstanding turn with the assistant's reply or the fallback text.
    ///
    /// Returns the appended assistant turn, or `None` if the reply does not
    /// belong to the outstanding turn (for example it arrived after a reset).
    pub fn complete(&mut self, reply: TurnReply) -> Option<&ConversationTurn> {
        if self.outstanding != Some(reply.ticket) {
            debug!(ticket = reply.ticket, "ignoring reply for a turn that is not outstanding");
            return None;
        }

        let text = match reply.outcome {
            Ok(text) => text,
            Err(err) => {
                warn!(ticket = reply.ticket, error = %err, "assistant call failed");
                FALLBACK_REPLY.to_string()
            }
        };

        self.outstanding = None;
        self.state = SessionState::Idle;
        self.append(Sender::Assistant, text);
        self.transcript.last()
    }

    /// Send a turn and wait for its reply in one step
    pub async fn converse<B>(&mut self, backend: &B, text: &str) -> Option<&ConversationTurn>
    where
        B: AssistantBackend + ?Sized,
    {
        let pending = self.send_turn(text)?;
        let reply = pending.execute(backend).await;
        self.complete(reply)
    }

    /// Clear the transcript. Any reply still in flight is discarded when it arrives.
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.state = SessionState::Idle;
        self.outstanding = None;
        self.seed_greeting();
    }

    pub fn transcript(&self) -> &[ConversationTurn] {
        &self.transcript
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.state == SessionState::AwaitingReply
    }

    fn seed_greeting(&mut self) {
        if let Some(greeting) = self.greeting.clone() {
            self.append(Sender::Assistant, greeting);
        }
    }

    fn append(&mut self, sender: Sender, text: String) {
        let order = self.transcript.len();
        self.transcript.push(ConversationTurn {
            sender,
            text,
            order,
        });
    }
}
