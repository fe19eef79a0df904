//! Conversation session and its IDLE/TYPING state machine
//!
//! The session owns the message list. Messages are only ever appended, and
//! callers only get shared references, so a rendered message cannot change.
//! A submit moves the session to `Typing` and hands back a [`Ticket`]; the
//! matching `complete` appends the assistant reply. Reset bumps the
//! generation, which turns every outstanding ticket stale.

use rand::Rng;
use thiserror::Error;

use crate::responder;
use crate::state::{ChatMessage, ChatRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendRejected {
    #[error("message is empty")]
    Empty,
    #[error("a response is already being typed")]
    Busy,
    #[error("no async runtime to schedule the response on")]
    NoRuntime,
}

/// Handle for one scheduled response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    generation: u64,
    seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Typing { ticket: Ticket, prompt: String },
}

#[derive(Debug)]
pub struct Session {
    messages: Vec<ChatMessage>,
    phase: Phase,
    generation: u64,
    next_seq: u64,
    revision: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            phase: Phase::Idle,
            generation: 0,
            next_seq: 0,
            revision: 0,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_typing(&self) -> bool {
        matches!(self.phase, Phase::Typing { .. })
    }

    /// Bumped on every visible change; hosts use it to know when to scroll
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether a send of `input` would be accepted right now
    pub fn can_send(&self, input: &str) -> bool {
        self.check_send(input).is_ok()
    }

    fn check_send<'a>(&self, input: &'a str) -> Result<&'a str, SendRejected> {
        let text = input.trim();
        if text.is_empty() {
            return Err(SendRejected::Empty);
        }
        if self.is_typing() {
            return Err(SendRejected::Busy);
        }
        Ok(text)
    }

    /// IDLE -> TYPING: append the trimmed user message and start a response
    pub fn submit(&mut self, input: &str) -> Result<Ticket, SendRejected> {
        let text = self.check_send(input)?;

        let ticket = Ticket {
            generation: self.generation,
            seq: self.next_seq,
        };
        self.next_seq += 1;

        self.messages.push(ChatMessage::new(ChatRole::User, text));
        self.phase = Phase::Typing {
            ticket,
            prompt: text.to_string(),
        };
        self.revision += 1;
        Ok(ticket)
    }

    /// Whether `ticket` is the response currently being typed
    pub fn is_current(&self, ticket: Ticket) -> bool {
        matches!(&self.phase, Phase::Typing { ticket: current, .. } if *current == ticket)
    }

    /// TYPING -> IDLE: generate and append the reply for `ticket`.
    /// Returns `None` and changes nothing if the ticket is stale.
    pub fn complete<R: Rng + ?Sized>(&mut self, ticket: Ticket, rng: &mut R) -> Option<&ChatMessage> {
        if !self.is_current(ticket) {
            return None;
        }
        let prompt = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Typing { prompt, .. } => prompt,
            Phase::Idle => return None,
        };

        let response = responder::generate(&prompt, rng);
        tracing::debug!(selection = ?response.selection, "response generated");

        self.messages
            .push(ChatMessage::new(ChatRole::Assistant, response.body));
        self.revision += 1;
        self.messages.last()
    }

    /// Drop every message and any pending response.
    /// Returns the ticket that was cancelled, if one was in flight.
    pub fn reset(&mut self) -> Option<Ticket> {
        let cancelled = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Typing { ticket, .. } => Some(ticket),
            Phase::Idle => None,
        };
        self.messages.clear();
        self.generation += 1;
        self.revision += 1;
        cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::{FALLBACKS, RULES};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_blank_input_rejected() {
        let mut session = Session::new();
        assert_eq!(session.submit(""), Err(SendRejected::Empty));
        assert_eq!(session.submit("  \n\t "), Err(SendRejected::Empty));
        assert!(session.messages().is_empty());
        assert!(!session.is_typing());
        assert_eq!(session.revision(), 0);
    }

    #[test]
    fn test_submit_trims_and_starts_typing() {
        let mut session = Session::new();
        let ticket = session.submit("  hello  ").unwrap();
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].content, "hello");
        assert_eq!(session.messages()[0].role, ChatRole::User);
        assert!(session.is_current(ticket));
        assert_eq!(
            session.phase(),
            &Phase::Typing {
                ticket,
                prompt: "hello".to_string()
            }
        );
    }

    #[test]
    fn test_send_blocked_while_typing() {
        let mut session = Session::new();
        session.submit("first").unwrap();
        let revision = session.revision();

        assert!(!session.can_send("second"));
        assert_eq!(session.submit("second"), Err(SendRejected::Busy));
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.revision(), revision);
    }

    #[test]
    fn test_complete_appends_reply_for_prompt() {
        let mut session = Session::new();
        let ticket = session.submit("Write an EMAIL").unwrap();
        let reply = session.complete(ticket, &mut rng()).unwrap();
        assert_eq!(reply.role, ChatRole::Assistant);
        assert_eq!(reply.content, RULES[0].template());
        assert!(!session.is_typing());
        assert!(session.can_send("again"));
    }

    #[test]
    fn test_complete_twice_is_noop() {
        let mut session = Session::new();
        let ticket = session.submit("hi").unwrap();
        assert!(session.complete(ticket, &mut rng()).is_some());
        assert!(session.complete(ticket, &mut rng()).is_none());
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn test_n_exchanges_give_2n_messages_in_order() {
        let mut session = Session::new();
        let mut rng = rng();
        let n = 25;
        for i in 0..n {
            let ticket = session.submit(&format!("question {i}")).unwrap();
            session.complete(ticket, &mut rng).unwrap();
        }

        let messages = session.messages();
        assert_eq!(messages.len(), 2 * n);
        for (i, pair) in messages.chunks(2).enumerate() {
            assert_eq!(pair[0].role, ChatRole::User);
            assert_eq!(pair[0].content, format!("question {i}"));
            assert_eq!(pair[1].role, ChatRole::Assistant);
            assert!(FALLBACKS.contains(&pair[1].content.as_str()));
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = Session::new();
        let mut rng = rng();
        for text in ["one", "two", "three"] {
            let ticket = session.submit(text).unwrap();
            session.complete(ticket, &mut rng);
        }
        assert_eq!(session.reset(), None);
        assert!(session.messages().is_empty());
        assert!(!session.is_typing());
    }

    #[test]
    fn test_reset_invalidates_pending_ticket() {
        let mut session = Session::new();
        let stale = session.submit("quantum please").unwrap();
        assert_eq!(session.reset(), Some(stale));

        // a late completion must not touch the fresh thread
        assert!(session.complete(stale, &mut rng()).is_none());
        assert!(session.messages().is_empty());

        let fresh = session.submit("hello").unwrap();
        assert_ne!(fresh, stale);
        assert!(session.complete(stale, &mut rng()).is_none());
        assert!(session.is_current(fresh));
        assert_eq!(session.messages().len(), 1);
    }
}
