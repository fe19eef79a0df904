//! Interaction controller
//!
//! Owns the session and the single in-flight response timer. A send spawns a
//! task that sleeps for a random delay and then posts the response ticket on
//! the completion channel; the host's event loop hands the ticket back to
//! [`Controller::complete`], so every session mutation stays on one task.

use std::time::Duration;

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::session::{SendRejected, Session, Ticket};
use crate::state::ChatMessage;
use crate::suggestions::Suggestion;

/// Receiving end for finished response timers
pub type Completions = mpsc::UnboundedReceiver<Ticket>;

/// Half-open range `[min, max)` the simulated typing delay is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayWindow {
    min: Duration,
    max: Duration,
}

impl Default for DelayWindow {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(1500),
            max: Duration::from_millis(3000),
        }
    }
}

impl DelayWindow {
    pub fn new(min: Duration, max: Duration) -> Result<Self> {
        if min >= max {
            bail!(
                "invalid response delay: min {}ms must be below max {}ms",
                min.as_millis(),
                max.as_millis()
            );
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        rng.gen_range(self.min..self.max)
    }
}

pub struct Controller<R = StdRng> {
    session: Session,
    rng: R,
    delay: DelayWindow,
    tx: mpsc::UnboundedSender<Ticket>,
    pending: Option<JoinHandle<()>>,
}

impl Controller<StdRng> {
    pub fn from_config(config: &Config) -> Result<(Self, Completions)> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self::new(config.delay_window()?, rng))
    }
}

impl<R: Rng> Controller<R> {
    pub fn new(delay: DelayWindow, rng: R) -> (Self, Completions) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = Self {
            session: Session::new(),
            rng,
            delay,
            tx,
            pending: None,
        };
        (controller, rx)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn can_send(&self, input: &str) -> bool {
        self.session.can_send(input)
    }

    /// Append the user's message and schedule the reply on the current
    /// tokio runtime. Without one the send is rejected and nothing changes.
    pub fn send(&mut self, input: &str) -> Result<Duration, SendRejected> {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("send attempted outside a tokio runtime");
            return Err(SendRejected::NoRuntime);
        };

        let ticket = match self.session.submit(input) {
            Ok(ticket) => ticket,
            Err(reason) => {
                tracing::debug!(%reason, "send rejected");
                return Err(reason);
            }
        };

        let delay = self.delay.sample(&mut self.rng);
        let tx = self.tx.clone();
        self.pending = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the host is shutting down
            let _ = tx.send(ticket);
        }));

        tracing::info!(delay_ms = delay.as_millis() as u64, "response scheduled");
        Ok(delay)
    }

    pub fn send_suggestion(&mut self, suggestion: &Suggestion) -> Result<Duration, SendRejected> {
        tracing::debug!(title = suggestion.title, "suggestion picked");
        self.send(suggestion.prompt)
    }

    /// Apply a finished timer. Stale tickets from before a reset are dropped.
    pub fn complete(&mut self, ticket: Ticket) -> Option<&ChatMessage> {
        if !self.session.is_current(ticket) {
            tracing::debug!(?ticket, "discarding stale response");
            return None;
        }
        self.pending = None;
        let reply = self.session.complete(ticket, &mut self.rng);
        if reply.is_some() {
            tracing::info!("response delivered");
        }
        reply
    }

    /// Start over: clear the thread and cancel any pending reply
    pub fn new_chat(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        match self.session.reset() {
            Some(ticket) => tracing::info!(?ticket, "new chat, pending response cancelled"),
            None => tracing::info!("new chat"),
        }
    }
}

impl<R> Drop for Controller<R> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_window_rejects_empty_range() {
        let d = Duration::from_millis(10);
        assert!(DelayWindow::new(d, d).is_err());
        assert!(DelayWindow::new(d * 2, d).is_err());
    }

    #[test]
    fn test_delay_samples_stay_in_window() {
        let window = DelayWindow::default();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            let delay = window.sample(&mut rng);
            assert!(delay >= Duration::from_millis(1500));
            assert!(delay < Duration::from_millis(3000));
        }
    }

    #[tokio::test]
    async fn test_rejected_send_schedules_nothing() {
        let (mut controller, mut completions) =
            Controller::new(DelayWindow::default(), StdRng::seed_from_u64(1));
        assert_eq!(controller.send("   "), Err(SendRejected::Empty));
        assert!(controller.pending.is_none());
        assert!(completions.try_recv().is_err());
    }

    #[test]
    fn test_send_without_runtime_is_rejected() {
        let (mut controller, mut completions) =
            Controller::new(DelayWindow::default(), StdRng::seed_from_u64(1));
        assert_eq!(controller.send("hello"), Err(SendRejected::NoRuntime));
        assert!(controller.session().messages().is_empty());
        assert!(!controller.session().is_typing());
        assert!(controller.pending.is_none());
        assert!(completions.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_new_chat_aborts_timer() {
        let (mut controller, _completions) =
            Controller::new(DelayWindow::default(), StdRng::seed_from_u64(1));
        controller.send("hello").unwrap();
        assert!(controller.pending.is_some());
        controller.new_chat();
        assert!(controller.pending.is_none());
        assert!(controller.session().messages().is_empty());
        assert!(!controller.session().is_typing());
    }
}
