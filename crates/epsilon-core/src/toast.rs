//! Transient toast notifications
//!
//! Only one toast exists at a time; showing a new one replaces the old.
//! Callers pass the current instant so tests can drive time by hand.

use std::time::{Duration, Instant};

pub const DEFAULT_VISIBLE: Duration = Duration::from_millis(2000);
pub const DEFAULT_FADE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastTimings {
    pub visible: Duration,
    pub fade: Duration,
}

impl Default for ToastTimings {
    fn default() -> Self {
        Self {
            visible: DEFAULT_VISIBLE,
            fade: DEFAULT_FADE,
        }
    }
}

impl ToastTimings {
    pub fn lifetime(&self) -> Duration {
        self.visible + self.fade
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    Visible,
    FadingOut,
}

#[derive(Debug, Clone)]
struct Toast {
    text: String,
    shown_at: Instant,
}

#[derive(Debug, Default)]
pub struct Toasts {
    current: Option<Toast>,
    timings: ToastTimings,
}

impl Toasts {
    pub fn new(timings: ToastTimings) -> Self {
        Self {
            current: None,
            timings,
        }
    }

    pub fn show(&mut self, text: impl Into<String>, now: Instant) {
        self.current = Some(Toast {
            text: text.into(),
            shown_at: now,
        });
    }

    /// The live toast and where it is in its lifetime
    pub fn current(&self, now: Instant) -> Option<(&str, ToastPhase)> {
        let toast = self.current.as_ref()?;
        let age = now.saturating_duration_since(toast.shown_at);
        if age < self.timings.visible {
            Some((&toast.text, ToastPhase::Visible))
        } else if age < self.timings.lifetime() {
            Some((&toast.text, ToastPhase::FadingOut))
        } else {
            None
        }
    }

    /// Forget an expired toast. Returns true if one was removed.
    pub fn prune(&mut self, now: Instant) -> bool {
        if self.current.is_some() && self.current(now).is_none() {
            self.current = None;
            return true;
        }
        false
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_lifecycle() {
        let mut toasts = Toasts::default();
        let start = Instant::now();
        toasts.show("Copied to clipboard", start);

        assert_eq!(
            toasts.current(start + Duration::from_millis(1999)),
            Some(("Copied to clipboard", ToastPhase::Visible))
        );
        assert_eq!(
            toasts.current(start + Duration::from_millis(2100)),
            Some(("Copied to clipboard", ToastPhase::FadingOut))
        );
        assert_eq!(toasts.current(start + Duration::from_millis(2300)), None);

        assert!(!toasts.prune(start + Duration::from_millis(100)));
        assert!(toasts.prune(start + Duration::from_millis(2300)));
        assert!(toasts.current(start).is_none());
    }

    #[test]
    fn test_new_toast_replaces_old() {
        let mut toasts = Toasts::default();
        let start = Instant::now();
        toasts.show("first", start);
        let later = start + Duration::from_millis(1500);
        toasts.show("second", later);

        // the first would have expired here, the second has not
        let at = start + Duration::from_millis(2500);
        assert_eq!(toasts.current(at), Some(("second", ToastPhase::Visible)));
    }

    #[test]
    fn test_custom_timings() {
        let mut toasts = Toasts::new(ToastTimings {
            visible: Duration::from_millis(100),
            fade: Duration::ZERO,
        });
        let start = Instant::now();
        toasts.show("x", start);
        assert!(toasts.current(start + Duration::from_millis(99)).is_some());
        assert!(toasts.current(start + Duration::from_millis(100)).is_none());
    }
}
