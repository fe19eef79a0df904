pub mod config;
pub mod controller;
pub mod markup;
pub mod render;
pub mod responder;
pub mod session;
pub mod state;
pub mod suggestions;
pub mod toast;
pub mod viewport;

// Re-export main types for convenience
pub use config::Config;
pub use controller::{Completions, Controller, DelayWindow};
pub use render::{thread_view, MessageAction, MessageNode, RenderOptions, ThreadView, ViewNode};
pub use responder::{Response, Selection, Topic};
pub use session::{Phase, SendRejected, Session, Ticket};
pub use state::{ChatMessage, ChatRole};
pub use suggestions::{Suggestion, SUGGESTIONS};
pub use toast::{ToastPhase, ToastTimings, Toasts};
pub use viewport::Viewport;
