//! Render pipeline: session state in, thread view out
//!
//! The view is rebuilt from the session every time; nothing here holds state.
//! User text is escaped on the way in, assistant bodies are trusted template
//! markup and pass through untouched.

use crate::markup::escape_html;
use crate::session::Session;
use crate::state::{ChatMessage, ChatRole};

pub const DEFAULT_ASSISTANT_NAME: &str = "Epsilon AI";
pub const DEFAULT_LOGO_SRC: &str = "./image.png";

/// Secondary actions offered on every assistant message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageAction {
    Copy,
    Regenerate,
    Like,
    Dislike,
}

impl MessageAction {
    pub const ALL: [MessageAction; 4] = [
        MessageAction::Copy,
        MessageAction::Regenerate,
        MessageAction::Like,
        MessageAction::Dislike,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            MessageAction::Copy => "Copy",
            MessageAction::Regenerate => "Regenerate",
            MessageAction::Like => "Like",
            MessageAction::Dislike => "Dislike",
        }
    }

    fn icon_class(&self) -> &'static str {
        match self {
            MessageAction::Copy => "icon-copy",
            MessageAction::Regenerate => "icon-refresh",
            MessageAction::Like => "icon-thumbup",
            MessageAction::Dislike => "icon-thumbdown",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub assistant_name: String,
    pub logo_src: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            assistant_name: DEFAULT_ASSISTANT_NAME.to_string(),
            logo_src: DEFAULT_LOGO_SRC.to_string(),
        }
    }
}

/// One rendered message entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageNode {
    pub role: ChatRole,
    pub author: String,
    pub time: String,
    /// Safe-to-insert HTML for the message body
    pub body_html: String,
    pub actions: &'static [MessageAction],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewNode {
    Message(MessageNode),
    /// Transient placeholder while a response is pending
    Typing { author: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadView {
    /// No messages yet: the welcome screen with suggestions
    Welcome,
    Thread(Vec<ViewNode>),
}

/// Build the view node for a single message
pub fn message_node(message: &ChatMessage, options: &RenderOptions) -> MessageNode {
    match message.role {
        ChatRole::User => MessageNode {
            role: ChatRole::User,
            author: "You".to_string(),
            time: message.display_time(),
            body_html: user_body_html(&message.content),
            actions: &[],
        },
        ChatRole::Assistant => MessageNode {
            role: ChatRole::Assistant,
            author: options.assistant_name.clone(),
            time: message.display_time(),
            body_html: message.content.clone(),
            actions: &MessageAction::ALL,
        },
    }
}

/// Escaped paragraph for user text; newlines become `<br>`
pub fn user_body_html(text: &str) -> String {
    let lines: Vec<String> = text.lines().map(escape_html).collect();
    format!("<p>{}</p>", lines.join("<br>"))
}

/// The full view for a session
pub fn thread_view(session: &Session, options: &RenderOptions) -> ThreadView {
    if session.messages().is_empty() {
        return ThreadView::Welcome;
    }

    let mut nodes: Vec<ViewNode> = session
        .messages()
        .iter()
        .map(|message| ViewNode::Message(message_node(message, options)))
        .collect();

    if session.is_typing() {
        nodes.push(ViewNode::Typing {
            author: options.assistant_name.clone(),
        });
    }

    ThreadView::Thread(nodes)
}

impl MessageNode {
    pub fn to_html(&self, options: &RenderOptions) -> String {
        let author = escape_html(&self.author);
        match self.role {
            ChatRole::User => format!(
                concat!(
                    "<div class=\"message user\">",
                    "<div class=\"message-avatar\">You</div>",
                    "<div class=\"message-content\">",
                    "<div class=\"message-header\">",
                    "<span class=\"message-author\">{author}</span>",
                    "<span class=\"message-time\">{time}</span>",
                    "</div>",
                    "<div class=\"message-text\">{body}</div>",
                    "</div></div>"
                ),
                author = author,
                time = self.time,
                body = self.body_html,
            ),
            ChatRole::Assistant => {
                let actions: String = self
                    .actions
                    .iter()
                    .map(|action| {
                        format!(
                            "<button class=\"action-btn\" title=\"{}\"><span class=\"{}\"></span></button>",
                            action.title(),
                            action.icon_class()
                        )
                    })
                    .collect();
                format!(
                    concat!(
                        "<div class=\"message assistant\">",
                        "<div class=\"message-avatar\"><img src=\"{logo}\" alt=\"{author}\"></div>",
                        "<div class=\"message-content\">",
                        "<div class=\"message-header\">",
                        "<span class=\"message-author\">{author}</span>",
                        "<span class=\"message-time\">{time}</span>",
                        "</div>",
                        "<div class=\"message-text\">{body}</div>",
                        "<div class=\"message-actions\">{actions}</div>",
                        "</div></div>"
                    ),
                    logo = escape_html(&options.logo_src),
                    author = author,
                    time = self.time,
                    body = self.body_html,
                    actions = actions,
                )
            }
        }
    }
}

impl ViewNode {
    pub fn to_html(&self, options: &RenderOptions) -> String {
        match self {
            ViewNode::Message(node) => node.to_html(options),
            ViewNode::Typing { author } => format!(
                concat!(
                    "<div class=\"message assistant typing\">",
                    "<div class=\"message-avatar\"><img src=\"{logo}\" alt=\"{author}\"></div>",
                    "<div class=\"message-content\">",
                    "<div class=\"message-header\">",
                    "<span class=\"message-author\">{author}</span>",
                    "</div>",
                    "<div class=\"typing-indicator\"><span></span><span></span><span></span></div>",
                    "</div></div>"
                ),
                logo = escape_html(&options.logo_src),
                author = escape_html(author),
            ),
        }
    }
}

impl ThreadView {
    pub fn nodes(&self) -> &[ViewNode] {
        match self {
            ThreadView::Welcome => &[],
            ThreadView::Thread(nodes) => nodes,
        }
    }

    pub fn to_html(&self, options: &RenderOptions) -> String {
        match self {
            ThreadView::Welcome => "<div class=\"messages\"></div>".to_string(),
            ThreadView::Thread(nodes) => {
                let inner: String = nodes.iter().map(|node| node.to_html(options)).collect();
                format!("<div class=\"messages active\">{}</div>", inner)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::plain_text;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_user_text_is_escaped() {
        let node = message_node(
            &ChatMessage::user("<script>alert(1)</script>"),
            &RenderOptions::default(),
        );
        assert_eq!(node.body_html, "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>");
        assert_eq!(plain_text(&node.body_html), "<script>alert(1)</script>");

        let html = node.to_html(&RenderOptions::default());
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_assistant_body_is_trusted() {
        let node = message_node(
            &ChatMessage::assistant("<p><strong>Hi</strong></p>"),
            &RenderOptions::default(),
        );
        assert_eq!(node.body_html, "<p><strong>Hi</strong></p>");
        assert_eq!(node.actions.len(), 4);
        let html = node.to_html(&RenderOptions::default());
        assert!(html.contains("<p><strong>Hi</strong></p>"));
        assert!(html.contains("title=\"Copy\""));
        assert!(html.contains("title=\"Dislike\""));
    }

    #[test]
    fn test_multiline_user_text() {
        assert_eq!(user_body_html("a\nb & c"), "<p>a<br>b &amp; c</p>");
    }

    #[test]
    fn test_welcome_until_first_send() {
        let mut session = Session::new();
        let options = RenderOptions::default();
        assert_eq!(thread_view(&session, &options), ThreadView::Welcome);

        let ticket = session.submit("hello").unwrap();
        let view = thread_view(&session, &options);
        let nodes = view.nodes();
        assert_eq!(nodes.len(), 2);
        assert!(matches!(nodes[1], ViewNode::Typing { .. }));
        assert!(view.to_html(&options).contains("typing-indicator"));

        session.complete(ticket, &mut StdRng::seed_from_u64(1));
        let view = thread_view(&session, &options);
        assert_eq!(view.nodes().len(), 2);
        assert!(view.nodes().iter().all(|n| matches!(n, ViewNode::Message(_))));
        assert!(!view.to_html(&options).contains("typing-indicator"));
    }

    #[test]
    fn test_assistant_name_is_escaped_in_html() {
        let options = RenderOptions {
            assistant_name: "<Bot>".to_string(),
            ..RenderOptions::default()
        };
        let node = message_node(&ChatMessage::assistant("<p>x</p>"), &options);
        let html = node.to_html(&options);
        assert!(html.contains("&lt;Bot&gt;"));
        assert!(!html.contains("<Bot>"));
    }
}
