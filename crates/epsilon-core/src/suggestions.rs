//! Suggestion cards shown on the welcome screen

use crate::responder::Topic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggestion {
    pub title: &'static str,
    pub subtitle: &'static str,
    /// Literal text submitted when the card is picked
    pub prompt: &'static str,
    pub topic: Topic,
}

pub static SUGGESTIONS: [Suggestion; 4] = [
    Suggestion {
        title: "Write an email",
        subtitle: "Draft a professional project update",
        prompt: "Help me write a professional email to update my team on project progress",
        topic: Topic::Email,
    },
    Suggestion {
        title: "Review my code",
        subtitle: "Find bugs and suggest improvements",
        prompt: "Can you review my code and suggest optimizations?",
        topic: Topic::CodeReview,
    },
    Suggestion {
        title: "Brainstorm ideas",
        subtitle: "Generate creative startup concepts",
        prompt: "Brainstorm some innovative startup ideas with me",
        topic: Topic::Brainstorm,
    },
    Suggestion {
        title: "Explain a concept",
        subtitle: "Quantum computing in simple terms",
        prompt: "Explain quantum computing in simple terms",
        topic: Topic::Quantum,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::select_rule;

    #[test]
    fn test_each_suggestion_hits_its_topic() {
        for suggestion in &SUGGESTIONS {
            let rule = select_rule(suggestion.prompt).map(|r| r.topic);
            assert_eq!(rule, Some(suggestion.topic), "{}", suggestion.title);
        }
    }
}
