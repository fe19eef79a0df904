//! Canned response generation
//!
//! User text is case-folded and tested against an ordered list of keyword
//! rules; the first match wins. Anything that matches no rule gets one of the
//! generic fallback templates, chosen uniformly with the caller's RNG.
//! Every body returned here is a fixed template and never contains user input.

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Email,
    CodeReview,
    Brainstorm,
    Quantum,
}

/// A keyword predicate bound to a fixed response template
#[derive(Debug)]
pub struct ResponseRule {
    pub topic: Topic,
    keywords: &'static [&'static str],
    template: &'static str,
}

impl ResponseRule {
    /// `folded` must already be lowercase
    pub fn matches(&self, folded: &str) -> bool {
        self.keywords.iter().any(|keyword| folded.contains(keyword))
    }

    pub fn template(&self) -> &'static str {
        self.template
    }
}

/// Which template produced a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Rule(Topic),
    Fallback(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub selection: Selection,
    pub body: &'static str,
}

/// Rules in priority order
pub static RULES: [ResponseRule; 4] = [
    ResponseRule {
        topic: Topic::Email,
        keywords: &["email"],
        template: EMAIL_TEMPLATE,
    },
    ResponseRule {
        topic: Topic::CodeReview,
        keywords: &["code", "review"],
        template: CODE_REVIEW_TEMPLATE,
    },
    ResponseRule {
        topic: Topic::Brainstorm,
        keywords: &["brainstorm", "idea"],
        template: BRAINSTORM_TEMPLATE,
    },
    ResponseRule {
        topic: Topic::Quantum,
        keywords: &["quantum"],
        template: QUANTUM_TEMPLATE,
    },
];

pub static FALLBACKS: [&str; 3] = [FALLBACK_CONTEXT, FALLBACK_THANKS, FALLBACK_BREAKDOWN];

/// First rule matching `text`, ignoring case
pub fn select_rule(text: &str) -> Option<&'static ResponseRule> {
    let folded = text.to_lowercase();
    RULES.iter().find(|rule| rule.matches(&folded))
}

/// Pick the response body for `text`. Total over all inputs.
pub fn generate<R: Rng + ?Sized>(text: &str, rng: &mut R) -> Response {
    match select_rule(text) {
        Some(rule) => Response {
            selection: Selection::Rule(rule.topic),
            body: rule.template,
        },
        None => {
            let idx = rng.gen_range(0..FALLBACKS.len());
            Response {
                selection: Selection::Fallback(idx),
                body: FALLBACKS[idx],
            }
        }
    }
}

const EMAIL_TEMPLATE: &str = r#"<p>I'd be happy to help you write a professional email. Here's a template you can customize:</p>
<pre><code>Subject: Project Update - [Project Name]

Dear Team,

I hope this message finds you well. I wanted to provide you with a brief update on our current progress.

Key Highlights:
• [Achievement 1]
• [Achievement 2]
• [Upcoming milestone]

Next Steps:
We'll be focusing on [next phase] over the coming week.

Please let me know if you have any questions or concerns.

Best regards,
[Your Name]</code></pre>
<p>Feel free to share more details about your specific situation, and I can help you customize this further.</p>"#;

const CODE_REVIEW_TEMPLATE: &str = r#"<p>I'd be glad to help you review and optimize your code! To provide the most helpful feedback, please share:</p>
<p><strong>1. The code snippet</strong> you'd like me to review</p>
<p><strong>2. The programming language</strong> you're using</p>
<p><strong>3. Any specific concerns</strong> (performance, readability, security, etc.)</p>
<p>I can help with:</p>
<ul>
    <li>Identifying potential bugs and edge cases</li>
    <li>Suggesting performance optimizations</li>
    <li>Improving code readability and structure</li>
    <li>Following best practices and design patterns</li>
</ul>
<p>Just paste your code and I'll analyze it for you!</p>"#;

const BRAINSTORM_TEMPLATE: &str = r#"<p>Great! I love brainstorming sessions. Let me help you generate some creative ideas. 🚀</p>
<p>To give you the most relevant suggestions, could you tell me:</p>
<p><strong>1. What industry or domain</strong> are you focusing on?</p>
<p><strong>2. What problem</strong> are you trying to solve?</p>
<p><strong>3. Who is your target audience?</strong></p>
<p>In the meantime, here are some innovative trends to consider:</p>
<ul>
    <li>AI-powered personalization</li>
    <li>Sustainable and eco-friendly solutions</li>
    <li>Community-driven platforms</li>
    <li>Micro-services and modular architecture</li>
</ul>"#;

const QUANTUM_TEMPLATE: &str = r#"<p>Quantum computing is a fascinating field! Let me break it down in simple terms:</p>
<p><strong>Classical computers</strong> use bits that are either 0 or 1. Think of it like a light switch - it's either ON or OFF.</p>
<p><strong>Quantum computers</strong> use quantum bits (qubits) that can be 0, 1, or <em>both at the same time</em> - this is called superposition. Imagine a coin spinning in the air - it's neither heads nor tails until it lands.</p>
<p><strong>Why does this matter?</strong></p>
<p>This allows quantum computers to process many possibilities simultaneously, making them incredibly powerful for specific tasks like:</p>
<ul>
    <li>Breaking encryption codes</li>
    <li>Simulating molecules for drug discovery</li>
    <li>Optimizing complex logistics</li>
    <li>Machine learning acceleration</li>
</ul>
<p>Would you like me to dive deeper into any of these aspects?</p>"#;

const FALLBACK_CONTEXT: &str = r#"<p>That's an interesting question! Let me help you with that.</p>
<p>Based on what you've shared, here are my thoughts:</p>
<p>To provide you with the most accurate and helpful response, could you give me a bit more context about what you're looking to achieve? This will help me tailor my suggestions specifically to your needs.</p>
<p>I'm here to assist with a wide range of topics including:</p>
<ul>
    <li>Writing and content creation</li>
    <li>Code review and development</li>
    <li>Analysis and research</li>
    <li>Problem-solving and brainstorming</li>
</ul>"#;

const FALLBACK_THANKS: &str = r#"<p>Thank you for your message! I'm here to help.</p>
<p>I'd be happy to assist you with this. To ensure I provide the most relevant and useful response, could you elaborate a bit more on your specific requirements or goals?</p>
<p>The more details you share, the better I can tailor my assistance to your needs.</p>"#;

const FALLBACK_BREAKDOWN: &str = r#"<p>Great question! Let me break this down for you.</p>
<p>I want to make sure I understand your needs correctly. Could you provide some additional context or specify what aspect you'd like me to focus on?</p>
<p>I'm designed to help with complex problems, creative tasks, technical challenges, and much more. Just let me know how I can best assist you!</p>"#;
