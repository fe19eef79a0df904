//! HTML escaping and a small reader for the fragments the thread renders
//!
//! Fragments are parsed with `scraper`; only the handful of tags the
//! response templates and escaped user text produce are given structure
//! (`p`, `br`, `strong`/`b`, `em`/`i`, `pre`, `ul`/`ol`, `li`, `div`).
//! Other elements contribute their text.

use scraper::node::Node;
use scraper::{ElementRef, Html};

/// Escape text for insertion into HTML
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineStyle {
    pub bold: bool,
    pub italic: bool,
}

/// A run of text with one style. A lone `"\n"` run is a hard line break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inline {
    pub text: String,
    pub style: InlineStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    /// Preformatted text, whitespace kept as-is
    Code(String),
    List(Vec<Vec<Inline>>),
}

/// Read an HTML fragment into display blocks
pub fn parse_fragment(html: &str) -> Vec<Block> {
    let fragment = Html::parse_fragment(html);
    let mut builder = BlockBuilder::default();
    builder.walk(fragment.root_element());
    builder.finish()
}

/// Rendered text of a fragment, roughly what a browser's `innerText` gives
pub fn plain_text(html: &str) -> String {
    parse_fragment(html)
        .iter()
        .map(|block| match block {
            Block::Paragraph(inlines) => inline_text(inlines),
            Block::Code(code) => code.trim_end_matches('\n').to_string(),
            Block::List(items) => items
                .iter()
                .map(|item| format!("• {}", inline_text(item)))
                .collect::<Vec<_>>()
                .join("\n"),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn inline_text(inlines: &[Inline]) -> String {
    inlines.iter().map(|i| i.text.as_str()).collect()
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    inlines: Vec<Inline>,
    list: Option<Vec<Vec<Inline>>>,
    bold: u8,
    italic: u8,
}

impl BlockBuilder {
    fn style(&self) -> InlineStyle {
        InlineStyle {
            bold: self.bold > 0,
            italic: self.italic > 0,
        }
    }

    fn at_line_start(&self) -> bool {
        self.inlines.last().map_or(true, |last| last.text.ends_with('\n'))
    }

    fn text(&mut self, raw: &str) {
        let mut collapsed = String::with_capacity(raw.len());
        let mut in_space = false;
        for c in raw.chars() {
            if c.is_whitespace() {
                if !in_space {
                    collapsed.push(' ');
                }
                in_space = true;
            } else {
                collapsed.push(c);
                in_space = false;
            }
        }

        let text = if self.at_line_start() {
            collapsed.trim_start()
        } else {
            collapsed.as_str()
        };
        if text.is_empty() {
            return;
        }

        let style = self.style();
        match self.inlines.last_mut() {
            Some(last) if last.style == style && !last.text.ends_with('\n') => {
                last.text.push_str(text)
            }
            _ => self.inlines.push(Inline {
                text: text.to_string(),
                style,
            }),
        }
    }

    fn line_break(&mut self) {
        self.trim_trailing();
        self.inlines.push(Inline {
            text: "\n".to_string(),
            style: InlineStyle::default(),
        });
    }

    fn walk(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.text(text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.element(child);
                    }
                }
                _ => {}
            }
        }
    }

    fn element(&mut self, element: ElementRef<'_>) {
        match element.value().name() {
            "p" | "div" => {
                self.flush_paragraph();
                self.walk(element);
                self.flush_paragraph();
            }
            "br" => self.line_break(),
            "strong" | "b" => {
                self.bold = self.bold.saturating_add(1);
                self.walk(element);
                self.bold = self.bold.saturating_sub(1);
            }
            "em" | "i" => {
                self.italic = self.italic.saturating_add(1);
                self.walk(element);
                self.italic = self.italic.saturating_sub(1);
            }
            "pre" => {
                self.flush_paragraph();
                let code: String = element.text().collect();
                self.blocks.push(Block::Code(code));
            }
            // Nested lists fold into the outer one
            "ul" | "ol" if self.list.is_none() => {
                self.flush_paragraph();
                self.list = Some(Vec::new());
                self.walk(element);
                self.flush_item();
                if let Some(items) = self.list.take() {
                    if !items.is_empty() {
                        self.blocks.push(Block::List(items));
                    }
                }
            }
            "li" => {
                self.flush_item();
                self.walk(element);
                self.flush_item();
            }
            "script" | "style" | "template" => {}
            _ => self.walk(element),
        }
    }

    fn trim_trailing(&mut self) {
        while let Some(last) = self.inlines.last_mut() {
            if last.text == "\n" {
                break;
            }
            let trimmed_len = last.text.trim_end().len();
            last.text.truncate(trimmed_len);
            if last.text.is_empty() {
                self.inlines.pop();
            } else {
                break;
            }
        }
    }

    fn take_inlines(&mut self) -> Option<Vec<Inline>> {
        self.trim_trailing();
        while self.inlines.last().is_some_and(|last| last.text == "\n") {
            self.inlines.pop();
            self.trim_trailing();
        }
        if self.inlines.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.inlines))
        }
    }

    fn flush_item(&mut self) {
        if self.list.is_none() {
            self.flush_paragraph();
            return;
        }
        if let Some(item) = self.take_inlines() {
            if let Some(list) = self.list.as_mut() {
                list.push(item);
            }
        }
    }

    fn flush_paragraph(&mut self) {
        if self.list.is_some() {
            self.flush_item();
            return;
        }
        if let Some(inlines) = self.take_inlines() {
            self.blocks.push(Block::Paragraph(inlines));
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush_paragraph();
        self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> Inline {
        Inline {
            text: text.to_string(),
            style: InlineStyle::default(),
        }
    }

    #[test]
    fn test_escape_script_tag() {
        let escaped = escape_html("<script>alert(1)</script>");
        assert_eq!(escaped, "&lt;script&gt;alert(1)&lt;/script&gt;");
        assert!(!escaped.contains('<'));
    }

    #[test]
    fn test_escaped_text_reads_back_literally() {
        let raw = r#"<img src=x onerror="alert('x')"> & more"#;
        let html = format!("<p>{}</p>", escape_html(raw));
        assert_eq!(plain_text(&html), raw);
    }

    #[test]
    fn test_character_references_decoded() {
        assert_eq!(plain_text("<p>5 &#60; 6 &hellip; &#x2014;</p>"), "5 < 6 … —");
        assert_eq!(plain_text("<p>&lt;&amp;lt; &copy;</p>"), "<&lt; ©");
    }

    #[test]
    fn test_angle_bracket_inside_attribute() {
        assert_eq!(plain_text("<p title=\"a>b\">text</p>"), "text");
    }

    #[test]
    fn test_script_content_dropped() {
        assert_eq!(plain_text("<p>safe</p><script>alert(1)</script>"), "safe");
    }

    #[test]
    fn test_paragraphs_and_bold() {
        let blocks = parse_fragment("<p><strong>1. The code</strong> you want</p>\n<p>Next</p>");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec![
                    Inline {
                        text: "1. The code".to_string(),
                        style: InlineStyle { bold: true, italic: false },
                    },
                    plain(" you want"),
                ]),
                Block::Paragraph(vec![plain("Next")]),
            ]
        );
    }

    #[test]
    fn test_pre_keeps_whitespace() {
        let blocks = parse_fragment("<p>Here:</p>\n<pre><code>Dear Team,\n\n  Hi</code></pre>");
        assert_eq!(blocks[1], Block::Code("Dear Team,\n\n  Hi".to_string()));
    }

    #[test]
    fn test_list_items() {
        let blocks = parse_fragment("<ul>\n    <li>One</li>\n    <li>Two</li>\n</ul>");
        assert_eq!(
            blocks,
            vec![Block::List(vec![vec![plain("One")], vec![plain("Two")]])]
        );
        assert_eq!(plain_text("<ul><li>One</li><li>Two</li></ul>"), "• One\n• Two");
    }

    #[test]
    fn test_line_breaks_inside_paragraph() {
        let blocks = parse_fragment("<p>first<br>second</p>");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![plain("first"), plain("\n"), plain("second")])]
        );
        assert_eq!(plain_text("<p>first<br>second</p>"), "first\nsecond");
    }

    #[test]
    fn test_stray_angle_bracket_is_text() {
        assert_eq!(plain_text("a < b"), "a < b");
    }
}
