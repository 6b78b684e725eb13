//! Document nodes produced by directives and their markdown rendering.

/// A node handed back to the host in place of a directive block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A short title shown above a literal block.
    Caption { text: String },

    /// Preformatted text with a highlight tag.
    LiteralBlock {
        text: String,
        language: String,
        linenos: bool,
    },

    /// A visible build warning.
    Warning { text: String },
}

impl Node {
    pub fn caption(text: impl Into<String>) -> Self {
        Self::Caption { text: text.into() }
    }

    pub fn literal_block(
        text: impl Into<String>,
        language: impl Into<String>,
        linenos: bool,
    ) -> Self {
        Self::LiteralBlock {
            text: text.into(),
            language: language.into(),
            linenos,
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::Warning { text: text.into() }
    }

    /// Text carried by the node.
    pub fn text(&self) -> &str {
        match self {
            Self::Caption { text } | Self::LiteralBlock { text, .. } | Self::Warning { text } => {
                text
            }
        }
    }

    /// Render as a markdown block, without a trailing newline.
    ///
    /// Captions and warnings become HTML `div`s; literal blocks become
    /// fenced code whose fence is longer than any backtick run inside.
    pub fn to_markdown(&self) -> String {
        match self {
            Self::Caption { text } => {
                format!("<div class=\"caption\">{}</div>", html_escape(text))
            }
            Self::Warning { text } => {
                format!("<div class=\"warning\">{}</div>", html_escape(text))
            }
            Self::LiteralBlock {
                text,
                language,
                linenos,
            } => {
                let fence = "`".repeat(longest_backtick_run(text).max(2) + 1);
                let mut info = language.clone();
                if *linenos {
                    if !info.is_empty() {
                        info.push(',');
                    }
                    info.push_str("linenos");
                }

                let mut out = format!("{}{}\n", fence, info);
                out.push_str(text);
                if !text.is_empty() && !text.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(&fence);
                out
            }
        }
    }
}

/// Render a node sequence as markdown blocks separated by blank lines.
///
/// An empty sequence renders to an empty string.
pub fn render_markdown(nodes: &[Node]) -> String {
    if nodes.is_empty() {
        return String::new();
    }
    let mut out = nodes
        .iter()
        .map(Node::to_markdown)
        .collect::<Vec<_>>()
        .join("\n\n");
    out.push('\n');
    out
}

fn longest_backtick_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_is_escaped() {
        let node = Node::caption("a < b & \"c\"");
        assert_eq!(
            node.to_markdown(),
            "<div class=\"caption\">a &lt; b &amp; &quot;c&quot;</div>"
        );
    }

    #[test]
    fn test_literal_block() {
        let node = Node::literal_block("print('hi')", "python", false);
        assert_eq!(node.to_markdown(), "```python\nprint('hi')\n```");
    }

    #[test]
    fn test_literal_block_linenos() {
        let node = Node::literal_block("hi\n", "none", true);
        assert_eq!(node.to_markdown(), "```none,linenos\nhi\n```");
    }

    #[test]
    fn test_empty_literal_block() {
        let node = Node::literal_block("", "none", false);
        assert_eq!(node.to_markdown(), "```none\n```");
    }

    #[test]
    fn test_fence_outgrows_backticks_in_text() {
        let node = Node::literal_block("text with ```` inside", "none", false);
        assert_eq!(
            node.to_markdown(),
            "`````none\ntext with ```` inside\n`````"
        );
    }

    #[test]
    fn test_render_sequence() {
        let nodes = vec![
            Node::caption("Results"),
            Node::literal_block("42\n", "none", false),
        ];
        assert_eq!(
            render_markdown(&nodes),
            "<div class=\"caption\">Results</div>\n\n```none\n42\n```\n"
        );
        assert_eq!(render_markdown(&[]), "");
    }

    #[test]
    fn test_warning() {
        let node = Node::warning("Error opening file: missing");
        assert_eq!(node.text(), "Error opening file: missing");
        assert_eq!(
            node.to_markdown(),
            "<div class=\"warning\">Error opening file: missing</div>"
        );
    }
}
