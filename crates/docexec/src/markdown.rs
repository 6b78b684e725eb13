//! Markdown front end for directives.
//!
//! A fenced block whose info string names a registered directive, either
//! bare (`execute_code`) or in braces (`{execute_code}`), is replaced by the
//! directive's rendered nodes. Option lines of the form `:name: value` may
//! open the block; the body follows them.
//!
//! Every other line of the document, including fenced blocks of other
//! languages, is copied through untouched.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::nodes::render_markdown;
use crate::options::RawOption;
use crate::registry::{DirectiveBlock, DirectiveContext, Registry};

const MAX_FENCE_INDENT: usize = 3;

static OPTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:([A-Za-z0-9_-]+):(?:[ \t]+(.*))?$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fence {
    ch: char,
    len: usize,
    indent: usize,
}

/// Run every directive block in `markdown`, in document order.
pub fn process(
    markdown: &str,
    registry: &Registry,
    ctx: &mut DirectiveContext<'_>,
) -> Result<String> {
    let lines: Vec<&str> = markdown.split_inclusive('\n').collect();
    let mut out = String::with_capacity(markdown.len());
    let mut idx = 0;

    while idx < lines.len() {
        let Some((open, info)) = parse_fence_start(strip_eol(lines[idx])) else {
            out.push_str(lines[idx]);
            idx += 1;
            continue;
        };

        let close = find_fence_end(&lines, idx + 1, open);
        let name = directive_name(info).filter(|name| registry.contains(name));

        match name {
            Some(name) => {
                let body: Vec<&str> = lines[idx + 1..close]
                    .iter()
                    .map(|line| strip_indent(strip_eol(line), open.indent))
                    .collect();
                let block = parse_block(name, &body);

                debug!(
                    directive = name,
                    line = idx + 1,
                    options = block.options.len(),
                    "running directive"
                );
                let nodes = registry.run(&block, ctx)?;
                out.push_str(&render_markdown(&nodes));
            }
            None => {
                let end = (close + 1).min(lines.len());
                for line in &lines[idx..end] {
                    out.push_str(line);
                }
            }
        }

        idx = close + 1;
    }

    Ok(out)
}

/// Split a directive body into options and content.
///
/// Leading `:name: value` lines are options. Blank lines separating them
/// from the content, and trailing blank lines, are dropped.
pub fn parse_block(name: &str, body: &[&str]) -> DirectiveBlock {
    let mut options = Vec::new();
    let mut rest = body;

    while let Some((line, tail)) = rest.split_first() {
        let Some(caps) = OPTION_LINE.captures(line.trim_end()) else {
            break;
        };
        let value = caps
            .get(2)
            .map(|m| m.as_str().trim())
            .filter(|v| !v.is_empty());
        options.push(RawOption {
            name: caps[1].to_string(),
            value: value.map(str::to_string),
        });
        rest = tail;
    }

    while let Some((line, tail)) = rest.split_first() {
        if !line.trim().is_empty() {
            break;
        }
        rest = tail;
    }
    while let Some((line, head)) = rest.split_last() {
        if !line.trim().is_empty() {
            break;
        }
        rest = head;
    }

    DirectiveBlock {
        name: name.to_string(),
        options,
        content: rest.iter().map(|line| line.to_string()).collect(),
    }
}

/// The directive named by a fence info string, if it names one at all.
fn directive_name(info: &str) -> Option<&str> {
    let word = info.split_whitespace().next()?;
    let name = match word.strip_prefix('{') {
        Some(inner) => inner.strip_suffix('}')?,
        None => word,
    };
    if name.is_empty() { None } else { Some(name) }
}

fn parse_fence_start(line: &str) -> Option<(Fence, &str)> {
    let (indent, rest) = split_leading_spaces(line);
    if indent > MAX_FENCE_INDENT {
        return None;
    }

    let ch = rest.chars().next()?;
    if ch != '`' && ch != '~' {
        return None;
    }
    let len = rest.chars().take_while(|&c| c == ch).count();
    if len < 3 {
        return None;
    }

    let info = rest[len..].trim();
    // Backtick fences cannot carry backticks in their info string.
    if ch == '`' && info.contains('`') {
        return None;
    }

    Some((Fence { ch, len, indent }, info))
}

fn is_fence_end(line: &str, open: Fence) -> bool {
    let (indent, rest) = split_leading_spaces(line);
    if indent > MAX_FENCE_INDENT {
        return false;
    }
    let len = rest.chars().take_while(|&c| c == open.ch).count();
    len >= open.len && rest[len..].trim().is_empty()
}

/// Index of the closing fence line, or `lines.len()` when the block runs to
/// the end of the document.
fn find_fence_end(lines: &[&str], from: usize, open: Fence) -> usize {
    (from..lines.len())
        .find(|&idx| is_fence_end(strip_eol(lines[idx]), open))
        .unwrap_or(lines.len())
}

fn split_leading_spaces(line: &str) -> (usize, &str) {
    let trimmed = line.trim_start_matches(' ');
    (line.len() - trimmed.len(), trimmed)
}

/// Remove up to `indent` leading spaces.
fn strip_indent(line: &str, indent: usize) -> &str {
    let spaces = line.len() - line.trim_start_matches(' ').len();
    &line[spaces.min(indent)..]
}

fn strip_eol(line: &str) -> &str {
    line.trim_end_matches('\n').trim_end_matches('\r')
}
