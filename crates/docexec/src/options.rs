//! Directive options and their converters.
//!
//! Converters follow the usual directive conventions: flags take no
//! argument, `path` options require one, caption options accept a character
//! code in place of text.

use std::collections::HashSet;
use std::iter::Peekable;
use std::path::PathBuf;
use std::str::Chars;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Names of every option the `execute_code` directive accepts.
pub const OPTION_NAMES: &[&str] = &[
    "linenos",
    "output_language",
    "hide_code",
    "hide_results",
    "hide_headers",
    "filename",
    "hide_filename",
    "hide_import",
    "code_caption",
    "results_caption",
    "hide_code_caption",
    "hide_results_caption",
    "input",
];

const DEFAULT_CODE_CAPTION: &str = "Code";
const DEFAULT_RESULTS_CAPTION: &str = "Results";
const DEFAULT_OUTPUT_LANGUAGE: &str = "none";

/// An option as written in the document, before conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOption {
    /// Option name without the surrounding colons.
    pub name: String,
    /// Argument text, `None` when nothing followed the name.
    pub value: Option<String>,
}

impl RawOption {
    /// An option with an argument.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// An option without an argument.
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

/// Converted options of one `execute_code` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub linenos: bool,
    pub output_language: Option<String>,
    pub hide_code: bool,
    pub hide_results: bool,
    pub hide_headers: bool,
    pub hide_filename: bool,
    pub hide_import: bool,
    pub hide_code_caption: bool,
    pub hide_results_caption: bool,
    /// Snippet file, read instead of the block content.
    pub filename: Option<PathBuf>,
    pub code_caption: Option<String>,
    pub results_caption: Option<String>,
    /// Scripted answers for `input()`.
    pub input: Option<Vec<String>>,
}

impl RenderOptions {
    /// Convert raw options, rejecting unknown and repeated names.
    pub fn parse(raw: &[RawOption]) -> Result<Self> {
        let mut options = Self::default();
        let mut seen = HashSet::new();

        for option in raw {
            let name = option.name.as_str();
            let value = option.value.as_deref();

            if !OPTION_NAMES.contains(&name) {
                return Err(Error::invalid_option(name, "unknown option"));
            }
            if !seen.insert(name) {
                return Err(Error::invalid_option(name, "duplicate option"));
            }

            match name {
                "linenos" => options.linenos = flag(name, value)?,
                "hide_code" => options.hide_code = flag(name, value)?,
                "hide_results" => options.hide_results = flag(name, value)?,
                "hide_headers" => options.hide_headers = flag(name, value)?,
                "hide_filename" => options.hide_filename = flag(name, value)?,
                "hide_import" => options.hide_import = flag(name, value)?,
                "hide_code_caption" => options.hide_code_caption = flag(name, value)?,
                "hide_results_caption" => options.hide_results_caption = flag(name, value)?,
                "output_language" => options.output_language = Some(unchanged(value)),
                "filename" => options.filename = Some(path(name, value)?),
                "code_caption" => options.code_caption = Some(unicode_code(name, value)?),
                "results_caption" => options.results_caption = Some(unicode_code(name, value)?),
                "input" => options.input = Some(string_list(name, value)?),
                _ => unreachable!("option names are checked above"),
            }
        }

        Ok(options)
    }

    /// Highlight tag for the results block.
    pub fn output_language(&self) -> &str {
        non_empty(self.output_language.as_deref()).unwrap_or(DEFAULT_OUTPUT_LANGUAGE)
    }

    /// Caption text shown above the code.
    pub fn code_caption(&self) -> &str {
        non_empty(self.code_caption.as_deref()).unwrap_or(DEFAULT_CODE_CAPTION)
    }

    /// Caption text shown above the results.
    pub fn results_caption(&self) -> &str {
        non_empty(self.results_caption.as_deref()).unwrap_or(DEFAULT_RESULTS_CAPTION)
    }

    /// Whether the caption above the code is emitted.
    pub fn shows_code_caption(&self) -> bool {
        !self.hide_headers && !self.hide_code_caption
    }

    /// Whether the caption above the results is emitted.
    pub fn shows_results_caption(&self) -> bool {
        !self.hide_headers && !self.hide_results_caption
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// A flag: present means `true`, arguments are rejected.
pub fn flag(option: &str, argument: Option<&str>) -> Result<bool> {
    match argument.map(str::trim) {
        Some(text) if !text.is_empty() => Err(Error::invalid_option(
            option,
            format!("no argument is allowed; \"{}\" supplied", text),
        )),
        _ => Ok(true),
    }
}

/// The argument as written, or an empty string.
pub fn unchanged(argument: Option<&str>) -> String {
    argument.unwrap_or_default().to_string()
}

/// A required path argument with surrounding whitespace removed from each line.
pub fn path(option: &str, argument: Option<&str>) -> Result<PathBuf> {
    let text = required(option, argument)?;
    Ok(PathBuf::from(text.lines().map(str::trim).collect::<String>()))
}

static UNICODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:0x|x|\\x|U\+?|\\u)([0-9a-f]+)|&#x([0-9a-f]+);)$")
        .unwrap()
});

/// Text, or a character given by its code.
///
/// A decimal number, a hex number prefixed with `0x`, `x`, `\x`, `U+`, `u`
/// or `\u`, or an XML-style `&#x..;` reference becomes that one character.
/// Anything else is returned unchanged.
pub fn unicode_code(option: &str, argument: Option<&str>) -> Result<String> {
    let code = required(option, argument)?;

    let value = if code.bytes().all(|b| b.is_ascii_digit()) {
        code.parse::<u32>().ok()
    } else if let Some(caps) = UNICODE_PATTERN.captures(code) {
        let hex = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        u32::from_str_radix(hex, 16).ok()
    } else {
        return Ok(code.to_string());
    };

    value
        .and_then(char::from_u32)
        .map(String::from)
        .ok_or_else(|| Error::invalid_option(option, format!("invalid character code ({})", code)))
}

/// A literal list or tuple of quoted strings, e.g. `['Ada', "36"]`.
pub fn string_list(option: &str, argument: Option<&str>) -> Result<Vec<String>> {
    let text = required(option, argument)?;
    ListParser::new(text)
        .parse()
        .map_err(|message| Error::invalid_option(option, message))
}

fn required<'a>(option: &str, argument: Option<&'a str>) -> Result<&'a str> {
    match argument {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(Error::invalid_option(
            option,
            "argument required but none supplied",
        )),
    }
}

/// Parser for the string-list literal accepted by the `input` option.
struct ListParser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> ListParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
        }
    }

    fn parse(mut self) -> std::result::Result<Vec<String>, String> {
        self.skip_whitespace();
        let close = match self.chars.next() {
            Some('[') => ']',
            Some('(') => ')',
            Some(c) => return Err(format!("expected a list of strings, found '{}'", c)),
            None => return Err("expected a list of strings".to_string()),
        };

        let mut items = Vec::new();
        let mut saw_comma = false;

        loop {
            self.skip_whitespace();
            match self.chars.peek() {
                Some(&c) if c == close => {
                    self.chars.next();
                    break;
                }
                None => return Err(format!("missing closing '{}'", close)),
                _ => {}
            }

            items.push(self.string()?);

            self.skip_whitespace();
            match self.chars.next() {
                Some(',') => saw_comma = true,
                Some(c) if c == close => break,
                Some(c) => return Err(format!("unexpected '{}' after string", c)),
                None => return Err(format!("missing closing '{}'", close)),
            }
        }

        self.skip_whitespace();
        if let Some(c) = self.chars.next() {
            return Err(format!("unexpected '{}' after the list", c));
        }
        // `("a")` is a parenthesized string, not a tuple.
        if close == ')' && items.len() == 1 && !saw_comma {
            return Err("expected a list of strings, found a single string".to_string());
        }

        Ok(items)
    }

    fn string(&mut self) -> std::result::Result<String, String> {
        let raw = matches!(self.chars.peek(), Some('r' | 'R'));
        if raw {
            self.chars.next();
        }

        let quote = match self.chars.next() {
            Some(q @ ('\'' | '"')) => q,
            Some(c) => return Err(format!("expected a string literal, found '{}'", c)),
            None => return Err("expected a string literal".to_string()),
        };

        let mut value = String::new();
        loop {
            match self.chars.next() {
                None | Some('\n') => return Err("unterminated string literal".to_string()),
                Some(c) if c == quote => return Ok(value),
                Some('\\') if raw => {
                    value.push('\\');
                    if let Some(next) = self.chars.next() {
                        value.push(next);
                    }
                }
                Some('\\') => self.escape(&mut value)?,
                Some(c) => value.push(c),
            }
        }
    }

    fn escape(&mut self, value: &mut String) -> std::result::Result<(), String> {
        match self.chars.next() {
            None => return Err("unterminated string literal".to_string()),
            Some('\n') => {}
            Some('\\') => value.push('\\'),
            Some('\'') => value.push('\''),
            Some('"') => value.push('"'),
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some('r') => value.push('\r'),
            Some('a') => value.push('\x07'),
            Some('b') => value.push('\x08'),
            Some('f') => value.push('\x0c'),
            Some('v') => value.push('\x0b'),
            Some(first @ '0'..='7') => {
                let mut code = first.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    match self.chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            self.chars.next();
                        }
                        None => break,
                    }
                }
                value.push(char::from_u32(code).ok_or("invalid octal escape")?);
            }
            Some('x') => value.push(self.hex_escape(2)?),
            Some('u') => value.push(self.hex_escape(4)?),
            Some('U') => value.push(self.hex_escape(8)?),
            // Unknown escapes keep their backslash.
            Some(other) => {
                value.push('\\');
                value.push(other);
            }
        }
        Ok(())
    }

    fn hex_escape(&mut self, digits: usize) -> std::result::Result<char, String> {
        let mut code = 0u32;
        for _ in 0..digits {
            let digit = self
                .chars
                .next()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| format!("truncated escape: expected {} hex digits", digits))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| format!("invalid character escape ({:x})", code))
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }
}
