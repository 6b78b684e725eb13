//! The `execute_code` directive.
//!
//! A block shows its code, runs it in the shared environment and shows what
//! it printed:
//!
//! ````markdown
//! ```{execute_code}
//! :linenos:
//! :input: ['Ada']
//!
//! name = input('Name: ')
//! print('Hello', name)
//! ```
//! ````
//!
//! The snippet always runs, even when both the code and the results are
//! hidden, so later blocks can rely on what it defined.

use std::fs;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::nodes::Node;
use crate::options::RenderOptions;
use crate::registry::{Directive, DirectiveBlock, DirectiveContext};

/// Name the directive is registered under.
pub const EXECUTE_CODE: &str = "execute_code";

static IMPORT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^import[ \t]+[.\w]+[ \t]*(?:\n+|\z)").unwrap());

/// Handler for `execute_code` blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteCode;

impl Directive for ExecuteCode {
    fn name(&self) -> &'static str {
        EXECUTE_CODE
    }

    fn run(&self, block: &DirectiveBlock, ctx: &mut DirectiveContext<'_>) -> Result<Vec<Node>> {
        let options = RenderOptions::parse(&block.options)?;
        render(&options, &block.content, ctx)
    }
}

/// Produce the nodes for one block with already converted options.
pub fn render(
    options: &RenderOptions,
    content: &[String],
    ctx: &mut DirectiveContext<'_>,
) -> Result<Vec<Node>> {
    let code = match &options.filename {
        Some(path) => match fs::read_to_string(path) {
            Ok(code) => {
                debug!(path = %path.display(), bytes = code.len(), "loaded snippet file");
                code
            }
            Err(err) => {
                let cwd = std::env::current_dir()
                    .map(|dir| dir.display().to_string())
                    .unwrap_or_default();
                let message = format!("Error opening file: {}, working folder: {}", err, cwd);
                warn!(path = %path.display(), "{}", message);
                return Ok(vec![Node::warning(message)]);
            }
        },
        None => content.join("\n"),
    };

    let mut nodes = Vec::new();

    if !options.hide_code {
        let displayed = if options.hide_import {
            strip_imports(&code)
        } else {
            code.clone()
        };

        if options.shows_code_caption() {
            let suffix = match &options.filename {
                Some(path) if !options.hide_filename => path.display().to_string(),
                _ => String::new(),
            };
            nodes.push(Node::caption(format!(
                "{} {}",
                options.code_caption(),
                suffix
            )));
        }
        nodes.push(Node::literal_block(displayed, ctx.language, options.linenos));
    }

    // Emitted even when the results themselves are hidden.
    if options.shows_results_caption() {
        nodes.push(Node::caption(options.results_caption()));
    }

    let results = docexec_core::execute(&mut *ctx.executor, &code, options.input.as_deref())?;
    debug!(bytes = results.len(), "snippet executed");

    if !options.hide_results {
        nodes.push(Node::literal_block(
            results,
            options.output_language(),
            options.linenos,
        ));
    }

    Ok(nodes)
}

/// Remove top-level `import x` / `import x.y` lines from displayed code.
pub fn strip_imports(code: &str) -> String {
    IMPORT_LINE.replace_all(code, "").into_owned()
}
