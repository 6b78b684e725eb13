//! The preprocessor pass over a whole book.
//!
//! The host writes `[context, book]` as JSON to stdin and reads the
//! modified book back from stdout. Chapters are processed depth-first in
//! book order against a single execution environment.

use std::io::{BufWriter, Read, Write};

use anyhow::Context;
use docexec::{Config, DirectiveContext, Registry, markdown, setup};
use docexec_core::LazyEnvironment;
use serde_json::Value;
use tracing::{debug, info};

/// Read the host's input, execute every directive and write the book back.
pub fn run(input: impl Read, output: impl Write) -> anyhow::Result<()> {
    let (context, mut book): (Value, Value) =
        serde_json::from_reader(input).context("Failed to parse preprocessor input")?;

    if let Some(version) = context.get("mdbook_version").and_then(Value::as_str) {
        debug!(host_version = version, "preprocessor input received");
    }

    let config = Config::from_context(&context).context("Invalid [preprocessor.docexec] table")?;

    let mut registry = Registry::new();
    let metadata = setup(&mut registry);
    debug!(version = metadata.version, "directives registered");

    let mut env = LazyEnvironment::new(config.interpreter_config());
    let mut chapters = 0;
    {
        let mut ctx = DirectiveContext {
            executor: &mut env,
            language: &config.language,
        };

        // Older hosts call the top-level list `sections`, newer ones `items`.
        let key = if book.get("sections").is_some() {
            "sections"
        } else {
            "items"
        };
        if let Some(items) = book.get_mut(key).and_then(Value::as_array_mut) {
            for item in items {
                chapters += process_item(item, &registry, &mut ctx)?;
            }
        }
    }

    if env.is_started() {
        info!(chapters, "book executed");
    }
    env.shutdown().context("Failed to stop the interpreter")?;

    let mut writer = BufWriter::new(output);
    serde_json::to_writer(&mut writer, &book).context("Failed to write book")?;
    writer.flush()?;

    Ok(())
}

/// Process a book item and its sub-items, returning the chapters visited.
fn process_item(
    item: &mut Value,
    registry: &Registry,
    ctx: &mut DirectiveContext<'_>,
) -> anyhow::Result<usize> {
    // Separators and part titles carry no content.
    let Some(chapter) = item.get_mut("Chapter") else {
        return Ok(0);
    };

    let name = chapter
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>")
        .to_string();

    if let Some(Value::String(content)) = chapter.get_mut("content") {
        debug!(chapter = %name, "processing chapter");
        *content = markdown::process(content, registry, ctx)
            .with_context(|| format!("Failed to process chapter '{}'", name))?;
    }

    let mut visited = 1;
    if let Some(Value::Array(children)) = chapter.get_mut("sub_items") {
        for child in children {
            visited += process_item(child, registry, ctx)?;
        }
    }

    Ok(visited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chapter(name: &str, content: &str, sub_items: Vec<Value>) -> Value {
        json!({
            "Chapter": {
                "name": name,
                "content": content,
                "number": null,
                "sub_items": sub_items,
                "path": format!("{}.md", name),
                "source_path": format!("{}.md", name),
                "parent_names": []
            }
        })
    }

    fn run_book(sections: Vec<Value>) -> Value {
        let input = json!([
            { "root": "/book", "config": { "book": {} }, "renderer": "html", "mdbook_version": "0.4.40" },
            { "sections": sections, "__non_exhaustive": null }
        ]);

        let mut output = Vec::new();
        run(input.to_string().as_bytes(), &mut output).unwrap();
        serde_json::from_slice(&output).unwrap()
    }

    #[test]
    fn test_book_without_directives_round_trips() {
        let sections = vec![
            chapter("intro", "# Intro\n", vec![chapter("nested", "text\n", vec![])]),
            json!("Separator"),
        ];
        let book = run_book(sections.clone());

        assert_eq!(book["sections"], json!(sections));
    }

    #[test]
    fn test_nested_chapters_are_processed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.py");
        let content = format!("```{{execute_code}}\n:filename: {}\n```\n", missing.display());

        let book = run_book(vec![chapter("outer", "", vec![chapter("inner", &content, vec![])])]);
        let rendered = book["sections"][0]["Chapter"]["sub_items"][0]["Chapter"]["content"]
            .as_str()
            .unwrap();

        assert!(rendered.starts_with("<div class=\"warning\">Error opening file: "));
    }

    #[test]
    fn test_malformed_input() {
        let mut output = Vec::new();
        assert!(run("not json".as_bytes(), &mut output).is_err());
        assert!(output.is_empty());
    }
}
