//! Directive registration.

use std::collections::BTreeMap;

use docexec_core::Executor;

use crate::directive::ExecuteCode;
use crate::error::{Error, Result};
use crate::nodes::Node;
use crate::options::RawOption;

/// A directive occurrence found in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveBlock {
    /// Directive name, e.g. `execute_code`.
    pub name: String,
    /// Options in the order they were written.
    pub options: Vec<RawOption>,
    /// Body lines after the options.
    pub content: Vec<String>,
}

/// Everything a directive may use while it runs.
pub struct DirectiveContext<'a> {
    /// The environment shared by every block of the build.
    pub executor: &'a mut dyn Executor,
    /// Highlight tag for displayed code.
    pub language: &'a str,
}

/// A named block handler.
pub trait Directive {
    /// Name the directive is registered under.
    fn name(&self) -> &'static str;

    /// Turn a block into nodes.
    fn run(&self, block: &DirectiveBlock, ctx: &mut DirectiveContext<'_>) -> Result<Vec<Node>>;
}

/// Directives known to the host, keyed by name.
#[derive(Default)]
pub struct Registry {
    directives: BTreeMap<String, Box<dyn Directive>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a directive, replacing any previous one with the same name.
    pub fn add_directive(&mut self, directive: Box<dyn Directive>) {
        self.directives.insert(directive.name().to_string(), directive);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Directive> {
        self.directives.get(name).map(|d| d.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.directives.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.directives.keys().map(String::as_str)
    }

    /// Run the directive named by `block`.
    pub fn run(&self, block: &DirectiveBlock, ctx: &mut DirectiveContext<'_>) -> Result<Vec<Node>> {
        let directive = self
            .get(&block.name)
            .ok_or_else(|| Error::UnknownDirective(block.name.clone()))?;
        directive.run(block, ctx)
    }
}

/// What [`setup`] reports back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionMetadata {
    pub version: &'static str,
}

/// Register the `execute_code` directive.
pub fn setup(registry: &mut Registry) -> ExtensionMetadata {
    registry.add_directive(Box::new(ExecuteCode));
    ExtensionMetadata {
        version: env!("CARGO_PKG_VERSION"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Directive for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn run(
            &self,
            block: &DirectiveBlock,
            _ctx: &mut DirectiveContext<'_>,
        ) -> Result<Vec<Node>> {
            Ok(vec![Node::literal_block(block.content.join("\n"), "text", false)])
        }
    }

    struct NoExecutor;

    impl Executor for NoExecutor {
        fn execute(
            &mut self,
            _source: &str,
            _inputs: Option<&mut dyn docexec_core::InputProvider>,
        ) -> docexec_core::Result<String> {
            panic!("nothing should execute");
        }
    }

    #[test]
    fn test_setup_registers_execute_code() {
        let mut registry = Registry::new();
        let metadata = setup(&mut registry);

        assert!(registry.contains("execute_code"));
        assert_eq!(metadata.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["execute_code"]);
    }

    #[test]
    fn test_run_dispatches_by_name() {
        let mut registry = Registry::new();
        registry.add_directive(Box::new(Echo));

        let mut executor = NoExecutor;
        let mut ctx = DirectiveContext {
            executor: &mut executor,
            language: "python",
        };
        let block = DirectiveBlock {
            name: "echo".to_string(),
            options: Vec::new(),
            content: vec!["a".to_string(), "b".to_string()],
        };

        let nodes = registry.run(&block, &mut ctx).unwrap();
        assert_eq!(nodes, vec![Node::literal_block("a\nb", "text", false)]);
    }

    #[test]
    fn test_unknown_directive() {
        let registry = Registry::new();
        let mut executor = NoExecutor;
        let mut ctx = DirectiveContext {
            executor: &mut executor,
            language: "python",
        };
        let block = DirectiveBlock {
            name: "missing".to_string(),
            ..Default::default()
        };

        let err = registry.run(&block, &mut ctx).unwrap_err();
        assert!(matches!(err, Error::UnknownDirective(name) if name == "missing"));
    }
}
