//! docexec: executable code snippets for documentation builds.
//!
//! Documentation authors mark blocks with the `execute_code` directive; at
//! build time each block's code is shown, executed in an interpreter that
//! is shared by the whole build, and followed by whatever it printed.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use docexec::{Config, DirectiveContext, Registry, markdown, setup};
//! use docexec_core::LazyEnvironment;
//!
//! let config = Config::default();
//! let mut registry = Registry::new();
//! setup(&mut registry);
//!
//! let mut env = LazyEnvironment::new(config.interpreter_config());
//! let mut ctx = DirectiveContext {
//!     executor: &mut env,
//!     language: &config.language,
//! };
//! let rendered = markdown::process(source, &registry, &mut ctx)?;
//! ```
//!
//! # Options
//!
//! | option | effect |
//! |---|---|
//! | `linenos` | number lines of both blocks |
//! | `output_language` | highlight tag for the results (default `none`) |
//! | `hide_code` | do not show the code |
//! | `hide_results` | do not show the results (the code still runs) |
//! | `hide_headers` | no captions |
//! | `hide_code_caption` / `hide_results_caption` | drop one caption |
//! | `code_caption` / `results_caption` | caption text (default `Code` / `Results`) |
//! | `filename` | run this file instead of the block body |
//! | `hide_filename` | keep the file name out of the code caption |
//! | `hide_import` | hide top-level `import x` lines in the shown code |
//! | `input` | answers for `input()`, e.g. `['Ada', '36']` |

pub mod config;
pub mod directive;
pub mod error;
pub mod markdown;
pub mod nodes;
pub mod options;
pub mod registry;

pub use config::Config;
pub use directive::{EXECUTE_CODE, ExecuteCode};
pub use error::{Error, Result};
pub use nodes::{Node, render_markdown};
pub use options::{RawOption, RenderOptions};
pub use registry::{
    Directive, DirectiveBlock, DirectiveContext, ExtensionMetadata, Registry, setup,
};
