//! mdbook-docexec - run `execute_code` blocks while a book is built.

mod preprocess;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mdbook-docexec")]
#[command(about = "mdBook preprocessor that executes code snippets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Report whether a renderer is supported (all are)
    Supports {
        /// Renderer name, e.g. `html`
        renderer: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the book, so logs go to stderr.
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Add recovery hints to engine errors
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        let hint = match err.downcast_ref::<docexec::Error>() {
            Some(docexec::Error::Execute(core_err)) => core_err.hint(),
            _ => err.downcast_ref::<docexec_core::Error>().and_then(|e| e.hint()),
        };
        match hint {
            Some(hint) => anyhow::anyhow!("{:#}\n\nhint: {}", err, hint),
            None => err,
        }
    };

    match cli.command {
        Some(Commands::Supports { renderer }) => {
            tracing::debug!(renderer = %renderer, "renderer supported");
        }
        None => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            preprocess::run(stdin.lock(), stdout.lock()).map_err(format_error)?;
        }
    }

    Ok(())
}
