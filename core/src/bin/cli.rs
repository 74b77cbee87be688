//! Render Markdown from stdin or a file through the static pipeline and
//! print the result.
//!
//! ```sh
//! livellm --file transcript.md
//! cat transcript.md | livellm --format json
//! ```

use clap::Parser;
use livellm_core::registry;
use livellm_core::render::{render, IdentitySanitizer, Sanitizer};
use livellm_core::transform::{Mode, Transformer};
use std::io::{self, Read};
use std::process;

/// Render Markdown into an interactive document.
#[derive(Parser)]
#[command(name = "livellm")]
struct Cli {
    /// Path to a Markdown file to render. Reads stdin if omitted.
    #[arg(long)]
    file: Option<String>,

    /// Output format: "html" or "json" (the document's blocks).
    #[arg(long, default_value = "html")]
    format: String,

    /// Disable the pattern-detection transformer; render the directives
    /// already present in the source and nothing else.
    #[arg(long)]
    no_transform: bool,

    /// Print lifecycle events (parser/transformer/registry) to stderr as
    /// they fire.
    #[arg(long)]
    debug: bool,
}

fn read_source(cli: &Cli) -> Result<String, String> {
    match &cli.file {
        Some(path) => std::fs::read_to_string(path).map_err(|e| format!("failed to read {path}: {e}")),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("failed to read stdin: {e}"))?;
            Ok(buf)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::init();
    }

    let source = match read_source(&cli) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let mut reg = registry::default();
    let mut transformer = Transformer::new(Mode::Auto);
    transformer.register_builtins();

    let document = if cli.no_transform {
        render(&source, &mut reg, None)
    } else {
        render(&source, &mut reg, Some(&mut transformer))
    };

    match cli.format.as_str() {
        "json" => {
            let blocks: Vec<_> = document.blocks().iter().map(|b| b.to_html()).collect();
            match serde_json::to_string_pretty(&blocks) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error: failed to serialize document: {e}");
                    process::exit(1);
                }
            }
        }
        "html" => {
            let sanitizer = IdentitySanitizer;
            println!("{}", sanitizer.sanitize(&document.to_html()));
        }
        other => {
            eprintln!("Error: unknown --format \"{other}\", expected html or json");
            process::exit(1);
        }
    }
}
