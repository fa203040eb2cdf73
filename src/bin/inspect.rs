//! Schema Inspector CLI
//!
//! Parses a form definition, prints a summary, and runs validation.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use xform_schemas::{FormValidator, SchemaTree, XformConfig};

#[derive(Parser)]
#[command(name = "xform-inspect")]
#[command(about = "Parse and validate an XForm schema file")]
struct Cli {
    /// Schema file to inspect
    schema: PathBuf,

    /// Dump the full element tree
    #[arg(long)]
    dump: bool,

    /// Emit the summary and diagnostics as JSON
    #[arg(long)]
    json: bool,

    /// Path to a config file
    #[arg(short, long)]
    config: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = XformConfig::load_from(cli.config.as_deref())?;
    let tree = SchemaTree::from_file(&cli.schema)?;

    let mut validator = FormValidator::new();
    if !config.validation.require_meta {
        validator = validator.without_meta_checks();
    }
    let diagnostics = validator.validate(&tree);

    if cli.json {
        let summary = serde_json::json!({
            "target_namespace": tree.target_namespace(),
            "version": tree.version().number(),
            "uiversion": tree.uiversion().number(),
            "nodes": tree.len(),
            "types": tree.types().len(),
            "diagnostics": diagnostics,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("📋 {}", cli.schema.display());
        println!(
            "  namespace: {}",
            tree.target_namespace().unwrap_or("(none)")
        );
        println!("  version:   {} ({})", tree.version(), tree.uiversion());
        println!("  nodes:     {}", tree.len());
        println!("  types:     {}", tree.types().len());

        if cli.dump {
            println!();
            print!("{}", tree.dump());
        }

        if diagnostics.is_empty() {
            println!("\n✅ No validation issues");
        } else {
            println!();
            print!("{}", diagnostics);
        }
    }

    let failed = diagnostics.has_errors()
        || (config.validation.fail_on_warnings && diagnostics.warning_count() > 0);
    if failed {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
