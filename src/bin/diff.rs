//! Schema Diff CLI
//!
//! Compares two form definition files and reports structural differences.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;
use xform_schemas::SchemaTree;

#[derive(Parser)]
#[command(name = "xform-diff")]
#[command(about = "Compare two XForm schema files")]
struct Cli {
    /// The older schema file
    old: PathBuf,

    /// The newer schema file
    new: PathBuf,

    /// Emit the diff as JSON
    #[arg(long)]
    json: bool,

    /// Also show a line-level diff of the two sources
    #[arg(long)]
    text: bool,
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
    let old_source = std::fs::read_to_string(&cli.old)?;
    let new_source = std::fs::read_to_string(&cli.new)?;

    let old_tree = SchemaTree::parse(&old_source)?;
    let new_tree = SchemaTree::parse(&new_source)?;
    let diff = old_tree.diff(&new_tree);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&diff)?);
    } else if diff.is_empty() {
        println!("✅ No differences");
    } else if diff.is_backward_compatible() {
        println!("⚠️  {} compatible change(s) detected", diff.change_count());
        println!();
        println!("{}", diff);
    } else {
        println!("❌ Breaking changes detected");
        println!();
        println!("{}", diff);
    }

    if cli.text {
        println!();
        let text_diff = TextDiff::from_lines(&old_source, &new_source);
        print!(
            "{}",
            text_diff
                .unified_diff()
                .header(&cli.old.display().to_string(), &cli.new.display().to_string())
        );
    }

    if diff.is_backward_compatible() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
