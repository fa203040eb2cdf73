//! Form Registry CLI
//!
//! Registers form definitions and checks compatibility between versions.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use xform_schemas::{FormRegistry, RegisterOutcome, XformConfig};

#[derive(Parser)]
#[command(name = "xform-registry")]
#[command(about = "Manage the form definition registry")]
struct Cli {
    /// Path to the registry root (overrides config)
    #[arg(short, long)]
    registry: Option<PathBuf>,

    /// Path to a config file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a schema file
    Register {
        /// Schema file to register
        file: PathBuf,
        /// Author recorded on the registration
        #[arg(short, long)]
        author: Option<String>,
    },

    /// List registered namespaces
    List,

    /// Show the registered versions of a namespace
    Show {
        /// Target namespace
        namespace: String,
    },

    /// Check a candidate schema against the latest registered version
    Check {
        /// Target namespace
        namespace: String,
        /// Candidate schema file
        file: PathBuf,
    },

    /// Diff two registered versions of a namespace
    Compatibility {
        /// Target namespace
        namespace: String,
        /// Base version
        #[arg(short, long)]
        from: u32,
        /// Target version
        #[arg(short, long)]
        to: u32,
    },

    /// Verify stored sources against their digests
    Verify {
        /// Namespace to verify (all when omitted)
        namespace: Option<String>,
    },
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
    let registry_path = cli.registry.unwrap_or_else(|| config.registry_path());
    let mut registry = FormRegistry::open(&registry_path)?;

    match cli.command {
        Commands::Register { file, author } => {
            let source = std::fs::read_to_string(&file)?;
            let author = author.or_else(|| config.registry.default_author.clone());
            match registry.register(&source, author.as_deref())? {
                RegisterOutcome::Registered => {
                    println!("✅ Registered new form from {}", file.display());
                }
                RegisterOutcome::Unchanged => {
                    println!("✅ Schema unchanged, nothing to register");
                }
                RegisterOutcome::Updated(diff) => {
                    println!("✅ Registered compatible update");
                    println!();
                    println!("{}", diff);
                }
                RegisterOutcome::Breaking(diff) => {
                    println!("⚠️  Registered BREAKING update (version bumped)");
                    println!();
                    println!("{}", diff);
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::List => {
            let namespaces = registry.namespaces();
            if namespaces.is_empty() {
                println!("No forms registered in {}", registry_path.display());
            } else {
                println!("📋 Registered forms:");
                for namespace in namespaces {
                    let entries = registry.manifest(namespace).map(|m| m.entries.len()).unwrap_or(0);
                    println!("  {} ({} version(s))", namespace, entries);
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Show { namespace } => {
            let manifest = registry
                .manifest(&namespace)
                .ok_or_else(|| format!("namespace not registered: {}", namespace))?;
            println!("📋 {}", manifest.target_namespace);
            for entry in &manifest.entries {
                let version = entry
                    .version
                    .map(|v| format!("v{}", v))
                    .unwrap_or_else(|| "unversioned".to_string());
                let marker = if entry.breaking { " [breaking]" } else { "" };
                println!(
                    "  {} {} registered {}{}",
                    version,
                    entry.source_file,
                    entry.registered_at.format("%Y-%m-%d %H:%M:%S"),
                    marker
                );
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Check { namespace, file } => {
            let source = std::fs::read_to_string(&file)?;
            let diff = registry.check(&namespace, &source)?;
            if diff.is_empty() {
                println!("✅ Identical to the latest registered schema");
                Ok(ExitCode::SUCCESS)
            } else if diff.is_backward_compatible() {
                println!("✅ Compatible with the latest registered schema");
                println!();
                println!("{}", diff);
                Ok(ExitCode::SUCCESS)
            } else {
                println!("❌ Breaking change against the latest registered schema");
                println!();
                println!("{}", diff);
                Ok(ExitCode::FAILURE)
            }
        }

        Commands::Compatibility { namespace, from, to } => {
            println!("🔍 Checking compatibility: v{} -> v{}", from, to);
            let diff = registry.check_compatibility(&namespace, from, to)?;
            println!();
            println!("{}", diff);
            if diff.is_backward_compatible() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }

        Commands::Verify { namespace } => {
            let namespaces: Vec<String> = match namespace {
                Some(ns) => vec![ns],
                None => registry.namespaces().iter().map(|s| s.to_string()).collect(),
            };
            let mut all_valid = true;
            for ns in namespaces {
                match registry.verify(&ns) {
                    Ok(()) => println!("  ✅ {} - valid", ns),
                    Err(e) => {
                        println!("  ❌ {} - {}", ns, e);
                        all_valid = false;
                    }
                }
            }
            if all_valid {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
