//! apiflow CLI - Postman collection generation from OpenAPI documents

mod loader;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use apiflow_core::{ApiDocument, Config, Diagnostics, ScenarioBuilder};
use apiflow_postman::Assembler;

#[derive(Parser)]
#[command(name = "apiflow")]
#[command(about = "Generate Postman test collections from OpenAPI documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a test collection from an OpenAPI document
    Generate {
        /// The OpenAPI input file (JSON or YAML)
        #[arg(short, long)]
        input: PathBuf,

        /// The collection output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Config file (default: .apiflow.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed for reproducible request bodies (ids stay fresh)
        #[arg(long)]
        seed: Option<u64>,

        /// List scenarios without writing the collection
        #[arg(long)]
        dry_run: bool,
    },

    /// Initialize config file
    Init,

    /// Export JSON Schema for the collection envelope
    Schema,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Generate {
            input,
            output,
            config,
            seed,
            dry_run,
        } => {
            // Load config
            let cfg = if let Some(path) = config {
                Config::load(&path)?
            } else {
                Config::load_default()?
            };

            let value = loader::load_document(&input)?;
            let document = ApiDocument::from_value(&value)
                .with_context(|| format!("reading {}", input.display()))?;

            let mut rng = match seed {
                Some(seed) => SmallRng::seed_from_u64(seed),
                None => SmallRng::from_entropy(),
            };
            let builder = ScenarioBuilder::new(&document, &cfg);
            let mut diags = Diagnostics::new();
            let scenarios = builder.build_all(&mut rng, &mut diags);

            for diagnostic in diags.iter() {
                eprintln!("Warning: {diagnostic}");
            }

            if scenarios.is_empty() {
                eprintln!(
                    "Error: no scenarios could be generated from {}",
                    input.display()
                );
                return Ok(1);
            }

            if cli.verbose {
                eprintln!("Scenarios:");
                for scenario in &scenarios {
                    eprintln!("  {} ({} steps)", scenario.name, scenario.steps.len());
                }
                eprintln!();
            }

            // Dry run: list the plan and exit
            if dry_run {
                for scenario in &scenarios {
                    println!("{}", scenario.name);
                    for step in &scenario.steps {
                        println!("  {} {}", step.method.as_str(), step.url);
                    }
                }
                return Ok(0);
            }

            let timestamp = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(0))
                .unwrap_or(0);
            let assembler = Assembler::new(&cfg, timestamp);
            let collection =
                assembler.assemble(&document.title, &document.description, &scenarios, &mut rng);
            let json = serde_json::to_string_pretty(&collection)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, format!("{json}\n"))
                        .with_context(|| format!("writing {}", path.display()))?;
                    eprintln!(
                        "Wrote {} scenarios ({} requests) to {}",
                        scenarios.len(),
                        collection.requests.len(),
                        path.display()
                    );
                }
                None => println!("{json}"),
            }
            Ok(0)
        }

        Commands::Init => {
            let config_path = ".apiflow.toml";
            if std::path::Path::new(config_path).exists() {
                eprintln!("{config_path} already exists");
                return Ok(1);
            }

            std::fs::write(config_path, Config::example())?;
            println!("Created {config_path}");
            println!("\nEdit the file to configure:");
            println!("  - owner: collection owner id");
            println!("  - host_variable / path_variable: URL template variable names");
            println!("  - reserved_properties / reserved_parameters: server-managed fields");
            println!("  - [defaults]: literals used for synthesized values");
            Ok(0)
        }

        Commands::Schema => {
            let schema = apiflow_postman::generate_schema();
            println!("{schema}");
            Ok(0)
        }
    }
}
