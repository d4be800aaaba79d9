use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use sprout::config::{self, Config};
use sprout::{GenerationParams, GenerationResult, Generator};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(name = "sprout", version, about = "Generate a complete project from a description")]
struct Cli {
    /// Config file to use instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ask the model for a project and write it to disk
    Generate {
        /// What the project should do
        description: String,
        #[arg(short, long)]
        language: String,
        #[arg(short, long)]
        framework: Option<String>,
        /// Ask for unit tests
        #[arg(long)]
        tests: bool,
        /// Directory the project folder is created in
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a default config file
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config_path = match cli.config {
        Some(path) => path,
        None => config::get_config_path()?,
    };

    match cli.command {
        Command::InitConfig => {
            Config::create_default(&config_path)?;
            println!("Created default config file at {:?}", config_path);
            println!("Set {} or add api_key under [ai].", config::API_KEY_ENV);
        }
        Command::Generate {
            description,
            language,
            framework,
            tests,
            output,
            timeout,
            json,
        } => {
            let config = Config::resolve(&config_path)?;
            let params = GenerationParams {
                description,
                language,
                framework,
                include_tests: tests,
                output_root: output.unwrap_or_else(|| config.output.root.clone()),
            };

            let generator = Generator::from_config(config)?;
            let generation = generator.generate(&params);
            let result = match timeout {
                Some(secs) => tokio::time::timeout(Duration::from_secs(secs), generation)
                    .await
                    .with_context(|| format!("Generation timed out after {}s", secs))??,
                None => generation.await?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_summary(&result);
            }
        }
    }

    Ok(())
}

fn print_summary(result: &GenerationResult) {
    println!(
        "{} {}",
        "Project generated at".green().bold(),
        result.project_path.display()
    );
    println!(
        "{} files, language {}{}{}",
        result.summary.total_files,
        result.summary.language.blue(),
        result
            .summary
            .framework
            .as_deref()
            .map(|f| format!(", framework {}", f.blue()))
            .unwrap_or_default(),
        if result.summary.has_tests { ", with tests" } else { "" }
    );

    let setup = &result.setup_instructions;
    let sections = [
        ("Prerequisites", &setup.prerequisites),
        ("Install", &setup.install_commands),
        ("Run", &setup.run_commands),
        ("Test", &setup.test_commands),
    ];
    for (title, items) in sections {
        if items.is_empty() {
            continue;
        }
        println!("\n{}", title.yellow().bold());
        for item in items {
            println!("  {}", item);
        }
    }

    if !setup.environment_variables.is_empty() {
        println!("\n{}", "Environment variables".yellow().bold());
        for var in &setup.environment_variables {
            println!("  {} - {} (e.g. {})", var.name.cyan(), var.description, var.example);
        }
    }

    if !result.additional_notes.trim().is_empty() {
        println!("\n{}", "Notes".yellow().bold());
        println!("  {}", result.additional_notes.trim());
    }
}
