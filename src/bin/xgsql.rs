//! xgsql: lower JSON command trees to Xugu SQL.
//!
//! # Usage
//!
//! ```bash
//! # Print the SQL and bound parameters
//! xgsql generate tree.json
//!
//! # Read from stdin, emit the full command as JSON
//! cat tree.json | xgsql generate - --json
//!
//! # Only check that the tree lowers
//! xgsql check tree.json
//! ```

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;
use xgsql::ast::CommandTree;
use xgsql::generator::functions::function_tables;
use xgsql::{GeneratedCommand, GeneratorConfig, generate};

#[derive(Parser)]
#[command(name = "xgsql")]
#[command(version)]
#[command(about = "Command-tree to SQL generator for the Xugu dialect", long_about = None)]
#[command(after_help = "EXAMPLES:
    xgsql generate query.json
    xgsql generate - --json < insert.json
    xgsql check update.json
    xgsql functions")]
struct Cli {
    /// Config file (defaults to ./xgsql.toml, then the user config dir)
    #[arg(short, long, global = true, env = "XGSQL_CONFIG")]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate SQL for a command tree
    Generate {
        /// JSON command tree, or `-` for stdin
        input: String,

        /// Print the generated command as JSON
        #[arg(long)]
        json: bool,
    },
    /// Lower a command tree and report success or the first error
    Check {
        /// JSON command tree, or `-` for stdin
        input: String,
    },
    /// List the canonical function mappings
    Functions,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("xgsql=debug")
    } else {
        EnvFilter::try_from_env("XGSQL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Generate { input, json } => {
            let config = GeneratorConfig::load(cli.config.as_deref())?;
            let tree = read_tree(input)?;
            let cmd = generate(&tree, &config)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&cmd)?);
            } else {
                print_command(&cmd);
            }
        }
        Commands::Check { input } => {
            let config = GeneratorConfig::load(cli.config.as_deref())?;
            let tree = read_tree(input)?;
            generate(&tree, &config)
                .with_context(|| format!("{} statement does not lower", tree.kind()))?;
            println!("{} {} statement lowers cleanly", "✓".green(), tree.kind());
        }
        Commands::Functions => show_functions(),
    }
    Ok(())
}

fn read_tree(input: &str) -> Result<CommandTree> {
    let text = if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read command tree from stdin")?;
        buf
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read '{}'", input))?
    };
    CommandTree::from_json(&text).with_context(|| format!("Invalid command tree in '{}'", input))
}

fn print_command(cmd: &GeneratedCommand) {
    println!("{}", cmd.sql.white());
    if cmd.parameters.is_empty() {
        return;
    }
    println!();
    println!("{}", "Parameters:".cyan());
    for p in &cmd.parameters {
        println!(
            "  {} = {} {}",
            p.name.yellow(),
            p.value,
            format!("({:?})", p.db_type).dimmed()
        );
    }
}

fn show_functions() {
    for (family, entries) in function_tables() {
        println!("{}", family.cyan().bold());
        for (name, sql) in entries {
            println!("  {:<20} {}", name.yellow(), sql);
        }
        println!();
    }
}
