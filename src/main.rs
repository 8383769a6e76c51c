//! Variant loader main executable

pub mod cases;
pub mod catalog;
pub mod common;
pub mod err;
pub mod store;
pub mod variants;

use clap::{Args, Parser, Subcommand};
use console::{Emoji, Term};

/// CLI parser based on clap.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Variant ingestion and annotation",
    long_about = "This tool loads the variants of cases into a store and queries them"
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::Args,

    /// The sub command to run
    #[command(subcommand)]
    command: Commands,
}

/// Enum supporting the parsing of top-level commands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Case-related commands.
    Cases(Cases),
    /// Variant-related commands.
    Variants(Variants),
}

/// Parsing of "cases *" sub commands.
#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
struct Cases {
    /// The sub command to run
    #[command(subcommand)]
    command: CasesCommands,
}

/// Enum supporting the parsing of "cases *" sub commands.
#[derive(Debug, Subcommand)]
enum CasesCommands {
    Add(cases::Args),
}

/// Parsing of "variants *" sub commands.
#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
struct Variants {
    /// The sub command to run
    #[command(subcommand)]
    command: VariantsCommands,
}

/// Enum supporting the parsing of "variants *" sub commands.
#[derive(Debug, Subcommand)]
enum VariantsCommands {
    Load(variants::ingest::Args),
    Delete(variants::ingest::DeleteArgs),
    List(variants::query::ListArgs),
    Show(variants::query::ShowArgs),
    Overlapping(variants::query::OverlappingArgs),
    Causatives(variants::query::CausativesArgs),
    ExtractRegion(variants::region::Args),
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();

    // Install collector and go into sub commands.
    let term = Term::stderr();
    tracing::subscriber::with_default(collector, || {
        match &cli.command {
            Commands::Cases(cmd) => match &cmd.command {
                CasesCommands::Add(args) => cases::run(&cli.common, args)?,
            },
            Commands::Variants(cmd) => match &cmd.command {
                VariantsCommands::Load(args) => variants::ingest::run(&cli.common, args)?,
                VariantsCommands::Delete(args) => variants::ingest::run_delete(&cli.common, args)?,
                VariantsCommands::List(args) => variants::query::run_list(&cli.common, args)?,
                VariantsCommands::Show(args) => variants::query::run_show(&cli.common, args)?,
                VariantsCommands::Overlapping(args) => {
                    variants::query::run_overlapping(&cli.common, args)?
                }
                VariantsCommands::Causatives(args) => {
                    variants::query::run_causatives(&cli.common, args)?
                }
                VariantsCommands::ExtractRegion(args) => {
                    variants::region::run(&cli.common, args)?
                }
            },
        }

        Ok::<(), anyhow::Error>(())
    })?;
    term.write_line(&format!("All done. Have a nice day!{}", Emoji(" 😃", "")))?;

    Ok(())
}
