mod cli;

use clap::{Parser, Subcommand};

use cli::check::cmd_check;
use cli::generate::{cmd_generate, GenerateArgs};
use cli::skeletons::cmd_skeletons;
use cli::ManifestArgs;
use skepu_codegen::logging::{self, Verbosity};

#[derive(Parser)]
#[command(
    name = "skepu-gen",
    version,
    about = "Generate SkePU backend kernels from a skeleton manifest"
)]
struct Cli {
    /// Log every generated unit
    #[arg(long, global = true)]
    verbose: bool,
    /// Only log warnings and errors
    #[arg(long, global = true)]
    silent: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate kernels and the host unit for a manifest
    Generate(GenerateArgs),
    /// Validate a manifest without writing anything
    Check(ManifestArgs),
    /// List the supported skeletons
    Skeletons,
}

fn main() {
    let cli = Cli::parse();
    logging::init(Verbosity::from_flags(cli.verbose, cli.silent));

    match cli.command {
        Command::Generate(args) => cmd_generate(args),
        Command::Check(args) => cmd_check(args),
        Command::Skeletons => cmd_skeletons(),
    }
}
