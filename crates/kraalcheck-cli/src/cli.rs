use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "kraalcheck",
    version,
    about = "Evaluate permission checks against a rule tree and relation facts"
)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decide whether a subject may perform an action on an object.
    Check(CheckArgs),
    /// Load a rule tree and report limit violations.
    Validate {
        #[arg(long)]
        schema: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Rule tree in JSON form.
    #[arg(long)]
    pub schema: PathBuf,

    /// Relation facts, one `namespace:id#relation@subject` per line.
    #[arg(long)]
    pub facts: PathBuf,

    /// A bare user id or a `namespace:id#relation` userset.
    #[arg(long)]
    pub subject: String,

    #[arg(long)]
    pub action: String,

    /// The object as `namespace:id`.
    #[arg(long)]
    pub object: String,

    /// Userset hops allowed; defaults to `engine.max_depth`.
    #[arg(long)]
    pub depth: Option<u32>,
}
