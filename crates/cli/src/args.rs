//! Command-line surface (§10.3).

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "lpg", about = "Metadata-driven labeled property graph transformation engine")]
pub struct Args {
    /// Path to the schema document.
    #[arg(long)]
    pub schema: PathBuf,

    /// Path to the transformations document.
    #[arg(long)]
    pub transformations: PathBuf,

    /// Base directory that entity source paths are resolved against.
    #[arg(long, default_value = ".")]
    pub base_path: PathBuf,

    /// Increases log verbosity; repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
