use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
pub struct ProgramArgs {
    /// Path to a payload document to install before the host sends its
    /// first command.
    #[clap(short, long)]
    pub payload: Option<PathBuf>,

    /// Increase log verbosity; repeatable (-v, -vv, -vvv).
    #[clap(short, long, parse(from_occurrences))]
    pub verbose: u8,
}
