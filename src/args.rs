use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Path to settings (yaml file). Compiled-in defaults apply otherwise.
    #[clap(long)]
    pub settings: Option<String>,

    /// Path to the history file, overrides the settings.
    #[clap(long)]
    pub history: Option<PathBuf>,

    /// Directory for update and error logs, overrides the settings.
    #[clap(long, short)]
    pub outdir: Option<PathBuf>,

    /// Path to log file. Logs go to stderr when omitted.
    #[clap(long)]
    pub log_file: Option<String>,

    /// Verbosity of the log.
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Exit with status 1 when the run ends in an error.
    #[clap(long)]
    pub fail_on_error: bool,

    /// Print the effective settings and exit.
    #[clap(long)]
    pub dump_settings: bool,
}
