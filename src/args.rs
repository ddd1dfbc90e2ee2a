use clap::Parser;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about,
    long_about = None,
    name = "diffjune",
)]
pub struct Args {
    /// Path to settings (yaml file)
    #[clap(long)]
    pub settings: String,

    /// Path to attendance edges (csv file with agent,venue_type,venue)
    #[clap(long)]
    pub attendance: String,

    /// Path to agents (csv file with agent,susceptibility,infected)
    #[clap(long)]
    pub agents: String,

    /// Path to case report (csv file)
    #[clap(long, short, default_value = "cases.csv")]
    pub output: String,

    /// Path to log file
    #[clap(long, default_value = "diffjune.log")]
    pub log_file: String,

    /// Increase log level, repeat for more detail
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable the progress bar
    #[clap(long)]
    pub disable_progress_bar: bool,

    /// Seed of the infection sampler, overrides the settings
    #[clap(long)]
    pub seed: Option<u64>,
}
