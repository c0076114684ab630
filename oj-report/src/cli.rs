use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(
    name = "oj-report",
    version,
    about = "Export an OnlineJudge contest ranking as a scored CSV report"
)]
pub struct Cli {
    /// Log HTTP traffic and pagination details to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Rule type of the contest to export: ACM or OI. Without it, only log in.
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Contest to export; prompted for when absent
    #[arg(short, long)]
    pub contest: Option<u64>,

    /// Points for a problem accepted on the first attempt (ACM only)
    #[arg(long)]
    pub full_points: Option<f64>,

    /// Split the full points evenly across the contest's problems
    #[arg(long)]
    pub spread: bool,
}
