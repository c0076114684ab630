use anyhow::Context;
use clap::Parser;
use oj_report::cli::Cli;
use oj_report::configuration::get_configuration;
use oj_report::startup::{needs_login, run};
use oj_report::telemetry::{get_subscriber, init_subscriber};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is reserved for the report.
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    let subscriber = get_subscriber(default_filter.into(), std::io::stderr);
    init_subscriber(subscriber);

    let settings = get_configuration().context("Failed to read configuration")?;

    let result = run(&settings, &cli, std::io::stdout().lock());
    if let Err(e) = &result {
        if needs_login(e) {
            eprintln!("The session was rejected by {}; please log in again.", settings.site);
        }
    }
    result
}
