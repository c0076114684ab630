use crate::cli::Cli;
use crate::configuration::Settings;
use crate::domain::{Credentials, UserName};
use crate::session::{LoginError, OjSession};
use anyhow::{Context, anyhow, bail};
use inquire::validator::Validation;
use inquire::{CustomType, Password, Text};
use oj_rank::{Error, aggregate};
use oj_rank::data_processing::{
    ContestInfo, PageFetcher, ProblemSet, RankTable, RuleType, fetch_contest_problems,
    fetch_contests,
};
use oj_rank::summary::write_report;
use oj_rank::systems::score;
use secrecy::{ExposeSecret, SecretString};
use std::io::Write;

/// Takes credentials from the settings, prompting for whatever is missing.
fn credentials(settings: &Settings) -> anyhow::Result<Credentials> {
    let username = match &settings.username {
        Some(username) => username.clone(),
        None => Text::new("Username:").prompt()?,
    };
    let username = UserName::parse(username).map_err(|e| anyhow!(e))?;
    let password = match &settings.password {
        Some(password) => SecretString::from(password.expose_secret()),
        None => SecretString::from(
            Password::new("Password:")
                .without_confirmation()
                .prompt()?,
        ),
    };
    Ok(Credentials { username, password })
}

fn print_contests(contests: &[ContestInfo]) {
    eprintln!("Available contests:");
    for contest in contests {
        eprintln!("  - {}: {}", contest.id, contest.title);
    }
}

/// Picks the contest given on the command line, or asks for one of the listed ids.
fn select_contest(contests: &[ContestInfo], chosen: Option<u64>) -> anyhow::Result<ContestInfo> {
    let id = match chosen {
        Some(id) => id,
        None => {
            let ids: Vec<u64> = contests.iter().map(|c| c.id).collect();
            CustomType::<u64>::new("Select contest id:")
                .with_error_message("Please type a contest id")
                .with_validator(move |id: &u64| {
                    Ok(if ids.contains(id) {
                        Validation::Valid
                    } else {
                        Validation::Invalid("Not one of the listed contests".into())
                    })
                })
                .prompt()?
        }
    };
    contests
        .iter()
        .find(|contest| contest.id == id)
        .cloned()
        .with_context(|| format!("Contest {} is not among the listed contests", id))
}

/// The contest's declared problems, or the problems seen in the ranking when
/// the listing can't be read.
fn problem_set(
    session: &OjSession,
    contest: &ContestInfo,
    table: &RankTable,
    full_points: f64,
) -> anyhow::Result<ProblemSet> {
    match fetch_contest_problems(session, contest.id) {
        Ok(listing) => Ok(ProblemSet::from_listing(
            listing,
            table,
            contest.rule_type,
            full_points,
        )),
        Err(e) if e.is_auth() => Err(e).context("Failed to list the contest's problems"),
        Err(e) => {
            tracing::warn!("Falling back to problems seen in the ranking: {}", e);
            Ok(ProblemSet::from_table(table, full_points))
        }
    }
}

/// Exports the ranking of one contest of the given rule type into `out`.
pub fn export_contest(
    session: &OjSession,
    rule_type: RuleType,
    cli: &Cli,
    full_points: f64,
    out: impl Write,
) -> anyhow::Result<()> {
    let contests = fetch_contests(session, rule_type).context("Failed to list contests")?;
    if contests.is_empty() {
        eprintln!("No contests");
        return Ok(());
    }
    print_contests(&contests);
    let contest = select_contest(&contests, cli.contest)?;

    let fetcher = PageFetcher::new(session);
    let aggregation = aggregate(&fetcher, &contest)
        .with_context(|| format!("Failed to fetch the ranking of contest {}", contest.id))?;
    let table = aggregation.into_table();

    let mut problems = problem_set(session, &contest, &table, full_points)?;
    if cli.spread {
        problems = problems.spread(full_points);
    }
    let scored = score(table, &problems, contest.rule_type);
    write_report(&scored, &problems, out).context("Failed to write the report")
}

/// Whether `error` means the site rejected the session, anywhere in its chain.
pub fn needs_login(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause.downcast_ref::<Error>().is_some_and(Error::is_auth)
            || cause.downcast_ref::<LoginError>().is_some_and(LoginError::is_auth)
    })
}

/// Logs in, then exports a contest when a mode was asked for.
pub fn run(settings: &Settings, cli: &Cli, out: impl Write) -> anyhow::Result<()> {
    // Validate the mode before anything touches the network
    let rule_type = match &cli.mode {
        Some(mode) => Some(mode.parse::<RuleType>()?),
        None => None,
    };
    let full_points = cli.full_points.unwrap_or(settings.full_points);
    if !(full_points.is_finite() && full_points >= 0.) {
        bail!("Full points must be a non-negative number, got {}", full_points);
    }

    let session = OjSession::new(&settings.site)?;
    let credentials = credentials(settings)?;
    session
        .login(&credentials)
        .with_context(|| format!("Failed to log in to {}", session.site()))?;
    eprintln!("Login successful.");

    match rule_type {
        Some(rule_type) => export_contest(&session, rule_type, cli, full_points, out),
        None => {
            eprintln!("Authenticated successfully.");
            Ok(())
        }
    }
}
