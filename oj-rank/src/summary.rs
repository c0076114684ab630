use crate::data_processing::ProblemSet;
use crate::error::Error;
use crate::systems::{ScoredRow, ScoredTable};
use itertools::Itertools;
use std::io::Write;

const IDENTITY_COLUMN: &str = "submitter";
const TOTAL_COLUMN: &str = "total";

/// Plain decimal rendering rounded to two places, trailing zeros and separators
/// dropped: `100`, `50`, `33.33`.
fn format_points(points: f64) -> String {
    let text = format!("{:.2}", points);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    // Avoid printing "-0"
    if text == "-0" {
        "0".to_owned()
    } else {
        text.to_owned()
    }
}

fn report_row(row: &ScoredRow, problems: &ProblemSet) -> Vec<String> {
    let mut record = Vec::with_capacity(problems.len() + 2);
    record.push(row.username().to_owned());
    record.extend(problems.iter().map(|p| format_points(row.points_for(p.id))));
    record.push(format_points(row.total));
    record
}

/// Renders the scored table as CSV: the submitter column, one column per problem
/// in the given order, and the total last. Rows are sorted by submitter identity,
/// so equal inputs always produce identical documents.
pub fn render_report(scored: &ScoredTable, problems: &ProblemSet) -> Result<String, Error> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(vec![]);

    let header = std::iter::once(IDENTITY_COLUMN)
        .chain(problems.iter().map(|p| p.label.as_str()))
        .chain(std::iter::once(TOTAL_COLUMN));
    writer.write_record(header)?;

    for row in scored.values().sorted_by(|a, b| a.username().cmp(b.username())) {
        writer.write_record(report_row(row, problems))?;
    }

    let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Renders the whole report first, then hands it to the sink in one piece.
pub fn write_report(
    scored: &ScoredTable,
    problems: &ProblemSet,
    mut sink: impl Write,
) -> Result<(), Error> {
    let report = render_report(scored, problems)?;
    sink.write_all(report.as_bytes())?;
    sink.flush()?;
    tracing::info!("Wrote a report of {} submitters", scored.len());
    Ok(())
}
