use anyhow::Result;
use std::io::Write;

use crate::model::{StructuredOutput, StructuredTicket};

/// Header line of the ticket CSV.
pub const CSV_HEADER: &str = "id,priority,title,description,category,effort,acceptanceCriteria";

/// Separator used to flatten acceptance criteria into one CSV field.
pub const CRITERIA_SEPARATOR: &str = " | ";

/// Render tickets as CSV.
///
/// The header is written bare; every data field is wrapped in double quotes
/// with embedded quotes doubled. Rows are joined with `\n` and there is no
/// trailing newline. The output is a pure function of the tickets.
pub fn tickets_to_csv(structured: &StructuredOutput) -> String {
    let mut lines = Vec::with_capacity(structured.tickets.len() + 1);
    lines.push(CSV_HEADER.to_string());
    lines.extend(structured.tickets.iter().map(csv_row));
    lines.join("\n")
}

fn csv_row(ticket: &StructuredTicket) -> String {
    let criteria = ticket.acceptance_criteria.join(CRITERIA_SEPARATOR);
    [
        ticket.id.as_str(),
        ticket.priority.as_str(),
        ticket.title.as_str(),
        ticket.description.as_str(),
        ticket.category.as_str(),
        ticket.effort.as_str(),
        criteria.as_str(),
    ]
    .iter()
    .map(|field| quote(field))
    .collect::<Vec<_>>()
    .join(",")
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Write any serializable report as JSON followed by a newline.
pub fn export_json<T: serde::Serialize>(
    report: &T,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    writeln!(output, "{}", json)?;
    Ok(())
}
