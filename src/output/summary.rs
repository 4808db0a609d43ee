use std::fmt::Write;

use comfy_table::Cell;

use crate::model::PipelineReport;

use super::styling::{export_destination, field_label, field_value, notice, section_header};
use super::tables::{color_coded_effort_cell, color_coded_priority_cell, create_table, cyan_header};

/// Prints a human-readable summary of a run to stderr.
///
/// Shows the analysis summary, a ticket table sorted by priority, and where
/// the tickets went.
pub fn print_ticket_summary(report: &PipelineReport) {
    eprintln!("{}", render_summary(report));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{}", section_header(emoji, title));
}

fn render_summary(report: &PipelineReport) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Analysis");
    let _ = writeln!(output, "  {}\n", report.step1.summary);

    add_section_header(&mut output, "🎫", "Tickets");
    if report.step3.tickets.is_empty() {
        let _ = writeln!(output, "{}\n", notice("No tickets were produced."));
    } else {
        let mut tickets: Vec<_> = report.step3.tickets.iter().collect();
        tickets.sort_by_key(|ticket| ticket.priority);

        let mut table = create_table();
        table.set_header(cyan_header(&["ID", "Priority", "Title", "Category", "Effort", "Criteria"]));
        for ticket in tickets {
            table.add_row(vec![
                Cell::new(&ticket.id),
                color_coded_priority_cell(ticket.priority),
                Cell::new(&ticket.title),
                Cell::new(ticket.category.as_str()),
                color_coded_effort_cell(ticket.effort),
                Cell::new(ticket.acceptance_criteria.len()),
            ]);
        }
        let _ = writeln!(output, "{table}\n");
    }

    add_section_header(&mut output, "📦", "Export");
    let export = &report.step4;
    let _ = writeln!(
        output,
        "  {} {}\n  {} {}",
        field_label("Tickets:"),
        field_value(export.tickets_created),
        field_label("Destination:"),
        export_destination(export.provider)
    );
    if let Some(notes) = &export.notes {
        let _ = writeln!(output, "  {} {}", field_label("Notes:"), notes);
    }

    output
}
