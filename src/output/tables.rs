use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::model::{Effort, Priority};

pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

/// P0 red, P1 yellow, P2 green, P3 plain.
pub fn color_coded_priority_cell(priority: Priority) -> Cell {
    let cell = Cell::new(priority.as_str());
    match priority {
        Priority::P0 => cell.fg(TableColor::Red),
        Priority::P1 => cell.fg(TableColor::Yellow),
        Priority::P2 => cell.fg(TableColor::Green),
        Priority::P3 => cell,
    }
}

pub fn color_coded_effort_cell(effort: Effort) -> Cell {
    let cell = Cell::new(effort.as_str());
    match effort {
        Effort::Small => cell.fg(TableColor::Green),
        Effort::Medium => cell.fg(TableColor::Yellow),
        Effort::Large => cell.fg(TableColor::Red),
    }
}
