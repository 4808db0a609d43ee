use std::fmt::Display;

use console::{style, StyledObject};

use crate::model::ExportProvider;

/// `🩺 Repo Surgeon <version>` over a dimmed tagline.
pub fn banner(name: &str, version: &str, tagline: &str) -> String {
    format!(
        "{} {}\n  {}",
        style(name).magenta().bold(),
        style(version).dim(),
        style(tagline).dim()
    )
}

/// Underlined title of a summary section.
pub fn section_header(emoji: &str, title: &str) -> String {
    format!("{} {}", style(emoji).bright(), style(title).bright().underlined())
}

pub fn stage_running(message: &str) -> StyledObject<String> {
    style(message.to_string()).bright().yellow()
}

pub fn stage_done(message: &str) -> StyledObject<String> {
    style(format!("{message} ✓")).bright().green()
}

pub fn stage_failed(message: &str) -> StyledObject<String> {
    style(format!("{message} ✗")).bright().red()
}

/// Where the tickets ended up; a fallback is shown as a warning.
pub fn export_destination(provider: ExportProvider) -> StyledObject<&'static str> {
    match provider {
        ExportProvider::External => style("delivered to CodeWords").bright().green(),
        ExportProvider::Fallback => style("local CSV fallback").bright().yellow(),
    }
}

pub fn notice(text: &str) -> StyledObject<&str> {
    style(text).bright().yellow()
}

pub fn field_label(text: &str) -> StyledObject<&str> {
    style(text).dim()
}

pub fn field_value(value: impl Display) -> StyledObject<String> {
    style(value.to_string()).cyan()
}
