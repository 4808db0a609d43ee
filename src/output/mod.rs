pub mod exports;
mod progress;
mod styling;
mod summary;
mod tables;

pub use exports::{export_json, tickets_to_csv};
pub use progress::PhaseProgress;
pub use summary::print_ticket_summary;

/// Prints the `Repo Surgeon` banner to stderr.
pub fn print_banner() {
    eprintln!(
        "\n{}\n",
        styling::banner(
            "🩺 Repo Surgeon",
            env!("CARGO_PKG_VERSION"),
            "Legacy code to migration tickets"
        )
    );
}
