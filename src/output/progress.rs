use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{section_header, stage_done, stage_failed, stage_running};
use crate::pipeline::{Stage, StageObserver};

const STAGES: [(&str, &str); Stage::COUNT] = [
    ("Reading source and reviewing code", "Reviewed source"),
    ("Drafting and verifying actions", "Verified action plan"),
    ("Structuring tickets", "Structured tickets"),
    ("Exporting tickets", "Exported tickets"),
];

/// Spinner per pipeline stage, drawn on stderr
pub struct PhaseProgress {
    pb: ProgressBar,
}

impl PhaseProgress {
    pub fn start() -> Self {
        eprintln!("{}", section_header("⚙️", "Stages"));
        Self {
            pb: create_spinner(running_message(Stage::Ingest.index())),
        }
    }
}

impl StageObserver for PhaseProgress {
    fn stage_finished(&mut self, stage: Stage) {
        self.pb.finish_with_message(done_message(stage.index()));
        let next = stage.index() + 1;
        if next < Stage::COUNT {
            self.pb = create_spinner(running_message(next));
        } else {
            eprintln!();
        }
    }

    fn stage_failed(&mut self, stage: Stage) {
        let (running, _) = STAGES[stage.index()];
        let message = format!("{}: {running}", stage_label(stage.index()));
        self.pb.abandon_with_message(stage_failed(&message).to_string());
        eprintln!();
    }
}

fn stage_label(index: usize) -> String {
    format!("Stage {}/{}", index + 1, Stage::COUNT)
}

fn running_message(index: usize) -> String {
    let (running, _) = STAGES[index];
    stage_running(&format!("{}: {running}", stage_label(index))).to_string()
}

fn done_message(index: usize) -> String {
    let (_, finished) = STAGES[index];
    stage_done(&format!("{}: {finished}", stage_label(index))).to_string()
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::default_spinner().template("  {msg} {spinner}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
