use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::config::Config;
use crate::model::IngestInput;
use crate::output::{export_json, print_ticket_summary, PhaseProgress};
use crate::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "repo-surgeon")]
#[command(author, version, about = "Turn legacy code into migration tickets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (toml, json or yaml)
    #[arg(short, long, global = true, env = "REPO_SURGEON_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Address to bind, overriding configuration
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Run all four stages once and print the report
    Run(RunArgs),
}

#[derive(Args)]
#[command(group(clap::ArgGroup::new("source").required(true).args(["code", "code_file", "repo_url"])))]
struct RunArgs {
    /// Source code to review
    #[arg(long)]
    code: Option<String>,

    /// File holding the source code to review
    #[arg(long)]
    code_file: Option<PathBuf>,

    /// GitHub repository to review
    #[arg(short, long)]
    repo_url: Option<String>,

    /// Language hint for the review
    #[arg(short, long)]
    language: Option<String>,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, default_value_t = false)]
    pretty: bool,

    /// Write the fallback CSV here when export fails
    #[arg(long)]
    csv: Option<PathBuf>,
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        let mut config = Config::load(self.config.as_deref())?;
        config.apply_process_env();

        match &self.command {
            Commands::Serve { bind } => {
                if let Some(bind) = bind {
                    config.server.bind.clone_from(bind);
                }
                config.validate()?;
                crate::server::serve(&config).await
            }
            Commands::Run(args) => {
                config.validate()?;
                execute_run(&config, args).await
            }
        }
    }
}

impl RunArgs {
    fn ingest_input(&self) -> Result<IngestInput> {
        let code_input = match (&self.code, &self.code_file) {
            (Some(code), _) => Some(code.clone()),
            (None, Some(path)) => Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
            ),
            (None, None) => None,
        };

        Ok(IngestInput {
            repo_url: self.repo_url.clone(),
            code_input,
            language: self.language.clone(),
        })
    }
}

async fn execute_run(config: &Config, args: &RunArgs) -> Result<()> {
    let input = args.ingest_input()?;
    let pipeline = Pipeline::new(config)?;

    let mut progress = PhaseProgress::start();
    let report = pipeline.run_observed(&input, &mut progress).await?;

    print_ticket_summary(&report);

    if let (Some(path), Some(csv)) = (&args.csv, &report.step4.csv_content) {
        std::fs::write(path, csv)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Fallback CSV written to: {}", path.display());
    }

    if let Some(path) = &args.output {
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        export_json(&report, args.pretty, &mut file)?;
        info!("Report written to: {}", path.display());
    } else {
        let mut stdout = io::stdout().lock();
        export_json(&report, args.pretty, &mut stdout)?;
        stdout.flush()?;
    }

    Ok(())
}
