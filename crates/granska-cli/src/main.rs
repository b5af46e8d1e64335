mod commands;
mod output;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "granska",
    version,
    about = "Extract auditor, audit date, factory and findings from compliance audit reports"
)]
struct Cli {
    /// Log more (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract candidates from a report (PDF or plain text) and print the report
    Extract {
        /// Path to a PDF, or a .txt file with form-feed separated pages
        input_file: PathBuf,

        /// Field(s) to extract: auditor, date, supplier, findings, all (default: all)
        #[arg(short, long = "extract", value_name = "FIELD")]
        extract: Vec<String>,

        /// Confidence floor for the report (default 0.60)
        #[arg(long, value_name = "X")]
        min_confidence: Option<f64>,

        /// TOML configuration file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Candidate log to append to (default: <input stem>.candidates.jsonl)
        #[arg(long, value_name = "FILE")]
        log: Option<PathBuf>,

        /// Document id recorded on every candidate (default: input file stem)
        #[arg(long, value_name = "ID")]
        document_id: Option<String>,

        /// Run the field strategies in parallel
        #[arg(long)]
        parallel: bool,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Also list every candidate, including those below the floor
        #[arg(long)]
        show_candidates: bool,
    },
    /// Rebuild reports from a candidate log
    Report {
        /// Path to a candidate log (.jsonl)
        log_file: PathBuf,

        /// Only this document (default: every document in the log)
        #[arg(long, value_name = "ID")]
        document_id: Option<String>,

        /// Confidence floor for the report (default 0.60)
        #[arg(long, value_name = "X")]
        min_confidence: Option<f64>,

        /// Only use each document's most recent run
        #[arg(long)]
        latest_run: bool,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the reports to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// List logged candidates with their score breakdown
    Candidates {
        /// Path to a candidate log (.jsonl)
        log_file: PathBuf,

        /// Only this document
        #[arg(long, value_name = "ID")]
        document_id: Option<String>,

        /// Only this field: auditor, date, supplier, findings
        #[arg(long, value_name = "FIELD")]
        field: Option<String>,

        /// Floor used to flag candidates the report would drop (default 0.60)
        #[arg(long, value_name = "X")]
        min_confidence: Option<f64>,
    },
    /// Print the default configuration as TOML
    Config,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Extract {
            input_file,
            extract,
            min_confidence,
            config,
            log,
            document_id,
            parallel,
            output,
            show_candidates,
        } => commands::extract::run(commands::extract::ExtractArgs {
            input_file,
            extract,
            min_confidence,
            config,
            log,
            document_id,
            parallel,
            output_format: output,
            show_candidates,
        }),
        Commands::Report {
            log_file,
            document_id,
            min_confidence,
            latest_run,
            output,
            out,
        } => commands::report::run(
            log_file,
            document_id,
            min_confidence,
            latest_run,
            &output,
            out,
        ),
        Commands::Candidates {
            log_file,
            document_id,
            field,
            min_confidence,
        } => commands::candidates::run(log_file, document_id, field, min_confidence),
        Commands::Config => commands::config::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
