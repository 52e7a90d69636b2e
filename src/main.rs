use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use pdfrag_core::bootstrap::AppBuilder;
use pdfrag_core::{EvalError, EvalOutcome, Evaluator};

const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const RESET: &str = "\x1b[0m";

#[derive(Parser, Debug)]
#[command(
    name = "pdfrag",
    version,
    about = "Index PDFs into a local vector store and answer questions about them"
)]
struct Cli {
    /// Config file (falls back to PDFRAG_CONFIG, then config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Delete the vector store before populating it
    #[arg(long)]
    reset: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    /// `--reset` only applies to populating.
    fn validate(&self) -> Result<(), clap::Error> {
        if self.reset && self.command.is_some() {
            return Err(Self::command().error(
                ErrorKind::ArgumentConflict,
                "--reset cannot be combined with a subcommand",
            ));
        }
        Ok(())
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer a question from the indexed documents
    Query {
        /// The question to answer
        question: String,
    },
    /// Run the configured evaluation cases against the judge model
    Eval,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Err(e) = cli.validate() {
        e.exit();
    }
    init_subscriber();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    runtime.block_on(run(cli))
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let app = AppBuilder::from_cli(cli.config.as_deref())?;
    tracing::debug!(config = %app.config_path().display(), "configuration loaded");

    match cli.command {
        None => populate(&app, cli.reset).await,
        Some(Command::Query { question }) => query(&app, &question).await,
        Some(Command::Eval) => eval(&app).await,
    }
}

async fn populate(app: &AppBuilder, reset: bool) -> anyhow::Result<()> {
    let provider = app.build_provider().await;
    let report = app.build_ingestor(&provider)?.run(reset).await;
    println!("{report}");
    Ok(())
}

async fn query(app: &AppBuilder, question: &str) -> anyhow::Result<()> {
    let provider = app.build_provider().await;
    let pipeline = app.build_pipeline(provider).await?;
    let response = pipeline.query(question).await?;

    println!("Response: {}", response.text);
    println!("Sources: {:?}", response.sources);
    Ok(())
}

async fn eval(app: &AppBuilder) -> anyhow::Result<()> {
    let provider = app.build_provider().await;
    let pipeline = app.build_pipeline(provider).await?;
    let evaluator = Evaluator::new(&pipeline, app.build_judge());

    let cases = &app.config().eval.cases;
    let results = evaluator.run(cases).await;

    let mut failed = 0usize;
    for (case, result) in cases.iter().zip(&results) {
        println!("Question: {}", case.question);
        print_outcome(result);
        if !result.as_ref().is_ok_and(|o| o.passed) {
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{failed} of {} evaluation case(s) failed", cases.len());
    }
    println!("{GREEN}All {} evaluation case(s) passed{RESET}", cases.len());
    Ok(())
}

fn print_outcome(result: &Result<EvalOutcome, EvalError>) {
    match result {
        Ok(outcome) => {
            println!("Expected Response: {}", outcome.case.expected);
            println!("Actual Response: {}", outcome.actual);
            let color = if outcome.passed { GREEN } else { RED };
            println!("{color}Response: {}{RESET}", outcome.verdict);
        }
        Err(e) => println!("{RED}Error: {e}{RESET}"),
    }
}
