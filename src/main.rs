//! pdfstack - serve or compile an ordered stack of PDFs.

use clap::Parser;
use std::process;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use pdfstack::cli::{Cli, Command, CompileArgs, ServeArgs};
use pdfstack::compile::CompileOptions;
use pdfstack::config::Config;
use pdfstack::report::{LoadMode, Report};
use pdfstack::session::Session;
use pdfstack::{Error, server};

const DEFAULT_LOG_FILTER: &str = "pdfstack=info,tower_http=info";

#[tokio::main]
async fn main() {
    // A missing .env is fine; a malformed one is worth knowing about.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    if let Err(e) = &dotenv
        && !e.not_found()
    {
        tracing::warn!(error = %e, "Ignoring unreadable .env file");
    }

    if let Err(err) = run(cli).await {
        tracing::error!(error = %err, "pdfstack failed");
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run(cli: Cli) -> Result<(), Error> {
    match cli.command {
        Command::Serve(args) => serve(&args).await,
        Command::Compile(args) => compile(&args).await,
    }
}

async fn serve(args: &ServeArgs) -> Result<(), Error> {
    let config = Config::try_from(args)?;
    let session = Arc::new(Session::from_config(&config)?);

    let available = session.refresh_library().await?;
    tracing::info!(
        documents = available.len(),
        library = %config.library_dir.display(),
        "Library initialized"
    );

    if let Some(path) = &config.report {
        let report = Report::read_from(path).await?;
        session.load_report(&report, LoadMode::Replace).await?;
        tracing::info!(report = %path.display(), "Preloaded report");
    }

    server::serve(&config, session).await
}

async fn compile(args: &CompileArgs) -> Result<(), Error> {
    let config = Config::try_from(args)?;
    let session = Session::from_config(&config)?;

    let report = Report::read_from(&args.report).await?;
    session.load_report(&report, LoadMode::Replace).await?;

    let options = CompileOptions {
        output_name: args.output_name.clone(),
        ..report.options()
    };
    let outcome = session.compile(&options).await?;

    println!(
        "Compiled {} file(s), {} page(s) into {} in {:.2}s",
        outcome.files_merged,
        outcome.total_pages,
        outcome.output.display(),
        outcome.elapsed.as_secs_f64()
    );
    Ok(())
}
