use anyhow::{Context, Result};
use clap::Parser;
use std::future::Future;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use duovocab_acquire::{DuolingoClient, VocabularyService};
use duovocab_export::{rows, ExportOutcome, ExportSettings};

mod prompt;
mod select;
mod store;

use prompt::Prompter;

#[derive(Parser)]
#[command(name = "duovocab")]
#[command(about = "Export your Duolingo vocabulary to an Anki-ready TSV table")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_HASH"), ")"))]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "info", value_enum)]
    log_level: LogLevel,

    /// Use UTC timestamps instead of local time
    #[arg(long, global = true)]
    utc: bool,

    /// Duolingo username (prompted for when omitted)
    #[arg(short, long)]
    username: Option<String>,

    /// Directory holding the <language>.tsv table
    #[arg(short = 'O', long, default_value = ".")]
    output_dir: PathBuf,

    /// Anki data directory (defaults to the platform's Anki2 folder)
    #[arg(long)]
    anki_dir: Option<PathBuf>,
}

#[derive(Clone, clap::ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let mut prompter = Prompter::stdio();

    let client = login(
        &mut prompter,
        cli.username.clone(),
        || rpassword::prompt_password("Enter your password: ").context("Failed to read password"),
        |name, password| async move { DuolingoClient::login(&name, &password).await },
    )
    .await?;
    let languages = client.languages().await?;
    let language = select::select_language(&mut prompter, &languages)?;

    let overview = client
        .vocabulary(&language.code)
        .await
        .with_context(|| format!("Failed to fetch vocabulary for {}", language.name))?;
    if overview.is_empty() {
        tracing::warn!(lang = %language.code, "No vocabulary to export");
        return Ok(());
    }
    let path = cli.output_dir.join(language.table_file_name());
    if let Some(rows) = duovocab_export::up_to_date(&path, &overview) {
        tracing::info!(path = %path.display(), rows, "No new words; table left unchanged");
        return Ok(());
    }

    let example = rows::example_record(&client, &overview)
        .await?
        .context("Vocabulary overview is empty")?;

    let fields = select::select_fields(&mut prompter, &example.record)?;
    tracing::info!(columns = ?fields.columns(), "Selected fields");
    let media = store::media_store(&mut prompter, &fields, &language.code, cli.anki_dir.clone())?;

    let settings = ExportSettings {
        language,
        fields,
        output_dir: cli.output_dir.clone(),
        media,
    };
    let outcome =
        duovocab_export::export_overview(&client, &client, &settings, &overview, Some(&example))
            .await?;

    match outcome {
        ExportOutcome::NoVocabulary => tracing::warn!("No vocabulary to export"),
        ExportOutcome::UpToDate { path, rows } => {
            tracing::info!(path = %path.display(), rows, "No new words; table left unchanged")
        }
        ExportOutcome::Written {
            path,
            stats,
            details_fetched,
        } => tracing::info!(
            path = %path.display(),
            rows = stats.existing_rows + stats.appended_rows,
            added = stats.appended_rows,
            details = details_fetched,
            "Export complete"
        ),
    }

    Ok(())
}

fn init_tracing(cli: &Cli) {
    // Keep the HTTP stack quiet at debug/trace
    let level = match cli.log_level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug,hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn",
        LogLevel::Trace => "trace,hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Timestamp format: 2026-02-14 19:44:09.123 -08:00
    let time_format = "%Y-%m-%d %H:%M:%S%.3f %:z";

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    if cli.utc {
        builder
            .with_timer(tracing_subscriber::fmt::time::ChronoUtc::new(time_format.to_string()))
            .init();
    } else {
        builder
            .with_timer(tracing_subscriber::fmt::time::ChronoLocal::new(time_format.to_string()))
            .init();
    }
}

/// Ask for credentials until `attempt` accepts them.
///
/// A given `username` is tried first; after a rejection the error is shown
/// and both username and password are asked for again.
async fn login<R, W, P, A, Fut, T>(
    prompter: &mut Prompter<R, W>,
    mut username: Option<String>,
    mut read_password: P,
    mut attempt: A,
) -> Result<T>
where
    R: BufRead,
    W: Write,
    P: FnMut() -> Result<String>,
    A: FnMut(String, String) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    loop {
        let name = match username.take() {
            Some(name) => name,
            None => prompter.ask("Enter your username: ")?,
        };
        let password = read_password()?;

        match attempt(name, password).await {
            Ok(session) => return Ok(session),
            Err(e) => prompter.say(format!("{e:#}"))?,
        }
    }
}
