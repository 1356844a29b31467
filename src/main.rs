mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use notevec::search::{EmbeddingProvider, HtpProvider, OpenAiCompatProvider};
use notevec::{resolve_caller_identity, Config, ErrorKind, NoteService, RequestContext};

use commands::CommandContext;

#[derive(Parser)]
#[command(name = "notevec")]
#[command(about = "Personal notes with semantic retrieval", long_about = None)]
#[command(version)]
struct Cli {
    /// Acting user (falls back to NOTEVEC_USER)
    #[arg(long, global = true)]
    user: Option<String>,
    /// SQLite database path (overrides NOTEVEC_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Use the local deterministic embedding model instead of the remote provider
    #[arg(long, global = true)]
    offline: bool,
    /// Minimum relevance score for search hits (exclusive)
    #[arg(long, global = true)]
    threshold: Option<f64>,
    /// Nearest-neighbor candidates considered per search
    #[arg(long, global = true)]
    candidates: Option<usize>,
    #[arg(long, global = true, help = "JSON output")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a note and embed it
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
    },
    /// Replace a note's title and body and re-embed it
    Update {
        id: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
    },
    /// Delete a note and all of its embeddings
    Delete { id: String },
    /// List your notes, newest first
    List,
    /// Show one note
    Show { id: String },
    /// Find notes relevant to a query
    #[command(alias = "s")]
    Search { query: String },
    /// Show store statistics
    Status,
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => exit_with(&anyhow::Error::from(e)),
    };

    if let Err(e) = runtime.block_on(run(cli)) {
        exit_with(&e);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(threshold) = cli.threshold {
        config.retrieval.relevance_threshold = threshold;
    }
    if let Some(candidates) = cli.candidates {
        config.retrieval.candidate_limit = candidates;
    }

    let provider: Arc<dyn EmbeddingProvider> = if cli.offline {
        Arc::new(HtpProvider::new())
    } else {
        if config.embedding.api_key.is_none() {
            tracing::warn!("no embedding API key configured; requests may be rejected");
        }
        Arc::new(OpenAiCompatProvider::new(&config.embedding)?)
    };

    let service = NoteService::open(&config, provider)?;
    let request = RequestContext {
        user: cli.user.or_else(|| std::env::var("NOTEVEC_USER").ok()),
    };
    let ctx = CommandContext {
        service,
        caller: resolve_caller_identity(&request),
        json: cli.json,
    };

    match cli.command {
        Commands::Create { title, body } => commands::create::run(&ctx, &title, &body).await,
        Commands::Update { id, title, body } => {
            commands::update::run(&ctx, &id, &title, &body).await
        }
        Commands::Delete { id } => commands::delete::run(&ctx, &id),
        Commands::List => commands::list::run(&ctx),
        Commands::Show { id } => commands::show::run(&ctx, &id),
        Commands::Search { query } => commands::search::run(&ctx, &query).await,
        Commands::Status => commands::status::run(&ctx, &config),
    }
}

/// Print the error and exit with a code per error kind.
fn exit_with(err: &anyhow::Error) -> ! {
    let code = match err.downcast_ref::<notevec::Error>().map(notevec::Error::kind) {
        Some(ErrorKind::NotAuthenticated) => 3,
        Some(ErrorKind::NotAuthorized) => 4,
        Some(ErrorKind::NotFound) => 5,
        Some(ErrorKind::EmbeddingProvider) => 6,
        Some(ErrorKind::IncompatibleEmbeddings) => 7,
        Some(ErrorKind::Config) => 2,
        Some(ErrorKind::Storage) | None => 1,
    };
    eprintln!("{} {:#}", "Error:".red().bold(), err);
    std::process::exit(code);
}
