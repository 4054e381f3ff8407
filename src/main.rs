use clap::{Parser, Subcommand};
use recall::commands;

#[derive(Parser)]
#[command(name = "recall")]
#[command(about = "Personal content archive with hybrid semantic search")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding and language model endpoints
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Save a new record to the archive
    Add {
        /// Title of the record
        title: String,
        /// Short description
        #[arg(long)]
        description: Option<String>,
        /// Body text; read from stdin when omitted
        #[arg(long)]
        text: Option<String>,
        /// Source URL
        #[arg(long)]
        url: Option<String>,
        /// Content kind: webpage, pdf, image, note, bookmark, or history
        #[arg(long)]
        kind: Option<String>,
        /// Category label
        #[arg(long)]
        category: Option<String>,
        /// Comma-separated keyword list
        #[arg(long)]
        keywords: Option<String>,
    },
    /// Search saved content by meaning
    Search {
        /// Natural-language query
        query: String,
        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
        /// Only return this content kind
        #[arg(long)]
        kind: Option<String>,
        /// Only return this category
        #[arg(long)]
        category: Option<String>,
        /// Only records added on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Only records added on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Re-rank results with the language model
        #[arg(long)]
        rerank: bool,
        /// Summarize the top results with the language model
        #[arg(long)]
        summarize: bool,
    },
    /// Search combining semantic similarity and keyword matching
    Hybrid {
        /// Natural-language query
        query: String,
        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
        /// Semantic weight between 0 (keyword only) and 1 (semantic only)
        #[arg(long)]
        weight: Option<f32>,
        /// Only return this content kind
        #[arg(long)]
        kind: Option<String>,
        /// Only return this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Answer a question from saved content
    Ask {
        /// The question to answer
        question: String,
        /// Maximum number of source records
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Find records similar to an existing record
    Similar {
        /// Id of the source record
        id: String,
        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Embed and index records that are not indexed yet
    Index,
    /// Delete a record and its vector entry
    Delete {
        /// Id of the record to delete
        id: String,
    },
    /// Show store counts and collaborator health
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => commands::run_config(show),
        Commands::Add {
            title,
            description,
            text,
            url,
            kind,
            category,
            keywords,
        } => commands::add(title, description, text, url, kind, category, keywords).await,
        Commands::Search {
            query,
            limit,
            kind,
            category,
            from,
            to,
            rerank,
            summarize,
        } => commands::search(query, limit, kind, category, from, to, rerank, summarize).await,
        Commands::Hybrid {
            query,
            limit,
            weight,
            kind,
            category,
        } => commands::hybrid(query, limit, weight, kind, category).await,
        Commands::Ask { question, limit } => commands::ask(question, limit).await,
        Commands::Similar { id, limit } => commands::similar(id, limit).await,
        Commands::Index => commands::index().await,
        Commands::Delete { id } => commands::delete(id).await,
        Commands::Status => commands::status().await,
    }
}
