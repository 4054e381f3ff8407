use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

use crate::config::{Config, get_config_dir, run_interactive_config, show_config};
use crate::database::lancedb::{VectorIndex, VectorStore};
use crate::database::sqlite::Database;
use crate::database::sqlite::models::{ContentKind, NewContentRecord, Origin};
use crate::embeddings::Embedder;
use crate::embeddings::ollama::OllamaClient;
use crate::indexer::Indexer;
use crate::llm::CompletionModel;
use crate::llm::ollama::OllamaGenerator;
use crate::search::{
    DateRange, EnrichedResult, HybridSearchRequest, SearchEngine, SearchRequest,
};
use crate::RecallError;

/// Long-lived collaborators shared by every operation of one CLI invocation
struct Services {
    config: Config,
    store: Database,
    vectors: Option<Arc<VectorStore>>,
    embedder: Arc<OllamaClient>,
    model: Option<Arc<OllamaGenerator>>,
}

async fn init_services() -> Result<Services> {
    let config_dir = get_config_dir().context("Failed to resolve config directory")?;
    let config = Config::load(&config_dir).context("Failed to load configuration")?;

    std::fs::create_dir_all(config.get_base_dir()).with_context(|| {
        format!(
            "Failed to create data directory: {}",
            config.get_base_dir().display()
        )
    })?;

    let store = Database::new(config.database_path())
        .await
        .context("Failed to initialize database")?;

    let vectors = match VectorStore::new(&config).await {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            warn!("Vector store unavailable: {}", e);
            eprintln!(
                "{}",
                style("Warning: vector store unavailable; semantic search is disabled.").yellow()
            );
            None
        }
    };

    let embedder =
        Arc::new(OllamaClient::new(&config.ollama).context("Failed to create embedding client")?);

    let model = if config.llm.enabled {
        match OllamaGenerator::new(&config.llm) {
            Ok(generator) => Some(Arc::new(generator)),
            Err(e) => {
                warn!("Language model unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    Ok(Services {
        config,
        store,
        vectors,
        embedder,
        model,
    })
}

impl Services {
    fn engine(&self) -> SearchEngine {
        let mut engine = SearchEngine::new(self.store.clone(), Arc::clone(&self.embedder) as Arc<dyn Embedder>)
            .with_overfetch_factor(self.config.search.overfetch_factor);

        if let Some(vectors) = &self.vectors {
            engine = engine.with_vector_index(Arc::clone(vectors) as Arc<dyn VectorIndex>);
        }
        if let Some(model) = &self.model {
            engine = engine.with_completion_model(Arc::clone(model) as Arc<dyn CompletionModel>);
        }

        engine
    }

    fn indexer(&self) -> Indexer {
        let mut indexer = Indexer::new(self.store.clone(), Arc::clone(&self.embedder) as Arc<dyn Embedder>);

        if let Some(vectors) = &self.vectors {
            indexer = indexer.with_vector_index(Arc::clone(vectors) as Arc<dyn VectorIndex>);
        }
        if let Some(model) = &self.model {
            indexer = indexer.with_completion_model(Arc::clone(model) as Arc<dyn CompletionModel>);
        }

        indexer
    }
}

/// Configure endpoints interactively, or show the current configuration
#[inline]
pub fn run_config(show: bool) -> Result<()> {
    if show { show_config() } else { run_interactive_config() }
}

/// Store a new record and index it
#[inline]
pub async fn add(
    title: String,
    description: Option<String>,
    text: Option<String>,
    url: Option<String>,
    kind: Option<String>,
    category: Option<String>,
    keywords: Option<String>,
) -> Result<()> {
    let body = match text {
        Some(text) => text,
        None => std::io::read_to_string(std::io::stdin()).context("Failed to read body from stdin")?,
    };

    let content_kind = parse_kind(kind.as_deref())?.unwrap_or(ContentKind::Note);
    let domain = url
        .as_deref()
        .and_then(|u| url::Url::parse(u).ok())
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_default();
    let keyword_list: Vec<String> = keywords
        .as_deref()
        .map(|list| {
            list.split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect()
        })
        .unwrap_or_default();
    let word_count = body.split_whitespace().count() as i64;

    let new_record = NewContentRecord {
        title,
        description: description.unwrap_or_default(),
        body,
        content_kind,
        url: url.unwrap_or_default(),
        domain,
        keywords: keyword_list,
        category: category.unwrap_or_else(|| crate::database::sqlite::models::DEFAULT_CATEGORY.to_string()),
        origin: Origin::Manual,
        word_count,
        page_count: 0,
        date_added: None,
    };

    let services = init_services().await?;
    let record = services
        .indexer()
        .ingest(&services.config.owner_id, new_record)
        .await?;

    println!("Saved {} ({})", style(&record.title).bold(), record.id);
    if record.is_indexed {
        println!("Indexed for semantic search.");
    } else {
        println!("Not yet indexed; run 'recall index' to backfill.");
    }
    if !record.keywords.is_empty() {
        println!("Keywords: {}", record.keywords.iter().join(", "));
    }
    println!("Category: {}", record.category);

    Ok(())
}

/// Semantic search with optional filters, re-ranking, and summarization
#[inline]
#[expect(clippy::too_many_arguments, reason = "mirrors the CLI surface")]
pub async fn search(
    query: String,
    limit: Option<usize>,
    kind: Option<String>,
    category: Option<String>,
    from: Option<String>,
    to: Option<String>,
    rerank: bool,
    summarize: bool,
) -> Result<()> {
    let services = init_services().await?;
    let limit = limit.unwrap_or(services.config.search.default_limit);

    let request = SearchRequest {
        query,
        limit,
        content_kind: parse_kind(kind.as_deref())?,
        category,
        date_range: parse_date_range(from.as_deref(), to.as_deref())?,
        rerank,
        summarize,
    };

    let response = services
        .engine()
        .search(&services.config.owner_id, &request)
        .await?;

    if let Some(summary) = &response.summary {
        println!("{}", style("Summary").bold().cyan());
        println!("{}", summary);
        println!();
    }

    println!("{} result(s)", response.count);
    print_results(&response.results, false);

    Ok(())
}

/// Hybrid search fusing the semantic and keyword paths
#[inline]
pub async fn hybrid(
    query: String,
    limit: Option<usize>,
    weight: Option<f32>,
    kind: Option<String>,
    category: Option<String>,
) -> Result<()> {
    let services = init_services().await?;
    let limit = limit.unwrap_or(services.config.search.default_limit);
    let semantic_weight = weight.unwrap_or(services.config.search.semantic_weight);

    let request = HybridSearchRequest {
        query,
        limit,
        content_kind: parse_kind(kind.as_deref())?,
        category,
        semantic_weight,
    };

    let response = services
        .engine()
        .hybrid_search(&services.config.owner_id, &request)
        .await?;

    println!("{} result(s)", response.count);
    print_results(&response.results, true);

    Ok(())
}

/// Answer a question from saved content, with source attribution
#[inline]
pub async fn ask(question: String, limit: Option<usize>) -> Result<()> {
    let services = init_services().await?;
    let limit = limit.unwrap_or(5);

    let response = services
        .engine()
        .ask(&services.config.owner_id, &question, limit)
        .await?;

    println!("{}", response.answer);

    if !response.sources.is_empty() {
        println!();
        println!("{}", style("Sources").bold());
        for source in &response.sources {
            let location = if source.url.is_empty() {
                source.content_kind.to_string()
            } else {
                format!("{}, {}", source.content_kind, source.url)
            };
            println!("  [{:.3}] {} ({})", source.score, source.title, location);
        }
    }

    Ok(())
}

/// Find records similar to an existing record
#[inline]
pub async fn similar(id: String, limit: Option<usize>) -> Result<()> {
    let services = init_services().await?;
    let limit = limit.unwrap_or(services.config.search.default_limit);

    match services
        .engine()
        .find_similar(&services.config.owner_id, &id, limit)
        .await
    {
        Ok(response) => {
            println!(
                "Similar to {} ({})",
                style(&response.source.title).bold(),
                response.source.id
            );
            println!("{} result(s)", response.count);
            print_results(&response.results, false);
            Ok(())
        }
        Err(RecallError::NotFound(_)) => {
            println!("Content not found: {}", id);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Embed and index every record that is not indexed yet
#[inline]
pub async fn index() -> Result<()> {
    let services = init_services().await?;
    let indexer = services.indexer();

    let pending = services.store.list_unindexed().await?;
    if pending.is_empty() {
        println!("All records are indexed.");
        return Ok(());
    }

    println!("Indexing {} record(s)...", pending.len());
    let progress = ProgressBar::new(pending.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .context("Invalid progress template")?,
    );

    let stats = indexer.index_pending(|record| {
        progress.set_message(record.title.clone());
        progress.inc(1);
    })
    .await?;

    progress.finish_and_clear();
    println!("Indexed {} record(s), {} failed.", stats.indexed, stats.failed);
    if stats.failed > 0 {
        println!("Run 'recall index' again to retry failed records.");
    }

    Ok(())
}

/// Delete a record and its vector entry
#[inline]
pub async fn delete(id: String) -> Result<()> {
    let services = init_services().await?;

    match services
        .indexer()
        .remove_record(&services.config.owner_id, &id)
        .await
    {
        Ok(record) => {
            println!("Deleted {} ({})", record.title, record.id);
            Ok(())
        }
        Err(RecallError::NotFound(_)) => {
            println!("Content not found: {}", id);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Report store counts and collaborator health
#[inline]
pub async fn status() -> Result<()> {
    let services = init_services().await?;

    let (total, indexed) = services
        .store
        .count_by_owner(&services.config.owner_id)
        .await?;

    println!("{}", style("Records").bold());
    println!("  Total: {}", total);
    println!("  Indexed: {}", indexed);
    if total > indexed {
        println!(
            "  {} record(s) pending; run 'recall index' to backfill.",
            total - indexed
        );
    }
    println!();

    println!("{}", style("Vector store").bold());
    match &services.vectors {
        Some(vectors) if vectors.is_ready().await => match vectors.count().await {
            Ok(count) => {
                println!("  Ready ({} entries)", count);
                if count != indexed as u64 {
                    println!(
                        "  Entry count differs from indexed records; run 'recall index' to \
                         reconcile."
                    );
                }
            }
            Err(e) => println!("  Error reading entry count: {}", e),
        },
        Some(_) => println!("  Present but not ready"),
        None => println!("  Unavailable"),
    }
    println!();

    println!("{}", style("Embedding endpoint").bold());
    let embedder = Arc::clone(&services.embedder);
    match tokio::task::spawn_blocking(move || embedder.health_check()).await {
        Ok(Ok(())) => println!("  Reachable, model available"),
        Ok(Err(e)) => println!("  Unreachable: {}", e),
        Err(e) => println!("  Health check failed: {}", e),
    }
    println!();

    println!("{}", style("Language model").bold());
    match &services.model {
        Some(model) => {
            let model = Arc::clone(model);
            match tokio::task::spawn_blocking(move || model.ping()).await {
                Ok(Ok(())) => println!("  Reachable"),
                Ok(Err(e)) => println!("  Unreachable: {}", e),
                Err(e) => println!("  Health check failed: {}", e),
            }
        }
        None => println!("  Disabled"),
    }

    Ok(())
}

fn print_results(results: &[EnrichedResult], show_score_breakdown: bool) {
    for (index, result) in results.iter().enumerate() {
        let scores = if show_score_breakdown {
            format!(
                "{:.3} (semantic {:.3}, keyword {:.3})",
                result.score, result.semantic_score, result.keyword_score
            )
        } else {
            format!("{:.3}", result.score)
        };

        println!(
            "{}. [{}] {} ({}, {})",
            index + 1,
            scores,
            style(&result.record.title).bold(),
            result.record.content_kind,
            result.record.category
        );
        if !result.record.url.is_empty() {
            println!("   {}", result.record.url);
        }
        println!("   added {}", result.record.date_added.format("%Y-%m-%d"));
    }
}

fn parse_kind(kind: Option<&str>) -> Result<Option<ContentKind>> {
    kind.map(|k| ContentKind::from_str(k).map_err(|e| anyhow::anyhow!(e)))
        .transpose()
}

fn parse_date_range(from: Option<&str>, to: Option<&str>) -> Result<Option<DateRange>> {
    if from.is_none() && to.is_none() {
        return Ok(None);
    }

    let start = from.map(|d| parse_day(d, false)).transpose()?;
    let end = to.map(|d| parse_day(d, true)).transpose()?;

    Ok(Some(DateRange { start, end }))
}

fn parse_day(input: &str, end_of_day: bool) -> Result<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}' (expected YYYY-MM-DD)", input))?;

    let timestamp = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    };

    match timestamp {
        Some(t) => Ok(t),
        None => bail!("Invalid date '{}'", input),
    }
}
