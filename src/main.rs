use std::path::{Path, PathBuf};
use wikirag::cli::{Cli, Commands, ConfigAction};
use wikirag::config::{Config, ConfigValidator};
use wikirag::engine::{QueryEngine, QueryOptions, QueryResponse};
use wikirag::error::{Result, WikiRagError};
use wikirag::evaluation;
use wikirag::retrieval::Candidate;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Search {
            query,
            top_k,
            no_rerank,
            json,
        } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_search(&config, &query, top_k, no_rerank, json).await?;
        }
        Commands::Ask {
            question,
            top_k,
            no_rerank,
            json,
        } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_ask(&config, &question, top_k, no_rerank, json).await?;
        }
        Commands::Eval {
            cases,
            top_k,
            output,
        } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_eval(&config, &cases, top_k, output).await?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, cli.profile, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "wikirag=debug" } else { "wikirag=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn query_options(config: &Config, top_k: Option<usize>, no_rerank: bool) -> QueryOptions {
    let mut options = QueryOptions::from(&config.retrieval);
    if let Some(k) = top_k {
        options.top_k = k;
    }
    if no_rerank {
        options.use_reranking = false;
    }
    options
}

async fn cmd_search(
    config: &Config,
    query: &str,
    top_k: Option<usize>,
    no_rerank: bool,
    json: bool,
) -> Result<()> {
    let engine = QueryEngine::from_config(config)?;
    let options = query_options(config, top_k, no_rerank);

    let deadline = options
        .stage_timeout
        .map(|timeout| std::time::Instant::now() + timeout);
    let outcome = engine.search(query, options, deadline).await?;

    if json {
        println!("{}", to_json(&outcome.candidates, "search results")?);
        return Ok(());
    }

    if outcome.candidates.is_empty() {
        println!("No relevant passages found.");
        return Ok(());
    }

    println!(
        "Top {} of {} shortlisted ({} dense, {} sparse hits):\n",
        outcome.candidates.len(),
        outcome.shortlist_len,
        outcome.dense_hits,
        outcome.sparse_hits
    );
    for (i, candidate) in outcome.candidates.iter().enumerate() {
        print_candidate(i + 1, candidate);
    }

    Ok(())
}

async fn cmd_ask(
    config: &Config,
    question: &str,
    top_k: Option<usize>,
    no_rerank: bool,
    json: bool,
) -> Result<()> {
    let engine = QueryEngine::from_config(config)?;
    let response = engine
        .query(question, query_options(config, top_k, no_rerank))
        .await?;

    if json {
        println!("{}", to_json(&response, "query response")?);
    } else {
        print_response(&response);
    }

    Ok(())
}

async fn cmd_eval(
    config: &Config,
    cases_path: &Path,
    top_k: Option<usize>,
    output: Option<PathBuf>,
) -> Result<()> {
    let cases = evaluation::load_cases(cases_path)?;
    let searcher = wikirag::engine::build_searcher(config)?;
    let k = top_k.unwrap_or(config.retrieval.top_k);

    let report =
        evaluation::evaluate(&searcher, &cases, k, config.retrieval.use_reranking).await?;

    for (i, outcome) in report.outcomes.iter().enumerate() {
        let status = if outcome.correct { "✓" } else { "✗" };
        println!("{} [{}/{}] {}", status, i + 1, report.total, outcome.query);
        println!("    Expected: {}", outcome.expected_source);
        match (&outcome.top_source, outcome.top_relevance) {
            (Some(source), Some(relevance)) => {
                println!("    Got: {} (relevance: {:.0}%)", source, relevance * 100.0)
            }
            _ => println!("    Got: no results"),
        }
    }

    println!(
        "\nAccuracy: {}/{} ({:.0}%)",
        report.correct, report.total, report.accuracy
    );

    if let Some(path) = output {
        std::fs::write(&path, to_json(&report, "evaluation report")?).map_err(|e| {
            WikiRagError::Io {
                source: e,
                context: format!("Failed to write report: {:?}", path),
            }
        })?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

fn cmd_config(
    config_path: Option<PathBuf>,
    profile: Option<String>,
    action: ConfigAction,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path, profile)?;
            let rendered = toml::to_string_pretty(&config)?;
            println!("{}", rendered);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            ConfigValidator::validate(&config)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| WikiRagError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'wikirag config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        ConfigValidator::validate(&config)?;
        return Ok(config);
    }

    match profile {
        Some(profile) => Config::load_with_profile(&path, &profile),
        None => Config::load(&path),
    }
}

fn to_json<T: serde::Serialize>(value: &T, what: &str) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| WikiRagError::Json {
        source: e,
        context: format!("Failed to serialize {}", what),
    })
}

fn print_candidate(rank: usize, candidate: &Candidate) {
    println!("  {}. {}", rank, candidate.title);
    println!("     Source: {} ({})", candidate.source, candidate.category);
    println!(
        "     Relevance: {:.1}% | Method: {}",
        candidate.relevance * 100.0,
        candidate.method_label()
    );
    println!("     {}", candidate.preview(160).replace('\n', " "));
}

fn print_response(response: &QueryResponse) {
    println!("{}\n", response.answer);

    if !response.success {
        return;
    }

    println!("Sources:");
    for source in &response.sources {
        println!("  • {} ({})", source.title, source.source);
        println!(
            "    Relevance: {:.1}% | Method: {}",
            source.relevance * 100.0,
            source.method
        );
    }

    println!(
        "\nTiming: search {:.0}ms, generation {:.0}ms, total {:.0}ms",
        response.timing.search_ms, response.timing.generation_ms, response.timing.total_ms
    );
}
