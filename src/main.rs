//! A3S Metasearch CLI - meta search orchestration from the command line.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use a3s_metasearch::{
    registry::canonical_identifier, AdapterRegistry, AdapterStatus, Orchestrator, SearchConfig,
    SearchError, SearchStrategy,
};

/// A3S Metasearch - query several search providers at once
#[derive(Parser)]
#[command(name = "a3s-metasearch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search across adapters
    Search(SearchArgs),

    /// List registered adapters and whether they can run here
    Adapters,
}

#[derive(Parser)]
struct SearchArgs {
    /// Search query
    query: String,

    /// Dispatch strategy
    #[arg(short, long, default_value = "parallel")]
    strategy: StrategyArg,

    /// JSON configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Preferred adapters (comma-separated)
    /// Available: duckduckgo (ddg), lynx, curl, google, bing, wikipedia (wiki)
    #[arg(short, long, value_delimiter = ',')]
    preferred: Option<Vec<String>>,

    /// Fallback adapters (comma-separated)
    #[arg(long, value_delimiter = ',')]
    fallback: Option<Vec<String>>,

    /// Maximum number of merged results
    #[arg(short, long)]
    limit: Option<usize>,

    /// Results requested from each adapter
    #[arg(long)]
    per_adapter: Option<usize>,

    /// Per-adapter timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Overall deadline in seconds for the whole search
    #[arg(long)]
    deadline: Option<u64>,

    /// Keep duplicate URLs as separate results
    #[arg(long)]
    no_dedup: bool,

    /// Keep results in arrival order instead of ranking by score
    #[arg(long)]
    no_rank: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// All adapters at once
    Parallel,
    /// One adapter at a time, preferred first
    Sequential,
    /// Preferred adapters first, fallbacks only when needed
    Adaptive,
}

impl From<StrategyArg> for SearchStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Parallel => SearchStrategy::Parallel,
            StrategyArg::Sequential => SearchStrategy::Sequential,
            StrategyArg::Adaptive => SearchStrategy::Adaptive,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
    /// Compact single-line output
    Compact,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    match cli.command {
        Commands::Search(args) => run_search(args).await,
        Commands::Adapters => list_adapters(),
    }
}

fn list_adapters() -> Result<()> {
    let registry = AdapterRegistry::with_defaults();

    println!("Registered adapters:\n");
    for adapter in registry.iter() {
        let availability = if adapter.is_available() {
            "available"
        } else {
            "unavailable"
        };
        println!(
            "  {:<12} {:<22} {:<8} {}",
            adapter.identifier(),
            adapter.name(),
            format!("{:?}", adapter.kind()).to_lowercase(),
            availability
        );
    }
    println!();
    println!("Aliases: ddg -> {}, wiki -> {}", canonical_identifier("ddg"), canonical_identifier("wiki"));
    println!("Usage: a3s-metasearch search \"query\" -p duckduckgo,wikipedia --fallback google");
    Ok(())
}

fn build_config(args: &SearchArgs) -> Result<SearchConfig> {
    let mut config = match &args.config {
        Some(path) => SearchConfig::from_file(path)?,
        None => SearchConfig::new(),
    };

    if let Some(preferred) = &args.preferred {
        config = config.with_preferred_adapters(preferred.iter().cloned());
    }
    if let Some(fallback) = &args.fallback {
        config = config.with_fallback_adapters(fallback.iter().cloned());
    }
    if let Some(limit) = args.limit {
        config = config.with_max_total_results(limit);
    }
    if let Some(per_adapter) = args.per_adapter {
        config = config.with_max_results_per_adapter(per_adapter);
    }
    if let Some(timeout) = args.timeout {
        config = config.with_timeout(Duration::from_secs(timeout));
    }
    if args.no_dedup {
        config = config.with_deduplication(false);
    }
    if args.no_rank {
        config = config.with_ranking(false);
    }

    config.validate()?;
    Ok(config)
}

async fn run_search(args: SearchArgs) -> Result<()> {
    let config = build_config(&args)?;
    let strategy = SearchStrategy::from(args.strategy);
    let orchestrator = Orchestrator::new(AdapterRegistry::with_defaults());

    let outcome = match args.deadline {
        Some(secs) => {
            orchestrator
                .search_with_deadline(&args.query, strategy, &config, Duration::from_secs(secs))
                .await
        }
        None => orchestrator.search(&args.query, strategy, &config).await,
    };

    let response = match outcome {
        Ok(response) => response,
        Err(SearchError::AllAdaptersFailed { reports }) => {
            eprintln!("All adapters failed:");
            for report in &reports {
                eprintln!(
                    "  {:<12} {:<12} {}",
                    report.adapter_id,
                    report.status,
                    report.error.as_deref().unwrap_or("")
                );
            }
            anyhow::bail!("Search for \"{}\" could not be completed", args.query);
        }
        Err(e) => return Err(e.into()),
    };

    // Output results
    match args.format {
        OutputFormat::Text => {
            println!(
                "\nSearch results for \"{}\" ({} results in {}ms, {} strategy):\n",
                args.query,
                response.results.len(),
                response.duration_ms,
                strategy
            );

            for (i, result) in response.items().iter().enumerate() {
                println!("{}. {}", i + 1, result.title);
                println!("   URL: {}", result.canonical_url);
                if !result.snippet.is_empty() {
                    println!("   {}", truncate_chars(&result.snippet, 150));
                }
                let sources: Vec<&str> = result.source_adapters.iter().map(String::as_str).collect();
                println!(
                    "   Adapters: {} | Rank: {} | Score: {}",
                    sources.join(", "),
                    result.first_seen_rank,
                    result.score
                );
                println!();
            }

            println!("Adapter status:");
            for report in response.engine_stats.values() {
                let detail = match report.status {
                    AdapterStatus::Success => format!("{} results", report.result_count),
                    _ => report.error.clone().unwrap_or_default(),
                };
                println!(
                    "  {:<12} {:<12} {:>6}ms  {}",
                    report.adapter_id, report.status, report.elapsed_ms, detail
                );
            }
            if response.malformed_urls > 0 {
                println!("  ({} results dropped for malformed URLs)", response.malformed_urls);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Compact => {
            for result in response.items() {
                println!("{}\t{}", result.title, result.canonical_url);
            }
        }
    }

    Ok(())
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
