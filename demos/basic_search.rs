//! Example: Adaptive meta search over the built-in adapters.

use a3s_metasearch::{AdapterRegistry, Orchestrator, SearchConfig, SearchStrategy};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt::init();

    let registry = AdapterRegistry::with_defaults();
    println!(
        "Registered {} adapters, available here: {}",
        registry.len(),
        registry.available().join(", ")
    );

    let orchestrator = Orchestrator::new(registry);

    // Google and Bing only run when the first wave falls short
    let config = SearchConfig::new()
        .with_preferred_adapters(["duckduckgo", "wikipedia"])
        .with_fallback_adapters(["google", "bing", "curl"])
        .with_max_total_results(10);

    let query = "rust programming language";
    println!("Searching for: {}", query);
    println!();

    let response = orchestrator
        .search(query, SearchStrategy::Adaptive, &config)
        .await?;

    println!(
        "Found {} results in {}ms",
        response.results.len(),
        response.duration_ms
    );
    println!();

    for (i, result) in response.items().iter().enumerate() {
        println!("{}. {}", i + 1, result.title);
        println!("   URL: {}", result.canonical_url);
        println!("   Adapters: {:?}", result.source_adapters);
        println!("   Score: {}", result.score);
        if !result.snippet.is_empty() {
            let snippet: String = result.snippet.chars().take(100).collect();
            println!("   {}", snippet);
        }
        println!();
    }

    for (id, report) in &response.engine_stats {
        println!("{}: {} ({} results)", id, report.status, report.result_count);
    }

    let stats = orchestrator.statistics();
    println!();
    println!(
        "Statistics: {} searches, {:.0}% successful",
        stats.total_searches,
        stats.success_rate * 100.0
    );

    Ok(())
}
