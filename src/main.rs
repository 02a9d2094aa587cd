// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (stderr, so JSON on stdout stays clean)
// 3. Load and validate the configuration
// 4. Dispatch to the appropriate subcommand handler
// 5. Print results and exit with the proper code
//    (crawl: 0 = done; inspect: 0 = all admissible, 1 = some rejected;
//     2 = error)
// =============================================================================

mod admission; // src/admission/ - which discovered links get crawled
mod cli; // src/cli.rs - command-line parsing
mod config; // src/config.rs - tunable settings
mod content; // src/content/ - HTML, visible text, content gate
mod crawl; // src/crawl/ - frontier, fetcher, workers
mod identity; // src/identity/ - canonical identity and pattern keys

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use url::Url;

use admission::PolicyGate;
use cli::{Cli, Commands};
use config::CrawlerConfig;
use crawl::CrawlReport;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Crawl {
            seeds,
            config,
            workers,
            politeness_ms,
            include_subdomains,
            json,
            report,
        } => {
            let mut config = CrawlerConfig::load(config.as_deref())?;
            if let Some(workers) = workers {
                config.workers = workers;
            }
            if let Some(politeness_ms) = politeness_ms {
                config.politeness_ms = politeness_ms;
            }
            config.include_subdomains |= include_subdomains;

            handle_crawl(&seeds, &config, json, report.as_deref()).await
        }
        Commands::Inspect {
            urls,
            config,
            include_subdomains,
            json,
        } => {
            let mut config = CrawlerConfig::load(config.as_deref())?;
            config.include_subdomains |= include_subdomains;

            handle_inspect(&urls, &config, json)
        }
    }
}

// -v = debug, -vv = trace; RUST_LOG overrides both
fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

// Handles the 'crawl' subcommand
async fn handle_crawl(
    seeds: &[String],
    config: &CrawlerConfig,
    json: bool,
    report_path: Option<&Path>,
) -> Result<i32> {
    config.validate()?;

    let seeds = seeds
        .iter()
        .map(|seed| Url::parse(seed).map_err(|e| anyhow!("Invalid URL '{}': {}", seed, e)))
        .collect::<Result<Vec<_>>>()?;

    if !json {
        println!("🕷️  Crawling from {} seed(s) with {} worker(s)", seeds.len(), config.workers);
    }

    let report = crawl::crawl(seeds, config).await?;

    if let Some(path) = report_path {
        let body = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, body)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    print_report(&report, json)?;
    Ok(0)
}

// What the admission rules think of one URL
#[derive(Debug, Serialize)]
struct Inspection {
    url: String,
    verdict: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    canonical: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pattern: Option<String>,
}

impl Inspection {
    fn is_admissible(&self) -> bool {
        self.verdict == "admissible"
    }
}

// Handles the 'inspect' subcommand
fn handle_inspect(urls: &[String], config: &CrawlerConfig, json: bool) -> Result<i32> {
    config.validate()?;
    let policy = PolicyGate::from_config(config);

    let inspections: Vec<Inspection> = urls.iter().map(|raw| inspect(&policy, raw)).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&inspections)?);
    } else {
        print_inspections(&inspections);
    }

    if inspections.iter().all(Inspection::is_admissible) {
        Ok(0)
    } else {
        Ok(1)
    }
}

fn inspect(policy: &PolicyGate, raw: &str) -> Inspection {
    // The policy gate parses the URL itself; a malformed one fails here too
    let verdict = match policy.check_str(raw) {
        Ok(_) => "admissible".to_string(),
        Err(violation) => format!("policy/{}", violation),
    };

    // Identities only exist for URLs that parse (fragment dropped, as the
    // worker does before admission)
    let url = Url::parse(raw).ok().map(|mut url| {
        url.set_fragment(None);
        url
    });

    Inspection {
        url: raw.to_string(),
        verdict,
        canonical: url.as_ref().map(identity::canonicalize),
        template: url.as_ref().map(identity::generalize),
        pattern: url.as_ref().map(identity::pattern_key),
    }
}

fn print_inspections(inspections: &[Inspection]) {
    for inspection in inspections {
        let mark = if inspection.is_admissible() { "✅" } else { "❌" };
        println!("{} {}", mark, inspection.url);
        println!("   verdict:   {}", inspection.verdict);
        if let (Some(canonical), Some(template), Some(pattern)) =
            (&inspection.canonical, &inspection.template, &inspection.pattern)
        {
            println!("   identity:  {}", canonical);
            println!("   template:  {}", template);
            println!("   pattern:   {}", pattern);
        }
        println!();
    }
}

// Prints the crawl report either as a table or JSON
fn print_report(report: &CrawlReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_report_table(report);
    }
    Ok(())
}

fn print_report_table(report: &CrawlReport) {
    let totals = &report.totals;

    println!();
    println!("📊 Summary ({} workers, {:.1}s):", report.workers, report.elapsed_secs);
    println!("   📥 URLs processed:     {}", totals.urls_processed);
    println!("   ✅ Pages fetched:      {}", totals.pages_fetched);
    println!("   ⚠️  Bad status:         {}", totals.bad_status);
    println!("   ❌ Fetch errors:       {}", totals.fetch_errors);
    println!("   🔀 Offsite redirects:  {}", totals.offsite_redirects);
    println!("   📄 Thin pages:         {}", totals.insufficient_pages);
    println!("   🔗 Links discovered:   {}", totals.links_discovered);
    println!("   ➕ Links admitted:     {}", totals.links_admitted);
    println!("   🚫 Links rejected:     {}", totals.links_rejected());
    println!("   🧩 URL templates:      {} ({} capped)", totals.distinct_patterns, totals.capped_patterns);

    if !totals.rejections.is_empty() {
        println!();
        println!("{:<25} {:>10}", "REJECTED BY", "LINKS");
        println!("{}", "=".repeat(36));
        for (reason, count) in &totals.rejections {
            println!("{:<25} {:>10}", reason, count);
        }
    }
}
