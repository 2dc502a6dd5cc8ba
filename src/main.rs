use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use shortlist::evaluate::{self, SAMPLE_QUERIES};
use shortlist::{Catalog, EngineConfig, HashEmbedderConfig, HnswParams, LoadReport, Recommender, RestApi, SearchStrategy};
use shortlist_engine::{validate_top_k, DEFAULT_EF_SEARCH, DEFAULT_TOP_K};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Offline assessment recommender
#[derive(Parser, Debug)]
#[command(name = "shortlist")]
#[command(about = "Recommend catalog assessments for a job query, fully offline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Embedding dimension
    #[arg(long, global = true, default_value_t = shortlist::DEFAULT_DIM)]
    dimension: usize,

    /// Search strategy
    #[arg(long, global = true, value_enum, default_value_t = StrategyArg::Exact)]
    strategy: StrategyArg,

    /// HNSW candidate breadth; results equal exact search once it reaches the catalog size
    #[arg(long, global = true, default_value_t = DEFAULT_EF_SEARCH)]
    ef_search: usize,

    /// HNSW links per node
    #[arg(long, global = true, default_value_t = HnswParams::default().max_connections)]
    max_connections: usize,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    Exact,
    Hnsw,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the REST API
    Serve {
        #[arg(short, long, default_value = "data/catalog.json")]
        catalog: PathBuf,

        /// HTTP API port
        #[arg(long, default_value_t = 8000)]
        http_port: u16,

        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },
    /// Print recommendations for one query
    Query {
        #[arg(short, long, default_value = "data/catalog.json")]
        catalog: PathBuf,

        text: String,

        #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K as i64, allow_negative_numbers = true)]
        top_k: i64,
    },
    /// Run the sample job queries and print score statistics
    Evaluate {
        #[arg(short, long, default_value = "data/catalog.json")]
        catalog: PathBuf,

        #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K as i64, allow_negative_numbers = true)]
        top_k: i64,
    },
    /// Validate a catalog file and print the load report
    Check {
        #[arg(short, long, default_value = "data/catalog.json")]
        catalog: PathBuf,
    },
}

impl EngineArgs {
    fn to_config(&self) -> EngineConfig {
        let strategy = match self.strategy {
            StrategyArg::Exact => SearchStrategy::Exact,
            StrategyArg::Hnsw => SearchStrategy::Hnsw {
                params: HnswParams {
                    max_connections: self.max_connections,
                    ..HnswParams::default()
                },
                ef_search: self.ef_search,
            },
        };
        EngineConfig {
            embedder: HashEmbedderConfig {
                dimension: self.dimension,
                ..HashEmbedderConfig::default()
            },
            strategy,
            default_top_k: DEFAULT_TOP_K,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.engine.to_config();
    config.validate().context("invalid engine configuration")?;

    match cli.command {
        Command::Serve {
            catalog,
            http_port,
            host,
        } => serve(config, &catalog, host, http_port).await,
        Command::Query { catalog, text, top_k } => {
            let k = validate_top_k(top_k)?;
            let recommender = build_recommender(config, &catalog)?;
            for rec in recommender.recommend(&text, k)? {
                println!("{}. {} [{}] (score: {:.4})", rec.rank, rec.name, rec.id, rec.score);
                println!("   Category: {}", rec.category);
                println!("   Duration: {} minutes", rec.duration_minutes);
                println!("   Tags: {}", rec.tags.join(", "));
                println!("   Recommended for: {}", rec.recommended_roles.join(", "));
            }
            Ok(())
        }
        Command::Evaluate { catalog, top_k } => {
            let k = validate_top_k(top_k)?;
            let recommender = build_recommender(config, &catalog)?;
            let evaluation = evaluate::run(&recommender, SAMPLE_QUERIES, k)?;

            println!("EVALUATION RESULTS (top-{} recommendations)", evaluation.top_k);
            for (i, outcome) in evaluation.outcomes.iter().enumerate() {
                println!();
                println!("QUERY {}: {}", i + 1, outcome.query);
                for rec in &outcome.recommendations {
                    println!("{}. {} (score: {:.4})", rec.rank, rec.name, rec.score);
                    println!("   Category: {}", rec.category);
                    println!("   Tags: {}", rec.tags.join(", "));
                }
            }

            if let Some(summary) = evaluation.summary {
                println!();
                println!("OVERALL STATISTICS");
                println!("Average similarity score: {:.4}", summary.mean);
                println!("Min similarity score: {:.4}", summary.min);
                println!("Max similarity score: {:.4}", summary.max);
                println!("Median similarity score: {:.4}", summary.median);
            }
            Ok(())
        }
        Command::Check { catalog } => {
            let (loaded, report) = load_catalog(&catalog)?;
            print_report(&report);
            let mut categories: Vec<&str> = loaded.iter().map(|r| r.category.as_str()).collect();
            categories.sort_unstable();
            categories.dedup();
            println!("Distinct categories: {}", categories.len());
            if !report.is_clean() {
                anyhow::bail!("{} record(s) rejected", report.rejected.len());
            }
            Ok(())
        }
    }
}

fn load_catalog(path: &Path) -> anyhow::Result<(Catalog, LoadReport)> {
    Catalog::load(path).with_context(|| format!("failed to load catalog {}", path.display()))
}

fn build_recommender(config: EngineConfig, path: &Path) -> anyhow::Result<Recommender> {
    let (catalog, report) = load_catalog(path)?;
    if !report.is_clean() {
        warn!("{} catalog record(s) rejected, continuing with {}", report.rejected.len(), report.loaded);
    }
    Recommender::from_config(config, catalog).context("failed to build index")
}

fn print_report(report: &LoadReport) {
    println!("Accepted records: {}", report.loaded);
    println!("Rejected records: {}", report.rejected.len());
    for rejection in &report.rejected {
        println!(
            "  #{} {}: {}",
            rejection.position,
            rejection.id.as_deref().unwrap_or("<no id>"),
            rejection.reason
        );
    }
}

async fn serve(config: EngineConfig, catalog: &Path, host: String, http_port: u16) -> anyhow::Result<()> {
    info!("Starting Shortlist v{}", env!("CARGO_PKG_VERSION"));
    info!("Catalog: {:?}", catalog);
    info!("HTTP API port: {}", http_port);

    let recommender = Arc::new(build_recommender(config, catalog)?);
    info!("Recommender ready: {:?}", recommender);

    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on {}:{}", host, http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(recommender, &host, http_port).await {
                eprintln!("HTTP server error: {}", e);
            }
        })
    });

    info!("HTTP API: http://localhost:{}/", http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
