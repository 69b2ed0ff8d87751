// Main entry point - Dependency injection, CLI and server setup
use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use lake_telemetry::application::envelope_service::EnvelopeService;
use lake_telemetry::application::resampler::GapAwareResampler;
use lake_telemetry::application::retriever::Retriever;
use lake_telemetry::application::segmented_fetcher::SegmentedFetcher;
use lake_telemetry::application::streaming_service::StreamingChartService;
use lake_telemetry::domain::station::DateRange;
use lake_telemetry::infrastructure::append_only_cache::AppendOnlyCache;
use lake_telemetry::infrastructure::command_retriever::CommandRetriever;
use lake_telemetry::infrastructure::config::{
    load_app_config, AppConfig, RetrieverKind, DEFAULT_CONFIG_PATH,
};
use lake_telemetry::infrastructure::csv_series_source::CsvSeriesSource;
use lake_telemetry::infrastructure::http_retriever::HttpRetriever;
use lake_telemetry::presentation::app_state::AppState;
use lake_telemetry::presentation::handlers::router;

#[derive(Parser)]
#[command(name = "lake-telemetry", about = "Weather station fetch and envelope charts")]
struct Cli {
    /// Configuration file, extension optional
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download a date range into the station cache
    Fetch {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        start: NaiveDate,
        /// Last day (exclusive), YYYY-MM-DD
        #[arg(long)]
        end: NaiveDate,
    },
    /// Build envelope charts and write them as JSON
    Render {
        /// Only this chart
        #[arg(long)]
        chart: Option<String>,
        /// Output file; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Serve charts over HTTP
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_app_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config))?;

    match cli.command {
        Command::Fetch { start, end } => fetch(&config, start, end).await,
        Command::Render { chart, output } => render(&config, chart, output).await,
        Command::Serve => serve(config).await,
    }
}

fn build_retriever(config: &AppConfig) -> anyhow::Result<Arc<dyn Retriever>> {
    let metric_count = config.cache.columns.len();
    let retriever: Arc<dyn Retriever> = match config.retriever.kind {
        RetrieverKind::Command => Arc::new(CommandRetriever::new(&config.retriever, metric_count)),
        RetrieverKind::Http => {
            let url = config
                .retriever
                .url
                .clone()
                .context("retriever.url is required for the http retriever")?;
            Arc::new(HttpRetriever::new(url, &config.retriever, metric_count))
        }
    };
    Ok(retriever)
}

async fn fetch(config: &AppConfig, start: NaiveDate, end: NaiveDate) -> anyhow::Result<()> {
    if end < start {
        bail!("--end {} is before --start {}", end, start);
    }

    let cache = AppendOnlyCache::new(&config.cache, config.retriever.artifact_dir.clone());
    let fetcher = SegmentedFetcher::new(build_retriever(config)?, cache, &config.fetch);

    let outcomes = fetcher
        .fetch_range(DateRange::new(start, end))
        .await
        .inspect_err(|e| tracing::error!("Fetch aborted: {}", e))?;

    let rows: usize = outcomes.iter().map(|o| o.rows).sum();
    tracing::info!(
        "Fetched {} segment(s), {} row(s) into {}",
        outcomes.len(),
        rows,
        fetcher.cache().path().display()
    );
    Ok(())
}

fn envelope_service(config: &AppConfig) -> anyhow::Result<EnvelopeService> {
    log_cache_summary(config);
    let resampler = GapAwareResampler::new(&config.resample).context("Invalid resample settings")?;
    Ok(EnvelopeService::new(
        Arc::new(CsvSeriesSource::new()),
        config.charts.clone(),
        resampler,
    ))
}

fn log_cache_summary(config: &AppConfig) {
    let cache = AppendOnlyCache::new(&config.cache, config.retriever.artifact_dir.clone());
    if !cache.path().exists() {
        return;
    }
    match cache.load() {
        Ok(rows) => tracing::info!(
            "Station cache {} holds {} row(s)",
            cache.path().display(),
            rows.len()
        ),
        Err(e) => tracing::warn!("Station cache {} unreadable: {}", cache.path().display(), e),
    }
}

async fn render(
    config: &AppConfig,
    chart: Option<String>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let service = envelope_service(config)?;

    let charts = match chart {
        Some(id) => {
            let chart = service
                .build_chart(&id)
                .await
                .with_context(|| format!("No chart named {}", id))?;
            vec![chart]
        }
        None => service.build_all().await,
    };

    let json = serde_json::to_string_pretty(&charts)?;
    match output {
        Some(path) => {
            tokio::fs::write(&path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {} chart(s) to {}", charts.len(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let envelope_service = envelope_service(&config)?;
    let streaming_service = StreamingChartService::new(envelope_service.clone());

    let state = Arc::new(AppState {
        envelope_service,
        streaming_service,
    });

    // Bodies are compressed by the handlers, so no CompressionLayer.
    let app = router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind))?;
    tracing::info!("Starting lake-telemetry service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
