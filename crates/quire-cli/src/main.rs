use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use quire_client::HaloClient;
use quire_core::{
    AppError, BatchResult, ContentItem, MetaFormat, SyncConfig, SyncService, TracingReporter,
    load_site_config,
};

mod config;

use config::{Command, Config, PublishOp, read_items};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install the tracing subscriber")?;

    let config = Config::parse();

    let site_file = load_site_config(config.config.clone())?;
    let site = config.site_config(site_file)?;
    let meta_format = site.meta_format();

    let client = HaloClient::new(&site).context("Failed to create Halo client")?;
    let mut sync_config = SyncConfig::default();
    if let Some(limit) = config.max_in_flight {
        sync_config = sync_config.with_max_in_flight(limit);
    }
    let service = SyncService::new(client, sync_config, meta_format);

    info!(site = site.base_url(), %meta_format, "Connected to Halo");

    let outcome = match config.command {
        Command::Publish { op, input } => publish(&service, op, &input, meta_format).await,
        Command::Adopt => adopt(&service).await,
    };

    if let Err(e) = &outcome {
        if let Some(app_error) = e.downcast_ref::<AppError>() {
            error!("{}", app_error.user_message());
        }
    }

    outcome
}

async fn publish(
    service: &SyncService<HaloClient>,
    op: PublishOp,
    input: &Path,
    meta_format: MetaFormat,
) -> anyhow::Result<()> {
    let mut items = if input == Path::new("-") {
        read_items(io::stdin().lock())?
    } else {
        let file = File::open(input)
            .with_context(|| format!("Failed to open {}", input.display()))?;
        read_items(BufReader::new(file))?
    };

    for item in &mut items {
        item.meta_format = meta_format;
    }

    info!(count = items.len(), ?op, "Publishing articles");

    let result = service
        .handle_with_progress(op.into_event(items), &TracingReporter)
        .await?;
    print_batch_summary(&result);

    Ok(())
}

async fn adopt(service: &SyncService<HaloClient>) -> anyhow::Result<()> {
    let items = service.fetch_all_published_items().await?;

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    write_jsonl(&mut writer, &items)?;
    writer.flush()?;

    if items.is_empty() {
        eprintln!("No published Markdown posts found.");
    } else {
        info!("Adoption complete: {} posts", items.len());
    }

    Ok(())
}

fn write_jsonl<W: Write>(writer: &mut W, items: &[ContentItem]) -> anyhow::Result<()> {
    for item in items {
        serde_json::to_writer(&mut *writer, item)?;
        writeln!(writer)?;
    }
    Ok(())
}

/// Print a summary of one batch.
fn print_batch_summary(result: &BatchResult) {
    info!("");
    info!("═══════════════════════════════════════════════════════");
    info!("Batch complete: {}", result.operation);
    info!("═══════════════════════════════════════════════════════");
    info!("  Dispatched:          {}", result.dispatched);
    info!("  Applied:             {}", result.succeeded_count());
    info!("  Skipped:             {}", result.skipped.len());
    if !result.skipped.is_empty() {
        info!("───────────────────────────────────────────────────────");
        info!("No remote post for:");
        for title in &result.skipped {
            info!("  - {}", title);
        }
    }
    info!("═══════════════════════════════════════════════════════");
}
