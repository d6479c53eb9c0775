//! Command-line front end: resolves settings, builds the requested metric
//! and writes a JSON report of per-asset scores.

pub mod assets;
pub mod cli;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod settings;

use tracing::{info, warn};
use vq_runner::{MetricContext, MetricRegistry};
use vq_types::CancellationToken;

use cli::{CliArgs, CliSources};
use error::AppError;
use output::Report;

pub async fn run(cli: CliArgs, sources: CliSources) -> Result<(), AppError> {
    let registry = MetricRegistry::with_builtins();
    if cli.list_metrics {
        for id in registry.ids() {
            println!("{id}");
        }
        return Ok(());
    }

    let settings = settings::resolve_settings(&cli, &sources)?;
    if let Some(dir) = &settings.config_dir {
        info!(config_dir = %dir.display(), "loaded configuration");
    }
    let assets = assets::assets_from_cli(&cli)?;
    let context = MetricContext::with_external_extractors(settings.runner)?;
    let metric = registry.create(&settings.metric, &context, &settings.options)?;
    let executor_id = metric.executor_id().to_string();

    if cli.remove {
        for asset in &assets {
            metric.remove_artifacts(asset).await?;
        }
        info!(executor = %executor_id, assets = assets.len(), "removed artifacts");
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            signal_cancel.cancel();
        }
    });

    let bar = progress::asset_bar(assets.len() as u64);
    bar.set_prefix(settings.metric.clone());
    let scores_key = metric.scores_key();
    let mut report = Report::new(&settings.metric, &executor_id);
    let results = metric
        .run_all_with(&assets, &cancel, |asset, _| {
            bar.set_message(asset.identifier());
            bar.inc(1);
        })
        .await;
    bar.finish_and_clear();

    for (asset, result) in assets.iter().zip(results) {
        report.push(asset, &scores_key, result);
    }
    report.write(cli.output.as_deref())?;

    let failed = report.failed();
    if failed > 0 {
        return Err(AppError::AssetsFailed {
            failed,
            total: assets.len(),
        });
    }
    Ok(())
}
