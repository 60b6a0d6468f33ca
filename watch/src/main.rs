//! Terminal breed dashboard: fetch once at startup, then again on a fixed
//! interval, printing the current list and its stats after every cycle.

use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use breed_core::{repository_for, ApiError, BreedRecord, BreedRepository, Config, Dashboard, DashboardStats};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    info!(
        integration = ?config.integration,
        base_url = %config.active_profile().base_url,
        workflow_id = %config.workflow_id,
        refresh_secs = config.refresh_secs,
        "starting breed watch"
    );

    let mut dashboard = Dashboard::new(repository_for(&config), config.workflow_id.clone(), config.limit);
    let interval = Duration::from_secs(config.refresh_secs);
    loop {
        cycle(&mut dashboard);
        thread::sleep(interval);
    }
}

fn cycle<R: BreedRepository>(dashboard: &mut Dashboard<R>) {
    match dashboard.refresh() {
        Ok(records) => render(records),
        Err(err) => {
            // The previous list stays on screen; the next tick is the retry.
            match err {
                ApiError::NetworkUnavailable { url, .. } => {
                    error!(%url, error = %err, "upstream unreachable");
                }
                ApiError::RequestFailed { status, .. } => {
                    error!(status, error = %err, "upstream rejected the request");
                }
                _ => error!(error = %err, "could not refresh breeds"),
            }
            return;
        }
    }
    render_stats(&dashboard.stats());
}

fn render(records: &[BreedRecord]) {
    if records.is_empty() {
        println!("No dog breeds found. Make sure the workflow has run successfully.");
        return;
    }
    for record in records {
        println!(
            "{:<28} {:<14} {:<10} {}",
            record.breed_name,
            record.life_span.as_deref().unwrap_or("N/A"),
            record.state.as_deref().unwrap_or("-"),
            record.start_date.as_deref().unwrap_or("-"),
        );
        if let Some(description) = &record.description {
            println!("    {description}");
        }
    }
}

fn render_stats(stats: &DashboardStats) {
    println!(
        "total: {}  successful: {}  skipped: {}  last updated: {}",
        stats.total,
        stats.successful,
        stats.skipped,
        stats.last_updated.as_deref().unwrap_or("never"),
    );
}
