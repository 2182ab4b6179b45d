//! Feeds synthetic packets into a pipeline on a fixed cadence and logs what a
//! renderer would receive.
//!
//! Usage: cargo run --example live_traffic -- [ticks] [config.json]

use std::time::Duration;

use chrono::Utc;
use eyre::{Result, WrapErr};
use rand::Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;
use traffic_chart::data_types::{IngestOptions, PipelineConfig, RawRecord};
use traffic_chart::SharedPipeline;

const TICK: Duration = Duration::from_secs(2);

fn seed_packets() -> Vec<RawRecord> {
    let now = Utc::now().timestamp_millis();
    [150, 200, 90, 260, 130]
        .iter()
        .enumerate()
        .map(|(i, &size)| {
            RawRecord::new(now - 60_000 * (4 - i as i64), size).with_flow(
                format!("192.168.0.{}", i + 1),
                format!("192.168.0.{}", (i + 1) % 5 + 1),
            )
        })
        .collect()
}

fn random_packet(rng: &mut impl Rng) -> RawRecord {
    RawRecord::new(Utc::now().timestamp_millis(), rng.random_range(40..440)).with_flow(
        format!("192.168.0.{}", rng.random_range(1..=10)),
        format!("192.168.0.{}", rng.random_range(1..=10)),
    )
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let ticks: usize = match args.next() {
        Some(t) => t.parse().wrap_err("ticks must be a number")?,
        None => 10,
    };
    let config = match args.next() {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    let pipeline = SharedPipeline::new(config)?;
    let update = pipeline.ingest(&seed_packets(), IngestOptions::raw());
    info!(entering = update.diff.entering.len(), "initial render");

    let mut rng = rand::rng();
    for tick in 0..ticks {
        std::thread::sleep(TICK);
        let update = pipeline.ingest(&[random_packet(&mut rng)], IngestOptions::raw());
        info!(
            tick,
            entering = update.diff.entering.len(),
            updating = update.diff.updating.len(),
            exiting = update.diff.exiting.len(),
            value_max = update.domain.value_max,
            "tick"
        );
        if let Some(detail) = pipeline.detail_at(Utc::now()) {
            info!(hover = %detail.list_entry(), "latest packet");
        }
    }

    let snapshot = serde_json::to_string_pretty(&pipeline.snapshot())?;
    println!("{snapshot}");
    Ok(())
}
