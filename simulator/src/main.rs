//! # Spectrum Simulator
//!
//! Runs the spectrum pipeline headless:
//! * Synthesizes frames from the configured noise floor and signals at the configured rate.
//! * Feeds every frame through the display stage into a waterfall of the requested size.
//! * Runs until interrupted, until `--run-for-ms` has elapsed or until a finite schedule ends.
//! * Writes the final waterfall to a PNG and the final spectrum to an SVG.
//!
mod export;

use clap::Parser;
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use miette::IntoDiagnostic;
use spectrum_core::{
    DataProvider, POINTS, PipelineConfig, SpectrumDisplay,
    metrics::names::{FPS, FRAME_TIME, FRAMES_DISPLAYED, FRAMES_DROPPED, FRAMES_GENERATED, FREEZES},
    waterfall::ColorMapper,
};
use std::{future, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use tokio::{
    select,
    signal::unix::{SignalKind, signal},
    time::sleep,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// [clap] derived struct to handle command line parameters.
#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Path to the JSON pipeline configuration, the built-in configuration is used if omitted
    #[clap(long)]
    config: Option<PathBuf>,

    /// Logical width of the waterfall
    #[clap(long, default_value = "800")]
    width: f64,

    /// Logical height of the waterfall
    #[clap(long, default_value = "400")]
    height: f64,

    /// Display scaling, the waterfall is `width * scaling` by `height * scaling` pixels
    #[clap(long, default_value = "1.0")]
    scaling: f64,

    /// Number of points in the spectrum plot
    #[clap(long, default_value = "1024")]
    spectrum_width: usize,

    /// Overrides the update rate of the configuration
    #[clap(long)]
    update_rate_hz: Option<u32>,

    /// Stops after this many milliseconds.
    /// If omitted, runs until interrupted or until every signal schedule has ended.
    #[clap(long)]
    run_for_ms: Option<u64>,

    /// File the final waterfall is written to
    #[clap(long, default_value = "waterfall.png")]
    waterfall_output: PathBuf,

    /// File the final spectrum plot is written to
    #[clap(long, default_value = "spectrum.svg")]
    spectrum_output: PathBuf,

    /// If set, OpenMetrics flavour metrics are available on this endpoint
    #[clap(long, env)]
    observability_address: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Some(observability_address) = args.observability_address {
        // Install exporter and register metrics
        PrometheusBuilder::new()
            .with_http_listener(observability_address)
            .install()
            .into_diagnostic()?;
        describe_metrics();
    }

    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path).into_diagnostic()?,
        None => PipelineConfig::default(),
    };
    if let Some(update_rate_hz) = args.update_rate_hz {
        config.update_rate_hz = update_rate_hz;
        config.validate().into_diagnostic()?;
    }

    let generator = config.build_generator::<POINTS>().into_diagnostic()?;
    let period = config.tick_period().into_diagnostic()?;

    let mut display = SpectrumDisplay::<POINTS>::new(
        config.normalizer().into_diagnostic()?,
        Arc::new(ColorMapper::new()),
    );
    if !display.resize_logical(args.width, args.height, args.scaling) {
        warn!("Waterfall size is empty, no rows will be written");
    }
    display.set_spectrum_width(args.spectrum_width);

    //  A finite schedule ends the run by closing the frame channel
    let run_time = args.run_for_ms.map(Duration::from_millis);

    // Is used to await any sigint signals
    let mut sigint = signal(SignalKind::interrupt()).into_diagnostic()?;

    let (mut provider, frames) = DataProvider::new(generator, period);
    provider.start().await.into_diagnostic()?;
    info!(
        "Running {} signals at {} Hz",
        config.signals.len(),
        config.update_rate_hz
    );

    let display = display
        .run(frames, async move {
            select! {
                _ = sigint.recv() => info!("Interrupted"),
                _ = run_until(run_time) => info!("Run time elapsed"),
            }
        })
        .await;
    provider.stop().await.into_diagnostic()?;

    let snapshot = display.frame_metrics();
    info!(
        "Final FPS: {:.1} | FrameTime avg/min/max: {:.2}/{:.2}/{:.2} ms | Freezes: {}",
        snapshot.current_fps,
        snapshot.avg_frame_time_ms,
        snapshot.min_frame_time_ms,
        snapshot.max_frame_time_ms,
        snapshot.freeze_count
    );

    export::write_waterfall(display.waterfall(), &args.waterfall_output)?;
    export::write_spectrum(
        display.spectrum_row(),
        &config.frequency_axis,
        &args.spectrum_output,
    )?;
    Ok(())
}

async fn run_until(run_time: Option<Duration>) {
    match run_time {
        Some(run_time) => sleep(run_time).await,
        None => future::pending().await,
    }
}

fn describe_metrics() {
    describe_counter!(
        FRAMES_GENERATED,
        metrics::Unit::Count,
        "Number of frames generated"
    );
    describe_counter!(
        FRAMES_DROPPED,
        metrics::Unit::Count,
        "Number of frames replaced before the display took them"
    );
    describe_counter!(
        FRAMES_DISPLAYED,
        metrics::Unit::Count,
        "Number of frames processed by the display"
    );
    describe_gauge!(FPS, "Frames displayed in the last second");
    describe_histogram!(
        FRAME_TIME,
        metrics::Unit::Milliseconds,
        "Time between consecutive displayed frames"
    );
    describe_counter!(
        FREEZES,
        metrics::Unit::Count,
        "Number of frame intervals of 100 ms or more"
    );
}
