//! Writes the final display state to image files.
use miette::IntoDiagnostic;
use plotters::prelude::*;
use spectrum_core::{
    FrequencyAxis,
    waterfall::{ColorMapper, WaterfallRingBuffer},
};
use std::path::Path;
use tracing::{info, instrument, warn};

const SPECTRUM_PLOT_SIZE: (u32, u32) = (1024, 320);

/// Writes the displayed waterfall rows to a PNG, newest row at the top.
///
/// Rows that have not been written yet are left black.
#[instrument(skip_all, fields(path = %path.display()))]
pub(crate) fn write_waterfall(waterfall: &WaterfallRingBuffer, path: &Path) -> miette::Result<()> {
    if !waterfall.is_allocated() {
        warn!("Waterfall is unallocated, nothing to write");
        return Ok(());
    }
    let size = (
        u32::try_from(waterfall.width()).into_diagnostic()?,
        u32::try_from(waterfall.height()).into_diagnostic()?,
    );

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&BLACK).into_diagnostic()?;
    for (y, row) in waterfall.rows_newest_first().enumerate() {
        for (x, &pixel) in row.iter().enumerate() {
            let (r, g, b) = ColorMapper::rgb(pixel);
            root.draw_pixel((x as i32, y as i32), &RGBColor(r, g, b))
                .into_diagnostic()?;
        }
    }
    root.present().into_diagnostic()?;

    info!(
        "Waterfall of {} rows written",
        waterfall.segments().len()
    );
    Ok(())
}

/// Plots the normalized spectrum row against frequency as an SVG line plot.
#[instrument(skip_all, fields(path = %path.display()))]
pub(crate) fn write_spectrum(
    spectrum: &[f64],
    axis: &FrequencyAxis,
    path: &Path,
) -> miette::Result<()> {
    if spectrum.is_empty() {
        warn!("Spectrum row is empty, nothing to write");
        return Ok(());
    }

    let root = SVGBackend::new(path, SPECTRUM_PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE).into_diagnostic()?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(axis.start..axis.end, 0.0..1.0)
        .into_diagnostic()?;
    chart
        .draw_series(LineSeries::new(
            spectrum.iter().enumerate().map(|(index, &power)| {
                (
                    axis.frequency_at(index, spectrum.len()),
                    power.clamp(0.0, 1.0),
                )
            }),
            &BLUE,
        ))
        .into_diagnostic()?;
    root.present().into_diagnostic()?;

    info!("Spectrum of {} points written", spectrum.len());
    Ok(())
}
