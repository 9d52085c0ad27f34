//! Report Builder
//!
//! Renders a validation run into a single PNG:
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ HiF spectrum @ 434.000 MHz               │
//! │ BW 2.000 MHz  gain 40.0 dB  n/N  device  │
//! │ dB ┌──────────────────────────┬───────┐  │
//! │    │ power spectrum           │ stats │  │
//! │    │ ─ ─ peak ─ ─ noise floor └───────┤  │
//! │    └──────────────────────────────────┘  │
//! │      f min        center        f max    │
//! │ ms ┌──────────────────────────────────┐  │
//! │    │ spectrogram (time ↓, freq →)     │  │
//! │    └──────────────────────────────────┘  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! Both panels share the frequency axis. Text uses the built-in mono fonts
//! of `embedded-graphics`, drawn straight into the `image` buffer. The
//! optional JSON sidecar carries the same numbers at full precision.

use std::convert::Infallible;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_9X15_BOLD};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyleBuilder, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use image::{ImageFormat, Rgb, RgbImage};
use serde::Serialize;

use sdrprobe_core::analysis::{PowerSpectrum, SpectralEstimate, Spectrogram, SummaryStats};
use sdrprobe_sim::CaptureResult;

/// Title and run line above the panels.
const HEADER: u32 = 48;
/// Room for the dB and time labels.
const LEFT: u32 = 64;
const RIGHT: u32 = 24;
/// Room for one row of axis labels under a panel.
const LABEL: u32 = 14;
const MIN_WIDTH: u32 = 320;
const MIN_HEIGHT: u32 = 240;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([0, 0, 0]);
const TRACE: Rgb<u8> = Rgb([31, 119, 180]);
const PEAK: Rgb<u8> = Rgb([214, 39, 40]);
const NOISE_FLOOR: Rgb<u8> = Rgb([127, 127, 127]);

/// Spectrogram color scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    #[default]
    Viridis,
    Magma,
    Inferno,
    Grayscale,
}

// Fourth-order fits of the matplotlib maps, one row per channel.
const VIRIDIS: [[f64; 5]; 3] = [
    [0.267, 0.329, 1.451, -1.808, 0.758],
    [0.004, 1.513, -0.838, 0.731, -0.466],
    [0.329, 1.442, -2.642, 1.963, -0.440],
];
const MAGMA: [[f64; 5]; 3] = [
    [0.001, 0.912, 1.287, -1.466, 0.532],
    [0.000, 0.188, 1.612, -1.681, 0.859],
    [0.014, 1.937, -2.578, 2.079, -0.570],
];
const INFERNO: [[f64; 5]; 3] = [
    [0.000, 1.132, 0.737, -0.972, 0.441],
    [0.000, 0.142, 1.746, -1.834, 0.926],
    [0.016, 1.980, -2.897, 2.182, -0.565],
];

fn channel_value(coeffs: &[f64; 5], t: f64) -> u8 {
    let v = coeffs.iter().rev().fold(0.0, |acc, c| acc * t + c);
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl Colormap {
    /// Color for a normalized value; input is clamped to `[0, 1]`.
    pub fn map(self, value: f64) -> Rgb<u8> {
        let t = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        let table = match self {
            Colormap::Viridis => &VIRIDIS,
            Colormap::Magma => &MAGMA,
            Colormap::Inferno => &INFERNO,
            Colormap::Grayscale => {
                let v = (t * 255.0).round() as u8;
                return Rgb([v, v, v]);
            }
        };
        Rgb([
            channel_value(&table[0], t),
            channel_value(&table[1], t),
            channel_value(&table[2], t),
        ])
    }
}

/// Image layout options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportConfig {
    pub width: u32,
    pub height: u32,
    pub colormap: Colormap,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 1000,
            colormap: Colormap::Viridis,
        }
    }
}

/// What was captured, for the report header and the sidecar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetadata {
    pub device: String,
    pub center_freq_mhz: f64,
    pub bandwidth_mhz: f64,
    pub gain_db: f64,
    pub channel: String,
    pub captured: usize,
    pub requested: usize,
}

#[derive(Serialize)]
struct Sidecar<'a> {
    metadata: &'a RunMetadata,
    capture: &'a CaptureResult,
    summary: &'a SummaryStats,
    peak_freq_mhz: Option<f64>,
    fft_size: usize,
    num_segments: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Panel {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl Panel {
    fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    fn height(&self) -> u32 {
        self.y1 - self.y0
    }
}

/// Spectrum and spectrogram panels for an image of this size.
fn layout(width: u32, height: u32) -> (Panel, Panel) {
    let split = HEADER + (height - HEADER) / 2;
    let top = Panel {
        x0: LEFT,
        y0: HEADER,
        x1: width - RIGHT,
        y1: split - LABEL - 4,
    };
    let bottom = Panel {
        x0: LEFT,
        y0: split + 4,
        x1: width - RIGHT,
        y1: height - LABEL - 8,
    };
    (top, bottom)
}

/// `embedded-graphics` view of an RGB image. Off-image pixels are dropped.
struct Canvas<'a>(&'a mut RgbImage);

impl OriginDimensions for Canvas<'_> {
    fn size(&self) -> Size {
        Size::new(self.0.width(), self.0.height())
    }
}

impl DrawTarget for Canvas<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (w, h) = self.0.dimensions();
        for Pixel(point, color) in pixels {
            if let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) {
                if x < w && y < h {
                    self.0.put_pixel(x, y, Rgb([color.r(), color.g(), color.b()]));
                }
            }
        }
        Ok(())
    }
}

fn rgb888(color: Rgb<u8>) -> Rgb888 {
    Rgb888::new(color[0], color[1], color[2])
}

fn text_width(s: &str, font: &MonoFont<'_>) -> i32 {
    let advance = font.character_size.width + font.character_spacing;
    (s.chars().count() as u32 * advance) as i32
}

/// Draw `s` with its top-left corner at `(x, y)`.
fn text(img: &mut RgbImage, s: &str, x: i32, y: i32, font: &'static MonoFont<'static>, color: Rgb<u8>) {
    let style = MonoTextStyle::new(font, rgb888(color));
    Text::with_baseline(s, Point::new(x, y), style, Baseline::Top)
        .draw(&mut Canvas(img))
        .ok();
}

/// Draw `s` so that it ends at `x`.
fn text_right(img: &mut RgbImage, s: &str, x: i32, y: i32, color: Rgb<u8>) {
    text(img, s, x - text_width(s, &FONT_6X10), y, &FONT_6X10, color);
}

fn hline(img: &mut RgbImage, y: u32, x0: u32, x1: u32, color: Rgb<u8>, dashed: bool) {
    for x in x0..x1 {
        if !dashed || (x / 6) % 2 == 0 {
            img.put_pixel(x, y, color);
        }
    }
}

fn vline(img: &mut RgbImage, x: u32, y0: u32, y1: u32, color: Rgb<u8>) {
    for y in y0..=y1 {
        img.put_pixel(x, y, color);
    }
}

fn frame(img: &mut RgbImage, panel: Panel) {
    hline(img, panel.y0, panel.x0, panel.x1 + 1, AXIS, false);
    hline(img, panel.y1, panel.x0, panel.x1 + 1, AXIS, false);
    vline(img, panel.x0, panel.y0, panel.y1, AXIS);
    vline(img, panel.x1, panel.y0, panel.y1, AXIS);
}

/// Vertical extent of the spectrum plot in dB.
fn db_limits(spectrum: &PowerSpectrum, summary: &SummaryStats) -> (f64, f64) {
    let min = spectrum.power_db.iter().copied().fold(f64::INFINITY, f64::min);
    (min - 5.0, summary.peak_db + 5.0)
}

fn draw_spectrum(img: &mut RgbImage, panel: Panel, spectrum: &PowerSpectrum, summary: &SummaryStats) {
    let db = &spectrum.power_db;
    if db.is_empty() {
        return;
    }

    let (lo, hi) = db_limits(spectrum, summary);
    let rows = panel.height() - 1;
    let to_y = |v: f64| {
        let frac = ((v - lo) / (hi - lo)).clamp(0.0, 1.0);
        panel.y1 - 1 - (frac * (rows - 1) as f64).round() as u32
    };

    hline(img, to_y(summary.noise_floor_db), panel.x0 + 1, panel.x1, NOISE_FLOOR, true);
    hline(img, to_y(summary.peak_db), panel.x0 + 1, panel.x1, PEAK, true);

    // peak-hold decimation onto pixel columns
    let n = db.len();
    let cols = panel.width() as usize - 1;
    let mut prev: Option<u32> = None;
    for c in 0..cols {
        let start = c * n / cols;
        let end = ((c + 1) * n / cols).clamp(start + 1, n);
        let v = db[start..end].iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let y = to_y(v);
        let (a, b) = match prev {
            Some(p) => (p.min(y), p.max(y)),
            None => (y, y),
        };
        vline(img, panel.x0 + 1 + c as u32, a, b, TRACE);
        prev = Some(y);
    }
}

fn draw_spectrogram(img: &mut RgbImage, panel: Panel, spectrogram: &Spectrogram, colormap: Colormap) {
    let Some((lo, hi)) = spectrogram.db_range() else {
        return;
    };
    let span = if hi > lo { hi - lo } else { 1.0 };
    let (nt, nf) = (spectrogram.num_times(), spectrogram.num_freqs());
    let (pw, ph) = (panel.width() - 1, panel.height() - 1);

    for py in 0..ph {
        let row = &spectrogram.power_db[py as usize * nt / ph as usize];
        for px in 0..pw {
            let v = row[px as usize * nf / pw as usize];
            img.put_pixel(panel.x0 + 1 + px, panel.y0 + 1 + py, colormap.map((v - lo) / span));
        }
    }
}

fn draw_header(img: &mut RgbImage, metadata: &RunMetadata) {
    let title = format!(
        "{} spectrum @ {:.3} MHz",
        metadata.channel, metadata.center_freq_mhz
    );
    text(img, &title, LEFT as i32, 6, &FONT_9X15_BOLD, AXIS);

    let run = format!(
        "BW {:.3} MHz   gain {:.1} dB   {}/{} samples   {}",
        metadata.bandwidth_mhz, metadata.gain_db, metadata.captured, metadata.requested, metadata.device
    );
    text(img, &run, LEFT as i32, 26, &FONT_6X10, AXIS);
}

/// Peak, noise floor and dynamic range in a box at the top right of `panel`.
fn draw_stats(img: &mut RgbImage, panel: Panel, estimate: &SpectralEstimate) {
    let summary = &estimate.summary;
    let mut lines = vec![format!("Peak  {:.1} dB", summary.peak_db)];
    if let Some(peak) = estimate.spectrum.peak() {
        lines.push(format!("  at  {:.3} MHz", peak.frequency / 1e6));
    }
    lines.push(format!("Floor {:.1} dB", summary.noise_floor_db));
    lines.push(format!("Range {:.1} dB", summary.dynamic_range_db));

    let line_height = FONT_6X10.character_size.height as i32 + 2;
    let inner = lines.iter().map(|l| text_width(l, &FONT_6X10)).max().unwrap_or(0);
    let (w, h) = (inner + 10, lines.len() as i32 * line_height + 8);
    let x = panel.x1 as i32 - 6 - w;
    let y = panel.y0 as i32 + 6;

    let style = PrimitiveStyleBuilder::new()
        .fill_color(rgb888(BACKGROUND))
        .stroke_color(rgb888(AXIS))
        .stroke_width(1)
        .build();
    Rectangle::new(Point::new(x, y), Size::new(w as u32, h as u32))
        .into_styled(style)
        .draw(&mut Canvas(&mut *img))
        .ok();

    for (i, line) in lines.iter().enumerate() {
        text(img, line, x + 5, y + 5 + i as i32 * line_height, &FONT_6X10, AXIS);
    }
}

/// Frequency extents and center under a panel.
fn draw_freq_labels(img: &mut RgbImage, panel: Panel, freq_mhz: &[f64]) {
    let (Some(first), Some(last)) = (freq_mhz.first(), freq_mhz.last()) else {
        return;
    };
    let y = panel.y1 as i32 + 3;
    text(img, &format!("{:.3}", first), panel.x0 as i32, y, &FONT_6X10, AXIS);
    let center = format!("{:.3} MHz", (first + last) / 2.0);
    let mid = (panel.x0 + panel.x1) as i32 / 2 - text_width(&center, &FONT_6X10) / 2;
    text(img, &center, mid, y, &FONT_6X10, AXIS);
    text_right(img, &format!("{:.3}", last), panel.x1 as i32, y, AXIS);
}

/// Labels the top and bottom of a panel's vertical axis.
fn draw_y_labels(img: &mut RgbImage, panel: Panel, top: &str, bottom: &str) {
    let x = panel.x0 as i32 - 4;
    text_right(img, top, x, panel.y0 as i32, AXIS);
    text_right(img, bottom, x, panel.y1 as i32 - 10, AXIS);
}

/// Draw the header, the spectrum and spectrogram panels, and their labels.
pub fn render(estimate: &SpectralEstimate, metadata: &RunMetadata, config: &ReportConfig) -> RgbImage {
    let width = config.width.max(MIN_WIDTH);
    let height = config.height.max(MIN_HEIGHT);
    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);
    let (top, bottom) = layout(width, height);

    draw_header(&mut img, metadata);

    let spectrum = &estimate.spectrum;
    draw_spectrum(&mut img, top, spectrum, &estimate.summary);
    frame(&mut img, top);
    if !spectrum.is_empty() {
        let (lo, hi) = db_limits(spectrum, &estimate.summary);
        draw_y_labels(&mut img, top, &format!("{:.0} dB", hi), &format!("{:.0} dB", lo));
        draw_freq_labels(&mut img, top, &spectrum.freq_mhz());
        draw_stats(&mut img, top, estimate);
    }

    let spectrogram = &estimate.spectrogram;
    draw_spectrogram(&mut img, bottom, spectrogram, config.colormap);
    frame(&mut img, bottom);
    if let (Some(first), Some(last)) = (spectrogram.time_ms.first(), spectrogram.time_ms.last()) {
        draw_y_labels(&mut img, bottom, &format!("{:.2} ms", first), &format!("{:.2} ms", last));
    }
    draw_freq_labels(&mut img, bottom, &spectrogram.freq_mhz);
    img
}

/// Render and save the PNG report.
pub fn write_report(
    path: &Path,
    estimate: &SpectralEstimate,
    metadata: &RunMetadata,
    config: &ReportConfig,
) -> Result<()> {
    let img = render(estimate, metadata, config);
    img.save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("saving spectrum image to {}", path.display()))?;
    tracing::debug!(width = img.width(), height = img.height(), "Report rendered");
    Ok(())
}

/// Write the JSON sidecar.
pub fn write_json(
    path: &Path,
    metadata: &RunMetadata,
    capture: &CaptureResult,
    estimate: &SpectralEstimate,
) -> Result<()> {
    let sidecar = Sidecar {
        metadata,
        capture,
        summary: &estimate.summary,
        peak_freq_mhz: estimate.spectrum.peak().map(|p| p.frequency / 1e6),
        fft_size: estimate.spectrum.fft_size,
        num_segments: estimate.spectrum.num_segments,
    };
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &sidecar)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sdrprobe_core::analysis::estimate;
    use sdrprobe_core::types::complex_ops::cis;
    use sdrprobe_sim::CaptureStatus;

    fn tone_estimate() -> SpectralEstimate {
        let samples: Vec<_> = (0..16_384).map(|i| cis(250e3, i, 2e6)).collect();
        estimate(&samples, samples.len(), 2e6, 100e6).unwrap()
    }

    fn metadata() -> RunMetadata {
        RunMetadata {
            device: "simulator://seed=1".into(),
            center_freq_mhz: 100.0,
            bandwidth_mhz: 2.0,
            gain_db: 50.0,
            channel: "HiF".into(),
            captured: 16_384,
            requested: 16_384,
        }
    }

    #[test]
    fn test_colormap_endpoints() {
        assert_eq!(Colormap::Grayscale.map(0.0), Rgb([0, 0, 0]));
        assert_eq!(Colormap::Grayscale.map(1.0), Rgb([255, 255, 255]));
        assert_eq!(Colormap::Grayscale.map(7.0), Rgb([255, 255, 255]));
        // viridis runs from dark purple to yellow
        let low = Colormap::Viridis.map(0.0);
        let high = Colormap::Viridis.map(1.0);
        assert!(low.0[2] > low.0[1], "viridis starts blue-ish: {:?}", low);
        assert!(high.0[0] > 200 && high.0[1] > 200, "viridis ends yellow: {:?}", high);
        assert_eq!(Colormap::Magma.map(f64::NAN), Colormap::Magma.map(0.0));
    }

    #[test]
    fn test_render_draws_both_panels() {
        let config = ReportConfig {
            width: 400,
            height: 300,
            colormap: Colormap::Viridis,
        };
        let img = render(&tone_estimate(), &metadata(), &config);
        assert_eq!(img.dimensions(), (400, 300));

        let trace_pixels = img.pixels().filter(|p| **p == TRACE).count();
        assert!(trace_pixels > 100, "spectrum trace missing");
        assert!(img.pixels().any(|p| *p == PEAK));

        // spectrogram interior is painted
        let (_, bottom) = layout(400, 300);
        let center = *img.get_pixel((bottom.x0 + bottom.x1) / 2, (bottom.y0 + bottom.y1) / 2);
        assert_ne!(center, BACKGROUND);
    }

    fn header_rows(img: &RgbImage) -> Vec<Rgb<u8>> {
        (0..HEADER)
            .flat_map(|y| (0..img.width()).map(move |x| (x, y)))
            .map(|(x, y)| *img.get_pixel(x, y))
            .collect()
    }

    #[test]
    fn test_header_shows_run_metadata() {
        let est = tone_estimate();
        let config = ReportConfig {
            width: 600,
            height: 400,
            ..Default::default()
        };
        let a = render(&est, &metadata(), &config);
        let b = render(
            &est,
            &RunMetadata {
                center_freq_mhz: 433.92,
                gain_db: 20.0,
                ..metadata()
            },
            &config,
        );

        let header = header_rows(&a);
        assert!(header.iter().filter(|p| **p == AXIS).count() > 200, "header text missing");
        assert_ne!(header, header_rows(&b));

        // everything below the header comes from the estimate only
        let (top, _) = layout(600, 400);
        for y in top.y0..400 {
            for x in 0..600 {
                assert_eq!(a.get_pixel(x, y), b.get_pixel(x, y), "({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_stats_and_axis_labels_are_drawn() {
        let config = ReportConfig {
            width: 600,
            height: 400,
            ..Default::default()
        };
        let img = render(&tone_estimate(), &metadata(), &config);
        let (top, bottom) = layout(600, 400);

        let dark = |x0: u32, y0: u32, x1: u32, y1: u32| {
            (y0..y1)
                .flat_map(|y| (x0..x1).map(move |x| (x, y)))
                .filter(|&(x, y)| *img.get_pixel(x, y) == AXIS)
                .count()
        };
        // dB and time labels left of the panels
        assert!(dark(0, top.y0, top.x0 - 2, top.y1) > 20);
        assert!(dark(0, bottom.y0, bottom.x0 - 2, bottom.y1) > 20);
        // frequency labels under both panels
        assert!(dark(top.x0, top.y1 + 2, top.x1, top.y1 + LABEL) > 20);
        assert!(dark(bottom.x0, bottom.y1 + 2, bottom.x1, 400) > 20);
        // stats box in the upper right of the spectrum
        let stats = dark(top.x1 - 100, top.y0 + 2, top.x1 - 2, top.y0 + 40);
        assert!(stats > 50, "stats box missing: {}", stats);
    }

    #[test]
    fn test_render_clamps_tiny_sizes() {
        let config = ReportConfig {
            width: 1,
            height: 1,
            ..Default::default()
        };
        let img = render(&tone_estimate(), &metadata(), &config);
        assert_eq!(img.dimensions(), (MIN_WIDTH, MIN_HEIGHT));
    }

    #[test]
    fn test_write_report_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spectrum.png");
        write_report(&path, &tone_estimate(), &metadata(), &ReportConfig::default()).unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (1200, 1000));
    }

    #[test]
    fn test_write_report_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("spectrum.png");
        let err =
            write_report(&path, &tone_estimate(), &metadata(), &ReportConfig::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("spectrum.png"));
    }

    #[test]
    fn test_json_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let capture = CaptureResult {
            filled: 16_384,
            requested: 16_384,
            status: CaptureStatus::Complete,
            timeouts: 0,
            error: None,
        };
        let est = tone_estimate();
        write_json(&path, &metadata(), &capture, &est).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["metadata"]["channel"], "HiF");
        assert_eq!(json["capture"]["status"], "complete");
        assert_eq!(json["fft_size"], 4096);
        assert_relative_eq!(
            json["peak_freq_mhz"].as_f64().unwrap(),
            100.25,
            epsilon = est.spectrum.resolution() / 1e6
        );
        assert!(json["summary"]["dynamic_range_db"].as_f64().unwrap() > 0.0);
    }
}
