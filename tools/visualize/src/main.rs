//! Selection plot: every parcel light grey, selected parcels green, black
//! outlines, written as a PNG.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use carbon_core::geojson::{load_parcels, PropertyNames};
use clap::Parser;
use geo::{BoundingRect, Coord, LineString, Polygon, Rect};
use image::{Rgb, RgbImage};

const BACKGROUND: [u8; 3] = [255, 255, 255];
const UNSELECTED: [u8; 3] = [211, 211, 211]; // light grey
const SELECTED: [u8; 3] = [0, 128, 0]; // green
const OUTLINE: [u8; 3] = [0, 0, 0];
const MARGIN_PX: f64 = 10.0;

#[derive(Parser, Debug)]
#[command(name = "visualize", about = "Plot parcels with the selected ones highlighted")]
struct Args {
    /// GeoJSON parcels, the same file given to `select`.
    #[arg(short, long)]
    input: PathBuf,

    /// Selection JSON written by `select`.
    #[arg(short, long, default_value = "selection.json")]
    selection: PathBuf,

    /// Output PNG.
    #[arg(short, long, default_value = "selected_polygons_plot.png")]
    output: PathBuf,

    /// Longest image side in pixels.
    #[arg(long, default_value = "1000")]
    size: u32,

    #[arg(long, default_value = "carbon_sto")]
    carbon_field: String,

    #[arg(long, default_value = "cost")]
    cost_field: String,
}

// ── Projection to pixels ──────────────────────────────────────────────────────

/// Maps projected metres onto image pixels, y pointing down.
struct Viewport {
    bounds: Rect<f64>,
    scale: f64,
    width: u32,
    height: u32,
}

impl Viewport {
    fn fit(bounds: Rect<f64>, size: u32) -> Self {
        let span = bounds.width().max(bounds.height()).max(f64::EPSILON);
        let scale = (size as f64 - 2.0 * MARGIN_PX) / span;
        let width = (bounds.width() * scale + 2.0 * MARGIN_PX).ceil() as u32;
        let height = (bounds.height() * scale + 2.0 * MARGIN_PX).ceil() as u32;
        Self { bounds, scale, width: width.max(1), height: height.max(1) }
    }

    fn to_px(&self, c: Coord<f64>) -> (f64, f64) {
        let x = (c.x - self.bounds.min().x) * self.scale + MARGIN_PX;
        let y = (self.bounds.max().y - c.y) * self.scale + MARGIN_PX;
        (x, y)
    }
}

// ── Rasterisation ─────────────────────────────────────────────────────────────

fn rings(polygon: &Polygon<f64>) -> impl Iterator<Item = &LineString<f64>> {
    std::iter::once(polygon.exterior()).chain(polygon.interiors())
}

/// Even-odd scanline fill, sampling at pixel centres.
fn fill(img: &mut RgbImage, view: &Viewport, polygon: &Polygon<f64>, color: [u8; 3]) {
    let edges: Vec<((f64, f64), (f64, f64))> = rings(polygon)
        .flat_map(|ring| ring.lines())
        .map(|l| (view.to_px(l.start), view.to_px(l.end)))
        .collect();

    for row in 0..img.height() {
        let yc = row as f64 + 0.5;
        let mut xs: Vec<f64> = edges
            .iter()
            .filter(|((_, y0), (_, y1))| (*y0 <= yc) != (*y1 <= yc))
            .map(|((x0, y0), (x1, y1))| x0 + (yc - y0) / (y1 - y0) * (x1 - x0))
            .collect();
        xs.sort_by(f64::total_cmp);
        for span in xs.chunks_exact(2) {
            let start = (span[0] - 0.5).ceil().max(0.0) as u32;
            let end = ((span[1] - 0.5).floor() as i64).min(img.width() as i64 - 1);
            for col in start as i64..=end {
                img.put_pixel(col as u32, row, Rgb(color));
            }
        }
    }
}

/// Bresenham outline of every ring.
fn stroke(img: &mut RgbImage, view: &Viewport, polygon: &Polygon<f64>, color: [u8; 3]) {
    for line in rings(polygon).flat_map(|ring| ring.lines()) {
        let (x0, y0) = view.to_px(line.start);
        let (x1, y1) = view.to_px(line.end);
        let (mut x, mut y) = (x0.floor() as i64, y0.floor() as i64);
        let (xe, ye) = (x1.floor() as i64, y1.floor() as i64);
        let dx = (xe - x).abs();
        let dy = -(ye - y).abs();
        let sx = if x < xe { 1 } else { -1 };
        let sy = if y < ye { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
                img.put_pixel(x as u32, y as u32, Rgb(color));
            }
            if x == xe && y == ye {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}

fn read_source_indices(path: &Path) -> Result<HashSet<usize>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let report: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    let Some(indices) = report.get("source_indices").and_then(|v| v.as_array()) else {
        bail!("{} has no source_indices array", path.display());
    };
    indices
        .iter()
        .map(|v| {
            v.as_u64()
                .map(|i| i as usize)
                .with_context(|| format!("bad source index {v} in {}", path.display()))
        })
        .collect()
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();

    let names = PropertyNames { carbon: args.carbon_field.clone(), cost: args.cost_field.clone() };
    let parcels = load_parcels(&args.input, &names)
        .with_context(|| format!("loading parcels from {}", args.input.display()))?;
    let selected = read_source_indices(&args.selection)?;

    let Some(bounds) = parcels
        .iter()
        .filter_map(|p| p.geometry.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                Coord { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                Coord { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
            )
        })
    else {
        bail!("{} contains no parcels to plot", args.input.display());
    };

    let view = Viewport::fit(bounds, args.size);
    println!("Rendering {} parcels ({} selected) at {}×{}…", parcels.len(), selected.len(), view.width, view.height);

    let mut img = RgbImage::from_pixel(view.width, view.height, Rgb(BACKGROUND));
    for p in &parcels {
        let color = if selected.contains(&p.source_index) { SELECTED } else { UNSELECTED };
        fill(&mut img, &view, &p.geometry, color);
    }
    for p in &parcels {
        stroke(&mut img, &view, &p.geometry, OUTLINE);
    }

    img.save(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!("Wrote {}", args.output.display());
    Ok(())
}
