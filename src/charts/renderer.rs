//! Static Map Renderer
//! Draws a state map as an in-memory RGB image.
//!
//! Layout:
//! 1. Title: "STATE {n}, {year}" centered
//! 2. Longitude/latitude frame sized to the accident points
//! 3. Boundary outlines (optional), then one dot per accident

use crate::charts::StateMap;
use crate::config::MapConfig;
use crate::data::{DatasetLoader, LoaderError};
use image::{ImageError, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

const OUTLINE: RGBColor = RGBColor(90, 90, 90);
const POINT: RGBColor = RGBColor(52, 152, 219);

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    LoaderError(#[from] LoaderError),
    #[error("Polars error: {0}")]
    PolarsError(#[from] polars::prelude::PolarsError),
    #[error("Failed to draw map: {0}")]
    PlotError(String),
    #[error("Failed to write image: {0}")]
    ImageError(#[from] ImageError),
    #[error("Image buffer does not match {0}x{1}")]
    BufferError(u32, u32),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        RenderError::PlotError(e.to_string())
    }
}

/// Boundary outlines drawn under the accident points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Boundaries {
    pub lines: Vec<Vec<(f64, f64)>>,
}

impl Boundaries {
    /// Read outlines from a CSV with `group,longitude,latitude` columns.
    ///
    /// Rows sharing a `group` form one polyline, in file order.
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let df = DatasetLoader::read(path)?;

        let groups = df
            .column("group")?
            .cast(&polars::prelude::DataType::String)?;
        let lon = df
            .column("longitude")?
            .cast(&polars::prelude::DataType::Float64)?;
        let lat = df
            .column("latitude")?
            .cast(&polars::prelude::DataType::Float64)?;

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut lines: Vec<Vec<(f64, f64)>> = Vec::new();

        for ((group, x), y) in groups
            .str()?
            .into_iter()
            .zip(lon.f64()?.into_iter())
            .zip(lat.f64()?.into_iter())
        {
            let (Some(group), Some(x), Some(y)) = (group, x, y) else {
                continue;
            };
            let i = *index.entry(group.to_string()).or_insert_with(|| {
                lines.push(Vec::new());
                lines.len() - 1
            });
            lines[i].push((x, y));
        }

        debug!(path = %path.display(), lines = lines.len(), "loaded boundaries");
        Ok(Self { lines })
    }
}

pub struct StaticMapRenderer;

impl StaticMapRenderer {
    /// Render a map using the boundary file named in `config`, if any.
    pub fn render(map: &StateMap, config: &MapConfig) -> Result<RgbImage, RenderError> {
        let boundaries = match &config.boundaries {
            Some(path) => Boundaries::load(path)?,
            None => Boundaries::default(),
        };
        Self::render_with(map, &boundaries, config)
    }

    pub fn render_with(
        map: &StateMap,
        boundaries: &Boundaries,
        config: &MapConfig,
    ) -> Result<RgbImage, RenderError> {
        let (width, height) = (config.width, config.height);
        let mut buf = vec![0u8; width as usize * height as usize * 3];

        {
            let root = BitMapBackend::with_buffer(&mut buf[..], (width, height)).into_drawing_area();
            Self::draw(&root, map, boundaries, config)?;
            root.present()?;
        }

        RgbImage::from_raw(width, height, buf).ok_or(RenderError::BufferError(width, height))
    }

    /// Render and write a PNG (format taken from the extension).
    pub fn save_png(map: &StateMap, config: &MapConfig, path: &Path) -> Result<(), RenderError> {
        let img = Self::render(map, config)?;
        img.save(path)?;
        Ok(())
    }

    fn draw<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        map: &StateMap,
        boundaries: &Boundaries,
        config: &MapConfig,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        root.fill(&WHITE)?;

        let (x_range, y_range) = map.padded_ranges(config.padding);

        let mut chart = ChartBuilder::on(root)
            .caption(
                format!("STATE {}, {}", map.state(), map.year()),
                ("sans-serif", 20),
            )
            .margin(15)
            .x_label_area_size(35)
            .y_label_area_size(50)
            .build_cartesian_2d(x_range, y_range)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("Longitude")
            .y_desc("Latitude")
            .draw()?;

        chart.draw_series(
            boundaries
                .lines
                .iter()
                .map(|line| PathElement::new(line.clone(), OUTLINE.stroke_width(1))),
        )?;

        let radius = config.point_radius as i32;
        chart.draw_series(
            map.points()
                .iter()
                .map(|&(x, y)| Circle::new((x, y), radius, POINT.filled())),
        )?;

        Ok(())
    }
}
