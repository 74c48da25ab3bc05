//! Rasterized population surfaces and their conversion to weighted points

use geo::{Contains, MultiPolygon, Point};
use log::{debug, warn};

use super::population::{WeightedPoint, WeightedPointSet};
use crate::Error;

/// Nodata marker used by `WorldPop` rasters when the file declares none
pub const DEFAULT_NODATA: f64 = -99999.0;

/// North-up affine transform from pixel space to projected coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// X coordinate of the top-left corner of the top-left pixel
    pub origin_x: f64,
    pub pixel_width: f64,
    /// Y coordinate of the top-left corner of the top-left pixel
    pub origin_y: f64,
    /// Usually negative for north-up rasters
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, pixel_width: f64, origin_y: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            origin_y,
            pixel_height,
        }
    }

    /// Coordinates of the centre of the pixel at (`row`, `col`)
    #[allow(clippy::cast_precision_loss)]
    pub fn pixel_center(&self, row: usize, col: usize) -> Point<f64> {
        Point::new(
            self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            self.origin_y + (row as f64 + 0.5) * self.pixel_height,
        )
    }
}

/// Single-band population raster held in row-major order
#[derive(Debug, Clone)]
pub struct PopulationRaster {
    width: usize,
    height: usize,
    transform: GeoTransform,
    nodata: f64,
    values: Vec<f64>,
}

impl PopulationRaster {
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] when the value buffer does not match the
    /// raster dimensions or the pixel size is zero or non-finite.
    pub fn new(
        width: usize,
        height: usize,
        transform: GeoTransform,
        nodata: Option<f64>,
        values: Vec<f64>,
    ) -> Result<Self, Error> {
        if values.len() != width * height {
            return Err(Error::InvalidData(format!(
                "raster of {width}x{height} needs {} values, got {}",
                width * height,
                values.len()
            )));
        }
        let pixel_ok = |v: f64| v.is_finite() && v != 0.0;
        if !pixel_ok(transform.pixel_width) || !pixel_ok(transform.pixel_height) {
            return Err(Error::InvalidData(format!(
                "invalid pixel size {}x{}",
                transform.pixel_width, transform.pixel_height
            )));
        }

        Ok(Self {
            width,
            height,
            transform,
            nodata: nodata.unwrap_or(DEFAULT_NODATA),
            values,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn transform(&self) -> GeoTransform {
        self.transform
    }

    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.values.get(row * self.width + col).copied()
    }

    fn is_populated(&self, value: f64) -> bool {
        value.is_finite() && value != self.nodata && value > 0.0
    }

    /// Vectorize the raster into pixel-centre points carrying the cell value.
    ///
    /// Cells that are nodata, non-finite or not strictly positive are dropped.
    /// With a `mask`, only cells whose centre lies inside it are kept.
    ///
    /// # Errors
    ///
    /// Propagates validation errors from [`WeightedPointSet::new`].
    pub fn to_weighted_points(
        &self,
        mask: Option<&MultiPolygon<f64>>,
    ) -> Result<WeightedPointSet, Error> {
        let mut points = Vec::new();
        let mut masked_out = 0usize;

        for row in 0..self.height {
            for col in 0..self.width {
                let value = self.values[row * self.width + col];
                if !self.is_populated(value) {
                    continue;
                }
                let center = self.transform.pixel_center(row, col);
                if let Some(area) = mask {
                    if !area.contains(&center) {
                        masked_out += 1;
                        continue;
                    }
                }
                points.push(WeightedPoint {
                    location: center,
                    weight: value,
                });
            }
        }

        debug!(
            "Vectorized {}x{} raster into {} population points ({masked_out} outside mask)",
            self.width,
            self.height,
            points.len()
        );
        if points.is_empty() {
            warn!("No population found in the raster area");
        }

        WeightedPointSet::new(points)
    }
}
