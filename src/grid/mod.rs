//! Coordinate grids the model is evaluated on.
//!
//! The image-synthesis pipeline only talks to a [`GridProvider`]; [`PixelGrid`] is a regular,
//! centered grid implementing it.

use crate::error::ConfigurationError;
use crate::params::ModelClass;

use ndarray::{Array1, Array2};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Pixel-center coordinates along both axes of a regular 2D grid
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelAxes {
    pub x: Array1<f64>,
    pub y: Array1<f64>,
}

impl PixelAxes {
    pub fn new(x: Array1<f64>, y: Array1<f64>) -> Self {
        Self { x, y }
    }

    /// Grid shape as `(num_y, num_x)`
    pub fn shape(&self) -> (usize, usize) {
        (self.y.len(), self.x.len())
    }

    pub fn num_pixels(&self) -> usize {
        self.x.len() * self.y.len()
    }

    /// Both coordinate arrays, row-major flattened
    pub fn flat_coordinates(&self) -> (Array1<f64>, Array1<f64>) {
        let (ny, nx) = self.shape();
        let x = Array1::from_shape_fn(ny * nx, |k| self.x[k % nx]);
        let y = Array1::from_shape_fn(ny * nx, |k| self.y[k / nx]);
        (x, y)
    }
}

/// How a model grid for a pixelated profile is derived from the data grid
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PixelGridSettings {
    /// Model pixel width in units of the data pixel width
    pub pixel_scale_factor: f64,
    /// Explicit `(num_x, num_y)`; otherwise the data grid extent is conserved
    pub num_pixels: Option<(usize, usize)>,
    /// Grid center `(x, y)`
    pub center: (f64, f64),
}

impl Default for PixelGridSettings {
    fn default() -> Self {
        Self {
            pixel_scale_factor: 1.0,
            num_pixels: None,
            center: (0.0, 0.0),
        }
    }
}

/// Coordinate system of the data and of pixelated model components
pub trait GridProvider {
    /// Data grid shape as `(num_y, num_x)`
    fn num_pixel_axes(&self) -> (usize, usize);

    fn pixel_width(&self) -> f64;

    fn pixel_area(&self) -> f64 {
        self.pixel_width().powi(2)
    }

    /// Data-pixel center coordinates, each of shape `(num_y, num_x)`
    fn pixel_coordinates(&self) -> (Array2<f64>, Array2<f64>);

    /// Row-major flattened coordinates of the grid supersampled by `factor`
    fn supersampled_coordinates(&self, factor: usize) -> (Array1<f64>, Array1<f64>);

    /// Create the grid of a pixelated model component, keeping an existing one unless `overwrite`
    fn create_model_grid(
        &mut self,
        class: ModelClass,
        settings: &PixelGridSettings,
        overwrite: bool,
    ) -> Result<(), ConfigurationError>;

    fn model_pixel_axes(&self, class: ModelClass) -> Option<Arc<PixelAxes>>;
}

/// Regular square-pixel grid centered on the origin, `x` along columns and `y` along rows
#[derive(Clone, Debug)]
pub struct PixelGrid {
    num_x: usize,
    num_y: usize,
    pixel_width: f64,
    model_grids: BTreeMap<ModelClass, Arc<PixelAxes>>,
}

fn centered_axis(n: usize, width: f64, center: f64) -> Array1<f64> {
    let mid = (n as f64 - 1.0) * 0.5;
    Array1::from_shape_fn(n, |i| center + (i as f64 - mid) * width)
}

impl PixelGrid {
    pub fn new(num_x: usize, num_y: usize, pixel_width: f64) -> Result<Self, ConfigurationError> {
        if num_x == 0 || num_y == 0 || !(pixel_width > 0.0) {
            return Err(ConfigurationError::Numerics(format!(
                "grid needs a positive size and pixel width, got {num_x}x{num_y} with width {pixel_width}"
            )));
        }
        Ok(Self {
            num_x,
            num_y,
            pixel_width,
            model_grids: BTreeMap::new(),
        })
    }

    pub fn pixel_axes(&self) -> PixelAxes {
        PixelAxes::new(
            centered_axis(self.num_x, self.pixel_width, 0.0),
            centered_axis(self.num_y, self.pixel_width, 0.0),
        )
    }
}

impl GridProvider for PixelGrid {
    fn num_pixel_axes(&self) -> (usize, usize) {
        (self.num_y, self.num_x)
    }

    fn pixel_width(&self) -> f64 {
        self.pixel_width
    }

    fn pixel_coordinates(&self) -> (Array2<f64>, Array2<f64>) {
        let axes = self.pixel_axes();
        let shape = (self.num_y, self.num_x);
        (
            Array2::from_shape_fn(shape, |(_, j)| axes.x[j]),
            Array2::from_shape_fn(shape, |(i, _)| axes.y[i]),
        )
    }

    fn supersampled_coordinates(&self, factor: usize) -> (Array1<f64>, Array1<f64>) {
        let width = self.pixel_width / factor as f64;
        PixelAxes::new(
            centered_axis(self.num_x * factor, width, 0.0),
            centered_axis(self.num_y * factor, width, 0.0),
        )
        .flat_coordinates()
    }

    fn create_model_grid(
        &mut self,
        class: ModelClass,
        settings: &PixelGridSettings,
        overwrite: bool,
    ) -> Result<(), ConfigurationError> {
        if self.model_grids.contains_key(&class) && !overwrite {
            log::debug!("keeping existing {class} model grid");
            return Ok(());
        }
        if !(settings.pixel_scale_factor > 0.0) {
            return Err(ConfigurationError::Numerics(format!(
                "pixel scale factor must be positive, got {}",
                settings.pixel_scale_factor
            )));
        }
        let width = self.pixel_width * settings.pixel_scale_factor;
        let (num_x, num_y) = settings.num_pixels.unwrap_or_else(|| {
            let scale = |n: usize| ((n as f64 / settings.pixel_scale_factor).round() as usize).max(2);
            (scale(self.num_x), scale(self.num_y))
        });
        let axes = PixelAxes::new(
            centered_axis(num_x, width, settings.center.0),
            centered_axis(num_y, width, settings.center.1),
        );
        log::debug!("created {class} model grid of {num_x}x{num_y} pixels of width {width}");
        self.model_grids.insert(class, Arc::new(axes));
        Ok(())
    }

    fn model_pixel_axes(&self, class: ModelClass) -> Option<Arc<PixelAxes>> {
        self.model_grids.get(&class).cloned()
    }
}
