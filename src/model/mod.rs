//! Composite mass and light models and the lens equation.
//!
//! A composite owns an ordered list of profiles and sums their contributions; a [`Selection`]
//! restricts an evaluation to a subset of them without touching the composite.

mod composite;

mod light;
pub use light::LightModel;

mod mass;
pub use mass::MassModel;

mod ray_mapper;
pub use ray_mapper::RayMapper;

mod selection;
pub use selection::Selection;
