//! Instrument collaborators: point-spread function and noise.

mod noise;
pub use noise::{Noise, NoiseProvider};

mod psf;
pub use psf::{Psf, PsfKind};
