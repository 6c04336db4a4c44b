//! Sources of per-tick generation and load readings.

pub mod csv_source;
pub mod profile;

pub use csv_source::CsvSource;
pub use profile::{LoadProfile, SolarProfile, SyntheticProfile, WindProfile};

use rand::{Rng, rngs::StdRng};

use crate::dispatch::TickInput;

/// Produces the [`TickInput`] for each tick.
pub trait TickSource {
    /// Reading at position `index` of the current run (0-based), or `None`
    /// once the source is exhausted.
    fn next_tick(&mut self, index: usize) -> Option<TickInput>;

    /// Human-readable source name for logs.
    fn name(&self) -> &'static str;
}

/// Gaussian noise with mean 0 via the Box-Muller transform.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-9, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}
