//! Deterministic synthetic solar, wind, and load profiles.

use std::f64::consts::PI;

use rand::{SeedableRng, rngs::StdRng};

use super::{TickSource, gaussian_noise};
use crate::config::ScenarioConfig;
use crate::dispatch::TickInput;

/// Minimum cloud multiplier (heavy overcast).
const CLOUD_MIN: f64 = 0.2;
/// Maximum cloud multiplier (cloud-edge enhancement).
const CLOUD_MAX: f64 = 1.2;

const WIND_SEED_OFFSET: u64 = 1;
const LOAD_SEED_OFFSET: u64 = 2;

/// Fraction of the daylight half-sine at step `t`, 0.0 at night.
fn daylight_frac(t: usize, steps_per_day: usize, sunrise: usize, sunset: usize) -> f64 {
    let step = t % steps_per_day;
    if step < sunrise || step >= sunset {
        return 0.0;
    }
    let x = (step - sunrise) as f64 + 0.5;
    let span = (sunset - sunrise) as f64;
    (PI * x / span).sin().max(0.0)
}

/// Solar PV output with a temporally correlated cloud multiplier.
///
/// The multiplier follows `m(t) = alpha * m(t-1) + (1 - alpha) * (1 + e(t))`,
/// clamped to `[0.2, 1.2]`, and advances every step so that night does not
/// reset the weather.
#[derive(Debug, Clone)]
pub struct SolarProfile {
    pub kw_peak: f64,
    steps_per_day: usize,
    sunrise_idx: usize,
    sunset_idx: usize,
    alpha: f64,
    cloud_noise_std: f64,
    multiplier: f64,
    rng: StdRng,
}

impl SolarProfile {
    /// # Panics
    ///
    /// Panics if `sunrise_idx >= sunset_idx` or `sunset_idx > steps_per_day`.
    pub fn new(
        kw_peak: f64,
        steps_per_day: usize,
        sunrise_idx: usize,
        sunset_idx: usize,
        alpha: f64,
        cloud_noise_std: f64,
        seed: u64,
    ) -> Self {
        assert!(
            sunrise_idx < sunset_idx && sunset_idx <= steps_per_day,
            "sunrise_idx must be < sunset_idx and sunset_idx must be <= steps_per_day"
        );
        Self {
            kw_peak: kw_peak.max(0.0),
            steps_per_day,
            sunrise_idx,
            sunset_idx,
            alpha: alpha.clamp(0.0, 1.0),
            cloud_noise_std: cloud_noise_std.max(0.0),
            multiplier: 1.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn sample(&mut self, t: usize) -> f64 {
        let epsilon = gaussian_noise(&mut self.rng, self.cloud_noise_std);
        self.multiplier = (self.alpha * self.multiplier + (1.0 - self.alpha) * (1.0 + epsilon))
            .clamp(CLOUD_MIN, CLOUD_MAX);

        let frac = daylight_frac(t, self.steps_per_day, self.sunrise_idx, self.sunset_idx);
        (self.kw_peak * frac * self.multiplier).max(0.0)
    }
}

/// Wind output as an AR(1) process reverting to `mean_kw`, clamped to `[0, max_kw]`.
#[derive(Debug, Clone)]
pub struct WindProfile {
    pub mean_kw: f64,
    pub max_kw: f64,
    alpha: f64,
    noise_std: f64,
    current_kw: f64,
    rng: StdRng,
}

impl WindProfile {
    pub fn new(mean_kw: f64, max_kw: f64, alpha: f64, noise_std: f64, seed: u64) -> Self {
        let max_kw = max_kw.max(0.0);
        let mean_kw = mean_kw.clamp(0.0, max_kw);
        Self {
            mean_kw,
            max_kw,
            alpha: alpha.clamp(0.0, 1.0),
            noise_std: noise_std.max(0.0),
            current_kw: mean_kw,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn sample(&mut self) -> f64 {
        let epsilon = gaussian_noise(&mut self.rng, self.noise_std);
        self.current_kw = (self.alpha * self.current_kw
            + (1.0 - self.alpha) * self.mean_kw
            + epsilon)
            .clamp(0.0, self.max_kw);
        self.current_kw
    }
}

/// Site demand: baseline plus a daily sinusoid plus Gaussian noise, never negative.
#[derive(Debug, Clone)]
pub struct LoadProfile {
    pub base_kw: f64,
    pub amp_kw: f64,
    pub phase_rad: f64,
    pub noise_std: f64,
    steps_per_day: usize,
    rng: StdRng,
}

impl LoadProfile {
    pub fn new(
        base_kw: f64,
        amp_kw: f64,
        phase_rad: f64,
        noise_std: f64,
        steps_per_day: usize,
        seed: u64,
    ) -> Self {
        Self {
            base_kw,
            amp_kw,
            phase_rad,
            noise_std,
            steps_per_day: steps_per_day.max(1),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn sample(&mut self, t: usize) -> f64 {
        let day_pos = (t % self.steps_per_day) as f64 / self.steps_per_day as f64;
        let angle = 2.0 * PI * day_pos + self.phase_rad;
        let noise = gaussian_noise(&mut self.rng, self.noise_std);
        (self.base_kw + self.amp_kw * angle.sin() + noise).max(0.0)
    }
}

/// Synthetic site combining the three profiles, seeded for reproducibility.
///
/// Yields up to `ticks` readings, then `None`.
#[derive(Debug, Clone)]
pub struct SyntheticProfile {
    solar: SolarProfile,
    wind: WindProfile,
    load: LoadProfile,
    ticks: usize,
}

impl SyntheticProfile {
    pub fn new(solar: SolarProfile, wind: WindProfile, load: LoadProfile, ticks: usize) -> Self {
        Self {
            solar,
            wind,
            load,
            ticks,
        }
    }

    /// Builds the profiles from a validated scenario.
    pub fn from_config(cfg: &ScenarioConfig) -> Self {
        let s = &cfg.simulation;
        let sol = &cfg.solar;
        let w = &cfg.wind;
        let l = &cfg.load;
        Self::new(
            SolarProfile::new(
                sol.kw_peak,
                s.steps_per_day,
                sol.sunrise_idx,
                sol.sunset_idx,
                sol.alpha,
                sol.cloud_noise_std,
                s.seed,
            ),
            WindProfile::new(
                w.mean_kw,
                w.max_kw,
                w.alpha,
                w.noise_std,
                s.seed.wrapping_add(WIND_SEED_OFFSET),
            ),
            LoadProfile::new(
                l.base_kw,
                l.amp_kw,
                l.phase_rad,
                l.noise_std,
                s.steps_per_day,
                s.seed.wrapping_add(LOAD_SEED_OFFSET),
            ),
            s.ticks,
        )
    }
}

impl TickSource for SyntheticProfile {
    fn next_tick(&mut self, tick: usize) -> Option<TickInput> {
        if tick >= self.ticks {
            return None;
        }
        Some(TickInput::new(
            self.solar.sample(tick),
            self.wind.sample(),
            self.load.sample(tick),
        ))
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}
