//! Observable accumulators: the thermal map, time-framed flux and
//! temperature profiles, scattering-event statistics, and the append-only
//! sequences the distributions are built from.
//!
//! One `Film` exists per worker group; groups are merged in index order
//! after the ensemble, so the aggregates do not depend on the thread count.

// std
use std::f64::consts::PI;

// others
use rand::Rng;
use serde::Serialize;

// phonoray
use crate::config::Config;
use crate::core::base::{Float, HBAR, K_B};
use crate::core::flight::Flight;
use crate::core::phonon::Phonon;
use crate::core::rng::PhononRng;
use crate::core::scattering::{ScatterKind, SurfaceScatteringTypes};
use crate::materials::Material;

/// Event counts per surface class and outcome, accumulated per step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScatteringStatistics {
    pub wall_diffuse: u64,
    pub wall_specular: u64,
    pub top_bottom_diffuse: u64,
    pub top_bottom_specular: u64,
    pub hole_diffuse: u64,
    pub hole_specular: u64,
    pub rethermalization: u64,
    pub internal: u64,
    pub pillar_diffuse: u64,
    pub pillar_specular: u64,
}

impl ScatteringStatistics {
    pub fn register(&mut self, surface: &SurfaceScatteringTypes, rethermalized: bool, internal: bool) {
        match surface.walls {
            Some(ScatterKind::Diffuse) => self.wall_diffuse += 1,
            Some(ScatterKind::Specular) => self.wall_specular += 1,
            None => {}
        }
        match surface.top_bottom {
            Some(ScatterKind::Diffuse) => self.top_bottom_diffuse += 1,
            Some(ScatterKind::Specular) => self.top_bottom_specular += 1,
            None => {}
        }
        match surface.holes {
            Some(ScatterKind::Diffuse) => self.hole_diffuse += 1,
            Some(ScatterKind::Specular) => self.hole_specular += 1,
            None => {}
        }
        match surface.pillars {
            Some(ScatterKind::Diffuse) => self.pillar_diffuse += 1,
            Some(ScatterKind::Specular) => self.pillar_specular += 1,
            None => {}
        }
        if rethermalized {
            self.rethermalization += 1;
        }
        if internal {
            self.internal += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.wall_diffuse
            + self.wall_specular
            + self.top_bottom_diffuse
            + self.top_bottom_specular
            + self.hole_diffuse
            + self.hole_specular
            + self.rethermalization
            + self.internal
            + self.pillar_diffuse
            + self.pillar_specular
    }

    pub fn merge(&mut self, other: &ScatteringStatistics) {
        self.wall_diffuse += other.wall_diffuse;
        self.wall_specular += other.wall_specular;
        self.top_bottom_diffuse += other.top_bottom_diffuse;
        self.top_bottom_specular += other.top_bottom_specular;
        self.hole_diffuse += other.hole_diffuse;
        self.hole_specular += other.hole_specular;
        self.rethermalization += other.rethermalization;
        self.internal += other.internal;
        self.pillar_diffuse += other.pillar_diffuse;
        self.pillar_specular += other.pillar_specular;
    }
}

pub struct Film {
    pixels_x: usize,
    pixels_y: usize,
    frames: usize,
    steps: usize,
    randomize_frames: bool,
    width: Float,
    length: Float,
    cell_volume_x: Float,
    cell_volume_y: Float,
    volumetric_heat_capacity: Float,
    /// Summed phonon energy per pixel, row-major [y][x].
    pub thermal_map: Vec<Float>,
    /// Heat flux along y, profiled along x and y, per time frame
    /// (index = pixel * frames + frame).
    pub heat_flux_x: Vec<Float>,
    pub heat_flux_y: Vec<Float>,
    pub temperature_x: Vec<Float>,
    pub temperature_y: Vec<Float>,
    pub statistics: ScatteringStatistics,
    pub free_paths: Vec<Float>,
    pub free_paths_along_y: Vec<Float>,
    pub travel_times: Vec<Float>,
    pub initial_thetas: Vec<Float>,
    pub exit_thetas: Vec<Float>,
    pub frequencies: Vec<Float>,
    pub group_velocities: Vec<Float>,
    pub detected_frequencies: [Vec<Float>; 3],
    pub failed_flights: u64,
}

impl Film {
    pub fn new(cfg: &Config, material: &Material) -> Self {
        let pixels_x: usize = cfg.number_of_pixels_x;
        let pixels_y: usize = cfg.number_of_pixels_y;
        let frames: usize = cfg.number_of_timeframes;
        Film {
            pixels_x,
            pixels_y,
            frames,
            steps: cfg.number_of_timesteps,
            randomize_frames: cfg.randomize_timeframes,
            width: cfg.width,
            length: cfg.length,
            cell_volume_x: cfg.length * cfg.thickness * cfg.width / pixels_x as Float,
            cell_volume_y: cfg.width * cfg.thickness * cfg.length / pixels_y as Float,
            volumetric_heat_capacity: material.specific_heat_capacity * material.density,
            thermal_map: vec![0.0; pixels_x * pixels_y],
            heat_flux_x: vec![0.0; pixels_x * frames],
            heat_flux_y: vec![0.0; pixels_y * frames],
            temperature_x: vec![0.0; pixels_x * frames],
            temperature_y: vec![0.0; pixels_y * frames],
            statistics: ScatteringStatistics::default(),
            free_paths: Vec::new(),
            free_paths_along_y: Vec::new(),
            travel_times: Vec::new(),
            initial_thetas: Vec::new(),
            exit_thetas: Vec::new(),
            frequencies: Vec::new(),
            group_velocities: Vec::new(),
            detected_frequencies: [Vec::new(), Vec::new(), Vec::new()],
            failed_flights: 0,
        }
    }

    /// Register the phonon's presence at its current position for this step.
    /// Depositions outside the map are ignored.
    pub fn deposit(&mut self, phonon: &Phonon, step: usize, rng: &mut PhononRng) {
        let ix: isize =
            (((phonon.x + self.width / 2.0) * self.pixels_x as Float) / self.width).floor() as isize;
        let iy: isize = ((phonon.y * self.pixels_y as Float) / self.length).floor() as isize;
        if ix < 0 || iy < 0 || ix >= self.pixels_x as isize || iy >= self.pixels_y as isize {
            return;
        }
        let (ix, iy) = (ix as usize, iy as usize);
        let energy: Float = HBAR * 2.0 * PI * phonon.frequency;
        self.thermal_map[iy * self.pixels_x + ix] += energy;

        let mut effective_step: usize = step;
        if self.randomize_frames {
            effective_step += rng.gen_range(0..=self.steps);
        }
        let frame: usize = effective_step * self.frames / self.steps;
        if frame < self.frames {
            let flux: Float =
                energy * phonon.theta.cos() * phonon.phi.cos().abs() * phonon.speed;
            self.heat_flux_x[ix * self.frames + frame] += flux / self.cell_volume_x;
            self.heat_flux_y[iy * self.frames + frame] += flux / self.cell_volume_y;
            self.temperature_x[ix * self.frames + frame] +=
                energy / (self.volumetric_heat_capacity * self.cell_volume_x);
            self.temperature_y[iy * self.frames + frame] +=
                energy / (self.volumetric_heat_capacity * self.cell_volume_y);
        }
    }

    /// Fold a finished flight into the sequences.
    pub fn record_flight(&mut self, flight: &Flight, phonon: &Phonon) {
        self.initial_thetas.push(flight.initial_theta);
        self.frequencies.push(phonon.frequency);
        self.group_velocities.push(phonon.speed);
        self.free_paths.extend_from_slice(&flight.free_paths);
        self.free_paths_along_y
            .extend_from_slice(&flight.free_paths_along_y);
        if let Some(exit_theta) = flight.exit_theta {
            self.exit_thetas.push(exit_theta);
        }
        if let Some(travel_time) = flight.travel_time {
            self.travel_times.push(travel_time);
        }
        for (sequence, &value) in self
            .detected_frequencies
            .iter_mut()
            .zip(flight.detected_frequencies.iter())
        {
            sequence.push(value);
        }
    }

    pub fn merge(&mut self, other: Film) {
        for (a, b) in self.thermal_map.iter_mut().zip(other.thermal_map) {
            *a += b;
        }
        for (a, b) in self.heat_flux_x.iter_mut().zip(other.heat_flux_x) {
            *a += b;
        }
        for (a, b) in self.heat_flux_y.iter_mut().zip(other.heat_flux_y) {
            *a += b;
        }
        for (a, b) in self.temperature_x.iter_mut().zip(other.temperature_x) {
            *a += b;
        }
        for (a, b) in self.temperature_y.iter_mut().zip(other.temperature_y) {
            *a += b;
        }
        self.statistics.merge(&other.statistics);
        self.free_paths.extend(other.free_paths);
        self.free_paths_along_y.extend(other.free_paths_along_y);
        self.travel_times.extend(other.travel_times);
        self.initial_thetas.extend(other.initial_thetas);
        self.exit_thetas.extend(other.exit_thetas);
        self.frequencies.extend(other.frequencies);
        self.group_velocities.extend(other.group_velocities);
        for (sequence, extra) in self
            .detected_frequencies
            .iter_mut()
            .zip(other.detected_frequencies)
        {
            sequence.extend(extra);
        }
        self.failed_flights += other.failed_flights;
    }

    /// Total deposited energy, for conservation checks.
    pub fn total_energy(&self) -> Float {
        self.thermal_map.iter().sum()
    }

    /// Effective conductivity per time frame, k = L <J_y> / dT, from the
    /// y-profiles. Frames with a flat temperature profile yield zero.
    pub fn effective_conductivity(&self) -> Vec<Float> {
        (0..self.frames)
            .map(|frame| {
                let column = |profile: &[Float]| -> Vec<Float> {
                    (0..self.pixels_y)
                        .map(|i| profile[i * self.frames + frame])
                        .collect()
                };
                let temperatures = column(&self.temperature_y);
                let fluxes = column(&self.heat_flux_y);
                let t_max: Float = temperatures.iter().cloned().fold(Float::MIN, Float::max);
                let t_min: Float = temperatures.iter().cloned().fold(Float::MAX, Float::min);
                let mean_flux: Float = fluxes.iter().sum::<Float>() / fluxes.len() as Float;
                if t_max - t_min > 0.0 {
                    self.length * mean_flux / (t_max - t_min)
                } else {
                    0.0
                }
            })
            .collect()
    }

    pub fn pixel_counts(&self) -> (usize, usize) {
        (self.pixels_x, self.pixels_y)
    }

    pub fn frame_count(&self) -> usize {
        self.frames
    }
}

/// Mode-wise quantum heat capacity C_v(w, T). Ref. PRB 88 155318 (2013).
pub fn quantum_heat_capacity(omega: Float, temperature: Float) -> Float {
    let x: Float = HBAR * omega / (K_B * temperature);
    K_B * x * x * x.exp() / ((x.exp() - 1.0) * (x.exp() - 1.0))
}

/// One phonon's share of the conductivity integral, indexed by wavelength.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct SpectralContribution {
    pub branch: usize,
    pub wavelength: Float,
    pub conductivity: Float,
}

/// Cumulative thermal conductivity of the dispersion-sweep mode,
/// k = sum C_v v^2 (l/v) k^2 dk / (6 pi^2).
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConductivityIntegral {
    pub total: Float,
    pub contributions: Vec<SpectralContribution>,
}

impl ConductivityIntegral {
    pub fn merge(&mut self, other: ConductivityIntegral) {
        self.total += other.total;
        self.contributions.extend(other.contributions);
    }
}

/// Uniform-bin histogram over the observed range of a sample sequence.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Histogram {
    pub centers: Vec<Float>,
    pub counts: Vec<u64>,
}

impl Histogram {
    pub fn from_samples(samples: &[Float], bins: usize) -> Histogram {
        if samples.is_empty() || bins == 0 {
            return Histogram::default();
        }
        let min: Float = samples.iter().cloned().fold(Float::MAX, Float::min);
        let max: Float = samples.iter().cloned().fold(Float::MIN, Float::max);
        let span: Float = max - min;
        let mut counts: Vec<u64> = vec![0; bins];
        for &sample in samples {
            let bin: usize = if span > 0.0 {
                (((sample - min) / span) * bins as Float) as usize
            } else {
                0
            };
            counts[bin.min(bins - 1)] += 1;
        }
        let centers: Vec<Float> = (0..bins)
            .map(|i| min + span * (i as Float + 0.5) / bins as Float)
            .collect();
        Histogram { centers, counts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::phonon::Polarization;
    use crate::core::rng::seeded_for;
    use crate::materials::MaterialTag;

    fn film() -> Film {
        let cfg = Config::default();
        let material = Material::from_tag(MaterialTag::Si);
        Film::new(&cfg, &material)
    }

    fn phonon_at(x: Float, y: Float) -> Phonon {
        Phonon {
            x,
            y,
            z: 0.0,
            theta: 0.0,
            phi: 0.0,
            frequency: 2.0e12,
            polarization: Polarization::La,
            speed: 6000.0,
            time_since_previous_scattering: 0.0,
            time_of_internal_scattering: 1.0,
        }
    }

    #[test]
    fn deposits_land_in_the_right_pixel() {
        let mut film = film();
        let mut rng = seeded_for(19, 0);
        let p = phonon_at(0.0, 2.0e-7); // centre of the 400 nm slab
        film.deposit(&p, 0, &mut rng);
        let (nx, _) = film.pixel_counts();
        let expected_index = (40 / 2) * nx + 40 / 2;
        assert!(film.thermal_map[expected_index] > 0.0);
        assert!((film.total_energy() - HBAR * 2.0 * PI * p.frequency).abs() < 1e-35);
    }

    #[test]
    fn out_of_range_deposits_are_ignored() {
        let mut film = film();
        let mut rng = seeded_for(19, 1);
        film.deposit(&phonon_at(0.0, -1.0e-9), 0, &mut rng);
        film.deposit(&phonon_at(0.0, 5.0e-7), 0, &mut rng);
        film.deposit(&phonon_at(3.0e-7, 2.0e-7), 0, &mut rng);
        assert_eq!(film.total_energy(), 0.0);
    }

    #[test]
    fn merge_adds_maps_and_concatenates_sequences() {
        let mut a = film();
        let mut b = film();
        let mut rng = seeded_for(19, 2);
        let p = phonon_at(0.0, 2.0e-7);
        a.deposit(&p, 0, &mut rng);
        b.deposit(&p, 0, &mut rng);
        b.travel_times.push(1.0e-9);
        let energy = a.total_energy();
        a.merge(b);
        assert!((a.total_energy() - 2.0 * energy).abs() < 1e-35);
        assert_eq!(a.travel_times.len(), 1);
    }

    #[test]
    fn histogram_counts_preserve_the_sample_count() {
        let samples: Vec<Float> = (0..1000).map(|i| i as Float).collect();
        let h = Histogram::from_samples(&samples, 20);
        assert_eq!(h.counts.iter().sum::<u64>(), 1000);
        assert_eq!(h.centers.len(), 20);
        // uniform samples spread evenly
        for &count in &h.counts {
            assert_eq!(count, 50);
        }
    }

    #[test]
    fn heat_capacity_approaches_the_classical_limit() {
        // hbar w << k T: C_v -> k_B
        let cv = quantum_heat_capacity(2.0 * PI * 1.0e9, 300.0);
        assert!((cv - K_B).abs() / K_B < 1e-3);
        // and vanishes deep in the quantum regime
        let cv = quantum_heat_capacity(2.0 * PI * 2.0e13, 3.0);
        assert!(cv < 1e-3 * K_B);
    }

    #[test]
    fn statistics_register_each_class() {
        let mut stats = ScatteringStatistics::default();
        let surface = SurfaceScatteringTypes {
            walls: Some(ScatterKind::Diffuse),
            top_bottom: Some(ScatterKind::Specular),
            holes: None,
            pillars: None,
        };
        stats.register(&surface, true, false);
        assert_eq!(stats.wall_diffuse, 1);
        assert_eq!(stats.top_bottom_specular, 1);
        assert_eq!(stats.rethermalization, 1);
        assert_eq!(stats.internal, 0);
        assert_eq!(stats.total(), 3);
    }
}
