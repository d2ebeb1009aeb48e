//! The trajectory driver and the ensemble runners.
//!
//! `run_flight` advances a single phonon through the time-stepped loop:
//! cold-side check, internal clock, hot-side re-injection, surface kernel,
//! free-path bookkeeping, observable deposit, move. The runners launch the
//! whole ensemble in groups on a rayon pool; each group fills its own film
//! and the groups are merged in index order, so a fixed seed reproduces the
//! aggregates bit for bit regardless of the thread count.

// others
use anyhow::Result;
use log::info;
use rayon::prelude::*;

// phonoray
use crate::config::{AngularDistribution, Config};
use crate::core::base::Float;
use crate::core::dispersion::{Dispersion, SweepInterval, DISPERSION_POINTS};
use crate::core::film::{ConductivityIntegral, Film, SpectralContribution};
use crate::core::flight::Flight;
use crate::core::phonon::Phonon;
use crate::core::relaxation;
use crate::core::rng::{seeded_for, PhononRng};
use crate::core::sampling::{
    sample_planck_phonon, source_direction, source_position, PhononSample,
};
use crate::core::scattering::surface_scattering;
use crate::materials::Material;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlightStatus {
    /// Reached the cold side.
    Exited,
    /// Hit the timestep cap; partial observables stand, no exit record.
    TimedOut,
    /// Ran into a numerical degeneracy; nothing further was contributed.
    Failed,
}

/// A validated configuration together with its resolved material and source
/// distribution; the only entry point the ensemble runners need.
pub struct Simulation {
    pub cfg: Config,
    pub material: Material,
    pub distribution: AngularDistribution,
}

pub struct SimulationResults {
    pub film: Film,
    pub flights: Vec<Flight>,
    /// Present in sweep mode only.
    pub conductivity: Option<ConductivityIntegral>,
}

impl SimulationResults {
    /// Share of successful flights that reached the cold side.
    pub fn exit_fraction(&self) -> Float {
        if self.flights.is_empty() {
            0.0
        } else {
            self.film.exit_thetas.len() as Float / self.flights.len() as Float
        }
    }
}

fn has_reached_cold_side(cfg: &Config, phonon: &Phonon) -> bool {
    (cfg.cold_side_position_top && phonon.y >= cfg.length)
        || (cfg.cold_side_position_bottom && phonon.y <= 0.0)
        || (cfg.cold_side_position_right && phonon.x >= cfg.width / 2.0)
        || (cfg.cold_side_position_left && phonon.x <= -cfg.width / 2.0)
}

/// Re-inject the phonon at the source if its tentative step crosses the hot
/// boundary: new position and direction, same frequency and polarization.
fn reinitialization(
    cfg: &Config,
    distribution: AngularDistribution,
    phonon: &mut Phonon,
    rng: &mut PhononRng,
) -> bool {
    let (tx, ty, _) = phonon.step_position(cfg.timestep);
    let crossed: bool = (cfg.hot_side_position_bottom && ty < 0.0)
        || (cfg.hot_side_position_top && ty > cfg.length)
        || (cfg.hot_side_position_right && tx > cfg.width / 2.0)
        || (cfg.hot_side_position_left && tx < -cfg.width / 2.0);
    if crossed {
        let (x, y, z) = source_position(cfg, rng);
        let (theta, phi) = source_direction(distribution, rng);
        phonon.x = x;
        phonon.y = y;
        phonon.z = z;
        phonon.theta = theta;
        phonon.phi = phi;
    }
    crossed
}

/// Drive one phonon until it exits, fails, or the step cap is reached.
pub fn run_flight(
    cfg: &Config,
    material: &Material,
    distribution: AngularDistribution,
    phonon: &mut Phonon,
    flight: &mut Flight,
    film: &mut Film,
    rng: &mut PhononRng,
) -> FlightStatus {
    let dt: Float = cfg.timestep;
    for step in 0..cfg.number_of_timesteps {
        if has_reached_cold_side(cfg, phonon) {
            flight.save_free_path();
            flight.finish(phonon, step, cfg);
            return FlightStatus::Exited;
        }

        let internal: bool = cfg.include_internal_scattering
            && relaxation::internal_scattering(phonon, rng);
        let rethermalized: bool = reinitialization(cfg, distribution, phonon, rng);
        let surface = surface_scattering(phonon, cfg, rng);
        film.statistics.register(&surface, rethermalized, internal);
        if !phonon.is_finite() {
            film.failed_flights += 1;
            return FlightStatus::Failed;
        }

        // a diffuse event of any kind ends the current free segment
        if internal || rethermalized || surface.is_diffuse() {
            flight.save_free_path();
            flight.restart();
            phonon.time_since_previous_scattering = 0.0;
            phonon.time_of_internal_scattering =
                relaxation::scheduled_time(cfg, material, phonon, rng);
        } else {
            flight.add_step(phonon, dt);
            phonon.time_since_previous_scattering += dt;
        }

        film.deposit(phonon, step, rng);
        phonon.advance(dt);
    }
    FlightStatus::TimedOut
}

impl Simulation {
    /// Validate the configuration and resolve its tags. Refuses to run on
    /// any configuration error.
    pub fn new(mut cfg: Config) -> Result<Simulation> {
        cfg.validate()?;
        let material = cfg.material()?;
        let distribution = cfg.source_distribution()?;
        Ok(Simulation {
            cfg,
            material,
            distribution,
        })
    }

    fn spawn(&self, sample: PhononSample, rng: &mut PhononRng) -> Phonon {
        let (x, y, z) = source_position(&self.cfg, rng);
        let (theta, phi) = source_direction(self.distribution, rng);
        let mut phonon = Phonon {
            x,
            y,
            z,
            theta,
            phi,
            frequency: sample.frequency,
            polarization: sample.polarization,
            speed: sample.speed,
            time_since_previous_scattering: 0.0,
            time_of_internal_scattering: 0.0,
        };
        phonon.time_of_internal_scattering =
            relaxation::scheduled_time(&self.cfg, &self.material, &phonon, rng);
        phonon
    }

    fn group_ranges(&self, total: usize) -> Vec<(usize, usize)> {
        let group: usize = self.cfg.number_of_phonons_in_a_group.max(1);
        (0..total)
            .step_by(group)
            .map(|start| (start, (start + group).min(total)))
            .collect()
    }

    /// Planck-mode ensemble: phonons drawn from the thermal distribution.
    pub fn run(&self) -> SimulationResults {
        let dispersion = Dispersion::new(&self.material, DISPERSION_POINTS);
        let total: usize = self.cfg.number_of_phonons;
        let partials: Vec<(Film, Vec<Flight>)> = self
            .group_ranges(total)
            .into_par_iter()
            .map(|(start, end)| {
                let mut film = Film::new(&self.cfg, &self.material);
                let mut flights: Vec<Flight> = Vec::with_capacity(end - start);
                for index in start..end {
                    let mut rng = seeded_for(self.cfg.seed, index as u64);
                    let sample = sample_planck_phonon(
                        &dispersion,
                        &self.material,
                        self.cfg.temperature,
                        &mut rng,
                    );
                    let mut phonon = self.spawn(sample, &mut rng);
                    let mut flight = Flight::new(&phonon);
                    let status = run_flight(
                        &self.cfg,
                        &self.material,
                        self.distribution,
                        &mut phonon,
                        &mut flight,
                        &mut film,
                        &mut rng,
                    );
                    if status != FlightStatus::Failed {
                        film.record_flight(&flight, &phonon);
                        flights.push(flight);
                    }
                }
                (film, flights)
            })
            .collect();

        let mut film = Film::new(&self.cfg, &self.material);
        let mut flights: Vec<Flight> = Vec::with_capacity(total);
        for (partial_film, partial_flights) in partials {
            film.merge(partial_film);
            flights.extend(partial_flights);
        }
        info!(
            "{} of {} phonons reached the cold side ({} failed)",
            film.exit_thetas.len(),
            total,
            film.failed_flights
        );
        SimulationResults {
            film,
            flights,
            conductivity: None,
        }
    }

    /// Dispersion-sweep mode: one phonon per k-interval and branch, with the
    /// conductivity integrated from the measured mean free paths.
    pub fn run_sweep(&self) -> SimulationResults {
        let per_branch: usize = self.cfg.number_of_phonons;
        let dispersion = Dispersion::new(&self.material, per_branch + 1);
        let total: usize = 3 * per_branch;
        let partials: Vec<(Film, Vec<Flight>, ConductivityIntegral)> = self
            .group_ranges(total)
            .into_par_iter()
            .map(|(start, end)| {
                let mut film = Film::new(&self.cfg, &self.material);
                let mut flights: Vec<Flight> = Vec::with_capacity(end - start);
                let mut integral = ConductivityIntegral::default();
                for index in start..end {
                    let branch: usize = index / per_branch;
                    let j: usize = index % per_branch;
                    let mut rng = seeded_for(self.cfg.seed, index as u64);
                    let interval: SweepInterval = dispersion.sweep_interval(branch, j);
                    if interval.frequency <= 0.0 || interval.speed <= 0.0 {
                        continue;
                    }
                    let sample = PhononSample {
                        frequency: interval.frequency,
                        polarization: interval.polarization,
                        speed: interval.speed,
                    };
                    let mut phonon = self.spawn(sample, &mut rng);
                    let mut flight = Flight::new(&phonon);
                    let status = run_flight(
                        &self.cfg,
                        &self.material,
                        self.distribution,
                        &mut phonon,
                        &mut flight,
                        &mut film,
                        &mut rng,
                    );
                    if status == FlightStatus::Failed {
                        continue;
                    }
                    film.record_flight(&flight, &phonon);
                    integral.merge(conductivity_contribution(
                        &flight,
                        &interval,
                        branch,
                        self.cfg.temperature,
                    ));
                    flights.push(flight);
                }
                (film, flights, integral)
            })
            .collect();

        let mut film = Film::new(&self.cfg, &self.material);
        let mut flights: Vec<Flight> = Vec::with_capacity(total);
        let mut conductivity = ConductivityIntegral::default();
        for (partial_film, partial_flights, partial_integral) in partials {
            film.merge(partial_film);
            flights.extend(partial_flights);
            conductivity.merge(partial_integral);
        }
        info!(
            "dispersion sweep finished: k = {:.2} W/m/K over {} phonons",
            conductivity.total,
            flights.len()
        );
        SimulationResults {
            film,
            flights,
            conductivity: Some(conductivity),
        }
    }
}

/// Eq. 3 of Phys. Rev. 132, 2461 (1963), one k-interval at a time.
fn conductivity_contribution(
    flight: &Flight,
    interval: &SweepInterval,
    branch: usize,
    temperature: Float,
) -> ConductivityIntegral {
    use crate::core::film::quantum_heat_capacity;
    use std::f64::consts::PI;

    let mean_free_path: Float = flight.mean_free_path();
    let heat_capacity: Float = quantum_heat_capacity(interval.omega, temperature);
    let conductivity: Float = heat_capacity
        * interval.speed
        * interval.speed
        * (mean_free_path / interval.speed)
        * interval.wavevector
        * interval.wavevector
        * interval.delta_wavevector
        / (6.0 * PI * PI);
    ConductivityIntegral {
        total: conductivity,
        contributions: vec![SpectralContribution {
            branch,
            wavelength: interval.speed / interval.frequency,
            conductivity,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::phonon::Polarization;

    fn smooth_config() -> Config {
        let mut cfg = Config::default();
        cfg.side_wall_roughness = 0.0;
        cfg.hole_roughness = 0.0;
        cfg.pillar_roughness = 0.0;
        cfg.top_roughness = 0.0;
        cfg.bottom_roughness = 0.0;
        cfg.pillar_top_roughness = 0.0;
        cfg.include_internal_scattering = false;
        cfg
    }

    #[test]
    fn ballistic_flight_crosses_in_the_expected_number_of_steps() {
        let mut cfg = smooth_config();
        cfg.phonon_source_angle_distribution = String::from("directional");
        let sim = Simulation::new(cfg).unwrap();
        let mut rng = seeded_for(23, 0);
        let speed: Float = 6000.0;
        let mut phonon = Phonon {
            x: 0.0,
            y: 1.0e-12,
            z: 0.0,
            theta: 0.0,
            phi: 0.0,
            frequency: 2.0e12,
            polarization: Polarization::La,
            speed,
            time_since_previous_scattering: 0.0,
            time_of_internal_scattering: 1.0,
        };
        let mut flight = Flight::new(&phonon);
        let mut film = Film::new(&sim.cfg, &sim.material);
        let status = run_flight(
            &sim.cfg,
            &sim.material,
            sim.distribution,
            &mut phonon,
            &mut flight,
            &mut film,
            &mut rng,
        );
        assert_eq!(status, FlightStatus::Exited);
        let expected_steps: Float =
            (sim.cfg.length / (speed * sim.cfg.timestep)).ceil();
        let travel_time = flight.travel_time.unwrap();
        assert!((travel_time - expected_steps * sim.cfg.timestep).abs() < 1e-18);
        assert!(
            (travel_time - sim.cfg.length / speed).abs() < 2.0 * sim.cfg.timestep,
            "travel time {}",
            travel_time
        );
        assert_eq!(flight.exit_theta, Some(0.0));
    }

    #[test]
    fn deposited_energy_matches_the_step_count() {
        use crate::core::base::HBAR;
        let mut cfg = smooth_config();
        cfg.phonon_source_angle_distribution = String::from("directional");
        let sim = Simulation::new(cfg).unwrap();
        let mut rng = seeded_for(23, 1);
        let speed: Float = 6000.0;
        let frequency: Float = 2.0e12;
        let mut phonon = Phonon {
            x: 0.0,
            y: 1.0e-12,
            z: 0.0,
            theta: 0.0,
            phi: 0.0,
            frequency,
            polarization: Polarization::La,
            speed,
            time_since_previous_scattering: 0.0,
            time_of_internal_scattering: 1.0,
        };
        let mut flight = Flight::new(&phonon);
        let mut film = Film::new(&sim.cfg, &sim.material);
        run_flight(
            &sim.cfg,
            &sim.material,
            sim.distribution,
            &mut phonon,
            &mut flight,
            &mut film,
            &mut rng,
        );
        let steps: Float = (sim.cfg.length / (speed * sim.cfg.timestep)).ceil();
        let expected: Float = steps * HBAR * 2.0 * std::f64::consts::PI * frequency;
        assert!(
            ((film.total_energy() - expected) / expected).abs() < 1e-9,
            "energy {} expected {}",
            film.total_energy(),
            expected
        );
    }

    #[test]
    fn group_ranges_cover_every_phonon_once() {
        let mut cfg = Config::default();
        cfg.number_of_phonons = 250;
        cfg.number_of_phonons_in_a_group = 100;
        let sim = Simulation::new(cfg).unwrap();
        let ranges = sim.group_ranges(250);
        assert_eq!(ranges, vec![(0, 100), (100, 200), (200, 250)]);
    }
}
