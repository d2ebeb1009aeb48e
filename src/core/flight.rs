//! Per-flight record: free-path segments, exit angle, travel time, and the
//! cold-side frequency detectors. Written once by the trajectory driver and
//! read back by the accumulators after the flight ends.

// others
use serde::Serialize;

// phonoray
use crate::config::Config;
use crate::core::base::Float;
use crate::core::phonon::Phonon;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Flight {
    pub initial_theta: Float,
    /// Set only when the phonon reached the cold side.
    pub exit_theta: Option<Float>,
    pub travel_time: Option<Float>,
    /// Lengths of the free segments between diffuse or internal events.
    pub free_paths: Vec<Float>,
    /// The same segments projected onto the transport axis.
    pub free_paths_along_y: Vec<Float>,
    /// Frequency seen by each detector window, zero when not detected.
    pub detected_frequencies: [Float; 3],
    #[serde(skip)]
    free_path: Float,
    #[serde(skip)]
    free_path_along_y: Float,
}

impl Flight {
    pub fn new(phonon: &Phonon) -> Self {
        Flight {
            initial_theta: phonon.theta,
            exit_theta: None,
            travel_time: None,
            free_paths: Vec::new(),
            free_paths_along_y: Vec::new(),
            detected_frequencies: [0.0; 3],
            free_path: 0.0,
            free_path_along_y: 0.0,
        }
    }

    /// Extend the running segment by one free step.
    pub fn add_step(&mut self, phonon: &Phonon, dt: Float) {
        let step_length: Float = phonon.speed * dt;
        self.free_path += step_length;
        self.free_path_along_y +=
            step_length * phonon.phi.cos().abs() * phonon.theta.cos().abs();
    }

    /// Close the running segment and store it.
    pub fn save_free_path(&mut self) {
        self.free_paths.push(self.free_path);
        self.free_paths_along_y.push(self.free_path_along_y);
    }

    pub fn restart(&mut self) {
        self.free_path = 0.0;
        self.free_path_along_y = 0.0;
    }

    /// Record the exit state and query the detector windows.
    pub fn finish(&mut self, phonon: &Phonon, step: usize, cfg: &Config) {
        self.exit_theta = Some(phonon.theta);
        self.travel_time = Some(step as Float * cfg.timestep);
        let windows: [(Float, Float); 3] = [
            (cfg.frequency_detector_center, cfg.frequency_detector_size),
            (cfg.frequency_detector_2_center, cfg.frequency_detector_2_size),
            (cfg.frequency_detector_3_center, cfg.frequency_detector_3_size),
        ];
        for (slot, (center, size)) in self.detected_frequencies.iter_mut().zip(windows.iter()) {
            if (phonon.x - center).abs() < size / 2.0 {
                *slot = phonon.frequency;
            }
        }
    }

    /// Mean of the stored segments; zero when none were stored.
    pub fn mean_free_path(&self) -> Float {
        if self.free_paths.is_empty() {
            0.0
        } else {
            self.free_paths.iter().sum::<Float>() / self.free_paths.len() as Float
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::phonon::Polarization;

    fn phonon() -> Phonon {
        Phonon {
            x: 0.0,
            y: 0.0,
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
    fn straight_segments_project_fully_onto_y() {
        let p = phonon();
        let mut flight = Flight::new(&p);
        for _ in 0..4 {
            flight.add_step(&p, 0.5e-12);
        }
        flight.save_free_path();
        assert!((flight.free_paths[0] - 4.0 * 3.0e-9).abs() < 1e-18);
        assert!((flight.free_paths_along_y[0] - flight.free_paths[0]).abs() < 1e-18);
    }

    #[test]
    fn restart_resets_only_the_running_segment() {
        let p = phonon();
        let mut flight = Flight::new(&p);
        flight.add_step(&p, 0.5e-12);
        flight.save_free_path();
        flight.restart();
        flight.add_step(&p, 0.5e-12);
        flight.save_free_path();
        assert_eq!(flight.free_paths.len(), 2);
        assert!((flight.mean_free_path() - 3.0e-9).abs() < 1e-18);
    }

    #[test]
    fn finish_records_detector_hits() {
        let mut cfg = Config::default();
        cfg.frequency_detector_size = 1.0e-7;
        cfg.frequency_detector_2_center = 1.0e-7;
        cfg.frequency_detector_2_size = 1.0e-8;
        let mut p = phonon();
        p.x = 1.0e-8;
        let mut flight = Flight::new(&p);
        flight.finish(&p, 100, &cfg);
        assert_eq!(flight.travel_time, Some(100.0 * cfg.timestep));
        // inside window 1, outside window 2, window 3 has zero size
        assert_eq!(flight.detected_frequencies[0], p.frequency);
        assert_eq!(flight.detected_frequencies[1], 0.0);
        assert_eq!(flight.detected_frequencies[2], 0.0);
    }
}
