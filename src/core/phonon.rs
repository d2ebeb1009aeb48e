//! Mutable per-flight phonon state.
//!
//! A phonon is a classical quasi-particle: a position, a pair of direction
//! angles, and the (frequency, polarization, group speed) triple drawn from
//! bulk dispersion. The azimuth theta lies in (-pi, pi] and is measured from
//! the +y axis in the xy plane; phi is the out-of-plane angle.

// others
use serde::{Deserialize, Serialize};

// phonoray
use crate::core::base::Float;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarization {
    La,
    Ta,
}

#[derive(Clone, Debug)]
pub struct Phonon {
    pub x: Float,
    pub y: Float,
    pub z: Float,
    pub theta: Float,
    pub phi: Float,
    /// Cyclic frequency [Hz].
    pub frequency: Float,
    pub polarization: Polarization,
    /// Group speed [m/s].
    pub speed: Float,
    /// Time accumulated since the last diffuse or internal event.
    pub time_since_previous_scattering: Float,
    /// Scheduled time of the next internal relaxation event.
    pub time_of_internal_scattering: Float,
}

impl Phonon {
    pub fn wavelength(&self) -> Float {
        self.speed / self.frequency
    }

    /// Position after one free flight of duration `dt`, without committing it.
    /// Surface tests run against this tentative position.
    pub fn step_position(&self, dt: Float) -> (Float, Float, Float) {
        let step: Float = self.speed * dt;
        (
            self.x + self.theta.sin() * self.phi.cos().abs() * step,
            self.y + self.theta.cos() * self.phi.cos().abs() * step,
            self.z + self.phi.sin() * step,
        )
    }

    pub fn advance(&mut self, dt: Float) {
        let (x, y, z) = self.step_position(dt);
        self.x = x;
        self.y = y;
        self.z = z;
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.z.is_finite()
            && self.theta.is_finite()
            && self.phi.is_finite()
    }
}
