pub mod base;
pub mod dispersion;
pub mod film;
pub mod flight;
pub mod phonon;
pub mod relaxation;
pub mod rng;
pub mod sampling;
pub mod scattering;
