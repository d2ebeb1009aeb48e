//! Monte Carlo phonon transport in nanostructured membranes.
//!
//! An ensemble of independent phonons is launched from a hot source into a
//! thin slab perforated by holes and pillars. Each phonon is ray-traced
//! through a time-stepped loop with stochastic specular-vs-diffuse decisions
//! at every boundary and an exponential internal relaxation clock; the
//! trajectories accumulate into thermal maps, flux and temperature profiles,
//! free-path statistics, and (in dispersion-sweep mode) an effective thermal
//! conductivity.
//!
//! The library performs no I/O: it consumes a [`config::Config`] and emits
//! per-flight records plus merged accumulators through
//! [`integrators::Simulation`].

pub mod config;
pub mod core;
pub mod integrators;
pub mod materials;
pub mod shapes;
