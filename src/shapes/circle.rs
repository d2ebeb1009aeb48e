//! Scattering on circular holes.

// std
use std::f64::consts::PI;

// others
use rand::Rng;

// phonoray
use crate::core::base::Float;
use crate::core::rng::PhononRng;
use crate::core::sampling::lambert_offset;
use crate::core::scattering::{specularity, ScatterKind, SurfaceEvent};

/// Test the tentative position against the hole and, on a hit, draw the
/// outgoing direction. The incidence angle depends on whether the phonon
/// strikes the upper or lower half of the circle.
#[allow(clippy::too_many_arguments)]
pub fn scatter(
    cx: Float,
    cy: Float,
    radius: Float,
    tx: Float,
    ty: Float,
    theta: Float,
    phi: Float,
    wavelength: Float,
    roughness: Float,
    rng: &mut PhononRng,
) -> Option<SurfaceEvent> {
    let dx: Float = tx - cx;
    let dy: Float = ty - cy;
    if dx * dx + dy * dy > radius * radius {
        return None;
    }
    let tangent_theta: Float = (dx / dy).atan();
    let alpha: Float = (phi.cos() * (theta + dy.signum() * tangent_theta).cos()).acos();
    if rng.gen::<Float>() < specularity(roughness, alpha, wavelength) {
        Some(SurfaceEvent {
            theta: -theta - PI + 2.0 * tangent_theta,
            phi,
            kind: ScatterKind::Specular,
        })
    } else {
        let new_theta: Float = if ty >= cy {
            // upper half of the hole
            tangent_theta - lambert_offset(rng)
        } else {
            -PI + tangent_theta - lambert_offset(rng)
        };
        Some(SurfaceEvent {
            theta: new_theta,
            phi: lambert_offset(rng),
            kind: ScatterKind::Diffuse,
        })
    }
}
