//! Scattering on rectangular holes.

// std
use std::f64::consts::PI;

// others
use rand::Rng;

// phonoray
use crate::core::base::{Float, PI_OVER_2};
use crate::core::rng::PhononRng;
use crate::core::sampling::lambert_offset;
use crate::core::scattering::{specularity, ScatterKind, SurfaceEvent};

/// Test the tentative position against the rectangle. Whether the vertical
/// side or the horizontal side was crossed follows from the intersection of
/// the incoming ray with the side plane.
#[allow(clippy::too_many_arguments)]
pub fn scatter(
    cx: Float,
    cy: Float,
    side_x: Float,
    side_y: Float,
    tx: Float,
    ty: Float,
    theta: Float,
    phi: Float,
    wavelength: Float,
    roughness: Float,
    rng: &mut PhononRng,
) -> Option<SurfaceEvent> {
    if (tx - cx).abs() > side_x / 2.0 || (ty - cy).abs() > side_y / 2.0 {
        return None;
    }
    // y coordinate of the crossing with the vertical side plane
    let y1: Float = (cy - ty) + theta.cos() * (side_x / 2.0 - (cx - tx).abs()) / theta.sin().abs();
    if y1.abs() <= side_y / 2.0 {
        // vertical sides
        let alpha: Float = (phi.cos() * theta.abs().sin()).acos();
        if rng.gen::<Float>() < specularity(roughness, alpha, wavelength) {
            Some(SurfaceEvent {
                theta: -theta,
                phi,
                kind: ScatterKind::Specular,
            })
        } else {
            Some(SurfaceEvent {
                theta: -theta.sin().signum() * PI_OVER_2 + lambert_offset(rng),
                phi: lambert_offset(rng),
                kind: ScatterKind::Diffuse,
            })
        }
    } else {
        // horizontal sides
        let alpha: Float = (phi.cos() * theta.cos()).acos();
        if rng.gen::<Float>() < specularity(roughness, alpha, wavelength) {
            Some(SurfaceEvent {
                theta: theta.signum() * PI - theta,
                phi,
                kind: ScatterKind::Specular,
            })
        } else {
            let new_theta: Float = if theta.abs() >= PI_OVER_2 {
                // upper side, re-emit towards +y
                lambert_offset(rng)
            } else {
                // lower side, re-emit towards -y
                let rand_sign: Float = (2.0 * rng.gen::<Float>() - 1.0).signum();
                rand_sign * PI - rand_sign * rng.gen::<Float>().asin()
            };
            Some(SurfaceEvent {
                theta: new_theta,
                phi: lambert_offset(rng),
                kind: ScatterKind::Diffuse,
            })
        }
    }
}
