//! Scattering on triangular holes.
//!
//! Both orientations share the envelope test against the two slanted sides;
//! the flat side is recognised by the step crossing its plane with the
//! matching half-plane of travel directions.

// std
use std::f64::consts::PI;

// others
use rand::Rng;

// phonoray
use crate::core::base::{Float, PI_OVER_2};
use crate::core::rng::PhononRng;
use crate::core::sampling::lambert_offset;
use crate::core::scattering::{specularity, ScatterKind, SurfaceEvent};

/// Triangle pointing towards -y (flat side on top).
#[allow(clippy::too_many_arguments)]
pub fn scatter_down(
    cx: Float,
    cy: Float,
    side_x: Float,
    side_y: Float,
    tx: Float,
    ty: Float,
    step_length: Float,
    theta: Float,
    phi: Float,
    wavelength: Float,
    roughness: Float,
    rng: &mut PhononRng,
) -> Option<SurfaceEvent> {
    // tip half-angle
    let beta: Float = (0.5 * side_x / side_y).atan();
    let inside: bool = side_y / 2.0 - (ty - cy) <= (side_x / 2.0 - (tx - cx).abs()) / beta.tan()
        && (ty - cy).abs() < side_y / 2.0;
    if !inside {
        return None;
    }
    if ty + step_length > cy + side_y / 2.0 && theta.abs() > PI_OVER_2 {
        // flat top side
        let alpha: Float = (phi.cos() * theta.cos()).acos();
        if rng.gen::<Float>() < specularity(roughness, alpha, wavelength) {
            Some(SurfaceEvent {
                theta: theta.signum() * PI - theta,
                phi,
                kind: ScatterKind::Specular,
            })
        } else {
            Some(SurfaceEvent {
                theta: lambert_offset(rng),
                phi: lambert_offset(rng),
                kind: ScatterKind::Diffuse,
            })
        }
    } else {
        // slanted sides
        let side: Float = (tx - cx).signum();
        let alpha: Float = (phi.cos() * (theta - side * (PI_OVER_2 - beta)).cos()).acos();
        if rng.gen::<Float>() < specularity(roughness, alpha, wavelength) {
            Some(SurfaceEvent {
                theta: -theta + side * 2.0 * beta,
                phi,
                kind: ScatterKind::Specular,
            })
        } else {
            let rand_sign: Float = (2.0 * rng.gen::<Float>() - 1.0).signum();
            Some(SurfaceEvent {
                theta: rand_sign * PI - rand_sign * rng.gen::<Float>().asin()
                    - side * (PI_OVER_2 - beta),
                phi: lambert_offset(rng),
                kind: ScatterKind::Diffuse,
            })
        }
    }
}

/// Triangle pointing towards +y (flat side at the bottom).
#[allow(clippy::too_many_arguments)]
pub fn scatter_up(
    cx: Float,
    cy: Float,
    side_x: Float,
    side_y: Float,
    tx: Float,
    ty: Float,
    step_length: Float,
    theta: Float,
    phi: Float,
    wavelength: Float,
    roughness: Float,
    rng: &mut PhononRng,
) -> Option<SurfaceEvent> {
    let beta: Float = (0.5 * side_x / side_y).atan();
    let inside: bool = side_y / 2.0 + (ty - cy) <= (side_x / 2.0 - (tx - cx).abs()) / beta.tan()
        && (ty - cy).abs() < side_y / 2.0;
    if !inside {
        return None;
    }
    if ty - step_length < cy - side_y / 2.0 && theta.abs() < PI_OVER_2 {
        // flat bottom side
        let alpha: Float = (phi.cos() * theta.cos()).acos();
        if rng.gen::<Float>() < specularity(roughness, alpha, wavelength) {
            Some(SurfaceEvent {
                theta: theta.signum() * PI - theta,
                phi,
                kind: ScatterKind::Specular,
            })
        } else {
            let rand_sign: Float = (2.0 * rng.gen::<Float>() - 1.0).signum();
            Some(SurfaceEvent {
                theta: rand_sign * PI - rand_sign * rng.gen::<Float>().asin(),
                phi: lambert_offset(rng),
                kind: ScatterKind::Diffuse,
            })
        }
    } else {
        // slanted sides
        let side: Float = (tx - cx).signum();
        let alpha: Float = (phi.cos() * (theta + side * (PI_OVER_2 - beta)).cos()).acos();
        if rng.gen::<Float>() < specularity(roughness, alpha, wavelength) {
            Some(SurfaceEvent {
                theta: -theta - side * 2.0 * beta,
                phi,
                kind: ScatterKind::Specular,
            })
        } else {
            Some(SurfaceEvent {
                theta: lambert_offset(rng) + side * (PI_OVER_2 - beta),
                phi: lambert_offset(rng),
                kind: ScatterKind::Diffuse,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::seeded_for;

    const LAM: Float = 3.0e-9;
    const LX: Float = 1.5e-7;
    const LY: Float = 2.0e-7;

    #[test]
    fn outside_envelope_returns_none() {
        let mut rng = seeded_for(5, 0);
        // inside the bounding box but above the slanted side of the
        // downward triangle (near its lower-left corner)
        let hit = scatter_down(
            0.0, 0.0, LX, LY, -7.0e-8, -9.0e-8, 3.0e-9, 0.0, 0.0, LAM, 0.0, &mut rng,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn tip_of_down_triangle_is_inside() {
        let mut rng = seeded_for(5, 0);
        let hit = scatter_down(
            0.0, 0.0, LX, LY, 0.0, 9.5e-8, 3.0e-9, 0.3, 0.0, LAM, 0.0, &mut rng,
        );
        assert!(hit.is_some());
    }

    #[test]
    fn slanted_side_mirror_is_involutive_about_beta() {
        let beta: Float = (0.5 * LX / LY).atan();
        let mut rng = seeded_for(5, 1);
        let theta: Float = 0.4;
        let hit = scatter_up(
            0.0, 0.0, LX, LY, 3.0e-8, 0.0, 3.0e-9, theta, 0.0, LAM, 0.0, &mut rng,
        )
        .expect("inside the triangle");
        assert_eq!(hit.kind, ScatterKind::Specular);
        assert!((hit.theta - (-theta - 2.0 * beta)).abs() < 1e-12);
    }
}
