//! Scattering on the cone wall of circular pillars standing on the membrane.
//!
//! A pillar is a truncated cone: its radius shrinks with height above the
//! membrane top. The wall test brackets the boundary in a band two steps
//! wide, and the reflection tilts the out-of-plane angle to account for the
//! inclined wall. Whether the phonon moves towards or away from the axis
//! selects between the analytic reflection cases.

// std
use std::f64::consts::PI;

// others
use rand::Rng;

// phonoray
use crate::core::base::{Float, PI_OVER_2};
use crate::core::rng::PhononRng;
use crate::core::sampling::lambert_offset;
use crate::core::scattering::{specularity, ScatterKind, SurfaceEvent};

#[allow(clippy::too_many_arguments)]
pub fn scatter(
    cx: Float,
    cy: Float,
    base_radius: Float,
    wall_angle: Float,
    px: Float,
    py: Float,
    tx: Float,
    ty: Float,
    tz: Float,
    step_length: Float,
    thickness: Float,
    theta: Float,
    phi: Float,
    wavelength: Float,
    roughness: Float,
    rng: &mut PhononRng,
) -> Option<SurfaceEvent> {
    // cone radius at the tentative height
    let radius: Float = base_radius - (tz - thickness / 2.0) / wall_angle.tan();
    let dx: Float = tx - cx;
    let dy: Float = ty - cy;
    let distance_sq: Float = dx * dx + dy * dy;
    let band: Float = radius + 2.0 * step_length;
    if !(tz > thickness / 2.0 && distance_sq >= radius * radius && distance_sq < band * band) {
        return None;
    }
    let tangent_theta: Float = (dx / dy).atan();
    let alpha: Float = (phi.cos() * (theta + dy.signum() * tangent_theta).cos()).acos();
    let tilt: Float = PI_OVER_2 - wall_angle;
    if rng.gen::<Float>() < specularity(roughness, alpha, wavelength) {
        let previous_sq: Float = (px - cx) * (px - cx) + (py - cy) * (py - cy);
        let event = if distance_sq >= previous_sq {
            // moving from the axis towards the wall
            if phi < PI_OVER_2 - 2.0 * wall_angle {
                // too steep to turn back; the wall only deflects phi
                SurfaceEvent {
                    theta,
                    phi: phi - tilt,
                    kind: ScatterKind::Specular,
                }
            } else {
                SurfaceEvent {
                    theta: -theta - PI + 2.0 * tangent_theta,
                    phi: phi - tilt,
                    kind: ScatterKind::Specular,
                }
            }
        } else {
            // struck the wall while moving towards the axis
            SurfaceEvent {
                theta,
                phi: -phi.signum() * phi - 2.0 * wall_angle,
                kind: ScatterKind::Specular,
            }
        };
        Some(event)
    } else {
        let new_theta: Float = if ty >= cy {
            tangent_theta + PI - lambert_offset(rng)
        } else {
            tangent_theta - lambert_offset(rng)
        };
        Some(SurfaceEvent {
            theta: new_theta,
            phi: lambert_offset(rng) - tilt,
            kind: ScatterKind::Diffuse,
        })
    }
}
