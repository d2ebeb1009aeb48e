//! Obstacles perforating the membrane.
//!
//! The registry is a plain immutable list; the transport loop iterates it in
//! stable order and the first obstacle the tentative step lands in wins.
//! Each shape family owns its membership test and reflection rules in its
//! own file.

pub mod circle;
pub mod pillar;
pub mod rectangle;
pub mod triangle;

// others
use serde::{Deserialize, Serialize};

// phonoray
use crate::core::base::Float;
use crate::core::rng::PhononRng;
use crate::core::scattering::SurfaceEvent;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Obstacle {
    Circle {
        x: Float,
        y: Float,
        radius: Float,
    },
    Rectangle {
        x: Float,
        y: Float,
        side_x: Float,
        side_y: Float,
    },
    TriangleDown {
        x: Float,
        y: Float,
        side_x: Float,
        side_y: Float,
    },
    TriangleUp {
        x: Float,
        y: Float,
        side_x: Float,
        side_y: Float,
    },
    Pillar {
        x: Float,
        y: Float,
        base_radius: Float,
        height: Float,
        wall_angle: Float,
    },
}

impl Obstacle {
    pub fn is_pillar(&self) -> bool {
        matches!(self, Obstacle::Pillar { .. })
    }

    pub fn is_hole(&self) -> bool {
        !self.is_pillar()
    }

    /// Thinnest in-plane dimension; the caller's timestep must keep
    /// v_max * dt below this for the ray-marching membership tests to be
    /// reliable.
    pub fn min_feature_size(&self) -> Float {
        match *self {
            Obstacle::Circle { radius, .. } => 2.0 * radius,
            Obstacle::Rectangle { side_x, side_y, .. }
            | Obstacle::TriangleDown { side_x, side_y, .. }
            | Obstacle::TriangleUp { side_x, side_y, .. } => side_x.min(side_y),
            Obstacle::Pillar { base_radius, .. } => 2.0 * base_radius,
        }
    }

    /// Does the in-plane point sit under this pillar's base?
    pub fn footprint_contains(&self, px: Float, py: Float) -> bool {
        match *self {
            Obstacle::Pillar {
                x, y, base_radius, ..
            } => (px - x) * (px - x) + (py - y) * (py - y) <= base_radius * base_radius,
            _ => false,
        }
    }

    /// Hole-pass test against the tentative position. Pillars never match
    /// here; the pillar pass handles their cone wall separately.
    #[allow(clippy::too_many_arguments)]
    pub fn scatter_as_hole(
        &self,
        tx: Float,
        ty: Float,
        step_length: Float,
        theta: Float,
        phi: Float,
        wavelength: Float,
        roughness: Float,
        rng: &mut PhononRng,
    ) -> Option<SurfaceEvent> {
        match *self {
            Obstacle::Circle { x, y, radius } => {
                circle::scatter(x, y, radius, tx, ty, theta, phi, wavelength, roughness, rng)
            }
            Obstacle::Rectangle {
                x,
                y,
                side_x,
                side_y,
            } => rectangle::scatter(
                x, y, side_x, side_y, tx, ty, theta, phi, wavelength, roughness, rng,
            ),
            Obstacle::TriangleDown {
                x,
                y,
                side_x,
                side_y,
            } => triangle::scatter_down(
                x,
                y,
                side_x,
                side_y,
                tx,
                ty,
                step_length,
                theta,
                phi,
                wavelength,
                roughness,
                rng,
            ),
            Obstacle::TriangleUp {
                x,
                y,
                side_x,
                side_y,
            } => triangle::scatter_up(
                x,
                y,
                side_x,
                side_y,
                tx,
                ty,
                step_length,
                theta,
                phi,
                wavelength,
                roughness,
                rng,
            ),
            Obstacle::Pillar { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obstacle_kinds() {
        let hole = Obstacle::Circle {
            x: 0.0,
            y: 0.0,
            radius: 1.0,
        };
        let pillar = Obstacle::Pillar {
            x: 0.0,
            y: 0.0,
            base_radius: 1.0,
            height: 1.0,
            wall_angle: 1.0,
        };
        assert!(hole.is_hole() && !hole.is_pillar());
        assert!(pillar.is_pillar() && !pillar.is_hole());
    }

    #[test]
    fn footprint_only_applies_to_pillars() {
        let pillar = Obstacle::Pillar {
            x: 1.0,
            y: 0.0,
            base_radius: 0.5,
            height: 1.0,
            wall_angle: 1.0,
        };
        assert!(pillar.footprint_contains(1.2, 0.0));
        assert!(!pillar.footprint_contains(2.0, 0.0));
        let hole = Obstacle::Circle {
            x: 1.0,
            y: 0.0,
            radius: 0.5,
        };
        assert!(!hole.footprint_contains(1.0, 0.0));
    }

    #[test]
    fn obstacles_deserialize_from_tagged_json() {
        let json = r#"[
            {"shape": "circle", "x": 0.0, "y": 2.0e-7, "radius": 5.0e-8},
            {"shape": "pillar", "x": 0.0, "y": 2.0e-7, "base_radius": 5.0e-8,
             "height": 3.0e-8, "wall_angle": 1.0471975511965976}
        ]"#;
        let obstacles: Vec<Obstacle> = serde_json::from_str(json).unwrap();
        assert_eq!(obstacles.len(), 2);
        assert!(obstacles[0].is_hole());
        assert!(obstacles[1].is_pillar());
    }
}
