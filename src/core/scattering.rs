//! Surface scattering: the specular-vs-diffuse decision at every boundary.
//!
//! One call per timestep runs the passes in a fixed order: holes, pillar
//! cone walls, sidewalls, the top surface (with pillar-footprint handling),
//! the bottom surface, and finally wraps theta back into (-pi, pi]. Within
//! the hole and pillar passes the first obstacle hit wins. Each pass tests
//! the tentative step computed from the current angles, so an earlier
//! deflection changes what the later passes see. Obstacles deliberately take
//! precedence over the outer boundaries.

// std
use std::f64::consts::PI;

// others
use rand::Rng;

// phonoray
use crate::config::Config;
use crate::core::base::{wrap_theta, Float, PI_OVER_2};
use crate::core::phonon::Phonon;
use crate::core::rng::PhononRng;
use crate::core::sampling::lambert_offset;
use crate::shapes::{pillar, Obstacle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScatterKind {
    Specular,
    Diffuse,
}

/// Outgoing direction of one surface interaction.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceEvent {
    pub theta: Float,
    pub phi: Float,
    pub kind: ScatterKind,
}

/// Ziman specularity probability, p = exp(-16 pi^2 s^2 cos^2(a) / l^2).
pub fn specularity(roughness: Float, alpha: Float, wavelength: Float) -> Float {
    let cos_alpha: Float = alpha.cos();
    (-16.0 * PI * PI * roughness * roughness * cos_alpha * cos_alpha
        / (wavelength * wavelength))
        .exp()
}

/// What happened at each surface class during one step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceScatteringTypes {
    pub walls: Option<ScatterKind>,
    pub top_bottom: Option<ScatterKind>,
    pub holes: Option<ScatterKind>,
    pub pillars: Option<ScatterKind>,
}

impl SurfaceScatteringTypes {
    pub fn is_diffuse(&self) -> bool {
        [self.walls, self.top_bottom, self.holes, self.pillars]
            .iter()
            .any(|kind| *kind == Some(ScatterKind::Diffuse))
    }

    pub fn is_any(&self) -> bool {
        [self.walls, self.top_bottom, self.holes, self.pillars]
            .iter()
            .any(|kind| kind.is_some())
    }
}

fn side_wall_scattering(
    phonon: &mut Phonon,
    cfg: &Config,
    rng: &mut PhononRng,
) -> Option<ScatterKind> {
    let (tx, _, _) = phonon.step_position(cfg.timestep);
    let hits_right: bool = tx > cfg.width / 2.0 && cfg.include_right_sidewall;
    let hits_left: bool = tx < -cfg.width / 2.0 && cfg.include_left_sidewall;
    if !hits_right && !hits_left {
        return None;
    }
    let alpha: Float = (phonon.phi.cos() * phonon.theta.abs().sin()).acos();
    if rng.gen::<Float>() < specularity(cfg.side_wall_roughness, alpha, phonon.wavelength()) {
        phonon.theta = -phonon.theta;
        Some(ScatterKind::Specular)
    } else {
        phonon.theta = -phonon.theta.sin().signum() * PI_OVER_2 + lambert_offset(rng);
        phonon.phi = lambert_offset(rng);
        Some(ScatterKind::Diffuse)
    }
}

/// Mirror or re-emit at a horizontal surface (top, bottom, or pillar top);
/// the incidence angle is measured from the vertical.
fn horizontal_surface_event(
    phonon: &mut Phonon,
    roughness: Float,
    rng: &mut PhononRng,
) -> ScatterKind {
    let alpha: Float = PI_OVER_2 - phonon.phi;
    if rng.gen::<Float>() < specularity(roughness, alpha, phonon.wavelength()) {
        phonon.phi = -phonon.phi;
        ScatterKind::Specular
    } else {
        phonon.phi = -phonon.phi.sin().signum() * PI_OVER_2 + lambert_offset(rng);
        phonon.theta = -PI + 2.0 * PI * rng.gen::<Float>();
        ScatterKind::Diffuse
    }
}

fn top_scattering(phonon: &mut Phonon, cfg: &Config, rng: &mut PhononRng) -> Option<ScatterKind> {
    let (tx, ty, tz) = phonon.step_position(cfg.timestep);
    if tz <= cfg.thickness / 2.0 {
        return None;
    }
    if !cfg.include_pillars {
        return Some(horizontal_surface_event(phonon, cfg.top_roughness, rng));
    }
    match cfg.pillars().find(|o| o.footprint_contains(tx, ty)) {
        Some(Obstacle::Pillar { height, .. }) => {
            if tz > cfg.thickness / 2.0 + height {
                // leaving through the pillar top
                Some(horizontal_surface_event(phonon, cfg.pillar_top_roughness, rng))
            } else {
                // inside the pillar body; the cone wall owns its boundary
                None
            }
        }
        _ => {
            if phonon.z <= cfg.thickness / 2.0 {
                // crossing the membrane top from inside the slab
                Some(horizontal_surface_event(phonon, cfg.top_roughness, rng))
            } else {
                // already above the membrane next to a pillar
                None
            }
        }
    }
}

fn bottom_scattering(
    phonon: &mut Phonon,
    cfg: &Config,
    rng: &mut PhononRng,
) -> Option<ScatterKind> {
    let (_, _, tz) = phonon.step_position(cfg.timestep);
    if tz < -cfg.thickness / 2.0 {
        Some(horizontal_surface_event(phonon, cfg.bottom_roughness, rng))
    } else {
        None
    }
}

/// Run all surface passes for one timestep, mutating the phonon direction
/// in place and reporting which surface classes scattered.
pub fn surface_scattering(
    phonon: &mut Phonon,
    cfg: &Config,
    rng: &mut PhononRng,
) -> SurfaceScatteringTypes {
    let mut types = SurfaceScatteringTypes::default();
    let dt: Float = cfg.timestep;

    if cfg.include_holes {
        let (tx, ty, _) = phonon.step_position(dt);
        let step_length: Float = phonon.speed * dt;
        for obstacle in cfg.holes() {
            if let Some(event) = obstacle.scatter_as_hole(
                tx,
                ty,
                step_length,
                phonon.theta,
                phonon.phi,
                phonon.wavelength(),
                cfg.hole_roughness,
                rng,
            ) {
                phonon.theta = event.theta;
                phonon.phi = event.phi;
                types.holes = Some(event.kind);
                break;
            }
        }
    }

    if cfg.include_pillars {
        // the direction parametrisation is symmetric under phi -> phi -+ pi,
        // so fold phi into its principal range before the cone tests
        if phonon.phi.abs() > PI_OVER_2 {
            phonon.phi -= phonon.phi.signum() * PI;
        }
        let (px, py) = (phonon.x, phonon.y);
        let (tx, ty, tz) = phonon.step_position(dt);
        for obstacle in cfg.pillars() {
            if let Obstacle::Pillar {
                x,
                y,
                base_radius,
                wall_angle,
                ..
            } = *obstacle
            {
                if let Some(event) = pillar::scatter(
                    x,
                    y,
                    base_radius,
                    wall_angle,
                    px,
                    py,
                    tx,
                    ty,
                    tz,
                    phonon.speed * dt,
                    cfg.thickness,
                    phonon.theta,
                    phonon.phi,
                    phonon.wavelength(),
                    cfg.pillar_roughness,
                    rng,
                ) {
                    phonon.theta = event.theta;
                    phonon.phi = event.phi;
                    types.pillars = Some(event.kind);
                    break;
                }
            }
        }
    }

    types.walls = side_wall_scattering(phonon, cfg, rng);
    types.top_bottom = top_scattering(phonon, cfg, rng);
    if let Some(kind) = bottom_scattering(phonon, cfg, rng) {
        types.top_bottom = Some(kind);
    }
    phonon.theta = wrap_theta(phonon.theta);
    types
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::phonon::Polarization;
    use crate::core::rng::seeded_for;

    fn phonon_at(x: Float, y: Float, z: Float, theta: Float, phi: Float) -> Phonon {
        Phonon {
            x,
            y,
            z,
            theta,
            phi,
            frequency: 2.0e12,
            polarization: Polarization::La,
            speed: 6000.0,
            time_since_previous_scattering: 0.0,
            time_of_internal_scattering: 1.0,
        }
    }

    #[test]
    fn specularity_is_a_probability() {
        for &roughness in &[0.0, 0.2e-9, 2.0e-9, 10.0e-9] {
            for i in 0..64 {
                let alpha: Float = -PI_OVER_2 + PI * i as Float / 63.0;
                for &wavelength in &[0.5e-9, 3.0e-9, 50.0e-9] {
                    let p = specularity(roughness, alpha, wavelength);
                    assert!((0.0..=1.0).contains(&p), "p = {}", p);
                }
            }
        }
    }

    #[test]
    fn kernel_reports_nothing_in_free_flight() {
        let cfg = Config::default();
        let mut rng = seeded_for(17, 0);
        let mut p = phonon_at(0.0, 2.0e-7, 0.0, 0.4, 0.2);
        let types = surface_scattering(&mut p, &cfg, &mut rng);
        assert!(!types.is_any());
        assert_eq!(p.theta, 0.4);
        assert_eq!(p.phi, 0.2);
    }

    #[test]
    fn smooth_sidewall_mirrors_theta() {
        let mut cfg = Config::default();
        cfg.side_wall_roughness = 0.0;
        let mut rng = seeded_for(17, 1);
        // one step from the right wall, moving towards +x
        let theta: Float = 1.2;
        let mut p = phonon_at(cfg.width / 2.0 - 1.0e-9, 2.0e-7, 0.0, theta, 0.0);
        let types = surface_scattering(&mut p, &cfg, &mut rng);
        assert_eq!(types.walls, Some(ScatterKind::Specular));
        assert_eq!(p.theta, -theta);
        // mirroring twice restores the original direction
        p.x = cfg.width / 2.0 - 1.0e-9;
        p.theta = -p.theta;
        let before = p.theta;
        let types = surface_scattering(&mut p, &cfg, &mut rng);
        assert_eq!(types.walls, Some(ScatterKind::Specular));
        assert!((p.theta - (-before)).abs() < 1e-12);
    }

    #[test]
    fn smooth_top_and_bottom_mirror_phi() {
        let mut cfg = Config::default();
        cfg.top_roughness = 0.0;
        cfg.bottom_roughness = 0.0;
        let mut rng = seeded_for(17, 2);
        let mut p = phonon_at(0.0, 2.0e-7, cfg.thickness / 2.0 - 1.0e-10, 0.0, 0.5);
        let types = surface_scattering(&mut p, &cfg, &mut rng);
        assert_eq!(types.top_bottom, Some(ScatterKind::Specular));
        assert_eq!(p.phi, -0.5);
        let mut p = phonon_at(0.0, 2.0e-7, -cfg.thickness / 2.0 + 1.0e-10, 0.0, -0.5);
        let types = surface_scattering(&mut p, &cfg, &mut rng);
        assert_eq!(types.top_bottom, Some(ScatterKind::Specular));
        assert_eq!(p.phi, 0.5);
    }

    #[test]
    fn rough_sidewall_remits_into_the_slab() {
        let mut cfg = Config::default();
        cfg.side_wall_roughness = 1.0e-6; // diffuse with certainty
        let mut rng = seeded_for(17, 3);
        for _ in 0..200 {
            let mut p = phonon_at(cfg.width / 2.0 - 1.0e-9, 2.0e-7, 0.0, 1.2, 0.0);
            let types = surface_scattering(&mut p, &cfg, &mut rng);
            assert_eq!(types.walls, Some(ScatterKind::Diffuse));
            // re-emitted away from the right wall
            assert!(p.theta.sin() <= 0.0, "theta {}", p.theta);
            assert!(p.phi.abs() < PI_OVER_2);
        }
    }

    #[test]
    fn hole_pass_takes_precedence_over_walls() {
        let mut cfg = Config::default();
        cfg.include_holes = true;
        // a circle covering the right wall at this height
        cfg.obstacles = vec![Obstacle::Circle {
            x: cfg.width / 2.0,
            y: 2.0e-7,
            radius: 2.0e-8,
        }];
        let mut rng = seeded_for(17, 4);
        let mut p = phonon_at(cfg.width / 2.0 - 1.0e-9, 2.0e-7, 0.0, PI_OVER_2, 0.0);
        let types = surface_scattering(&mut p, &cfg, &mut rng);
        assert!(types.holes.is_some());
    }
}
