//! Draw random samples from the distributions the transport loop needs:
//! Planck-weighted phonon frequencies, source positions and directions, and
//! the Lambert cosine law used by every diffuse surface.

// std
use std::f64::consts::PI;

// others
use rand::Rng;

// phonoray
use crate::config::{AngularDistribution, Config};
use crate::core::base::{wrap_theta, Float, HBAR, K_B, PI_OVER_2, POSITION_GUARD};
use crate::core::dispersion::Dispersion;
use crate::core::phonon::Polarization;
use crate::core::rng::PhononRng;
use crate::materials::Material;

/// Reference speed of the Debye approximation [m/s]; enters only the
/// envelope of the rejection sampler.
const DEBYE_SPEED: Float = 6000.0;

/// Angular offset of the Lambert cosine law: asin(2u - 1) is distributed
/// with density cos(a)/2 on (-pi/2, pi/2).
pub fn lambert_offset(rng: &mut PhononRng) -> Float {
    (2.0 * rng.gen::<Float>() - 1.0).asin()
}

#[derive(Clone, Copy, Debug)]
pub struct PhononSample {
    pub frequency: Float,
    pub polarization: Polarization,
    pub speed: Float,
}

/// Spectral energy density of the Planck distribution in the Debye
/// approximation, up to constant factors shared with its maximum.
fn planck_energy_density(f: Float, temperature: Float) -> Float {
    let omega: Float = 2.0 * PI * f;
    let dos: Float = 3.0 * omega * omega / (2.0 * PI * PI * DEBYE_SPEED.powi(3));
    let occupancy: Float = 1.0 / ((HBAR * omega / (K_B * temperature)).exp() - 1.0);
    dos * HBAR * omega * occupancy
}

/// Rejection-sample a phonon frequency from the Planck distribution at the
/// given temperature, pick one of the three branches, and look up the group
/// velocity. Frequencies above what the dispersion can represent are
/// rejected; a TA pick above the TA branch cut falls back to LA.
pub fn sample_planck_phonon(
    dispersion: &Dispersion,
    material: &Material,
    temperature: Float,
    rng: &mut PhononRng,
) -> PhononSample {
    // peak of the distribution, for normalization
    let f_peak: Float = 2.82 * K_B * temperature / (2.0 * PI * HBAR);
    let density_max: Float = planck_energy_density(f_peak, temperature);
    let f_cut: Float = dispersion.max_la_frequency();
    loop {
        let f: Float = 5.0 * f_peak * rng.gen::<Float>();
        if f <= 0.0 {
            continue;
        }
        let acceptance: Float = planck_energy_density(f, temperature) / density_max;
        if rng.gen::<Float>() < acceptance && f < f_cut {
            // two TA branches and one LA branch
            let wants_ta: bool = rng.gen_range(0..3) < 2;
            let polarization = if wants_ta && f < material.dispersion.ta_frequency_cut {
                Polarization::Ta
            } else {
                Polarization::La
            };
            let j: usize = dispersion.nearest_index(polarization, f);
            return PhononSample {
                frequency: f,
                polarization,
                speed: dispersion.group_velocity(polarization, j),
            };
        }
    }
}

/// Uniform position inside the source rectangle. The 0.4 factor keeps the
/// seed point away from the walls, and y is floored just inside the slab.
pub fn source_position(cfg: &Config, rng: &mut PhononRng) -> (Float, Float, Float) {
    let x: Float =
        cfg.phonon_source_x + 0.4 * cfg.phonon_source_width_x * (2.0 * rng.gen::<Float>() - 1.0);
    let y: Float =
        cfg.phonon_source_y + 0.4 * cfg.phonon_source_width_y * (2.0 * rng.gen::<Float>() - 1.0);
    let z: Float = 0.4 * cfg.thickness * (2.0 * rng.gen::<Float>() - 1.0);
    (x, y.max(POSITION_GUARD), z)
}

/// Initial direction of a freshly emitted phonon.
pub fn source_direction(distribution: AngularDistribution, rng: &mut PhononRng) -> (Float, Float) {
    match distribution {
        AngularDistribution::RandomUp => (
            -PI_OVER_2 + PI * rng.gen::<Float>(),
            -PI_OVER_2 + PI * rng.gen::<Float>(),
        ),
        AngularDistribution::RandomDown => (
            wrap_theta(PI_OVER_2 + PI * rng.gen::<Float>()),
            -PI_OVER_2 + PI * rng.gen::<Float>(),
        ),
        AngularDistribution::RandomRight => {
            (PI * rng.gen::<Float>(), -PI_OVER_2 + PI * rng.gen::<Float>())
        }
        AngularDistribution::RandomLeft => {
            (-PI * rng.gen::<Float>(), -PI_OVER_2 + PI * rng.gen::<Float>())
        }
        AngularDistribution::Lambert => (lambert_offset(rng), lambert_offset(rng)),
        AngularDistribution::Directional => (0.0, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dispersion::DISPERSION_POINTS;
    use crate::core::rng::seeded_for;
    use crate::materials::MaterialTag;

    #[test]
    fn lambert_offsets_follow_the_cosine_law() {
        let mut rng = seeded_for(11, 0);
        const DRAWS: usize = 20_000_000;
        const BINS: usize = 36; // 5 degree bins over (-90, 90)
        let mut counts = [0u64; BINS];
        for _ in 0..DRAWS {
            let a = lambert_offset(&mut rng);
            let bin = (((a + PI_OVER_2) / PI) * BINS as Float) as usize;
            counts[bin.min(BINS - 1)] += 1;
        }
        for (i, &count) in counts.iter().enumerate() {
            let lo: Float = -PI_OVER_2 + PI * i as Float / BINS as Float;
            let hi: Float = -PI_OVER_2 + PI * (i + 1) as Float / BINS as Float;
            // integral of cos(a)/2 over the bin
            let expected: Float = (hi.sin() - lo.sin()) / 2.0;
            let observed: Float = count as Float / DRAWS as Float;
            assert!(
                (observed - expected).abs() / expected < 0.02,
                "bin {}: observed {} expected {}",
                i,
                observed,
                expected
            );
        }
    }

    #[test]
    fn planck_samples_respect_the_branch_cuts() {
        let material = Material::from_tag(MaterialTag::Si);
        let dispersion = Dispersion::new(&material, DISPERSION_POINTS);
        let mut rng = seeded_for(11, 1);
        let f_cut = dispersion.max_la_frequency();
        for _ in 0..2000 {
            let s = sample_planck_phonon(&dispersion, &material, 300.0, &mut rng);
            assert!(s.frequency > 0.0 && s.frequency < f_cut);
            assert!(s.speed > 0.0 && s.speed < 9000.0);
            if s.polarization == Polarization::Ta {
                assert!(s.frequency < material.dispersion.ta_frequency_cut);
            }
        }
    }

    #[test]
    fn source_position_stays_inside_the_rectangle() {
        let cfg = Config::default();
        let mut rng = seeded_for(11, 2);
        for _ in 0..1000 {
            let (x, y, z) = source_position(&cfg, &mut rng);
            assert!(x.abs() <= 0.4 * cfg.width + 1e-15);
            assert!(y >= POSITION_GUARD);
            assert!(z.abs() <= 0.4 * cfg.thickness + 1e-15);
        }
    }

    #[test]
    fn directions_point_into_the_right_half_planes() {
        let mut rng = seeded_for(11, 3);
        for _ in 0..1000 {
            let (theta, phi) = source_direction(AngularDistribution::RandomUp, &mut rng);
            assert!(theta.abs() < PI_OVER_2 && phi.abs() < PI_OVER_2);
            let (theta, _) = source_direction(AngularDistribution::RandomDown, &mut rng);
            assert!(theta.abs() >= PI_OVER_2);
            let (theta, _) = source_direction(AngularDistribution::RandomRight, &mut rng);
            assert!((0.0..=PI).contains(&theta));
            let (theta, _) = source_direction(AngularDistribution::RandomLeft, &mut rng);
            assert!((-PI..=0.0).contains(&theta));
        }
        let (theta, phi) = source_direction(AngularDistribution::Directional, &mut rng);
        assert_eq!((theta, phi), (0.0, 0.0));
    }
}
