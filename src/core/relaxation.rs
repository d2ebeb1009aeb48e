//! Internal relaxation: umklapp and mass-impurity channels combined via
//! Matthiessen's rule, with an exponentially distributed time to the next
//! event. Ref. PRB 94, 174303 (2016).

// std
use std::f64::consts::PI;

// others
use rand::Rng;

// phonoray
use crate::config::Config;
use crate::core::base::Float;
use crate::core::phonon::Phonon;
use crate::core::rng::PhononRng;
use crate::materials::Material;

/// Combined relaxation time at the phonon's frequency.
pub fn internal_relaxation_time(material: &Material, temperature: Float, frequency: Float) -> Float {
    let omega: Float = 2.0 * PI * frequency;
    let impurity_rate: Float = material.impurity_coefficient * omega.powi(4);
    let umklapp_rate: Float = material.umklapp_coefficient
        * omega
        * omega
        * temperature
        * (-material.debye_temperature / temperature).exp();
    1.0 / (impurity_rate + umklapp_rate)
}

/// Frequency-independent relaxation time of the gray approximation.
pub fn gray_relaxation_time(mean_free_path: Float, speed: Float) -> Float {
    mean_free_path / speed
}

/// Exponentially distributed waiting time with mean `tau`.
pub fn draw_scattering_time(tau: Float, rng: &mut PhononRng) -> Float {
    // 1 - u lies in (0, 1], so the logarithm is finite
    -(1.0 - rng.gen::<Float>()).ln() * tau
}

/// Waiting time until this phonon's next internal event.
pub fn scheduled_time(
    cfg: &Config,
    material: &Material,
    phonon: &Phonon,
    rng: &mut PhononRng,
) -> Float {
    let tau: Float = if cfg.use_gray_approximation_mfp {
        gray_relaxation_time(cfg.gray_approximation_mfp, phonon.speed)
    } else {
        internal_relaxation_time(material, cfg.temperature, phonon.frequency)
    };
    draw_scattering_time(tau, rng)
}

/// Fire the internal clock if it is due: the direction is fully randomized.
/// Returns whether an event happened; the caller resets the timers.
pub fn internal_scattering(phonon: &mut Phonon, rng: &mut PhononRng) -> bool {
    if phonon.time_since_previous_scattering > phonon.time_of_internal_scattering {
        phonon.theta = -PI + 2.0 * PI * rng.gen::<Float>();
        phonon.phi = -PI + 2.0 * PI * rng.gen::<Float>();
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::phonon::Polarization;
    use crate::core::rng::seeded_for;
    use crate::materials::MaterialTag;

    #[test]
    fn matthiessen_combination_at_two_terahertz() {
        let si = Material::from_tag(MaterialTag::Si);
        let tau = internal_relaxation_time(&si, 300.0, 2.0e12);
        // dominated by umklapp at this frequency
        assert!(tau > 3.5e-10 && tau < 4.5e-10, "tau {}", tau);
        let omega: Float = 2.0 * PI * 2.0e12;
        let tau_impurity = 1.0 / (si.impurity_coefficient * omega.powi(4));
        assert!(tau < tau_impurity);
    }

    #[test]
    fn gray_time_is_path_over_speed() {
        assert!((gray_relaxation_time(100.0e-9, 5000.0) - 2.0e-11).abs() < 1e-24);
    }

    #[test]
    fn waiting_times_are_exponential() {
        let mut rng = seeded_for(13, 0);
        let tau: Float = 3.0e-10;
        const DRAWS: usize = 200_000;
        let mut sum: Float = 0.0;
        for _ in 0..DRAWS {
            let t = draw_scattering_time(tau, &mut rng);
            assert!(t >= 0.0 && t.is_finite());
            sum += t;
        }
        let mean = sum / DRAWS as Float;
        assert!((mean - tau).abs() / tau < 0.01, "mean {}", mean);
    }

    #[test]
    fn clock_fires_only_when_due() {
        let mut rng = seeded_for(13, 1);
        let mut p = Phonon {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            theta: 0.3,
            phi: 0.1,
            frequency: 2.0e12,
            polarization: Polarization::La,
            speed: 6000.0,
            time_since_previous_scattering: 0.0,
            time_of_internal_scattering: 1.0e-12,
        };
        assert!(!internal_scattering(&mut p, &mut rng));
        assert_eq!(p.theta, 0.3);
        p.time_since_previous_scattering = 2.0e-12;
        assert!(internal_scattering(&mut p, &mut rng));
        assert!(p.theta.abs() <= PI && p.phi.abs() <= PI);
    }
}
