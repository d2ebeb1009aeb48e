//! Immutable run configuration.
//!
//! Every parameter the engine reads lives here; a validated `Config` is
//! threaded by reference through all core calls, which is what keeps the
//! ensemble embarrassingly parallel. Input files are JSON with exactly these
//! field names; missing fields fall back to the demo defaults.

// std
use std::f64::consts::PI;
use std::str::FromStr;

// others
use anyhow::{bail, ensure, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

// phonoray
use crate::core::base::Float;
use crate::materials::{Material, MaterialTag};
use crate::shapes::Obstacle;

/// Angular distribution of the phonon source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum AngularDistribution {
    RandomUp,
    RandomDown,
    RandomRight,
    RandomLeft,
    Lambert,
    Directional,
}

impl AngularDistribution {
    pub fn valid_names() -> String {
        AngularDistribution::iter()
            .map(|d| d.to_string())
            .collect::<Vec<String>>()
            .join(", ")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    // general
    pub number_of_phonons: usize,
    /// Flights are simulated and merged in groups of this size; the merge
    /// order is fixed, so results do not depend on the thread count.
    pub number_of_phonons_in_a_group: usize,
    pub number_of_timesteps: usize,
    /// Bin count of the output histograms.
    pub number_of_nodes: usize,
    /// [s]
    pub timestep: Float,
    /// [K]
    pub temperature: Float,
    pub seed: u64,

    // system dimensions [m]
    pub width: Float,
    pub length: Float,
    pub thickness: Float,

    // material
    pub media: String,
    /// [J/kg/K]
    pub specific_heat_capacity: Float,
    /// [kg/m^3]
    pub material_density: Float,
    /// Override of the material preset [K].
    pub debye_temperature: Option<Float>,

    // phonon source
    pub phonon_source_x: Float,
    pub phonon_source_y: Float,
    pub phonon_source_width_x: Float,
    pub phonon_source_width_y: Float,
    pub phonon_source_angle_distribution: String,

    // sidewalls
    pub include_right_sidewall: bool,
    pub include_left_sidewall: bool,
    pub include_top_sidewall: bool,
    pub include_bottom_sidewall: bool,

    // cold and hot sides
    pub cold_side_position_top: bool,
    pub cold_side_position_bottom: bool,
    pub cold_side_position_right: bool,
    pub cold_side_position_left: bool,
    pub hot_side_position_top: bool,
    pub hot_side_position_bottom: bool,
    pub hot_side_position_right: bool,
    pub hot_side_position_left: bool,

    // roughness [m]
    pub side_wall_roughness: Float,
    pub hole_roughness: Float,
    pub pillar_roughness: Float,
    pub top_roughness: Float,
    pub bottom_roughness: Float,
    pub pillar_top_roughness: Float,

    // obstacles
    pub include_holes: bool,
    pub include_pillars: bool,
    pub obstacles: Vec<Obstacle>,

    // internal scattering
    pub include_internal_scattering: bool,
    pub use_gray_approximation_mfp: bool,
    /// [m], used only with the gray approximation.
    pub gray_approximation_mfp: Float,

    // maps and profiles
    pub number_of_pixels_x: usize,
    pub number_of_pixels_y: usize,
    pub number_of_timeframes: usize,
    /// Spread profile deposits over frames with a random step offset.
    pub randomize_timeframes: bool,

    // frequency detectors on the cold side
    pub frequency_detector_center: Float,
    pub frequency_detector_size: Float,
    pub frequency_detector_2_center: Float,
    pub frequency_detector_2_size: Float,
    pub frequency_detector_3_center: Float,
    pub frequency_detector_3_size: Float,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            number_of_phonons: 500,
            number_of_phonons_in_a_group: 100,
            number_of_timesteps: 40_000,
            number_of_nodes: 400,
            timestep: 0.5e-12,
            temperature: 300.0,
            seed: 0,
            width: 400.0e-9,
            length: 400.0e-9,
            thickness: 50.0e-9,
            media: String::from("Si"),
            specific_heat_capacity: 700.0,
            material_density: 2330.0,
            debye_temperature: None,
            phonon_source_x: 0.0,
            phonon_source_y: 0.0,
            phonon_source_width_x: 400.0e-9,
            phonon_source_width_y: 0.0,
            phonon_source_angle_distribution: String::from("random_up"),
            include_right_sidewall: true,
            include_left_sidewall: true,
            include_top_sidewall: false,
            include_bottom_sidewall: false,
            cold_side_position_top: true,
            cold_side_position_bottom: false,
            cold_side_position_right: false,
            cold_side_position_left: false,
            hot_side_position_top: false,
            hot_side_position_bottom: true,
            hot_side_position_right: false,
            hot_side_position_left: false,
            side_wall_roughness: 1.0e-9,
            hole_roughness: 2.0e-9,
            pillar_roughness: 2.0e-9,
            top_roughness: 0.2e-9,
            bottom_roughness: 0.2e-9,
            pillar_top_roughness: 2.0e-9,
            include_holes: false,
            include_pillars: false,
            obstacles: Vec::new(),
            include_internal_scattering: true,
            use_gray_approximation_mfp: false,
            gray_approximation_mfp: 0.0,
            number_of_pixels_x: 40,
            number_of_pixels_y: 40,
            number_of_timeframes: 20,
            randomize_timeframes: false,
            frequency_detector_center: 0.0,
            frequency_detector_size: 400.0e-9,
            frequency_detector_2_center: 0.0,
            frequency_detector_2_size: 0.0,
            frequency_detector_3_center: 0.0,
            frequency_detector_3_size: 0.0,
        }
    }
}

impl Config {
    pub fn material(&self) -> Result<Material> {
        let tag = match MaterialTag::from_str(&self.media) {
            Ok(tag) => tag,
            Err(_) => bail!(
                "material {:?} is not in the database; valid media: {}",
                self.media,
                MaterialTag::valid_names()
            ),
        };
        let mut material = Material::from_tag(tag);
        material.specific_heat_capacity = self.specific_heat_capacity;
        material.density = self.material_density;
        if let Some(theta_d) = self.debye_temperature {
            material.debye_temperature = theta_d;
        }
        Ok(material)
    }

    pub fn source_distribution(&self) -> Result<AngularDistribution> {
        match AngularDistribution::from_str(&self.phonon_source_angle_distribution) {
            Ok(d) => Ok(d),
            Err(_) => bail!(
                "unknown source angle distribution {:?}; valid distributions: {}",
                self.phonon_source_angle_distribution,
                AngularDistribution::valid_names()
            ),
        }
    }

    pub fn holes(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter().filter(|o| o.is_hole())
    }

    pub fn pillars(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter().filter(|o| o.is_pillar())
    }

    /// Clamp out-of-range source parameters (with a warning, as the
    /// reference behaviour) and reject configurations the engine cannot
    /// run. Must be called once before any flight starts.
    pub fn validate(&mut self) -> Result<()> {
        ensure!(self.number_of_phonons > 0, "number_of_phonons must be positive");
        ensure!(self.number_of_timesteps > 0, "number_of_timesteps must be positive");
        ensure!(self.number_of_nodes > 0, "number_of_nodes must be positive");
        ensure!(self.timestep > 0.0, "timestep must be positive");
        ensure!(self.temperature > 0.0, "temperature must be positive");
        ensure!(
            self.width > 0.0 && self.length > 0.0 && self.thickness > 0.0,
            "system dimensions must be positive"
        );
        ensure!(
            self.number_of_pixels_x > 0 && self.number_of_pixels_y > 0,
            "map resolution must be positive"
        );
        ensure!(self.number_of_timeframes > 0, "number_of_timeframes must be positive");
        if self.number_of_phonons_in_a_group == 0 {
            self.number_of_phonons_in_a_group = self.number_of_phonons;
        }
        if self.use_gray_approximation_mfp {
            ensure!(
                self.gray_approximation_mfp > 0.0,
                "gray_approximation_mfp must be positive when the gray approximation is enabled"
            );
        }

        // the material and distribution tags must parse
        let material = self.material()?;
        self.source_distribution()?;

        // each side carries at most one role
        self.check_side_roles("top", self.include_top_sidewall, self.hot_side_position_top, self.cold_side_position_top)?;
        self.check_side_roles(
            "bottom",
            self.include_bottom_sidewall,
            self.hot_side_position_bottom,
            self.cold_side_position_bottom,
        )?;
        self.check_side_roles(
            "right",
            self.include_right_sidewall,
            self.hot_side_position_right,
            self.cold_side_position_right,
        )?;
        self.check_side_roles(
            "left",
            self.include_left_sidewall,
            self.hot_side_position_left,
            self.cold_side_position_left,
        )?;
        if !(self.cold_side_position_top
            || self.cold_side_position_bottom
            || self.cold_side_position_right
            || self.cold_side_position_left)
        {
            warn!("no cold side is set; flights can only end at the timestep cap");
        }

        // source rectangle inside the slab
        if self.phonon_source_y > self.length {
            warn!("phonon_source_y exceeds the length; clamping");
            self.phonon_source_y = self.length;
        }
        if self.phonon_source_y < 0.0 {
            warn!("phonon_source_y was negative; clamping to zero");
            self.phonon_source_y = 0.0;
        }
        if self.phonon_source_y - self.phonon_source_width_y / 2.0 < 0.0 {
            self.phonon_source_width_y = self.phonon_source_y * 2.0;
        }
        if self.phonon_source_x.abs() > self.width / 2.0 {
            warn!("phonon_source_x lies outside the slab; centering the source");
            self.phonon_source_x = 0.0;
        }
        if self.phonon_source_width_x > self.width {
            warn!("phonon_source_width_x exceeds the width; clamping");
            self.phonon_source_width_x = self.width;
        }

        for obstacle in &self.obstacles {
            if let Obstacle::Pillar { wall_angle, height, .. } = obstacle {
                ensure!(
                    *wall_angle > 0.0 && *wall_angle <= PI / 2.0,
                    "pillar wall angle must lie in (0, pi/2]"
                );
                ensure!(*height > 0.0, "pillar height must be positive");
            }
        }
        if self.include_holes && self.holes().next().is_none() {
            warn!("include_holes is set but the obstacle list contains no holes");
        }
        if self.include_pillars && self.pillars().next().is_none() {
            warn!("include_pillars is set but the obstacle list contains no pillars");
        }

        // ray-marching membership tests miss features thinner than one step
        let v_max: Float = 2.0 * PI * material.dispersion.la[0];
        let step: Float = v_max * self.timestep;
        for obstacle in &self.obstacles {
            if obstacle.min_feature_size() < step {
                warn!(
                    "an obstacle feature ({:.3e} m) is thinner than the fastest step ({:.3e} m); \
                     reduce the timestep to avoid missed collisions",
                    obstacle.min_feature_size(),
                    step
                );
            }
        }
        Ok(())
    }

    fn check_side_roles(&self, name: &str, wall: bool, hot: bool, cold: bool) -> Result<()> {
        if (wall && hot) || (wall && cold) || (hot && cold) {
            bail!("the {} side is assigned multiple functions", name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let mut cfg = Config::default();
        cfg.validate().unwrap();
    }

    #[test]
    fn conflicting_side_roles_are_rejected() {
        let mut cfg = Config::default();
        cfg.include_top_sidewall = true; // top is already the cold side
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_material_is_rejected() {
        let mut cfg = Config::default();
        cfg.media = String::from("Unobtainium");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_distribution_is_rejected() {
        let mut cfg = Config::default();
        cfg.phonon_source_angle_distribution = String::from("sideways");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn source_rectangle_is_clamped() {
        let mut cfg = Config::default();
        cfg.phonon_source_y = 2.0 * cfg.length;
        cfg.phonon_source_width_x = 2.0 * cfg.width;
        cfg.validate().unwrap();
        assert_eq!(cfg.phonon_source_y, cfg.length);
        assert_eq!(cfg.phonon_source_width_x, cfg.width);
    }

    #[test]
    fn gray_approximation_requires_a_mean_free_path() {
        let mut cfg = Config::default();
        cfg.use_gray_approximation_mfp = true;
        cfg.gray_approximation_mfp = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = Config::default();
        let text = serde_json::to_string(&cfg).unwrap();
        let back: Config = serde_json::from_str(&text).unwrap();
        assert_eq!(back.number_of_phonons, cfg.number_of_phonons);
        assert_eq!(back.width, cfg.width);
    }

    #[test]
    fn distribution_names_parse() {
        for name in &[
            "random_up",
            "random_down",
            "random_right",
            "random_left",
            "lambert",
            "directional",
        ] {
            assert!(AngularDistribution::from_str(name).is_ok(), "{}", name);
        }
    }
}
