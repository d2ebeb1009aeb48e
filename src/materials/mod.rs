//! Material records: bulk dispersion fits and relaxation constants.

// others
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

// phonoray
use crate::core::base::Float;

/// Supported media. Tags parse from the lowercase/exact spelling used in
/// input files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumIter, EnumString, Serialize, Deserialize)]
pub enum MaterialTag {
    Si,
}

impl MaterialTag {
    pub fn valid_names() -> String {
        MaterialTag::iter()
            .map(|t| t.to_string())
            .collect::<Vec<String>>()
            .join(", ")
    }
}

/// Polynomial fits of the bulk branch frequencies along G-X,
/// f(k) = |a1 k + a2 k^2 + ...| in Hz. Ref. APL 95 161901 (2009).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DispersionFit {
    pub max_wavevector: Float,
    pub la: [Float; 3],
    pub ta: [Float; 4],
    /// TA branches end here; higher frequencies belong to LA only.
    pub ta_frequency_cut: Float,
}

impl DispersionFit {
    pub fn la_frequency(&self, k: Float) -> Float {
        let [a1, a2, a3] = self.la;
        (a1 * k + a2 * k * k + a3 * k * k * k).abs()
    }

    pub fn ta_frequency(&self, k: Float) -> Float {
        let [b1, b2, b3, b4] = self.ta;
        (b1 * k + b2 * k * k + b3 * k * k * k + b4 * k * k * k * k).abs()
    }
}

/// Everything the engine needs to know about the medium.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub tag: MaterialTag,
    /// [kg/m^3]
    pub density: Float,
    /// [J/kg/K]
    pub specific_heat_capacity: Float,
    /// [K]
    pub debye_temperature: Float,
    /// Mass-impurity relaxation prefactor, 1/tau = A w^4.
    pub impurity_coefficient: Float,
    /// Umklapp relaxation prefactor, 1/tau = A w^2 T exp(-Theta_D/T).
    pub umklapp_coefficient: Float,
    pub dispersion: DispersionFit,
}

impl Material {
    pub fn from_tag(tag: MaterialTag) -> Material {
        match tag {
            MaterialTag::Si => Material {
                tag,
                density: 2330.0,
                specific_heat_capacity: 700.0,
                debye_temperature: 152.0,
                impurity_coefficient: 2.95e-45,
                umklapp_coefficient: 0.95e-19,
                dispersion: DispersionFit {
                    max_wavevector: 12.0e9,
                    la: [1369.42, -2.405e-8, -9.70e-19],
                    ta: [1081.74, -7.711e-8, 5.674e-19, 7.967e-29],
                    ta_frequency_cut: 4.5e12,
                },
            },
        }
    }
}
