//! Kinetic-gas impingement rate for deposition from the vapor phase.
//!
//! Hertz–Knudsen: `rate = P · A / sqrt(2π · m · kB · T)`, where `A` is the
//! area of one adsorption site and `m` the mass of one gas molecule.

use adatom_types::constants::{ANGSTROM2_TO_M2, AVOGADRO, BAR_TO_PA, BOLTZMANN, GRAM_TO_KG};
use serde::{Deserialize, Serialize};

use crate::traits::{LocalEnvironment, RateModel};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HertzKnudsenFlux {
    /// Partial pressure (bar).
    pub pressure_bar: f64,
    /// Area of one adsorption site (Å²).
    pub site_area: f64,
    /// Molar mass of the depositing species (g/mol).
    pub molar_mass: f64,
}

impl HertzKnudsenFlux {
    pub fn new(pressure_bar: f64, site_area: f64, molar_mass: f64) -> Self {
        Self {
            pressure_bar,
            site_area,
            molar_mass,
        }
    }

    /// Mass of a single molecule (kg).
    pub fn molecular_mass(&self) -> f64 {
        self.molar_mass * GRAM_TO_KG / AVOGADRO
    }
}

impl RateModel for HertzKnudsenFlux {
    fn rate(&self, env: &LocalEnvironment) -> f64 {
        if env.temperature <= 0.0 {
            return 0.0;
        }
        let pressure = self.pressure_bar * BAR_TO_PA;
        let area = self.site_area * ANGSTROM2_TO_M2;
        let denom = (2.0 * std::f64::consts::PI * self.molecular_mass() * BOLTZMANN * env.temperature).sqrt();
        pressure * area / denom
    }

    fn name(&self) -> &str {
        "hertz_knudsen"
    }
}
