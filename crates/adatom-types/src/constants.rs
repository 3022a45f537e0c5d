//! Physical constants and engine defaults.

/// Ideal gas constant in kcal/(mol·K). Barriers are given in kcal/mol.
pub const GAS_CONSTANT_KCAL: f64 = 1.987_204_258_640_83e-3;

/// Boltzmann constant (J/K).
pub const BOLTZMANN: f64 = 1.380_649e-23;

/// Planck constant (J·s).
pub const PLANCK: f64 = 6.626_070_15e-34;

/// Avogadro constant (1/mol).
pub const AVOGADRO: f64 = 6.022_140_76e23;

/// Conversion factor from bar to pascal.
pub const BAR_TO_PA: f64 = 1.0e5;

/// Conversion factor from Å² to m².
pub const ANGSTROM2_TO_M2: f64 = 1.0e-20;

/// Conversion factor from g/mol to kg/mol.
pub const GRAM_TO_KG: f64 = 1.0e-3;

/// Default number of kMC steps between full rate resynchronisations.
pub const DEFAULT_RESYNC_INTERVAL: u64 = 10_000;
