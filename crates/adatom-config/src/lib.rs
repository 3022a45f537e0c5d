//! # adatom-config
//!
//! Immutable run parameters consumed read-only by the kMC engine:
//! run limits, kMC/MD cadence, seed, temperature, species valence and
//! collision rules, and the event templates the detector instantiates.
//!
//! Configurations are plain `serde` structs, loaded from TOML and
//! checked by [`validate_config`] before a run starts.

pub mod config;
pub mod species;
pub mod templates;
pub mod validator;

pub use config::{CadenceConfig, KmcConfig, RunLimits, TrimConfig};
pub use species::{PairSigma, SigmaMix, SpeciesRules, SpeciesSigma, ValenceRule};
pub use templates::{
    BondBreakTemplate, BondFormTemplate, DepositionTemplate, DesorptionTemplate, DiffusionTemplate,
    EventTemplates, MoleculeAtom, MoleculeBond, MoleculeTemplate, NeighborRequirement,
};
pub use validator::validate_config;
