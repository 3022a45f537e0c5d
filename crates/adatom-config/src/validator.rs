//! Configuration validation.
//!
//! Validates run parameters before the engine receives them,
//! catching data-level errors early with clear diagnostics.

use std::collections::BTreeSet;

use adatom_types::{AdatomError, AdatomResult};

use crate::config::KmcConfig;
use crate::species::SpeciesRules;
use crate::templates::EventTemplates;

fn invalid(msg: impl Into<String>) -> AdatomError {
    AdatomError::InvalidParameters(msg.into())
}

fn check_non_negative(what: &str, v: f64) -> AdatomResult<()> {
    if !v.is_finite() || v < 0.0 {
        return Err(invalid(format!("{what} must be finite and non-negative, got {v}")));
    }
    Ok(())
}

fn check_positive(what: &str, v: f64) -> AdatomResult<()> {
    if !v.is_finite() || v <= 0.0 {
        return Err(invalid(format!("{what} must be finite and positive, got {v}")));
    }
    Ok(())
}

/// Validates a complete run configuration.
///
/// Checks:
/// - Temperature, end time and interval settings are in range
/// - MD cadence is complete when enabled
/// - Collision diameters are positive
/// - Every template has valid parameters and a unique key
pub fn validate_config(config: &KmcConfig) -> AdatomResult<()> {
    check_non_negative("Temperature", config.temperature)?;

    if let Some(end) = config.run.end_time {
        check_positive("End time", end)?;
    }
    if config.resync_interval == 0 {
        return Err(invalid("Resync interval must be >= 1"));
    }

    let cadence = &config.cadence;
    if cadence.kmc_per_md > 0 && cadence.md_steps == 0 {
        return Err(invalid("MD cadence is set but md_steps is 0"));
    }
    if cadence.kmc_per_long_md > 0 && cadence.long_md_steps == 0 {
        return Err(invalid("Long MD cadence is set but long_md_steps is 0"));
    }
    check_non_negative("MD time per step", cadence.md_time_per_step)?;
    check_non_negative("Catalyst radius", config.catalyst_radius)?;

    if let Some(h) = config.trim.height_above_film {
        check_non_negative("Trim height", h)?;
    }

    validate_species(&config.species)?;
    validate_templates(&config.events, config.catalyst_radius)?;
    Ok(())
}

fn validate_species(rules: &SpeciesRules) -> AdatomResult<()> {
    check_positive("Default sigma", rules.default_sigma)?;
    for p in &rules.pair_sigmas {
        check_positive(&format!("Sigma for pair ({}, {})", p.a, p.b), p.sigma)?;
    }
    for s in &rules.species_sigmas {
        check_positive(&format!("Sigma for species {}", s.species), s.sigma)?;
    }

    let mut seen = BTreeSet::new();
    for r in &rules.valence {
        if !seen.insert((r.species, r.bond_type)) {
            return Err(invalid(format!("Duplicate valence rule for species {}", r.species)));
        }
    }
    Ok(())
}

fn validate_templates(events: &EventTemplates, catalyst_radius: f64) -> AdatomResult<()> {
    let mut break_keys = BTreeSet::new();
    for t in &events.bond_break {
        if !break_keys.insert(t.bond_type) {
            return Err(invalid(format!("Duplicate bond-break template for bond type {}", t.bond_type)));
        }
        t.rate.validate()?;
        if !t.catalysts.is_empty() && catalyst_radius <= 0.0 {
            return Err(invalid("Catalyzed bond breaking needs a positive catalyst radius"));
        }
    }

    let mut form_keys = BTreeSet::new();
    for t in &events.bond_form {
        let key = if t.species[0] <= t.species[1] {
            (t.species[0], t.species[1])
        } else {
            (t.species[1], t.species[0])
        };
        if !form_keys.insert(key) {
            return Err(invalid(format!(
                "Duplicate bond-form template for species pair ({}, {})",
                key.0, key.1
            )));
        }
        check_positive("Bond-form cutoff", t.cutoff)?;
        t.rate.validate()?;
        if !t.catalysts.is_empty() && catalyst_radius <= 0.0 {
            return Err(invalid("Catalyzed bond formation needs a positive catalyst radius"));
        }
    }

    let mut diffusion_keys = BTreeSet::new();
    for t in &events.diffusion {
        if !diffusion_keys.insert(t.species) {
            return Err(invalid(format!("Duplicate diffusion template for species {}", t.species)));
        }
        if t.hops.is_empty() {
            return Err(invalid(format!("Diffusion template for {} has no hop vectors", t.species)));
        }
        if t.hops.iter().any(|h| !h.is_finite() || h.length_squared() == 0.0) {
            return Err(invalid(format!("Diffusion template for {} has a zero or non-finite hop", t.species)));
        }
        if !t.displacive && t.diffused_species.is_none() {
            return Err(invalid(format!(
                "Non-displacive diffusion for {} must name a diffused species",
                t.species
            )));
        }
        if let Some(req) = &t.neighbor_requirement {
            check_positive("Neighbor requirement radius", req.radius)?;
        }
        t.rate.validate()?;
    }

    let mut deposition_keys = BTreeSet::new();
    for t in &events.deposition {
        if !deposition_keys.insert(t.parent_species) {
            return Err(invalid(format!(
                "Duplicate deposition template for parent species {}",
                t.parent_species
            )));
        }
        if t.molecule.atoms.is_empty() {
            return Err(invalid(format!("Deposition '{}' has an empty molecule", t.name)));
        }
        let n = t.molecule.atoms.len();
        for b in &t.molecule.bonds {
            if b.a >= n || b.b >= n || b.a == b.b {
                return Err(invalid(format!(
                    "Deposition '{}' has an invalid molecule bond ({}, {})",
                    t.name, b.a, b.b
                )));
            }
        }
        check_non_negative("Deposition offset", t.offset)?;
        if !(0.0..=1.0).contains(&t.sticking_coefficient) {
            return Err(invalid(format!(
                "Sticking coefficient of '{}' must lie in [0, 1], got {}",
                t.name, t.sticking_coefficient
            )));
        }
        if let Some(band) = t.scan_band {
            check_non_negative("Deposition scan band", band)?;
        }
        t.rate.validate()?;
    }

    let mut desorption_keys = BTreeSet::new();
    for t in &events.desorption {
        if !desorption_keys.insert(t.species) {
            return Err(invalid(format!("Duplicate desorption template for species {}", t.species)));
        }
        t.rate.validate()?;
    }

    Ok(())
}
