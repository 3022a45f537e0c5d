//! Event variants and their shared capability set.
//!
//! Every variant answers three questions against the current
//! configuration: is it applicable, what is its rate, and what does
//! executing it change. Events refer to their template by index into the
//! run configuration and derive geometry (hop targets, deposition sites)
//! from live host positions, so an event stays valid exactly as long as
//! its participants' neighborhood is unchanged.

use std::fmt;

use adatom_config::KmcConfig;
use adatom_host::{ChangeSet, ConfigurationQuery, HostMutation, ParticleView};
use adatom_math::DVec3;
use adatom_rates::{LocalEnvironment, RateModel};
use adatom_types::{AdatomError, AdatomResult, ParticleId, Species};
use serde::{Deserialize, Serialize};

use crate::bond::{BondIndex, BondKey};

/// Event family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    BondBreak,
    BondForm,
    Deposition,
    Diffusion,
    MonoatomicDesorption,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        match self {
            EventKind::BondBreak => "bond_break",
            EventKind::BondForm => "bond_form",
            EventKind::Deposition => "deposition",
            EventKind::Diffusion => "diffusion",
            EventKind::MonoatomicDesorption => "monoatomic_desorption",
        }
    }
}

/// Identity of an event: kind, participants and the parameter that
/// distinguishes events sharing participants (template or hop index).
/// Two events with equal keys are the same event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKey {
    BondBreak(BondKey),
    BondForm(BondKey),
    Deposition { parent: ParticleId, template: usize },
    Diffusion { particle: ParticleId, template: usize, hop: usize },
    MonoatomicDesorption { particle: ParticleId },
}

impl EventKey {
    pub fn kind(&self) -> EventKind {
        match self {
            EventKey::BondBreak(_) => EventKind::BondBreak,
            EventKey::BondForm(_) => EventKind::BondForm,
            EventKey::Deposition { .. } => EventKind::Deposition,
            EventKey::Diffusion { .. } => EventKind::Diffusion,
            EventKey::MonoatomicDesorption { .. } => EventKind::MonoatomicDesorption,
        }
    }

    /// The particle whose subdomain owns the event: the bond head, the
    /// deposition parent, or the single participant.
    pub fn owner(&self) -> ParticleId {
        match *self {
            EventKey::BondBreak(b) | EventKey::BondForm(b) => b.head,
            EventKey::Deposition { parent, .. } => parent,
            EventKey::Diffusion { particle, .. } => particle,
            EventKey::MonoatomicDesorption { particle } => particle,
        }
    }

    /// Participating particles. The second slot is only used by bond events.
    pub fn participants(&self) -> [Option<ParticleId>; 2] {
        match *self {
            EventKey::BondBreak(b) | EventKey::BondForm(b) => [Some(b.head), Some(b.tail)],
            _ => [Some(self.owner()), None],
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKey::BondBreak(b) | EventKey::BondForm(b) => {
                write!(f, "{}({}, {}, {})", self.kind().label(), b.head, b.tail, b.bond_type)
            }
            EventKey::Deposition { parent, template } => write!(f, "deposition({parent}, t{template})"),
            EventKey::Diffusion { particle, template, hop } => {
                write!(f, "diffusion({particle}, t{template}, hop {hop})")
            }
            EventKey::MonoatomicDesorption { particle } => write!(f, "monoatomic_desorption({particle})"),
        }
    }
}

/// Everything applicability and rate evaluation may read.
pub struct DetectionContext<'a, Q: ?Sized> {
    pub config: &'a KmcConfig,
    pub host: &'a Q,
    pub bonds: &'a BondIndex,
    /// Reference film height for deposition windows.
    pub film_height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondBreak {
    pub bond: BondKey,
    pub template: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondForm {
    pub bond: BondKey,
    pub template: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deposition {
    pub parent: ParticleId,
    pub template: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diffusion {
    pub particle: ParticleId,
    pub template: usize,
    pub hop: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonoatomicDesorption {
    pub particle: ParticleId,
    pub template: usize,
}

/// A possible discrete transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    BondBreak(BondBreak),
    BondForm(BondForm),
    Deposition(Deposition),
    Diffusion(Diffusion),
    MonoatomicDesorption(MonoatomicDesorption),
}

fn template<'c, T>(list: &'c [T], index: usize, what: &str) -> AdatomResult<&'c T> {
    list.get(index)
        .ok_or_else(|| AdatomError::InvalidParameters(format!("{what} template {index} does not exist")))
}

fn view<Q: ConfigurationQuery + ?Sized>(host: &Q, id: ParticleId) -> AdatomResult<ParticleView> {
    host.particle(id)
        .ok_or_else(|| AdatomError::InvalidConfiguration(format!("dangling particle id {id}")))
}

fn neighbors<Q: ConfigurationQuery + ?Sized>(host: &Q, id: ParticleId, cutoff: f64) -> AdatomResult<Vec<ParticleId>> {
    host.neighbors(id, cutoff)
        .map_err(|e| AdatomError::InvalidConfiguration(format!("neighbor query around {id}: {e}")))
}

/// True when no catalyst is required or one sits within the catalyst radius.
fn has_catalyst<Q: ConfigurationQuery + ?Sized>(
    ctx: &DetectionContext<'_, Q>,
    id: ParticleId,
    catalysts: &[Species],
) -> AdatomResult<bool> {
    if catalysts.is_empty() {
        return Ok(true);
    }
    for n in neighbors(ctx.host, id, ctx.config.catalyst_radius)? {
        if catalysts.contains(&view(ctx.host, n)?.species) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// True when a particle of `species` placed at `point` would overlap anything.
fn collides<Q: ConfigurationQuery + ?Sized>(
    ctx: &DetectionContext<'_, Q>,
    point: DVec3,
    species: Species,
    exclude: Option<ParticleId>,
) -> AdatomResult<bool> {
    let rules = &ctx.config.species;
    for n in ctx.host.neighbors_of_point(point, rules.max_sigma()) {
        if Some(n) == exclude {
            continue;
        }
        let other = view(ctx.host, n)?;
        let sigma = rules.sigma(species, other.species);
        if ctx.host.distance_sq(point, other.position) < sigma * sigma {
            return Ok(true);
        }
    }
    Ok(false)
}

fn live<Q: ConfigurationQuery + ?Sized>(host: &Q, id: ParticleId) -> AdatomResult<ParticleView> {
    host.particle(id)
        .ok_or_else(|| AdatomError::Execution(format!("particle {id} vanished before execution")))
}

fn deposition_site<Q: ConfigurationQuery + ?Sized>(host: &Q, parent: &ParticleView, offset: f64) -> DVec3 {
    host.remap(parent.position + DVec3::new(0.0, 0.0, offset))
}

impl Event {
    pub fn bond_break(bond: BondKey, template: usize) -> Self {
        Event::BondBreak(BondBreak { bond, template })
    }

    pub fn bond_form(bond: BondKey, template: usize) -> Self {
        Event::BondForm(BondForm { bond, template })
    }

    pub fn deposition(parent: ParticleId, template: usize) -> Self {
        Event::Deposition(Deposition { parent, template })
    }

    pub fn diffusion(particle: ParticleId, template: usize, hop: usize) -> Self {
        Event::Diffusion(Diffusion { particle, template, hop })
    }

    pub fn desorption(particle: ParticleId, template: usize) -> Self {
        Event::MonoatomicDesorption(MonoatomicDesorption { particle, template })
    }

    pub fn key(&self) -> EventKey {
        match *self {
            Event::BondBreak(e) => EventKey::BondBreak(e.bond),
            Event::BondForm(e) => EventKey::BondForm(e.bond),
            Event::Deposition(e) => EventKey::Deposition {
                parent: e.parent,
                template: e.template,
            },
            Event::Diffusion(e) => EventKey::Diffusion {
                particle: e.particle,
                template: e.template,
                hop: e.hop,
            },
            Event::MonoatomicDesorption(e) => EventKey::MonoatomicDesorption { particle: e.particle },
        }
    }

    pub fn kind(&self) -> EventKind {
        self.key().kind()
    }

    pub fn participants(&self) -> [Option<ParticleId>; 2] {
        self.key().participants()
    }

    /// Checks the event's applicability predicate against the live configuration.
    ///
    /// Returns `InvalidConfiguration` when the host reports inconsistent data.
    pub fn is_applicable<Q: ConfigurationQuery + ?Sized>(&self, ctx: &DetectionContext<'_, Q>) -> AdatomResult<bool> {
        let config = ctx.config;
        match *self {
            Event::BondBreak(e) => {
                let t = template(&config.events.bond_break, e.template, "bond-break")?;
                if t.bond_type != e.bond.bond_type || !ctx.bonds.contains(&e.bond) {
                    return Ok(false);
                }
                view(ctx.host, e.bond.head)?;
                view(ctx.host, e.bond.tail)?;
                has_catalyst(ctx, e.bond.head, &t.catalysts)
            }

            Event::BondForm(e) => {
                let t = template(&config.events.bond_form, e.template, "bond-form")?;
                let (head, tail) = (e.bond.head, e.bond.tail);
                let a = view(ctx.host, head)?;
                let b = view(ctx.host, tail)?;
                let species_match = (a.species == t.species[0] && b.species == t.species[1])
                    || (a.species == t.species[1] && b.species == t.species[0]);
                if !species_match || t.bond_type != e.bond.bond_type || head == tail {
                    return Ok(false);
                }
                if ctx.host.distance_sq(a.position, b.position) > t.cutoff * t.cutoff {
                    return Ok(false);
                }
                if ctx.bonds.contains_pair(head, tail) {
                    return Ok(false);
                }
                let rules = &config.species;
                for p in [&a, &b] {
                    let count = ctx.bonds.bond_count(p.id);
                    if t.lone_only && count > 0 {
                        return Ok(false);
                    }
                    if rules.max_bonds(p.species).is_some_and(|max| count >= max as usize) {
                        return Ok(false);
                    }
                    let typed = ctx.bonds.bond_count_of_type(p.id, t.bond_type);
                    if rules
                        .max_bonds_of_type(p.species, t.bond_type)
                        .is_some_and(|max| typed >= max as usize)
                    {
                        return Ok(false);
                    }
                }
                if !t.same_molecule && !a.molecule.is_none() && a.molecule == b.molecule {
                    return Ok(false);
                }
                Ok(has_catalyst(ctx, head, &t.catalysts)? || has_catalyst(ctx, tail, &t.catalysts)?)
            }

            Event::Deposition(e) => {
                let t = template(&config.events.deposition, e.template, "deposition")?;
                let parent = view(ctx.host, e.parent)?;
                if parent.species != t.parent_species {
                    return Ok(false);
                }
                if let Some(band) = t.scan_band {
                    if (parent.position.z - ctx.film_height).abs() > band {
                        return Ok(false);
                    }
                }
                let site = deposition_site(ctx.host, &parent, t.offset);
                if let Some(limit) = t.reject_above {
                    if site.z > ctx.film_height + limit {
                        return Ok(false);
                    }
                }
                for (atom, pos) in t.molecule.atoms.iter().zip(t.molecule.placed_at(site)) {
                    if collides(ctx, ctx.host.remap(pos), atom.species, None)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }

            Event::Diffusion(e) => {
                let t = template(&config.events.diffusion, e.template, "diffusion")?;
                let Some(&hop) = t.hops.get(e.hop) else {
                    return Err(AdatomError::InvalidParameters(format!(
                        "diffusion template {} has no hop {}",
                        e.template, e.hop
                    )));
                };
                let p = view(ctx.host, e.particle)?;
                if p.species != t.species {
                    return Ok(false);
                }
                if let Some(req) = &t.neighbor_requirement {
                    let mut found = 0u32;
                    for n in neighbors(ctx.host, p.id, req.radius)? {
                        let nv = view(ctx.host, n)?;
                        if nv.species != req.species {
                            continue;
                        }
                        if req.saturated && !config.species.is_saturated(nv.species, ctx.bonds.bond_count(n)) {
                            continue;
                        }
                        found += 1;
                    }
                    if found < req.count {
                        return Ok(false);
                    }
                }
                let target = ctx.host.remap(p.position + hop);
                let moving = t.diffused_species.unwrap_or(p.species);
                let exclude = t.displacive.then_some(p.id);
                Ok(!collides(ctx, target, moving, exclude)?)
            }

            Event::MonoatomicDesorption(e) => {
                let t = template(&config.events.desorption, e.template, "desorption")?;
                let p = view(ctx.host, e.particle)?;
                Ok(p.species == t.species && ctx.bonds.bond_count(p.id) <= t.max_bonds as usize)
            }
        }
    }

    /// Rate constant from the template's rate law and the owner's coordination.
    pub fn compute_rate<Q: ConfigurationQuery + ?Sized>(&self, ctx: &DetectionContext<'_, Q>) -> AdatomResult<f64> {
        let config = ctx.config;
        let owner = self.key().owner();
        let env = LocalEnvironment::at_temperature(config.temperature)
            .with_coordination(ctx.bonds.bond_count(owner) as u32);

        let rate = match *self {
            Event::BondBreak(e) => template(&config.events.bond_break, e.template, "bond-break")?
                .rate
                .rate(&env),
            Event::BondForm(e) => template(&config.events.bond_form, e.template, "bond-form")?
                .rate
                .rate(&env),
            Event::Deposition(e) => {
                let t = template(&config.events.deposition, e.template, "deposition")?;
                t.rate.rate(&env) * t.sticking_coefficient
            }
            Event::Diffusion(e) => template(&config.events.diffusion, e.template, "diffusion")?
                .rate
                .rate(&env),
            Event::MonoatomicDesorption(e) => template(&config.events.desorption, e.template, "desorption")?
                .rate
                .rate(&env),
        };

        if !rate.is_finite() || rate < 0.0 {
            return Err(AdatomError::InvalidConfiguration(format!(
                "{} produced rate {rate}",
                self.key()
            )));
        }
        Ok(rate)
    }

    /// Applies the structural mutation through the host.
    ///
    /// Host rejections surface as `Execution` errors; nothing is rolled back.
    pub fn execute<H>(&self, config: &KmcConfig, host: &mut H) -> AdatomResult<ChangeSet>
    where
        H: ConfigurationQuery + HostMutation + ?Sized,
    {
        match *self {
            Event::BondBreak(e) => Ok(host.delete_bond(e.bond.head, e.bond.tail, e.bond.bond_type)?),

            Event::BondForm(e) => {
                let t = template(&config.events.bond_form, e.template, "bond-form")?;
                let mut changes = host.create_bond(e.bond.head, e.bond.tail, e.bond.bond_type)?;
                if t.consume_participants {
                    changes.merge(host.delete_particles(&[e.bond.head, e.bond.tail])?);
                }
                Ok(changes)
            }

            Event::Deposition(e) => {
                let t = template(&config.events.deposition, e.template, "deposition")?;
                let parent = live(&*host, e.parent)?;
                let site = deposition_site(&*host, &parent, t.offset);
                let atoms: Vec<(Species, DVec3)> = t
                    .molecule
                    .atoms
                    .iter()
                    .zip(t.molecule.placed_at(site))
                    .map(|(atom, pos)| (atom.species, host.remap(pos)))
                    .collect();
                let bonds: Vec<_> = t.molecule.bonds.iter().map(|b| (b.a, b.b, b.bond_type)).collect();
                Ok(host.insert_molecule(&atoms, &bonds, t.insertion_velocity)?)
            }

            Event::Diffusion(e) => {
                let t = template(&config.events.diffusion, e.template, "diffusion")?;
                let hop = t
                    .hops
                    .get(e.hop)
                    .copied()
                    .ok_or_else(|| AdatomError::InvalidParameters(format!("missing hop {}", e.hop)))?;
                let p = live(&*host, e.particle)?;
                let target = p.position + hop;
                if t.displacive {
                    let mut changes = host.relocate_particle(p.id, target)?;
                    if let Some(species) = t.diffused_species.filter(|&s| s != p.species) {
                        changes.merge(host.set_species(p.id, species)?);
                    }
                    Ok(changes)
                } else {
                    let species = t.diffused_species.unwrap_or(p.species);
                    Ok(host.create_particle(species, target)?)
                }
            }

            Event::MonoatomicDesorption(e) => Ok(host.delete_particles(&[e.particle])?),
        }
    }
}
