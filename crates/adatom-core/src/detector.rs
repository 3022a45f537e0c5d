//! Event detection: full scans and incremental neighborhood repair.
//!
//! `detect_around(p)` instantiates every applicable event `p` takes part
//! in. A full scan runs it for every particle; an incremental update runs
//! it only for particles within the interaction radius of a change, after
//! dropping every cataloged event those particles take part in. Both paths
//! collect candidates into an ordered map, so the catalog's insertion
//! order depends only on the configuration.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use adatom_config::KmcConfig;
use adatom_host::{ChangeSet, ConfigurationQuery};
use adatom_types::{AdatomError, AdatomResult, ParticleId};
use serde::{Deserialize, Serialize};

use crate::bond::{BondIndex, BondKey};
use crate::catalog::EventCatalog;
use crate::event::{DetectionContext, Event, EventKey};

type Found = BTreeMap<EventKey, (Event, f64)>;

/// Counts from one incremental update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReport {
    pub affected: usize,
    pub removed: usize,
    pub added: usize,
}

#[derive(Debug, Clone)]
pub struct EventDetector {
    config: Arc<KmcConfig>,
    radius: f64,
    /// Film height sampled at the last full scan.
    film_height: f64,
}

impl EventDetector {
    pub fn new(config: Arc<KmcConfig>) -> Self {
        let radius = Self::interaction_radius(&config);
        Self {
            config,
            radius,
            film_height: 0.0,
        }
    }

    /// Largest distance over which a change can alter another particle's events.
    ///
    /// Covers bond-form cutoffs, catalyst searches, deposition sites with
    /// their collision shells, hop targets with their collision shells, and
    /// neighbor requirements.
    pub fn interaction_radius(config: &KmcConfig) -> f64 {
        let max_sigma = config.species.max_sigma();
        let events = &config.events;
        let mut r = config.catalyst_radius;
        for t in &events.bond_form {
            r = r.max(t.cutoff);
        }
        for t in &events.deposition {
            r = r.max(t.offset + t.molecule.extent() + max_sigma);
        }
        for t in &events.diffusion {
            r = r.max(t.max_hop_length() + max_sigma);
            if let Some(req) = &t.neighbor_requirement {
                r = r.max(req.radius);
            }
        }
        r
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn film_height(&self) -> f64 {
        self.film_height
    }

    pub fn config(&self) -> &KmcConfig {
        &self.config
    }

    fn context<'a, Q: ConfigurationQuery + ?Sized>(&'a self, host: &'a Q, bonds: &'a BondIndex) -> DetectionContext<'a, Q> {
        DetectionContext {
            config: &self.config,
            host,
            bonds,
            film_height: self.film_height,
        }
    }

    /// Samples the film height, then rebuilds the catalog from scratch.
    pub fn populate<Q: ConfigurationQuery + ?Sized>(
        &mut self,
        host: &Q,
        bonds: &BondIndex,
        catalog: &mut EventCatalog,
    ) -> AdatomResult<usize> {
        self.film_height = host.film_height();
        self.rescan(host, bonds, catalog)
    }

    /// Rebuilds the catalog from scratch using the current reference film height.
    pub fn rescan<Q: ConfigurationQuery + ?Sized>(
        &self,
        host: &Q,
        bonds: &BondIndex,
        catalog: &mut EventCatalog,
    ) -> AdatomResult<usize> {
        catalog.clear();
        let ctx = self.context(host, bonds);
        let mut found = Found::new();
        for id in host.particle_ids() {
            self.detect_around(&ctx, id, &mut found)?;
        }
        for (event, rate) in found.into_values() {
            catalog.add(event, rate)?;
        }
        tracing::info!(events = catalog.len(), total_rate = catalog.total_rate(), "full event scan");
        Ok(catalog.len())
    }

    /// Changed particles plus everything within the interaction radius of
    /// their old and new positions.
    pub fn affected_set<Q: ConfigurationQuery + ?Sized>(&self, host: &Q, changes: &ChangeSet) -> BTreeSet<ParticleId> {
        let mut affected = BTreeSet::new();
        let mut centers = Vec::new();

        for &id in changes.created.iter().chain(&changes.modified) {
            affected.insert(id);
            if let Some(p) = host.particle(id) {
                centers.push(p.position);
            }
        }
        for &(id, pos) in &changes.deleted {
            affected.insert(id);
            centers.push(pos);
        }
        for r in &changes.relocated {
            affected.insert(r.id);
            centers.push(r.from);
            centers.push(r.to);
        }
        if self.radius > 0.0 {
            for c in centers {
                affected.extend(host.neighbors_of_point(c, self.radius));
            }
        }
        affected
    }

    /// Repairs the catalog after a mutation reported by `changes`.
    ///
    /// `bonds` must already reflect the mutation.
    pub fn update<Q: ConfigurationQuery + ?Sized>(
        &self,
        host: &Q,
        bonds: &BondIndex,
        catalog: &mut EventCatalog,
        changes: &ChangeSet,
    ) -> AdatomResult<UpdateReport> {
        let affected = self.affected_set(host, changes);

        let mut removed = 0;
        for &id in &affected {
            removed += catalog.remove_participant(id)?.len();
        }

        let ctx = self.context(host, bonds);
        let mut found = Found::new();
        for &id in &affected {
            if host.particle(id).is_some() {
                self.detect_around(&ctx, id, &mut found)?;
            }
        }
        let added = found.len();
        for (event, rate) in found.into_values() {
            catalog.add(event, rate)?;
        }

        let report = UpdateReport {
            affected: affected.len(),
            removed,
            added,
        };
        tracing::debug!(
            affected = report.affected,
            removed = report.removed,
            added = report.added,
            "incremental event update"
        );
        Ok(report)
    }

    /// Instantiates every applicable event `id` takes part in.
    pub fn detect_around<Q: ConfigurationQuery + ?Sized>(
        &self,
        ctx: &DetectionContext<'_, Q>,
        id: ParticleId,
        out: &mut Found,
    ) -> AdatomResult<()> {
        let p = ctx
            .host
            .particle(id)
            .ok_or_else(|| AdatomError::InvalidConfiguration(format!("dangling particle id {id}")))?;
        let events = &self.config.events;

        for (partner, bond_type) in ctx.bonds.bonds_of(id) {
            if let Some((t, _)) = events.bond_break_for(bond_type) {
                consider(ctx, Event::bond_break(BondKey::new(id, partner, bond_type), t), out)?;
            }
        }

        let form_cutoff = events
            .bond_form
            .iter()
            .filter(|t| t.species.contains(&p.species))
            .map(|t| t.cutoff)
            .fold(0.0, f64::max);
        if form_cutoff > 0.0 {
            let near = ctx
                .host
                .neighbors(id, form_cutoff)
                .map_err(|e| AdatomError::InvalidConfiguration(format!("neighbor query around {id}: {e}")))?;
            for q in near {
                let other = ctx
                    .host
                    .particle(q)
                    .ok_or_else(|| AdatomError::InvalidConfiguration(format!("dangling neighbor id {q}")))?;
                if let Some((t, template)) = events.bond_form_for(p.species, other.species) {
                    let bond = BondKey::new(id, q, template.bond_type);
                    consider(ctx, Event::bond_form(bond, t), out)?;
                }
            }
        }

        if let Some((t, _)) = events.deposition_for(p.species) {
            consider(ctx, Event::deposition(id, t), out)?;
        }

        if let Some((t, template)) = events.diffusion_for(p.species) {
            for hop in 0..template.hops.len() {
                consider(ctx, Event::diffusion(id, t, hop), out)?;
            }
        }

        if let Some((t, _)) = events.desorption_for(p.species) {
            consider(ctx, Event::desorption(id, t), out)?;
        }

        Ok(())
    }
}

/// Adds `event` to `out` if it is locally owned, not yet found and applicable.
fn consider<Q: ConfigurationQuery + ?Sized>(
    ctx: &DetectionContext<'_, Q>,
    event: Event,
    out: &mut Found,
) -> AdatomResult<()> {
    let key = event.key();
    if out.contains_key(&key) || !ctx.host.is_owned(key.owner()) {
        return Ok(());
    }
    if event.is_applicable(ctx)? {
        let rate = event.compute_rate(ctx)?;
        out.insert(key, (event, rate));
    }
    Ok(())
}
