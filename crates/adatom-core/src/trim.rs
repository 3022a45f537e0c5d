//! Removal of particles that left the film during an MD phase.

use std::collections::{BTreeSet, VecDeque};

use adatom_config::TrimConfig;
use adatom_host::{ChangeSet, ConfigurationQuery, Host};
use adatom_types::{AdatomError, AdatomResult, ParticleId};

/// Particles above `film_height + height` together with their bonded clusters.
pub fn desorbed_clusters<Q: ConfigurationQuery + ?Sized>(host: &Q, height: f64) -> AdatomResult<Vec<ParticleId>> {
    let limit = host.film_height() + height;
    let mut selected = BTreeSet::new();
    let mut queue = VecDeque::new();

    for id in host.particle_ids() {
        let p = host
            .particle(id)
            .ok_or_else(|| AdatomError::InvalidConfiguration(format!("dangling particle id {id}")))?;
        if p.position.z > limit && selected.insert(id) {
            queue.push_back(id);
        }
    }
    while let Some(id) = queue.pop_front() {
        let bonds = host
            .bonds(id)
            .map_err(|e| AdatomError::InvalidConfiguration(format!("bond list of {id}: {e}")))?;
        for (partner, _) in bonds {
            if selected.insert(partner) {
                queue.push_back(partner);
            }
        }
    }
    Ok(selected.into_iter().collect())
}

/// Deletes desorbed clusters if trimming is enabled and the count is
/// within `max_deletions`. Returns the host's change set when something
/// was deleted.
pub fn trim_desorbed<H: Host + ?Sized>(host: &mut H, config: &TrimConfig) -> AdatomResult<Option<ChangeSet>> {
    let Some(height) = config.height_above_film else {
        return Ok(None);
    };
    let doomed = desorbed_clusters(&*host, height)?;
    if doomed.is_empty() {
        return Ok(None);
    }
    if doomed.len() > config.max_deletions {
        tracing::warn!(
            candidates = doomed.len(),
            max = config.max_deletions,
            "too many desorbed particles, skipping trim"
        );
        return Ok(None);
    }
    let changes = host.delete_particles(&doomed)?;
    tracing::info!(deleted = changes.deleted.len(), "trimmed desorbed particles");
    Ok(Some(changes))
}
