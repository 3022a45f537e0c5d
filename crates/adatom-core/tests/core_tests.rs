//! Integration tests for adatom-core.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use adatom_config::{
    BondBreakTemplate, BondFormTemplate, DepositionTemplate, DesorptionTemplate, DiffusionTemplate, KmcConfig,
    MoleculeTemplate, NeighborRequirement, ValenceRule,
};
use adatom_core::fenwick::FenwickTree;
use adatom_core::trim::{desorbed_clusters, trim_desorbed};
use adatom_core::{
    BondIndex, BondKey, Cadence, Engine, Event, EventCatalog, EventDetector, EventExecutor, EventKey, EventKind,
    EventSelector, KmcRng, MemoryCheckpoints, SimulationClock, Termination,
};
use adatom_host::{
    ChangeSet, Collective, ConfigurationQuery, HostError, HostMutation, InMemoryHost, ParticleView, SingleProcess,
    StaticMd,
};
use adatom_math::{DVec3, PeriodicBox};
use adatom_rates::RateLaw;
use adatom_telemetry::{EventBus, RunEventKind, SharedVecSink};
use adatom_types::{AdatomError, BondType, ParticleId, Species};
use proptest::prelude::*;

const A: Species = Species(1);
const B: Species = Species(2);
const BOND: BondType = BondType(1);

fn desorb(id: u64) -> Event {
    Event::desorption(ParticleId(id), 0)
}

fn slab_host() -> InMemoryHost {
    InMemoryHost::new(PeriodicBox::slab(12.0, 12.0, 20.0), 2.0)
}

fn form_template(cutoff: f64, rate: f64) -> BondFormTemplate {
    BondFormTemplate {
        species: [A, B],
        bond_type: BOND,
        cutoff,
        rate: RateLaw::constant(rate),
        consume_participants: false,
        lone_only: false,
        same_molecule: true,
        catalysts: vec![],
    }
}

fn break_template(rate: f64) -> BondBreakTemplate {
    BondBreakTemplate {
        bond_type: BOND,
        rate: RateLaw::constant(rate),
        catalysts: vec![],
    }
}

fn lateral_hops() -> Vec<DVec3> {
    vec![
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(-1.0, 0.0, 0.0),
        DVec3::new(0.0, 1.0, 0.0),
        DVec3::new(0.0, -1.0, 0.0),
    ]
}

fn diffusion_template(species: Species, rate: f64) -> DiffusionTemplate {
    DiffusionTemplate {
        species,
        hops: lateral_hops(),
        rate: RateLaw::constant(rate),
        displacive: true,
        diffused_species: None,
        neighbor_requirement: None,
    }
}

fn deposition_template(offset: f64, rate: f64) -> DepositionTemplate {
    DepositionTemplate {
        name: "b_on_a".into(),
        parent_species: A,
        offset,
        rate: RateLaw::constant(rate),
        sticking_coefficient: 0.8,
        molecule: MoleculeTemplate::monoatomic(B),
        scan_band: None,
        reject_above: None,
        insertion_velocity: DVec3::ZERO,
    }
}

fn desorption_template(species: Species, rate: f64) -> DesorptionTemplate {
    DesorptionTemplate {
        species,
        rate: RateLaw::constant(rate),
        max_bonds: 0,
    }
}

/// Every event kind enabled on a small A/B surface.
fn mixed_config(seed: u64, steps: u64) -> KmcConfig {
    let mut c = KmcConfig::kmc_only(seed, steps);
    c.species.default_sigma = 0.8;
    c.species.valence = vec![
        ValenceRule {
            species: A,
            bond_type: None,
            max_bonds: 1,
        },
        ValenceRule {
            species: B,
            bond_type: None,
            max_bonds: 1,
        },
    ];
    c.events.bond_form = vec![form_template(1.6, 5.0)];
    c.events.bond_break = vec![break_template(2.0)];
    c.events.diffusion = vec![diffusion_template(A, 1.0)];
    c.events.deposition = vec![deposition_template(1.5, 0.5)];
    c.events.desorption = vec![desorption_template(B, 1.5)];
    c
}

fn mixed_host() -> InMemoryHost {
    let mut h = slab_host();
    for x in 0..6 {
        for y in 0..6 {
            let pos = DVec3::new(2.0 * x as f64 + 1.0, 2.0 * y as f64 + 1.0, 1.0);
            let a = h.add_particle(A, pos);
            if (x + y) % 3 == 0 {
                let b = h.add_particle(B, pos + DVec3::new(0.0, 0.0, 1.5));
                if x % 2 == 0 {
                    h.add_bond(a, b, BOND).unwrap();
                }
            }
        }
    }
    h
}

fn pair_engine(consume: bool) -> Engine<InMemoryHost> {
    let mut c = KmcConfig::kmc_only(7, 10);
    let mut form = form_template(1.5, 1.0);
    form.consume_participants = consume;
    c.events.bond_form = vec![form];
    c.events.bond_break = vec![break_template(2.0)];
    let mut h = slab_host();
    h.add_particle(A, DVec3::new(5.0, 5.0, 1.0));
    h.add_particle(B, DVec3::new(6.0, 5.0, 1.0));
    Engine::new(c, h).unwrap()
}

fn assert_matches_full_scan(engine: &Engine<InMemoryHost>) {
    let mut fresh = EventCatalog::new();
    engine
        .detector()
        .rescan(engine.host(), engine.bonds(), &mut fresh)
        .unwrap();
    assert_eq!(engine.catalog().snapshot(), fresh.snapshot());
    assert_eq!(*engine.bonds(), BondIndex::from_host(engine.host()).unwrap());
    let expected = fresh.recomputed_total();
    assert!((engine.catalog().total_rate() - expected).abs() <= 1e-9 * expected.max(1.0));
}

// ─── Fenwick Tests ────────────────────────────────────────────

#[test]
fn fenwick_prefix_sums() {
    let t = FenwickTree::from_weights([1.0, 2.0, 3.0, 4.0]);
    assert_eq!(t.len(), 4);
    assert_eq!(t.prefix(0), 0.0);
    assert_eq!(t.prefix(2), 3.0);
    assert_eq!(t.total(), 10.0);
}

#[test]
fn fenwick_find_exceeding_uses_strict_boundary() {
    let t = FenwickTree::from_weights([1.0, 2.0, 3.0]);
    assert_eq!(t.find_exceeding(0.0), 0);
    assert_eq!(t.find_exceeding(0.999), 0);
    assert_eq!(t.find_exceeding(1.0), 1);
    assert_eq!(t.find_exceeding(3.0), 2);
    assert_eq!(t.find_exceeding(6.0), 3);
}

#[test]
fn fenwick_push_and_add() {
    let mut t = FenwickTree::new();
    t.push(1.0);
    t.push(1.0);
    t.push(1.0);
    t.add(1, -1.0);
    assert_eq!(t.total(), 2.0);
    assert_eq!(t.find_exceeding(1.0), 2);
}

// ─── Catalog Tests ────────────────────────────────────────────

#[test]
fn catalog_tracks_total_rate() {
    let mut cat = EventCatalog::new();
    cat.add(desorb(1), 1.0).unwrap();
    cat.add(desorb(2), 2.5).unwrap();
    assert_eq!(cat.len(), 2);
    assert!((cat.total_rate() - 3.5).abs() < 1e-12);

    cat.remove(&desorb(1).key()).unwrap();
    assert!((cat.total_rate() - 2.5).abs() < 1e-12);
    assert!(!cat.contains(&desorb(1).key()));
}

#[test]
fn catalog_rejects_duplicates() {
    let mut cat = EventCatalog::new();
    cat.add(desorb(1), 1.0).unwrap();
    let err = cat.add(desorb(1), 4.0).unwrap_err();
    assert!(matches!(err, AdatomError::DuplicateEvent(_)));
    assert_eq!(cat.len(), 1);
    assert!((cat.total_rate() - 1.0).abs() < 1e-12);
}

#[test]
fn catalog_remove_missing_is_not_found() {
    let mut cat = EventCatalog::new();
    let err = cat.remove(&desorb(9).key()).unwrap_err();
    assert!(matches!(err, AdatomError::NotFound(_)));
}

#[test]
fn catalog_rejects_invalid_rates() {
    let mut cat = EventCatalog::new();
    assert!(matches!(cat.add(desorb(1), -1.0), Err(AdatomError::InvalidConfiguration(_))));
    assert!(matches!(cat.add(desorb(2), f64::NAN), Err(AdatomError::InvalidConfiguration(_))));
    assert!(cat.is_empty());
}

#[test]
fn catalog_remove_participant_drops_every_involving_event() {
    let mut cat = EventCatalog::new();
    let bond = BondKey::new(ParticleId(1), ParticleId(2), BOND);
    cat.add(Event::bond_break(bond, 0), 1.0).unwrap();
    cat.add(Event::diffusion(ParticleId(2), 0, 1), 1.0).unwrap();
    cat.add(desorb(3), 1.0).unwrap();

    let removed = cat.remove_participant(ParticleId(2)).unwrap();
    assert_eq!(removed.len(), 2);
    assert_eq!(cat.len(), 1);
    assert!(cat.contains(&desorb(3).key()));
}

#[test]
fn sampling_uses_half_open_intervals() {
    let mut cat = EventCatalog::new();
    for (id, rate) in [(1, 1.0), (2, 2.0), (3, 3.0)] {
        cat.add(desorb(id), rate).unwrap();
    }
    let pick = |u: f64| cat.sample_by_rate(u).map(|(e, _)| e.key()).unwrap();
    assert_eq!(pick(0.0), desorb(1).key());
    assert_eq!(pick(0.1), desorb(1).key());
    assert_eq!(pick(1.0 / 6.0 + 1e-9), desorb(2).key());
    // target 3.0 sits on the boundary between the second and third events
    assert_eq!(pick(0.5), desorb(3).key());
    assert_eq!(pick(0.999_999), desorb(3).key());
}

#[test]
fn zero_rate_events_are_never_sampled() {
    let mut cat = EventCatalog::new();
    cat.add(desorb(1), 0.0).unwrap();
    cat.add(desorb(2), 1.0).unwrap();
    cat.add(desorb(3), 0.0).unwrap();
    for i in 0..100 {
        let u = i as f64 / 100.0;
        let (e, rate) = cat.sample_by_rate(u).unwrap();
        assert_eq!(e.key(), desorb(2).key());
        assert_eq!(rate, 1.0);
    }
}

#[test]
fn sampling_empty_or_zero_catalog_is_none() {
    let mut cat = EventCatalog::new();
    assert!(cat.sample_by_rate(0.3).is_none());
    cat.add(desorb(1), 0.0).unwrap();
    assert!(cat.sample_by_rate(0.3).is_none());
}

#[test]
fn resync_corrects_accumulated_drift() {
    let mut cat = EventCatalog::new();
    for i in 0..2_000u64 {
        cat.add(desorb(i), 0.1 + (i % 7) as f64 * 1e-3).unwrap();
    }
    for i in (0..2_000u64).step_by(2) {
        cat.remove(&desorb(i).key()).unwrap();
    }
    let drift = cat.resync();
    assert!(drift.abs() < 1e-9);
    assert_eq!(cat.total_rate(), cat.recomputed_total());
    assert_eq!(cat.len(), 1_000);
}

#[test]
fn catalog_stats_group_by_kind() {
    let mut cat = EventCatalog::new();
    cat.add(desorb(1), 1.0).unwrap();
    cat.add(desorb(2), 0.0).unwrap();
    cat.add(Event::diffusion(ParticleId(1), 0, 0), 2.0).unwrap();

    let stats = cat.stats();
    assert_eq!(stats.events, 3);
    assert_eq!(stats.zero_rate, 1);
    assert_eq!(stats.per_kind[&EventKind::MonoatomicDesorption].count, 2);
    assert_eq!(stats.per_kind[&EventKind::Diffusion].rate, 2.0);
}

#[test]
fn catalog_iterates_in_insertion_order() {
    let mut cat = EventCatalog::new();
    for id in [5, 1, 3] {
        cat.add(desorb(id), 1.0).unwrap();
    }
    cat.remove(&desorb(1).key()).unwrap();
    let keys: Vec<EventKey> = cat.iter().map(|(e, _)| e.key()).collect();
    assert_eq!(keys, vec![desorb(5).key(), desorb(3).key()]);
}

proptest! {
    #[test]
    fn total_rate_matches_sum_after_any_edit_sequence(
        ops in proptest::collection::vec((0u64..40, 0.0f64..10.0, any::<bool>()), 1..200)
    ) {
        let mut cat = EventCatalog::new();
        let mut reference: BTreeMap<EventKey, f64> = BTreeMap::new();
        for (id, rate, insert) in ops {
            let event = desorb(id);
            if insert {
                if reference.contains_key(&event.key()) {
                    prop_assert!(cat.add(event, rate).is_err());
                } else {
                    cat.add(event, rate).unwrap();
                    reference.insert(event.key(), rate);
                }
            } else if reference.remove(&event.key()).is_some() {
                cat.remove(&event.key()).unwrap();
            } else {
                prop_assert!(cat.remove(&event.key()).is_err());
            }
        }
        let expected: f64 = reference.values().sum();
        prop_assert!((cat.total_rate() - expected).abs() <= 1e-9 * expected.max(1.0));
        prop_assert_eq!(cat.snapshot(), reference);
    }
}

// ─── Selector Tests ───────────────────────────────────────────

#[test]
fn selector_picks_the_sampled_event() {
    let mut cat = EventCatalog::new();
    for (id, rate) in [(1, 1.0), (2, 2.0), (3, 3.0)] {
        cat.add(desorb(id), rate).unwrap();
    }
    let s = EventSelector::new().select_with(&cat, 0.5, 0.5, 0.0).unwrap();
    assert_eq!(s.event.key(), desorb(3).key());
    assert_eq!(s.rate, 3.0);
    assert_eq!(s.total_rate, 6.0);
    assert!((s.dt - std::f64::consts::LN_2 / 6.0).abs() < 1e-15);
}

#[test]
fn selector_rejects_out_of_range_waiting_draw() {
    let mut cat = EventCatalog::new();
    cat.add(desorb(1), 1.0).unwrap();
    let sel = EventSelector::new();
    assert!(matches!(sel.select_with(&cat, 0.1, 0.0, 0.0), Err(AdatomError::InvalidParameters(_))));
    assert!(matches!(sel.select_with(&cat, 0.1, 1.0, 0.0), Err(AdatomError::InvalidParameters(_))));
}

#[test]
fn selector_reports_no_eligible_events_without_drawing() {
    let cat = EventCatalog::new();
    let mut rng = KmcRng::new(1);
    let err = EventSelector::new()
        .select(&cat, &mut rng, &SingleProcess, 4.0)
        .unwrap_err();
    assert!(matches!(err, AdatomError::NoEligibleEvents { time } if time == 4.0));
    assert_eq!(rng.draws(), 0);
}

#[test]
fn selection_frequencies_follow_rates() {
    let rates = [1.0, 2.0, 3.0, 4.0];
    let mut cat = EventCatalog::new();
    for (i, &r) in rates.iter().enumerate() {
        cat.add(desorb(i as u64), r).unwrap();
    }
    let sel = EventSelector::new();
    let mut rng = KmcRng::new(2024);
    let n = 40_000;
    let mut counts = [0usize; 4];
    for _ in 0..n {
        let s = sel.select(&cat, &mut rng, &SingleProcess, 0.0).unwrap();
        let EventKey::MonoatomicDesorption { particle } = s.event.key() else {
            panic!("unexpected event kind");
        };
        counts[particle.raw() as usize] += 1;
    }
    let total: f64 = rates.iter().sum();
    let chi2: f64 = rates
        .iter()
        .zip(counts)
        .map(|(&r, c)| {
            let expected = n as f64 * r / total;
            (c as f64 - expected).powi(2) / expected
        })
        .sum();
    // 3 degrees of freedom, p = 0.001
    assert!(chi2 < 16.27, "chi-square {chi2} for counts {counts:?}");
}

#[test]
fn waiting_times_are_positive_with_mean_inverse_rate() {
    let mut cat = EventCatalog::new();
    cat.add(desorb(1), 2.0).unwrap();
    cat.add(desorb(2), 3.0).unwrap();
    let sel = EventSelector::new();
    let mut rng = KmcRng::new(99);
    let n = 50_000;
    let mut sum = 0.0;
    for _ in 0..n {
        let s = sel.select(&cat, &mut rng, &SingleProcess, 0.0).unwrap();
        assert!(s.dt > 0.0 && s.dt.is_finite());
        sum += s.dt;
    }
    let mean = sum / n as f64;
    assert!((mean - 0.2).abs() < 0.2 * 0.03, "mean waiting time {mean}");
}

#[test]
fn rng_streams_are_reproducible() {
    let mut a = KmcRng::new(5);
    let mut b = KmcRng::new(5);
    for _ in 0..100 {
        assert_eq!(a.uniform(), b.uniform());
        let u = a.uniform_open();
        assert_eq!(u, b.uniform_open());
        assert!(u > 0.0 && u < 1.0);
    }
    assert_eq!(a.draws(), 200);
}

// ─── Clock Tests ──────────────────────────────────────────────

#[test]
fn clock_accumulates_kmc_and_md_time_separately() {
    let mut clock = SimulationClock::new();
    clock.advance(0.5).unwrap();
    clock.advance(0.25).unwrap();
    clock.record_md(10, 0.01);
    assert_eq!(clock.time(), 0.75);
    assert_eq!(clock.kmc_steps(), 2);
    assert_eq!(clock.md_steps(), 10);
    assert!((clock.md_time() - 0.1).abs() < 1e-12);
    assert!((clock.elapsed() - 0.85).abs() < 1e-12);
    assert_eq!(clock.md_phases(), 1);
}

#[test]
fn clock_rejects_non_positive_increments() {
    let mut clock = SimulationClock::new();
    assert!(clock.advance(0.0).is_err());
    assert!(clock.advance(-1.0).is_err());
    assert!(clock.advance(f64::INFINITY).is_err());
    assert_eq!(clock.kmc_steps(), 0);
}

#[test]
fn clock_end_time() {
    let mut clock = SimulationClock::new();
    assert!(!clock.reached(None));
    assert!(!clock.reached(Some(1.0)));
    clock.advance(1.0).unwrap();
    assert!(clock.reached(Some(1.0)));
}

#[test]
fn cadence_long_phase_replaces_regular_phase() {
    let mut c = KmcConfig::default().cadence;
    c.kmc_per_md = 2;
    c.md_steps = 5;
    c.kmc_per_long_md = 6;
    c.long_md_steps = 50;
    let cadence = Cadence::new(c);
    assert_eq!(cadence.md_due(0), None);
    assert_eq!(cadence.md_due(1), None);
    assert_eq!(cadence.md_due(2).map(|p| (p.steps, p.long)), Some((5, false)));
    assert_eq!(cadence.md_due(6).map(|p| (p.steps, p.long)), Some((50, true)));
    assert_eq!(cadence.on_quiescence(), None);
}

// ─── Bond Index Tests ─────────────────────────────────────────

#[test]
fn bond_keys_are_order_independent() {
    let k1 = BondKey::new(ParticleId(4), ParticleId(2), BOND);
    let k2 = BondKey::new(ParticleId(2), ParticleId(4), BOND);
    assert_eq!(k1, k2);
    assert_eq!(k1.head, ParticleId(2));
    assert_eq!(k1.other(ParticleId(2)), Some(ParticleId(4)));
    assert_eq!(k1.other(ParticleId(3)), None);
}

#[test]
fn bond_index_insert_and_remove() {
    let mut idx = BondIndex::new();
    let key = BondKey::new(ParticleId(1), ParticleId(2), BOND);
    idx.insert(key).unwrap();
    assert!(matches!(idx.insert(key), Err(AdatomError::InvalidConfiguration(_))));
    assert!(idx.contains_pair(ParticleId(2), ParticleId(1)));
    assert_eq!(idx.bond_count(ParticleId(1)), 1);

    idx.remove(&key).unwrap();
    assert!(matches!(idx.remove(&key), Err(AdatomError::NotFound(_))));
    assert!(idx.is_empty());
    assert_eq!(idx, BondIndex::new());
}

#[test]
fn bond_index_remove_particle() {
    let mut idx = BondIndex::new();
    idx.insert(BondKey::new(ParticleId(1), ParticleId(2), BOND)).unwrap();
    idx.insert(BondKey::new(ParticleId(1), ParticleId(3), BondType(2))).unwrap();
    idx.insert(BondKey::new(ParticleId(2), ParticleId(3), BOND)).unwrap();
    let removed = idx.remove_particle(ParticleId(1));
    assert_eq!(removed.len(), 2);
    assert_eq!(idx.len(), 1);
    assert_eq!(idx.bond_count(ParticleId(3)), 1);
    assert_eq!(idx.bond_count_of_type(ParticleId(3), BondType(2)), 0);
}

#[test]
fn bond_index_from_host_mirrors_host_bonds() {
    let h = mixed_host();
    let idx = BondIndex::from_host(&h).unwrap();
    assert_eq!(idx.len(), h.bond_count());
}

/// Host whose first particle reports a bond to a particle that does not exist.
struct DanglingBondHost(InMemoryHost);

impl ConfigurationQuery for DanglingBondHost {
    fn particle(&self, id: ParticleId) -> Option<ParticleView> {
        self.0.particle(id)
    }

    fn particle_ids(&self) -> Vec<ParticleId> {
        self.0.particle_ids()
    }

    fn particle_count(&self) -> usize {
        self.0.particle_count()
    }

    fn neighbors(&self, id: ParticleId, cutoff: f64) -> Result<Vec<ParticleId>, HostError> {
        self.0.neighbors(id, cutoff)
    }

    fn neighbors_of_point(&self, point: DVec3, cutoff: f64) -> Vec<ParticleId> {
        self.0.neighbors_of_point(point, cutoff)
    }

    fn bonds(&self, id: ParticleId) -> Result<Vec<(ParticleId, BondType)>, HostError> {
        let mut bonds = self.0.bonds(id)?;
        if id == ParticleId(1) {
            bonds.push((ParticleId(999), BOND));
        }
        Ok(bonds)
    }

    fn simulation_box(&self) -> &PeriodicBox {
        self.0.simulation_box()
    }

    fn film_height(&self) -> f64 {
        self.0.film_height()
    }
}

impl HostMutation for DanglingBondHost {
    fn create_particle(&mut self, species: Species, position: DVec3) -> Result<ChangeSet, HostError> {
        self.0.create_particle(species, position)
    }

    fn delete_particles(&mut self, ids: &[ParticleId]) -> Result<ChangeSet, HostError> {
        self.0.delete_particles(ids)
    }

    fn create_bond(&mut self, a: ParticleId, b: ParticleId, bond_type: BondType) -> Result<ChangeSet, HostError> {
        self.0.create_bond(a, b, bond_type)
    }

    fn delete_bond(&mut self, a: ParticleId, b: ParticleId, bond_type: BondType) -> Result<ChangeSet, HostError> {
        self.0.delete_bond(a, b, bond_type)
    }

    fn relocate_particle(&mut self, id: ParticleId, target: DVec3) -> Result<ChangeSet, HostError> {
        self.0.relocate_particle(id, target)
    }

    fn set_species(&mut self, id: ParticleId, species: Species) -> Result<ChangeSet, HostError> {
        self.0.set_species(id, species)
    }

    fn insert_molecule(
        &mut self,
        atoms: &[(Species, DVec3)],
        bonds: &[(usize, usize, BondType)],
        velocity: DVec3,
    ) -> Result<ChangeSet, HostError> {
        self.0.insert_molecule(atoms, bonds, velocity)
    }
}

#[test]
fn dangling_bond_is_invalid_configuration() {
    let host = DanglingBondHost(mixed_host());
    assert!(matches!(BondIndex::from_host(&host), Err(AdatomError::InvalidConfiguration(_))));

    let err = Engine::new(mixed_config(1, 10), host).err().unwrap();
    assert!(matches!(err, AdatomError::InvalidConfiguration(_)));
}

// ─── Detector Tests ───────────────────────────────────────────

#[test]
fn interaction_radius_covers_every_dependency() {
    let c = mixed_config(1, 1);
    // deposition offset 1.5 plus sigma 0.8 dominates the 1.6 cutoff and 1.8 hop reach
    assert!((EventDetector::interaction_radius(&c) - 2.3).abs() < 1e-12);
}

#[test]
fn full_scan_finds_form_for_nearby_pair() {
    let engine = pair_engine(false);
    let snap = engine.catalog().snapshot();
    let key = EventKey::BondForm(BondKey::new(ParticleId(1), ParticleId(2), BOND));
    assert_eq!(snap.len(), 1);
    assert_eq!(snap[&key], 1.0);
}

#[test]
fn form_respects_cutoff_and_valence() {
    let mut c = KmcConfig::kmc_only(1, 1);
    c.events.bond_form = vec![form_template(1.5, 1.0)];
    c.species.valence = vec![ValenceRule {
        species: B,
        bond_type: None,
        max_bonds: 1,
    }];
    let mut h = slab_host();
    let a1 = h.add_particle(A, DVec3::new(2.0, 2.0, 1.0));
    let b = h.add_particle(B, DVec3::new(3.0, 2.0, 1.0));
    let a2 = h.add_particle(A, DVec3::new(4.0, 2.0, 1.0));
    let _far = h.add_particle(A, DVec3::new(8.0, 8.0, 1.0));
    h.add_bond(a1, b, BOND).unwrap();

    let engine = Engine::new(c, h).unwrap();
    // b already carries its single allowed bond
    assert!(!engine
        .catalog()
        .contains(&EventKey::BondForm(BondKey::new(b, a2, BOND))));
    assert!(engine.catalog().is_empty());
}

#[test]
fn catalyzed_break_needs_a_catalyst_nearby() {
    let catalyst = Species(9);
    let mut c = KmcConfig::kmc_only(1, 1);
    c.catalyst_radius = 2.0;
    c.events.bond_break = vec![BondBreakTemplate {
        bond_type: BOND,
        rate: RateLaw::constant(1.0),
        catalysts: vec![catalyst],
    }];
    let mut h = slab_host();
    let a = h.add_particle(A, DVec3::new(2.0, 2.0, 1.0));
    let b = h.add_particle(B, DVec3::new(3.0, 2.0, 1.0));
    h.add_bond(a, b, BOND).unwrap();
    let c2 = c.clone();

    let engine = Engine::new(c, h.clone()).unwrap();
    assert!(engine.catalog().is_empty());

    h.add_particle(catalyst, DVec3::new(2.0, 3.5, 1.0));
    let engine = Engine::new(c2, h).unwrap();
    assert!(engine
        .catalog()
        .contains(&EventKey::BondBreak(BondKey::new(a, b, BOND))));
}

#[test]
fn diffusion_hops_blocked_by_collision() {
    let mut c = KmcConfig::kmc_only(1, 1);
    c.species.default_sigma = 0.8;
    c.events.diffusion = vec![diffusion_template(A, 1.0)];
    let mut h = slab_host();
    let a = h.add_particle(A, DVec3::new(5.0, 5.0, 1.0));
    h.add_particle(B, DVec3::new(6.0, 5.0, 1.0));

    let engine = Engine::new(c, h).unwrap();
    let hops: Vec<usize> = engine
        .catalog()
        .iter()
        .filter_map(|(e, _)| match e.key() {
            EventKey::Diffusion { particle, hop, .. } if particle == a => Some(hop),
            _ => None,
        })
        .collect();
    // +x is occupied
    assert_eq!(hops, vec![1, 2, 3]);
}

#[test]
fn diffusion_neighbor_requirement() {
    let mut c = KmcConfig::kmc_only(1, 1);
    let mut t = diffusion_template(A, 1.0);
    t.neighbor_requirement = Some(NeighborRequirement {
        species: B,
        count: 2,
        radius: 3.0,
        saturated: false,
    });
    c.events.diffusion = vec![t];
    let mut h = slab_host();
    h.add_particle(A, DVec3::new(5.0, 5.0, 1.0));
    h.add_particle(B, DVec3::new(5.0, 7.0, 1.0));
    let c2 = c.clone();

    assert!(Engine::new(c, h.clone()).unwrap().catalog().is_empty());
    h.add_particle(B, DVec3::new(5.0, 3.0, 1.0));
    assert_eq!(Engine::new(c2, h).unwrap().catalog().len(), 4);
}

#[test]
fn deposition_scan_band_and_height_limit() {
    let mut c = KmcConfig::kmc_only(1, 1);
    let mut t = deposition_template(1.0, 1.0);
    t.scan_band = Some(0.5);
    c.events.deposition = vec![t];
    let mut h = slab_host();
    h.set_film_fraction(1.0);
    let top = h.add_particle(A, DVec3::new(2.0, 2.0, 3.0));
    let buried = h.add_particle(A, DVec3::new(6.0, 6.0, 1.0));

    let engine = Engine::new(c.clone(), h.clone()).unwrap();
    let parent_key = |p| EventKey::Deposition { parent: p, template: 0 };
    assert!(engine.catalog().contains(&parent_key(top)));
    assert!(!engine.catalog().contains(&parent_key(buried)));

    c.events.deposition[0].reject_above = Some(0.5);
    let engine = Engine::new(c, h).unwrap();
    assert!(engine.catalog().is_empty());
}

#[test]
fn deposition_rate_includes_sticking_coefficient() {
    let mut c = KmcConfig::kmc_only(1, 1);
    c.events.deposition = vec![deposition_template(1.0, 2.0)];
    let mut h = slab_host();
    let a = h.add_particle(A, DVec3::new(2.0, 2.0, 1.0));
    let engine = Engine::new(c, h).unwrap();
    let (_, rate) = engine
        .catalog()
        .get(&EventKey::Deposition { parent: a, template: 0 })
        .unwrap();
    assert!((rate - 1.6).abs() < 1e-12);
}

#[test]
fn ghost_owned_events_are_not_cataloged() {
    let mut c = KmcConfig::kmc_only(1, 1);
    c.events.desorption = vec![desorption_template(B, 1.0)];
    let mut h = slab_host();
    let owned = h.add_particle(B, DVec3::new(2.0, 2.0, 1.0));
    let ghost = h.add_particle(B, DVec3::new(8.0, 8.0, 1.0));
    h.mark_ghost(ghost);
    let engine = Engine::new(c, h).unwrap();
    assert!(engine
        .catalog()
        .contains(&EventKey::MonoatomicDesorption { particle: owned }));
    assert!(!engine
        .catalog()
        .contains(&EventKey::MonoatomicDesorption { particle: ghost }));
}

#[test]
fn incremental_updates_match_full_scan() {
    let mut engine = Engine::new(mixed_config(31, 300), mixed_host()).unwrap();
    assert_matches_full_scan(&engine);
    let mut kinds = BTreeMap::new();
    for _ in 0..300 {
        let outcome = match engine.step() {
            Ok(o) => o,
            Err(AdatomError::NoEligibleEvents { .. }) => break,
            Err(e) => panic!("step failed: {e}"),
        };
        *kinds.entry(outcome.selection.event.kind()).or_insert(0) += 1;
        assert_matches_full_scan(&engine);
    }
    assert!(kinds.len() >= 3, "too few event kinds exercised: {kinds:?}");
}

#[test]
fn executor_repairs_catalog_in_place() {
    let c = Arc::new(mixed_config(3, 1));
    let mut h = mixed_host();
    let mut bonds = BondIndex::from_host(&h).unwrap();
    let mut detector = EventDetector::new(Arc::clone(&c));
    let mut catalog = EventCatalog::new();
    detector.populate(&h, &bonds, &mut catalog).unwrap();

    let event = catalog
        .iter()
        .map(|(e, _)| *e)
        .find(|e| e.kind() == EventKind::Deposition)
        .unwrap();
    let before = h.particle_count();
    let report = EventExecutor::new()
        .execute(&event, &mut h, &mut bonds, &mut catalog, &detector, &SingleProcess)
        .unwrap();
    assert_eq!(report.changes.created.len(), 1);
    assert_eq!(h.particle_count(), before + 1);
    assert!(report.update.added > 0);

    let mut fresh = EventCatalog::new();
    detector.rescan(&h, &bonds, &mut fresh).unwrap();
    assert_eq!(catalog.snapshot(), fresh.snapshot());
}

// ─── Engine Tests ─────────────────────────────────────────────

#[test]
fn form_then_break_restores_catalog_and_bonds() {
    let mut engine = pair_engine(false);
    let initial_catalog = engine.catalog().snapshot();
    let initial_bonds = engine.bonds().clone();

    let first = engine.step().unwrap();
    assert_eq!(first.selection.event.kind(), EventKind::BondForm);
    assert_eq!(engine.bonds().len(), 1);
    assert_eq!(engine.host().bond_count(), 1);

    let second = engine.step().unwrap();
    assert_eq!(second.selection.event.kind(), EventKind::BondBreak);
    assert_eq!(engine.catalog().snapshot(), initial_catalog);
    assert_eq!(*engine.bonds(), initial_bonds);
    assert_eq!(engine.clock().kmc_steps(), 2);
}

#[test]
fn consuming_form_deletes_both_participants() {
    let mut engine = pair_engine(true);
    let outcome = engine.step().unwrap();
    assert_eq!(outcome.selection.event.kind(), EventKind::BondForm);
    assert_eq!(engine.host().particle_count(), 0);
    assert!(engine.catalog().is_empty());
    assert!(engine.bonds().is_empty());
}

#[test]
fn non_displacive_diffusion_creates_a_particle() {
    let mut c = KmcConfig::kmc_only(1, 1);
    let mut t = diffusion_template(A, 1.0);
    t.displacive = false;
    t.diffused_species = Some(B);
    t.hops = vec![DVec3::new(0.0, 0.0, 1.0)];
    c.events.diffusion = vec![t];
    let mut h = slab_host();
    let a = h.add_particle(A, DVec3::new(2.0, 2.0, 1.0));

    let mut engine = Engine::new(c, h).unwrap();
    engine.step().unwrap();
    let host = engine.host();
    assert_eq!(host.particle_count(), 2);
    assert_eq!(host.particle(a).unwrap().position, DVec3::new(2.0, 2.0, 1.0));
    let created = host.particle_ids().into_iter().find(|&id| id != a).unwrap();
    assert_eq!(host.particle(created).unwrap().species, B);
}

#[test]
fn same_seed_runs_are_identical() {
    let run = |seed| {
        let mut engine = Engine::new(mixed_config(seed, 150), mixed_host()).unwrap();
        engine.set_record_history(true);
        let summary = engine.run().unwrap();
        (engine.history().to_vec(), summary, engine.host().snapshot())
    };
    let (h1, s1, p1) = run(77);
    let (h2, s2, p2) = run(77);
    assert_eq!(h1, h2);
    assert_eq!(s1, s2);
    assert_eq!(p1, p2);
    assert!(!h1.is_empty());
}

#[test]
fn run_stops_when_nothing_is_eligible() {
    let mut c = KmcConfig::kmc_only(5, 100);
    c.events.desorption = vec![desorption_template(B, 1.0)];
    let mut h = slab_host();
    for i in 0..3 {
        h.add_particle(B, DVec3::new(2.0 * i as f64 + 1.0, 1.0, 1.0));
    }
    let mut engine = Engine::new(c, h).unwrap();
    let summary = engine.run().unwrap();
    assert_eq!(summary.termination, Termination::NoEligibleEvents);
    assert_eq!(summary.clock.kmc_steps, 3);
    assert_eq!(summary.particles, 0);
    assert_eq!(summary.final_total_rate, 0.0);

    let err = engine.step().unwrap_err();
    assert!(matches!(err, AdatomError::NoEligibleEvents { .. }));
    assert!(!err.is_fatal());
}

#[test]
fn run_stops_at_step_budget_and_end_time() {
    let mut engine = Engine::new(mixed_config(8, 25), mixed_host()).unwrap();
    engine.set_record_history(true);
    let summary = engine.run().unwrap();
    assert_eq!(summary.termination, Termination::StepBudget);
    assert_eq!(summary.clock.kmc_steps, 25);
    assert_eq!(engine.history().len(), 25);

    let mut c = mixed_config(8, 1_000_000);
    c.run.end_time = Some(0.05);
    let mut engine = Engine::new(c, mixed_host()).unwrap();
    let summary = engine.run().unwrap();
    assert_eq!(summary.termination, Termination::EndTime);
    assert!(summary.clock.time >= 0.05);
}

#[test]
fn history_times_increase() {
    let mut engine = Engine::new(mixed_config(12, 50), mixed_host()).unwrap();
    engine.set_record_history(true);
    engine.run().unwrap();
    let history = engine.history();
    for pair in history.windows(2) {
        assert!(pair[1].time > pair[0].time);
        assert_eq!(pair[1].step, pair[0].step + 1);
    }
    assert_eq!(history.last().unwrap().time, engine.clock().time());
}

#[test]
fn host_rejection_halts_with_clock_state() {
    let mut c = KmcConfig::kmc_only(5, 10);
    c.events.desorption = vec![desorption_template(B, 1.0)];
    let mut h = slab_host();
    h.add_particle(B, DVec3::new(1.0, 1.0, 1.0));
    h.set_rejecting(true);

    let mut engine = Engine::new(c, h).unwrap();
    let err = engine.step().unwrap_err();
    match &err {
        AdatomError::Halted { kmc_steps, time, .. } => {
            assert_eq!(*kmc_steps, 0);
            assert_eq!(*time, 0.0);
        }
        other => panic!("expected Halted, got {other:?}"),
    }
    assert!(matches!(err.root_cause(), AdatomError::Execution(_)));
    assert!(err.to_string().contains("kMC step 0"));
}

/// Accepts every mutation except particle deletion.
struct NoDeleteHost(InMemoryHost);

impl ConfigurationQuery for NoDeleteHost {
    fn particle(&self, id: ParticleId) -> Option<ParticleView> {
        self.0.particle(id)
    }

    fn particle_ids(&self) -> Vec<ParticleId> {
        self.0.particle_ids()
    }

    fn particle_count(&self) -> usize {
        self.0.particle_count()
    }

    fn neighbors(&self, id: ParticleId, cutoff: f64) -> Result<Vec<ParticleId>, HostError> {
        self.0.neighbors(id, cutoff)
    }

    fn neighbors_of_point(&self, point: DVec3, cutoff: f64) -> Vec<ParticleId> {
        self.0.neighbors_of_point(point, cutoff)
    }

    fn bonds(&self, id: ParticleId) -> Result<Vec<(ParticleId, BondType)>, HostError> {
        self.0.bonds(id)
    }

    fn simulation_box(&self) -> &PeriodicBox {
        self.0.simulation_box()
    }

    fn film_height(&self) -> f64 {
        self.0.film_height()
    }
}

impl HostMutation for NoDeleteHost {
    fn create_particle(&mut self, species: Species, position: DVec3) -> Result<ChangeSet, HostError> {
        self.0.create_particle(species, position)
    }

    fn delete_particles(&mut self, _ids: &[ParticleId]) -> Result<ChangeSet, HostError> {
        Err(HostError::Rejected("no delete".into()))
    }

    fn create_bond(&mut self, a: ParticleId, b: ParticleId, bond_type: BondType) -> Result<ChangeSet, HostError> {
        self.0.create_bond(a, b, bond_type)
    }

    fn delete_bond(&mut self, a: ParticleId, b: ParticleId, bond_type: BondType) -> Result<ChangeSet, HostError> {
        self.0.delete_bond(a, b, bond_type)
    }

    fn relocate_particle(&mut self, id: ParticleId, target: DVec3) -> Result<ChangeSet, HostError> {
        self.0.relocate_particle(id, target)
    }

    fn set_species(&mut self, id: ParticleId, species: Species) -> Result<ChangeSet, HostError> {
        self.0.set_species(id, species)
    }

    fn insert_molecule(
        &mut self,
        atoms: &[(Species, DVec3)],
        bonds: &[(usize, usize, BondType)],
        velocity: DVec3,
    ) -> Result<ChangeSet, HostError> {
        self.0.insert_molecule(atoms, bonds, velocity)
    }
}

#[test]
fn halted_engine_refuses_further_work() {
    let mut c = KmcConfig::kmc_only(7, 10);
    let mut form = form_template(1.5, 1.0);
    form.consume_participants = true;
    c.events.bond_form = vec![form];
    let mut h = slab_host();
    h.add_particle(A, DVec3::new(5.0, 5.0, 1.0));
    h.add_particle(B, DVec3::new(6.0, 5.0, 1.0));

    let sink = SharedVecSink::new();
    let mut bus = EventBus::new();
    bus.add_sink(Box::new(sink.clone()));
    let mut engine = Engine::new(c, NoDeleteHost(h))
        .unwrap()
        .with_md_phase(Box::new(StaticMd))
        .with_telemetry(bus);
    assert_eq!(engine.catalog().len(), 1);

    // the bond lands on the host, then the deletion is rejected
    let err = engine.step().unwrap_err();
    assert!(matches!(err, AdatomError::Halted { .. }));
    assert!(engine.is_halted());
    assert_eq!(engine.host().0.bond_count(), 1);

    let again = engine.step().unwrap_err();
    match &again {
        AdatomError::AlreadyHalted { reason, kmc_steps, .. } => {
            assert!(reason.contains("no delete"));
            assert_eq!(*kmc_steps, 0);
        }
        other => panic!("expected AlreadyHalted, got {other:?}"),
    }
    assert!(matches!(engine.run(), Err(AdatomError::AlreadyHalted { .. })));
    assert!(matches!(engine.run_md_phase(5), Err(AdatomError::AlreadyHalted { .. })));

    // nothing reached the host after the halt
    assert_eq!(engine.host().0.bond_count(), 1);
    assert_eq!(engine.host().particle_count(), 2);
    assert_eq!(engine.clock().kmc_steps(), 0);
    assert_eq!(engine.clock().md_steps(), 0);

    let terminated: Vec<_> = sink
        .events()
        .into_iter()
        .filter(|e| matches!(e.kind, RunEventKind::Terminated { .. }))
        .collect();
    assert_eq!(terminated.len(), 1);
}

#[test]
fn quiescent_step_emits_no_step_begin() {
    let mut c = KmcConfig::kmc_only(5, 100);
    c.events.desorption = vec![desorption_template(B, 1.0)];
    let mut h = slab_host();
    h.add_particle(B, DVec3::new(1.0, 1.0, 1.0));

    let sink = SharedVecSink::new();
    let mut bus = EventBus::new();
    bus.add_sink(Box::new(sink.clone()));
    let mut engine = Engine::new(c, h).unwrap().with_telemetry(bus);
    let summary = engine.run().unwrap();
    assert_eq!(summary.termination, Termination::NoEligibleEvents);

    let kinds: Vec<&'static str> = sink
        .events()
        .iter()
        .map(|e| match e.kind {
            RunEventKind::StepBegin { .. } => "begin",
            RunEventKind::EventExecuted { .. } => "executed",
            RunEventKind::CatalogUpdated { .. } => "updated",
            RunEventKind::Terminated { .. } => "terminated",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["begin", "executed", "updated", "terminated"]);
}

#[derive(Default)]
struct CountingCollective {
    barriers: Arc<AtomicUsize>,
    broadcasts: Arc<AtomicUsize>,
}

impl Collective for CountingCollective {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        2
    }

    fn barrier(&self) -> Result<(), HostError> {
        self.barriers.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn broadcast(&self, _values: &mut [f64], _root: usize) -> Result<(), HostError> {
        self.broadcasts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn events_touching_ghosts_wait_at_barrier() {
    let mut c = KmcConfig::kmc_only(1, 1);
    c.events.bond_form = vec![form_template(1.5, 1.0)];
    let mut h = slab_host();
    h.add_particle(A, DVec3::new(5.0, 5.0, 1.0));
    let ghost = h.add_particle(B, DVec3::new(6.0, 5.0, 1.0));
    h.mark_ghost(ghost);

    let collective = CountingCollective::default();
    let barriers = Arc::clone(&collective.barriers);
    let broadcasts = Arc::clone(&collective.broadcasts);
    let mut engine = Engine::new(c, h).unwrap().with_collective(Box::new(collective));
    engine.step().unwrap();
    assert_eq!(barriers.load(Ordering::SeqCst), 1);
    assert_eq!(broadcasts.load(Ordering::SeqCst), 1);
}

#[test]
fn md_phases_follow_cadence() {
    let mut c = KmcConfig::kmc_only(4, 8);
    c.events.diffusion = vec![diffusion_template(A, 1.0)];
    c.cadence.kmc_per_md = 2;
    c.cadence.md_steps = 5;
    c.cadence.md_time_per_step = 1e-3;
    c.cadence.kmc_per_long_md = 4;
    c.cadence.long_md_steps = 20;
    let mut h = slab_host();
    h.add_particle(A, DVec3::new(5.0, 5.0, 1.0));

    let mut engine = Engine::new(c, h).unwrap().with_md_phase(Box::new(StaticMd));
    let summary = engine.run().unwrap();
    assert_eq!(summary.clock.kmc_steps, 8);
    // steps 2 and 6 regular, 4 and 8 long
    assert_eq!(summary.clock.md_phases, 4);
    assert_eq!(summary.clock.md_steps, 50);
    assert!((summary.clock.md_time - 0.05).abs() < 1e-12);
    assert!((engine.clock().elapsed() - summary.clock.time - 0.05).abs() < 1e-12);
}

#[test]
fn quiescent_runs_spend_budget_on_md() {
    let mut c = KmcConfig::kmc_only(4, 5);
    c.cadence.kmc_per_md = 10;
    c.cadence.md_steps = 3;
    c.cadence.md_on_quiescence = true;
    let mut h = slab_host();
    h.add_particle(A, DVec3::new(5.0, 5.0, 1.0));

    let mut engine = Engine::new(c, h).unwrap().with_md_phase(Box::new(StaticMd));
    let summary = engine.run().unwrap();
    assert_eq!(summary.termination, Termination::StepBudget);
    assert_eq!(summary.clock.kmc_steps, 0);
    assert_eq!(summary.clock.md_phases, 5);
    assert_eq!(summary.clock.md_steps, 15);
}

#[test]
fn trimming_removes_desorbed_clusters() {
    let mut h = slab_host();
    h.set_film_fraction(0.5);
    for i in 0..10 {
        h.add_particle(A, DVec3::new(i as f64 + 0.5, 1.0, 1.0));
    }
    let anchor = ParticleId(1);
    let high = h.add_particle(B, DVec3::new(5.0, 5.0, 15.0));
    let partner = h.add_particle(B, DVec3::new(5.0, 6.0, 14.5));
    h.add_bond(high, partner, BOND).unwrap();
    h.add_bond(partner, anchor, BOND).unwrap();

    let doomed = desorbed_clusters(&h, 5.0).unwrap();
    assert_eq!(doomed, vec![anchor, high, partner]);

    let mut trim = KmcConfig::default().trim;
    trim.height_above_film = Some(5.0);
    trim.max_deletions = 2;
    assert!(trim_desorbed(&mut h, &trim).unwrap().is_none());
    assert_eq!(h.particle_count(), 12);

    trim.max_deletions = 10;
    let changes = trim_desorbed(&mut h, &trim).unwrap().unwrap();
    assert_eq!(changes.deleted.len(), 3);
    assert_eq!(h.particle_count(), 9);
}

#[test]
fn md_phase_trims_and_rescans() {
    let mut c = KmcConfig::kmc_only(4, 1);
    c.events.desorption = vec![desorption_template(B, 1.0)];
    c.trim.height_above_film = Some(5.0);
    let mut h = slab_host();
    h.set_film_fraction(0.5);
    for i in 0..6 {
        h.add_particle(A, DVec3::new(i as f64 + 0.5, 1.0, 1.0));
    }
    h.add_particle(B, DVec3::new(5.0, 5.0, 15.0));
    h.add_particle(B, DVec3::new(2.0, 5.0, 1.0));

    let sink = SharedVecSink::new();
    let mut bus = EventBus::new();
    bus.add_sink(Box::new(sink.clone()));
    let mut engine = Engine::new(c, h)
        .unwrap()
        .with_md_phase(Box::new(StaticMd))
        .with_telemetry(bus);
    assert_eq!(engine.catalog().len(), 2);

    engine.run_md_phase(10).unwrap();
    assert_eq!(engine.host().particle_count(), 7);
    assert_eq!(engine.catalog().len(), 1);
    assert_eq!(engine.clock().md_steps(), 10);

    engine.run().unwrap();
    let events = sink.events();
    assert!(events
        .iter()
        .any(|e| matches!(e.kind, RunEventKind::Trimmed { deleted: 1 })));
    assert!(events
        .iter()
        .any(|e| matches!(e.kind, RunEventKind::MdPhase { steps: 10, long: false })));
}

#[test]
fn checkpoints_fire_on_interval() {
    let mut c = mixed_config(21, 7);
    c.checkpoint_interval = 3;
    let checkpoints = MemoryCheckpoints::new();
    let mut engine = Engine::new(c, mixed_host())
        .unwrap()
        .with_checkpoint(Box::new(checkpoints.clone()));
    engine.run().unwrap();

    let snaps = checkpoints.snapshots();
    assert_eq!(snaps.len(), 2);
    assert_eq!(snaps[0].clock.kmc_steps, 3);
    assert_eq!(snaps[1].clock.kmc_steps, 6);
    assert_eq!(snaps[1].seed, 21);
    assert_eq!(snaps[1].draws, 12);
}

#[test]
fn telemetry_reports_every_step() {
    let mut c = mixed_config(2, 20);
    c.resync_interval = 5;
    let sink = SharedVecSink::new();
    let mut bus = EventBus::new();
    bus.add_sink(Box::new(sink.clone()));
    let mut engine = Engine::new(c, mixed_host()).unwrap().with_telemetry(bus);
    engine.run().unwrap();

    let events = sink.events();
    let executed = events
        .iter()
        .filter(|e| matches!(e.kind, RunEventKind::EventExecuted { .. }))
        .count();
    let resyncs = events
        .iter()
        .filter(|e| matches!(e.kind, RunEventKind::CatalogResync { .. }))
        .count();
    assert_eq!(executed, 20);
    assert_eq!(resyncs, 4);
    for e in &events {
        if let RunEventKind::CatalogResync { drift } = e.kind {
            assert!(drift.abs() < 1e-9);
        }
    }
    assert!(matches!(
        events.last().map(|e| &e.kind),
        Some(RunEventKind::Terminated { reason, .. }) if reason == "step_budget"
    ));
}

#[test]
fn invalid_config_is_rejected_before_scanning() {
    let mut c = mixed_config(1, 1);
    c.events.bond_form[0].cutoff = -1.0;
    assert!(matches!(
        Engine::new(c, mixed_host()),
        Err(AdatomError::InvalidParameters(_))
    ));
}

#[test]
fn engine_snapshot_serializes() {
    let engine = Engine::new(mixed_config(1, 1), mixed_host()).unwrap();
    let json = serde_json::to_string(&engine.snapshot()).unwrap();
    assert!(json.contains("\"kmc_steps\":0"));
}
