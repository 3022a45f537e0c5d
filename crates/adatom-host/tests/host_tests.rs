//! Integration tests for adatom-host.

use adatom_host::{
    ChangeSet, Collective, ConfigurationQuery, HostError, HostMutation, InMemoryHost, JitterMd, MdPhase,
    SingleProcess, StaticMd,
};
use adatom_math::{DVec3, PeriodicBox};
use adatom_types::{AdatomError, BondType, ParticleId, Species};

fn host() -> InMemoryHost {
    InMemoryHost::new(PeriodicBox::slab(10.0, 10.0, 20.0), 2.0)
}

// ─── Query Tests ──────────────────────────────────────────────

#[test]
fn neighbors_are_sorted_and_exclude_self() {
    let mut h = host();
    let a = h.add_particle(Species(1), DVec3::new(5.0, 5.0, 1.0));
    let b = h.add_particle(Species(1), DVec3::new(6.0, 5.0, 1.0));
    let c = h.add_particle(Species(1), DVec3::new(4.5, 5.0, 1.0));
    let _far = h.add_particle(Species(1), DVec3::new(1.0, 1.0, 1.0));
    let n = h.neighbors(a, 1.5).unwrap();
    assert_eq!(n, vec![b, c]);
}

#[test]
fn neighbors_cross_periodic_boundary() {
    let mut h = host();
    let a = h.add_particle(Species(1), DVec3::new(0.2, 5.0, 1.0));
    let b = h.add_particle(Species(1), DVec3::new(9.9, 5.0, 1.0));
    assert_eq!(h.neighbors(a, 0.5).unwrap(), vec![b]);
}

#[test]
fn unknown_particle_query_fails() {
    let h = host();
    assert!(matches!(h.neighbors(ParticleId(99), 1.0), Err(HostError::UnknownParticle(_))));
    assert!(h.particle(ParticleId(99)).is_none());
}

#[test]
fn film_height_quantile() {
    let mut h = host();
    for i in 0..10 {
        h.add_particle(Species(1), DVec3::new(i as f64, 0.0, i as f64));
    }
    h.set_film_fraction(1.0);
    assert_eq!(h.film_height(), 9.0);
    h.set_film_fraction(0.5);
    assert_eq!(h.film_height(), 4.0);
}

#[test]
fn ghosts_are_not_owned() {
    let mut h = host();
    let a = h.add_particle(Species(1), DVec3::ZERO);
    assert!(h.is_owned(a));
    h.mark_ghost(a);
    assert!(!h.is_owned(a));
}

// ─── Mutation Tests ───────────────────────────────────────────

#[test]
fn bond_create_and_delete() {
    let mut h = host();
    let a = h.add_particle(Species(1), DVec3::ZERO);
    let b = h.add_particle(Species(2), DVec3::new(1.0, 0.0, 0.0));
    let cs = h.create_bond(a, b, BondType(1)).unwrap();
    assert_eq!(cs.modified, vec![a, b]);
    assert_eq!(h.bonds(a).unwrap(), vec![(b, BondType(1))]);
    assert!(matches!(h.create_bond(b, a, BondType(1)), Err(HostError::DuplicateBond { .. })));

    h.delete_bond(b, a, BondType(1)).unwrap();
    assert!(h.bonds(a).unwrap().is_empty());
    assert!(matches!(h.delete_bond(a, b, BondType(1)), Err(HostError::MissingBond { .. })));
}

#[test]
fn delete_reports_positions_and_partners() {
    let mut h = host();
    let a = h.add_particle(Species(1), DVec3::new(1.0, 1.0, 1.0));
    let b = h.add_particle(Species(1), DVec3::new(2.0, 1.0, 1.0));
    h.add_bond(a, b, BondType(1)).unwrap();

    let cs = h.delete_particles(&[a]).unwrap();
    assert_eq!(cs.deleted, vec![(a, DVec3::new(1.0, 1.0, 1.0))]);
    assert_eq!(cs.modified, vec![b]);
    assert!(h.bonds(b).unwrap().is_empty());
    assert_eq!(h.particle_count(), 1);
}

#[test]
fn delete_is_atomic_on_unknown_id() {
    let mut h = host();
    let a = h.add_particle(Species(1), DVec3::ZERO);
    assert!(h.delete_particles(&[a, ParticleId(42)]).is_err());
    assert!(h.particle(a).is_some());
}

#[test]
fn relocate_remaps() {
    let mut h = host();
    let a = h.add_particle(Species(1), DVec3::new(9.5, 5.0, 1.0));
    let cs = h.relocate_particle(a, DVec3::new(10.5, 5.0, 1.0)).unwrap();
    let moved = cs.relocated[0];
    assert!((moved.to.x - 0.5).abs() < 1e-12);
    assert_eq!(h.neighbors_of_point(DVec3::new(0.5, 5.0, 1.0), 0.1), vec![a]);
}

#[test]
fn molecule_insertion_bonds_and_tags() {
    let mut h = host();
    let atoms = [
        (Species(3), DVec3::new(5.0, 5.0, 5.0)),
        (Species(4), DVec3::new(6.0, 5.0, 5.0)),
    ];
    let cs = h
        .insert_molecule(&atoms, &[(0, 1, BondType(2))], DVec3::new(0.0, 0.0, -1.0))
        .unwrap();
    assert_eq!(cs.created.len(), 2);
    let (p, q) = (cs.created[0], cs.created[1]);
    assert_eq!(h.bonds(p).unwrap(), vec![(q, BondType(2))]);
    let mp = h.particle(p).unwrap().molecule;
    assert!(!mp.is_none());
    assert_eq!(mp, h.particle(q).unwrap().molecule);
    assert_eq!(h.velocity(p), Some(DVec3::new(0.0, 0.0, -1.0)));
}

#[test]
fn rejecting_host_fails_mutations() {
    let mut h = host();
    let a = h.add_particle(Species(1), DVec3::ZERO);
    h.set_rejecting(true);
    let err = h.set_species(a, Species(2)).unwrap_err();
    assert!(matches!(err, HostError::Rejected(_)));
    let core: AdatomError = err.into();
    assert!(matches!(core, AdatomError::Execution(_)));
}

#[test]
fn change_set_merge() {
    let mut cs = ChangeSet {
        created: vec![ParticleId(1)],
        ..Default::default()
    };
    cs.merge(ChangeSet {
        modified: vec![ParticleId(2)],
        ..Default::default()
    });
    assert_eq!(cs.len(), 2);
    assert!(!cs.is_empty());
}

// ─── Collective / MD Tests ────────────────────────────────────

#[test]
fn single_process_collective() {
    let c = SingleProcess;
    assert!(c.is_root());
    assert_eq!(c.size(), 1);
    let mut v = [0.25, 0.75];
    c.broadcast(&mut v, 0).unwrap();
    assert_eq!(v, [0.25, 0.75]);
    assert!(c.broadcast(&mut v, 1).is_err());
    c.barrier().unwrap();
}

#[test]
fn static_md_leaves_positions() {
    let mut h = host();
    h.add_particle(Species(1), DVec3::new(1.0, 2.0, 3.0));
    let before = h.snapshot();
    let report = StaticMd.relax(&mut h, 100).unwrap();
    assert_eq!(report.steps, 100);
    assert_eq!(h.snapshot(), before);
}

#[test]
fn jitter_md_is_seeded() {
    let run = || {
        let mut h = host();
        for i in 0..5 {
            h.add_particle(Species(1), DVec3::new(i as f64, 1.0, 1.0));
        }
        JitterMd::new(0.1, 0.5, 9).relax(&mut h, 10).unwrap();
        h.snapshot()
    };
    let a = run();
    let b = run();
    assert_eq!(a, b);
    assert!(a.iter().all(|(_, _, p)| p.z > 1.0));
}
