//! Benchmark scenarios: a procedural host plus a run configuration.
//!
//! Three canonical scenarios for regression testing:
//! 1. **Simple adsorption**: gas-phase adsorbates land on a substrate and desorb again
//! 2. **Brownian diffusion**: adatoms hop across a substrate with periodic MD jitter
//! 3. **Polymer network**: monomers link into chains and unlink by coordination

use serde::{Deserialize, Serialize};

use adatom_config::{
    BondBreakTemplate, BondFormTemplate, DepositionTemplate, DesorptionTemplate, DiffusionTemplate, KmcConfig,
    MoleculeTemplate, ValenceRule,
};
use adatom_host::InMemoryHost;
use adatom_math::{DVec3, PeriodicBox};
use adatom_rates::{CoordinationTable, HertzKnudsenFlux, RateLaw};
use adatom_types::{BondType, Species};

/// Substrate atoms.
pub const SUBSTRATE: Species = Species(1);
/// Mobile or adsorbed species.
pub const ADATOM: Species = Species(2);
/// Polymerizing monomer.
pub const MONOMER: Species = Species(3);
/// Backbone bond between monomers.
pub const BACKBONE: BondType = BondType(1);

/// Which benchmark scenario to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioKind {
    /// Deposition onto a substrate balanced by desorption.
    SimpleAdsorption,
    /// Lateral hopping of adatoms with MD phases in between.
    BrownianDiffusion,
    /// Bond formation and breaking among monomers.
    PolymerNetwork,
}

impl ScenarioKind {
    /// Returns all scenario kinds.
    pub fn all() -> &'static [ScenarioKind] {
        &[
            ScenarioKind::SimpleAdsorption,
            ScenarioKind::BrownianDiffusion,
            ScenarioKind::PolymerNetwork,
        ]
    }

    /// Returns a human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::SimpleAdsorption => "simple_adsorption",
            ScenarioKind::BrownianDiffusion => "brownian_diffusion",
            ScenarioKind::PolymerNetwork => "polymer_network",
        }
    }

    /// Parses a name produced by [`ScenarioKind::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.name() == name)
    }
}

/// A fully specified benchmark scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub kind: ScenarioKind,
    /// Initial configuration.
    pub host: InMemoryHost,
    /// Run parameters. `run.kmc_steps` is the step budget.
    pub config: KmcConfig,
    /// Per-axis amplitude of the jitter MD phase, if the scenario runs MD.
    pub md_amplitude: Option<f64>,
}

fn lateral_hops(length: f64) -> Vec<DVec3> {
    vec![
        DVec3::new(length, 0.0, 0.0),
        DVec3::new(-length, 0.0, 0.0),
        DVec3::new(0.0, length, 0.0),
        DVec3::new(0.0, -length, 0.0),
    ]
}

/// Square substrate layer with `n × n` sites at spacing `a`, at height `z`.
fn substrate(host: &mut InMemoryHost, n: usize, a: f64, z: f64) {
    for i in 0..n {
        for j in 0..n {
            host.add_particle(
                SUBSTRATE,
                DVec3::new((i as f64 + 0.5) * a, (j as f64 + 0.5) * a, z),
            );
        }
    }
}

impl Scenario {
    /// Create the simple adsorption scenario.
    ///
    /// An 8×8 substrate at 2 Å spacing exposed to a dilute gas. Adsorption
    /// follows the Hertz-Knudsen impingement flux, desorption is activated.
    pub fn simple_adsorption() -> Self {
        let mut host = InMemoryHost::new(PeriodicBox::slab(16.0, 16.0, 30.0), 2.5);
        substrate(&mut host, 8, 2.0, 1.0);

        let mut config = KmcConfig::kmc_only(1, 2_000);
        config.species.default_sigma = 0.8;
        config.events.deposition = vec![DepositionTemplate {
            name: "adsorb".into(),
            parent_species: SUBSTRATE,
            offset: 1.5,
            // 1e-6 bar of a 28 g/mol gas over 10 Å² sites
            rate: RateLaw::HertzKnudsen(HertzKnudsenFlux::new(1e-6, 10.0, 28.0)),
            sticking_coefficient: 0.5,
            molecule: MoleculeTemplate::monoatomic(ADATOM),
            scan_band: None,
            reject_above: None,
            insertion_velocity: DVec3::ZERO,
        }];
        config.events.desorption = vec![DesorptionTemplate {
            species: ADATOM,
            rate: RateLaw::arrhenius(1e13, 15.0),
            max_bonds: 0,
        }];

        Self {
            kind: ScenarioKind::SimpleAdsorption,
            host,
            config,
            md_amplitude: None,
        }
    }

    /// Create the Brownian diffusion scenario.
    ///
    /// 16 adatoms on a 10×10 substrate hop by 1 Å. A short jitter MD phase
    /// runs every 100 kMC steps.
    pub fn brownian_diffusion() -> Self {
        let mut host = InMemoryHost::new(PeriodicBox::slab(20.0, 20.0, 30.0), 2.5);
        substrate(&mut host, 10, 2.0, 1.0);
        for i in 0..4 {
            for j in 0..4 {
                host.add_particle(ADATOM, DVec3::new(5.0 * i as f64 + 1.0, 5.0 * j as f64 + 1.0, 2.5));
            }
        }

        let mut config = KmcConfig::kmc_only(2, 2_000);
        config.species.default_sigma = 0.8;
        config.cadence.kmc_per_md = 100;
        config.cadence.md_steps = 50;
        config.cadence.md_time_per_step = 1e-15;
        config.trim.height_above_film = Some(10.0);
        config.events.diffusion = vec![DiffusionTemplate {
            species: ADATOM,
            hops: lateral_hops(1.0),
            rate: RateLaw::arrhenius(1e12, 10.0),
            displacive: true,
            diffused_species: None,
            neighbor_requirement: None,
        }];

        Self {
            kind: ScenarioKind::BrownianDiffusion,
            host,
            config,
            md_amplitude: Some(0.05),
        }
    }

    /// Create the polymer network scenario.
    ///
    /// 6×6×3 monomers at 1.2 Å spacing, each allowed two backbone bonds.
    /// Breaking slows down with the owner's coordination.
    pub fn polymer_network() -> Self {
        let mut host = InMemoryHost::new(PeriodicBox::slab(7.2, 7.2, 20.0), 2.0);
        for i in 0..6 {
            for j in 0..6 {
                for k in 0..3 {
                    host.add_particle(
                        MONOMER,
                        DVec3::new(1.2 * i as f64 + 0.6, 1.2 * j as f64 + 0.6, 1.2 * k as f64 + 1.0),
                    );
                }
            }
        }

        let mut config = KmcConfig::kmc_only(3, 2_000);
        config.species.valence = vec![ValenceRule {
            species: MONOMER,
            bond_type: None,
            max_bonds: 2,
        }];
        config.events.bond_form = vec![BondFormTemplate {
            species: [MONOMER, MONOMER],
            bond_type: BACKBONE,
            cutoff: 1.5,
            rate: RateLaw::constant(10.0),
            consume_participants: false,
            lone_only: false,
            same_molecule: true,
            catalysts: vec![],
        }];
        config.events.bond_break = vec![BondBreakTemplate {
            bond_type: BACKBONE,
            rate: RateLaw::Coordination(CoordinationTable::new(vec![0.0, 2.0, 0.5], 0.1)),
            catalysts: vec![],
        }];

        Self {
            kind: ScenarioKind::PolymerNetwork,
            host,
            config,
            md_amplitude: None,
        }
    }

    /// Create a scenario by kind.
    pub fn from_kind(kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::SimpleAdsorption => Self::simple_adsorption(),
            ScenarioKind::BrownianDiffusion => Self::brownian_diffusion(),
            ScenarioKind::PolymerNetwork => Self::polymer_network(),
        }
    }

    /// Override the kMC step budget.
    pub fn with_steps(mut self, steps: u64) -> Self {
        self.config.run.kmc_steps = steps;
        self
    }

    /// Override the run seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }
}
