//! The kMC run loop.
//!
//! One step is: select from the catalog, execute through the host,
//! repair the catalog incrementally, advance the clock. Periodic
//! duties (rate resync, checkpoints, MD phases) hang off the kMC step
//! count.

use std::sync::Arc;

use adatom_config::{validate_config, KmcConfig};
use adatom_host::{Collective, Host, MdPhase, MdReport, SingleProcess};
use adatom_telemetry::{EventBus, RunEvent, RunEventKind};
use adatom_types::{AdatomError, AdatomResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::bond::BondIndex;
use crate::catalog::EventCatalog;
use crate::clock::{Cadence, ClockSnapshot, MdPlan, SimulationClock};
use crate::detector::{EventDetector, UpdateReport};
use crate::event::EventKey;
use crate::executor::EventExecutor;
use crate::rng::KmcRng;
use crate::selector::{EventSelector, Selection};
use crate::snapshot::{CheckpointSink, EngineSnapshot};
use crate::trim;

/// One entry of the executed-event history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExecutedEvent {
    /// kMC step number, starting at 1.
    pub step: u64,
    /// Clock time after the step.
    pub time: f64,
    pub key: EventKey,
    pub rate: f64,
}

/// Result of a single [`Engine::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub selection: Selection,
    pub update: UpdateReport,
    /// MD phase run after this step, if the cadence called for one.
    pub md: Option<MdReport>,
}

/// Why [`Engine::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    EndTime,
    StepBudget,
    NoEligibleEvents,
}

impl Termination {
    pub fn label(&self) -> &'static str {
        match self {
            Termination::EndTime => "end_time",
            Termination::StepBudget => "step_budget",
            Termination::NoEligibleEvents => "no_eligible_events",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub termination: Termination,
    pub clock: ClockSnapshot,
    pub final_total_rate: f64,
    pub cataloged: usize,
    pub particles: usize,
    pub bonds: usize,
}

/// Owns the catalog, clock and RNG stream of one run and drives the
/// host through them.
pub struct Engine<H: Host> {
    config: Arc<KmcConfig>,
    host: H,
    bonds: BondIndex,
    catalog: EventCatalog,
    detector: EventDetector,
    selector: EventSelector,
    executor: EventExecutor,
    clock: SimulationClock,
    cadence: Cadence,
    rng: KmcRng,
    md: Option<Box<dyn MdPhase>>,
    collective: Box<dyn Collective>,
    telemetry: EventBus,
    checkpoint: Option<Box<dyn CheckpointSink>>,
    history: Vec<ExecutedEvent>,
    record_history: bool,
    halted: Option<HaltRecord>,
}

/// What the engine remembers after a fatal error.
#[derive(Debug, Clone)]
struct HaltRecord {
    reason: String,
    time: f64,
    kmc_steps: u64,
}

impl HaltRecord {
    fn refusal(&self) -> AdatomError {
        AdatomError::AlreadyHalted {
            reason: self.reason.clone(),
            time: self.time,
            kmc_steps: self.kmc_steps,
        }
    }
}

impl<H: Host> Engine<H> {
    /// Validates `config`, indexes the host's bonds and builds the
    /// initial catalog with a full scan.
    pub fn new(config: KmcConfig, host: H) -> AdatomResult<Self> {
        validate_config(&config)?;
        let config = Arc::new(config);

        let bonds = BondIndex::from_host(&host)?;
        let mut detector = EventDetector::new(Arc::clone(&config));
        let mut catalog = EventCatalog::new();
        detector.populate(&host, &bonds, &mut catalog)?;

        info!(
            particles = host.particle_count(),
            bonds = bonds.len(),
            events = catalog.len(),
            total_rate = catalog.total_rate(),
            seed = config.seed,
            "kMC engine initialized"
        );

        Ok(Self {
            cadence: Cadence::new(config.cadence.clone()),
            rng: KmcRng::new(config.seed),
            config,
            host,
            bonds,
            catalog,
            detector,
            selector: EventSelector::new(),
            executor: EventExecutor::new(),
            clock: SimulationClock::new(),
            md: None,
            collective: Box::new(SingleProcess),
            telemetry: EventBus::new(),
            checkpoint: None,
            history: Vec::new(),
            record_history: false,
            halted: None,
        })
    }

    pub fn with_md_phase(mut self, md: Box<dyn MdPhase>) -> Self {
        self.md = Some(md);
        self
    }

    pub fn with_collective(mut self, collective: Box<dyn Collective>) -> Self {
        self.collective = collective;
        self
    }

    pub fn with_telemetry(mut self, bus: EventBus) -> Self {
        self.telemetry = bus;
        self
    }

    pub fn with_checkpoint(mut self, sink: Box<dyn CheckpointSink>) -> Self {
        self.checkpoint = Some(sink);
        self
    }

    /// Turns the executed-event history on or off. Off by default, since
    /// it grows by one entry per kMC step.
    pub fn set_record_history(&mut self, record: bool) {
        self.record_history = record;
    }

    /// Performs one kMC step.
    ///
    /// `NoEligibleEvents` is returned as is and leaves the state untouched.
    /// Any other failure comes back wrapped in `Halted`, after which every
    /// further call fails with `AlreadyHalted`.
    pub fn step(&mut self) -> AdatomResult<StepOutcome> {
        self.ensure_live()?;
        match self.try_step() {
            Ok(outcome) => Ok(outcome),
            Err(e) if !e.is_fatal() => Err(e),
            Err(e) => Err(self.halt(e)),
        }
    }

    fn try_step(&mut self) -> AdatomResult<StepOutcome> {
        let now = self.clock.time();
        let selection = self
            .selector
            .select(&self.catalog, &mut self.rng, self.collective.as_ref(), now)?;
        self.emit(RunEventKind::StepBegin {
            time: now,
            total_rate: selection.total_rate,
            cataloged: self.catalog.len(),
        });
        let key = selection.event.key();

        let report = self.executor.execute(
            &selection.event,
            &mut self.host,
            &mut self.bonds,
            &mut self.catalog,
            &self.detector,
            self.collective.as_ref(),
        )?;
        self.clock.advance(selection.dt)?;

        let step = self.clock.kmc_steps();
        debug!(
            step,
            event = %key,
            rate = selection.rate,
            dt = selection.dt,
            total_rate = selection.total_rate,
            "kMC step"
        );
        if self.record_history {
            self.history.push(ExecutedEvent {
                step,
                time: self.clock.time(),
                key,
                rate: selection.rate,
            });
        }
        self.emit(RunEventKind::EventExecuted {
            kind: key.kind().label().to_string(),
            key: key.to_string(),
            rate: selection.rate,
            dt: selection.dt,
        });
        self.emit(RunEventKind::CatalogUpdated {
            affected: report.update.affected,
            removed: report.update.removed,
            added: report.update.added,
        });

        if self.config.resync_interval > 0 && step % self.config.resync_interval == 0 {
            let drift = self.catalog.resync();
            info!(step, drift, "resynced total rate");
            self.emit(RunEventKind::CatalogResync { drift });
        }

        if self.config.checkpoint_interval > 0 && step % self.config.checkpoint_interval == 0 {
            self.write_checkpoint()?;
        }

        let md = match self.cadence.md_due(step) {
            Some(plan) if self.md.is_some() => Some(self.run_md(plan)?),
            _ => None,
        };

        self.telemetry.flush();
        Ok(StepOutcome {
            selection,
            update: report.update,
            md,
        })
    }

    /// Runs until the end time, the step budget, or quiescence.
    ///
    /// The budget counts loop iterations, so MD phases run on quiescence
    /// consume it as well. Without `md_on_quiescence` a zero total rate
    /// ends the run normally.
    pub fn run(&mut self) -> AdatomResult<RunSummary> {
        self.ensure_live()?;
        let end = self.config.run.end_time;
        let budget = self.config.run.kmc_steps;
        let mut iterations = 0u64;

        let termination = loop {
            if self.clock.reached(end) {
                break Termination::EndTime;
            }
            if iterations >= budget {
                break Termination::StepBudget;
            }
            iterations += 1;

            match self.step() {
                Ok(_) => {}
                Err(AdatomError::NoEligibleEvents { .. }) => match self.cadence.on_quiescence() {
                    Some(plan) if self.md.is_some() => {
                        debug!(time = self.clock.time(), "no eligible events, running MD");
                        if let Err(e) = self.run_md(plan) {
                            return Err(self.halt(e));
                        }
                        self.telemetry.flush();
                    }
                    _ => break Termination::NoEligibleEvents,
                },
                Err(e) => return Err(e),
            }
        };

        let summary = self.summary(termination);
        info!(
            reason = termination.label(),
            time = summary.clock.time,
            kmc_steps = summary.clock.kmc_steps,
            md_steps = summary.clock.md_steps,
            events = summary.cataloged,
            "kMC run finished"
        );
        self.emit(RunEventKind::Terminated {
            reason: termination.label().to_string(),
            time: summary.clock.time,
        });
        self.telemetry.finalize();
        Ok(summary)
    }

    /// Runs one MD phase of `steps` steps outside the regular cadence.
    pub fn run_md_phase(&mut self, steps: u64) -> AdatomResult<MdReport> {
        self.ensure_live()?;
        match self.run_md(MdPlan { steps, long: false }) {
            Ok(report) => Ok(report),
            Err(e) => Err(self.halt(e)),
        }
    }

    /// Hands the host to the MD phase, trims desorbed particles, then
    /// rebuilds the bond index and the catalog from scratch.
    fn run_md(&mut self, plan: MdPlan) -> AdatomResult<MdReport> {
        let Some(md) = self.md.as_mut() else {
            return Ok(MdReport::default());
        };
        let report = md.relax(&mut self.host, plan.steps)?;
        self.clock.record_md(report.steps, self.cadence.md_time_per_step());
        info!(
            phase = md.name(),
            steps = report.steps,
            long = plan.long,
            relocated = report.relocated,
            "MD phase complete"
        );
        self.emit(RunEventKind::MdPhase {
            steps: report.steps,
            long: plan.long,
        });

        if let Some(changes) = trim::trim_desorbed(&mut self.host, &self.config.trim)? {
            self.emit(RunEventKind::Trimmed {
                deleted: changes.deleted.len(),
            });
        }

        self.rescan()?;
        Ok(report)
    }

    /// Rebuilds the bond index from the host and repopulates the catalog.
    pub fn rescan(&mut self) -> AdatomResult<()> {
        self.bonds = BondIndex::from_host(&self.host)?;
        self.detector.populate(&self.host, &self.bonds, &mut self.catalog)?;
        Ok(())
    }

    /// Hands a snapshot to the checkpoint sink, if one is attached.
    pub fn write_checkpoint(&mut self) -> AdatomResult<()> {
        let snapshot = self.snapshot();
        let Some(sink) = self.checkpoint.as_mut() else {
            return Ok(());
        };
        sink.checkpoint(&snapshot)?;
        info!(sink = sink.name(), time = snapshot.clock.time, "checkpoint written");
        self.emit(RunEventKind::Checkpoint {
            time: snapshot.clock.time,
        });
        Ok(())
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            clock: self.clock.snapshot(),
            catalog: self.catalog.stats(),
            particles: self.host.particle_count(),
            bonds: self.bonds.len(),
            film_height: self.detector.film_height(),
            seed: self.rng.seed(),
            draws: self.rng.draws(),
        }
    }

    pub fn summary(&self, termination: Termination) -> RunSummary {
        RunSummary {
            termination,
            clock: self.clock.snapshot(),
            final_total_rate: self.catalog.total_rate(),
            cataloged: self.catalog.len(),
            particles: self.host.particle_count(),
            bonds: self.bonds.len(),
        }
    }

    /// Whether a fatal error has stopped this engine.
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    fn ensure_live(&self) -> AdatomResult<()> {
        match &self.halted {
            Some(record) => Err(record.refusal()),
            None => Ok(()),
        }
    }

    fn halt(&mut self, source: AdatomError) -> AdatomError {
        self.halted = Some(HaltRecord {
            reason: source.to_string(),
            time: self.clock.time(),
            kmc_steps: self.clock.kmc_steps(),
        });
        error!(
            time = self.clock.time(),
            kmc_steps = self.clock.kmc_steps(),
            md_steps = self.clock.md_steps(),
            error = %source,
            "kMC run halted"
        );
        self.emit(RunEventKind::Terminated {
            reason: "halted".to_string(),
            time: self.clock.time(),
        });
        self.telemetry.flush();
        AdatomError::Halted {
            source: Box::new(source),
            time: self.clock.time(),
            kmc_steps: self.clock.kmc_steps(),
            md_steps: self.clock.md_steps(),
        }
    }

    fn emit(&mut self, kind: RunEventKind) {
        self.telemetry.emit(RunEvent::new(self.clock.kmc_steps(), kind));
    }

    pub fn config(&self) -> &KmcConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    pub fn bonds(&self) -> &BondIndex {
        &self.bonds
    }

    pub fn detector(&self) -> &EventDetector {
        &self.detector
    }

    pub fn rng(&self) -> &KmcRng {
        &self.rng
    }

    pub fn history(&self) -> &[ExecutedEvent] {
        &self.history
    }

    pub fn into_host(self) -> H {
        self.host
    }
}
