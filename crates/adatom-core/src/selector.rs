//! Rejection-free event selection and the Gillespie waiting time.

use adatom_host::Collective;
use adatom_types::{AdatomError, AdatomResult};

use crate::catalog::EventCatalog;
use crate::event::Event;
use crate::rng::KmcRng;

/// Outcome of one selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub event: Event,
    pub rate: f64,
    pub total_rate: f64,
    /// Exponential waiting time `−ln(u2) / R`.
    pub dt: f64,
    pub u1: f64,
    pub u2: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EventSelector;

impl EventSelector {
    pub fn new() -> Self {
        Self
    }

    /// Exponential waiting time for a Poisson process of total rate `total_rate`.
    pub fn waiting_time(total_rate: f64, u2: f64) -> f64 {
        -u2.ln() / total_rate
    }

    /// Draws `u1` then `u2` from the run stream, keeps them identical on
    /// every rank, and selects. Nothing is drawn when the total rate is zero.
    pub fn select(
        &self,
        catalog: &EventCatalog,
        rng: &mut KmcRng,
        collective: &dyn Collective,
        now: f64,
    ) -> AdatomResult<Selection> {
        if catalog.total_rate() <= 0.0 {
            return Err(AdatomError::NoEligibleEvents { time: now });
        }
        let mut draws = [rng.uniform(), rng.uniform_open()];
        collective.broadcast(&mut draws, 0)?;
        self.select_with(catalog, draws[0], draws[1], now)
    }

    /// Deterministic selection from explicit draws `u1 ∈ [0, 1)`, `u2 ∈ (0, 1)`.
    pub fn select_with(&self, catalog: &EventCatalog, u1: f64, u2: f64, now: f64) -> AdatomResult<Selection> {
        let total_rate = catalog.total_rate();
        if total_rate <= 0.0 {
            return Err(AdatomError::NoEligibleEvents { time: now });
        }
        if !(u2 > 0.0 && u2 < 1.0) {
            return Err(AdatomError::InvalidParameters(format!("waiting-time draw {u2} outside (0, 1)")));
        }
        let (event, rate) = catalog
            .sample_by_rate(u1)
            .ok_or(AdatomError::NoEligibleEvents { time: now })?;
        Ok(Selection {
            event: *event,
            rate,
            total_rate,
            dt: Self::waiting_time(total_rate, u2),
            u1,
            u2,
        })
    }
}
