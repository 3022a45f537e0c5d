//! Rates tabulated by the coordination of the primary participant.

use serde::{Deserialize, Serialize};

use crate::traits::{LocalEnvironment, RateModel};

/// `table[n]` is the rate for a participant with `n` bonds; higher
/// coordinations fall back to `beyond`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationTable {
    pub table: Vec<f64>,
    #[serde(default)]
    pub beyond: f64,
}

impl CoordinationTable {
    pub fn new(table: Vec<f64>, beyond: f64) -> Self {
        Self { table, beyond }
    }
}

impl RateModel for CoordinationTable {
    fn rate(&self, env: &LocalEnvironment) -> f64 {
        self.table
            .get(env.coordination as usize)
            .copied()
            .unwrap_or(self.beyond)
    }

    fn name(&self) -> &str {
        "coordination_table"
    }
}
