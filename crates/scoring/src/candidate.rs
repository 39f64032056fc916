//! Carrier candidate model.

use serde::{Deserialize, Serialize};

/// A selectable carrier service, with the signals scoring consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Stable identifier (e.g. "colissimo", "chronopost-express").
    pub id: String,

    /// Historical delivery success rate, in [0, 1].
    pub success_rate: f64,

    /// Average delivery delay in hours.
    pub avg_delay_hours: f64,

    /// Quoted cost in smallest currency unit (e.g. cents).
    pub cost_cents: i64,

    /// Whether the carrier currently reports a service degradation.
    pub degraded: bool,
}

impl Candidate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success_rate: 0.0,
            avg_delay_hours: 0.0,
            cost_cents: 0,
            degraded: false,
        }
    }

    pub fn with_success_rate(mut self, rate: f64) -> Self {
        self.success_rate = rate;
        self
    }

    pub fn with_avg_delay_hours(mut self, hours: f64) -> Self {
        self.avg_delay_hours = hours;
        self
    }

    pub fn with_cost_cents(mut self, cents: i64) -> Self {
        self.cost_cents = cents;
        self
    }

    pub fn degraded(mut self) -> Self {
        self.degraded = true;
        self
    }
}
