//! Payment processing phases.

use std::time::Duration;

use serde::Serialize;

/// One simulated phase of payment processing. Phases run in declaration
/// order, each after the previous one has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    ValidatingPayment,
    ProcessingPayment,
    VerifyingTransaction,
    FinalizingOrder,
}

impl Phase {
    /// All phases in execution order.
    pub const ALL: [Phase; 4] = [
        Phase::ValidatingPayment,
        Phase::ProcessingPayment,
        Phase::VerifyingTransaction,
        Phase::FinalizingOrder,
    ];

    /// 1-indexed phase number.
    pub fn number(&self) -> u8 {
        match self {
            Phase::ValidatingPayment => 1,
            Phase::ProcessingPayment => 2,
            Phase::VerifyingTransaction => 3,
            Phase::FinalizingOrder => 4,
        }
    }

    /// Label shown while the phase runs.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::ValidatingPayment => "Validating payment details",
            Phase::ProcessingPayment => "Processing payment",
            Phase::VerifyingTransaction => "Verifying transaction",
            Phase::FinalizingOrder => "Finalizing order",
        }
    }

    /// Simulated duration when no override is configured.
    pub fn default_duration(&self) -> Duration {
        match self {
            Phase::ValidatingPayment => Duration::from_secs(2),
            Phase::ProcessingPayment => Duration::from_secs(3),
            Phase::VerifyingTransaction => Duration::from_secs(2),
            Phase::FinalizingOrder => Duration::from_secs(1),
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/4 {}", self.number(), self.label())
    }
}

/// Per-phase durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTimings {
    pub validating_payment: Duration,
    pub processing_payment: Duration,
    pub verifying_transaction: Duration,
    pub finalizing_order: Duration,
}

impl PhaseTimings {
    /// Every phase takes the same time; handy for tests.
    pub fn uniform(duration: Duration) -> Self {
        Self {
            validating_payment: duration,
            processing_payment: duration,
            verifying_transaction: duration,
            finalizing_order: duration,
        }
    }

    pub fn duration(&self, phase: Phase) -> Duration {
        match phase {
            Phase::ValidatingPayment => self.validating_payment,
            Phase::ProcessingPayment => self.processing_payment,
            Phase::VerifyingTransaction => self.verifying_transaction,
            Phase::FinalizingOrder => self.finalizing_order,
        }
    }

    /// Sum of all phase durations.
    pub fn total(&self) -> Duration {
        Phase::ALL.iter().map(|p| self.duration(*p)).sum()
    }
}

impl Default for PhaseTimings {
    fn default() -> Self {
        Self {
            validating_payment: Phase::ValidatingPayment.default_duration(),
            processing_payment: Phase::ProcessingPayment.default_duration(),
            verifying_transaction: Phase::VerifyingTransaction.default_duration(),
            finalizing_order: Phase::FinalizingOrder.default_duration(),
        }
    }
}
