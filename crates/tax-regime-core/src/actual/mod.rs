//! Lucro Real: taxes on adjusted accounting profit.

pub mod adjustments;
pub mod capital_remuneration;
pub mod credits;
pub mod engine;
pub mod ledger;
pub mod loss_compensation;
pub mod simulation;

pub use adjustments::{AdjustedIncome, Adjustment};
pub use capital_remuneration::{CapitalRemuneration, EquityContext, ReferenceRate};
pub use credits::{
    CapitalAsset, ContributionSettlement, CreditContext, CreditExpense, DepreciationMethod,
    ExpenseCategory, NonCumulativeResult,
};
pub use engine::{ActualDetail, ActualInput, ActualProfitEngine};
pub use ledger::{CreditLedger, LossLedger, LossLedgerDelta};
pub use loss_compensation::{compensate_losses, LossCompensation};
pub use simulation::{simulate, PeriodOutcome, SimulationInput, SimulationOutput};
