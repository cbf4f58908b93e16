//! Capped tax-loss compensation (Lei 9.065/1995, arts. 15 and 16).

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::ledger::{LossLedger, LossLedgerDelta};
use crate::types::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossCompensation {
    pub adjusted_income: Money,
    /// Cap on the compensation of each ledger this period
    pub compensation_limit: Money,
    pub irpj_base: Money,
    pub csll_base: Money,
    pub delta: LossLedgerDelta,
    pub ledger_after: LossLedger,
}

impl LossCompensation {
    pub fn irpj_compensated(&self) -> Money {
        self.delta.irpj_compensated()
    }

    pub fn csll_compensated(&self) -> Money {
        self.delta.csll_compensated
    }
}

/// Compensate prior losses against adjusted income.
///
/// A non-positive result adds the loss to the ledgers (the part explained
/// by a non-operating loss goes to the segregated balance) and leaves both
/// bases at zero. A positive result is reduced by at most `cap` of itself:
/// the non-operating balance first, and only up to the period's
/// non-operating gain, then the operating balance within what is left of
/// the limit. The CSLL negative base is compensated on its own under the
/// same limit.
pub fn compensate_losses(
    adjusted_income: Money,
    non_operating_result: Money,
    prior: &LossLedger,
    cap: Rate,
) -> LossCompensation {
    let mut delta = LossLedgerDelta::default();

    if adjusted_income <= Decimal::ZERO {
        let loss = -adjusted_income;
        let non_operating_part = if non_operating_result < Decimal::ZERO {
            (-non_operating_result).min(loss)
        } else {
            Decimal::ZERO
        };
        delta.non_operating_added = non_operating_part;
        delta.operating_added = loss - non_operating_part;
        delta.csll_added = loss;
        return LossCompensation {
            adjusted_income,
            compensation_limit: Decimal::ZERO,
            irpj_base: Decimal::ZERO,
            csll_base: Decimal::ZERO,
            ledger_after: prior.apply(&delta),
            delta,
        };
    }

    // Truncated so the compensation never exceeds the cap by a rounding cent
    let limit = (adjusted_income * cap).round_dp_with_strategy(2, RoundingStrategy::ToZero);

    let non_operating_gain = non_operating_result.max(Decimal::ZERO);
    delta.non_operating_compensated = prior
        .non_operating_loss
        .min(non_operating_gain)
        .min(limit);
    delta.operating_compensated = prior
        .operating_loss
        .min(limit - delta.non_operating_compensated);
    delta.csll_compensated = prior.csll_negative_base.min(limit);

    LossCompensation {
        adjusted_income,
        compensation_limit: limit,
        irpj_base: adjusted_income - delta.irpj_compensated(),
        csll_base: adjusted_income - delta.csll_compensated,
        ledger_after: prior.apply(&delta),
        delta,
    }
}
