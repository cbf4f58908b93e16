//! Caller-owned carryforward balances. The engine takes the prior ledger and
//! returns the posterior one; it never mutates state it does not own.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TaxRegimeError;
use crate::types::*;
use crate::TaxRegimeResult;

/// Accumulated tax-loss balances.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LossLedger {
    /// IRPJ operating loss carryforward
    #[serde(default)]
    pub operating_loss: Money,
    /// IRPJ non-operating (capital) loss, usable only against non-operating gains
    #[serde(default)]
    pub non_operating_loss: Money,
    /// CSLL negative base, tracked independently
    #[serde(default)]
    pub csll_negative_base: Money,
}

impl LossLedger {
    pub fn zeroed() -> Self {
        Self::default()
    }

    pub fn new(operating_loss: Money, non_operating_loss: Money, csll_negative_base: Money) -> Self {
        LossLedger {
            operating_loss,
            non_operating_loss,
            csll_negative_base,
        }
    }

    /// Total IRPJ carryforward.
    pub fn irpj_balance(&self) -> Money {
        self.operating_loss + self.non_operating_loss
    }

    pub fn is_empty(&self) -> bool {
        self.irpj_balance().is_zero() && self.csll_negative_base.is_zero()
    }

    pub fn validate(&self) -> TaxRegimeResult<()> {
        for (field, value) in [
            ("loss_ledger.operating_loss", self.operating_loss),
            ("loss_ledger.non_operating_loss", self.non_operating_loss),
            ("loss_ledger.csll_negative_base", self.csll_negative_base),
        ] {
            if value < Decimal::ZERO {
                return Err(TaxRegimeError::InvalidInput {
                    field: field.into(),
                    reason: "ledger balances cannot be negative".into(),
                });
            }
        }
        Ok(())
    }

    /// Apply a delta, producing the posterior ledger.
    pub fn apply(&self, delta: &LossLedgerDelta) -> LossLedger {
        LossLedger {
            operating_loss: (self.operating_loss - delta.operating_compensated
                + delta.operating_added)
                .max(Decimal::ZERO),
            non_operating_loss: (self.non_operating_loss - delta.non_operating_compensated
                + delta.non_operating_added)
                .max(Decimal::ZERO),
            csll_negative_base: (self.csll_negative_base - delta.csll_compensated
                + delta.csll_added)
                .max(Decimal::ZERO),
        }
    }
}

/// Movement of each loss balance within one period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LossLedgerDelta {
    pub operating_compensated: Money,
    pub non_operating_compensated: Money,
    pub csll_compensated: Money,
    pub operating_added: Money,
    pub non_operating_added: Money,
    pub csll_added: Money,
}

impl LossLedgerDelta {
    pub fn irpj_compensated(&self) -> Money {
        self.operating_compensated + self.non_operating_compensated
    }
}

/// Non-cumulative PIS/COFINS credit surplus carried to later periods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreditLedger {
    #[serde(default)]
    pub pis_carryforward: Money,
    #[serde(default)]
    pub cofins_carryforward: Money,
}

impl CreditLedger {
    pub fn zeroed() -> Self {
        Self::default()
    }

    pub fn total(&self) -> Money {
        self.pis_carryforward + self.cofins_carryforward
    }

    pub fn validate(&self) -> TaxRegimeResult<()> {
        if self.pis_carryforward < Decimal::ZERO || self.cofins_carryforward < Decimal::ZERO {
            return Err(TaxRegimeError::InvalidInput {
                field: "credit_ledger".into(),
                reason: "carryforward balances cannot be negative".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zeroed_is_empty() {
        assert!(LossLedger::zeroed().is_empty());
        assert_eq!(CreditLedger::zeroed().total(), dec!(0));
    }

    #[test]
    fn test_apply_delta() {
        let prior = LossLedger::new(dec!(1_000), dec!(200), dec!(900));
        let delta = LossLedgerDelta {
            operating_compensated: dec!(300),
            non_operating_compensated: dec!(50),
            csll_compensated: dec!(300),
            ..Default::default()
        };
        let after = prior.apply(&delta);
        assert_eq!(after, LossLedger::new(dec!(700), dec!(150), dec!(600)));
        assert_eq!(delta.irpj_compensated(), dec!(350));
    }

    #[test]
    fn test_negative_balance_rejected() {
        let ledger = LossLedger::new(dec!(-1), dec!(0), dec!(0));
        assert!(ledger.validate().is_err());
    }
}
