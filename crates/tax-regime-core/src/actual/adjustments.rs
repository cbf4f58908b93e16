use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TaxRegimeError;
use crate::types::*;
use crate::TaxRegimeResult;

/// A book-to-tax adjustment (LALUR addition or exclusion).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub description: String,
    pub amount: Money,
}

impl Adjustment {
    pub fn new(description: &str, amount: Money) -> Self {
        Adjustment {
            description: description.to_string(),
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedIncome {
    pub accounting_profit: Money,
    pub additions: Money,
    pub exclusions: Money,
    /// Profit + additions − exclusions; may be negative
    pub adjusted: Money,
}

/// Adjusted income = profit + Σ additions − Σ exclusions.
pub fn adjusted_income(
    accounting_profit: Money,
    additions: &[Adjustment],
    exclusions: &[Adjustment],
) -> AdjustedIncome {
    let additions: Money = additions.iter().map(|a| a.amount).sum();
    let exclusions: Money = exclusions.iter().map(|a| a.amount).sum();
    AdjustedIncome {
        accounting_profit,
        additions,
        exclusions,
        adjusted: accounting_profit + additions - exclusions,
    }
}

/// Adjustment amounts are magnitudes; the list they sit in gives the sign.
pub fn validate_adjustments(list: &str, adjustments: &[Adjustment]) -> TaxRegimeResult<()> {
    for (i, adj) in adjustments.iter().enumerate() {
        if adj.amount < Decimal::ZERO {
            return Err(TaxRegimeError::InvalidInput {
                field: format!("{list}[{i}].amount"),
                reason: format!(
                    "'{}' is negative; record it under the opposite list instead",
                    adj.description
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_adjusted_income() {
        let adds = vec![
            Adjustment::new("non-deductible fines", dec!(10_000)),
            Adjustment::new("excess entertainment", dec!(5_000)),
        ];
        let excl = vec![Adjustment::new("equity-method gain", dec!(40_000))];
        let a = adjusted_income(dec!(100_000), &adds, &excl);
        assert_eq!(a.additions, dec!(15_000));
        assert_eq!(a.adjusted, dec!(75_000));
    }

    #[test]
    fn test_exclusions_can_drive_income_negative() {
        let excl = vec![Adjustment::new("dividends received", dec!(50_000))];
        let a = adjusted_income(dec!(20_000), &[], &excl);
        assert_eq!(a.adjusted, dec!(-30_000));
    }

    #[test]
    fn test_negative_adjustment_rejected() {
        let adds = vec![Adjustment::new("typo", dec!(-1))];
        assert!(validate_adjustments("additions", &adds).is_err());
    }
}
