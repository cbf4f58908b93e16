//! Result model shared by the three regime calculators.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

#[cfg(feature = "actual")]
use crate::actual::ActualDetail;
#[cfg(feature = "presumed")]
use crate::presumed::PresumedDetail;
#[cfg(feature = "simplified")]
use crate::simplified::SimplifiedDetail;

/// Why a regime was left out of the comparison. Not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExclusionReason {
    SimplifiedCeilingExceeded { ceiling: Money, trailing_revenue: Money },
    ActivityProhibited { activity_code: String },
    NoTrailingRevenue,
    PresumedCeilingExceeded { ceiling: Money, annual_revenue: Money },
    ActualProfitRequired { activity_code: String },
}

impl ExclusionReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ExclusionReason::SimplifiedCeilingExceeded { .. } => "simplified_ceiling_exceeded",
            ExclusionReason::ActivityProhibited { .. } => "activity_prohibited",
            ExclusionReason::NoTrailingRevenue => "no_trailing_revenue",
            ExclusionReason::PresumedCeilingExceeded { .. } => "presumed_ceiling_exceeded",
            ExclusionReason::ActualProfitRequired { .. } => "actual_profit_required",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ExclusionReason::SimplifiedCeilingExceeded {
                ceiling,
                trailing_revenue,
            } => format!(
                "Trailing 12-month revenue {} exceeds the simplified-regime ceiling {}",
                brl(*trailing_revenue),
                brl(*ceiling)
            ),
            ExclusionReason::ActivityProhibited { activity_code } => format!(
                "Activity {} is barred from the simplified regime",
                activity_code
            ),
            ExclusionReason::NoTrailingRevenue => {
                "No trailing revenue: simplified-regime bracket cannot be determined".to_string()
            }
            ExclusionReason::PresumedCeilingExceeded {
                ceiling,
                annual_revenue,
            } => format!(
                "Annual revenue {} exceeds the presumed-profit ceiling {}",
                brl(*annual_revenue),
                brl(*ceiling)
            ),
            ExclusionReason::ActualProfitRequired { activity_code } => format!(
                "Activity {} is obliged to the actual-profit regime",
                activity_code
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Eligibility {
    Eligible,
    Excluded(ExclusionReason),
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

/// Regime-specific metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RegimeDetail {
    #[cfg(feature = "simplified")]
    Simplified(SimplifiedDetail),
    #[cfg(feature = "presumed")]
    Presumed(PresumedDetail),
    #[cfg(feature = "actual")]
    Actual(Box<ActualDetail>),
    NotApplicable { reason: String },
}

/// An IRPJ reduction applied from a regional incentive programme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedIncentive {
    pub name: String,
    pub reduction: Rate,
    pub amount: Money,
}

/// Liability of one regime for one period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeResult {
    pub regime: Regime,
    pub eligibility: Eligibility,
    pub total_liability: Money,
    pub components: Vec<TaxComponent>,
    pub effective_rate: Rate,
    pub detail: RegimeDetail,
    pub flags: Vec<String>,
    pub advisories: Vec<Advisory>,
}

impl RegimeResult {
    /// Assemble an eligible result. The total is the sum of the (already
    /// rounded) components; the effective rate is total over gross revenue.
    pub fn assemble(
        regime: Regime,
        components: Vec<TaxComponent>,
        gross_revenue: Money,
        detail: RegimeDetail,
        flags: Vec<String>,
        advisories: Vec<Advisory>,
    ) -> Self {
        let total_liability: Money = components.iter().map(|c| c.amount).sum();
        let effective_rate = ratio_or_zero(total_liability, gross_revenue).max(Decimal::ZERO);
        RegimeResult {
            regime,
            eligibility: Eligibility::Eligible,
            total_liability,
            components,
            effective_rate,
            detail,
            flags,
            advisories,
        }
    }

    /// A "not applicable" result carrying the exclusion reason.
    pub fn excluded(regime: Regime, reason: ExclusionReason) -> Self {
        RegimeResult {
            regime,
            total_liability: Decimal::ZERO,
            components: Vec::new(),
            effective_rate: Decimal::ZERO,
            detail: RegimeDetail::NotApplicable {
                reason: reason.describe(),
            },
            flags: vec![reason.code().to_string()],
            advisories: Vec::new(),
            eligibility: Eligibility::Excluded(reason),
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.eligibility.is_eligible()
    }

    /// Sum of the components for one tax.
    pub fn component(&self, tax: TaxKind) -> Money {
        self.components
            .iter()
            .filter(|c| c.tax == tax)
            .map(|c| c.amount)
            .sum()
    }

    /// Check the total == Σ components invariant.
    pub fn components_balance(&self) -> bool {
        let sum: Money = self.components.iter().map(|c| c.amount).sum();
        (sum - self.total_liability).abs() <= Decimal::new(1, 2)
    }
}
