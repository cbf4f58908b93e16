use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::regime::{Eligibility, RegimeResult};
use crate::types::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedRegime {
    /// 1 = cheapest
    pub rank: usize,
    pub result: RegimeResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedRegime {
    pub regime: Regime,
    pub reason: String,
    pub reason_code: String,
}

/// Split results into ranked (ascending liability, ties by regime order)
/// and excluded.
pub fn rank_results(results: Vec<RegimeResult>) -> (Vec<RankedRegime>, Vec<ExcludedRegime>) {
    let mut eligible = Vec::new();
    let mut excluded = Vec::new();
    for result in results {
        match &result.eligibility {
            Eligibility::Eligible => eligible.push(result),
            Eligibility::Excluded(reason) => excluded.push(ExcludedRegime {
                regime: result.regime,
                reason: reason.describe(),
                reason_code: reason.code().to_string(),
            }),
        }
    }
    eligible.sort_by(|a, b| {
        a.total_liability
            .cmp(&b.total_liability)
            .then(a.regime.cmp(&b.regime))
    });
    let ranked = eligible
        .into_iter()
        .enumerate()
        .map(|(i, result)| RankedRegime { rank: i + 1, result })
        .collect();
    (ranked, excluded)
}

/// Savings of the cheapest regime over the most expensive, in money and as
/// a fraction of the most expensive.
pub fn savings(ranked: &[RankedRegime]) -> (Money, Rate) {
    match (ranked.first(), ranked.last()) {
        (Some(cheapest), Some(dearest)) => {
            let amount = dearest.result.total_liability - cheapest.result.total_liability;
            (amount, ratio_or_zero(amount, dearest.result.total_liability))
        }
        _ => (Decimal::ZERO, Decimal::ZERO),
    }
}

/// One row per regime for tabular or CSV output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRegimeRecord {
    pub regime: Regime,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,
    pub total_liability: Money,
    pub effective_rate: Rate,
    /// Amount per tax code
    pub components: BTreeMap<String, Money>,
}

impl FlatRegimeRecord {
    pub fn from_ranked(ranked: &RankedRegime) -> Self {
        let mut components = BTreeMap::new();
        for c in &ranked.result.components {
            *components
                .entry(c.tax.code().to_string())
                .or_insert(Decimal::ZERO) += c.amount;
        }
        FlatRegimeRecord {
            regime: ranked.result.regime,
            label: ranked.result.regime.label().to_string(),
            rank: Some(ranked.rank),
            eligible: true,
            reason_code: None,
            total_liability: ranked.result.total_liability,
            effective_rate: ranked.result.effective_rate,
            components,
        }
    }

    pub fn from_excluded(excluded: &ExcludedRegime) -> Self {
        FlatRegimeRecord {
            regime: excluded.regime,
            label: excluded.regime.label().to_string(),
            rank: None,
            eligible: false,
            reason_code: Some(excluded.reason_code.clone()),
            total_liability: Decimal::ZERO,
            effective_rate: Decimal::ZERO,
            components: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regime::{ExclusionReason, RegimeDetail};
    use rust_decimal_macros::dec;

    fn result(regime: Regime, amount: Money) -> RegimeResult {
        RegimeResult::assemble(
            regime,
            vec![TaxComponent::new(TaxKind::Irpj, amount, dec!(1), amount)],
            dec!(100_000),
            RegimeDetail::NotApplicable {
                reason: "test".into(),
            },
            vec![],
            vec![],
        )
    }

    #[test]
    fn test_ranked_ascending() {
        let (ranked, excluded) = rank_results(vec![
            result(Regime::ActualProfit, dec!(9_000)),
            result(Regime::Simplified, dec!(12_000)),
            result(Regime::PresumedProfit, dec!(10_000)),
        ]);
        let order: Vec<Regime> = ranked.iter().map(|r| r.result.regime).collect();
        assert_eq!(
            order,
            vec![Regime::ActualProfit, Regime::PresumedProfit, Regime::Simplified]
        );
        assert!(excluded.is_empty());
        assert_eq!(savings(&ranked), (dec!(3_000), dec!(0.25)));
    }

    #[test]
    fn test_tie_prefers_simpler_regime() {
        let (ranked, _) = rank_results(vec![
            result(Regime::ActualProfit, dec!(10_000)),
            result(Regime::PresumedProfit, dec!(10_000)),
            result(Regime::Simplified, dec!(10_000)),
        ]);
        assert_eq!(ranked[0].result.regime, Regime::Simplified);
        assert_eq!(ranked[2].result.regime, Regime::ActualProfit);
    }

    #[test]
    fn test_excluded_split_out() {
        let (ranked, excluded) = rank_results(vec![
            RegimeResult::excluded(Regime::Simplified, ExclusionReason::NoTrailingRevenue),
            result(Regime::ActualProfit, dec!(5_000)),
        ]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(excluded[0].reason_code, "no_trailing_revenue");
        assert_eq!(savings(&ranked), (dec!(0), dec!(0)));
    }

    #[test]
    fn test_flat_record_groups_components() {
        let (ranked, _) = rank_results(vec![result(Regime::ActualProfit, dec!(5_000))]);
        let flat = FlatRegimeRecord::from_ranked(&ranked[0]);
        assert_eq!(flat.components["irpj"], dec!(5_000));
        assert_eq!(flat.rank, Some(1));
    }
}
