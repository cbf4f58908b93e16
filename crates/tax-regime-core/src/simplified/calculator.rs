use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::activity::{ActivityProfile, TaxType};
use crate::config::{AnnexTable, SimplifiedAnnex, TaxTables};
use crate::error::TaxRegimeError;
use crate::jurisdiction::JurisdictionProfile;
use crate::levies::{local_consumption_tax, payroll_contribution};
use crate::regime::{ExclusionReason, RegimeDetail, RegimeResult};
use crate::types::*;
use crate::TaxRegimeResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

fn default_one_month() -> u32 {
    1
}

/// Figures the simplified regime needs for one period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifiedInput {
    /// Gross revenue of the trailing 12 months (RBT12)
    pub trailing_revenue_12m: Money,
    /// Gross revenue of the period being assessed
    pub current_revenue: Money,
    pub monthly_payroll: Money,
    /// Trailing 12-month payroll; defaults to monthly payroll × 12
    #[serde(default)]
    pub trailing_payroll_12m: Option<Money>,
    /// Months in the assessed period
    #[serde(default = "default_one_month")]
    pub period_months: u32,
    /// Purchases netted from the goods base when the sublimit is exceeded
    #[serde(default)]
    pub taxable_purchases: Money,
}

/// Why the annex was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnexSelection {
    /// Fixed by the activity
    Activity,
    /// Payroll ratio reached the threshold
    FavorablePayrollRatio,
    /// Payroll ratio below the threshold
    UnfavorablePayrollRatio,
}

/// Replacement of the DAS local-tax share by the ordinary jurisdiction tax
/// for the part of revenue above the sublimit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SublimitCarveOut {
    pub sublimit: Money,
    pub excess_fraction: Rate,
    pub local_tax_share: Rate,
    /// DAS amount removed for the excess fraction
    pub removed_levy: Money,
    /// Ordinary ICMS/ISS charged in its place
    pub ordinary_tax: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedDetail {
    pub annex: SimplifiedAnnex,
    pub annex_selection: AnnexSelection,
    /// 1-based bracket index
    pub bracket: usize,
    pub nominal_rate: Rate,
    pub deduction: Money,
    pub effective_rate: Rate,
    pub payroll_ratio: Rate,
    /// Unified levy before any sublimit carve-out
    pub gross_levy: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sublimit_carve_out: Option<SublimitCarveOut>,
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// Simples Nacional calculator bound to one set of tables.
pub struct SimplifiedRegimeCalculator<'a> {
    tables: &'a TaxTables,
}

impl<'a> SimplifiedRegimeCalculator<'a> {
    pub fn new(tables: &'a TaxTables) -> Self {
        SimplifiedRegimeCalculator { tables }
    }

    pub fn compute(
        &self,
        input: &SimplifiedInput,
        activity: &ActivityProfile,
        jurisdiction: &JurisdictionProfile,
    ) -> TaxRegimeResult<RegimeResult> {
        validate_input(input)?;
        let national = &self.tables.national;
        let trailing = input.trailing_revenue_12m;

        if activity.simplified_prohibited {
            return Ok(RegimeResult::excluded(
                Regime::Simplified,
                ExclusionReason::ActivityProhibited {
                    activity_code: activity.activity_code.clone(),
                },
            ));
        }
        if trailing > national.simplified_ceiling {
            return Ok(RegimeResult::excluded(
                Regime::Simplified,
                ExclusionReason::SimplifiedCeilingExceeded {
                    ceiling: national.simplified_ceiling,
                    trailing_revenue: trailing,
                },
            ));
        }
        if trailing.is_zero() {
            return Ok(RegimeResult::excluded(
                Regime::Simplified,
                ExclusionReason::NoTrailingRevenue,
            ));
        }

        // Annex
        let trailing_payroll = input
            .trailing_payroll_12m
            .unwrap_or(input.monthly_payroll * Decimal::from(12));
        let payroll_ratio = trailing_payroll / trailing;
        let (annex, annex_selection) = select_annex(
            activity,
            payroll_ratio,
            national.payroll_ratio_threshold,
        );

        let table = self.tables.simplified.annex(annex).ok_or_else(|| {
            TaxRegimeError::ConfigError(format!("simplified tables are missing annex {annex:?}"))
        })?;
        let Some((index, effective_rate)) = effective_rate(table, trailing) else {
            return Ok(RegimeResult::excluded(
                Regime::Simplified,
                ExclusionReason::SimplifiedCeilingExceeded {
                    ceiling: table.brackets.last().map(|b| b.upper_bound).unwrap_or_default(),
                    trailing_revenue: trailing,
                },
            ));
        };
        let bracket = &table.brackets[index];
        let gross_levy = input.current_revenue * effective_rate;

        debug!(
            annex = ?annex,
            bracket = index + 1,
            effective_rate = %effective_rate,
            payroll_ratio = %payroll_ratio,
            "simplified bracket located"
        );

        let mut flags = Vec::new();
        let mut advisories = Vec::new();
        let mut components = Vec::new();
        let mut levy = gross_levy;

        // Sublimit carve-out
        let carve_out = if trailing > jurisdiction.simplified_sublimit {
            let excess_fraction = (trailing - jurisdiction.simplified_sublimit) / trailing;
            let removed_levy = gross_levy * bracket.local_tax_share * excess_fraction;
            levy -= removed_levy;

            let excess_revenue = input.current_revenue * excess_fraction;
            let excess_purchases = input.taxable_purchases * excess_fraction;
            let ordinary = local_consumption_tax(
                activity.tax_type,
                excess_revenue,
                excess_purchases,
                jurisdiction,
            );
            let ordinary_tax: Money = ordinary.iter().map(|c| c.amount).sum();
            components.extend(ordinary);

            let tax_name = match activity.tax_type {
                TaxType::Goods => "ICMS",
                TaxType::Services => "ISS",
            };
            flags.push("sublimit_exceeded".to_string());
            advisories.push(
                Advisory::new(
                    Severity::Warning,
                    format!(
                        "Trailing revenue {} exceeds the {} sublimit of {}: {} of revenue pays \
                         ordinary {} outside the unified levy",
                        brl(trailing),
                        jurisdiction.code,
                        brl(jurisdiction.simplified_sublimit),
                        pct(excess_fraction),
                        tax_name
                    ),
                )
                .cite("LC 123/2006, art. 19")
                .for_regime(Regime::Simplified),
            );
            Some(SublimitCarveOut {
                sublimit: jurisdiction.simplified_sublimit,
                excess_fraction,
                local_tax_share: bracket.local_tax_share,
                removed_levy: round_money(removed_levy),
                ordinary_tax,
            })
        } else {
            None
        };

        components.insert(
            0,
            TaxComponent::new(TaxKind::Das, input.current_revenue, effective_rate, levy),
        );

        // Annex IV pays employer contributions outside the unified levy
        if annex == SimplifiedAnnex::IV {
            let payroll = input.monthly_payroll * Decimal::from(input.period_months);
            if let Some(cpp) = payroll_contribution(payroll, national.annex_iv_cpp_rate()) {
                components.push(cpp);
            }
            flags.push("annex_iv_cpp_outside_das".to_string());
        }

        if activity.payroll_ratio_sensitive {
            advisories.push(
                Advisory::new(
                    Severity::Info,
                    format!(
                        "Payroll ratio {} against the {} threshold places the activity in annex {:?}",
                        pct(payroll_ratio),
                        pct(national.payroll_ratio_threshold),
                        annex
                    ),
                )
                .cite("LC 123/2006, art. 18, §5-J")
                .for_regime(Regime::Simplified),
            );
        }

        let detail = SimplifiedDetail {
            annex,
            annex_selection,
            bracket: index + 1,
            nominal_rate: bracket.nominal_rate,
            deduction: bracket.deduction,
            effective_rate,
            payroll_ratio,
            gross_levy: round_money(gross_levy),
            sublimit_carve_out: carve_out,
        };

        Ok(RegimeResult::assemble(
            Regime::Simplified,
            components,
            input.current_revenue,
            RegimeDetail::Simplified(detail),
            flags,
            advisories,
        ))
    }
}

/// Effective rate for a trailing revenue within an annex, with the 0-based
/// bracket index. `None` when the revenue is above the last bracket.
pub fn effective_rate(table: &AnnexTable, trailing_revenue: Money) -> Option<(usize, Rate)> {
    let (index, bracket) = table.locate(trailing_revenue)?;
    let rate = ratio_or_zero(
        trailing_revenue * bracket.nominal_rate - bracket.deduction,
        trailing_revenue,
    )
    .max(Decimal::ZERO);
    Some((index, rate))
}

fn select_annex(
    activity: &ActivityProfile,
    payroll_ratio: Rate,
    threshold: Rate,
) -> (SimplifiedAnnex, AnnexSelection) {
    if !activity.payroll_ratio_sensitive {
        return (activity.annex, AnnexSelection::Activity);
    }
    if payroll_ratio >= threshold {
        (
            activity.favorable_annex.unwrap_or(SimplifiedAnnex::III),
            AnnexSelection::FavorablePayrollRatio,
        )
    } else {
        (activity.annex, AnnexSelection::UnfavorablePayrollRatio)
    }
}

fn validate_input(input: &SimplifiedInput) -> TaxRegimeResult<()> {
    let figures = [
        ("trailing_revenue_12m", input.trailing_revenue_12m),
        ("current_revenue", input.current_revenue),
        ("monthly_payroll", input.monthly_payroll),
        ("taxable_purchases", input.taxable_purchases),
    ];
    for (field, value) in figures {
        if value < Decimal::ZERO {
            return Err(TaxRegimeError::InvalidInput {
                field: field.into(),
                reason: "must be zero or positive".into(),
            });
        }
    }
    if let Some(payroll) = input.trailing_payroll_12m {
        if payroll < Decimal::ZERO {
            return Err(TaxRegimeError::InvalidInput {
                field: "trailing_payroll_12m".into(),
                reason: "must be zero or positive".into(),
            });
        }
    }
    if input.period_months == 0 || input.period_months > 12 {
        return Err(TaxRegimeError::InvalidInput {
            field: "period_months".into(),
            reason: "must be between 1 and 12".into(),
        });
    }
    Ok(())
}
