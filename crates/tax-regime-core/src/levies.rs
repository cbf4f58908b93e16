//! Levy primitives shared by the regime calculators: IRPJ with surtax and
//! regional reduction, local consumption tax (ICMS or ISS) and employer
//! payroll contributions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::activity::TaxType;
use crate::config::NationalRates;
use crate::jurisdiction::JurisdictionProfile;
use crate::regime::AppliedIncentive;
use crate::types::*;

/// IRPJ for one base, split into normal rate and surtax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeTaxBreakdown {
    pub base: Money,
    pub normal: Money,
    pub surtax_threshold: Money,
    pub surtax_base: Money,
    pub surtax: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incentive: Option<AppliedIncentive>,
}

impl IncomeTaxBreakdown {
    pub fn total(&self) -> Money {
        self.normal + self.surtax
    }

    pub fn components(&self, rates: &NationalRates) -> Vec<TaxComponent> {
        vec![
            TaxComponent::new(TaxKind::Irpj, self.base, rates.irpj_rate, self.normal),
            TaxComponent::new(
                TaxKind::IrpjSurtax,
                self.surtax_base,
                rates.irpj_surtax_rate,
                self.surtax,
            ),
        ]
    }
}

/// IRPJ = base × normal rate + surtax on the excess over the prorated
/// threshold, reduced by the largest active regional incentive.
pub fn income_tax(
    base: Money,
    period_months: u32,
    rates: &NationalRates,
    jurisdiction: &JurisdictionProfile,
) -> IncomeTaxBreakdown {
    let base = base.max(Decimal::ZERO);
    let surtax_threshold = rates.surtax_threshold(period_months);
    let surtax_base = (base - surtax_threshold).max(Decimal::ZERO);
    let mut normal = base * rates.irpj_rate;
    let mut surtax = surtax_base * rates.irpj_surtax_rate;

    let incentive = jurisdiction
        .best_active_incentive()
        .map(|(name, incentive)| {
            let reduction = incentive.reduction.min(Decimal::ONE);
            let amount = (normal + surtax) * reduction;
            normal -= normal * reduction;
            surtax -= surtax * reduction;
            AppliedIncentive {
                name: name.to_string(),
                reduction,
                amount: round_money(amount),
            }
        });

    IncomeTaxBreakdown {
        base,
        normal: round_money(normal),
        surtax_threshold,
        surtax_base,
        surtax: round_money(surtax),
        incentive,
    }
}

/// ICMS (plus surcharge) for goods or ISS for services on `revenue`.
///
/// Goods are taxed on revenue net of taxable purchases, standing in for the
/// ICMS credit on inputs; the surcharge applies only to this branch.
pub fn local_consumption_tax(
    tax_type: TaxType,
    revenue: Money,
    taxable_purchases: Money,
    jurisdiction: &JurisdictionProfile,
) -> Vec<TaxComponent> {
    match tax_type {
        TaxType::Goods => {
            let base = (revenue - taxable_purchases).max(Decimal::ZERO);
            let mut components = vec![TaxComponent::levied(
                TaxKind::Icms,
                base,
                jurisdiction.goods_tax_standard_rate,
            )];
            if jurisdiction.surcharge.exists && jurisdiction.surcharge.rate > Decimal::ZERO {
                components.push(TaxComponent::levied(
                    TaxKind::IcmsSurcharge,
                    base,
                    jurisdiction.surcharge.rate,
                ));
            }
            components
        }
        TaxType::Services => vec![TaxComponent::levied(
            TaxKind::Iss,
            revenue.max(Decimal::ZERO),
            jurisdiction.services_tax.reference_rate,
        )],
    }
}

/// Employer contributions on payroll, or `None` when there is no payroll.
pub fn payroll_contribution(payroll: Money, rate: Rate) -> Option<TaxComponent> {
    (payroll > Decimal::ZERO).then(|| TaxComponent::levied(TaxKind::Cpp, payroll, rate))
}
