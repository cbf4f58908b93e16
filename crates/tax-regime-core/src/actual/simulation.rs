//! Multi-period actual-profit run threading the loss and credit ledgers
//! from one period into the next.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

use super::engine::{ActualDetail, ActualInput, ActualProfitEngine};
use super::ledger::{CreditLedger, LossLedger};
use crate::activity::ActivityProfile;
use crate::error::TaxRegimeError;
use crate::jurisdiction::JurisdictionProfile;
use crate::regime::{RegimeDetail, RegimeResult};
use crate::types::*;
use crate::TaxRegimeResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationInput {
    /// Period figures in chronological order. Ledger fields on each period
    /// are ignored; the running ledgers are threaded instead.
    pub periods: Vec<ActualInput>,
    #[serde(default)]
    pub opening_loss_ledger: LossLedger,
    #[serde(default)]
    pub opening_credit_ledger: CreditLedger,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodOutcome {
    /// 1-based period number
    pub period: usize,
    pub result: RegimeResult,
    pub loss_ledger_after: LossLedger,
    pub credit_ledger_after: CreditLedger,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub periods: Vec<PeriodOutcome>,
    pub closing_loss_ledger: LossLedger,
    pub closing_credit_ledger: CreditLedger,
    pub total_liability: Money,
    pub total_irpj_compensated: Money,
    pub total_csll_compensated: Money,
    pub total_jcp_net_benefit: Money,
}

/// Run the engine period by period.
pub fn simulate(
    engine: &ActualProfitEngine<'_>,
    input: &SimulationInput,
    activity: &ActivityProfile,
    jurisdiction: &JurisdictionProfile,
) -> TaxRegimeResult<ComputationOutput<SimulationOutput>> {
    let start = Instant::now();
    if input.periods.is_empty() {
        return Err(TaxRegimeError::InsufficientData(
            "simulation needs at least one period".into(),
        ));
    }
    input.opening_loss_ledger.validate()?;
    input.opening_credit_ledger.validate()?;

    let mut loss_ledger = input.opening_loss_ledger.clone();
    let mut credit_ledger = input.opening_credit_ledger.clone();
    let mut periods = Vec::with_capacity(input.periods.len());
    let mut total_liability = Decimal::ZERO;
    let mut total_irpj_compensated = Decimal::ZERO;
    let mut total_csll_compensated = Decimal::ZERO;
    let mut total_jcp_net_benefit = Decimal::ZERO;
    let mut warnings = Vec::new();

    for (i, figures) in input.periods.iter().enumerate() {
        let mut period_input = figures.clone();
        period_input.loss_ledger = loss_ledger.clone();
        period_input.credits.ledger = credit_ledger.clone();

        let result = engine
            .compute(&period_input, activity, jurisdiction)
            .map_err(|e| match e {
                TaxRegimeError::InvalidInput { field, reason } => TaxRegimeError::InvalidInput {
                    field: format!("periods[{i}].{field}"),
                    reason,
                },
                other => other,
            })?;

        if let Some(detail) = actual_detail(&result) {
            loss_ledger = detail.loss_ledger_after.clone();
            credit_ledger = detail.non_cumulative.ledger_after.clone();
            total_irpj_compensated += detail.loss_compensation.irpj_compensated();
            total_csll_compensated += detail.loss_compensation.csll_compensated();
            if let Some(jcp) = &detail.capital_remuneration {
                total_jcp_net_benefit += jcp.net_benefit;
            }
        }
        total_liability += result.total_liability;
        for flag in &result.flags {
            warnings.push(format!("period {}: {}", i + 1, flag));
        }

        periods.push(PeriodOutcome {
            period: i + 1,
            loss_ledger_after: loss_ledger.clone(),
            credit_ledger_after: credit_ledger.clone(),
            result,
        });
    }

    info!(
        periods = periods.len(),
        total_liability = %total_liability,
        closing_operating_loss = %loss_ledger.operating_loss,
        "actual-profit simulation complete"
    );

    let output = SimulationOutput {
        periods,
        closing_loss_ledger: loss_ledger,
        closing_credit_ledger: credit_ledger,
        total_liability,
        total_irpj_compensated,
        total_csll_compensated,
        total_jcp_net_benefit,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Lucro Real multi-period simulation with threaded loss and credit ledgers",
        &serde_json::json!({
            "periods": input.periods.len(),
            "loss_compensation_cap": engine.tables().national.loss_compensation_cap.to_string(),
            "jurisdiction": jurisdiction.code,
            "activity_category": format!("{:?}", activity.category),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn actual_detail(result: &RegimeResult) -> Option<&ActualDetail> {
    match &result.detail {
        RegimeDetail::Actual(detail) => Some(detail.as_ref()),
        _ => None,
    }
}
