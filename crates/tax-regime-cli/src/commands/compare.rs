use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use tax_regime_core::actual::{CreditLedger, LossLedger};
use tax_regime_core::comparison::{ComparisonEngine, EntityInputs};
use tax_regime_core::FilingPeriod;

use super::read_payload;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PeriodArg {
    Monthly,
    Quarterly,
    Annual,
}

impl From<PeriodArg> for FilingPeriod {
    fn from(p: PeriodArg) -> Self {
        match p {
            PeriodArg::Monthly => FilingPeriod::Monthly,
            PeriodArg::Quarterly => FilingPeriod::Quarterly,
            PeriodArg::Annual => FilingPeriod::Annual,
        }
    }
}

/// Arguments for a three-regime comparison
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CompareArgs {
    /// Path to an entity file (JSON or YAML); overrides the flags below
    #[arg(long)]
    pub input: Option<String>,

    /// Two-letter state code (e.g. SP)
    #[arg(long, alias = "uf")]
    pub jurisdiction: Option<String>,

    /// CNAE activity code (e.g. 6201-5/01)
    #[arg(long, alias = "cnae")]
    pub activity: Option<String>,

    /// Declared activity category, used when the code is unknown
    #[arg(long)]
    pub category: Option<String>,

    /// Tax year; defaults to the year of the loaded tables
    #[arg(long)]
    pub year: Option<i32>,

    #[arg(long, value_enum, default_value = "quarterly")]
    pub period: PeriodArg,

    /// Gross revenue of the period
    #[arg(long)]
    pub revenue: Option<Decimal>,

    /// Gross revenue of the trailing 12 months
    #[arg(long)]
    pub trailing_revenue: Option<Decimal>,

    #[arg(long)]
    pub monthly_payroll: Option<Decimal>,

    /// Purchases subject to ICMS credit
    #[arg(long)]
    pub purchases: Option<Decimal>,

    /// Accounting profit before income taxes
    #[arg(long)]
    pub profit: Option<Decimal>,

    /// Operating tax-loss carryforward (also used as CSLL negative base)
    #[arg(long)]
    pub loss_carryforward: Option<Decimal>,

    /// Regional incentive programme granted to the entity (repeatable)
    #[arg(long = "incentive")]
    pub incentives: Vec<String>,

    /// Emit one flat record per regime instead of the full comparison
    #[arg(long)]
    pub flat: bool,
}

pub fn run_compare(
    args: CompareArgs,
    engine: &ComparisonEngine,
) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs: EntityInputs = match read_payload(args.input.as_deref())? {
        Some(data) => serde_json::from_value(data)?,
        None => inputs_from_flags(&args)?,
    };
    debug!(
        jurisdiction = %inputs.jurisdiction_code,
        activity = %inputs.activity_code,
        "comparing regimes"
    );

    let output = engine.compare(&inputs)?;
    if args.flat {
        return Ok(serde_json::to_value(output.result.to_flat_records())?);
    }
    Ok(serde_json::to_value(output)?)
}

fn inputs_from_flags(args: &CompareArgs) -> Result<EntityInputs, Box<dyn std::error::Error>> {
    let period: FilingPeriod = args.period.into();
    let revenue = args
        .revenue
        .ok_or("--revenue is required (or provide --input)")?;
    let losses = args.loss_carryforward.unwrap_or_default();
    Ok(EntityInputs {
        entity_name: None,
        jurisdiction_code: args
            .jurisdiction
            .clone()
            .ok_or("--jurisdiction is required (or provide --input)")?,
        tax_year: args.year,
        activity_code: args.activity.clone().unwrap_or_default(),
        declared_category: args.category.clone(),
        period,
        period_start: None,
        period_revenue: revenue,
        trailing_revenue_12m: args
            .trailing_revenue
            .unwrap_or(revenue * Decimal::from(12) / Decimal::from(period.months())),
        annual_revenue: None,
        monthly_payroll: args.monthly_payroll.unwrap_or_default(),
        trailing_payroll_12m: None,
        taxable_purchases: args.purchases.unwrap_or_default(),
        accounting_profit_before_tax: args
            .profit
            .ok_or("--profit is required (or provide --input)")?,
        additions: vec![],
        exclusions: vec![],
        non_operating_result: Decimal::ZERO,
        loss_ledger: LossLedger::new(losses, Decimal::ZERO, losses),
        equity: None,
        credit_expenses: vec![],
        capital_assets: vec![],
        credit_ledger: CreditLedger::zeroed(),
        activate_incentives: args.incentives.clone(),
    })
}
