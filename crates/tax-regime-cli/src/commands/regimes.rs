use clap::Args;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;

use tax_regime_core::actual::{ActualInput, CreditContext, LossLedger, SimulationInput};
use tax_regime_core::comparison::{ComparisonEngine, RegimeRequest};
use tax_regime_core::presumed::PresumedInput;
use tax_regime_core::simplified::SimplifiedInput;

use super::read_payload;

/// Jurisdiction and activity flags shared by the single-regime commands
#[derive(Args, Clone)]
pub struct EntityFlags {
    /// Two-letter state code (e.g. SP)
    #[arg(long, alias = "uf")]
    pub jurisdiction: Option<String>,

    /// CNAE activity code
    #[arg(long, alias = "cnae")]
    pub activity: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub year: Option<i32>,

    /// Regional incentive programme granted to the entity (repeatable)
    #[arg(long = "incentive")]
    pub incentives: Vec<String>,
}

impl EntityFlags {
    fn request<T>(&self, input: T) -> Result<RegimeRequest<T>, Box<dyn std::error::Error>> {
        Ok(RegimeRequest {
            jurisdiction_code: self
                .jurisdiction
                .clone()
                .ok_or("--jurisdiction is required (or provide --input)")?,
            tax_year: self.year,
            activity_code: self.activity.clone().unwrap_or_default(),
            declared_category: self.category.clone(),
            activate_incentives: self.incentives.clone(),
            input,
        })
    }
}

/// Arguments for the simplified regime (Simples Nacional)
#[derive(Args)]
pub struct SimplifiedArgs {
    /// Path to a request file: jurisdiction, activity and `input`
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub entity: EntityFlags,

    /// Gross revenue of the trailing 12 months (RBT12)
    #[arg(long)]
    pub trailing_revenue: Option<Decimal>,

    /// Gross revenue of the assessed period
    #[arg(long)]
    pub revenue: Option<Decimal>,

    #[arg(long)]
    pub monthly_payroll: Option<Decimal>,

    /// Trailing 12-month payroll; defaults to monthly payroll × 12
    #[arg(long)]
    pub trailing_payroll: Option<Decimal>,

    #[arg(long, default_value = "1")]
    pub months: u32,

    #[arg(long)]
    pub purchases: Option<Decimal>,
}

/// Arguments for the presumed-profit regime (Lucro Presumido)
#[derive(Args)]
pub struct PresumedArgs {
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub entity: EntityFlags,

    /// Gross revenue of the period
    #[arg(long)]
    pub revenue: Option<Decimal>,

    #[arg(long, default_value = "3")]
    pub months: u32,

    /// Payroll of the period
    #[arg(long)]
    pub payroll: Option<Decimal>,

    #[arg(long)]
    pub purchases: Option<Decimal>,

    /// Annual revenue for the eligibility ceiling
    #[arg(long)]
    pub annual_revenue: Option<Decimal>,
}

/// Arguments for the actual-profit regime (Lucro Real)
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ActualArgs {
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub entity: EntityFlags,

    /// Accounting profit before income taxes (negative for a loss)
    #[arg(long)]
    pub profit: Option<Decimal>,

    /// Revenue subject to PIS/COFINS
    #[arg(long)]
    pub revenue: Option<Decimal>,

    #[arg(long, default_value = "3")]
    pub months: u32,

    #[arg(long)]
    pub payroll: Option<Decimal>,

    /// Operating tax-loss carryforward (also used as CSLL negative base)
    #[arg(long)]
    pub loss_carryforward: Option<Decimal>,
}

/// Arguments for a multi-period actual-profit simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to a request file whose `input` lists the periods
    #[arg(long)]
    pub input: Option<String>,
}

/// Read a full request document, or build one from flags.
fn request_or<T, F>(
    path: Option<&str>,
    from_flags: F,
) -> Result<RegimeRequest<T>, Box<dyn std::error::Error>>
where
    T: DeserializeOwned,
    F: FnOnce() -> Result<RegimeRequest<T>, Box<dyn std::error::Error>>,
{
    match read_payload(path)? {
        Some(data) => Ok(serde_json::from_value(data)?),
        None => from_flags(),
    }
}

pub fn run_simplified(
    args: SimplifiedArgs,
    engine: &ComparisonEngine,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = request_or(args.input.as_deref(), || {
        args.entity.request(SimplifiedInput {
            trailing_revenue_12m: args
                .trailing_revenue
                .ok_or("--trailing-revenue is required (or provide --input)")?,
            current_revenue: args
                .revenue
                .ok_or("--revenue is required (or provide --input)")?,
            monthly_payroll: args.monthly_payroll.unwrap_or_default(),
            trailing_payroll_12m: args.trailing_payroll,
            period_months: args.months,
            taxable_purchases: args.purchases.unwrap_or_default(),
        })
    })?;
    Ok(serde_json::to_value(engine.compute_simplified(&request)?)?)
}

pub fn run_presumed(
    args: PresumedArgs,
    engine: &ComparisonEngine,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = request_or(args.input.as_deref(), || {
        args.entity.request(PresumedInput {
            period_revenue: args
                .revenue
                .ok_or("--revenue is required (or provide --input)")?,
            period_months: args.months,
            period_payroll: args.payroll.unwrap_or_default(),
            taxable_purchases: args.purchases.unwrap_or_default(),
            annual_revenue_estimate: args.annual_revenue,
        })
    })?;
    Ok(serde_json::to_value(engine.compute_presumed(&request)?)?)
}

pub fn run_actual(
    args: ActualArgs,
    engine: &ComparisonEngine,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = request_or(args.input.as_deref(), || {
        let losses = args.loss_carryforward.unwrap_or_default();
        args.entity.request(ActualInput {
            accounting_profit_before_tax: args
                .profit
                .ok_or("--profit is required (or provide --input)")?,
            additions: vec![],
            exclusions: vec![],
            non_operating_result: Decimal::ZERO,
            loss_ledger: LossLedger::new(losses, Decimal::ZERO, losses),
            equity: None,
            credits: CreditContext {
                taxable_revenue: args
                    .revenue
                    .ok_or("--revenue is required (or provide --input)")?,
                ..Default::default()
            },
            period_months: args.months,
            period_payroll: args.payroll.unwrap_or_default(),
            taxable_purchases: Decimal::ZERO,
            gross_revenue: None,
            period_start: None,
        })
    })?;
    Ok(serde_json::to_value(engine.compute_actual(&request)?)?)
}

pub fn run_simulate(
    args: SimulateArgs,
    engine: &ComparisonEngine,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request: RegimeRequest<SimulationInput> = request_or(args.input.as_deref(), || {
        Err("--input <request.json|yaml> or stdin required for simulate".into())
    })?;
    Ok(serde_json::to_value(engine.simulate_actual(&request)?)?)
}
