use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// All monetary values (BRL). Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.15 = 15%). Never as percentages.
pub type Rate = Decimal;

/// The three mutually-exclusive corporate tax regimes.
///
/// Declaration order doubles as the tie-break preference when two regimes
/// produce the same liability: lighter compliance burden ranks first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Regime {
    Simplified,
    PresumedProfit,
    ActualProfit,
}

impl Regime {
    pub const ALL: [Regime; 3] = [
        Regime::Simplified,
        Regime::PresumedProfit,
        Regime::ActualProfit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Regime::Simplified => "Simples Nacional",
            Regime::PresumedProfit => "Lucro Presumido",
            Regime::ActualProfit => "Lucro Real",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Individual taxes that can appear in a regime's breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaxKind {
    /// Unified simplified-regime levy (DAS)
    Das,
    /// Corporate income tax, normal rate
    Irpj,
    /// Corporate income tax surtax (adicional)
    IrpjSurtax,
    /// Social contribution on net profit
    Csll,
    Pis,
    Cofins,
    /// State consumption tax on goods
    Icms,
    /// State poverty-fund surcharge on ICMS
    IcmsSurcharge,
    /// Municipal services tax
    Iss,
    /// Employer social-security contribution on payroll
    Cpp,
    /// Withholding on capital remuneration paid to equity holders
    JcpWithholding,
}

impl TaxKind {
    pub fn code(&self) -> &'static str {
        match self {
            TaxKind::Das => "das",
            TaxKind::Irpj => "irpj",
            TaxKind::IrpjSurtax => "irpj_surtax",
            TaxKind::Csll => "csll",
            TaxKind::Pis => "pis",
            TaxKind::Cofins => "cofins",
            TaxKind::Icms => "icms",
            TaxKind::IcmsSurcharge => "icms_surcharge",
            TaxKind::Iss => "iss",
            TaxKind::Cpp => "cpp",
            TaxKind::JcpWithholding => "jcp_withholding",
        }
    }
}

/// One line of a regime's liability breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxComponent {
    pub tax: TaxKind,
    pub base: Money,
    pub rate: Rate,
    pub amount: Money,
}

impl TaxComponent {
    /// Build a component, rounding the amount to cents and flooring at zero.
    pub fn new(tax: TaxKind, base: Money, rate: Rate, amount: Money) -> Self {
        TaxComponent {
            tax,
            base: round_money(base.max(Decimal::ZERO)),
            rate,
            amount: round_money(amount.max(Decimal::ZERO)),
        }
    }

    /// Component whose amount is simply `base * rate`.
    pub fn levied(tax: TaxKind, base: Money, rate: Rate) -> Self {
        Self::new(tax, base, rate, base * rate)
    }
}

/// Advisory severity tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Generated advisory/alert text attached to results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub message: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regime: Option<Regime>,
}

impl Advisory {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Advisory {
            message: message.into(),
            severity,
            citation: None,
            regime: None,
        }
    }

    pub fn cite(mut self, citation: &str) -> Self {
        self.citation = Some(citation.to_string());
        self
    }

    pub fn for_regime(mut self, regime: Regime) -> Self {
        self.regime = Some(regime);
        self
    }
}

/// Filing period length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilingPeriod {
    Monthly,
    #[default]
    Quarterly,
    Annual,
}

impl FilingPeriod {
    pub fn months(&self) -> u32 {
        match self {
            FilingPeriod::Monthly => 1,
            FilingPeriod::Quarterly => 3,
            FilingPeriod::Annual => 12,
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Round a monetary amount to cents, half away from zero.
pub fn round_money(value: Money) -> Money {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `numerator / denominator`, or zero when the denominator is not positive.
pub fn ratio_or_zero(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator > Decimal::ZERO {
        numerator / denominator
    } else {
        Decimal::ZERO
    }
}

/// Format a rate as a percentage string with two decimals, e.g. `15.50%`.
pub fn pct(rate: Rate) -> String {
    format!("{:.2}%", rate * Decimal::ONE_HUNDRED)
}

/// Format money as `R$ 1234.56`.
pub fn brl(amount: Money) -> String {
    format!("R$ {:.2}", round_money(amount))
}
