use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::SimplifiedAnnex;
use crate::types::*;

/// Closed enumeration of activity categories carrying statutory presumption
/// percentages (Lei 9.249/1995, arts. 15 and 20).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityCategory {
    GoodsTrade,
    Manufacturing,
    FuelResale,
    CargoTransport,
    PassengerTransport,
    HospitalServices,
    Construction,
    GeneralServices,
    ProfessionalServices,
    FinancialServices,
}

/// Which local consumption tax the activity's revenue bears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxType {
    /// State ICMS on goods
    Goods,
    /// Municipal ISS on services
    Services,
}

impl ActivityCategory {
    /// IRPJ presumption percentage.
    pub fn irpj_presumption(&self) -> Rate {
        use ActivityCategory::*;
        match self {
            GoodsTrade | Manufacturing | CargoTransport | HospitalServices | Construction => {
                dec!(0.08)
            }
            FuelResale => dec!(0.016),
            PassengerTransport | FinancialServices => dec!(0.16),
            GeneralServices | ProfessionalServices => dec!(0.32),
        }
    }

    /// CSLL presumption percentage.
    pub fn csll_presumption(&self) -> Rate {
        use ActivityCategory::*;
        match self {
            GeneralServices | ProfessionalServices => dec!(0.32),
            _ => dec!(0.12),
        }
    }

    pub fn tax_type(&self) -> TaxType {
        use ActivityCategory::*;
        match self {
            GoodsTrade | Manufacturing | FuelResale | CargoTransport => TaxType::Goods,
            _ => TaxType::Services,
        }
    }

    /// Simplified-regime annex when the activity code gives no better answer.
    pub fn default_annex(&self) -> SimplifiedAnnex {
        use ActivityCategory::*;
        match self {
            GoodsTrade | FuelResale => SimplifiedAnnex::I,
            Manufacturing => SimplifiedAnnex::II,
            Construction => SimplifiedAnnex::IV,
            GeneralServices | ProfessionalServices => SimplifiedAnnex::V,
            CargoTransport | PassengerTransport | HospitalServices | FinancialServices => {
                SimplifiedAnnex::III
            }
        }
    }

    /// Annex selection depends on the payroll ratio (III when favorable, V otherwise).
    pub fn default_payroll_sensitive(&self) -> bool {
        matches!(
            self,
            ActivityCategory::GeneralServices | ActivityCategory::ProfessionalServices
        )
    }

    /// Entities in this category are obliged to the actual-profit regime.
    pub fn requires_actual_profit(&self) -> bool {
        matches!(self, ActivityCategory::FinancialServices)
    }
}
