//! Activity-code (CNAE) prefix table.

use std::collections::HashMap;

use super::category::ActivityCategory;
use crate::config::SimplifiedAnnex;

/// Classification attached to a code prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixRule {
    pub category: ActivityCategory,
    pub annex: SimplifiedAnnex,
    pub payroll_ratio_sensitive: bool,
    pub simplified_prohibited: bool,
}

impl PrefixRule {
    fn new(category: ActivityCategory, annex: SimplifiedAnnex) -> Self {
        PrefixRule {
            category,
            annex,
            payroll_ratio_sensitive: false,
            simplified_prohibited: false,
        }
    }

    fn sensitive(mut self) -> Self {
        self.payroll_ratio_sensitive = true;
        self
    }

    fn prohibited(mut self) -> Self {
        self.simplified_prohibited = true;
        self
    }
}

/// Prefix lengths tried, longest first.
pub const PREFIX_LENGTHS: [usize; 3] = [5, 4, 2];

pub fn build_prefix_table() -> HashMap<&'static str, PrefixRule> {
    use ActivityCategory::*;
    use SimplifiedAnnex::*;

    let mut table = HashMap::new();

    // Manufacturing divisions 10–33
    const MANUFACTURING: [&str; 24] = [
        "10", "11", "12", "13", "14", "15", "16", "17", "18", "19", "20", "21", "22", "23",
        "24", "25", "26", "27", "28", "29", "30", "31", "32", "33",
    ];
    for division in MANUFACTURING {
        table.insert(division, PrefixRule::new(Manufacturing, II));
    }

    let rules: &[(&'static str, PrefixRule)] = &[
        // Five-character subclasses
        ("47318", PrefixRule::new(FuelResale, I)),
        ("86101", PrefixRule::new(HospitalServices, III)),
        ("69206", PrefixRule::new(GeneralServices, III)),
        ("49302", PrefixRule::new(CargoTransport, III)),
        // Four-character classes
        ("1111", PrefixRule::new(Manufacturing, II).prohibited()),
        ("1112", PrefixRule::new(Manufacturing, II).prohibited()),
        ("1220", PrefixRule::new(Manufacturing, II).prohibited()),
        ("4731", PrefixRule::new(FuelResale, I)),
        ("4681", PrefixRule::new(FuelResale, I)),
        ("4921", PrefixRule::new(PassengerTransport, III)),
        ("4922", PrefixRule::new(PassengerTransport, III)),
        ("4929", PrefixRule::new(PassengerTransport, III)),
        ("4930", PrefixRule::new(CargoTransport, III)),
        ("5611", PrefixRule::new(GoodsTrade, I)),
        ("6911", PrefixRule::new(ProfessionalServices, IV)),
        ("6920", PrefixRule::new(GeneralServices, III)),
        ("7020", PrefixRule::new(ProfessionalServices, V).sensitive()),
        ("7111", PrefixRule::new(ProfessionalServices, V).sensitive()),
        ("7112", PrefixRule::new(ProfessionalServices, V).sensitive()),
        ("8011", PrefixRule::new(GeneralServices, IV)),
        ("8121", PrefixRule::new(GeneralServices, IV)),
        ("8610", PrefixRule::new(HospitalServices, III)),
        ("8630", PrefixRule::new(ProfessionalServices, V).sensitive()),
        // Two-character divisions
        ("41", PrefixRule::new(Construction, IV)),
        ("42", PrefixRule::new(Construction, IV)),
        ("43", PrefixRule::new(Construction, IV)),
        ("45", PrefixRule::new(GoodsTrade, I)),
        ("46", PrefixRule::new(GoodsTrade, I)),
        ("47", PrefixRule::new(GoodsTrade, I)),
        ("49", PrefixRule::new(CargoTransport, III)),
        ("55", PrefixRule::new(GeneralServices, III)),
        ("56", PrefixRule::new(GoodsTrade, I)),
        ("62", PrefixRule::new(GeneralServices, V).sensitive()),
        ("63", PrefixRule::new(GeneralServices, V).sensitive()),
        ("64", PrefixRule::new(FinancialServices, III).prohibited()),
        ("65", PrefixRule::new(FinancialServices, III).prohibited()),
        ("66", PrefixRule::new(FinancialServices, III).prohibited()),
        ("68", PrefixRule::new(GeneralServices, III)),
        ("69", PrefixRule::new(ProfessionalServices, V).sensitive()),
        ("70", PrefixRule::new(ProfessionalServices, V).sensitive()),
        ("71", PrefixRule::new(ProfessionalServices, V).sensitive()),
        ("85", PrefixRule::new(GeneralServices, III)),
        ("86", PrefixRule::new(ProfessionalServices, V).sensitive()),
    ];
    table.extend(rules.iter().copied());
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_manufacturing_divisions() {
        let table = build_prefix_table();
        assert_eq!(table["25"].category, ActivityCategory::Manufacturing);
        assert_eq!(table["25"].annex, SimplifiedAnnex::II);
    }

    #[test]
    fn test_prohibited_entries() {
        let table = build_prefix_table();
        assert!(table["64"].simplified_prohibited);
        assert!(table["1111"].simplified_prohibited);
        assert!(!table["47"].simplified_prohibited);
    }

    #[test]
    fn test_prefix_lengths_are_descending() {
        assert!(PREFIX_LENGTHS.windows(2).all(|w| w[0] > w[1]));
    }
}
