//! Progressive bracket tables of the simplified regime (LC 123/2006, annexes I–V).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SimplifiedAnnex {
    /// Goods trade
    I,
    /// Manufacturing
    II,
    /// Services, favorable table
    III,
    /// Services with employer contribution paid outside the levy
    IV,
    /// Services, unfavorable table
    V,
}

/// One revenue bracket. `upper_bound` is inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub upper_bound: Money,
    pub nominal_rate: Rate,
    pub deduction: Money,
    /// Share of the levy attributable to ICMS or ISS in this bracket
    pub local_tax_share: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnexTable {
    pub annex: SimplifiedAnnex,
    pub brackets: Vec<Bracket>,
}

impl AnnexTable {
    /// Locate the bracket whose upper bound is the smallest value ≥ `revenue`.
    ///
    /// Returns the zero-based index and the bracket, or `None` above the last bound.
    pub fn locate(&self, revenue: Money) -> Option<(usize, &Bracket)> {
        self.brackets
            .iter()
            .enumerate()
            .find(|(_, b)| revenue <= b.upper_bound)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedTables {
    pub annexes: Vec<AnnexTable>,
}

impl SimplifiedTables {
    pub fn annex(&self, annex: SimplifiedAnnex) -> Option<&AnnexTable> {
        self.annexes.iter().find(|t| t.annex == annex)
    }
}

fn bracket(upper: Decimal, rate: Decimal, deduction: Decimal, share: Decimal) -> Bracket {
    Bracket {
        upper_bound: upper,
        nominal_rate: rate,
        deduction,
        local_tax_share: share,
    }
}

// The sixth bracket reuses the fifth bracket's local share: above the
// sublimit the local tax is carved out of the levy anyway.
impl Default for SimplifiedTables {
    fn default() -> Self {
        let bounds = [
            dec!(180_000),
            dec!(360_000),
            dec!(720_000),
            dec!(1_800_000),
            dec!(3_600_000),
            dec!(4_800_000),
        ];
        let build = |annex: SimplifiedAnnex, rows: [(Decimal, Decimal, Decimal); 6]| AnnexTable {
            annex,
            brackets: bounds
                .iter()
                .zip(rows.iter())
                .map(|(upper, (rate, ded, share))| bracket(*upper, *rate, *ded, *share))
                .collect(),
        };

        SimplifiedTables {
            annexes: vec![
                build(
                    SimplifiedAnnex::I,
                    [
                        (dec!(0.04), dec!(0), dec!(0.34)),
                        (dec!(0.073), dec!(5_940), dec!(0.34)),
                        (dec!(0.095), dec!(13_860), dec!(0.335)),
                        (dec!(0.107), dec!(22_500), dec!(0.335)),
                        (dec!(0.143), dec!(87_300), dec!(0.335)),
                        (dec!(0.19), dec!(378_000), dec!(0.335)),
                    ],
                ),
                build(
                    SimplifiedAnnex::II,
                    [
                        (dec!(0.045), dec!(0), dec!(0.32)),
                        (dec!(0.078), dec!(5_940), dec!(0.32)),
                        (dec!(0.10), dec!(13_860), dec!(0.32)),
                        (dec!(0.112), dec!(22_500), dec!(0.32)),
                        (dec!(0.147), dec!(85_500), dec!(0.32)),
                        (dec!(0.30), dec!(720_000), dec!(0.32)),
                    ],
                ),
                build(
                    SimplifiedAnnex::III,
                    [
                        (dec!(0.06), dec!(0), dec!(0.335)),
                        (dec!(0.112), dec!(9_360), dec!(0.32)),
                        (dec!(0.135), dec!(17_640), dec!(0.325)),
                        (dec!(0.16), dec!(35_640), dec!(0.325)),
                        (dec!(0.21), dec!(125_640), dec!(0.335)),
                        (dec!(0.33), dec!(648_000), dec!(0.335)),
                    ],
                ),
                build(
                    SimplifiedAnnex::IV,
                    [
                        (dec!(0.045), dec!(0), dec!(0.445)),
                        (dec!(0.09), dec!(8_100), dec!(0.40)),
                        (dec!(0.102), dec!(12_420), dec!(0.40)),
                        (dec!(0.14), dec!(39_780), dec!(0.40)),
                        (dec!(0.22), dec!(183_780), dec!(0.40)),
                        (dec!(0.33), dec!(828_000), dec!(0.40)),
                    ],
                ),
                build(
                    SimplifiedAnnex::V,
                    [
                        (dec!(0.155), dec!(0), dec!(0.14)),
                        (dec!(0.18), dec!(4_500), dec!(0.17)),
                        (dec!(0.195), dec!(9_900), dec!(0.19)),
                        (dec!(0.205), dec!(17_100), dec!(0.21)),
                        (dec!(0.23), dec!(62_100), dec!(0.235)),
                        (dec!(0.305), dec!(540_000), dec!(0.235)),
                    ],
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_all_annexes_present() {
        let tables = SimplifiedTables::default();
        for annex in [
            SimplifiedAnnex::I,
            SimplifiedAnnex::II,
            SimplifiedAnnex::III,
            SimplifiedAnnex::IV,
            SimplifiedAnnex::V,
        ] {
            let table = tables.annex(annex).unwrap();
            assert_eq!(table.brackets.len(), 6);
        }
    }

    #[test]
    fn test_locate_is_inclusive_of_upper_bound() {
        let tables = SimplifiedTables::default();
        let annex = tables.annex(SimplifiedAnnex::III).unwrap();
        let (idx, _) = annex.locate(dec!(180_000)).unwrap();
        assert_eq!(idx, 0);
        let (idx, _) = annex.locate(dec!(180_000.01)).unwrap();
        assert_eq!(idx, 1);
    }

    #[test]
    fn test_locate_above_ceiling() {
        let tables = SimplifiedTables::default();
        let annex = tables.annex(SimplifiedAnnex::I).unwrap();
        assert!(annex.locate(dec!(4_800_000.01)).is_none());
    }
}
