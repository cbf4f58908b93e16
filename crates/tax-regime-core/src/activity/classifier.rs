//! Activity classification: code prefix lookup with a permissive
//! declared-category fallback.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::category::{ActivityCategory, TaxType};
use super::table::{build_prefix_table, PrefixRule, PREFIX_LENGTHS};
use crate::config::SimplifiedAnnex;
use crate::types::*;

/// How the classification was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassificationMatch {
    /// Matched the code table on a prefix of this length
    Prefix { len: usize },
    /// Code unknown; derived from the declared category text
    DeclaredCategory,
    /// Nothing matched; general services assumed
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityProfile {
    /// Digits-only activity code as supplied
    pub activity_code: String,
    pub category: ActivityCategory,
    /// Annex applied when the payroll ratio is unfavorable (or not relevant)
    pub annex: SimplifiedAnnex,
    pub payroll_ratio_sensitive: bool,
    /// Annex applied when the payroll ratio reaches the threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorable_annex: Option<SimplifiedAnnex>,
    pub simplified_prohibited: bool,
    pub presumed_prohibited: bool,
    pub irpj_presumption: Rate,
    pub csll_presumption: Rate,
    pub tax_type: TaxType,
    pub match_kind: ClassificationMatch,
}

impl ActivityProfile {
    /// Profile built from a category alone, using its default annex.
    pub fn from_category(
        activity_code: &str,
        category: ActivityCategory,
        match_kind: ClassificationMatch,
    ) -> Self {
        let rule = PrefixRule {
            category,
            annex: category.default_annex(),
            payroll_ratio_sensitive: category.default_payroll_sensitive(),
            simplified_prohibited: false,
        };
        Self::from_rule(activity_code, &rule, match_kind)
    }

    fn from_rule(activity_code: &str, rule: &PrefixRule, match_kind: ClassificationMatch) -> Self {
        let category = rule.category;
        ActivityProfile {
            activity_code: activity_code.to_string(),
            category,
            annex: rule.annex,
            payroll_ratio_sensitive: rule.payroll_ratio_sensitive,
            favorable_annex: rule
                .payroll_ratio_sensitive
                .then_some(SimplifiedAnnex::III),
            simplified_prohibited: rule.simplified_prohibited,
            presumed_prohibited: category.requires_actual_profit(),
            irpj_presumption: category.irpj_presumption(),
            csll_presumption: category.csll_presumption(),
            tax_type: category.tax_type(),
            match_kind,
        }
    }

    /// True when the classification did not come from the code table.
    pub fn is_degraded(&self) -> bool {
        !matches!(self.match_kind, ClassificationMatch::Prefix { .. })
    }
}

/// Synonym sets for the declared-category fallback, checked in order.
const CATEGORY_SYNONYMS: &[(ActivityCategory, &[&str])] = &[
    (
        ActivityCategory::Manufacturing,
        &[
            "industria",
            "industrial",
            "fabrica",
            "fabricacao",
            "manufatura",
            "manufacturing",
            "industry",
            "factory",
        ],
    ),
    (
        ActivityCategory::GoodsTrade,
        &[
            "comercio",
            "varejo",
            "atacado",
            "revenda",
            "loja",
            "mercadoria",
            "trade",
            "retail",
            "wholesale",
            "goods",
        ],
    ),
    (
        ActivityCategory::GeneralServices,
        &[
            "servico",
            "prestacao",
            "consultoria",
            "service",
        ],
    ),
];

#[derive(Debug, Clone)]
pub struct ActivityClassifier {
    table: HashMap<&'static str, PrefixRule>,
}

impl Default for ActivityClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityClassifier {
    pub fn new() -> Self {
        ActivityClassifier {
            table: build_prefix_table(),
        }
    }

    /// Classify an activity. Never fails; unknown input degrades to
    /// general services.
    pub fn classify(&self, activity_code: &str, declared_category: Option<&str>) -> ActivityProfile {
        let code = digits_only(activity_code);

        for len in PREFIX_LENGTHS {
            if code.len() < len {
                continue;
            }
            if let Some(rule) = self.table.get(&code[..len]) {
                debug!(code = %code, prefix_len = len, category = ?rule.category, "activity matched");
                return ActivityProfile::from_rule(&code, rule, ClassificationMatch::Prefix { len });
            }
        }

        if let Some(category) = declared_category.and_then(category_from_text) {
            debug!(code = %code, category = ?category, "activity classified from declared category");
            return ActivityProfile::from_category(&code, category, ClassificationMatch::DeclaredCategory);
        }

        warn!(
            code = %code,
            declared = declared_category.unwrap_or(""),
            "activity not recognised, assuming general services"
        );
        ActivityProfile::from_category(
            &code,
            ActivityCategory::GeneralServices,
            ClassificationMatch::Default,
        )
    }
}

fn digits_only(code: &str) -> String {
    code.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Lower-case and strip Portuguese diacritics.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

fn category_from_text(text: &str) -> Option<ActivityCategory> {
    let folded = fold(text);
    if folded.trim().is_empty() {
        return None;
    }
    CATEGORY_SYNONYMS
        .iter()
        .find(|(_, synonyms)| synonyms.iter().any(|s| folded.contains(s)))
        .map(|(category, _)| *category)
}
