use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::advisory::{generate_advisories, AdvisoryContext};
use super::inputs::{EntityInputs, RegimeRequest};
use super::ranking::{rank_results, savings, ExcludedRegime, FlatRegimeRecord, RankedRegime};
use crate::activity::{ActivityClassifier, ActivityProfile};
use crate::actual::{simulate, ActualInput, ActualProfitEngine, SimulationInput, SimulationOutput};
use crate::config::TaxTables;
use crate::error::TaxRegimeError;
use crate::jurisdiction::{JurisdictionNormalizer, JurisdictionProfile, JurisdictionSources, SourceQuality};
use crate::presumed::{PresumedInput, PresumedProfitCalculator};
use crate::regime::RegimeResult;
use crate::simplified::{SimplifiedInput, SimplifiedRegimeCalculator};
use crate::types::*;
use crate::TaxRegimeResult;

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
    pub jurisdiction: String,
    pub tax_year: i32,
    pub jurisdiction_quality: SourceQuality,
    pub activity: ActivityProfile,
    pub ranked: Vec<RankedRegime>,
    pub excluded: Vec<ExcludedRegime>,
    pub cheapest: Regime,
    pub most_expensive: Regime,
    pub savings: Money,
    /// Savings as a fraction of the most expensive liability
    pub savings_pct: Rate,
    pub advisories: Vec<Advisory>,
    pub data_quality: Vec<String>,
}

impl ComparisonResult {
    /// Ranked regimes first, then excluded ones.
    pub fn to_flat_records(&self) -> Vec<FlatRegimeRecord> {
        self.ranked
            .iter()
            .map(FlatRegimeRecord::from_ranked)
            .chain(self.excluded.iter().map(FlatRegimeRecord::from_excluded))
            .collect()
    }

    pub fn result_for(&self, regime: Regime) -> Option<&RegimeResult> {
        self.ranked
            .iter()
            .map(|r| &r.result)
            .find(|r| r.regime == regime)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Runs the three regimes on one entity and ranks them.
///
/// Holds the tables and the jurisdiction normalizer behind `Arc` so one
/// engine (or several sharing a normalizer) can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct ComparisonEngine {
    tables: Arc<TaxTables>,
    normalizer: Arc<JurisdictionNormalizer>,
    classifier: ActivityClassifier,
}

impl ComparisonEngine {
    pub fn new(tables: TaxTables, sources: JurisdictionSources) -> TaxRegimeResult<Self> {
        tables.validate()?;
        let normalizer = JurisdictionNormalizer::new(sources, tables.jurisdiction_defaults.clone());
        Ok(ComparisonEngine {
            tables: Arc::new(tables),
            normalizer: Arc::new(normalizer),
            classifier: ActivityClassifier::new(),
        })
    }

    /// Built-in tables and the bundled jurisdiction records.
    pub fn with_defaults() -> TaxRegimeResult<Self> {
        Self::new(TaxTables::default(), JurisdictionSources::bundled()?)
    }

    /// Share tables and a normalizer (and its cache) with other engines.
    pub fn with_shared(
        tables: Arc<TaxTables>,
        normalizer: Arc<JurisdictionNormalizer>,
    ) -> TaxRegimeResult<Self> {
        tables.validate()?;
        Ok(ComparisonEngine {
            tables,
            normalizer,
            classifier: ActivityClassifier::new(),
        })
    }

    pub fn tables(&self) -> &TaxTables {
        &self.tables
    }

    pub fn normalizer(&self) -> &Arc<JurisdictionNormalizer> {
        &self.normalizer
    }

    pub fn normalize_jurisdiction(
        &self,
        code: &str,
        tax_year: Option<i32>,
    ) -> Arc<JurisdictionProfile> {
        self.normalizer
            .normalize(code, tax_year.unwrap_or(self.tables.tax_year))
    }

    pub fn classify_activity(
        &self,
        activity_code: &str,
        declared_category: Option<&str>,
    ) -> ActivityProfile {
        self.classifier.classify(activity_code, declared_category)
    }

    fn resolve_jurisdiction(
        &self,
        code: &str,
        tax_year: Option<i32>,
        activate_incentives: &[String],
    ) -> Arc<JurisdictionProfile> {
        let profile = self.normalize_jurisdiction(code, tax_year);
        if activate_incentives.is_empty() {
            profile
        } else {
            Arc::new(profile.with_activated_incentives(activate_incentives))
        }
    }

    fn resolve<T>(&self, request: &RegimeRequest<T>) -> (Arc<JurisdictionProfile>, ActivityProfile) {
        let jurisdiction = self.resolve_jurisdiction(
            &request.jurisdiction_code,
            request.tax_year,
            &request.activate_incentives,
        );
        let activity = self.classify_activity(
            &request.activity_code,
            request.declared_category.as_deref(),
        );
        (jurisdiction, activity)
    }

    /// Compute all three regimes for one entity and recommend the cheapest.
    pub fn compare(
        &self,
        inputs: &EntityInputs,
    ) -> TaxRegimeResult<ComputationOutput<ComparisonResult>> {
        let start = Instant::now();
        inputs.validate()?;

        let tax_year = inputs.tax_year.unwrap_or(self.tables.tax_year);
        let jurisdiction = self.resolve_jurisdiction(
            &inputs.jurisdiction_code,
            Some(tax_year),
            &inputs.activate_incentives,
        );
        let activity = self.classify_activity(
            &inputs.activity_code,
            inputs.declared_category.as_deref(),
        );

        let simplified = SimplifiedRegimeCalculator::new(&self.tables).compute(
            &inputs.simplified_input(),
            &activity,
            &jurisdiction,
        )?;
        let presumed = PresumedProfitCalculator::new(&self.tables).compute(
            &inputs.presumed_input(),
            &activity,
            &jurisdiction,
        )?;
        let actual = ActualProfitEngine::new(&self.tables).compute(
            &inputs.actual_input(),
            &activity,
            &jurisdiction,
        )?;

        let (ranked, excluded) = rank_results(vec![simplified, presumed, actual]);
        let (Some(cheapest), Some(most_expensive)) = (ranked.first(), ranked.last()) else {
            return Err(TaxRegimeError::InsufficientData(
                "no regime is eligible for this entity".into(),
            ));
        };
        let cheapest = cheapest.result.regime;
        let most_expensive = most_expensive.result.regime;
        let (savings, savings_pct) = savings(&ranked);

        let mut data_quality = Vec::new();
        if !jurisdiction.is_authoritative() {
            warn!(
                jurisdiction = %jurisdiction.code,
                fields = ?jurisdiction.fallback_fields,
                "comparison uses fallback jurisdiction data"
            );
            data_quality.extend(
                jurisdiction
                    .fallback_fields
                    .iter()
                    .map(|f| format!("jurisdiction_fallback:{f}")),
            );
        }
        if activity.is_degraded() {
            data_quality.push(format!("activity_match:{:?}", activity.match_kind));
        }

        let advisories = generate_advisories(&AdvisoryContext {
            inputs,
            tables: &self.tables,
            jurisdiction: &jurisdiction,
            activity: &activity,
            ranked: &ranked,
            excluded: &excluded,
        });

        info!(
            jurisdiction = %jurisdiction.code,
            cheapest = %cheapest,
            savings = %savings,
            excluded = excluded.len(),
            "regime comparison complete"
        );

        let mut warnings: Vec<String> = excluded
            .iter()
            .map(|e| format!("{} excluded: {}", e.regime, e.reason))
            .collect();
        warnings.extend(data_quality.iter().cloned());

        let assumptions = serde_json::json!({
            "tax_year": tax_year,
            "period_months": inputs.period_months(),
            "jurisdiction": jurisdiction.code,
            "jurisdiction_quality": jurisdiction.source_quality,
            "activity_category": activity.category,
            "simplified_ceiling": self.tables.national.simplified_ceiling.to_string(),
            "presumed_ceiling": self.tables.national.presumed_ceiling.to_string(),
            "tie_break": "Simplified < PresumedProfit < ActualProfit",
        });

        let result = ComparisonResult {
            entity_name: inputs.entity_name.clone(),
            jurisdiction: jurisdiction.code.clone(),
            tax_year,
            jurisdiction_quality: jurisdiction.source_quality,
            activity,
            ranked,
            excluded,
            cheapest,
            most_expensive,
            savings,
            savings_pct,
            advisories,
            data_quality,
        };

        let elapsed = start.elapsed().as_micros() as u64;
        Ok(with_metadata(
            "Brazilian corporate tax regime comparison (Simples Nacional, Lucro Presumido, Lucro Real)",
            &assumptions,
            warnings,
            elapsed,
            result,
        ))
    }

    pub fn compute_simplified(
        &self,
        request: &RegimeRequest<SimplifiedInput>,
    ) -> TaxRegimeResult<ComputationOutput<RegimeResult>> {
        let start = Instant::now();
        let (jurisdiction, activity) = self.resolve(request);
        let result = SimplifiedRegimeCalculator::new(&self.tables).compute(
            &request.input,
            &activity,
            &jurisdiction,
        )?;
        Ok(self.wrap(
            "Simples Nacional progressive levy (LC 123/2006)",
            &jurisdiction,
            &activity,
            start,
            result,
        ))
    }

    pub fn compute_presumed(
        &self,
        request: &RegimeRequest<PresumedInput>,
    ) -> TaxRegimeResult<ComputationOutput<RegimeResult>> {
        let start = Instant::now();
        let (jurisdiction, activity) = self.resolve(request);
        let result = PresumedProfitCalculator::new(&self.tables).compute(
            &request.input,
            &activity,
            &jurisdiction,
        )?;
        Ok(self.wrap(
            "Lucro Presumido on statutory presumption of revenue (Lei 9.249/1995)",
            &jurisdiction,
            &activity,
            start,
            result,
        ))
    }

    pub fn compute_actual(
        &self,
        request: &RegimeRequest<ActualInput>,
    ) -> TaxRegimeResult<ComputationOutput<RegimeResult>> {
        let start = Instant::now();
        let (jurisdiction, activity) = self.resolve(request);
        let result = ActualProfitEngine::new(&self.tables).compute(
            &request.input,
            &activity,
            &jurisdiction,
        )?;
        Ok(self.wrap(
            "Lucro Real on adjusted accounting profit with capped loss compensation",
            &jurisdiction,
            &activity,
            start,
            result,
        ))
    }

    pub fn simulate_actual(
        &self,
        request: &RegimeRequest<SimulationInput>,
    ) -> TaxRegimeResult<ComputationOutput<SimulationOutput>> {
        let (jurisdiction, activity) = self.resolve(request);
        simulate(
            &ActualProfitEngine::new(&self.tables),
            &request.input,
            &activity,
            &jurisdiction,
        )
    }

    fn wrap(
        &self,
        methodology: &str,
        jurisdiction: &JurisdictionProfile,
        activity: &ActivityProfile,
        start: Instant,
        result: RegimeResult,
    ) -> ComputationOutput<RegimeResult> {
        let mut warnings = result.flags.clone();
        if !jurisdiction.is_authoritative() {
            warnings.push(format!(
                "jurisdiction {} uses defaults for: {}",
                jurisdiction.code,
                jurisdiction.fallback_fields.join(", ")
            ));
        }
        let assumptions = serde_json::json!({
            "tax_year": jurisdiction.tax_year,
            "jurisdiction": jurisdiction.code,
            "jurisdiction_quality": jurisdiction.source_quality,
            "activity_category": activity.category,
            "activity_match": activity.match_kind,
        });
        let elapsed = start.elapsed().as_micros() as u64;
        with_metadata(methodology, &assumptions, warnings, elapsed, result)
    }
}
