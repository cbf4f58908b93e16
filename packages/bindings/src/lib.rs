use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::OnceLock;

use tax_regime_core::actual::{ActualInput, SimulationInput};
use tax_regime_core::comparison::{ComparisonEngine, EntityInputs, RegimeRequest};
use tax_regime_core::config::TaxTables;
use tax_regime_core::jurisdiction::JurisdictionSources;
use tax_regime_core::presumed::PresumedInput;
use tax_regime_core::simplified::SimplifiedInput;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

static ENGINE: OnceLock<ComparisonEngine> = OnceLock::new();

/// Process-wide engine over the built-in tables and bundled state records.
/// Its jurisdiction cache is shared by every call.
fn engine() -> NapiResult<&'static ComparisonEngine> {
    if let Some(engine) = ENGINE.get() {
        return Ok(engine);
    }
    let built = ComparisonEngine::with_defaults().map_err(to_napi_error)?;
    Ok(ENGINE.get_or_init(|| built))
}

fn parse<T: DeserializeOwned>(json: &str) -> NapiResult<T> {
    serde_json::from_str(json).map_err(to_napi_error)
}

fn render<T: Serialize>(value: &T) -> NapiResult<String> {
    serde_json::to_string(value).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[napi]
pub fn compare_regimes(input_json: String) -> NapiResult<String> {
    let inputs: EntityInputs = parse(&input_json)?;
    let output = engine()?.compare(&inputs).map_err(to_napi_error)?;
    render(&output)
}

/// Compare with caller-supplied tables and, optionally, state records.
#[napi]
pub fn compare_regimes_with_tables(
    input_json: String,
    tables_json: String,
    sources_json: Option<String>,
) -> NapiResult<String> {
    let inputs: EntityInputs = parse(&input_json)?;
    let tables = TaxTables::from_json_str(&tables_json).map_err(to_napi_error)?;
    let sources = match sources_json {
        Some(json) => JurisdictionSources::from_json_str(&json),
        None => JurisdictionSources::bundled(),
    }
    .map_err(to_napi_error)?;
    let engine = ComparisonEngine::new(tables, sources).map_err(to_napi_error)?;
    let output = engine.compare(&inputs).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn compare_regimes_flat(input_json: String) -> NapiResult<String> {
    let inputs: EntityInputs = parse(&input_json)?;
    let output = engine()?.compare(&inputs).map_err(to_napi_error)?;
    render(&output.result.to_flat_records())
}

// ---------------------------------------------------------------------------
// Single regimes
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_simplified(request_json: String) -> NapiResult<String> {
    let request: RegimeRequest<SimplifiedInput> = parse(&request_json)?;
    let output = engine()?
        .compute_simplified(&request)
        .map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn compute_presumed(request_json: String) -> NapiResult<String> {
    let request: RegimeRequest<PresumedInput> = parse(&request_json)?;
    let output = engine()?.compute_presumed(&request).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn compute_actual(request_json: String) -> NapiResult<String> {
    let request: RegimeRequest<ActualInput> = parse(&request_json)?;
    let output = engine()?.compute_actual(&request).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn simulate_actual(request_json: String) -> NapiResult<String> {
    let request: RegimeRequest<SimulationInput> = parse(&request_json)?;
    let output = engine()?.simulate_actual(&request).map_err(to_napi_error)?;
    render(&output)
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

#[napi]
pub fn normalize_jurisdiction(code: String, tax_year: Option<i32>) -> NapiResult<String> {
    let profile = engine()?.normalize_jurisdiction(&code, tax_year);
    render(profile.as_ref())
}

#[napi]
pub fn classify_activity(activity_code: String, declared_category: Option<String>) -> NapiResult<String> {
    let profile = engine()?.classify_activity(&activity_code, declared_category.as_deref());
    render(&profile)
}
