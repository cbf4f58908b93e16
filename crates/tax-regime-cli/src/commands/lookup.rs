use clap::Args;
use serde_json::Value;

use tax_regime_core::comparison::ComparisonEngine;
use tax_regime_core::jurisdiction::JurisdictionSources;

/// Arguments for inspecting a normalized jurisdiction profile
#[derive(Args)]
pub struct JurisdictionArgs {
    /// Two-letter state code; omit with --list
    pub code: Option<String>,

    #[arg(long)]
    pub year: Option<i32>,

    /// Show the profile with these incentive programmes switched on
    #[arg(long = "incentive")]
    pub incentives: Vec<String>,

    /// List the codes with a source record
    #[arg(long)]
    pub list: bool,
}

/// Arguments for classifying an activity code
#[derive(Args)]
pub struct ClassifyArgs {
    /// CNAE activity code (e.g. 6201-5/01)
    pub code: String,

    /// Declared category used when the code is unknown
    #[arg(long)]
    pub category: Option<String>,
}

pub fn run_jurisdiction(
    args: JurisdictionArgs,
    engine: &ComparisonEngine,
) -> Result<Value, Box<dyn std::error::Error>> {
    if args.list {
        return Ok(list_codes(engine.normalizer().sources()));
    }
    let code = args
        .code
        .ok_or("a jurisdiction code is required (or pass --list)")?;
    let profile = engine.normalize_jurisdiction(&code, args.year);
    let profile = if args.incentives.is_empty() {
        (*profile).clone()
    } else {
        profile.with_activated_incentives(&args.incentives)
    };
    Ok(serde_json::json!({ "result": profile }))
}

pub fn run_classify(
    args: ClassifyArgs,
    engine: &ComparisonEngine,
) -> Result<Value, Box<dyn std::error::Error>> {
    let profile = engine.classify_activity(&args.code, args.category.as_deref());
    Ok(serde_json::json!({ "result": profile }))
}

fn list_codes(sources: &JurisdictionSources) -> Value {
    Value::Array(
        sources
            .codes()
            .map(|code| Value::String(code.to_string()))
            .collect(),
    )
}
