use tracing::{debug, info};

use tax_regime_core::comparison::ComparisonEngine;
use tax_regime_core::config::TaxTables;
use tax_regime_core::jurisdiction::JurisdictionSources;

use super::file::read_document_value;

/// Where the engine's reference data comes from.
#[derive(Debug, Clone, Default)]
pub struct DataPaths {
    /// National rates and bracket tables (JSON or YAML)
    pub tables: Option<String>,
    /// Raw per-state records (JSON or YAML)
    pub sources: Option<String>,
}

pub fn load_tables(path: Option<&str>) -> Result<TaxTables, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        debug!("using built-in tax tables");
        return Ok(TaxTables::default());
    };
    let value = read_document_value(path)?;
    let tables: TaxTables = serde_json::from_value(value)
        .map_err(|e| format!("Invalid tax tables in '{}': {}", path, e))?;
    tables.validate()?;
    info!(path, tax_year = tables.tax_year, "loaded tax tables");
    Ok(tables)
}

pub fn load_sources(path: Option<&str>) -> Result<JurisdictionSources, Box<dyn std::error::Error>> {
    let sources = match path {
        Some(path) => {
            let sources = JurisdictionSources::from_value(read_document_value(path)?)?;
            info!(path, records = sources.len(), "loaded jurisdiction sources");
            sources
        }
        None => JurisdictionSources::bundled()?,
    };
    Ok(sources)
}

/// Engine over the configured tables and jurisdiction records.
pub fn load_engine(paths: &DataPaths) -> Result<ComparisonEngine, Box<dyn std::error::Error>> {
    let tables = load_tables(paths.tables.as_deref())?;
    let sources = load_sources(paths.sources.as_deref())?;
    Ok(ComparisonEngine::new(tables, sources)?)
}
