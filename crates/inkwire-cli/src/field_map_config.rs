use std::path::Path;

use anyhow::{Context, Result};
use inkwire_webhook_runtime::FieldMap;

/// Reads and validates the custom field map TOML file.
pub fn load_field_map(path: &Path) -> Result<FieldMap> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read field map {}", path.display()))?;
    parse_field_map(&raw).with_context(|| format!("invalid field map {}", path.display()))
}

pub fn parse_field_map(raw: &str) -> Result<FieldMap> {
    let field_map: FieldMap = toml::from_str(raw).context("failed to parse field map toml")?;
    field_map.validate()?;
    Ok(field_map)
}
