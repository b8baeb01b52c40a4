use crate::error::DashError;
use crate::map::GridMap;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::warn;

pub const DEFAULT_MAP: &str = "e5";

#[derive(Debug, Deserialize)]
struct PresetRow {
    name: String,
    rows: Vec<String>,
}

static PRESET_MAP: OnceCell<BTreeMap<String, Vec<String>>> = OnceCell::new();

fn load_presets() -> BTreeMap<String, Vec<String>> {
    let mut map = BTreeMap::new();
    let data = include_str!("../data/preset_maps.jsonl");
    for (lineno, line) in data.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() { continue; }
        match serde_json::from_str::<PresetRow>(line) {
            Ok(r) => {
                if let Err(e) = GridMap::parse(r.rows.as_slice()) {
                    warn!(name = %r.name, error = %e, "preset map is invalid; skipping");
                    continue;
                }
                map.insert(r.name, r.rows);
            }
            Err(e) => {
                warn!(line = lineno + 1, error = %e, "failed to parse preset line");
            }
        }
    }
    map
}

fn presets() -> &'static BTreeMap<String, Vec<String>> {
    PRESET_MAP.get_or_init(load_presets)
}

/// Raw rows of a named preset.
pub fn preset_rows(name: &str) -> Option<Vec<String>> {
    presets().get(name).cloned()
}

pub fn preset_map(name: &str) -> Result<GridMap, DashError> {
    let rows = presets().get(name).ok_or_else(|| DashError::UnknownMap(name.to_string()))?;
    GridMap::parse(rows.as_slice())
}

/// Preset names in sorted order.
pub fn preset_names() -> Vec<String> {
    presets().keys().cloned().collect()
}
