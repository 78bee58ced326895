// Built-in system descriptions.
//
// The JSON files under the workspace `data/` directory are embedded at
// compile time with `include_str!`, so the CLI and benchmarks need no file
// access to run a known system. Each preset is a `SystemConfig`; see
// `config.rs` for the format.

use crate::config::SystemConfig;
use crate::error::{LSystemError, Result};

/// Names accepted by `load`, in display order.
pub const PRESET_NAMES: &[&str] = &[
    "koch_curve",
    "fractal_plant",
    "signal_propagation",
    "stochastic_weed",
];

/// The raw embedded JSON for `name`.
pub fn preset_json(name: &str) -> Option<&'static str> {
    match name {
        "koch_curve" => Some(include_str!("../../data/koch_curve.json")),
        "fractal_plant" => Some(include_str!("../../data/fractal_plant.json")),
        "signal_propagation" => Some(include_str!("../../data/signal_propagation.json")),
        "stochastic_weed" => Some(include_str!("../../data/stochastic_weed.json")),
        _ => None,
    }
}

/// Parse the preset called `name`.
pub fn load(name: &str) -> Result<SystemConfig> {
    let json = preset_json(name).ok_or_else(|| LSystemError::UnknownPreset(name.to_string()))?;
    SystemConfig::from_json(json)
}
