//! Configuration file schema (lunar.toml / ~/.lunar/config.toml)
//!
//! Both the global and the project file share this schema. Every field is
//! optional so that a later layer only overrides what it actually sets.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Parsed configuration file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LunarConfig {
    /// VM limits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<RuntimeSection>,

    /// Debug hook settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugSection>,

    /// Numeric libraries opened into the global table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub libraries: Option<LibrariesSection>,
}

/// `[runtime]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RuntimeSection {
    /// Maximum number of nested call frames (default: 200)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_call_depth: Option<usize>,

    /// Initial register stack capacity (default: 256)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_capacity: Option<usize>,
}

/// `[debug]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct DebugSection {
    /// When the debug hook fires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook: Option<HookMode>,

    /// Instruction interval for `hook = "count"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    /// Resolve call targets while tracing call instructions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_call_targets: Option<bool>,

    /// Upper bound on records kept by the tracer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_trace_records: Option<usize>,
}

/// `[libraries]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LibrariesSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vec3: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vec4: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mat4: Option<bool>,
}

/// Debug hook trigger mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum HookMode {
    /// Fire before every instruction
    #[default]
    EveryInstruction,
    /// Fire before call and tail-call instructions only
    Calls,
    /// Fire once every `count` instructions
    Count,
}

impl HookMode {
    /// Parse the textual form used in TOML and LUNAR_HOOK
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "every-instruction" => Some(HookMode::EveryInstruction),
            "calls" => Some(HookMode::Calls),
            "count" => Some(HookMode::Count),
            _ => None,
        }
    }
}

impl LunarConfig {
    /// Load a configuration file
    ///
    /// Only the schema is checked here. A single layer may be incomplete on
    /// its own (`hook = "count"` with the count in another layer), so
    /// [`LunarConfig::validate`] runs on the merged result instead.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        Ok(config)
    }

    /// Validate field values that the schema alone cannot express
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(runtime) = &self.runtime {
            if runtime.max_call_depth == Some(0) {
                return Err(ConfigError::InvalidValue {
                    field: "runtime.max_call_depth".to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
        }

        if let Some(debug) = &self.debug {
            if debug.count == Some(0) {
                return Err(ConfigError::InvalidValue {
                    field: "debug.count".to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
            if debug.hook == Some(HookMode::Count) && debug.count.is_none() {
                return Err(ConfigError::ValidationError(
                    "debug.hook = \"count\" requires debug.count".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Get the global config file path (~/.lunar/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".lunar").join("config.toml"))
    }

    /// Merge another config into this one, field by field.
    /// Other config takes precedence for non-None values.
    pub fn merge(&mut self, other: &LunarConfig) {
        if let Some(theirs) = &other.runtime {
            let ours = self.runtime.get_or_insert_with(Default::default);
            overlay(&mut ours.max_call_depth, theirs.max_call_depth);
            overlay(&mut ours.stack_capacity, theirs.stack_capacity);
        }
        if let Some(theirs) = &other.debug {
            let ours = self.debug.get_or_insert_with(Default::default);
            overlay(&mut ours.hook, theirs.hook);
            overlay(&mut ours.count, theirs.count);
            overlay(&mut ours.trace_call_targets, theirs.trace_call_targets);
            overlay(&mut ours.max_trace_records, theirs.max_trace_records);
        }
        if let Some(theirs) = &other.libraries {
            let ours = self.libraries.get_or_insert_with(Default::default);
            overlay(&mut ours.vec3, theirs.vec3);
            overlay(&mut ours.vec4, theirs.vec4);
            overlay(&mut ours.mat4, theirs.mat4);
        }
    }
}

fn overlay<T: Copy>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}
