//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::settings::{HookMode, LunarConfig};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// Project configuration file name
pub const PROJECT_CONFIG_FILE: &str = "lunar.toml";

/// Default maximum number of nested call frames
pub const DEFAULT_MAX_CALL_DEPTH: usize = 200;

/// Default initial register stack capacity
pub const DEFAULT_STACK_CAPACITY: usize = 256;

/// Default upper bound on tracer records
pub const DEFAULT_MAX_TRACE_RECORDS: usize = 100_000;

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.lunar/config.toml) - lowest priority
/// 2. Project config (./lunar.toml) - overrides global
/// 3. Environment variables (LUNAR_*) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Merged file contents (global, then project, then environment)
    pub settings: LunarConfig,

    /// Project root directory (where lunar.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use an explicit global config path instead of ~/.lunar/config.toml
    pub fn with_global_config_path(path: impl Into<PathBuf>) -> Self {
        Self {
            global_config_path: Some(path.into()),
        }
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find lunar.toml, then merges it over
    /// the global config if one exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;
        self.assemble(project_config, project_root)
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = LunarConfig::load_from_file(config_path)?;
        let project_root = config_path.parent().map(|p| p.to_path_buf());
        self.assemble(project_config, project_root)
    }

    fn assemble(
        &mut self,
        project_config: LunarConfig,
        project_root: Option<PathBuf>,
    ) -> ConfigResult<Config> {
        let mut settings = match self.load_global_config() {
            Ok(global) => global,
            Err(ConfigError::HomeNotFound) => LunarConfig::default(),
            Err(error) => {
                tracing::warn!(%error, "ignoring unreadable global config");
                LunarConfig::default()
            }
        };
        settings.merge(&project_config);

        let settings = self.apply_env_overrides(settings)?;
        settings.validate()?;

        Ok(Config {
            settings,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config); a default config with no
    /// root when no lunar.toml exists up to the filesystem root.
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, LunarConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.exists() {
                let project_config = LunarConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, LunarConfig::default())),
            }
        }
    }

    /// Load global configuration from ~/.lunar/config.toml
    fn load_global_config(&mut self) -> ConfigResult<LunarConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = LunarConfig::global_config_path()?;
                self.global_config_path = Some(path.clone());
                path
            }
        };

        // Global config is optional - if it doesn't exist, return default
        if !path.exists() {
            return Ok(LunarConfig::default());
        }

        LunarConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides
    ///
    /// Recognized: LUNAR_MAX_CALL_DEPTH, LUNAR_HOOK, LUNAR_HOOK_COUNT
    fn apply_env_overrides(&self, mut config: LunarConfig) -> ConfigResult<LunarConfig> {
        if let Ok(depth) = env::var("LUNAR_MAX_CALL_DEPTH") {
            let depth = depth
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidValue {
                    field: "LUNAR_MAX_CALL_DEPTH".to_string(),
                    reason: format!("expected a positive integer, got '{}'", depth),
                })?;
            config
                .runtime
                .get_or_insert_with(Default::default)
                .max_call_depth = Some(depth);
        }

        if let Ok(hook) = env::var("LUNAR_HOOK") {
            let mode = HookMode::parse(hook.trim()).ok_or_else(|| ConfigError::InvalidValue {
                field: "LUNAR_HOOK".to_string(),
                reason: format!(
                    "must be 'every-instruction', 'calls', or 'count', got '{}'",
                    hook
                ),
            })?;
            config.debug.get_or_insert_with(Default::default).hook = Some(mode);
        }

        if let Ok(count) = env::var("LUNAR_HOOK_COUNT") {
            let count = count
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidValue {
                    field: "LUNAR_HOOK_COUNT".to_string(),
                    reason: format!("expected a positive integer, got '{}'", count),
                })?;
            config.debug.get_or_insert_with(Default::default).count = Some(count);
        }

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Effective maximum call depth
    pub fn max_call_depth(&self) -> usize {
        self.settings
            .runtime
            .as_ref()
            .and_then(|r| r.max_call_depth)
            .unwrap_or(DEFAULT_MAX_CALL_DEPTH)
    }

    /// Effective initial stack capacity
    pub fn stack_capacity(&self) -> usize {
        self.settings
            .runtime
            .as_ref()
            .and_then(|r| r.stack_capacity)
            .unwrap_or(DEFAULT_STACK_CAPACITY)
    }

    /// Effective hook mode
    pub fn hook_mode(&self) -> HookMode {
        self.settings
            .debug
            .as_ref()
            .and_then(|d| d.hook)
            .unwrap_or_default()
    }

    /// Instruction interval for count hooks (at least 1)
    pub fn hook_count(&self) -> u32 {
        self.settings
            .debug
            .as_ref()
            .and_then(|d| d.count)
            .unwrap_or(1)
            .max(1)
    }

    /// Whether the tracer resolves call targets
    pub fn trace_call_targets(&self) -> bool {
        self.settings
            .debug
            .as_ref()
            .and_then(|d| d.trace_call_targets)
            .unwrap_or(true)
    }

    /// Upper bound on tracer records
    pub fn max_trace_records(&self) -> usize {
        self.settings
            .debug
            .as_ref()
            .and_then(|d| d.max_trace_records)
            .unwrap_or(DEFAULT_MAX_TRACE_RECORDS)
    }

    /// Whether a numeric library should be opened (all default to on)
    pub fn library_enabled(&self, name: &str) -> bool {
        let libs = match &self.settings.libraries {
            Some(libs) => libs,
            None => return true,
        };
        let flag = match name {
            "vec3" => libs.vec3,
            "vec4" => libs.vec4,
            "mat4" => libs.mat4,
            _ => None,
        };
        flag.unwrap_or(true)
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if a lunar.toml was found
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_path = dir.join(PROJECT_CONFIG_FILE);
        fs::write(&config_path, content).unwrap();
        config_path
    }

    fn isolated_loader(dir: &TempDir) -> ConfigLoader {
        ConfigLoader::with_global_config_path(dir.path().join("no-global.toml"))
    }

    #[test]
    fn test_load_project_config() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[runtime]
max_call_depth = 32
"#,
        );

        let mut loader = isolated_loader(&temp_dir);
        let config = loader.load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(config.max_call_depth(), 32);
        assert!(config.is_project());
    }

    #[test]
    fn test_find_config_in_parent() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[debug]
hook = "calls"
"#,
        );

        let sub_dir = temp_dir.path().join("subdir");
        fs::create_dir(&sub_dir).unwrap();

        let mut loader = isolated_loader(&temp_dir);
        let config = loader.load_from_directory(&sub_dir).unwrap();

        assert_eq!(config.hook_mode(), HookMode::Calls);
        assert_eq!(config.project_root(), Some(temp_dir.path()));
    }

    #[test]
    fn test_defaults_without_config() {
        let config = Config::default();

        assert_eq!(config.max_call_depth(), DEFAULT_MAX_CALL_DEPTH);
        assert_eq!(config.stack_capacity(), DEFAULT_STACK_CAPACITY);
        assert_eq!(config.hook_mode(), HookMode::EveryInstruction);
        assert!(config.trace_call_targets());
        assert!(config.library_enabled("mat4"));
        assert!(!config.is_project());
    }

    #[test]
    #[serial]
    fn test_env_override_hook() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[debug]
hook = "every-instruction"
"#,
        );

        env::set_var("LUNAR_HOOK", "count");
        env::set_var("LUNAR_HOOK_COUNT", "7");

        let mut loader = isolated_loader(&temp_dir);
        let config = loader.load_from_directory(temp_dir.path());

        env::remove_var("LUNAR_HOOK");
        env::remove_var("LUNAR_HOOK_COUNT");

        let config = config.unwrap();
        assert_eq!(config.hook_mode(), HookMode::Count);
        assert_eq!(config.hook_count(), 7);
    }

    #[test]
    #[serial]
    fn test_env_override_rejects_garbage() {
        let temp_dir = TempDir::new().unwrap();

        env::set_var("LUNAR_MAX_CALL_DEPTH", "deep");
        let mut loader = isolated_loader(&temp_dir);
        let result = loader.load_from_directory(temp_dir.path());
        env::remove_var("LUNAR_MAX_CALL_DEPTH");

        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    #[serial]
    fn test_count_interval_from_env_completes_project_hook() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[debug]
hook = "count"
"#,
        );

        env::set_var("LUNAR_HOOK_COUNT", "5");
        let mut loader = isolated_loader(&temp_dir);
        let config = loader.load_from_directory(temp_dir.path());
        env::remove_var("LUNAR_HOOK_COUNT");

        let config = config.unwrap();
        assert_eq!(config.hook_mode(), HookMode::Count);
        assert_eq!(config.hook_count(), 5);
    }

    #[test]
    #[serial]
    fn test_global_hook_completed_by_project_count() {
        let temp_dir = TempDir::new().unwrap();
        let global = temp_dir.path().join("global.toml");
        fs::write(&global, "[debug]\nhook = \"count\"\n").unwrap();
        create_config_file(temp_dir.path(), "[debug]\ncount = 9\n");

        let mut loader = ConfigLoader::with_global_config_path(global.clone());
        let config = loader.load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(config.hook_mode(), HookMode::Count);
        assert_eq!(config.hook_count(), 9);
    }

    #[test]
    #[serial]
    fn test_incomplete_layers_still_rejected_after_merge() {
        let temp_dir = TempDir::new().unwrap();
        let global = temp_dir.path().join("global.toml");
        fs::write(&global, "[debug]\nhook = \"count\"\n").unwrap();

        let mut loader = ConfigLoader::with_global_config_path(global.clone());
        let result = loader.load_from_directory(temp_dir.path());

        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    #[serial]
    fn test_unparsable_global_falls_back_to_project() {
        let temp_dir = TempDir::new().unwrap();
        let global = temp_dir.path().join("global.toml");
        fs::write(&global, "[debug\nhook = ").unwrap();
        create_config_file(temp_dir.path(), "[runtime]\nmax_call_depth = 12\n");

        let mut loader = ConfigLoader::with_global_config_path(global.clone());
        let config = loader.load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(config.max_call_depth(), 12);
        assert_eq!(config.hook_mode(), HookMode::EveryInstruction);
    }

    #[test]
    fn test_load_from_specific_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config_file(
            temp_dir.path(),
            r#"
[libraries]
mat4 = false
"#,
        );

        let mut loader = isolated_loader(&temp_dir);
        let config = loader.load_from_file(&config_path).unwrap();

        assert!(!config.library_enabled("mat4"));
        assert!(config.library_enabled("vec3"));
    }
}
