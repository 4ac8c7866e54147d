//! Subcommand implementations and the setup they share

pub mod disasm;
pub mod profile;
pub mod run;
pub mod trace;

use anyhow::{Context, Result};
use lunar_config::{Config, ConfigLoader};
use lunar_runtime::{stdlib, Chunk, VM};
use std::path::{Path, PathBuf};

/// Flags that apply to every command that executes a chunk
#[derive(Debug, Default, Clone)]
pub struct RunOptions {
    /// Explicit config file; otherwise lunar.toml is searched upward from
    /// the current directory
    pub config: Option<PathBuf>,
    /// Overrides the configured call depth limit
    pub max_call_depth: Option<usize>,
}

/// Read and deserialize a chunk file
pub fn load_chunk(path: &Path) -> Result<Chunk> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    Chunk::from_json(&json)
        .with_context(|| format!("Failed to parse chunk: {}", path.display()))
}

/// Resolve configuration for this invocation
pub fn load_config(options: &RunOptions) -> Result<Config> {
    let mut loader = ConfigLoader::new();
    let config = match &options.config {
        Some(path) => loader
            .load_from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            loader
                .load_from_directory(&cwd)
                .context("Failed to load lunar.toml")?
        }
    };
    if let Some(root) = config.project_root() {
        tracing::debug!(root = %root.display(), "using project config");
    }
    Ok(config)
}

/// VM built from config, CLI overrides applied, libraries opened
pub fn prepare_vm(config: &Config, options: &RunOptions) -> VM {
    let mut vm = VM::with_config(config);
    if let Some(depth) = options.max_call_depth {
        vm.set_max_call_depth(depth);
    }
    stdlib::open_libs_with(vm.state(), config);
    vm
}
