//! Profile command - run a chunk with VM profiling enabled

use super::{load_chunk, load_config, prepare_vm, RunOptions};
use anyhow::Result;
use lunar_runtime::{HookTrigger, Profiler};
use std::path::PathBuf;

/// Arguments for the profile command
#[derive(Debug)]
pub struct ProfileArgs {
    pub file: PathBuf,
    /// Entries shown per report section
    pub top: usize,
}

/// Run the chunk, then print the profiling report
///
/// The profiler sees every instruction regardless of the configured hook
/// trigger.
pub fn run(args: ProfileArgs, options: &RunOptions) -> Result<()> {
    let chunk = load_chunk(&args.file)?;
    let config = load_config(options)?;
    let mut vm = prepare_vm(&config, options);

    let mut profiler = Profiler::enabled();
    let main = vm.load(chunk)?;
    let result = vm.call_with_hook(&main, &[], &mut profiler, HookTrigger::EveryInstruction);

    print!("{}", profiler.report(args.top));
    result?;
    Ok(())
}
