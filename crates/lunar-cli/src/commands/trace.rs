//! Trace command - run a chunk with the tracer hook installed

use super::{load_chunk, load_config, prepare_vm, RunOptions};
use anyhow::{Context, Result};
use lunar_runtime::debugger::TraceRecord;
use lunar_runtime::{HookTrigger, Tracer};
use std::path::PathBuf;

/// Arguments for the trace command
#[derive(Debug, Default)]
pub struct TraceArgs {
    pub file: PathBuf,
    /// Fire only before call instructions, ignoring the configured trigger
    pub calls_only: bool,
    /// Print JSON lines instead of text
    pub json: bool,
    /// Overrides `[debug] max_trace_records`
    pub limit: Option<usize>,
}

/// Run the chunk under the tracer and print every record
///
/// Records collected before a runtime error are still printed; the error is
/// returned afterwards.
pub fn run(args: TraceArgs, options: &RunOptions) -> Result<()> {
    let chunk = load_chunk(&args.file)?;
    let config = load_config(options)?;
    let mut vm = prepare_vm(&config, options);

    let mut tracer = match args.limit {
        Some(limit) => Tracer::new(limit).with_call_targets(config.trace_call_targets()),
        None => Tracer::from_config(&config),
    };
    let trigger = if args.calls_only {
        HookTrigger::CallsOnly
    } else {
        HookTrigger::from_config(&config)
    };

    let main = vm.load(chunk)?;
    let result = vm.call_with_hook(&main, &[], &mut tracer, trigger);

    print_records(tracer.records(), args.json)?;
    if tracer.dropped() > 0 {
        eprintln!("{} records dropped (limit reached)", tracer.dropped());
    }

    result?;
    Ok(())
}

fn print_records(records: &[TraceRecord], json: bool) -> Result<()> {
    for record in records {
        if json {
            let line = serde_json::to_string(record).context("Failed to serialize trace record")?;
            println!("{}", line);
        } else {
            println!("{}", record);
        }
    }
    Ok(())
}
