//! Run command - execute a chunk and print what it returns

use super::{load_chunk, load_config, prepare_vm, RunOptions};
use anyhow::Result;
use lunar_runtime::Value;
use std::path::Path;

pub fn run(file: &Path, options: &RunOptions) -> Result<()> {
    let chunk = load_chunk(file)?;
    let config = load_config(options)?;
    let mut vm = prepare_vm(&config, options);

    let values = vm.run(chunk)?;
    if !values.is_empty() {
        println!("{}", format_values(&values));
    }
    Ok(())
}

fn format_values(values: &[Value]) -> String {
    values
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join("\t")
}
