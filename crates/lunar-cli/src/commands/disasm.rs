//! Disasm command - print a chunk's instructions

use super::load_chunk;
use anyhow::Result;
use lunar_runtime::bytecode::disassemble;
use std::path::Path;

pub fn run(file: &Path) -> Result<()> {
    let chunk = load_chunk(file)?;
    print!("{}", disassemble(&chunk));
    Ok(())
}
