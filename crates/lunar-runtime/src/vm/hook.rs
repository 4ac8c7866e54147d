//! Debug hook installation
//!
//! A hook observes the VM at instruction boundaries. It fires synchronously,
//! before the instruction executes, and receives a [`HookSnapshot`] that
//! borrows the live thread. The hook cannot mutate VM state or call back
//! into the VM; it only gets shared references.

use crate::bytecode::Opcode;
use crate::debugger::HookSnapshot;
use lunar_config::{Config, HookMode};
use std::num::NonZeroU32;

/// Receiver of instruction-boundary callbacks
pub trait DebugHook {
    fn on_instruction(&mut self, snapshot: &HookSnapshot<'_>);
}

impl<F> DebugHook for F
where
    F: FnMut(&HookSnapshot<'_>),
{
    fn on_instruction(&mut self, snapshot: &HookSnapshot<'_>) {
        self(snapshot)
    }
}

/// When a hook fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookTrigger {
    /// Before every instruction
    #[default]
    EveryInstruction,
    /// Before `CALL` and `TAILCALL` only
    CallsOnly,
    /// Before every Nth executed instruction
    Count(NonZeroU32),
}

impl HookTrigger {
    /// Trigger described by the `[debug]` section of a config
    pub fn from_config(config: &Config) -> Self {
        match config.hook_mode() {
            HookMode::EveryInstruction => HookTrigger::EveryInstruction,
            HookMode::Calls => HookTrigger::CallsOnly,
            HookMode::Count => match NonZeroU32::new(config.hook_count()) {
                Some(n) => HookTrigger::Count(n),
                None => HookTrigger::EveryInstruction,
            },
        }
    }

    /// `executed` counts instructions from 1, including this one
    pub fn should_fire(self, opcode: Opcode, executed: u64) -> bool {
        match self {
            HookTrigger::EveryInstruction => true,
            HookTrigger::CallsOnly => opcode.is_call(),
            HookTrigger::Count(n) => executed % u64::from(n.get()) == 0,
        }
    }
}
