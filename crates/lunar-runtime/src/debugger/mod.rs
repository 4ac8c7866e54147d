//! Execution introspection.
//!
//! The VM hands every debug hook a [`HookSnapshot`]: a borrowed, read-only
//! view of the running thread at one instruction boundary. From a snapshot a
//! hook can ask two derived questions, both answered lazily and without
//! side effects:
//!
//! - [`HookSnapshot::call_target`]: which callable the instruction's
//!   register A would invoke, directly or through a `__call` metamethod.
//! - [`HookSnapshot::source_position`]: where the instruction came from in
//!   the source text, or [`SourcePosition::UNKNOWN`](crate::SourcePosition::UNKNOWN).
//!
//! Neither query fails. Absence of information is an ordinary result.
//!
//! [`Tracer`] and [`Profiler`] are ready-made hooks built on these queries.

pub mod call_target;
pub mod profiler;
pub mod snapshot;
pub mod source_map;
pub mod tracer;

pub use call_target::{resolve_call_target, CallTarget};
pub use profiler::Profiler;
pub use snapshot::HookSnapshot;
pub use source_map::source_position_for;
pub use tracer::{TraceRecord, TracedCall, Tracer};
