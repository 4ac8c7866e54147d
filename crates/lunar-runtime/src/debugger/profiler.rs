//! Instruction profiler built on the debug hook.
//!
//! Counts executed instructions per opcode and per source line. Disabled
//! profilers ignore every hook firing.

use super::HookSnapshot;
use crate::bytecode::Opcode;
use crate::source::SourcePosition;
use crate::vm::DebugHook;
use std::collections::HashMap;

/// VM profiler for performance analysis
///
/// Install it as a hook with `HookTrigger::EveryInstruction` for exact
/// counts, or with `HookTrigger::Count` to sample.
#[derive(Debug, Clone)]
pub struct Profiler {
    /// Whether profiling is enabled
    enabled: bool,
    /// Total instructions recorded
    total_instructions: u64,
    /// Instructions recorded per opcode
    instruction_counts: HashMap<Opcode, u64>,
    /// Instructions recorded per (function, line)
    line_counts: HashMap<(String, u32), u64>,
    /// Instructions with no source position
    unmapped: u64,
}

impl Profiler {
    /// Create a new profiler (disabled by default)
    pub fn new() -> Self {
        Self {
            enabled: false,
            total_instructions: 0,
            instruction_counts: HashMap::new(),
            line_counts: HashMap::new(),
            unmapped: 0,
        }
    }

    /// Create a new profiler with profiling enabled
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::new()
        }
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Reset profiling statistics
    pub fn reset(&mut self) {
        self.total_instructions = 0;
        self.instruction_counts.clear();
        self.line_counts.clear();
        self.unmapped = 0;
    }

    /// Record one executed instruction
    pub fn record(&mut self, opcode: Opcode, function: &str, position: SourcePosition) {
        if !self.enabled {
            return;
        }

        self.total_instructions += 1;
        *self.instruction_counts.entry(opcode).or_insert(0) += 1;

        if position.is_unknown() {
            self.unmapped += 1;
        } else {
            *self
                .line_counts
                .entry((function.to_string(), position.line))
                .or_insert(0) += 1;
        }
    }

    pub fn total_instructions(&self) -> u64 {
        self.total_instructions
    }

    pub fn instruction_count(&self, opcode: Opcode) -> u64 {
        self.instruction_counts.get(&opcode).copied().unwrap_or(0)
    }

    /// Instructions recorded without a source position
    pub fn unmapped_instructions(&self) -> u64 {
        self.unmapped
    }

    /// The `n` most executed opcodes, most frequent first
    pub fn top_opcodes(&self, n: usize) -> Vec<(Opcode, u64)> {
        let mut counts: Vec<_> = self
            .instruction_counts
            .iter()
            .map(|(op, count)| (*op, *count))
            .collect();
        // Sort by count (descending), then by opcode for stable output
        counts.sort_by(|a, b| b.1.cmp(&a.1).then((a.0 as u8).cmp(&(b.0 as u8))));
        counts.truncate(n);
        counts
    }

    /// The `n` most executed source lines, most frequent first
    pub fn hot_lines(&self, n: usize) -> Vec<(String, u32, u64)> {
        let mut lines: Vec<_> = self
            .line_counts
            .iter()
            .map(|((function, line), count)| (function.clone(), *line, *count))
            .collect();
        lines.sort_by(|a, b| {
            b.2.cmp(&a.2)
                .then_with(|| a.0.cmp(&b.0))
                .then(a.1.cmp(&b.1))
        });
        lines.truncate(n);
        lines
    }

    /// Generate a profiling report
    ///
    /// Lists at most `top` entries per section.
    pub fn report(&self, top: usize) -> String {
        if !self.enabled {
            return "Profiling not enabled".to_string();
        }

        let mut report = String::new();
        report.push_str(&format!(
            "Total instructions executed: {}\n\n",
            self.total_instructions
        ));

        if self.instruction_counts.is_empty() {
            report.push_str("No instructions recorded\n");
            return report;
        }

        report.push_str("Instruction counts by opcode:\n");
        for (opcode, count) in self.top_opcodes(top) {
            report.push_str(&format!(
                "  {:<20} {:>10} ({:>6.2}%)\n",
                opcode.mnemonic(),
                count,
                self.percentage(count)
            ));
        }

        report.push_str("\nHot lines:\n");
        for (function, line, count) in self.hot_lines(top) {
            report.push_str(&format!(
                "  {:<20} {:>10} ({:>6.2}%)\n",
                format!("{}:{}", function, line),
                count,
                self.percentage(count)
            ));
        }
        if self.unmapped > 0 {
            report.push_str(&format!(
                "  {:<20} {:>10} ({:>6.2}%)\n",
                "<no position>",
                self.unmapped,
                self.percentage(self.unmapped)
            ));
        }

        report
    }

    fn percentage(&self, count: u64) -> f64 {
        (count as f64 / self.total_instructions as f64) * 100.0
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugHook for Profiler {
    fn on_instruction(&mut self, snapshot: &HookSnapshot<'_>) {
        if let Some(opcode) = snapshot.instruction().opcode() {
            let position = snapshot.source_position();
            self.record(opcode, snapshot.frame().function.name(), position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LINE_1: SourcePosition = SourcePosition::new(1, 1);
    const LINE_2: SourcePosition = SourcePosition::new(2, 1);

    #[test]
    fn test_profiler_new() {
        let profiler = Profiler::new();
        assert!(!profiler.is_enabled());
        assert_eq!(profiler.total_instructions(), 0);
    }

    #[test]
    fn test_enable_disable() {
        let mut profiler = Profiler::new();
        profiler.enable();
        assert!(profiler.is_enabled());
        profiler.disable();
        assert!(!profiler.is_enabled());
    }

    #[test]
    fn test_record() {
        let mut profiler = Profiler::enabled();

        profiler.record(Opcode::Add, "main", LINE_1);
        profiler.record(Opcode::Add, "main", LINE_1);
        profiler.record(Opcode::Mul, "main", LINE_2);

        assert_eq!(profiler.total_instructions(), 3);
        assert_eq!(profiler.instruction_count(Opcode::Add), 2);
        assert_eq!(profiler.instruction_count(Opcode::Mul), 1);
        assert_eq!(profiler.instruction_count(Opcode::Sub), 0);
    }

    #[test]
    fn test_record_when_disabled() {
        let mut profiler = Profiler::new();

        profiler.record(Opcode::Add, "main", LINE_1);

        assert_eq!(profiler.total_instructions(), 0);
        assert_eq!(profiler.instruction_count(Opcode::Add), 0);
    }

    #[test]
    fn test_reset() {
        let mut profiler = Profiler::enabled();
        profiler.record(Opcode::Add, "main", LINE_1);
        profiler.record(Opcode::Mul, "main", SourcePosition::UNKNOWN);

        profiler.reset();
        assert_eq!(profiler.total_instructions(), 0);
        assert_eq!(profiler.unmapped_instructions(), 0);
        assert!(profiler.hot_lines(10).is_empty());
    }

    #[test]
    fn test_hot_lines_and_top_opcodes() {
        let mut profiler = Profiler::enabled();
        profiler.record(Opcode::Add, "f", LINE_2);
        profiler.record(Opcode::Move, "f", LINE_2);
        profiler.record(Opcode::Move, "main", LINE_1);
        profiler.record(Opcode::Move, "main", SourcePosition::UNKNOWN);

        assert_eq!(
            profiler.hot_lines(2),
            vec![("f".to_string(), 2, 2), ("main".to_string(), 1, 1)]
        );
        assert_eq!(profiler.top_opcodes(1), vec![(Opcode::Move, 3)]);
        assert_eq!(profiler.unmapped_instructions(), 1);
    }

    #[test]
    fn test_report_when_disabled() {
        assert!(Profiler::new().report(10).contains("not enabled"));
    }

    #[test]
    fn test_report_with_data() {
        let mut profiler = Profiler::enabled();

        profiler.record(Opcode::Add, "main", LINE_1);
        profiler.record(Opcode::Add, "main", LINE_1);
        profiler.record(Opcode::Mul, "main", LINE_2);

        let report = profiler.report(10);
        assert!(report.contains("Total instructions executed: 3"));
        assert!(report.contains("ADD"));
        assert!(report.contains("MUL"));
        assert!(report.contains("66.67%")); // ADD: 2/3
        assert!(report.contains("33.33%")); // MUL: 1/3
        assert!(report.contains("main:1"));
    }

    #[test]
    fn test_report_empty() {
        let report = Profiler::enabled().report(10);
        assert!(report.contains("No instructions recorded"));
    }
}
