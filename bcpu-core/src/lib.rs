//! # 🧮 bcpu-core
//!
//! Block-structured assembly parser and fixed bit-width virtual CPU.
//!
//! > *"Validate everything up front, then let the machine only ever step."*
//!
//! ## Architecture
//!
//! ```text
//! source lines ──▶ parser ──▶ Program ──▶ Cpu::load ──▶ step()/step_n()/run()
//!                    │                                     │
//!                    ▼                                     ▼
//!              ParseError                registers · memory · trace
//! ```
//!
//! ## Modules
//!
//! - [`namespace`]: reserved names and literal prefixes
//! - [`validate`]: block id / register / data classifiers
//! - [`literal`]: `0b`/`0d`/`0x` literals as unbounded integers
//! - [`instruction`]: the 22-entry opcode table and decoded instructions
//! - [`parser`]: source lines → [`Program`]
//! - [`storage`]: sparse default-zero register file and memory
//! - [`cpu`]: fetch-execute engine
//! - [`trace`]: per-step operand snapshots, JSONL export
//! - [`config`]: `.env` / environment defaults
//!
//! ## Quick Start
//!
//! ```
//! use bcpu_core::prelude::*;
//!
//! let program = parse(&["BLOCK START", "SET R_A 0d5", "ADD R_A R_A R_B", "END"])?;
//!
//! let mut cpu = Cpu::new(CpuConfig::new(8, false))?;
//! cpu.load(program);
//! let summary = cpu.run(10)?;
//!
//! assert!(summary.halted);
//! assert_eq!(cpu.registers().get("R_B").to_string(), "10");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod cpu;
pub mod error;
pub mod instruction;
pub mod literal;
pub mod namespace;
pub mod operand;
pub mod parser;
pub mod program;
pub mod storage;
pub mod trace;
pub mod validate;

// Re-exports
pub use cpu::{Cpu, CpuConfig, MachineState, RunSummary, StepOutcome};
pub use error::{ExecutionError, ExecutionResult, ParseError, ParseErrorKind, ParseResult, Rejection};
pub use instruction::{Instruction, Opcode};
pub use operand::{BlockId, OperandKind, Register};
pub use parser::{parse, parse_source, Parser};
pub use program::{Cursor, Program};
pub use storage::{MemoryBank, RegisterFile, Storage};
pub use trace::{OperandSnapshot, Slot, SnapshotValue, TraceEntry};

/// Prelude
pub mod prelude {
    pub use crate::cpu::{Cpu, CpuConfig, MachineState, RunSummary, StepOutcome};
    pub use crate::error::{ExecutionError, ParseError, ParseErrorKind};
    pub use crate::instruction::{Instruction, Opcode};
    pub use crate::operand::{BlockId, Register};
    pub use crate::parser::{parse, parse_source};
    pub use crate::program::{Cursor, Program};
    pub use crate::trace::{Slot, TraceEntry};
}
