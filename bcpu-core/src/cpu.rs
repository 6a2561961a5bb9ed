//! # Execution engine
//!
//! Fetch-execute state machine over a parsed [`Program`].
//!
//! ```text
//!   load()            step()                  END
//!  ───────▶ (START,0) ───────▶ (block,i) ──···──────▶ (END,0)  halted
//!                      fetch → execute → advance
//! ```
//!
//! Arithmetic is truncated to `bit_width` bits (modulus 2^W) per opcode:
//!
//! | Result                      | Opcodes                          |
//! |-----------------------------|----------------------------------|
//! | reduced mod 2^W             | SET ADD MUL SHUP SHDO            |
//! | W-bit complement involved   | NOT XOR                          |
//! | written verbatim            | COPY SETMEMAD ADDMEMAD CMP GT LT |
//! | written verbatim            | AND OR LOAD STORE                |
//!
//! `COPY`, `SETMEMAD` and `ADDMEMAD` never mask their result, so a value
//! wider than W bits can reach a register through them.

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};

use crate::config;
use crate::error::{ExecutionError, ExecutionResult};
use crate::instruction::Instruction;
use crate::operand::{BlockId, Register};
use crate::program::{Cursor, Program};
use crate::storage::{MemoryBank, RegisterFile};
use crate::trace::{OperandSnapshot, Slot, SnapshotValue, TraceEntry};

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Widest register accepted by [`Cpu::new`]
pub const MAX_BIT_WIDTH: u32 = 4096;

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuConfig {
    /// Register width W in bits
    pub bit_width: u32,
    /// Wrap past the end of a block instead of failing
    pub autoloop: bool,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            bit_width: *config::BIT_WIDTH,
            autoloop: *config::AUTOLOOP,
        }
    }
}

impl CpuConfig {
    pub fn new(bit_width: u32, autoloop: bool) -> Self {
        Self { bit_width, autoloop }
    }

    pub fn with_bit_width(mut self, bit_width: u32) -> Self {
        self.bit_width = bit_width;
        self
    }

    pub fn with_autoloop(mut self, autoloop: bool) -> Self {
        self.autoloop = autoloop;
        self
    }

    /// 2^W
    pub fn modulus(&self) -> BigUint {
        BigUint::one() << self.bit_width
    }

    /// 2^W - 1, all W bits set
    pub fn mask(&self) -> BigUint {
        self.modulus() - 1u32
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MACHINE STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Registers, memory and cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineState {
    pub registers: RegisterFile,
    pub memory: MemoryBank,
    pub cursor: Cursor,
}

impl Default for MachineState {
    fn default() -> Self {
        Self::new()
    }
}

impl MachineState {
    /// Fresh state at `("START", 0)` with `CARRY` and `MEMAD` zeroed
    pub fn new() -> Self {
        Self {
            registers: RegisterFile::with_special_registers(),
            memory: MemoryBank::new(),
            cursor: Cursor::start(),
        }
    }

    pub fn is_halted(&self) -> bool {
        self.cursor.is_halted()
    }

    /// Pure transition: returns the successor state and leaves `self` untouched
    pub fn stepped(
        &self,
        program: &Program,
        config: &CpuConfig,
    ) -> ExecutionResult<(MachineState, Option<TraceEntry>)> {
        let mut next = self.clone();
        let entry = next.apply(program, config)?;
        Ok((next, entry))
    }

    /// Executes one instruction in place.
    ///
    /// Returns `None` without touching anything when already halted.
    pub fn apply(
        &mut self,
        program: &Program,
        config: &CpuConfig,
    ) -> ExecutionResult<Option<TraceEntry>> {
        self.apply_masked(program, config, &config.mask())
    }

    /// `apply` with the W-bit mask supplied by the caller
    pub(crate) fn apply_masked(
        &mut self,
        program: &Program,
        config: &CpuConfig,
        mask: &BigUint,
    ) -> ExecutionResult<Option<TraceEntry>> {
        if self.cursor.is_halted() {
            return Ok(None);
        }

        // Autoloop wraps the fetch only; the cursor itself keeps counting
        let before = self.cursor.clone();
        let (_, instr) = program.fetch(&before, config.autoloop)?;

        let mut exec = Exec {
            registers: &mut self.registers,
            memory: &mut self.memory,
            bit_width: config.bit_width,
            mask,
            involved: OperandSnapshot::new(),
            changed: OperandSnapshot::new(),
        };
        let after = exec.execute(instr, &before);
        let Exec { involved, changed, .. } = exec;

        tracing::trace!("{} {} -> {}", instr.opcode(), before, after);
        if after.is_halted() {
            tracing::debug!("halted at {}", before);
        }

        self.cursor = after.clone();
        Ok(Some(TraceEntry {
            opcode: instr.opcode(),
            involved,
            changed,
            before,
            after,
        }))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXECUTE
// ═══════════════════════════════════════════════════════════════════════════════

/// One instruction's view of the machine, recording what it reads and writes
struct Exec<'a> {
    registers: &'a mut RegisterFile,
    memory: &'a mut MemoryBank,
    bit_width: u32,
    mask: &'a BigUint,
    involved: OperandSnapshot,
    changed: OperandSnapshot,
}

impl Exec<'_> {
    fn read(&mut self, slot: Slot, reg: &Register) -> BigUint {
        let value = self.registers.get(reg);
        self.involved.register(slot, reg, value.clone());
        value
    }

    fn write(&mut self, slot: Slot, reg: &Register, value: BigUint) {
        self.changed.register(slot, reg, value.clone());
        self.registers.update(reg.clone(), value);
    }

    fn literal(&mut self, value: &BigUint) {
        self.involved.push(Slot::Data, SnapshotValue::Literal { value: value.clone() });
    }

    fn jump_target(&mut self, target: &BlockId) {
        self.involved.push(Slot::JumpTarget, SnapshotValue::Block { id: target.clone() });
    }

    /// Reads the cell under `MEMAD`, recording both
    fn memory_cell(&mut self) -> (BigUint, BigUint) {
        let address = self.read(Slot::Memad, &Register::memad());
        let value = self.memory.get(&address);
        self.involved.push(
            Slot::Memory,
            SnapshotValue::Memory { address: address.clone(), value: value.clone() },
        );
        (address, value)
    }

    /// W-bit complement of the W-bit-masked input
    fn complement(&self, value: &BigUint) -> BigUint {
        (value & self.mask) ^ self.mask
    }

    fn shift_up(&self, value: &BigUint, amount: &BigUint) -> BigUint {
        match amount.to_u64() {
            Some(n) if n < u64::from(self.bit_width) => (value << n) & self.mask,
            _ => BigUint::zero(),
        }
    }

    fn shift_down(&self, value: &BigUint, amount: &BigUint) -> BigUint {
        match amount.to_u64() {
            Some(n) if n < value.bits() => (value >> n) & self.mask,
            _ => BigUint::zero(),
        }
    }

    /// Runs `instr` fetched under `here` and returns the next cursor
    fn execute(&mut self, instr: &Instruction, here: &Cursor) -> Cursor {
        use Instruction as I;

        match instr {
            // ─────────────────────────────────────────────────────────
            // Control flow
            // ─────────────────────────────────────────────────────────
            I::End => return Cursor::halted(),
            I::Jmp { target } => {
                self.jump_target(target);
                return Cursor::new(target.clone(), 0);
            }
            I::Jne { lhs, rhs, target } | I::Jie { lhs, rhs, target } => {
                let a = self.read(Slot::Reg(1), lhs);
                let b = self.read(Slot::Reg(2), rhs);
                self.jump_target(target);
                let taken = match instr {
                    I::Jne { .. } => a != b,
                    _ => a == b,
                };
                if taken {
                    return Cursor::new(target.clone(), 0);
                }
            }

            // ─────────────────────────────────────────────────────────
            // Selection
            // ─────────────────────────────────────────────────────────
            I::Cmp { lhs, rhs, if_true, if_false, dest }
            | I::Gt { lhs, rhs, if_true, if_false, dest }
            | I::Lt { lhs, rhs, if_true, if_false, dest } => {
                let a = self.read(Slot::Reg(1), lhs);
                let b = self.read(Slot::Reg(2), rhs);
                let on_true = self.read(Slot::Reg(3), if_true);
                let on_false = self.read(Slot::Reg(4), if_false);
                self.read(Slot::Reg(5), dest);
                let holds = match instr {
                    I::Cmp { .. } => a == b,
                    I::Gt { .. } => a > b,
                    _ => a < b,
                };
                self.write(Slot::Reg(5), dest, if holds { on_true } else { on_false });
            }

            // ─────────────────────────────────────────────────────────
            // Arithmetic
            // ─────────────────────────────────────────────────────────
            I::Add { lhs, rhs, dest } => {
                let a = self.read(Slot::Reg(1), lhs);
                let b = self.read(Slot::Reg(2), rhs);
                self.read(Slot::Reg(3), dest);
                self.read(Slot::Carry, &Register::carry());

                let sum = a + b;
                let carry = &sum >> self.bit_width;
                let result = sum & self.mask;
                // CARRY as destination keeps the carry, not the truncated sum
                let result = if dest.is_carry() { carry.clone() } else { result };
                self.write(Slot::Reg(3), dest, result);
                self.write(Slot::Carry, &Register::carry(), carry);
            }
            I::Mul { lhs, rhs, dest } => {
                let a = self.read(Slot::Reg(1), lhs);
                let b = self.read(Slot::Reg(2), rhs);
                self.read(Slot::Reg(3), dest);
                self.write(Slot::Reg(3), dest, (a * b) & self.mask);
            }
            I::Shup { value, amount, dest } => {
                let v = self.read(Slot::Reg(1), value);
                let n = self.read(Slot::Reg(2), amount);
                self.read(Slot::Reg(3), dest);
                let result = self.shift_up(&v, &n);
                self.write(Slot::Reg(3), dest, result);
            }
            I::Shdo { value, amount, dest } => {
                let v = self.read(Slot::Reg(1), value);
                let n = self.read(Slot::Reg(2), amount);
                self.read(Slot::Reg(3), dest);
                let result = self.shift_down(&v, &n);
                self.write(Slot::Reg(3), dest, result);
            }

            // ─────────────────────────────────────────────────────────
            // Bitwise
            // ─────────────────────────────────────────────────────────
            I::Not { src, dest } => {
                let v = self.read(Slot::Reg(1), src);
                self.read(Slot::Reg(2), dest);
                let result = self.complement(&v);
                self.write(Slot::Reg(2), dest, result);
            }
            I::And { lhs, rhs, dest } | I::Or { lhs, rhs, dest } | I::Xor { lhs, rhs, dest } => {
                let a = self.read(Slot::Reg(1), lhs);
                let b = self.read(Slot::Reg(2), rhs);
                self.read(Slot::Reg(3), dest);
                let result = match instr {
                    I::And { .. } => a & b,
                    I::Or { .. } => a | b,
                    _ => (&a & self.complement(&b)) | (self.complement(&a) & &b),
                };
                self.write(Slot::Reg(3), dest, result);
            }

            // ─────────────────────────────────────────────────────────
            // Memory / data movement
            // ─────────────────────────────────────────────────────────
            I::Load { dest } => {
                let (_, value) = self.memory_cell();
                self.read(Slot::Reg(1), dest);
                self.write(Slot::Reg(1), dest, value);
            }
            I::Store { src } => {
                let (address, _) = self.memory_cell();
                let value = self.read(Slot::Reg(1), src);
                self.changed.push(
                    Slot::Memory,
                    SnapshotValue::Memory { address: address.clone(), value: value.clone() },
                );
                self.memory.update(address, value);
            }
            I::Set { dest, value } => {
                self.read(Slot::Reg(1), dest);
                self.literal(value);
                self.write(Slot::Reg(1), dest, value & self.mask);
            }
            I::Copy { src, dest } => {
                let v = self.read(Slot::Reg(1), src);
                self.read(Slot::Reg(2), dest);
                self.write(Slot::Reg(2), dest, v);
            }
            I::SetMemad { address } => {
                self.literal(address);
                self.read(Slot::Memad, &Register::memad());
                self.write(Slot::Memad, &Register::memad(), address.clone());
            }
            I::AddMemad { offset } => {
                let base = self.read(Slot::Memad, &Register::memad());
                let delta = self.read(Slot::Reg(1), offset);
                self.write(Slot::Memad, &Register::memad(), base + delta);
            }
        }

        here.next()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CPU
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of one `step` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Cursor was already halted; nothing ran
    Halted,
    /// One instruction ran; the entry is present when requested
    Executed(Option<TraceEntry>),
}

impl StepOutcome {
    pub fn executed(&self) -> bool {
        matches!(self, Self::Executed(_))
    }

    pub fn entry(&self) -> Option<&TraceEntry> {
        match self {
            Self::Executed(entry) => entry.as_ref(),
            Self::Halted => None,
        }
    }
}

/// Summary of a bounded run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Instructions executed by this run
    pub steps: usize,
    pub halted: bool,
}

/// Virtual CPU
#[derive(Debug, Clone)]
pub struct Cpu {
    config: CpuConfig,
    /// 2^W - 1, built once
    mask: BigUint,
    state: MachineState,
    program: Option<Program>,
    trace: Vec<TraceEntry>,
}

impl Cpu {
    /// Creates an engine; `bit_width` must lie in `1..=MAX_BIT_WIDTH`
    pub fn new(config: CpuConfig) -> ExecutionResult<Self> {
        if !(1..=MAX_BIT_WIDTH).contains(&config.bit_width) {
            return Err(ExecutionError::InvalidBitWidth(config.bit_width));
        }
        Ok(Self {
            config,
            mask: config.mask(),
            state: MachineState::new(),
            program: None,
            trace: Vec::new(),
        })
    }

    /// Installs `program`, moves the cursor to `("START", 0)` and clears the
    /// trace. Registers and memory keep their contents.
    pub fn load(&mut self, program: Program) {
        tracing::debug!(
            "loaded {} block(s), {} instruction(s)",
            program.block_ids().len(),
            program.instruction_count()
        );
        self.program = Some(program);
        self.state.cursor = Cursor::start();
        self.trace.clear();
    }

    /// Executes one instruction. The entry is always appended to the trace;
    /// `with_trace` only controls whether it is also returned.
    pub fn step(&mut self, with_trace: bool) -> ExecutionResult<StepOutcome> {
        let program = self.program.as_ref().ok_or(ExecutionError::NoProgramLoaded)?;
        match self.state.apply_masked(program, &self.config, &self.mask)? {
            None => Ok(StepOutcome::Halted),
            Some(entry) => {
                let returned = with_trace.then(|| entry.clone());
                self.trace.push(entry);
                Ok(StepOutcome::Executed(returned))
            }
        }
    }

    /// Calls `step` exactly `count` times
    pub fn step_n(&mut self, count: usize, with_trace: bool) -> ExecutionResult<Vec<StepOutcome>> {
        (0..count).map(|_| self.step(with_trace)).collect()
    }

    /// Steps until halted or `limit` instructions have run
    pub fn run(&mut self, limit: usize) -> ExecutionResult<RunSummary> {
        let mut steps = 0;
        while steps < limit {
            if !self.step(false)?.executed() {
                break;
            }
            steps += 1;
        }
        Ok(RunSummary { steps, halted: self.is_halted() })
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.state.registers
    }

    pub fn memory(&self) -> &MemoryBank {
        &self.state.memory
    }

    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    pub fn cursor(&self) -> &Cursor {
        &self.state.cursor
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    pub fn config(&self) -> &CpuConfig {
        &self.config
    }

    pub fn bit_width(&self) -> u32 {
        self.config.bit_width
    }

    pub fn is_halted(&self) -> bool {
        self.state.is_halted()
    }
}
