//! Engine tests for bcpu-core
//!
//! Programs are parsed from source and run end to end; the assertions read
//! registers, memory, cursor and trace through the public API.

use bcpu_core::trace::write_jsonl;
use bcpu_core::{
    parse, parse_source, BlockId, Cpu, CpuConfig, Cursor, ExecutionError, Opcode, Slot,
    StepOutcome,
};
use num_bigint::BigUint;

fn load(bit_width: u32, autoloop: bool, source: &str) -> Cpu {
    let program = parse_source(source).unwrap_or_else(|e| panic!("parse failed: {}", e));
    let mut cpu = Cpu::new(CpuConfig::new(bit_width, autoloop)).unwrap();
    cpu.load(program);
    cpu
}

fn value(cpu: &Cpu, register: &str) -> BigUint {
    cpu.registers().get(register)
}

// ===== Arithmetic =====

#[test]
fn test_add_overflow_w8() {
    let mut cpu = load(8, false, "BLOCK START\nSET R_X 0d200\nSET R_Y 0d100\nADD R_X R_Y R_Z\n");
    cpu.step_n(3, false).unwrap();
    assert_eq!(value(&cpu, "R_Z"), BigUint::from(44u32));
    assert_eq!(value(&cpu, "CARRY"), BigUint::from(1u32));
}

#[test]
fn test_add_clears_carry_when_no_overflow() {
    let mut cpu = load(
        8,
        false,
        "BLOCK START\nSET R_X 0d200\nSET R_Y 0d100\nADD R_X R_Y R_Z\nADD R_Y R_Y R_Z\n",
    );
    cpu.step_n(4, false).unwrap();
    assert_eq!(value(&cpu, "R_Z"), BigUint::from(200u32));
    assert_eq!(value(&cpu, "CARRY"), BigUint::from(0u32));
}

#[test]
fn test_mul_overflow_w8() {
    let mut cpu = load(8, false, "BLOCK START\nSET R_X 0d200\nSET R_Y 0d3\nMUL R_X R_Y R_Z\n");
    cpu.step_n(3, false).unwrap();
    assert_eq!(value(&cpu, "R_Z"), BigUint::from(88u32));
    assert_eq!(value(&cpu, "CARRY"), BigUint::from(0u32));
}

#[test]
fn test_not_w4() {
    let mut cpu = load(4, false, "BLOCK START\nSET R_X 0b0101\nNOT R_X R_Y\n");
    cpu.step_n(2, false).unwrap();
    assert_eq!(value(&cpu, "R_Y"), BigUint::from(0b1010u32));
}

#[test]
fn test_set_truncates_copy_does_not() {
    let mut cpu = load(
        8,
        false,
        "BLOCK START\nSET R_A 0x1ff\nSETMEMAD 0x1ff\nADDMEMAD MEMAD\nADDMEMAD R_A\n",
    );
    cpu.step_n(4, false).unwrap();
    assert_eq!(value(&cpu, "R_A"), BigUint::from(0xffu32));
    assert_eq!(value(&cpu, "MEMAD"), BigUint::from(0x1ffu32 * 2 + 0xff));
}

#[test]
fn test_wide_bit_width() {
    let mut cpu = load(
        128,
        false,
        "BLOCK START\nSET R_A 0xffffffffffffffffffffffffffffffff\nSET R_B 0d1\nADD R_A R_B R_C\n",
    );
    cpu.step_n(3, false).unwrap();
    assert_eq!(value(&cpu, "R_C"), BigUint::from(0u32));
    assert_eq!(value(&cpu, "CARRY"), BigUint::from(1u32));
}

// ===== Halt and stepping =====

#[test]
fn test_three_step_program_halts() {
    let mut cpu = load(8, false, "BLOCK START\nSET R_A 0d5\nADD R_A R_A R_B\nEND\n");
    let outcomes = cpu.step_n(3, true).unwrap();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(value(&cpu, "R_A"), BigUint::from(5u32));
    assert_eq!(value(&cpu, "R_B"), BigUint::from(10u32));
    assert_eq!(cpu.cursor(), &Cursor::halted());

    let registers = cpu.registers().clone();
    assert_eq!(cpu.step(true).unwrap(), StepOutcome::Halted);
    assert_eq!(cpu.registers(), &registers);
    assert_eq!(cpu.trace().len(), 3);
}

#[test]
fn test_step_n_past_halt_pads_with_noops() {
    let mut cpu = load(8, false, "BLOCK START\nEND\n");
    let outcomes = cpu.step_n(4, false).unwrap();
    assert_eq!(outcomes[0], StepOutcome::Executed(None));
    assert!(outcomes[1..].iter().all(|o| *o == StepOutcome::Halted));
}

#[test]
fn test_with_trace_false_still_records() {
    let mut cpu = load(8, false, "BLOCK START\nSET R_A 0d1\nEND\n");
    let outcome = cpu.step(false).unwrap();
    assert_eq!(outcome.entry(), None);
    assert_eq!(cpu.trace().len(), 1);
    assert_eq!(cpu.trace()[0].opcode, Opcode::Set);
}

#[test]
fn test_end_trace_entry() {
    let mut cpu = load(8, false, "BLOCK START\nEND\n");
    let entry = cpu.step(true).unwrap().entry().cloned().unwrap();
    assert_eq!(entry.opcode, Opcode::End);
    assert!(entry.involved.is_empty());
    assert!(entry.changed.is_empty());
    assert_eq!(entry.before, Cursor::start());
    assert_eq!(entry.after, Cursor::halted());
}

// ===== Memory =====

#[test]
fn test_store_then_load() {
    let mut cpu = load(
        8,
        false,
        "BLOCK START\nSET R_A 0d77\nSETMEMAD 0d10\nSTORE R_A\nSET R_A 0d1\nSETMEMAD 0d10\nLOAD R_B\n",
    );
    cpu.step_n(6, false).unwrap();
    assert_eq!(value(&cpu, "R_B"), BigUint::from(77u32));
    assert_eq!(cpu.memory().len(), 1);
}

#[test]
fn test_load_unwritten_cell_is_zero() {
    let mut cpu = load(8, false, "BLOCK START\nSET R_A 0d9\nSETMEMAD 0d99\nLOAD R_A\n");
    cpu.step_n(3, false).unwrap();
    assert_eq!(value(&cpu, "R_A"), BigUint::from(0u32));
}

// ===== Control flow =====

const COUNTDOWN: &str = "\
BLOCK START
    SET R_N 0d3
    SET R_ONE 0d1
    SET R_ZERO 0d0
    SET R_ALL 0xff
    JMP LOOP
BLOCK LOOP
    STORE R_N
    ADDMEMAD R_ONE
    ADD R_N R_ALL R_N
    JNE R_N R_ZERO LOOP
    END
";

#[test]
fn test_countdown_loop() {
    let mut cpu = load(8, false, COUNTDOWN);
    let summary = cpu.run(100).unwrap();
    assert!(summary.halted);
    assert_eq!(summary.steps, 5 + 3 * 4 + 1);

    let cells: Vec<(String, String)> = cpu
        .memory()
        .iter()
        .map(|(a, v)| (a.to_string(), v.to_string()))
        .collect();
    assert_eq!(
        cells,
        vec![
            ("0".to_string(), "3".to_string()),
            ("1".to_string(), "2".to_string()),
            ("2".to_string(), "1".to_string()),
        ]
    );
}

#[test]
fn test_jump_trace_records_target() {
    let mut cpu = load(8, false, COUNTDOWN);
    cpu.step_n(5, false).unwrap();
    let jump = &cpu.trace()[4];
    assert_eq!(jump.opcode, Opcode::Jmp);
    assert_eq!(jump.after, Cursor::new(BlockId::parse("LOOP").unwrap(), 0));
    assert!(jump.involved.get(Slot::JumpTarget).is_some());
}

#[test]
fn test_fall_off_block_without_autoloop() {
    let mut cpu = load(8, false, "BLOCK START\nSET R_A 0d1\nBLOCK NEXT\nEND\n");
    cpu.step(false).unwrap();
    let err = cpu.step(false).unwrap_err();
    assert_eq!(
        err,
        ExecutionError::IndexOutOfRange {
            cursor: Cursor::new(BlockId::start(), 1),
            len: 1
        }
    );
}

#[test]
fn test_autoloop_counts_up() {
    let mut cpu = load(8, true, "BLOCK START\nSET R_ONE 0d1\nADD R_I R_ONE R_I\n");
    cpu.run(20).unwrap();
    assert_eq!(value(&cpu, "R_I"), BigUint::from(10u32));
    assert!(!cpu.is_halted());
}

#[test]
fn test_autoloop_trace_advances_by_one() {
    let mut cpu = load(8, true, "BLOCK START\nSET R_ONE 0d1\nADD R_I R_ONE R_I\n");
    cpu.step_n(7, false).unwrap();

    for (i, entry) in cpu.trace().iter().enumerate() {
        assert_eq!(entry.before.index, i);
        assert_eq!(entry.after, entry.before.next());
    }
    assert_eq!(cpu.cursor().index, 7);
    assert_eq!(value(&cpu, "R_I"), BigUint::from(3u32));
}

#[test]
fn test_autoloop_on_empty_start() {
    let mut cpu = load(8, true, "BLOCK START\n");
    assert_eq!(
        cpu.step(false).unwrap_err(),
        ExecutionError::EmptyBlock(BlockId::start())
    );
}

#[test]
fn test_same_input_same_run() {
    let mut a = load(8, false, COUNTDOWN);
    let mut b = load(8, false, COUNTDOWN);
    a.run(100).unwrap();
    b.run(100).unwrap();
    assert_eq!(a.state(), b.state());
    assert_eq!(a.trace(), b.trace());
}

// ===== Pure transitions and export =====

#[test]
fn test_stepped_matches_in_place_step() {
    let program = parse(&["BLOCK START", "SET R_A 0d4", "SHUP R_A R_A R_B", "END"]).unwrap();
    let config = CpuConfig::new(8, false);

    let mut cpu = Cpu::new(config).unwrap();
    cpu.load(program.clone());

    let mut state = cpu.state().clone();
    for _ in 0..3 {
        let (next, entry) = state.stepped(&program, &config).unwrap();
        cpu.step(false).unwrap();
        assert_eq!(&next, cpu.state());
        assert_eq!(entry.as_ref(), cpu.trace().last());
        state = next;
    }
    assert_eq!(state.registers.get("R_B"), BigUint::from(64u32));
}

#[test]
fn test_trace_exports_as_jsonl() {
    let mut cpu = load(8, false, "BLOCK START\nSET R_A 0d300\nEND\n");
    cpu.run(10).unwrap();

    let mut out = Vec::new();
    assert_eq!(write_jsonl(&mut out, cpu.trace()).unwrap(), 2);
    let text = String::from_utf8(out).unwrap();
    let first: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
    assert_eq!(first["opcode"], "SET");
    assert_eq!(first["involved"]["Data"]["value"], "300");
    assert_eq!(first["changed"]["Reg_1"]["value"], "44");
    assert_eq!(first["after"]["index"], 1);
}
