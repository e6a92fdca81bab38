//! End-to-end integration tests for the KASM toolchain
//!
//! These tests verify the complete workflow:
//! 1. Assemble source code into a program image
//! 2. Execute the image in the VM
//! 3. Verify exit codes, register state, and console output
//!
//! Syscall conventions: `$v0` selects the syscall, `$a0..$a3` carry the
//! arguments, and any result comes back in `$v0`.

use kasm_runtime::{BufferedConsole, HaltReason, RuntimeError, Vm, VmConfig};

use kasm_assembler::assemble;
use kasm_spec::Register;

fn boot(source: &str) -> Vm<BufferedConsole> {
    let program = assemble(source).expect("Assembly failed");
    Vm::with_console(program, VmConfig::default(), BufferedConsole::new())
        .expect("Load failed")
}

// ============================================================================
// Assemble -> Execute Tests
// ============================================================================

#[test]
fn test_simple_addition() {
    // Add 5 + 3 = 8 and exit with the sum
    let source = r#"
        li $t0, 5
        li $t1, 3
        add $a0, $t0, $t1
        li $v0, 0
        sys
    "#;

    let mut vm = boot(source);
    let result = vm.run().expect("Execution failed");

    assert_eq!(result.halt_reason, HaltReason::Exit(8));
    assert_eq!(result.exit_code(), Some(8));
}

#[test]
fn test_arithmetic_suite() {
    let source = r#"
        li $t0, 50
        li $t1, 7
        sub $s0, $t0, $t1      # 43
        mul $s1, $t0, $t1      # 350
        div $s2, $t0, $t1      # 7
        mod $s3, $t0, $t1      # 1
    "#;

    let mut vm = boot(source);
    let result = vm.run().expect("Execution failed");

    assert_eq!(result.halt_reason, HaltReason::Completed);
    assert_eq!(vm.register(Register::S0), 43);
    assert_eq!(vm.register(Register::S1), 350);
    assert_eq!(vm.register(Register::S2), 7);
    assert_eq!(vm.register(Register::S3), 1);
}

#[test]
fn test_bitwise_operations() {
    let source = r#"
        li $t0, 255
        li $t1, 15
        and $s0, $t0, $t1
        or $s1, $t0, $t1
        xor $s2, $t0, $t1
        nor $s3, $t0, $t1
        andi $s4, $t0, 0xF0
        ori $s5, $t1, 0x100
        xori $s6, $t1, 0xFF
    "#;

    let mut vm = boot(source);
    vm.run().expect("Execution failed");

    assert_eq!(vm.register(Register::S0), 255 & 15);
    assert_eq!(vm.register(Register::S1), 255 | 15);
    assert_eq!(vm.register(Register::S2), 255 ^ 15);
    assert_eq!(vm.register(Register::S3), !(255u32 | 15));
    assert_eq!(vm.register(Register::S4), 255 & 0xF0);
    assert_eq!(vm.register(Register::S5), 15 | 0x100);
    assert_eq!(vm.register(Register::S6), 15 ^ 0xFF);
}

#[test]
fn test_shifts_and_comparisons() {
    let source = r#"
        li $t0, 8
        li $t1, 2
        sll $s0, $t0, $t1      # 32
        srl $s1, $t0, $t1      # 2
        addi $t2, $zero, -8
        sra $s2, $t2, $t1      # -2 (arithmetic)
        srl $s3, $t2, $t1      # logical, high bits stay set
        slt $s4, $t2, $t0      # -8 < 8 signed: 1
        sltu $s5, $t2, $t0     # 0xFFFFFFF8 < 8 unsigned: 0
    "#;

    let mut vm = boot(source);
    vm.run().expect("Execution failed");

    assert_eq!(vm.register(Register::S0), 32);
    assert_eq!(vm.register(Register::S1), 2);
    assert_eq!(vm.register(Register::S2) as i32, -2);
    assert_eq!(vm.register(Register::S3), 0xFFFF_FFF8u32 >> 2);
    assert_eq!(vm.register(Register::S4), 1);
    assert_eq!(vm.register(Register::S5), 0);
}

#[test]
fn test_li_is_unsigned_addi_is_signed() {
    let source = r#"
        li $t0, 0xFFFF
        addi $t1, $zero, -1
    "#;

    let mut vm = boot(source);
    vm.run().expect("Execution failed");

    // li zero-extends its 16-bit immediate; addi sign-extends.
    assert_eq!(vm.register(Register::T0), 0x0000_FFFF);
    assert_eq!(vm.register(Register::T1), 0xFFFF_FFFF);
}

// ============================================================================
// Control Flow Tests
// ============================================================================

#[test]
fn test_counting_loop() {
    // Sum 1..=10 into $s0
    let source = r#"
        li $t0, 1
        li $t1, 10
        li $s0, 0
    loop:
        add $s0, $s0, $t0
        addi $t0, $t0, 1
        ble $t0, $t1, loop
        add $a0, $s0, $zero
        li $v0, 0
        sys
    "#;

    let mut vm = boot(source);
    let result = vm.run().expect("Execution failed");

    assert_eq!(result.halt_reason, HaltReason::Exit(55));
}

#[test]
fn test_branch_skips_reserved_word() {
    // The branch jumps over a word that would fault if executed.
    let source = r#"
        beq $zero, $zero, skip
        .word 0x94000000
    skip:
        nop
    "#;

    let mut vm = boot(source);
    let result = vm.run().expect("Execution failed");

    assert_eq!(result.halt_reason, HaltReason::Completed);
    assert_eq!(result.cycles, 2);
}

#[test]
fn test_executing_reserved_word_faults() {
    // Same program without the branch: execution reaches the bad word.
    let source = r#"
        nop
        .word 0x94000000
    "#;

    let mut vm = boot(source);
    let error = vm.run().expect_err("Reserved opcode must fault");

    assert!(matches!(
        error,
        RuntimeError::IllegalOpcode { pc: 4, opcode: 0x25 }
    ));
    // pc is left at the faulting word.
    assert_eq!(vm.pc(), 4);
}

#[test]
fn test_function_call_and_return() {
    let source = r#"
        li $a0, 6
        jal double
        add $s0, $v0, $zero
        li $a0, 9
        jal double
        add $s1, $v0, $zero
        b done
    double:
        add $v0, $a0, $a0
        jr $ra
    done:
        nop
    "#;

    let mut vm = boot(source);
    let result = vm.run().expect("Execution failed");

    assert_eq!(result.halt_reason, HaltReason::Completed);
    assert_eq!(vm.register(Register::S0), 12);
    assert_eq!(vm.register(Register::S1), 18);
}

#[test]
fn test_recursive_factorial_uses_stack() {
    // fact(5) = 120, with $ra and $a0 saved on the stack each frame.
    let source = r#"
        li $a0, 5
        jal fact
        add $a0, $v0, $zero
        li $v0, 0
        sys
    fact:
        li $t0, 2
        bge $a0, $t0, recurse
        li $v0, 1
        jr $ra
    recurse:
        addi $sp, $sp, -8
        sw $ra, 0($sp)
        sw $a0, 4($sp)
        addi $a0, $a0, -1
        jal fact
        lw $ra, 0($sp)
        lw $a0, 4($sp)
        addi $sp, $sp, 8
        mul $v0, $v0, $a0
        jr $ra
    "#;

    let mut vm = boot(source);
    let result = vm.run().expect("Execution failed");

    assert_eq!(result.halt_reason, HaltReason::Exit(120));
}

// ============================================================================
// Memory Tests
// ============================================================================

#[test]
fn test_store_load_round_trip() {
    let source = r#"
        li $t0, 42
        sw $t0, 0($gp)
        lw $t1, 0($gp)
        add $a0, $t1, $zero
        li $v0, 0
        sys
    "#;

    let mut vm = boot(source);
    let result = vm.run().expect("Execution failed");

    assert_eq!(result.halt_reason, HaltReason::Exit(42));
}

#[test]
fn test_byte_access() {
    let source = r#"
        li $t0, 0x41
        sb $t0, 3($gp)
        lb $t1, 3($gp)
        lw $t2, 0($gp)
    "#;

    let mut vm = boot(source);
    vm.run().expect("Execution failed");

    assert_eq!(vm.register(Register::T1), 0x41);
    // The byte landed in the top lane of the word.
    assert_eq!(vm.register(Register::T2), 0x4100_0000);
}

#[test]
fn test_stack_grows_down_from_top() {
    let source = r#"
        addi $sp, $sp, -4
        li $t0, 7
        sw $t0, 0($sp)
        lw $s0, 0($sp)
    "#;

    let mut vm = boot(source);
    vm.run().expect("Execution failed");

    assert_eq!(vm.register(Register::S0), 7);
    assert_eq!(
        vm.register(Register::Sp),
        kasm_spec::STACK_BASE + kasm_spec::STACK_SIZE - 4
    );
}

#[test]
fn test_data_segment_values() {
    let source = r#"
        .data
    answer:
        .word 42
    flags:
        .byte 1
        .byte 2
        .align 2
    more:
        .word 7
    "#;

    let mut vm = boot(source);
    vm.run().expect("Execution failed");

    let base = kasm_spec::DATA_BASE;
    assert_eq!(vm.read_word(base).unwrap(), 42);
    assert_eq!(vm.read_byte(base + 4).unwrap(), 1);
    assert_eq!(vm.read_byte(base + 5).unwrap(), 2);
    assert_eq!(vm.read_word(base + 8).unwrap(), 7);
}

#[test]
fn test_misaligned_word_access_faults() {
    let source = r#"
        li $t0, 1
        lw $t1, 1($gp)
    "#;

    let mut vm = boot(source);
    let error = vm.run().expect_err("Misaligned load must fault");
    assert!(matches!(error, RuntimeError::MisalignedAccess { .. }));
}

#[test]
fn test_unmapped_address_faults() {
    let mut vm = boot("lw $t0, 0($t1)");
    // Point the base register into the hole between text and data.
    vm.set_register(Register::T1, 0x0800_0000);
    let error = vm.run().expect_err("Unmapped address must fault");
    assert!(matches!(
        error,
        RuntimeError::OutOfBounds { address: 0x0800_0000 }
    ));
}

#[test]
fn test_division_by_zero_faults() {
    let source = r#"
        li $t0, 10
        li $t1, 0
        div $t2, $t0, $t1
    "#;

    let mut vm = boot(source);
    let error = vm.run().expect_err("Division by zero must fault");
    assert!(matches!(error, RuntimeError::DivisionByZero { pc: 8 }));
    assert_eq!(vm.pc(), 8);
}

// ============================================================================
// Console I/O Tests
// ============================================================================

#[test]
fn test_read_and_write_int() {
    // Echo the input plus one
    let source = r#"
        li $v0, 1
        sys
        addi $a0, $v0, 1
        li $v0, 2
        sys
        li $v0, 0
        li $a0, 0
        sys
    "#;

    let program = assemble(source).expect("Assembly failed");
    let mut console = BufferedConsole::new();
    console.push_int(41);
    let mut vm =
        Vm::with_console(program, VmConfig::default(), console).expect("Load failed");

    let result = vm.run().expect("Execution failed");
    assert_eq!(result.halt_reason, HaltReason::Exit(0));
    assert_eq!(vm.console().output_string(), "42");
}

#[test]
fn test_write_string_from_data_segment() {
    // The string address is materialized with li/sll/ori since a data
    // address does not fit a 16-bit immediate.
    let source = r#"
        .data
    greeting:
        .asciiz "hi"
        .text
        li $t0, 0x1001
        li $t1, 16
        sll $a0, $t0, $t1
        li $v0, 6
        sys
        li $v0, 0
        li $a0, 0
        sys
    "#;

    let mut vm = boot(source);
    let result = vm.run().expect("Execution failed");

    assert_eq!(result.halt_reason, HaltReason::Exit(0));
    assert_eq!(vm.console().output_string(), "hi");
}

#[test]
fn test_write_chars() {
    let source = r#"
        li $a0, 0x6F
        li $v0, 4
        sys
        li $a0, 0x6B
        sys
    "#;

    let mut vm = boot(source);
    vm.run().expect("Execution failed");
    assert_eq!(vm.console().output_string(), "ok");
}

#[test]
fn test_read_string_into_buffer() {
    let source = r#"
        add $a0, $gp, $zero
        li $a1, 16
        li $v0, 5
        sys
        add $a0, $gp, $zero
        li $v0, 6
        sys
    "#;

    let program = assemble(source).expect("Assembly failed");
    let mut console = BufferedConsole::new();
    console.push_line("hello");
    let mut vm =
        Vm::with_console(program, VmConfig::default(), console).expect("Load failed");

    vm.run().expect("Execution failed");
    assert_eq!(vm.console().output_string(), "hello");
}

#[test]
fn test_allocate_and_use_heap() {
    let source = r#"
        li $a0, 64
        li $v0, 7
        sys
        add $s0, $v0, $zero    # block address
        li $t0, 99
        sw $t0, 0($s0)
        lw $s1, 0($s0)
        li $a0, 64
        li $v0, 7
        sys
        add $s2, $v0, $zero    # second block
    "#;

    let mut vm = boot(source);
    vm.run().expect("Execution failed");

    assert_eq!(vm.register(Register::S0), kasm_spec::HEAP_BASE);
    assert_eq!(vm.register(Register::S1), 99);
    assert_eq!(vm.register(Register::S2), kasm_spec::HEAP_BASE + 64);
}

// ============================================================================
// Limits and Halting
// ============================================================================

#[test]
fn test_infinite_loop_hits_cycle_limit() {
    let program = assemble("loop: b loop").expect("Assembly failed");
    let mut vm = Vm::with_console(
        program,
        VmConfig {
            max_cycles: 500,
            ..VmConfig::default()
        },
        BufferedConsole::new(),
    )
    .expect("Load failed");

    let result = vm.run().expect("Execution failed");
    assert_eq!(result.halt_reason, HaltReason::CycleLimit);
    assert_eq!(result.cycles, 500);
    assert_eq!(result.exit_code(), None);
}

#[test]
fn test_empty_program_completes_immediately() {
    let mut vm = boot("");
    let result = vm.run().expect("Execution failed");
    assert_eq!(result.halt_reason, HaltReason::Completed);
    assert_eq!(result.cycles, 0);
}
