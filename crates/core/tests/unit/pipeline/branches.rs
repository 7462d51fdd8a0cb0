//! Control-Flow Tests.
//!
//! Speculative fetch marking, squash on redirect, jumps, and the
//! interaction between redirects and outstanding I-cache misses.

use rvpipe_core::RunStatus;
use rvpipe_core::pipeline::latches::Status;

use crate::common::encode::{self, HALT};
use crate::common::harness::{run_program, TestBed};

#[test]
fn fetch_under_branch_is_speculative() {
    let ctx = run_program(&[
        encode::addi(1, 0, 1),
        encode::beq(1, 0, 8), // not taken: 1 != 0
        encode::addi(2, 0, 5),
        HALT,
    ]);

    // While the branch sits in decode, the next fetch is speculative.
    assert_eq!(ctx.state(1).if_status, Status::Speculative);
    // Not taken: the speculative instruction commits.
    assert_eq!(ctx.reg(2), 5);
}

#[test]
fn not_taken_branch_costs_no_squash() {
    let ctx = run_program(&[
        encode::addi(1, 0, 1),
        encode::bne(1, 1, 8), // not taken
        encode::addi(2, 0, 5),
        HALT,
    ]);
    assert!(
        ctx.states().iter().all(|s| s.if_status != Status::Squashed),
        "fall-through must never squash the fetch"
    );
    assert_eq!(ctx.reg(2), 5);
}

#[test]
fn backward_branch_forms_a_loop() {
    // r1 counts down from 2; the loop body runs twice.
    let ctx = run_program(&[
        encode::addi(1, 0, 2),
        encode::addi(2, 0, 0),
        encode::addi(2, 2, 1),    // 8: r2 += 1
        encode::addi(1, 1, -1),   // 12: r1 -= 1
        encode::bne(1, 0, -8),    // 16: loop while r1 != 0
        HALT,
    ]);
    assert_eq!(ctx.reg(1), 0);
    assert_eq!(ctx.reg(2), 2, "loop body must execute exactly twice");
}

#[test]
fn jal_links_and_redirects() {
    let ctx = run_program(&[
        encode::jal(1, 12),       // 0: jump to 12, link 4
        encode::addi(2, 0, 42),   // 4: skipped
        encode::addi(3, 0, 43),   // 8: skipped
        encode::addi(4, 0, 44),   // 12: target
        HALT,
    ]);
    assert_eq!(ctx.reg(1), 4, "link register holds pc + 4");
    assert_eq!(ctx.reg(2), 0);
    assert_eq!(ctx.reg(3), 0);
    assert_eq!(ctx.reg(4), 44);
}

#[test]
fn jalr_computes_register_target() {
    let ctx = run_program(&[
        encode::addi(1, 0, 16),   // 0: r1 = 16
        encode::jalr(5, 1, 0),    // 4: jump to r1
        encode::addi(2, 0, 42),   // 8: skipped
        encode::addi(3, 0, 43),   // 12: skipped
        encode::addi(4, 0, 44),   // 16: target
        HALT,
    ]);
    assert_eq!(ctx.reg(5), 8, "link register holds pc + 4");
    assert_eq!(ctx.reg(2), 0);
    assert_eq!(ctx.reg(4), 44);
}

#[test]
fn redirect_cancels_outstanding_imiss() {
    // One-word blocks: the speculative fetch under the branch misses, and
    // the taken branch must abandon that miss instead of waiting it out.
    let mut ctx = TestBed::new()
        .program(&[
            encode::addi(1, 0, 1),
            encode::beq(1, 1, 8),   // 4: taken, target 12
            encode::addi(2, 0, 42), // 8: wrong path
            encode::addi(3, 0, 99), // 12: target
            HALT,
        ])
        .icache_block_bytes(4)
        .icache_latency(3)
        .start();
    assert_eq!(ctx.run_to_halt(), RunStatus::Halt);

    assert_eq!(ctx.reg(2), 0);
    assert_eq!(ctx.reg(3), 99);

    // The resolution cycle squashes the in-flight fetch.
    let squash = ctx
        .states()
        .iter()
        .find(|s| s.if_status == Status::Squashed)
        .cloned()
        .expect("redirect must squash the speculative fetch");
    assert_eq!(squash.if_pc, 8);
}

#[test]
fn squashed_fetch_never_commits() {
    // The wrong-path instruction writes a register nothing else touches;
    // its value must stay zero through the whole run.
    let ctx = run_program(&[
        encode::addi(1, 0, 7),
        encode::beq(1, 1, 12),     // taken, skips two
        encode::addi(9, 0, 1),     // wrong path
        encode::addi(10, 0, 1),    // wrong path
        encode::addi(2, 0, 3),     // 16: target
        HALT,
    ]);
    assert_eq!(ctx.reg(9), 0);
    assert_eq!(ctx.reg(10), 0);
    assert_eq!(ctx.reg(2), 3);
}
