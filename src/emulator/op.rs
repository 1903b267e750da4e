//! Integer operation emulation
//!
//! Covers the Zba, Zbb, Zbc, Zbs and Zicond extensions across the OP, OP-IMM, OP-32 and
//! OP-IMM-32 major opcodes. Each emulator reads its sources from the trapped register state,
//! computes rd, writes it back and advances mepc by 4; anything that does not match falls back
//! to the redirect sink.

use borealis_core::insn;

use super::{truly_illegal_insn, EmuResult, Emulation};
use crate::arch::XLEN;
use crate::decoder;
use crate::trap::TrapContext;

// ————————————————————————————————— OP-IMM ————————————————————————————————— //

pub fn emulate_op_imm(insn: usize, ctx: &mut TrapContext) -> EmuResult {
    let rs1_val = ctx.regs.get(decoder::rs1(insn));

    let rd_val = match insn & insn::MASK_SHAMT6 {
        // Zbs immediate instructions (the shamt[5] encoding bit is part of the freed mask, so
        // the RV64 wide-shamt forms match as well)
        insn::MATCH_BCLRI => rs1_val & !(1 << decoder::shamt(insn)),
        insn::MATCH_BEXTI => (rs1_val >> decoder::shamt(insn)) & 1,
        insn::MATCH_BINVI => rs1_val ^ (1 << decoder::shamt(insn)),
        insn::MATCH_BSETI => rs1_val | (1 << decoder::shamt(insn)),
        // Zbb immediate instructions
        insn::MATCH_RORI => rs1_val.rotate_right(decoder::shamt(insn) as u32),
        _ => match insn & insn::MASK_ITYPE {
            // Zbb immediate instructions
            insn::MATCH_CLZ => rs1_val.leading_zeros() as usize,
            insn::MATCH_CTZ => rs1_val.trailing_zeros() as usize,
            insn::MATCH_CPOP => rs1_val.count_ones() as usize,
            insn::MATCH_ORC_B => orc_b(rs1_val),
            insn::MATCH_REV8 => rs1_val.swap_bytes(),
            insn::MATCH_SEXT_B => rs1_val as i8 as usize,
            insn::MATCH_SEXT_H => rs1_val as i16 as usize,
            _ => return truly_illegal_insn(insn, ctx),
        },
    };

    ctx.regs.set(decoder::rd(insn), rd_val);
    ctx.regs.mepc = ctx.regs.mepc.wrapping_add(4);

    Ok(Emulation::Handled)
}

// ——————————————————————————————————— OP ——————————————————————————————————— //

pub fn emulate_op(insn: usize, ctx: &mut TrapContext) -> EmuResult {
    let rs1_val = ctx.regs.get(decoder::rs1(insn));
    let rs2_val = ctx.regs.get(decoder::rs2(insn));
    let shamt = rs2_val & (XLEN - 1);

    let rd_val = match insn & insn::MASK_RTYPE {
        // Zbs register instructions
        insn::MATCH_BCLR => rs1_val & !(1 << shamt),
        insn::MATCH_BEXT => (rs1_val >> shamt) & 1,
        insn::MATCH_BINV => rs1_val ^ (1 << shamt),
        insn::MATCH_BSET => rs1_val | (1 << shamt),
        // Zbb register instructions
        insn::MATCH_ANDN => rs1_val & !rs2_val,
        insn::MATCH_ORN => rs1_val | !rs2_val,
        insn::MATCH_XNOR => !(rs1_val ^ rs2_val),
        insn::MATCH_MAX => {
            if (rs1_val as isize) > (rs2_val as isize) {
                rs1_val
            } else {
                rs2_val
            }
        }
        insn::MATCH_MAXU => rs1_val.max(rs2_val),
        insn::MATCH_MIN => {
            if (rs1_val as isize) < (rs2_val as isize) {
                rs1_val
            } else {
                rs2_val
            }
        }
        insn::MATCH_MINU => rs1_val.min(rs2_val),
        insn::MATCH_ROL => rs1_val.rotate_left(shamt as u32),
        insn::MATCH_ROR => rs1_val.rotate_right(shamt as u32),
        // Zba register instructions
        insn::MATCH_SH1ADD => rs2_val.wrapping_add(rs1_val << 1),
        insn::MATCH_SH2ADD => rs2_val.wrapping_add(rs1_val << 2),
        insn::MATCH_SH3ADD => rs2_val.wrapping_add(rs1_val << 3),
        // Zbc carry-less multiply instructions
        insn::MATCH_CLMUL => clmul(rs1_val, rs2_val),
        insn::MATCH_CLMULH => clmulh(rs1_val, rs2_val),
        insn::MATCH_CLMULR => clmulr(rs1_val, rs2_val),
        // Zicond instructions
        insn::MATCH_CZERO_EQZ => {
            if rs2_val != 0 {
                rs1_val
            } else {
                0
            }
        }
        insn::MATCH_CZERO_NEZ => {
            if rs2_val != 0 {
                0
            } else {
                rs1_val
            }
        }
        _ => return truly_illegal_insn(insn, ctx),
    };

    ctx.regs.set(decoder::rd(insn), rd_val);
    ctx.regs.mepc = ctx.regs.mepc.wrapping_add(4);

    Ok(Emulation::Handled)
}

// —————————————————————————————————— OP-32 ————————————————————————————————— //

pub fn emulate_op_32(insn: usize, ctx: &mut TrapContext) -> EmuResult {
    let rs1_val = ctx.regs.get(decoder::rs1(insn));
    let rs2_val = ctx.regs.get(decoder::rs2(insn));

    let rd_val = match insn & insn::MASK_RTYPE {
        // Zba register word instructions
        insn::MATCH_ADD_UW => (rs1_val & 0xffffffff).wrapping_add(rs2_val),
        insn::MATCH_SH1ADD_UW => rs2_val.wrapping_add((rs1_val & 0xffffffff) << 1),
        insn::MATCH_SH2ADD_UW => rs2_val.wrapping_add((rs1_val & 0xffffffff) << 2),
        insn::MATCH_SH3ADD_UW => rs2_val.wrapping_add((rs1_val & 0xffffffff) << 3),
        // Zbb register word instructions
        insn::MATCH_ROLW => (rs1_val as u32).rotate_left((rs2_val & 0b11111) as u32) as i32 as usize,
        insn::MATCH_RORW => (rs1_val as u32).rotate_right((rs2_val & 0b11111) as u32) as i32 as usize,
        _ => match insn & insn::MASK_ITYPE {
            // Zbb register word instructions
            insn::MATCH_ZEXT_H => rs1_val as u16 as usize,
            _ => return truly_illegal_insn(insn, ctx),
        },
    };

    ctx.regs.set(decoder::rd(insn), rd_val);
    ctx.regs.mepc = ctx.regs.mepc.wrapping_add(4);

    Ok(Emulation::Handled)
}

// ———————————————————————————————— OP-IMM-32 ——————————————————————————————— //

pub fn emulate_op_imm_32(insn: usize, ctx: &mut TrapContext) -> EmuResult {
    let rs1_val = ctx.regs.get(decoder::rs1(insn));

    let rd_val = match insn & insn::MASK_ITYPE {
        // Zbb immediate word instructions
        insn::MATCH_CLZW => (rs1_val as u32).leading_zeros() as usize,
        insn::MATCH_CTZW => (rs1_val as u32).trailing_zeros() as usize,
        insn::MATCH_CPOPW => (rs1_val as u32).count_ones() as usize,
        _ => match insn & insn::MASK_SHAMT6 {
            // Zba immediate word instructions
            insn::MATCH_SLLI_UW => (rs1_val & 0xffffffff) << decoder::shamt(insn),
            // Zbb immediate word instructions
            insn::MATCH_RORIW => {
                (rs1_val as u32).rotate_right(decoder::shamt32(insn) as u32) as i32 as usize
            }
            _ => return truly_illegal_insn(insn, ctx),
        },
    };

    ctx.regs.set(decoder::rd(insn), rd_val);
    ctx.regs.mepc = ctx.regs.mepc.wrapping_add(4);

    Ok(Emulation::Handled)
}

// ————————————————————————————————— Helpers ———————————————————————————————— //

/// Set each byte of the result to 0xff if the corresponding input byte has any bit set.
fn orc_b(rs1_val: usize) -> usize {
    let mut rd_val = 0;
    let mut mask = 0xff;
    while mask != 0 {
        if rs1_val & mask != 0 {
            rd_val |= mask;
        }
        mask <<= 8;
    }
    rd_val
}

/// Carry-less multiply, low XLEN bits of the 2*XLEN-bit product.
fn clmul(rs1_val: usize, rs2_val: usize) -> usize {
    let mut rd_val = 0;
    for i in 0..XLEN {
        if (rs2_val >> i) & 1 != 0 {
            rd_val ^= rs1_val << i;
        }
    }
    rd_val
}

/// Carry-less multiply, bits XLEN..2*XLEN of the product.
fn clmulh(rs1_val: usize, rs2_val: usize) -> usize {
    let mut rd_val = 0;
    for i in 1..XLEN {
        if (rs2_val >> i) & 1 != 0 {
            rd_val ^= rs1_val >> (XLEN - i);
        }
    }
    rd_val
}

/// Carry-less multiply reversed: bits XLEN-1..2*XLEN-1 of the product.
fn clmulr(rs1_val: usize, rs2_val: usize) -> usize {
    let mut rd_val = 0;
    for i in 0..XLEN {
        if (rs2_val >> i) & 1 != 0 {
            rd_val ^= rs1_val >> (XLEN - i - 1);
        }
    }
    rd_val
}

// ————————————————————————————————— Tests —————————————————————————————————— //

#[cfg(test)]
mod tests {
    use borealis_core::insn;

    use super::super::tests::illegal_ctx;
    use super::*;
    use crate::arch::host;
    use crate::emulator::illegal_insn_handler;

    fn rtype(base: usize, rd: usize, rs1: usize, rs2: usize) -> usize {
        base | (rd << 7) | (rs1 << 15) | (rs2 << 20)
    }

    fn itype(base: usize, rd: usize, rs1: usize) -> usize {
        base | (rd << 7) | (rs1 << 15)
    }

    /// Run a single 32-bit instruction with the given sources, returning the resulting rd.
    fn run(insn: usize, rs1_val: usize, rs2_val: usize) -> usize {
        host::reset();
        let mut ctx = illegal_ctx(insn);
        ctx.regs.set(11, rs1_val);
        ctx.regs.set(12, rs2_val);
        let mepc = ctx.regs.mepc;
        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        assert_eq!(ctx.regs.mepc, mepc + 4, "mepc must advance by 4");
        ctx.regs.get(10)
    }

    #[test]
    fn zbb_logic() {
        let andn = |a, b| run(rtype(insn::MATCH_ANDN, 10, 11, 12), a, b);
        assert_eq!(
            andn(0xf0f0_f0f0_f0f0_f0f0, 0x00ff_00ff_00ff_00ff),
            0xf000_f000_f000_f000
        );
        assert_eq!(run(rtype(insn::MATCH_ORN, 10, 11, 12), 0, 0), usize::MAX);
        assert_eq!(
            run(rtype(insn::MATCH_XNOR, 10, 11, 12), 0xff00, 0x0ff0),
            !(0xff00 ^ 0x0ff0)
        );
    }

    #[test]
    fn zbb_min_max() {
        let neg1 = -1isize as usize;
        assert_eq!(run(rtype(insn::MATCH_MAX, 10, 11, 12), neg1, 1), 1);
        assert_eq!(run(rtype(insn::MATCH_MAXU, 10, 11, 12), neg1, 1), neg1);
        assert_eq!(run(rtype(insn::MATCH_MIN, 10, 11, 12), neg1, 1), neg1);
        assert_eq!(run(rtype(insn::MATCH_MINU, 10, 11, 12), neg1, 1), 1);
    }

    #[test]
    fn zbb_rev8() {
        assert_eq!(
            run(itype(insn::MATCH_REV8, 10, 11), 0x0102_0304_0506_0708, 0),
            0x0807_0605_0403_0201
        );
        // rev8 is an involution
        let x: usize = 0x1234_5678_9abc_def0;
        assert_eq!(
            run(itype(insn::MATCH_REV8, 10, 11), x.swap_bytes(), 0),
            x
        );
    }

    #[test]
    fn zbb_counts() {
        assert_eq!(run(itype(insn::MATCH_CLZ, 10, 11), 0, 0), 64);
        assert_eq!(run(itype(insn::MATCH_CTZ, 10, 11), 0, 0), 64);
        assert_eq!(run(itype(insn::MATCH_CLZ, 10, 11), 1, 0), 63);
        assert_eq!(run(itype(insn::MATCH_CTZ, 10, 11), 0x8000, 0), 15);
        assert_eq!(run(itype(insn::MATCH_CPOP, 10, 11), 0xff00ff, 0), 16);
        assert_eq!(run(itype(insn::MATCH_CLZW, 10, 11), 0, 0), 32);
        assert_eq!(run(itype(insn::MATCH_CTZW, 10, 11), 0, 0), 32);
        assert_eq!(
            run(itype(insn::MATCH_CPOPW, 10, 11), 0xffff_ffff_0000_00ff, 0),
            8
        );
    }

    /// For any nonzero value the three counts cover at least all bits but one.
    #[test]
    fn zbb_count_law() {
        for x in [1usize, 0x8000, 0xdead_beef, 1 << 63, usize::MAX] {
            let clz = run(itype(insn::MATCH_CLZ, 10, 11), x, 0);
            let ctz = run(itype(insn::MATCH_CTZ, 10, 11), x, 0);
            let cpop = run(itype(insn::MATCH_CPOP, 10, 11), x, 0);
            assert!(clz + ctz + cpop >= 63, "law violated for {x:#x}");
        }
    }

    #[test]
    fn zbb_orc_b() {
        assert_eq!(
            run(itype(insn::MATCH_ORC_B, 10, 11), 0x0100_2000_0003_4000, 0),
            0xff00_ff00_00ff_ff00
        );
    }

    #[test]
    fn zbb_sign_extension() {
        assert_eq!(
            run(itype(insn::MATCH_SEXT_B, 10, 11), 0x80, 0),
            0xffff_ffff_ffff_ff80
        );
        assert_eq!(
            run(itype(insn::MATCH_SEXT_H, 10, 11), 0x8000, 0),
            0xffff_ffff_ffff_8000
        );
        assert_eq!(
            run(rtype(insn::MATCH_ZEXT_H, 10, 11, 0), 0xffff_1234, 0),
            0x1234
        );
    }

    #[test]
    fn zbb_rotations() {
        let x = 0x0123_4567_89ab_cdef;
        for k in 0..64 {
            let ror = run(rtype(insn::MATCH_ROR, 10, 11, 12), x, k);
            let rol = run(rtype(insn::MATCH_ROL, 10, 11, 12), x, (64 - k) % 64);
            assert_eq!(ror, rol, "ror by {k} must equal rol by 64-{k}");
        }
        // Rotate by zero and by XLEN are the identity
        assert_eq!(run(rtype(insn::MATCH_ROR, 10, 11, 12), x, 0), x);
        assert_eq!(run(rtype(insn::MATCH_ROR, 10, 11, 12), x, 64), x);
        // Word rotations sign-extend their 32-bit result
        assert_eq!(
            run(rtype(insn::MATCH_RORW, 10, 11, 12), 0x8000_0001, 4),
            0x1800_0000
        );
        assert_eq!(
            run(rtype(insn::MATCH_ROLW, 10, 11, 12), 0x4000_0000, 1),
            0xffff_ffff_8000_0000
        );
    }

    #[test]
    fn zbs_bit_ops() {
        assert_eq!(run(rtype(insn::MATCH_BSET, 10, 11, 12), 0, 63), 1 << 63);
        assert_eq!(run(rtype(insn::MATCH_BCLR, 10, 11, 12), 0xff, 3), 0xf7);
        assert_eq!(run(rtype(insn::MATCH_BINV, 10, 11, 12), 0xff, 8), 0x1ff);
        assert_eq!(run(rtype(insn::MATCH_BEXT, 10, 11, 12), 0x100, 8), 1);
        assert_eq!(run(rtype(insn::MATCH_BEXT, 10, 11, 12), 0x100, 9), 0);
        // Immediate forms, including the wide-shamt encoding with bit 25 set
        assert_eq!(run(itype(insn::MATCH_BSETI | (40 << 20), 10, 11), 0, 0), 1 << 40);
        assert_eq!(run(itype(insn::MATCH_BEXTI | (40 << 20), 10, 11), 1 << 40, 0), 1);
    }

    #[test]
    fn zba_shift_adds() {
        assert_eq!(run(rtype(insn::MATCH_SH1ADD, 10, 11, 12), 3, 10), 16);
        assert_eq!(run(rtype(insn::MATCH_SH2ADD, 10, 11, 12), 3, 10), 22);
        assert_eq!(run(rtype(insn::MATCH_SH3ADD, 10, 11, 12), 3, 10), 34);
        // The *_uw forms mask rs1 to 32 bits first
        let rs1 = 0xffff_ffff_0000_0004;
        assert_eq!(run(rtype(insn::MATCH_ADD_UW, 10, 11, 12), rs1, 10), 14);
        assert_eq!(run(rtype(insn::MATCH_SH1ADD_UW, 10, 11, 12), rs1, 10), 18);
        assert_eq!(
            run(itype(insn::MATCH_SLLI_UW | (8 << 20), 10, 11), rs1, 0),
            0x400
        );
    }

    #[test]
    fn zbc_carry_less_multiply() {
        // 0b11 (x+1) times 0b101 (x^2+1) = 0b1111 (x^3+x^2+x+1)
        assert_eq!(run(rtype(insn::MATCH_CLMUL, 10, 11, 12), 3, 5), 15);
        assert_eq!(run(rtype(insn::MATCH_CLMULH, 10, 11, 12), 3, 5), 0);
        // High half: (1 << 63) clmul 0b10 = product bit 64
        assert_eq!(run(rtype(insn::MATCH_CLMULH, 10, 11, 12), 1 << 63, 2), 1);
        // clmulr is clmulh shifted down by one product bit
        assert_eq!(run(rtype(insn::MATCH_CLMULR, 10, 11, 12), 1 << 63, 2), 2);
        assert_eq!(run(rtype(insn::MATCH_CLMULR, 10, 11, 12), 1 << 63, 1), 1);
    }

    #[test]
    fn zicond() {
        assert_eq!(run(rtype(insn::MATCH_CZERO_EQZ, 10, 11, 12), 0xdeadbeef, 0), 0);
        assert_eq!(
            run(rtype(insn::MATCH_CZERO_EQZ, 10, 11, 12), 0xdeadbeef, 1),
            0xdeadbeef
        );
        assert_eq!(
            run(rtype(insn::MATCH_CZERO_NEZ, 10, 11, 12), 0xdeadbeef, 0),
            0xdeadbeef
        );
        assert_eq!(run(rtype(insn::MATCH_CZERO_NEZ, 10, 11, 12), 0xdeadbeef, 1), 0);
    }

    #[test]
    fn unknown_op_is_redirected() {
        host::reset();
        host::with_state(|state| state.csrs.stvec = 0x8030_0000);
        // OP opcode with an unallocated funct7/funct3 combination
        let insn = rtype(0x7e000033, 10, 11, 12);
        let mut ctx = illegal_ctx(insn);
        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Redirected));
        host::with_state(|state| assert_eq!(state.csrs.stval, insn));
    }
}
