//! Compressed instruction emulation
//!
//! Covers the Zcb additional compressed instructions (byte/halfword loads and stores plus a
//! handful of register-to-register transforms) and the Zcmop compressed may-be operations, both
//! of which live in encoding slots that are reserved in the base C extension. Byte accesses go
//! through the unprivileged access helpers directly; halfword accesses are turned into
//! misaligned access traps and tail-called into the misaligned access handler, which knows how
//! to emulate them byte by byte.

use borealis_core::insn;

use super::{truly_illegal_insn, EmuResult, Emulation};
use crate::arch::{Arch, Architecture};
use crate::decoder;
use crate::misaligned;
use crate::trap::{self, MCause, TrapContext};

/// Byte offset of a C.LBU/C.SB encoding: uimm[0] in bit 6, uimm[1] in bit 5.
fn byte_offset(insn: usize) -> usize {
    ((insn >> 6) & 1) | ((insn >> 4) & 2)
}

/// Halfword offset of a C.LH/C.LHU/C.SH encoding: uimm[1] in bit 5.
fn halfword_offset(insn: usize) -> usize {
    (insn >> 4) & 2
}

// ——————————————————————— Reserved Quadrant-0 Slot ————————————————————————— //

/// Emulate the Zcb loads and stores encoded in the reserved quadrant-0 slot.
pub fn emulate_reserved(insn: usize, ctx: &mut TrapContext) -> EmuResult {
    let rs1_val = ctx.regs.get(decoder::rs1s(insn));
    let mut uptrap = trap::TrapInfo::new();

    match insn & insn::MASK_C_FUNCT6 {
        insn::MATCH_C_LBU => {
            let val =
                unsafe { Arch::load_u8(rs1_val.wrapping_add(byte_offset(insn)), &mut uptrap) };
            if uptrap.cause != 0 {
                return trap::redirect(&mut ctx.regs, &uptrap);
            }
            ctx.regs.set(decoder::rs2s(insn), val as usize);
        }
        // C.LHU and C.LH share their funct6, the misaligned handler re-decodes the sign bit.
        insn::MATCH_C_LHU => {
            ctx.trap.cause = MCause::LoadAddrMisaligned as usize;
            ctx.trap.tval = rs1_val.wrapping_add(halfword_offset(insn));
            return misaligned::misaligned_load_handler(ctx);
        }
        insn::MATCH_C_SB => {
            let val = ctx.regs.get(decoder::rs2s(insn));
            unsafe {
                Arch::store_u8(rs1_val.wrapping_add(byte_offset(insn)), val as u8, &mut uptrap)
            };
            if uptrap.cause != 0 {
                return trap::redirect(&mut ctx.regs, &uptrap);
            }
        }
        insn::MATCH_C_SH => {
            // Bit 6 set is a reserved C.SH encoding
            if insn & 0x40 != 0 {
                return truly_illegal_insn(insn, ctx);
            }
            ctx.trap.cause = MCause::StoreAddrMisaligned as usize;
            ctx.trap.tval = rs1_val.wrapping_add(halfword_offset(insn));
            return misaligned::misaligned_store_handler(ctx);
        }
        _ => return truly_illegal_insn(insn, ctx),
    }

    ctx.regs.mepc = ctx.regs.mepc.wrapping_add(2);

    Ok(Emulation::Handled)
}

// —————————————————————————————— Misc ALU Slot ————————————————————————————— //

/// Emulate the Zcb register-to-register transforms encoded in the quadrant-1 misc ALU slot.
pub fn emulate_misc_alu(insn: usize, ctx: &mut TrapContext) -> EmuResult {
    let rs1_val = ctx.regs.get(decoder::rs1s(insn));

    let rd_val = match insn & insn::MASK_C_RXS {
        insn::MATCH_C_ZEXT_B => rs1_val as u8 as usize,
        insn::MATCH_C_SEXT_B => rs1_val as i8 as usize,
        insn::MATCH_C_ZEXT_H => rs1_val as u16 as usize,
        insn::MATCH_C_SEXT_H => rs1_val as i16 as usize,
        insn::MATCH_C_ZEXT_W => rs1_val as u32 as usize,
        insn::MATCH_C_NOT => !rs1_val,
        _ => match insn & insn::MASK_C_RXS_RXS {
            insn::MATCH_C_MUL => {
                let rs2_val = ctx.regs.get(decoder::rs2s(insn));
                (rs1_val as isize).wrapping_mul(rs2_val as isize) as usize
            }
            _ => return truly_illegal_insn(insn, ctx),
        },
    };

    ctx.regs.set(decoder::rs1s(insn), rd_val);
    ctx.regs.mepc = ctx.regs.mepc.wrapping_add(2);

    Ok(Emulation::Handled)
}

// ————————————————————————— May-Be Operations Slot ————————————————————————— //

/// Emulate the Zcmop compressed may-be operations: do nothing, advance.
pub fn emulate_mop(insn: usize, ctx: &mut TrapContext) -> EmuResult {
    if insn & insn::MASK_C_MOP_N == insn::MATCH_C_MOP_N {
        ctx.regs.mepc = ctx.regs.mepc.wrapping_add(2);
        return Ok(Emulation::Handled);
    }

    truly_illegal_insn(insn, ctx)
}

// ————————————————————————————————— Tests —————————————————————————————————— //

#[cfg(test)]
mod tests {
    use borealis_core::insn;

    use super::super::tests::illegal_ctx;
    use super::*;
    use crate::arch::host;
    use crate::emulator::illegal_insn_handler;

    /// Place a compressed instruction in a fake guest text segment and trap on it.
    fn compressed_ctx(insn: usize, code: &mut [u16; 2]) -> TrapContext {
        code[0] = insn as u16;
        let mut ctx = illegal_ctx(0);
        ctx.regs.mepc = code.as_ptr() as usize;
        ctx
    }

    fn c_rxs_rxs(base: usize, rs1s: usize, rs2s: usize) -> usize {
        base | ((rs1s - 8) << 7) | ((rs2s - 8) << 2)
    }

    #[test]
    fn c_lbu() {
        host::reset();
        let mut code = [0u16; 2];
        let data: [u8; 4] = [0x11, 0x22, 0xab, 0x44];

        // c.lbu x9, 2(x8)
        let insn = c_rxs_rxs(insn::MATCH_C_LBU, 8, 9) | (1 << 5);
        let mut ctx = compressed_ctx(insn, &mut code);
        ctx.regs.set(8, data.as_ptr() as usize);

        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        assert_eq!(ctx.regs.get(9), 0xab);
        assert_eq!(ctx.regs.mepc, code.as_ptr() as usize + 2);
    }

    #[test]
    fn c_sb() {
        host::reset();
        let mut code = [0u16; 2];
        let mut data = [0u8; 4];

        // c.sb x9, 3(x8)
        let insn = c_rxs_rxs(insn::MATCH_C_SB, 8, 9) | (1 << 5) | (1 << 6);
        let mut ctx = compressed_ctx(insn, &mut code);
        ctx.regs.set(8, data.as_mut_ptr() as usize);
        ctx.regs.set(9, 0x1234_56cd);

        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        assert_eq!(data[3], 0xcd, "only the low byte is stored");
        assert_eq!(data[2], 0);
    }

    #[test]
    fn c_lbu_fault_is_redirected() {
        host::reset();
        host::with_state(|state| {
            state.csrs.stvec = 0x8030_0000;
            state.fault_window = Some((0x2000, 0x3000));
        });
        let mut code = [0u16; 2];
        let insn = c_rxs_rxs(insn::MATCH_C_LBU, 8, 9);
        let mut ctx = compressed_ctx(insn, &mut code);
        ctx.regs.set(8, 0x2000);

        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Redirected));
        host::with_state(|state| {
            assert_eq!(state.csrs.scause, MCause::LoadAccessFault as usize);
            assert_eq!(state.csrs.stval, 0x2000);
        });
    }

    #[test]
    fn c_misc_alu_transforms() {
        let run = |insn: usize, rs1_val: usize| {
            host::reset();
            let mut code = [0u16; 2];
            let mut ctx = compressed_ctx(insn, &mut code);
            ctx.regs.set(15, rs1_val);
            assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
            assert_eq!(ctx.regs.mepc, code.as_ptr() as usize + 2);
            ctx.regs.get(15)
        };
        let with_rs1 = |base: usize| base | (7 << 7);

        assert_eq!(run(with_rs1(insn::MATCH_C_ZEXT_B), 0x1ff), 0xff);
        assert_eq!(run(with_rs1(insn::MATCH_C_SEXT_B), 0x80), 0xffff_ffff_ffff_ff80);
        assert_eq!(run(with_rs1(insn::MATCH_C_ZEXT_H), 0xf_ffff), 0xffff);
        assert_eq!(run(with_rs1(insn::MATCH_C_SEXT_H), 0x8000), 0xffff_ffff_ffff_8000);
        assert_eq!(run(with_rs1(insn::MATCH_C_ZEXT_W), 0x1_0000_0001), 1);
        assert_eq!(run(with_rs1(insn::MATCH_C_NOT), 0), usize::MAX);
    }

    #[test]
    fn c_mul() {
        host::reset();
        let mut code = [0u16; 2];
        let insn = c_rxs_rxs(insn::MATCH_C_MUL, 14, 15);
        let mut ctx = compressed_ctx(insn, &mut code);
        ctx.regs.set(14, -6isize as usize);
        ctx.regs.set(15, 7);
        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        assert_eq!(ctx.regs.get(14), -42isize as usize);
    }

    #[test]
    fn c_mop_is_a_nop() {
        host::reset();
        let mut code = [0u16; 2];
        // c.mop.5
        let insn = insn::MATCH_C_MOP_N | (2 << 8);
        let mut ctx = compressed_ctx(insn, &mut code);
        let regs_before = ctx.regs.gprs;
        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        assert_eq!(ctx.regs.gprs, regs_before);
        assert_eq!(ctx.regs.mepc, code.as_ptr() as usize + 2);
    }

    #[test]
    fn reserved_quadrant_encodings_are_redirected() {
        host::reset();
        host::with_state(|state| state.csrs.stvec = 0x8030_0000);
        let mut code = [0u16; 2];
        // A quadrant-0 funct3=100 encoding outside the Zcb set
        let insn = 0x9000;
        let mut ctx = compressed_ctx(insn, &mut code);
        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Redirected));
        host::with_state(|state| assert_eq!(state.csrs.stval, insn));
    }
}
