//! Misaligned load/store emulation
//!
//! The illegal instruction emulator turns halfword accesses it cannot perform directly
//! (C.LH/C.LHU/C.SH from Zcb, FLH/FSH from Zfhmin) into misaligned access traps and tail-calls
//! into this module, which emulates them byte by byte through the unprivileged access helpers.
//! The handler re-decodes the instruction at mepc to recover the access width, the destination
//! and the signedness; the target address comes from the trap value. The base LH/LHU/SH forms
//! are recognized as well so genuinely misaligned halfword traps land on the same path.

use borealis_core::insn;

use crate::arch::{Arch, Architecture};
use crate::decoder;
use crate::emulator::fp::{fp_enabled, FpFile};
use crate::emulator::{truly_illegal_insn, EmuResult, Emulation};
use crate::pmu::{self, FirmwareEvent};
use crate::trap::{self, TrapContext, TrapInfo};

/// Emulate the misaligned halfword load described by `ctx.trap`.
pub fn misaligned_load_handler(ctx: &mut TrapContext) -> EmuResult {
    pmu::ctr_incr_fw(FirmwareEvent::MisalignedLoad);

    let addr = ctx.trap.tval;
    let mut uptrap = TrapInfo::new();
    let word = unsafe { Arch::fetch_insn(ctx.regs.mepc, &mut uptrap) };
    if uptrap.cause != 0 {
        return trap::redirect(&mut ctx.regs, &uptrap);
    }

    // Assemble the halfword byte by byte, so a fault reports the exact offending address
    let lo = unsafe { Arch::load_u8(addr, &mut uptrap) };
    if uptrap.cause != 0 {
        return trap::redirect(&mut ctx.regs, &uptrap);
    }
    let hi = unsafe { Arch::load_u8(addr.wrapping_add(1), &mut uptrap) };
    if uptrap.cause != 0 {
        return trap::redirect(&mut ctx.regs, &uptrap);
    }
    let val = lo as u16 | (hi as u16) << 8;

    if word & 3 != 3 {
        let cinsn = word & 0xffff;
        // C.LHU has bit 6 cleared, C.LH has it set
        if cinsn & insn::MASK_C_FUNCT6 != insn::MATCH_C_LHU {
            return truly_illegal_insn(cinsn, ctx);
        }
        let rd_val = if cinsn & 0x40 != 0 {
            val as i16 as usize
        } else {
            val as usize
        };
        ctx.regs.set(decoder::rs2s(cinsn), rd_val);
        ctx.regs.mepc = ctx.regs.mepc.wrapping_add(2);
    } else {
        match word & insn::MASK_FP_LOAD_STORE {
            insn::MATCH_LH => ctx.regs.set(decoder::rd(word), val as i16 as usize),
            insn::MATCH_LHU => ctx.regs.set(decoder::rd(word), val as usize),
            insn::MATCH_FLH => {
                if !fp_enabled(&ctx.regs) {
                    return truly_illegal_insn(word, ctx);
                }
                let mut fp = FpFile::load();
                fp.set_f16(decoder::rd(word), val);
                fp.commit(&mut ctx.regs);
            }
            _ => return truly_illegal_insn(word, ctx),
        }
        ctx.regs.mepc = ctx.regs.mepc.wrapping_add(4);
    }

    Ok(Emulation::Handled)
}

/// Emulate the misaligned halfword store described by `ctx.trap`.
pub fn misaligned_store_handler(ctx: &mut TrapContext) -> EmuResult {
    pmu::ctr_incr_fw(FirmwareEvent::MisalignedStore);

    let addr = ctx.trap.tval;
    let mut uptrap = TrapInfo::new();
    let word = unsafe { Arch::fetch_insn(ctx.regs.mepc, &mut uptrap) };
    if uptrap.cause != 0 {
        return trap::redirect(&mut ctx.regs, &uptrap);
    }

    let (val, insn_len) = if word & 3 != 3 {
        let cinsn = word & 0xffff;
        if cinsn & insn::MASK_C_FUNCT6 != insn::MATCH_C_SH || cinsn & 0x40 != 0 {
            return truly_illegal_insn(cinsn, ctx);
        }
        (ctx.regs.get(decoder::rs2s(cinsn)) as u16, 2)
    } else {
        match word & insn::MASK_FP_LOAD_STORE {
            insn::MATCH_SH => (ctx.regs.get(decoder::rs2(word)) as u16, 4),
            insn::MATCH_FSH => {
                if !fp_enabled(&ctx.regs) {
                    return truly_illegal_insn(word, ctx);
                }
                (FpFile::load().get_f16(decoder::rs2(word)), 4)
            }
            _ => return truly_illegal_insn(word, ctx),
        }
    };

    unsafe { Arch::store_u8(addr, val as u8, &mut uptrap) };
    if uptrap.cause != 0 {
        return trap::redirect(&mut ctx.regs, &uptrap);
    }
    unsafe { Arch::store_u8(addr.wrapping_add(1), (val >> 8) as u8, &mut uptrap) };
    if uptrap.cause != 0 {
        return trap::redirect(&mut ctx.regs, &uptrap);
    }

    ctx.regs.mepc = ctx.regs.mepc.wrapping_add(insn_len);

    Ok(Emulation::Handled)
}

// ————————————————————————————————— Tests —————————————————————————————————— //
