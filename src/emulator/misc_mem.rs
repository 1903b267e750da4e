//! MISC-MEM opcode emulation
//!
//! Two very different things live under this opcode. First the FENCE family, emulated as an
//! errata workaround for cores that fail to ignore the reserved encoding fields (the pred/succ
//! fields cannot be recovered from the trap, so the emulation widens to a full barrier, which
//! over-synchronizes but never under-synchronizes). Second the Zicbom/Zicboz cache block
//! operations, gated by the envcfg enable bits of the privilege level the trap came from.

use borealis_core::insn;

use super::{truly_illegal_insn, EmuResult, Emulation};
use crate::arch::{envcfg, Arch, Architecture};
use crate::config;
use crate::csr;
use crate::decoder;
use crate::platform::{Plat, Platform};
use crate::trap::{self, TrapContext, TrapInfo};

pub fn emulate(insn: usize, ctx: &mut TrapContext) -> EmuResult {
    // Errata workaround: emulate `fence.tso` as `fence rw, rw`.
    if insn & insn::MASK_FENCE_TSO == insn::MATCH_FENCE_TSO {
        Arch::mb();
        ctx.regs.mepc = ctx.regs.mepc.wrapping_add(4);
        return Ok(Emulation::Handled);
    }

    // Errata workaround: some cores fail to ignore the reserved fields in the `fence` and
    // `fence.i` encodings.
    if insn & insn::MASK_FENCE == insn::MATCH_FENCE {
        // NOTE: emulation should ideally preserve the `pred` and `succ` fields, but those are
        // not recoverable here.
        Arch::mb();
        ctx.regs.mepc = ctx.regs.mepc.wrapping_add(4);
        return Ok(Emulation::Handled);
    }
    if insn & insn::MASK_FENCE_I == insn::MATCH_FENCE_I {
        Arch::fence_i();
        ctx.regs.mepc = ctx.regs.mepc.wrapping_add(4);
        return Ok(Emulation::Handled);
    }

    emulate_zicbom_zicboz(insn, ctx)
}

/// Emulate the Zicbom and Zicboz cache block operations.
fn emulate_zicbom_zicboz(insn: usize, ctx: &mut TrapContext) -> EmuResult {
    let envcfg_val = csr::read_envcfg(ctx.regs.prev_mode());

    match insn & insn::MASK_CBO {
        insn::MATCH_CBO_ZERO => {
            if envcfg_val & envcfg::CBZE_FILTER == 0 {
                return truly_illegal_insn(insn, ctx);
            }
            // Zero the whole cache block containing the effective address
            let block = ctx.regs.get(decoder::rs1(insn)) & !(config::CACHE_BLOCK_SIZE - 1);
            let mut uptrap = TrapInfo::new();
            for offset in (0..config::CACHE_BLOCK_SIZE).step_by(4) {
                unsafe { Arch::store_u32(block + offset, 0, &mut uptrap) };
                if uptrap.cause != 0 {
                    return trap::redirect(&mut ctx.regs, &uptrap);
                }
            }
        }
        insn::MATCH_CBO_CLEAN | insn::MATCH_CBO_FLUSH => {
            if envcfg_val & envcfg::CBCFE_FILTER == 0 {
                return truly_illegal_insn(insn, ctx);
            }
            Plat::flush_data_caches();
        }
        insn::MATCH_CBO_INVAL => {
            if envcfg_val & envcfg::CBIE_FILTER == 0 {
                return truly_illegal_insn(insn, ctx);
            }
            Plat::flush_data_caches();
        }
        _ => return truly_illegal_insn(insn, ctx),
    }

    ctx.regs.mepc = ctx.regs.mepc.wrapping_add(4);

    Ok(Emulation::Handled)
}

// ————————————————————————————————— Tests —————————————————————————————————— //

#[cfg(test)]
mod tests {
    use borealis_core::insn;

    use super::super::tests::illegal_ctx;
    use super::*;
    use crate::arch::{host, mstatus, Mode};
    use crate::emulator::illegal_insn_handler;
    use crate::platform::host as host_platform;
    use crate::trap::MCause;

    #[test]
    fn fences_are_emulated() {
        for encoding in [
            insn::MATCH_FENCE_TSO,
            insn::MATCH_FENCE,
            insn::MATCH_FENCE | 0x0ff00000, // fence iorw, iorw with reserved bits abused
            insn::MATCH_FENCE_I,
        ] {
            host::reset();
            let mut ctx = illegal_ctx(encoding);
            let mepc = ctx.regs.mepc;
            assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
            assert_eq!(ctx.regs.mepc, mepc + 4);
        }
    }

    fn cbo(base: usize, rs1: usize) -> usize {
        base | (rs1 << 15)
    }

    #[test]
    fn cbo_zero_zeroes_the_aligned_block() {
        host::reset();
        host::with_state(|state| state.csrs.menvcfg = envcfg::CBZE_FILTER);

        #[repr(align(64))]
        struct Block([u8; 128]);
        let mut mem = Block([0xaa; 128]);
        let base = mem.0.as_mut_ptr() as usize;

        // Point rs1 into the middle of the first block: the whole aligned block is zeroed
        let mut ctx = illegal_ctx(cbo(insn::MATCH_CBO_ZERO, 10));
        ctx.regs.set(10, base + 24);

        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        assert!(mem.0[..64].iter().all(|&b| b == 0));
        assert!(mem.0[64..].iter().all(|&b| b == 0xaa), "next block untouched");
    }

    /// CBO.ZERO from U-mode with senvcfg.CBZE clear must redirect without storing anything.
    #[test]
    fn cbo_zero_gated_by_senvcfg() {
        host::reset();
        host::with_state(|state| {
            state.csrs.stvec = 0x8030_0000;
            state.csrs.senvcfg = 0;
            state.csrs.menvcfg = envcfg::CBZE_FILTER; // M allows it, U does not
        });

        #[repr(align(64))]
        struct Block([u8; 64]);
        let mut mem = Block([0xaa; 64]);

        let encoding = cbo(insn::MATCH_CBO_ZERO, 10);
        let mut ctx = illegal_ctx(encoding);
        ctx.regs.mstatus = Mode::U.to_bits() << mstatus::MPP_OFFSET;
        ctx.regs.set(10, mem.0.as_mut_ptr() as usize);

        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Redirected));
        assert!(mem.0.iter().all(|&b| b == 0xaa), "no store may be performed");
        host::with_state(|state| {
            assert_eq!(state.csrs.scause, MCause::IllegalInstr as usize);
            assert_eq!(state.csrs.stval, encoding);
        });
    }

    #[test]
    fn cbo_zero_fault_is_redirected() {
        host::reset();
        host::with_state(|state| {
            state.csrs.stvec = 0x8030_0000;
            state.csrs.menvcfg = envcfg::CBZE_FILTER;
            state.fault_window = Some((0x8000, 0x9000));
        });
        let mut ctx = illegal_ctx(cbo(insn::MATCH_CBO_ZERO, 10));
        ctx.regs.set(10, 0x8040);

        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Redirected));
        host::with_state(|state| {
            assert_eq!(state.csrs.scause, MCause::StoreAccessFault as usize);
            assert_eq!(state.csrs.stval, 0x8040, "fault reports the block base");
        });
    }

    #[test]
    fn cbo_management_flushes_caches() {
        for (encoding, enable) in [
            (insn::MATCH_CBO_CLEAN, envcfg::CBCFE_FILTER),
            (insn::MATCH_CBO_FLUSH, envcfg::CBCFE_FILTER),
            (insn::MATCH_CBO_INVAL, envcfg::CBIE_FILTER),
        ] {
            host::reset();
            host::with_state(|state| state.csrs.menvcfg = enable);
            let mut ctx = illegal_ctx(cbo(encoding, 10));
            assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
            assert_eq!(host_platform::nb_cache_flushes(), 1);

            // And with the enable bit off, the same instruction redirects
            host::reset();
            host::with_state(|state| state.csrs.stvec = 0x8030_0000);
            let mut ctx = illegal_ctx(cbo(encoding, 10));
            assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Redirected));
            assert_eq!(host_platform::nb_cache_flushes(), 0);
        }
    }
}
