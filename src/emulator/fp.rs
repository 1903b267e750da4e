//! Floating-point instruction emulation
//!
//! Covers the Zfhmin conversions and moves plus the Zfa constant loads, round-to-integer,
//! modular convert, min/max and quiet compares. The arithmetic itself is in
//! [crate::emulator::softfp]; this module deals with decode, enable-bit gating and the
//! register files.
//!
//! The floating-point register number is an immediate in the instruction encoding, so the
//! hardware cannot index the file for us. Instead [FpFile] snapshots all 32 registers on entry
//! and writes them back only when an emulation actually modified one, which also keeps the
//! failure paths free of partial effects.

use borealis_core::insn;

use super::softfp::{self, fcsr, rm};
use super::{truly_illegal_insn, EmuResult, Emulation};
use crate::arch::{mstatus, Arch, Architecture, Csr, Mode};
use crate::decoder;
use crate::misaligned;
use crate::trap::{MCause, TrapContext, TrapRegs};

// ————————————————————————— Floating-Point Register File ——————————————————— //

/// An in-memory image of the 32 floating-point registers.
///
/// Reads narrower than the register apply the NaN-boxing rule: a value whose upper bits are not
/// all ones is replaced by the canonical NaN. Writes box the value with all-ones upper bits.
pub struct FpFile {
    regs: [u64; 32],
    dirty: bool,
}

impl FpFile {
    /// Snapshot the hardware register file.
    ///
    /// The caller must have checked that the floating-point unit is enabled.
    pub fn load() -> Self {
        let mut regs = [0; 32];
        unsafe { Arch::read_fp_file(&mut regs) };
        FpFile { regs, dirty: false }
    }

    /// Write the file back to hardware if any register changed, marking `mstatus.FS` dirty.
    pub fn commit(self, regs: &mut TrapRegs) {
        if self.dirty {
            unsafe { Arch::write_fp_file(&self.regs) };
            regs.set_fs_dirty();
        }
    }

    pub fn get_f64(&self, n: usize) -> u64 {
        self.regs[n & 0b11111]
    }

    pub fn get_f32(&self, n: usize) -> u32 {
        let raw = self.regs[n & 0b11111];
        if raw >> 32 == 0xffffffff {
            raw as u32
        } else {
            softfp::F32_CANONICAL_NAN
        }
    }

    pub fn get_f16(&self, n: usize) -> u16 {
        let raw = self.regs[n & 0b11111];
        if raw >> 16 == 0xffffffffffff {
            raw as u16
        } else {
            softfp::F16_CANONICAL_NAN
        }
    }

    pub fn set_f64(&mut self, n: usize, val: u64) {
        self.regs[n & 0b11111] = val;
        self.dirty = true;
    }

    pub fn set_f32(&mut self, n: usize, val: u32) {
        self.regs[n & 0b11111] = 0xffffffff_00000000 | val as u64;
        self.dirty = true;
    }

    pub fn set_f16(&mut self, n: usize, val: u16) {
        self.regs[n & 0b11111] = 0xffffffffffff_0000 | val as u64;
        self.dirty = true;
    }
}

// ———————————————————————————————— Enable Gating ——————————————————————————— //

/// Whether the trapped context is allowed to use the floating-point unit: `mstatus.FS` must not
/// be Off, and a trap from U-mode additionally requires `sstatus.FS` on.
pub(crate) fn fp_enabled(regs: &TrapRegs) -> bool {
    regs.mstatus & mstatus::FS_FILTER != 0
        && (regs.prev_mode() != Mode::U
            || Arch::read_csr(Csr::Sstatus) & mstatus::FS_FILTER != 0)
}

/// Read the rounding mode for an FP instruction, resolving DYN through fcsr.
///
/// Returns `None` for the reserved encodings (5, 6, and a reserved dynamic mode), which makes
/// the instruction illegal.
fn resolve_rm(insn: usize, fcsr_val: u32) -> Option<usize> {
    match decoder::rm(insn) {
        mode @ (rm::RNE | rm::RTZ | rm::RDN | rm::RUP | rm::RMM) => Some(mode),
        rm::DYN => match (fcsr_val >> fcsr::RM_OFFSET) as usize & 0b111 {
            mode @ (rm::RNE | rm::RTZ | rm::RDN | rm::RUP | rm::RMM) => Some(mode),
            _ => None,
        },
        _ => None,
    }
}

// ——————————————————————————— LOAD-FP / STORE-FP ——————————————————————————— //

/// Emulate the LOAD-FP opcode: the only instruction handled is FLH, which is turned into a
/// misaligned load and tail-called into the misaligned access handler.
pub fn emulate_load_fp(insn: usize, ctx: &mut TrapContext) -> EmuResult {
    if fp_enabled(&ctx.regs) && insn & insn::MASK_FP_LOAD_STORE == insn::MATCH_FLH {
        let base = ctx.regs.get(decoder::rs1(insn));
        ctx.trap.cause = MCause::LoadAddrMisaligned as usize;
        ctx.trap.tval = base.wrapping_add_signed(decoder::imm_i(insn));
        return misaligned::misaligned_load_handler(ctx);
    }

    truly_illegal_insn(insn, ctx)
}

/// Emulate the STORE-FP opcode: the only instruction handled is FSH, turned into a misaligned
/// store.
pub fn emulate_store_fp(insn: usize, ctx: &mut TrapContext) -> EmuResult {
    if fp_enabled(&ctx.regs) && insn & insn::MASK_FP_LOAD_STORE == insn::MATCH_FSH {
        let base = ctx.regs.get(decoder::rs1(insn));
        ctx.trap.cause = MCause::StoreAddrMisaligned as usize;
        ctx.trap.tval = base.wrapping_add_signed(decoder::imm_s(insn));
        return misaligned::misaligned_store_handler(ctx);
    }

    truly_illegal_insn(insn, ctx)
}

// ————————————————————————————————— OP-FP —————————————————————————————————— //

pub fn emulate_op_fp(insn: usize, ctx: &mut TrapContext) -> EmuResult {
    // do not emulate floating point instructions when disabled
    if !fp_enabled(&ctx.regs) {
        return truly_illegal_insn(insn, ctx);
    }

    let mut fp = FpFile::load();
    let mut fcsr_val = Arch::read_csr(Csr::Fcsr) as u32;
    let fcsr_in = fcsr_val;
    let rd = decoder::rd(insn);

    match insn & insn::MASK_ITYPE {
        // Zfhmin conversions (all rounding mode encodings of the widening conversions are
        // accepted, the result is exact either way)
        m if m & !0x7000 == insn::MATCH_FCVT_S_H && decoder::rm(insn) != 5 && decoder::rm(insn) != 6 => {
            let val = fp.get_f16(decoder::rs1(insn));
            let val = softfp::convert_f16_to_f32(val, &mut fcsr_val);
            fp.set_f32(rd, val);
        }
        m if m & !0x7000 == insn::MATCH_FCVT_D_H && decoder::rm(insn) != 5 && decoder::rm(insn) != 6 => {
            let val = fp.get_f16(decoder::rs1(insn));
            let val = softfp::convert_f16_to_f64(val, &mut fcsr_val);
            fp.set_f64(rd, val);
        }
        m if m & !0x7000 == insn::MATCH_FCVT_H_S => {
            let Some(rm) = resolve_rm(insn, fcsr_val) else {
                return truly_illegal_insn(insn, ctx);
            };
            let val = fp.get_f32(decoder::rs1(insn));
            let val = softfp::convert_f32_to_f16(val, &mut fcsr_val, rm);
            fp.set_f16(rd, val);
        }
        m if m & !0x7000 == insn::MATCH_FCVT_H_D => {
            let Some(rm) = resolve_rm(insn, fcsr_val) else {
                return truly_illegal_insn(insn, ctx);
            };
            let val = fp.get_f64(decoder::rs1(insn));
            let val = softfp::convert_f64_to_f16(val, &mut fcsr_val, rm);
            fp.set_f16(rd, val);
        }
        insn::MATCH_FMV_X_H => {
            let val = fp.get_f16(decoder::rs1(insn));
            ctx.regs.set(rd, val as i16 as usize);
        }
        insn::MATCH_FMV_H_X => {
            let val = ctx.regs.get(decoder::rs1(insn));
            fp.set_f16(rd, val as u16);
        }
        // Zfa constant loads
        insn::MATCH_FLI_H => {
            fp.set_f16(rd, softfp::F16_IMM_LUT[decoder::rs1(insn)]);
        }
        insn::MATCH_FLI_S => {
            fp.set_f32(rd, softfp::F32_IMM_LUT[decoder::rs1(insn)]);
        }
        insn::MATCH_FLI_D => {
            fp.set_f64(rd, softfp::F64_IMM_LUT[decoder::rs1(insn)]);
        }
        // Zfa round-to-integer
        m if m & !0x7000 == insn::MATCH_FROUND_H || m & !0x7000 == insn::MATCH_FROUNDNX_H => {
            let Some(rm) = resolve_rm(insn, fcsr_val) else {
                return truly_illegal_insn(insn, ctx);
            };
            let set_nx = m & !0x7000 == insn::MATCH_FROUNDNX_H;
            let val = fp.get_f16(decoder::rs1(insn));
            let val = softfp::round_f16(val, &mut fcsr_val, rm, set_nx);
            fp.set_f16(rd, val);
        }
        m if m & !0x7000 == insn::MATCH_FROUND_S || m & !0x7000 == insn::MATCH_FROUNDNX_S => {
            let Some(rm) = resolve_rm(insn, fcsr_val) else {
                return truly_illegal_insn(insn, ctx);
            };
            let set_nx = m & !0x7000 == insn::MATCH_FROUNDNX_S;
            let val = fp.get_f32(decoder::rs1(insn));
            let val = softfp::round_f32(val, &mut fcsr_val, rm, set_nx);
            fp.set_f32(rd, val);
        }
        m if m & !0x7000 == insn::MATCH_FROUND_D || m & !0x7000 == insn::MATCH_FROUNDNX_D => {
            let Some(rm) = resolve_rm(insn, fcsr_val) else {
                return truly_illegal_insn(insn, ctx);
            };
            let set_nx = m & !0x7000 == insn::MATCH_FROUNDNX_D;
            let val = fp.get_f64(decoder::rs1(insn));
            let val = softfp::round_f64(val, &mut fcsr_val, rm, set_nx);
            fp.set_f64(rd, val);
        }
        // Zfa modular convert (the rounding mode field is fixed to RTZ in the encoding)
        insn::MATCH_FCVTMOD_W_D => {
            let val = fp.get_f64(decoder::rs1(insn));
            let val = softfp::fcvtmod_f64(val, &mut fcsr_val);
            ctx.regs.set(rd, val as isize as usize);
        }
        _ => match insn & insn::MASK_RTYPE {
            // Zfa min/max with the IEEE 754-2019 NaN rule
            insn::MATCH_FMINM_H => {
                let rs1 = fp.get_f16(decoder::rs1(insn));
                let rs2 = fp.get_f16(decoder::rs2(insn));
                let val = softfp::f16_nan_result(rs1, rs2, &mut fcsr_val).unwrap_or_else(|| {
                    if softfp::f16_sorts_below(rs1, rs2) {
                        rs1
                    } else {
                        rs2
                    }
                });
                fp.set_f16(rd, val);
            }
            insn::MATCH_FMAXM_H => {
                let rs1 = fp.get_f16(decoder::rs1(insn));
                let rs2 = fp.get_f16(decoder::rs2(insn));
                let val = softfp::f16_nan_result(rs1, rs2, &mut fcsr_val).unwrap_or_else(|| {
                    if softfp::f16_sorts_below(rs2, rs1) {
                        rs1
                    } else {
                        rs2
                    }
                });
                fp.set_f16(rd, val);
            }
            insn::MATCH_FMINM_S => {
                let rs1 = fp.get_f32(decoder::rs1(insn));
                let rs2 = fp.get_f32(decoder::rs2(insn));
                let val = softfp::f32_nan_result(rs1, rs2, &mut fcsr_val).unwrap_or_else(|| {
                    if softfp::f32_sorts_below(rs1, rs2) {
                        rs1
                    } else {
                        rs2
                    }
                });
                fp.set_f32(rd, val);
            }
            insn::MATCH_FMAXM_S => {
                let rs1 = fp.get_f32(decoder::rs1(insn));
                let rs2 = fp.get_f32(decoder::rs2(insn));
                let val = softfp::f32_nan_result(rs1, rs2, &mut fcsr_val).unwrap_or_else(|| {
                    if softfp::f32_sorts_below(rs2, rs1) {
                        rs1
                    } else {
                        rs2
                    }
                });
                fp.set_f32(rd, val);
            }
            insn::MATCH_FMINM_D => {
                let rs1 = fp.get_f64(decoder::rs1(insn));
                let rs2 = fp.get_f64(decoder::rs2(insn));
                let val = softfp::f64_nan_result(rs1, rs2, &mut fcsr_val).unwrap_or_else(|| {
                    if softfp::f64_sorts_below(rs1, rs2) {
                        rs1
                    } else {
                        rs2
                    }
                });
                fp.set_f64(rd, val);
            }
            insn::MATCH_FMAXM_D => {
                let rs1 = fp.get_f64(decoder::rs1(insn));
                let rs2 = fp.get_f64(decoder::rs2(insn));
                let val = softfp::f64_nan_result(rs1, rs2, &mut fcsr_val).unwrap_or_else(|| {
                    if softfp::f64_sorts_below(rs2, rs1) {
                        rs1
                    } else {
                        rs2
                    }
                });
                fp.set_f64(rd, val);
            }
            // Zfa quiet compares: 0 on any NaN, NV only for signaling NaNs
            insn::MATCH_FLTQ_H => {
                let rs1 = fp.get_f16(decoder::rs1(insn));
                let rs2 = fp.get_f16(decoder::rs2(insn));
                let val = match softfp::f16_nan_result(rs1, rs2, &mut fcsr_val) {
                    Some(_) => 0,
                    None => softfp::f16_lt(rs1, rs2) as usize,
                };
                ctx.regs.set(rd, val);
            }
            insn::MATCH_FLEQ_H => {
                let rs1 = fp.get_f16(decoder::rs1(insn));
                let rs2 = fp.get_f16(decoder::rs2(insn));
                let val = match softfp::f16_nan_result(rs1, rs2, &mut fcsr_val) {
                    Some(_) => 0,
                    None => softfp::f16_le(rs1, rs2) as usize,
                };
                ctx.regs.set(rd, val);
            }
            insn::MATCH_FLTQ_S => {
                let rs1 = fp.get_f32(decoder::rs1(insn));
                let rs2 = fp.get_f32(decoder::rs2(insn));
                let val = match softfp::f32_nan_result(rs1, rs2, &mut fcsr_val) {
                    Some(_) => 0,
                    None => softfp::f32_lt(rs1, rs2) as usize,
                };
                ctx.regs.set(rd, val);
            }
            insn::MATCH_FLEQ_S => {
                let rs1 = fp.get_f32(decoder::rs1(insn));
                let rs2 = fp.get_f32(decoder::rs2(insn));
                let val = match softfp::f32_nan_result(rs1, rs2, &mut fcsr_val) {
                    Some(_) => 0,
                    None => softfp::f32_le(rs1, rs2) as usize,
                };
                ctx.regs.set(rd, val);
            }
            insn::MATCH_FLTQ_D => {
                let rs1 = fp.get_f64(decoder::rs1(insn));
                let rs2 = fp.get_f64(decoder::rs2(insn));
                let val = match softfp::f64_nan_result(rs1, rs2, &mut fcsr_val) {
                    Some(_) => 0,
                    None => softfp::f64_lt(rs1, rs2) as usize,
                };
                ctx.regs.set(rd, val);
            }
            insn::MATCH_FLEQ_D => {
                let rs1 = fp.get_f64(decoder::rs1(insn));
                let rs2 = fp.get_f64(decoder::rs2(insn));
                let val = match softfp::f64_nan_result(rs1, rs2, &mut fcsr_val) {
                    Some(_) => 0,
                    None => softfp::f64_le(rs1, rs2) as usize,
                };
                ctx.regs.set(rd, val);
            }
            _ => return truly_illegal_insn(insn, ctx),
        },
    }

    // Commit all effects only on the success path: the register file, the accrued flags, and
    // finally the program counter.
    fp.commit(&mut ctx.regs);
    if fcsr_val != fcsr_in {
        unsafe { Arch::write_csr(Csr::Fcsr, fcsr_val as usize) };
    }
    ctx.regs.mepc = ctx.regs.mepc.wrapping_add(4);

    Ok(Emulation::Handled)
}

// ————————————————————————————————— Tests —————————————————————————————————— //

#[cfg(test)]
mod tests {
    use borealis_core::insn;

    use super::super::softfp::fcsr as flags;
    use super::super::tests::illegal_ctx;
    use super::*;
    use crate::arch::host;
    use crate::emulator::illegal_insn_handler;
    use crate::trap::MCause;

    fn fp_ctx(encoding: usize) -> TrapContext {
        let mut ctx = illegal_ctx(encoding);
        ctx.regs.mstatus |= mstatus::FS_FILTER;
        ctx
    }

    fn fp_rtype(base: usize, rd: usize, rs1: usize, rs2: usize) -> usize {
        base | (rd << 7) | (rs1 << 15) | (rs2 << 20)
    }

    fn fp_unary(base: usize, rd: usize, rs1: usize, rm: usize) -> usize {
        base | (rd << 7) | (rs1 << 15) | (rm << 12)
    }

    /// fcvt.s.h of 1.0 is exact: boxed single 1.0, untouched flags, FS dirtied.
    #[test]
    fn fcvt_s_h_exact() {
        host::reset();
        host::with_state(|state| state.fp[1] = 0xffffffffffff_3c00);
        let mut ctx = fp_ctx(fp_unary(insn::MATCH_FCVT_S_H, 2, 1, rm::RNE));

        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        host::with_state(|state| {
            assert_eq!(state.fp[2], 0xffffffff_3f800000);
            assert_eq!(state.csrs.fcsr, 0, "exact conversion leaves fcsr untouched");
        });
        assert_eq!(
            ctx.regs.mstatus & mstatus::FS_FILTER,
            mstatus::FS_FILTER,
            "FS must be dirty after an FP register write"
        );
    }

    /// fcvt.h.s near the half-precision limit: the result depends on the rounding mode, and
    /// overflow accrues OF|NX.
    #[test]
    fn fcvt_h_s_overflow_per_rounding_mode() {
        for (mode, expected, expected_flags) in [
            (rm::RNE, 0x7c00, flags::OF | flags::NX),
            (rm::RTZ, 0x7bff, flags::NX),
            (rm::RDN, 0x7bff, flags::NX),
            (rm::RUP, 0x7c00, flags::OF | flags::NX),
        ] {
            host::reset();
            host::with_state(|state| state.fp[1] = 0xffffffff_477ff000);
            let mut ctx = fp_ctx(fp_unary(insn::MATCH_FCVT_H_S, 2, 1, mode));

            assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
            host::with_state(|state| {
                assert_eq!(state.fp[2] as u16, expected, "rm {mode}");
                assert_eq!(state.csrs.fcsr as u32, expected_flags, "rm {mode}");
            });
        }
    }

    /// An improperly NaN-boxed input reads as the canonical NaN.
    #[test]
    fn unboxed_input_reads_as_nan() {
        host::reset();
        host::with_state(|state| state.fp[1] = 0x3c00); // 1.0, but not boxed
        let mut ctx = fp_ctx(fp_unary(insn::MATCH_FCVT_S_H, 2, 1, rm::RNE));

        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        host::with_state(|state| {
            assert_eq!(state.fp[2] as u32, softfp::F32_CANONICAL_NAN);
            assert_eq!(state.csrs.fcsr, 0, "a canonical qNaN is quiet");
        });
    }

    /// With mstatus.FS off the instruction is illegal; neither fcsr nor the register file may
    /// change.
    #[test]
    fn fs_off_is_redirected() {
        host::reset();
        host::with_state(|state| {
            state.csrs.stvec = 0x8030_0000;
            state.fp[1] = 0xffffffffffff_3c00;
        });
        let encoding = fp_unary(insn::MATCH_FCVT_S_H, 2, 1, rm::RNE);
        let mut ctx = illegal_ctx(encoding); // FS left off

        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Redirected));
        host::with_state(|state| {
            assert_eq!(state.csrs.stval, encoding);
            assert_eq!(state.csrs.fcsr, 0);
            assert_eq!(state.fp[2], 0, "the register file must be untouched");
        });
    }

    /// A trap from U-mode additionally requires sstatus.FS on.
    #[test]
    fn u_mode_needs_sstatus_fs() {
        use crate::arch::Mode;

        host::reset();
        host::with_state(|state| state.csrs.stvec = 0x8030_0000);
        let encoding = fp_unary(insn::MATCH_FCVT_S_H, 2, 1, rm::RNE);
        let mut ctx = fp_ctx(encoding);
        ctx.regs.mstatus =
            (ctx.regs.mstatus & !mstatus::MPP_FILTER) | (Mode::U.to_bits() << mstatus::MPP_OFFSET);

        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Redirected));

        // Same trap with sstatus.FS on is emulated
        host::reset();
        host::with_state(|state| {
            state.csrs.sstatus = mstatus::FS_FILTER;
            state.fp[1] = 0xffffffffffff_3c00;
        });
        let mut ctx = fp_ctx(encoding);
        ctx.regs.mstatus =
            (ctx.regs.mstatus & !mstatus::MPP_FILTER) | (Mode::U.to_bits() << mstatus::MPP_OFFSET);
        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
    }

    /// A reserved rounding mode in fcsr makes a DYN instruction illegal, with fcsr untouched.
    #[test]
    fn reserved_dynamic_rm_is_redirected() {
        host::reset();
        host::with_state(|state| {
            state.csrs.stvec = 0x8030_0000;
            state.csrs.fcsr = 5 << flags::RM_OFFSET;
            state.fp[1] = 0xffffffff_3f800000;
        });
        let mut ctx = fp_ctx(fp_unary(insn::MATCH_FCVT_H_S, 2, 1, rm::DYN));

        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Redirected));
        host::with_state(|state| {
            assert_eq!(state.csrs.fcsr as u32, 5 << flags::RM_OFFSET);
            assert_eq!(state.fp[2], 0);
        });
    }

    /// A valid dynamic rounding mode is read from fcsr[7:5].
    #[test]
    fn dynamic_rm_comes_from_fcsr() {
        host::reset();
        host::with_state(|state| {
            state.csrs.fcsr = (rm::RUP as usize) << flags::RM_OFFSET;
            state.fp[1] = 0xffffffff_3f800001; // barely above 1.0
        });
        let mut ctx = fp_ctx(fp_unary(insn::MATCH_FCVT_H_S, 2, 1, rm::DYN));

        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        host::with_state(|state| {
            assert_eq!(state.fp[2] as u16, 0x3c01, "RUP rounds away from zero");
        });
    }

    #[test]
    fn fli_loads_constants() {
        host::reset();
        let mut ctx = fp_ctx(fp_rtype(insn::MATCH_FLI_S, 3, 16, 0)); // fli.s f3, 1.0
        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        host::with_state(|state| assert_eq!(state.fp[3], 0xffffffff_3f800000));

        let mut ctx = fp_ctx(fp_rtype(insn::MATCH_FLI_D, 3, 0, 0)); // fli.d f3, -1.0
        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        host::with_state(|state| assert_eq!(state.fp[3], 0xbff0000000000000));
    }

    /// fminm orders the two zeros, fmaxm mirrors, and a signaling NaN poisons the result.
    #[test]
    fn fminm_fmaxm() {
        host::reset();
        host::with_state(|state| {
            state.fp[1] = 0xffffffffffff_0000; // +0
            state.fp[2] = 0xffffffffffff_8000; // -0
        });
        let mut ctx = fp_ctx(fp_rtype(insn::MATCH_FMINM_H, 3, 1, 2));
        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        host::with_state(|state| assert_eq!(state.fp[3] as u16, 0x8000));

        let mut ctx = fp_ctx(fp_rtype(insn::MATCH_FMAXM_H, 3, 1, 2));
        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        host::with_state(|state| assert_eq!(state.fp[3] as u16, 0x0000));

        // Signaling NaN input: canonical NaN result and NV
        host::with_state(|state| state.fp[2] = 0xffffffffffff_7c01);
        let mut ctx = fp_ctx(fp_rtype(insn::MATCH_FMINM_H, 3, 1, 2));
        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        host::with_state(|state| {
            assert_eq!(state.fp[3] as u16, softfp::F16_CANONICAL_NAN);
            assert_eq!(state.csrs.fcsr as u32, flags::NV);
        });
    }

    /// The quiet compares return 0 on NaN without raising NV, unless the NaN signals.
    #[test]
    fn quiet_compares() {
        host::reset();
        host::with_state(|state| {
            state.fp[1] = 0xffffffff_bf800000; // -1.0f
            state.fp[2] = 0xffffffff_3f000000; // 0.5f
        });
        let mut ctx = fp_ctx(fp_rtype(insn::MATCH_FLTQ_S, 10, 1, 2));
        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        assert_eq!(ctx.regs.get(10), 1);

        let mut ctx = fp_ctx(fp_rtype(insn::MATCH_FLEQ_S, 10, 2, 2));
        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        assert_eq!(ctx.regs.get(10), 1, "a value compares equal to itself");

        host::with_state(|state| state.fp[2] = 0xffffffff_7fc00000); // quiet NaN
        let mut ctx = fp_ctx(fp_rtype(insn::MATCH_FLTQ_S, 10, 1, 2));
        ctx.regs.set(10, 7);
        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        assert_eq!(ctx.regs.get(10), 0);
        host::with_state(|state| assert_eq!(state.csrs.fcsr, 0, "quiet NaN raises nothing"));
    }

    /// fmv.x.h sign-extends into the integer register, fmv.h.x boxes into the FP register.
    #[test]
    fn fmv_between_register_files() {
        host::reset();
        host::with_state(|state| state.fp[1] = 0xffffffffffff_8123);
        let mut ctx = fp_ctx(fp_rtype(insn::MATCH_FMV_X_H, 10, 1, 0));
        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        assert_eq!(ctx.regs.get(10), 0xffffffffffff8123);

        let mut ctx = fp_ctx(fp_rtype(insn::MATCH_FMV_H_X, 4, 11, 0));
        ctx.regs.set(11, 0x3c00);
        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        host::with_state(|state| assert_eq!(state.fp[4], 0xffffffffffff_3c00));
    }

    #[test]
    fn fround_h_rounds() {
        host::reset();
        host::with_state(|state| state.fp[1] = 0xffffffffffff_3e00); // 1.5
        let mut ctx = fp_ctx(fp_unary(insn::MATCH_FROUND_H, 2, 1, rm::RNE));
        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        host::with_state(|state| {
            assert_eq!(state.fp[2] as u16, 0x4000);
            assert_eq!(state.csrs.fcsr, 0, "fround does not raise NX");
        });

        let mut ctx = fp_ctx(fp_unary(insn::MATCH_FROUNDNX_H, 2, 1, rm::RNE));
        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        host::with_state(|state| {
            assert_eq!(state.csrs.fcsr as u32, flags::NX, "froundnx raises NX");
        });
    }

    /// fcvtmod.w.d writes the integer register file, not the FP one.
    #[test]
    fn fcvtmod_writes_rd() {
        host::reset();
        host::with_state(|state| state.fp[1] = (-3.5f64).to_bits());
        let mut ctx = fp_ctx(fp_rtype(insn::MATCH_FCVTMOD_W_D, 10, 1, 0));
        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Handled));
        assert_eq!(ctx.regs.get(10), -3isize as usize);
        host::with_state(|state| {
            assert_eq!(state.csrs.fcsr as u32, flags::NX);
            assert_eq!(state.fp[10], 0, "the FP file must be untouched");
        });
    }

    /// An OP-FP encoding outside the emulated set is redirected.
    #[test]
    fn unknown_op_fp_is_redirected() {
        host::reset();
        host::with_state(|state| state.csrs.stvec = 0x8030_0000);
        // fadd.s, which this emulator deliberately does not implement
        let encoding = fp_rtype(0x00000053, 3, 1, 2);
        let mut ctx = fp_ctx(encoding);
        assert_eq!(illegal_insn_handler(&mut ctx), Ok(Emulation::Redirected));
        host::with_state(|state| {
            assert_eq!(state.csrs.scause, MCause::IllegalInstr as usize);
            assert_eq!(state.csrs.stval, encoding);
        });
    }
}
