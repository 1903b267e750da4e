//! SYSTEM opcode emulation
//!
//! Handles the Zawrs wait-on-reservation-set instructions (no-ops here), the Zimop may-be
//! operations (rd is zeroed), and CSR accesses to the emulated CSR surface. A CSR instruction
//! trapping out of M-mode itself means the firmware touched a CSR the hart does not have,
//! which is a firmware bug and is reported as such.

use borealis_core::insn;

use super::{truly_illegal_insn, EmuError, EmuResult, Emulation};
use crate::arch::Mode;
use crate::csr;
use crate::debug;
use crate::decoder;
use crate::trap::TrapContext;

const CSRRW: usize = 0b001;
const CSRRS: usize = 0b010;
const CSRRC: usize = 0b011;
const CSRRWI: usize = 0b101;
const CSRRSI: usize = 0b110;
const CSRRCI: usize = 0b111;

pub fn emulate(insn: usize, ctx: &mut TrapContext) -> EmuResult {
    let rs1_num = decoder::rs1(insn);
    let rs1_val = ctx.regs.get(rs1_num);
    let csr_num = decoder::csr_num(insn);

    if ctx.regs.prev_mode() == Mode::M {
        log::error!("Failed to access CSR {:#x} from M-mode", csr_num);
        return Err(EmuError::CsrAccessFromMachineMode);
    }

    // Ensure that we got a CSR read/write instruction
    let funct3 = decoder::rm(insn);
    if funct3 == 0 || funct3 == 0b100 {
        // Handle "Zawrs" Wait-on-Reservation-Set
        if insn == insn::MATCH_WRS_NTO || insn == insn::MATCH_WRS_STO {
            // do nothing
            ctx.regs.mepc = ctx.regs.mepc.wrapping_add(4);
            return Ok(Emulation::Handled);
        }
        // Handle "Zimop" May-Be-Operations
        if insn & insn::MASK_MOP_R_N == insn::MATCH_MOP_R_N
            || insn & insn::MASK_MOP_RR_N == insn::MATCH_MOP_RR_N
        {
            ctx.regs.set(decoder::rd(insn), 0);
            ctx.regs.mepc = ctx.regs.mepc.wrapping_add(4);
            return Ok(Emulation::Handled);
        }

        // Otherwise treat this as an error
        debug::warn_once!("Invalid opcode for CSR read/write instruction: {:#x}", insn);
        return truly_illegal_insn(insn, ctx);
    }

    let Ok(csr_val) = csr::emulate_csr_read(csr_num, &ctx.regs) else {
        return truly_illegal_insn(insn, ctx);
    };

    let (new_csr_val, do_write) = match funct3 {
        CSRRW => (rs1_val, true),
        CSRRS => (csr_val | rs1_val, rs1_num != 0),
        CSRRC => (csr_val & !rs1_val, rs1_num != 0),
        CSRRWI => (rs1_num, true),
        CSRRSI => (csr_val | rs1_num, rs1_num != 0),
        CSRRCI => (csr_val & !rs1_num, rs1_num != 0),
        _ => return truly_illegal_insn(insn, ctx),
    };

    if do_write && csr::emulate_csr_write(csr_num, &mut ctx.regs, new_csr_val).is_err() {
        return truly_illegal_insn(insn, ctx);
    }

    ctx.regs.set(decoder::rd(insn), csr_val);
    ctx.regs.mepc = ctx.regs.mepc.wrapping_add(4);

    Ok(Emulation::Handled)
}

// ————————————————————————————————— Tests —————————————————————————————————— //
