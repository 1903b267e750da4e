//! Emulated CSR surface
//!
//! When a lower privilege level traps on a CSR access, the system-opcode emulator asks this
//! module to perform the read or write in software. Only a small set of CSRs is emulated; an
//! unknown CSR makes the whole instruction genuinely illegal, which the caller reports through
//! the redirect sink.
//!
//! This module also sources the menvcfg/senvcfg values that gate the Zicbom/Zicboz emulation,
//! falling back to a permissive constant on hardware that predates those CSRs.

use crate::arch::{Arch, Architecture, Csr, Mode};
use crate::config;
use crate::trap::TrapRegs;

/// Read an emulated CSR.
///
/// Returns `Err` when the CSR is not part of the emulated surface.
pub fn emulate_csr_read(csr_num: usize, _regs: &TrapRegs) -> Result<usize, ()> {
    match csr_num {
        borealis_core::csr::TIME => Ok(Arch::read_csr(Csr::Time)),
        borealis_core::csr::CYCLE => Ok(Arch::read_csr(Csr::Cycle)),
        _ => Err(()),
    }
}

/// Write an emulated CSR.
///
/// Returns `Err` when the CSR is not part of the emulated surface or is read-only.
pub fn emulate_csr_write(csr_num: usize, _regs: &mut TrapRegs, _value: usize) -> Result<(), ()> {
    // The emulated counters are read-only, and nothing else is emulated yet.
    let _ = csr_num;
    Err(())
}

/// Return the environment configuration that applies to the trapped context: senvcfg when the
/// trap came from U-mode, menvcfg otherwise.
pub fn read_envcfg(prev_mode: Mode) -> usize {
    if !config::HAS_ENVCFG {
        return config::ENVCFG_FALLBACK;
    }
    match prev_mode {
        Mode::U => Arch::read_csr(Csr::Senvcfg),
        _ => Arch::read_csr(Csr::Menvcfg),
    }
}
