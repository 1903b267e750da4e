//! Trap handling
//!
//! The types in this module mirror the register state saved by the trap entry assembly: the 32
//! general purpose registers followed by mepc and mstatus, plus the details of the trap being
//! handled. Redirection of a trap to S-mode (so that the guest sees a native trap) also lives
//! here.

use core::fmt;

use crate::arch::{mstatus, parse_mpp_return_mode, Arch, Architecture, Csr, Mode};
use crate::emulator::{EmuError, Emulation};

// ———————————————————————————— Trapped Registers ——————————————————————————— //

/// Register state of the trapped context, as saved by the trap entry assembly.
///
/// The layout matches the save order of the trap entry: x0..x31 in calling-convention order,
/// then mepc and mstatus.
#[derive(Debug, Clone)]
#[repr(C)]
pub struct TrapRegs {
    /// General purpose registers, indexed by architectural register number.
    pub gprs: [usize; 32],
    /// Program counter at the time of the trap.
    pub mepc: usize,
    /// Machine status at the time of the trap.
    pub mstatus: usize,
}

impl TrapRegs {
    pub const fn new() -> Self {
        TrapRegs {
            gprs: [0; 32],
            mepc: 0,
            mstatus: 0,
        }
    }

    /// Read a general purpose register.
    pub fn get(&self, reg: usize) -> usize {
        self.gprs[reg & 0b11111]
    }

    /// Write a general purpose register.
    ///
    /// Writes to x0 are silently dropped, so emulators can write their rd unconditionally.
    pub fn set(&mut self, reg: usize, value: usize) {
        let reg = reg & 0b11111;
        if reg != 0 {
            self.gprs[reg] = value;
        }
    }

    /// Returns the privilege mode the trap came from.
    pub fn prev_mode(&self) -> Mode {
        parse_mpp_return_mode(self.mstatus)
    }

    /// Mark the floating-point unit state as dirty.
    pub fn set_fs_dirty(&mut self) {
        self.mstatus |= mstatus::FS_FILTER;
    }
}

impl Default for TrapRegs {
    fn default() -> Self {
        Self::new()
    }
}

// ——————————————————————————————— Trap Info ———————————————————————————————— //

/// Details of a trap, either the one being handled or a nested one to be delivered to a lower
/// privilege mode.
///
/// A `cause` of zero means "no trap": the unprivileged access helpers clear the structure before
/// the access and only fill it on fault. (Cause zero is instruction address misaligned, which
/// the unprivileged helpers cannot produce.)
#[derive(Debug, Clone, Default)]
#[repr(C)]
pub struct TrapInfo {
    /// Trap exception cause
    pub cause: usize,
    /// Trap value
    pub tval: usize,
    /// Trap value 2
    pub tval2: usize,
    /// Trap instruction
    pub tinst: usize,
    /// Guest virtual address in tval flag
    pub gva: usize,
}

impl TrapInfo {
    pub const fn new() -> Self {
        TrapInfo {
            cause: 0,
            tval: 0,
            tval2: 0,
            tinst: 0,
            gva: 0,
        }
    }

    /// Return the trap cause.
    pub fn get_cause(&self) -> MCause {
        MCause::new(self.cause)
    }
}

// —————————————————————————————— Trap Context —————————————————————————————— //

/// The trap context saved on the stack by the trap entry: register state, trap details, and a
/// link to the interrupted context when traps nest.
#[repr(C)]
pub struct TrapContext {
    /// Register state
    pub regs: TrapRegs,
    /// Trap details
    pub trap: TrapInfo,
    /// Pointer to previous trap context
    pub prev_context: *mut TrapContext,
}

impl TrapContext {
    pub const fn new() -> Self {
        TrapContext {
            regs: TrapRegs::new(),
            trap: TrapInfo::new(),
            prev_context: core::ptr::null_mut(),
        }
    }
}

impl Default for TrapContext {
    fn default() -> Self {
        Self::new()
    }
}

// ————————————————————————————————— mcause ————————————————————————————————— //

#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum MCause {
    // Exceptions
    InstrAddrMisaligned = 0,
    InstrAccessFault = 1,
    IllegalInstr = 2,
    Breakpoint = 3,
    LoadAddrMisaligned = 4,
    LoadAccessFault = 5,
    StoreAddrMisaligned = 6,
    StoreAccessFault = 7,
    EcallFromUMode = 8,
    EcallFromSMode = 9,
    EcallFromMMode = 11,
    InstrPageFault = 12,
    LoadPageFault = 13,
    StorePageFault = 15,
    UnknownException = 16,
}

impl MCause {
    pub fn new(cause: usize) -> Self {
        match cause {
            0 => Self::InstrAddrMisaligned,
            1 => Self::InstrAccessFault,
            2 => Self::IllegalInstr,
            3 => Self::Breakpoint,
            4 => Self::LoadAddrMisaligned,
            5 => Self::LoadAccessFault,
            6 => Self::StoreAddrMisaligned,
            7 => Self::StoreAccessFault,
            8 => Self::EcallFromUMode,
            9 => Self::EcallFromSMode,
            11 => Self::EcallFromMMode,
            12 => Self::InstrPageFault,
            13 => Self::LoadPageFault,
            15 => Self::StorePageFault,
            _ => Self::UnknownException,
        }
    }
}

impl fmt::Debug for MCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MCause::InstrAddrMisaligned => write!(f, "instruction address misaligned"),
            MCause::InstrAccessFault => write!(f, "instruction access fault"),
            MCause::IllegalInstr => write!(f, "illegal instruction"),
            MCause::Breakpoint => write!(f, "breakpoint"),
            MCause::LoadAddrMisaligned => write!(f, "load address misaligned"),
            MCause::LoadAccessFault => write!(f, "load access fault"),
            MCause::StoreAddrMisaligned => write!(f, "store/amo misaligned"),
            MCause::StoreAccessFault => write!(f, "store/amo access fault"),
            MCause::EcallFromUMode => write!(f, "ecall from u-mode"),
            MCause::EcallFromSMode => write!(f, "ecall from s-mode"),
            MCause::EcallFromMMode => write!(f, "ecall from m-mode"),
            MCause::InstrPageFault => write!(f, "instruction page fault"),
            MCause::LoadPageFault => write!(f, "load page fault"),
            MCause::StorePageFault => write!(f, "store/amo page fault"),
            MCause::UnknownException => write!(f, "unknown exception"),
        }
    }
}

// —————————————————————————————— Redirection ——————————————————————————————— //

/// Redirect a trap to S-mode, so that the trapped context observes a native trap at its own
/// privilege level.
///
/// This updates the S-mode exception CSRs from `trap`, rewrites `mstatus` so that `sret` from
/// the guest handler returns to the interrupted code, and points `mepc` at the S-mode trap
/// vector. The GPRs of the trapped context are left untouched.
pub fn redirect(regs: &mut TrapRegs, trap: &TrapInfo) -> Result<Emulation, EmuError> {
    let prev_mode = regs.prev_mode();

    // Sanity check on previous mode: M-mode traps are handled by Borealis itself and must never
    // be re-injected.
    if prev_mode == Mode::M {
        log::error!(
            "Attempted to redirect a trap ({:?}) back to M-mode",
            trap.get_cause()
        );
        return Err(EmuError::RedirectFromMachineMode);
    }

    // Update S-mode exception info
    unsafe {
        Arch::write_csr(Csr::Stval, trap.tval);
        Arch::write_csr(Csr::Sepc, regs.mepc);
        Arch::write_csr(Csr::Scause, trap.cause);
    }

    // Jump to the S-mode trap handler
    regs.mepc = Arch::read_csr(Csr::Stvec);

    let mut mstatus = regs.mstatus;

    // Set MPP to S-mode
    mstatus &= !mstatus::MPP_FILTER;
    mstatus |= (Mode::S as usize) << mstatus::MPP_OFFSET;

    // Set SPP for S-mode
    mstatus &= !mstatus::SPP_FILTER;
    if prev_mode == Mode::S {
        mstatus |= 1 << mstatus::SPP_OFFSET;
    }

    // Set SPIE for S-mode
    mstatus &= !mstatus::SPIE_FILTER;
    if mstatus & mstatus::SIE_FILTER != 0 {
        mstatus |= mstatus::SPIE_FILTER;
    }

    // Clear SIE for S-mode
    mstatus &= !mstatus::SIE_FILTER;

    regs.mstatus = mstatus;

    Ok(Emulation::Redirected)
}

// ————————————————————————————————— Tests —————————————————————————————————— //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::host;

    #[test]
    fn x0_writes_are_dropped() {
        let mut regs = TrapRegs::new();
        regs.set(0, 0xdeadbeef);
        assert_eq!(regs.get(0), 0);
        regs.set(5, 42);
        assert_eq!(regs.get(5), 42);
    }

    /// A redirected trap must deliver cause/tval/epc to the S-mode CSRs, jump to stvec, and
    /// update the privilege stack in mstatus.
    #[test]
    fn redirect_to_s_mode() {
        host::reset();
        host::with_state(|state| {
            state.csrs.stvec = 0x8020_0000;
        });

        let mut regs = TrapRegs::new();
        regs.mepc = 0x8010_0042;
        regs.mstatus = (Mode::S.to_bits() << mstatus::MPP_OFFSET) | mstatus::SIE_FILTER;

        let trap = TrapInfo {
            cause: MCause::IllegalInstr as usize,
            tval: 0xdead_beef,
            ..Default::default()
        };

        let res = redirect(&mut regs, &trap).unwrap();
        assert_eq!(res, Emulation::Redirected);
        assert_eq!(regs.mepc, 0x8020_0000, "mepc must be at the handler start");

        host::with_state(|state| {
            assert_eq!(state.csrs.scause, MCause::IllegalInstr as usize);
            assert_eq!(state.csrs.sepc, 0x8010_0042);
            assert_eq!(state.csrs.stval, 0xdead_beef);
        });

        // SPP records S, SPIE records the old SIE, SIE is cleared
        assert_eq!(regs.mstatus & mstatus::SPP_FILTER, mstatus::SPP_FILTER);
        assert_eq!(regs.mstatus & mstatus::SPIE_FILTER, mstatus::SPIE_FILTER);
        assert_eq!(regs.mstatus & mstatus::SIE_FILTER, 0);
    }

    #[test]
    fn redirect_from_m_mode_is_an_error() {
        host::reset();
        let mut regs = TrapRegs::new();
        regs.mstatus = Mode::M.to_bits() << mstatus::MPP_OFFSET;
        let trap = TrapInfo::new();
        assert_eq!(
            redirect(&mut regs, &trap),
            Err(EmuError::RedirectFromMachineMode)
        );
    }
}
