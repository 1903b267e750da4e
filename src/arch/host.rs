//! A mock of architecture specific features when running in user space.
//!
//! This implementation is useful for running Borealis on the host (potentially non-riscv)
//! architecture, such as when running unit tests. The CSR file, the floating-point and vector
//! register files are plain thread-local state, and memory accesses go straight through host
//! pointers unless a fault window was armed with [with_state].

use std::cell::RefCell;

use super::{Architecture, Csr};
use crate::config;
use crate::emulator::vector::VectorBuffer;
use crate::trap::{MCause, TrapInfo};

// —————————————————————————————— Mock State ———————————————————————————————— //

/// The mocked CSR file.
#[derive(Default)]
pub struct MockCsrs {
    pub sstatus: usize,
    pub stvec: usize,
    pub senvcfg: usize,
    pub sepc: usize,
    pub scause: usize,
    pub stval: usize,
    pub menvcfg: usize,
    pub fcsr: usize,
    pub vl: usize,
    pub vtype: usize,
    pub time: usize,
    pub cycle: usize,
}

/// Mocked hart state, local to the current thread so tests stay independent.
pub struct MockState {
    pub csrs: MockCsrs,
    /// Floating-point register file.
    pub fp: [u64; 32],
    /// Vector register file.
    pub vregs: [[u8; config::VLMAX_BYTES]; 32],
    /// Address range (start, end) for which unprivileged accesses fault.
    pub fault_window: Option<(usize, usize)>,
}

impl MockState {
    fn new() -> Self {
        MockState {
            csrs: MockCsrs::default(),
            fp: [0; 32],
            vregs: [[0; config::VLMAX_BYTES]; 32],
            fault_window: None,
        }
    }

    fn faults(&self, addr: usize) -> bool {
        match self.fault_window {
            Some((start, end)) => addr >= start && addr < end,
            None => false,
        }
    }
}

std::thread_local! {
    static STATE: RefCell<MockState> = RefCell::new(MockState::new());
}

/// Run a closure with mutable access to the mocked hart state.
pub fn with_state<R>(f: impl FnOnce(&mut MockState) -> R) -> R {
    STATE.with(|state| f(&mut state.borrow_mut()))
}

/// Reset the mocked hart state, for test isolation.
pub fn reset() {
    STATE.with(|state| *state.borrow_mut() = MockState::new());
    crate::platform::host::reset();
}

fn load_faults(addr: usize, trap: &mut TrapInfo) -> bool {
    with_state(|state| {
        if state.faults(addr) {
            trap.cause = MCause::LoadAccessFault as usize;
            trap.tval = addr;
            true
        } else {
            false
        }
    })
}

fn store_faults(addr: usize, trap: &mut TrapInfo) -> bool {
    with_state(|state| {
        if state.faults(addr) {
            trap.cause = MCause::StoreAccessFault as usize;
            trap.tval = addr;
            true
        } else {
            false
        }
    })
}

// ——————————————————————————————— Architecture ————————————————————————————— //

/// User space mock, running on the host architecture.
pub struct HostArch {}

impl Architecture for HostArch {
    fn read_csr(csr: Csr) -> usize {
        with_state(|state| match csr {
            Csr::Sstatus => state.csrs.sstatus,
            Csr::Stvec => state.csrs.stvec,
            Csr::Senvcfg => state.csrs.senvcfg,
            Csr::Sepc => state.csrs.sepc,
            Csr::Scause => state.csrs.scause,
            Csr::Stval => state.csrs.stval,
            Csr::Menvcfg => state.csrs.menvcfg,
            Csr::Fcsr => state.csrs.fcsr,
            Csr::Vl => state.csrs.vl,
            Csr::Vtype => state.csrs.vtype,
            Csr::Time => state.csrs.time,
            Csr::Cycle => state.csrs.cycle,
        })
    }

    unsafe fn write_csr(csr: Csr, value: usize) -> usize {
        with_state(|state| {
            let slot = match csr {
                Csr::Sstatus => &mut state.csrs.sstatus,
                Csr::Stvec => &mut state.csrs.stvec,
                Csr::Senvcfg => &mut state.csrs.senvcfg,
                Csr::Sepc => &mut state.csrs.sepc,
                Csr::Scause => &mut state.csrs.scause,
                Csr::Stval => &mut state.csrs.stval,
                Csr::Menvcfg => &mut state.csrs.menvcfg,
                Csr::Fcsr => &mut state.csrs.fcsr,
                Csr::Vl => &mut state.csrs.vl,
                Csr::Vtype => &mut state.csrs.vtype,
                Csr::Time => &mut state.csrs.time,
                Csr::Cycle => &mut state.csrs.cycle,
            };
            core::mem::replace(slot, value)
        })
    }

    fn mb() {
        core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
    }

    fn fence_i() {}

    unsafe fn fetch_insn(pc: usize, trap: &mut TrapInfo) -> usize {
        let faults = with_state(|state| state.faults(pc));
        if faults {
            trap.cause = MCause::InstrAccessFault as usize;
            trap.tval = pc;
            return 0;
        }
        (pc as *const u32).read_unaligned() as usize
    }

    unsafe fn load_u8(addr: usize, trap: &mut TrapInfo) -> u8 {
        if load_faults(addr, trap) {
            return 0;
        }
        (addr as *const u8).read()
    }

    unsafe fn load_u16(addr: usize, trap: &mut TrapInfo) -> u16 {
        if load_faults(addr, trap) {
            return 0;
        }
        (addr as *const u16).read_unaligned()
    }

    unsafe fn load_u32(addr: usize, trap: &mut TrapInfo) -> u32 {
        if load_faults(addr, trap) {
            return 0;
        }
        (addr as *const u32).read_unaligned()
    }

    unsafe fn store_u8(addr: usize, value: u8, trap: &mut TrapInfo) {
        if store_faults(addr, trap) {
            return;
        }
        (addr as *mut u8).write(value)
    }

    unsafe fn store_u16(addr: usize, value: u16, trap: &mut TrapInfo) {
        if store_faults(addr, trap) {
            return;
        }
        (addr as *mut u16).write_unaligned(value)
    }

    unsafe fn store_u32(addr: usize, value: u32, trap: &mut TrapInfo) {
        if store_faults(addr, trap) {
            return;
        }
        (addr as *mut u32).write_unaligned(value)
    }

    unsafe fn read_fp_file(file: &mut [u64; 32]) {
        with_state(|state| *file = state.fp);
    }

    unsafe fn write_fp_file(file: &[u64; 32]) {
        with_state(|state| state.fp = *file);
    }

    unsafe fn store_vreg(n: usize, sew: usize, buf: &mut VectorBuffer) {
        with_state(|state| {
            let len = state.csrs.vl * (1 << sew);
            buf.bytes_mut()[..len].copy_from_slice(&state.vregs[n][..len]);
        });
    }

    unsafe fn load_vreg(n: usize, sew: usize, buf: &VectorBuffer, masked: bool) {
        with_state(|state| {
            let esize = 1 << sew;
            let vl = state.csrs.vl;
            for i in 0..vl {
                // A masked load leaves the elements with a cleared v0 bit undisturbed.
                if masked && state.vregs[0][i / 8] & (1 << (i % 8)) == 0 {
                    continue;
                }
                let offset = i * esize;
                state.vregs[n][offset..offset + esize]
                    .copy_from_slice(&buf.bytes()[offset..offset + esize]);
            }
        });
    }
}
