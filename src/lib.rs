//! Borealis
//!
//! An experimental RISC-V machine-mode supervisor whose distinguishing feature is software
//! emulation of recently ratified ISA extensions: when a lower privilege mode executes an
//! instruction the hart cannot decode, the hart traps into M-mode and Borealis performs the
//! architectural effect in software before resuming the interrupted context.
//!
//! The library exposes [init] and the [illegal_insn_handler] entry point; the trap entry/exit
//! assembly and the register save/restore around it are expected to be provided by the embedding
//! firmware.

// Mark the crate as no_std, but only for bare-metal builds.
// We need std to be able to run tests in user-space on the host architecture.
#![cfg_attr(
    all(target_arch = "riscv64", not(any(test, feature = "userspace"))),
    no_std
)]

pub mod arch;
pub mod config;
pub mod csr;
pub mod debug;
pub mod decoder;
pub mod emulator;
pub mod logger;
pub mod misaligned;
pub mod platform;
pub mod pmu;
pub mod trap;

pub use emulator::{illegal_insn_handler, EmuError, Emulation};
use platform::{Plat, Platform};
pub use trap::{TrapContext, TrapInfo, TrapRegs};

/// Initialize the platform and the logger.
///
/// This must be called once per boot, before the first trap can be taken.
pub fn init() {
    Plat::init();
    logger::init();
}
