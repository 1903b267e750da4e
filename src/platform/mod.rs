//! Platform abstraction
//!
//! The emulation core needs very little from the platform: a debug output for the logger, a way
//! to synchronously flush the data caches (for the Zicbom management operations), and a way to
//! terminate execution.

#[cfg(any(not(target_arch = "riscv64"), test, feature = "userspace"))]
pub mod host;
#[cfg(all(target_arch = "riscv64", not(any(test, feature = "userspace"))))]
pub mod virt;

use core::fmt;

/// Export the current platform.
/// For now, only QEMU's Virt board is supported for bare-metal builds.
#[cfg(all(target_arch = "riscv64", not(any(test, feature = "userspace"))))]
pub type Plat = virt::VirtPlatform;

#[cfg(any(not(target_arch = "riscv64"), test, feature = "userspace"))]
pub type Plat = host::HostPlatform;

pub trait Platform {
    fn name() -> &'static str;
    fn init();
    fn debug_print(args: fmt::Arguments);
    fn exit_success() -> !;
    fn exit_failure() -> !;

    /// Synchronously clean and invalidate the data caches.
    ///
    /// Called by the Zicbom cache management emulation; must not return before the caches are
    /// drained.
    fn flush_data_caches();
}
