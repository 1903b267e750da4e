//! Firmware event counters
//!
//! A minimal performance monitoring surface: each noteworthy firmware event has a counter that
//! the emulation core bumps, so the platform can expose how much software emulation is going on
//! behind the guest's back.

use core::sync::atomic::{AtomicUsize, Ordering};

/// Events counted by the firmware.
#[derive(Clone, Copy, Debug)]
#[repr(usize)]
pub enum FirmwareEvent {
    /// An illegal instruction trap entered the emulation core.
    IllegalInsn = 0,
    /// A misaligned load was emulated.
    MisalignedLoad = 1,
    /// A misaligned store was emulated.
    MisalignedStore = 2,
}

const NB_EVENTS: usize = 3;

#[allow(clippy::declare_interior_mutable_const)]
const ZERO: AtomicUsize = AtomicUsize::new(0);
static COUNTERS: [AtomicUsize; NB_EVENTS] = [ZERO; NB_EVENTS];

/// Increment the counter for a firmware event.
pub fn ctr_incr_fw(event: FirmwareEvent) {
    COUNTERS[event as usize].fetch_add(1, Ordering::Relaxed);
}

/// Read the counter for a firmware event.
pub fn ctr_read_fw(event: FirmwareEvent) -> usize {
    COUNTERS[event as usize].load(Ordering::Relaxed)
}
