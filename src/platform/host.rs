//! Host platform, running in user space.
//!
//! Used when running Borealis as a userspace application on the host architecture, such as when
//! running unit tests.

use core::fmt;
use std::cell::Cell;

use super::Platform;

std::thread_local! {
    static NB_CACHE_FLUSHES: Cell<usize> = const { Cell::new(0) };
}

pub struct HostPlatform {}

impl Platform for HostPlatform {
    fn name() -> &'static str {
        "Host userspace"
    }

    fn init() {}

    fn debug_print(args: fmt::Arguments) {
        print!("{}", args);
    }

    fn exit_success() -> ! {
        std::process::exit(0);
    }

    fn exit_failure() -> ! {
        std::process::exit(1);
    }

    fn flush_data_caches() {
        NB_CACHE_FLUSHES.with(|counter| counter.set(counter.get() + 1));
    }
}

/// Number of cache flushes requested so far on this thread.
pub fn nb_cache_flushes() -> usize {
    NB_CACHE_FLUSHES.with(|counter| counter.get())
}

/// Reset the per-thread flush counter, for test isolation.
pub fn reset() {
    NB_CACHE_FLUSHES.with(|counter| counter.set(0));
}
