//! Debug utils for Borealis

/// Emit a warning, but only once per call site.
///
/// Useful on paths that a misbehaving guest can hit in a loop, where the first occurrence is
/// interesting and the rest is noise.
macro_rules! warn_once {
    ($($args:tt)*) => {{
        use core::sync::atomic::{AtomicBool, Ordering};
        static ONCE: AtomicBool = AtomicBool::new(false);
        if !ONCE.swap(true, Ordering::Relaxed) {
            log::warn!($($args)*);
        }
    }};
}

pub(crate) use warn_once;
