//! Configuration constants
//!
//! The constants in this file are parsed from environment variables at compile time, so a
//! Borealis build can be tuned without touching the sources.

// ———————————————————————————————— Helpers ————————————————————————————————— //

/// Helper macro to check is boolean choice is enabled by the configuration, defaulting to yes.
///
/// The current implementation works around the limitation of const functions in rust at the
/// time of writing.
macro_rules! is_enabled {
    ($env_var: tt) => {
        match option_env!($env_var) {
            Some(env_var) => match env_var.as_bytes() {
                b"false" => false,
                _ => true,
            },
            None => true,
        }
    };
}

// ————————————————————————————— String Parsing ————————————————————————————— //
// Required to parse environment variables at compile time.
// Can be removed once usize::from_str_radix stabilized as const, hopefully soon.
// See https://github.com/rust-lang/rust/pull/124941
// —————————————————————————————————————————————————————————————————————————— //

const fn parse_byte(b: u8, pow10: usize) -> usize {
    let r = b - 48; // Remove ascii offset

    if r > 9 {
        panic!("Failed to parse config: expected usize")
    } else {
        (r as usize) * pow10
    }
}

const POW10: [usize; 20] = {
    let mut array = [0; 20];
    let mut current = 1;

    let mut index = 20;

    loop {
        index -= 1;
        array[index] = current;

        if index == 0 {
            break;
        }

        current *= 10;
    }

    array
};

const fn parse_usize(env_var: Option<&str>) -> Option<usize> {
    let Some(env_var) = env_var else {
        return None;
    };

    let bytes = env_var.as_bytes();
    let mut result: usize = 0;

    let len = bytes.len();

    // Start at the correct index of the table,
    // (skip the power's that are too large)
    let mut index_const_table = POW10.len().wrapping_sub(len);
    let mut index = 0;

    while index < env_var.len() {
        let pow = POW10[index_const_table];
        result += parse_byte(bytes[index], pow);

        index += 1;
        index_const_table += 1;
    }

    Some(result)
}

const fn parse_usize_or(env_var: Option<&str>, default: usize) -> usize {
    match parse_usize(env_var) {
        Some(value) => value,
        None => default,
    }
}

// ———————————————————————— Configuration Parameters ———————————————————————— //

/// The desired log level.
pub const LOG_LEVEL: Option<&'static str> = option_env!("BOREALIS_LOG_LEVEL");

/// Size in bytes of the per-register scratch buffer used by the vector emulator.
///
/// Any combination of vl and element width that does not fit is treated as illegal, so this must
/// be at least VLEN/8 of the largest hart Borealis runs on.
pub const VLMAX_BYTES: usize = parse_usize_or(option_env!("BOREALIS_VLMAX_BYTES"), 8 * 32);

/// Whether the hardware implements the menvcfg/senvcfg CSRs (privileged spec >= 1.12).
pub const HAS_ENVCFG: bool = is_enabled!("BOREALIS_HAS_ENVCFG");

/// The envcfg value assumed when the hardware predates menvcfg/senvcfg: all cache block
/// operations enabled.
pub const ENVCFG_FALLBACK: usize = 0xf0;

/// Size in bytes of a cache block, as operated on by the Zicbom/Zicboz instructions.
pub const CACHE_BLOCK_SIZE: usize = 64;
