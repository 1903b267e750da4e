//! Bit-exact floating-point helpers
//!
//! Software models of the IEEE-754 conversions and rounding operations needed by the Zfhmin and
//! Zfa emulation: half/single/double conversions, round-to-integer in all five rounding modes,
//! the modular fcvtmod.w.d conversion and NaN classification. No floating-point arithmetic is
//! performed, everything works on the raw bit patterns.
//!
//! The rounding code is table driven: a small bias, selected by {sign, future LSB, rounding
//! mode} and added just below what will become the result LSB, makes one unsigned addition
//! implement RNE, RTZ, RDN, RUP and RMM at once. The overflow and underflow thresholds are
//! per-{sign, rounding mode} for the same reason.

// ———————————————————————————————— FCSR Model —————————————————————————————— //

/// Accrued exception flags and rounding mode, as laid out in the fcsr CSR.
pub mod fcsr {
    pub const NX: u32 = 0x01;
    pub const UF: u32 = 0x02;
    pub const OF: u32 = 0x04;
    pub const DZ: u32 = 0x08;
    pub const NV: u32 = 0x10;

    /// Offset of the rounding mode field.
    pub const RM_OFFSET: u32 = 5;
}

/// Rounding mode encodings, as found in the instruction rm field and in fcsr[7:5].
pub mod rm {
    pub const RNE: usize = 0;
    pub const RTZ: usize = 1;
    pub const RDN: usize = 2;
    pub const RUP: usize = 3;
    pub const RMM: usize = 4;
    pub const DYN: usize = 7;
}

/// Canonical NaN bit patterns.
pub const F16_CANONICAL_NAN: u16 = 0x7e00;
pub const F32_CANONICAL_NAN: u32 = 0x7fc00000;
pub const F64_CANONICAL_NAN: u64 = 0x7ff8000000000000;

// —————————————————————————— Widening Conversions —————————————————————————— //

/// Convert a half-precision value to single precision.
///
/// Widening is exact, so the rounding mode does not matter; a signaling NaN still raises NV.
pub fn convert_f16_to_f32(val: u16, fcsr: &mut u32) -> u32 {
    // special case: +/- zero
    if val & 0x7fff == 0 {
        return (val as u32) << 16;
    }
    // special case: +/- infinity
    if val & 0x7fff == 0x7c00 {
        return (((val as i16 as i32) << 13) as u32) | 0x7f800000;
    }
    // special case: NaN => output canonical NaN
    if val & 0x7c00 == 0x7c00 {
        // handle signaling NaN
        if val & 0x0200 == 0 {
            *fcsr |= fcsr::NV;
        }
        return F32_CANONICAL_NAN;
    }
    // generic case or denormalized
    let mut result = ((((val as i16 as i32) << 13) as u32) & 0x8fffffff).wrapping_add(0x38000000);
    // normalize denormalized
    if val & 0x7c00 == 0 {
        let mut signexp = result & 0xff800000;
        result &= 0x007fffff;
        while result & 0x00800000 == 0 {
            signexp = signexp.wrapping_sub(0x00800000);
            result <<= 1;
        }
        result = signexp.wrapping_add(0x00800000) | (result & 0x007fffff);
    }
    result
}

/// Convert a half-precision value to double precision.
pub fn convert_f16_to_f64(val: u16, fcsr: &mut u32) -> u64 {
    // special case: +/- zero
    if val & 0x7fff == 0 {
        return (val as u64) << 48;
    }
    // special case: +/- infinity
    if val & 0x7fff == 0x7c00 {
        return (((val as i16 as i64) << 42) as u64) | 0x7ff0000000000000;
    }
    // special case: NaN => output canonical NaN
    if val & 0x7c00 == 0x7c00 {
        // handle signaling NaN
        if val & 0x0200 == 0 {
            *fcsr |= fcsr::NV;
        }
        return F64_CANONICAL_NAN;
    }
    // generic case or denormalized
    let mut result = ((((val as i16 as i64) << 42) as u64) & 0x81ffffffffffffff)
        .wrapping_add(0x3f00000000000000);
    // normalize denormalized
    if val & 0x7c00 == 0 {
        let mut signexp = result & 0xfff0000000000000;
        result &= 0x000fffffffffffff;
        while result & 0x0010000000000000 == 0 {
            signexp = signexp.wrapping_sub(0x0010000000000000);
            result <<= 1;
        }
        result = signexp.wrapping_add(0x0010000000000000) | (result & 0x000fffffffffffff);
    }
    result
}

// ————————————————————————— Narrowing Conversions —————————————————————————— //

/// Convert a single-precision value to half precision under the given rounding mode,
/// accumulating exception flags into `fcsr`.
pub fn convert_f32_to_f16(val: u32, fcsr: &mut u32, rm: usize) -> u16 {
    // rounding bias to be added below what will be the LSB:
    // sign, future LSB, rounding mode
    const RM_BIAS: [[[u32; 5]; 2]; 2] = [
        [
            [0x0fffffff, 0, 0, 0x1fffffff, 0x10000000],
            [0x10000000, 0, 0, 0x1fffffff, 0x10000000],
        ],
        [
            [0x0fffffff, 0, 0x1fffffff, 0, 0x10000000],
            [0x10000000, 0, 0x1fffffff, 0, 0x10000000],
        ],
    ];

    // values above the threshold (with masked sign) become infinity,
    // unless the rounding mode says otherwise.
    // sign, rounding mode
    const INF_THRESHOLD: [[u32; 5]; 2] = [
        [0x477fefff, 0x477fffff, 0x477fffff, 0x477fe000, 0x477fefff],
        [0x477fefff, 0x477fffff, 0x477fe000, 0x477fffff, 0x477fefff],
    ];

    // the "infinity" value to be used.
    // sign, rounding mode
    const INF_OR_MAX: [[u16; 5]; 2] = [
        [0x7c00, 0x7bff, 0x7bff, 0x7c00, 0x7c00],
        [0xfc00, 0xfbff, 0xfc00, 0xfbff, 0xfc00],
    ];

    // the "zero" value to be used.
    // sign, rounding mode
    const ZERO_OR_ONE: [[u16; 5]; 2] = [
        [0x0000, 0x0000, 0x0000, 0x0001, 0x0000],
        [0x8000, 0x8000, 0x8001, 0x8000, 0x8000],
    ];

    // values below the threshold (with masked sign) become denormalized.
    // sign, rounding mode
    const SUBNORM_THRESHOLD: [[u32; 5]; 2] = [
        [0x387fefff, 0x387fffff, 0x387fffff, 0x387fe000, 0x387fefff],
        [0x387fefff, 0x387fffff, 0x387fe000, 0x387fffff, 0x387fefff],
    ];

    let sign = (val >> 31) as usize;

    // special case: +/- zero
    if val & 0x7fffffff == 0 {
        return (val >> 16) as u16;
    }
    // special case: +/- infinity
    if val & 0x7fffffff == 0x7f800000 {
        return ((val >> 16) & 0xfc00) as u16;
    }
    // special case for NaN
    if val & 0x7f800000 == 0x7f800000 {
        // handle signaling NaN
        if val & 0x00400000 == 0 {
            *fcsr |= fcsr::NV;
        }
        return F16_CANONICAL_NAN;
    }
    // replace too small numbers with +/- 0 or +/- 1
    if val & 0x7f800000 < 0x31800000 {
        *fcsr |= fcsr::UF | fcsr::NX;
        return ZERO_OR_ONE[sign][rm];
    }
    // replace too big numbers with +/- infinity
    if val & 0x7fffffff > INF_THRESHOLD[sign][rm] {
        *fcsr |= fcsr::OF | fcsr::NX;
        return INF_OR_MAX[sign][rm];
    }
    // handle numbers that become denormalized
    if val & 0x7fffffff <= SUBNORM_THRESHOLD[sign][rm] {
        let shiftval = 113 - ((val >> 23) & 0xff);
        let mant = (val & 0x007fffff) | 0x00800000;
        // set inexact flag if needed
        if mant & (0x07ffffff >> (14 - shiftval)) != 0 {
            *fcsr |= fcsr::UF | fcsr::NX;
        }
        let lsb = ((mant >> (13 + shiftval)) & 1) as usize;
        return ((sign as u16) << 15)
            | ((mant.wrapping_add(RM_BIAS[sign][lsb][rm] >> (16 - shiftval))) >> (13 + shiftval))
                as u16;
    }
    // no special case
    if val & 0x1fff != 0 {
        *fcsr |= fcsr::NX;
    }
    let lsb = ((val >> 13) & 1) as usize;
    ((sign as u16) << 15)
        | ((((val & 0x7f800000) - 0x38000000) >> 13)
            .wrapping_add(((val & 0x007fffff).wrapping_add(RM_BIAS[sign][lsb][rm] >> 16)) >> 13))
            as u16
}

/// Convert a double-precision value to half precision under the given rounding mode,
/// accumulating exception flags into `fcsr`.
pub fn convert_f64_to_f16(val: u64, fcsr: &mut u32, rm: usize) -> u16 {
    // rounding bias to be added below what will be the LSB:
    // sign, future LSB, rounding mode
    const RM_BIAS: [[[u64; 5]; 2]; 2] = [
        [
            [0x1ffffffffffffff, 0, 0, 0x3ffffffffffffff, 0x200000000000000],
            [0x200000000000000, 0, 0, 0x3ffffffffffffff, 0x200000000000000],
        ],
        [
            [0x1ffffffffffffff, 0, 0x3ffffffffffffff, 0, 0x200000000000000],
            [0x200000000000000, 0, 0x3ffffffffffffff, 0, 0x200000000000000],
        ],
    ];

    // values above the threshold (with masked sign) become infinity,
    // unless the rounding mode says otherwise.
    // sign, rounding mode
    const INF_THRESHOLD: [[u64; 5]; 2] = [
        [
            0x40effdffffffffff,
            0x40efffffffffffff,
            0x40efffffffffffff,
            0x40effc0000000000,
            0x40effdffffffffff,
        ],
        [
            0x40effdffffffffff,
            0x40efffffffffffff,
            0x40effc0000000000,
            0x40efffffffffffff,
            0x40effdffffffffff,
        ],
    ];

    // the "infinity" value to be used.
    // sign, rounding mode
    const INF_OR_MAX: [[u16; 5]; 2] = [
        [0x7c00, 0x7bff, 0x7bff, 0x7c00, 0x7c00],
        [0xfc00, 0xfbff, 0xfc00, 0xfbff, 0xfc00],
    ];

    // the "zero" value to be used.
    // sign, rounding mode
    const ZERO_OR_ONE: [[u16; 5]; 2] = [
        [0x0000, 0x0000, 0x0000, 0x0001, 0x0000],
        [0x8000, 0x8000, 0x8001, 0x8000, 0x8000],
    ];

    // values below the threshold (with masked sign) become denormalized.
    // sign, rounding mode
    const SUBNORM_THRESHOLD: [[u64; 5]; 2] = [
        [
            0x3f0ffdffffffffff,
            0x3f0fffffffffffff,
            0x3f0fffffffffffff,
            0x3f0ffc0000000000,
            0x3f0ffdffffffffff,
        ],
        [
            0x3f0ffdffffffffff,
            0x3f0fffffffffffff,
            0x3f0ffc0000000000,
            0x3f0fffffffffffff,
            0x3f0ffdffffffffff,
        ],
    ];

    let sign = (val >> 63) as usize;

    // special case: +/- zero
    if val & 0x7fffffffffffffff == 0 {
        return (val >> 48) as u16;
    }
    // special case: +/- infinity
    if val & 0x7fffffffffffffff == 0x7ff0000000000000 {
        return ((val >> 48) & 0xfc00) as u16;
    }
    // special case for NaN
    if val & 0x7ff0000000000000 == 0x7ff0000000000000 {
        // handle signaling NaN
        if val & 0x0008000000000000 == 0 {
            *fcsr |= fcsr::NV;
        }
        return F16_CANONICAL_NAN;
    }
    // replace too small numbers with +/- 0 or +/- 1
    if val & 0x7ff0000000000000 < 0x3e30000000000000 {
        *fcsr |= fcsr::UF | fcsr::NX;
        return ZERO_OR_ONE[sign][rm];
    }
    // replace too big numbers with +/- infinity
    if val & 0x7fffffffffffffff > INF_THRESHOLD[sign][rm] {
        *fcsr |= fcsr::OF | fcsr::NX;
        return INF_OR_MAX[sign][rm];
    }
    // handle numbers that become denormalized
    if val & 0x7fffffffffffffff <= SUBNORM_THRESHOLD[sign][rm] {
        let shiftval = 1009 - ((val >> 52) & 0x7ff);
        let mant = (val & 0x000fffffffffffff) | 0x0010000000000000;
        // set inexact flag if needed
        if mant & (0x00ffffffffffffff >> (14 - shiftval)) != 0 {
            *fcsr |= fcsr::UF | fcsr::NX;
        }
        let lsb = ((mant >> (42 + shiftval)) & 1) as usize;
        return ((sign as u16) << 15)
            | ((mant.wrapping_add(RM_BIAS[sign][lsb][rm] >> (16 - shiftval))) >> (42 + shiftval))
                as u16;
    }
    // no special case
    if val & 0x3ffffffffff != 0 {
        *fcsr |= fcsr::NX;
    }
    let lsb = ((val >> 42) & 1) as usize;
    ((sign as u16) << 15)
        | ((((val & 0x7ff0000000000000) - 0x3f00000000000000) >> 42)
            .wrapping_add(
                ((val & 0x000fffffffffffff).wrapping_add(RM_BIAS[sign][lsb][rm] >> 16)) >> 42,
            )) as u16
}

// ————————————————————————————— Round To Integer ——————————————————————————— //

/// Round a single-precision value to an integral value under the given rounding mode.
///
/// `set_nx` selects between fround (leave NX alone) and froundnx (raise NX when inexact).
pub fn round_f32(val: u32, fcsr: &mut u32, rm: usize, set_nx: bool) -> u32 {
    // rounding bias to be added below what will be the LSB:
    // sign, future LSB, rounding mode
    const RM_BIAS: [[[u32; 5]; 2]; 2] = [
        [
            [0x3fffff, 0x000000, 0x000000, 0x7fffff, 0x400000],
            [0x400000, 0x000000, 0x000000, 0x7fffff, 0x400000],
        ],
        [
            [0x3fffff, 0x000000, 0x7fffff, 0x000000, 0x400000],
            [0x400000, 0x000000, 0x7fffff, 0x000000, 0x400000],
        ],
    ];

    // values >= this (with masked sign) become at least +/- 1
    // sign, rounding mode
    const ONE_THRESHOLD: [[u32; 5]; 2] = [
        [0x3effffff, 0x3f800000, 0x3f800000, 1, 0x3f000000],
        [0x3effffff, 0x3f800000, 1, 0x3f800000, 0x3f000000],
    ];

    // handle +/- zero
    if val & 0x7fffffff == 0 {
        return val;
    }
    // handle NaNs
    if val & 0x7fffffff > 0x7f800000 {
        // check for signaling NaN
        if val & 0x00400000 == 0 {
            *fcsr |= fcsr::NV;
        }
        return F32_CANONICAL_NAN;
    }
    // handle values too big to have a fractional part
    if val & 0x7f800000 >= 0x4b000000 {
        return val;
    }
    // handle values that can only yield 0 or 1
    if val & 0x7fffffff < 0x3f800000 {
        if set_nx {
            *fcsr |= fcsr::NX;
        }
        if val & 0x7f800000 >= ONE_THRESHOLD[(val >> 31) as usize][rm] {
            return (val & 0x80000000) | 0x3f800000;
        }
        return val & 0x80000000;
    }
    // handle all other values
    let sh = ((val & 0x7f800000) >> 23) - 127;
    let mut new_val = (val & 0x7fffff) | 0x800000;
    let lsb = ((new_val >> (23 - sh)) & 1) as usize;
    new_val += RM_BIAS[(val >> 31) as usize][lsb][rm] >> sh;
    new_val &= !(0x7fffff >> sh);
    if new_val >= 0x1000000 {
        new_val >>= 1;
        new_val &= 0x7fffff;
        new_val |= (val & 0x7f800000) + 0x00800000;
    } else {
        new_val &= 0x7fffff;
        new_val |= val & 0x7f800000;
    }
    new_val |= val & 0x80000000;
    if set_nx && new_val != val {
        *fcsr |= fcsr::NX;
    }
    new_val
}

/// Round a double-precision value to an integral value under the given rounding mode.
pub fn round_f64(val: u64, fcsr: &mut u32, rm: usize, set_nx: bool) -> u64 {
    // rounding bias to be added below what will be the LSB:
    // sign, future LSB, rounding mode
    const RM_BIAS: [[[u64; 5]; 2]; 2] = [
        [
            [0x7ffffffffffff, 0, 0, 0xfffffffffffff, 0x8000000000000],
            [0x8000000000000, 0, 0, 0xfffffffffffff, 0x8000000000000],
        ],
        [
            [0x7ffffffffffff, 0, 0xfffffffffffff, 0, 0x8000000000000],
            [0x8000000000000, 0, 0xfffffffffffff, 0, 0x8000000000000],
        ],
    ];

    // values >= this (with masked sign) become at least +/- 1
    // sign, rounding mode
    const ONE_THRESHOLD: [[u64; 5]; 2] = [
        [
            0x3fdfffffffffffff,
            0x3ff0000000000000,
            0x3ff0000000000000,
            1,
            0x3fe0000000000000,
        ],
        [
            0x3fdfffffffffffff,
            0x3ff0000000000000,
            1,
            0x3ff0000000000000,
            0x3fe0000000000000,
        ],
    ];

    // handle +/- zero
    if val & 0x7fffffffffffffff == 0 {
        return val;
    }
    // handle NaNs
    if val & 0x7fffffffffffffff > 0x7ff0000000000000 {
        // check for signaling NaN
        if val & 0x0008000000000000 == 0 {
            *fcsr |= fcsr::NV;
        }
        return F64_CANONICAL_NAN;
    }
    // handle values too big to have a fractional part
    if val & 0x7ff0000000000000 >= 0x4330000000000000 {
        return val;
    }
    // handle values that can only yield 0 or 1
    if val & 0x7fffffffffffffff < 0x3ff0000000000000 {
        if set_nx {
            *fcsr |= fcsr::NX;
        }
        if val & 0x7ff0000000000000 >= ONE_THRESHOLD[(val >> 63) as usize][rm] {
            return (val & 0x8000000000000000) | 0x3ff0000000000000;
        }
        return val & 0x8000000000000000;
    }
    // handle all other values
    let sh = ((val & 0x7ff0000000000000) >> 52) - 1023;
    let mut new_val = (val & 0x000fffffffffffff) | 0x0010000000000000;
    let lsb = ((new_val >> (52 - sh)) & 1) as usize;
    new_val += RM_BIAS[(val >> 63) as usize][lsb][rm] >> sh;
    new_val &= !(0x000fffffffffffff >> sh);
    if new_val >= 0x0020000000000000 {
        new_val >>= 1;
        new_val &= 0x000fffffffffffff;
        new_val |= (val & 0x7ff0000000000000) + 0x0010000000000000;
    } else {
        new_val &= 0x000fffffffffffff;
        new_val |= val & 0x7ff0000000000000;
    }
    new_val |= val & 0x8000000000000000;
    if set_nx && new_val != val {
        *fcsr |= fcsr::NX;
    }
    new_val
}

/// Round a half-precision value to an integral value under the given rounding mode.
pub fn round_f16(val: u16, fcsr: &mut u32, rm: usize, set_nx: bool) -> u16 {
    // rounding bias to be added below what will be the LSB:
    // sign, future LSB, rounding mode
    const RM_BIAS: [[[u16; 5]; 2]; 2] = [
        [
            [0x1ff, 0x000, 0x000, 0x3ff, 0x200],
            [0x200, 0x000, 0x000, 0x3ff, 0x200],
        ],
        [
            [0x1ff, 0x000, 0x3ff, 0x000, 0x200],
            [0x200, 0x000, 0x3ff, 0x000, 0x200],
        ],
    ];

    // values >= this (with masked sign) become at least +/- 1
    // sign, rounding mode
    const ONE_THRESHOLD: [[u16; 5]; 2] = [
        [0x37ff, 0x3c00, 0x3c00, 0x0001, 0x3800],
        [0x37ff, 0x3c00, 0x0001, 0x3c00, 0x3800],
    ];

    // handle +/- zero
    if val & 0x7fff == 0 {
        return val;
    }
    // handle NaNs
    if val & 0x7fff > 0x7c00 {
        // check for signaling NaN
        if val & 0x0200 == 0 {
            *fcsr |= fcsr::NV;
        }
        return F16_CANONICAL_NAN;
    }
    // handle values too big to have a fractional part
    if val & 0x7c00 >= 0x6400 {
        return val;
    }
    // handle values that can only yield 0 or 1
    if val & 0x7fff < 0x3c00 {
        if set_nx {
            *fcsr |= fcsr::NX;
        }
        if val & 0x7fff >= ONE_THRESHOLD[(val >> 15) as usize][rm] {
            return (val & 0x8000) | 0x3c00;
        }
        return val & 0x8000;
    }
    // handle all other values
    let sh = ((val & 0x7c00) >> 10) - 15;
    let mut new_val = (val & 0x3ff) | 0x400;
    let lsb = ((new_val >> (10 - sh)) & 1) as usize;
    new_val += RM_BIAS[(val >> 15) as usize][lsb][rm] >> sh;
    new_val &= !(0x3ff >> sh);
    if new_val >= 0x800 {
        new_val >>= 1;
        new_val &= 0x3ff;
        new_val |= (val & 0x7c00) + 0x0400;
    } else {
        new_val &= 0x3ff;
        new_val |= val & 0x7c00;
    }
    new_val |= val & 0x8000;
    if set_nx && new_val != val {
        *fcsr |= fcsr::NX;
    }
    new_val
}

// ————————————————————————————— Modular Convert ———————————————————————————— //

/// fcvtmod.w.d: convert a double to a signed 32-bit integer, modulo 2^31 in magnitude.
///
/// Overflow raises NV but the truncated value is still produced, with its low 31 bits
/// preserved; dropped fractional bits raise NX.
pub fn fcvtmod_f64(val: u64, fcsr: &mut u32) -> i32 {
    let sign = val >> 63 != 0;
    let val = val & 0x7fffffffffffffff;

    // handle +/- zero
    if val == 0 {
        return 0;
    }

    let exp = ((val >> 52) & 0x7ff) as i32 - 1023;
    // handle values that become zero
    if exp < 0 {
        *fcsr |= fcsr::NX;
        return 0;
    }
    // handle overflow
    if exp > 31 {
        *fcsr |= fcsr::NV;
    }
    // handle values so big that all relevant lower bits are 0
    if exp > 52 + 31 {
        return 0;
    }

    let mut mant = (val & 0x000fffffffffffff) | 0x0010000000000000;

    // handle all other values
    if exp >= 52 {
        mant <<= exp - 52;
    } else {
        if mant & (0x000fffffffffffff >> exp) != 0 {
            *fcsr |= fcsr::NX;
        }
        mant >>= 52 - exp;
    }
    let mant = (mant & 0x7fffffff) as i32;
    if sign {
        mant.wrapping_neg()
    } else {
        mant
    }
}

// ————————————————————————————— NaN Classification ————————————————————————— //

/// If either operand is a NaN, return the canonical NaN and raise NV for each signaling NaN.
pub fn f16_nan_result(rs1: u16, rs2: u16, fcsr: &mut u32) -> Option<u16> {
    let mut nan = None;
    if rs1 & 0x7fff > 0x7c00 {
        nan = Some(F16_CANONICAL_NAN);
        if rs1 & 0x0200 == 0 {
            *fcsr |= fcsr::NV;
        }
    }
    if rs2 & 0x7fff > 0x7c00 {
        nan = Some(F16_CANONICAL_NAN);
        if rs2 & 0x0200 == 0 {
            *fcsr |= fcsr::NV;
        }
    }
    nan
}

/// If either operand is a NaN, return the canonical NaN and raise NV for each signaling NaN.
pub fn f32_nan_result(rs1: u32, rs2: u32, fcsr: &mut u32) -> Option<u32> {
    let mut nan = None;
    if rs1 & 0x7fffffff > 0x7f800000 {
        nan = Some(F32_CANONICAL_NAN);
        if rs1 & 0x00400000 == 0 {
            *fcsr |= fcsr::NV;
        }
    }
    if rs2 & 0x7fffffff > 0x7f800000 {
        nan = Some(F32_CANONICAL_NAN);
        if rs2 & 0x00400000 == 0 {
            *fcsr |= fcsr::NV;
        }
    }
    nan
}

/// If either operand is a NaN, return the canonical NaN and raise NV for each signaling NaN.
pub fn f64_nan_result(rs1: u64, rs2: u64, fcsr: &mut u32) -> Option<u64> {
    let mut nan = None;
    if rs1 & 0x7fffffffffffffff > 0x7ff0000000000000 {
        nan = Some(F64_CANONICAL_NAN);
        if rs1 & 0x0008000000000000 == 0 {
            *fcsr |= fcsr::NV;
        }
    }
    if rs2 & 0x7fffffffffffffff > 0x7ff0000000000000 {
        nan = Some(F64_CANONICAL_NAN);
        if rs2 & 0x0008000000000000 == 0 {
            *fcsr |= fcsr::NV;
        }
    }
    nan
}

// ———————————————————————————— Sign-Magnitude Order ———————————————————————— //
// The min/max and compare emulation orders the raw encodings: an unsigned compare, with the
// direction flipped when a sign bit is involved. Equal values (including +0 vs -0) need an
// explicit case, the flip trick alone would call them unordered.

/// fminm/fmaxm selector: true when rs1 sorts strictly below rs2.
pub fn f16_sorts_below(rs1: u16, rs2: u16) -> bool {
    (rs1 < rs2) != ((rs1 | rs2) >> 15 != 0)
}

pub fn f32_sorts_below(rs1: u32, rs2: u32) -> bool {
    (rs1 < rs2) != ((rs1 | rs2) >> 31 != 0)
}

pub fn f64_sorts_below(rs1: u64, rs2: u64) -> bool {
    (rs1 < rs2) != ((rs1 | rs2) >> 63 != 0)
}

/// Quiet less-than on half-precision encodings (operands must not be NaN).
pub fn f16_lt(rs1: u16, rs2: u16) -> bool {
    if rs1 == rs2 || (rs1 | rs2) & 0x7fff == 0 {
        return false;
    }
    f16_sorts_below(rs1, rs2)
}

/// Quiet less-or-equal on half-precision encodings (operands must not be NaN).
pub fn f16_le(rs1: u16, rs2: u16) -> bool {
    rs1 == rs2 || (rs1 | rs2) & 0x7fff == 0 || f16_sorts_below(rs1, rs2)
}

/// Quiet less-than on single-precision encodings (operands must not be NaN).
pub fn f32_lt(rs1: u32, rs2: u32) -> bool {
    if rs1 == rs2 || (rs1 | rs2) & 0x7fffffff == 0 {
        return false;
    }
    f32_sorts_below(rs1, rs2)
}

/// Quiet less-or-equal on single-precision encodings (operands must not be NaN).
pub fn f32_le(rs1: u32, rs2: u32) -> bool {
    rs1 == rs2 || (rs1 | rs2) & 0x7fffffff == 0 || f32_sorts_below(rs1, rs2)
}

/// Quiet less-than on double-precision encodings (operands must not be NaN).
pub fn f64_lt(rs1: u64, rs2: u64) -> bool {
    if rs1 == rs2 || (rs1 | rs2) & 0x7fffffffffffffff == 0 {
        return false;
    }
    f64_sorts_below(rs1, rs2)
}

/// Quiet less-or-equal on double-precision encodings (operands must not be NaN).
pub fn f64_le(rs1: u64, rs2: u64) -> bool {
    rs1 == rs2 || (rs1 | rs2) & 0x7fffffffffffffff == 0 || f64_sorts_below(rs1, rs2)
}

// ————————————————————————— Load-Immediate Tables —————————————————————————— //

/// The 32 half-precision constants loadable with fli.h, indexed by the rs1 field.
pub const F16_IMM_LUT: [u16; 32] = [
    0xbc00, 0x0400, 0x0100, 0x0200, 0x1c00, 0x2000, 0x2c00, 0x3000, 0x3400, 0x3500, 0x3600,
    0x3700, 0x3800, 0x3900, 0x3a00, 0x3b00, 0x3c00, 0x3d00, 0x3e00, 0x3f00, 0x4000, 0x4100,
    0x4200, 0x4400, 0x4800, 0x4c00, 0x5800, 0x5c00, 0x7800, 0x7c00, 0x7c00, 0x7e00,
];

/// The 32 single-precision constants loadable with fli.s, indexed by the rs1 field.
pub const F32_IMM_LUT: [u32; 32] = [
    0xbf800000, 0x00800000, 0x37800000, 0x38000000, 0x3b800000, 0x3c000000, 0x3d800000,
    0x3e000000, 0x3e800000, 0x3ea00000, 0x3ec00000, 0x3ee00000, 0x3f000000, 0x3f200000,
    0x3f400000, 0x3f600000, 0x3f800000, 0x3fa00000, 0x3fc00000, 0x3fe00000, 0x40000000,
    0x40200000, 0x40400000, 0x40800000, 0x41000000, 0x41800000, 0x43000000, 0x43800000,
    0x47000000, 0x47800000, 0x7f800000, 0x7fc00000,
];

/// The 32 double-precision constants loadable with fli.d, indexed by the rs1 field.
pub const F64_IMM_LUT: [u64; 32] = [
    0xbc00000000000000,
    0x0010000000000000,
    0x3ef0000000000000,
    0x3f00000000000000,
    0x3f70000000000000,
    0x3f80000000000000,
    0x3fb0000000000000,
    0x3fc0000000000000,
    0x3fd0000000000000,
    0x3fd4000000000000,
    0x3fd8000000000000,
    0x3fdc000000000000,
    0x3fe0000000000000,
    0x3fe4000000000000,
    0x3fe8000000000000,
    0x3fec000000000000,
    0x3ff0000000000000,
    0x3ff4000000000000,
    0x3ff8000000000000,
    0x3ffc000000000000,
    0x4000000000000000,
    0x4004000000000000,
    0x4008000000000000,
    0x4010000000000000,
    0x4020000000000000,
    0x4030000000000000,
    0x4060000000000000,
    0x4070000000000000,
    0x40e0000000000000,
    0x40f0000000000000,
    0x7ff0000000000000,
    0x7ff8000000000000,
];

// ————————————————————————————————— Tests —————————————————————————————————— //
