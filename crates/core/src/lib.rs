//! Borealis core definitions
//!
//! This crate purpose is to hold core types and constants definitions for use by other crates.
//! In particular, this crate does not hold any code, this is important as not all code is
//! portable, but some of the definitions here can be used in lots of different contexts (such as
//! in Borealis itself, from test harnesses or external tooling).

#![no_std]

// —————————————————————————— Instruction Encodings ————————————————————————— //

/// Match/mask pairs for the instructions Borealis emulates.
///
/// All values follow the ratified RISC-V encodings. The masks come in a few flavors:
/// R-type masks keep funct7/funct3/opcode, I-type masks additionally pin the rs2/imm field,
/// and the compressed masks keep the funct6 bits plus whatever immediate bits the
/// instruction nails down.
pub mod insn {
    /// R-type mask: funct7 + funct3 + opcode.
    pub const MASK_RTYPE: usize = 0xfe00707f;
    /// I-type mask: imm12 + funct3 + opcode (rd and rs1 free).
    pub const MASK_ITYPE: usize = 0xfff0707f;
    /// Mask for 6-bit shift amount immediates (RV64 OP-IMM shifts).
    pub const MASK_SHAMT6: usize = 0xfc00707f;
    /// On RV64 the immediate Zbs/Zbb shifts tolerate bit 25 as shamt[5].
    pub const SHAMT_BIT_5: usize = 0x02000000;

    // Zbs, immediate form (OP-IMM)
    pub const MATCH_BCLRI: usize = 0x48001013;
    pub const MATCH_BEXTI: usize = 0x48005013;
    pub const MATCH_BINVI: usize = 0x68001013;
    pub const MATCH_BSETI: usize = 0x28001013;

    // Zbs, register form (OP)
    pub const MATCH_BCLR: usize = 0x48001033;
    pub const MATCH_BEXT: usize = 0x48005033;
    pub const MATCH_BINV: usize = 0x68001033;
    pub const MATCH_BSET: usize = 0x28001033;

    // Zbb (OP-IMM)
    pub const MATCH_RORI: usize = 0x60005013;
    pub const MATCH_CLZ: usize = 0x60001013;
    pub const MATCH_CTZ: usize = 0x60101013;
    pub const MATCH_CPOP: usize = 0x60201013;
    pub const MATCH_ORC_B: usize = 0x28705013;
    pub const MATCH_REV8: usize = 0x6b805013;
    pub const MATCH_SEXT_B: usize = 0x60401013;
    pub const MATCH_SEXT_H: usize = 0x60501013;

    // Zbb (OP)
    pub const MATCH_ANDN: usize = 0x40007033;
    pub const MATCH_ORN: usize = 0x40006033;
    pub const MATCH_XNOR: usize = 0x40004033;
    pub const MATCH_MAX: usize = 0x0a006033;
    pub const MATCH_MAXU: usize = 0x0a007033;
    pub const MATCH_MIN: usize = 0x0a004033;
    pub const MATCH_MINU: usize = 0x0a005033;
    pub const MATCH_ROL: usize = 0x60001033;
    pub const MATCH_ROR: usize = 0x60005033;
    pub const MATCH_ZEXT_H: usize = 0x0800403b;

    // Zbb (OP-32 / OP-IMM-32)
    pub const MATCH_ROLW: usize = 0x6000103b;
    pub const MATCH_RORW: usize = 0x6000503b;
    pub const MATCH_RORIW: usize = 0x6000501b;
    pub const MATCH_CLZW: usize = 0x6000101b;
    pub const MATCH_CTZW: usize = 0x6010101b;
    pub const MATCH_CPOPW: usize = 0x6020101b;

    // Zba
    pub const MATCH_SH1ADD: usize = 0x20002033;
    pub const MATCH_SH2ADD: usize = 0x20004033;
    pub const MATCH_SH3ADD: usize = 0x20006033;
    pub const MATCH_ADD_UW: usize = 0x0800003b;
    pub const MATCH_SH1ADD_UW: usize = 0x2000203b;
    pub const MATCH_SH2ADD_UW: usize = 0x2000403b;
    pub const MATCH_SH3ADD_UW: usize = 0x2000603b;
    pub const MATCH_SLLI_UW: usize = 0x0800101b;

    // Zbc
    pub const MATCH_CLMUL: usize = 0x0a001033;
    pub const MATCH_CLMULH: usize = 0x0a003033;
    pub const MATCH_CLMULR: usize = 0x0a002033;

    // Zicond
    pub const MATCH_CZERO_EQZ: usize = 0x0e005033;
    pub const MATCH_CZERO_NEZ: usize = 0x0e007033;

    // MISC-MEM
    pub const MASK_FENCE: usize = 0x0000707f;
    pub const MATCH_FENCE: usize = 0x0000000f;
    pub const MASK_FENCE_I: usize = 0x0000707f;
    pub const MATCH_FENCE_I: usize = 0x0000100f;
    pub const MASK_FENCE_TSO: usize = 0xfff0707f;
    pub const MATCH_FENCE_TSO: usize = 0x8330000f;

    // Zicbom / Zicboz (MISC-MEM, funct3 = 010)
    pub const MASK_CBO: usize = 0xfff07fff;
    pub const MATCH_CBO_INVAL: usize = 0x0000200f;
    pub const MATCH_CBO_CLEAN: usize = 0x0010200f;
    pub const MATCH_CBO_FLUSH: usize = 0x0020200f;
    pub const MATCH_CBO_ZERO: usize = 0x0040200f;

    // Zawrs (exact 32-bit encodings)
    pub const MATCH_WRS_NTO: usize = 0x00d00073;
    pub const MATCH_WRS_STO: usize = 0x01d00073;

    // Zimop
    pub const MASK_MOP_R_N: usize = 0xb3c0707f;
    pub const MATCH_MOP_R_N: usize = 0x81c04073;
    pub const MASK_MOP_RR_N: usize = 0xb200707f;
    pub const MATCH_MOP_RR_N: usize = 0x82004073;

    // Zfhmin
    pub const MASK_FP_LOAD_STORE: usize = 0x0000707f;
    pub const MATCH_FLH: usize = 0x00001007;
    pub const MATCH_FSH: usize = 0x00001027;
    pub const MATCH_FCVT_S_H: usize = 0x44200053;
    pub const MATCH_FCVT_H_S: usize = 0x44000053;
    pub const MATCH_FCVT_D_H: usize = 0x42200053;
    pub const MATCH_FCVT_H_D: usize = 0x44100053;
    pub const MATCH_FMV_X_H: usize = 0xe4000053;
    pub const MATCH_FMV_H_X: usize = 0xf4000053;

    // Zfa
    pub const MATCH_FLI_H: usize = 0xf4100053;
    pub const MATCH_FLI_S: usize = 0xf0100053;
    pub const MATCH_FLI_D: usize = 0xf2100053;
    pub const MATCH_FROUND_H: usize = 0x44400053;
    pub const MATCH_FROUNDNX_H: usize = 0x44500053;
    pub const MATCH_FROUND_S: usize = 0x40400053;
    pub const MATCH_FROUNDNX_S: usize = 0x40500053;
    pub const MATCH_FROUND_D: usize = 0x42400053;
    pub const MATCH_FROUNDNX_D: usize = 0x42500053;
    pub const MATCH_FCVTMOD_W_D: usize = 0xc2801053;
    pub const MATCH_FMINM_H: usize = 0x2c002053;
    pub const MATCH_FMAXM_H: usize = 0x2c003053;
    pub const MATCH_FMINM_S: usize = 0x28002053;
    pub const MATCH_FMAXM_S: usize = 0x28003053;
    pub const MATCH_FMINM_D: usize = 0x2a002053;
    pub const MATCH_FMAXM_D: usize = 0x2a003053;
    pub const MATCH_FLEQ_H: usize = 0xa4004053;
    pub const MATCH_FLTQ_H: usize = 0xa4005053;
    pub const MATCH_FLEQ_S: usize = 0xa0004053;
    pub const MATCH_FLTQ_S: usize = 0xa0005053;
    pub const MATCH_FLEQ_D: usize = 0xa2004053;
    pub const MATCH_FLTQ_D: usize = 0xa2005053;

    // Zvbb unary operations (OP-V, the VXUNARY0 group: vs1 selects the operation)
    pub const MASK_VXUNARY0: usize = 0xfc0ff07f;
    pub const MATCH_VBREV8_V: usize = 0x48042057;
    pub const MATCH_VREV8_V: usize = 0x4804a057;
    pub const MATCH_VBREV_V: usize = 0x48052057;
    pub const MATCH_VCLZ_V: usize = 0x48062057;
    pub const MATCH_VCTZ_V: usize = 0x4806a057;
    pub const MATCH_VCPOP_V: usize = 0x48072057;

    // Zvbb binary operations (funct6 + funct3 + opcode)
    pub const MASK_VBINARY0: usize = 0xfc00707f;
    pub const MATCH_VANDN_VV: usize = 0x04000057;
    pub const MATCH_VANDN_VX: usize = 0x04004057;
    pub const MATCH_VROL_VV: usize = 0x54000057;
    pub const MATCH_VROL_VX: usize = 0x54004057;
    pub const MATCH_VROR_VV: usize = 0x50000057;
    pub const MATCH_VROR_VX: usize = 0x50004057;
    pub const MATCH_VROR_VI: usize = 0x50003057;
    /// vror.vi keeps imm[5] in instruction bit 26.
    pub const VROR_VI_IMM_5: usize = 0x04000000;
    pub const MATCH_VWSLL_VV: usize = 0xd4000057;
    pub const MATCH_VWSLL_VX: usize = 0xd4004057;
    pub const MATCH_VWSLL_VI: usize = 0xd4003057;

    // Zcb (reserved quadrant-0 slot, funct6 + fixed uimm bits)
    /// Compressed mask keeping funct6 and the op quadrant, uimm bits free.
    pub const MASK_C_FUNCT6: usize = 0xfc03;
    /// Compressed mask keeping funct6, both uimm bits and the quadrant.
    pub const MASK_C_RXS_RXS: usize = 0xfc63;
    /// Compressed mask freeing only the rs1'/rd' field.
    pub const MASK_C_RXS: usize = 0xfc7f;
    pub const MATCH_C_LBU: usize = 0x8000;
    pub const MATCH_C_LHU: usize = 0x8400;
    pub const MATCH_C_LH: usize = 0x8440;
    pub const MATCH_C_SB: usize = 0x8800;
    pub const MATCH_C_SH: usize = 0x8c00;

    // Zcb (quadrant-1 misc ALU slot)
    pub const MATCH_C_ZEXT_B: usize = 0x9c61;
    pub const MATCH_C_SEXT_B: usize = 0x9c65;
    pub const MATCH_C_ZEXT_H: usize = 0x9c69;
    pub const MATCH_C_SEXT_H: usize = 0x9c6d;
    pub const MATCH_C_ZEXT_W: usize = 0x9c71;
    pub const MATCH_C_NOT: usize = 0x9c75;
    pub const MATCH_C_MUL: usize = 0x9c41;

    // Zcmop
    pub const MASK_C_MOP_N: usize = 0xf8ff;
    pub const MATCH_C_MOP_N: usize = 0x6081;

    // Base halfword loads/stores, re-decoded by the misaligned access handler
    pub const MATCH_LH: usize = 0x00001003;
    pub const MATCH_LHU: usize = 0x00005003;
    pub const MATCH_SH: usize = 0x00001023;
}

// ——————————————————————————————— CSR Numbers —————————————————————————————— //

/// CSR addresses, as found in the instruction encoding.
pub mod csr {
    pub const FCSR: usize = 0x003;
    pub const SSTATUS: usize = 0x100;
    pub const STVEC: usize = 0x105;
    pub const SENVCFG: usize = 0x10a;
    pub const SEPC: usize = 0x141;
    pub const SCAUSE: usize = 0x142;
    pub const STVAL: usize = 0x143;
    pub const MENVCFG: usize = 0x30a;
    pub const CYCLE: usize = 0xc00;
    pub const TIME: usize = 0xc01;
    pub const VL: usize = 0xc20;
    pub const VTYPE: usize = 0xc21;
}
