//! Opcode decoding.
//!
//! The SM83 encoding is block-structured: the top two bits of the opcode select a block,
//! and small bit fields inside the block select registers, conditions and operations.
//! `decode` maps a main-page opcode to a tagged [`Op`]; `decode_cb` maps the byte after
//! the 0xCB prefix to a [`CbOp`]. Both are total pure functions, so a malformed register
//! select is unrepresentable: every 3-bit field lands in an 8-variant enum.

use super::register_file::{R16, R8};

/// Target of the 3-bit r8 field. Index 6 is the byte at (HL), a first-class slot rather
/// than a special case at each use site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum R8Slot {
    B,
    C,
    D,
    E,
    H,
    L,
    IndHl,
    A,
}

impl R8Slot {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => R8Slot::B,
            1 => R8Slot::C,
            2 => R8Slot::D,
            3 => R8Slot::E,
            4 => R8Slot::H,
            5 => R8Slot::L,
            6 => R8Slot::IndHl,
            7 => R8Slot::A,
            _ => unreachable!(),
        }
    }

    /// The plain register behind this slot, or `None` for the (HL) indirection.
    pub fn reg(self) -> Option<R8> {
        match self {
            R8Slot::B => Some(R8::B),
            R8Slot::C => Some(R8::C),
            R8Slot::D => Some(R8::D),
            R8Slot::E => Some(R8::E),
            R8Slot::H => Some(R8::H),
            R8Slot::L => Some(R8::L),
            R8Slot::A => Some(R8::A),
            R8Slot::IndHl => None,
        }
    }
}

/// The r16 group used by block-00 loads/arithmetic: {BC, DE, HL, SP}.
fn r16_from_bits(bits: u8) -> R16 {
    match bits & 0x03 {
        0 => R16::BC,
        1 => R16::DE,
        2 => R16::HL,
        _ => R16::SP,
    }
}

/// The r16stk group used by PUSH/POP: AF takes SP's slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum R16Stk {
    BC,
    DE,
    HL,
    AF,
}

impl R16Stk {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => R16Stk::BC,
            1 => R16Stk::DE,
            2 => R16Stk::HL,
            _ => R16Stk::AF,
        }
    }

    pub fn r16(self) -> R16 {
        match self {
            R16Stk::BC => R16::BC,
            R16Stk::DE => R16::DE,
            R16Stk::HL => R16::HL,
            R16Stk::AF => R16::AF,
        }
    }
}

/// The r16mem group used by block-00 indirect accumulator loads: indices 2 and 3 both
/// address through HL, with post-increment and post-decrement respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum R16Mem {
    BC,
    DE,
    HlInc,
    HlDec,
}

impl R16Mem {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => R16Mem::BC,
            1 => R16Mem::DE,
            2 => R16Mem::HlInc,
            _ => R16Mem::HlDec,
        }
    }

    /// The pair the address comes from, before any post-modification.
    pub fn r16(self) -> R16 {
        match self {
            R16Mem::BC => R16::BC,
            R16Mem::DE => R16::DE,
            R16Mem::HlInc | R16Mem::HlDec => R16::HL,
        }
    }
}

/// Branch condition, from bits 4..3 of the opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    NZ,
    Z,
    NC,
    C,
}

impl Cond {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Cond::NZ,
            1 => Cond::Z,
            2 => Cond::NC,
            _ => Cond::C,
        }
    }
}

/// The eight-way accumulator ALU selector of blocks 10 and 11.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

impl AluOp {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => AluOp::Add,
            1 => AluOp::Adc,
            2 => AluOp::Sub,
            3 => AluOp::Sbc,
            4 => AluOp::And,
            5 => AluOp::Xor,
            6 => AluOp::Or,
            _ => AluOp::Cp,
        }
    }
}

/// The rotate/shift family of the CB page's top quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
}

impl RotOp {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => RotOp::Rlc,
            1 => RotOp::Rrc,
            2 => RotOp::Rl,
            3 => RotOp::Rr,
            4 => RotOp::Sla,
            5 => RotOp::Sra,
            6 => RotOp::Swap,
            _ => RotOp::Srl,
        }
    }
}

/// A decoded main-page operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Nop,
    Stop,
    Halt,
    Di,
    Ei,
    /// LD r16,imm16
    LdR16Imm(R16),
    /// LD (r16mem),A
    LdIndR16A(R16Mem),
    /// LD A,(r16mem)
    LdAIndR16(R16Mem),
    /// LD (imm16),SP
    LdIndImmSp,
    IncR16(R16),
    DecR16(R16),
    AddHlR16(R16),
    IncR8(R8Slot),
    DecR8(R8Slot),
    /// LD r8,imm8; slot 6 is LD (HL),imm8
    LdR8Imm(R8Slot),
    Rlca,
    Rrca,
    Rla,
    Rra,
    Daa,
    Cpl,
    Scf,
    Ccf,
    /// JR imm8
    Jr,
    JrCond(Cond),
    /// LD r8,r8. The (HL),(HL) encoding is HALT and never reaches this variant.
    LdR8R8 { dst: R8Slot, src: R8Slot },
    /// Eight-way ALU on A against an r8 slot
    Alu(AluOp, R8Slot),
    /// Eight-way ALU on A against imm8
    AluImm(AluOp),
    RetCond(Cond),
    Ret,
    Reti,
    Pop(R16Stk),
    Push(R16Stk),
    JpCond(Cond),
    Jp,
    JpHl,
    CallCond(Cond),
    Call,
    /// RST: the vector address, `opcode & 0x38`
    Rst(u16),
    /// 0xCB; the next byte selects a [`CbOp`]
    Prefix,
    /// LDH (imm8),A
    LdhIndImmA,
    /// LDH A,(imm8)
    LdhAIndImm,
    /// LDH (C),A
    LdhIndCA,
    /// LDH A,(C)
    LdhAIndC,
    /// LD (imm16),A
    LdIndImmA,
    /// LD A,(imm16)
    LdAIndImm,
    /// ADD SP,imm8 (signed)
    AddSpImm,
    /// LD HL,SP+imm8 (signed)
    LdHlSpImm,
    LdSpHl,
    /// One of the eleven unused encodings
    Illegal,
}

/// A decoded CB-page operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CbOp {
    Rot(RotOp, R8Slot),
    Bit(u8, R8Slot),
    Res(u8, R8Slot),
    Set(u8, R8Slot),
}

pub fn decode(opcode: u8) -> Op {
    match opcode >> 6 {
        0b00 => decode_block0(opcode),
        0b01 if opcode == 0x76 => Op::Halt,
        0b01 => Op::LdR8R8 {
            dst: R8Slot::from_bits(opcode >> 3),
            src: R8Slot::from_bits(opcode),
        },
        0b10 => Op::Alu(AluOp::from_bits(opcode >> 3), R8Slot::from_bits(opcode)),
        _ => decode_block3(opcode),
    }
}

fn decode_block0(op: u8) -> Op {
    match op {
        0x00 => Op::Nop,
        0x08 => Op::LdIndImmSp,
        0x10 => Op::Stop,
        0x18 => Op::Jr,
        0x20 | 0x28 | 0x30 | 0x38 => Op::JrCond(Cond::from_bits(op >> 3)),
        _ => match op & 0x0F {
            0x01 => Op::LdR16Imm(r16_from_bits(op >> 4)),
            0x02 => Op::LdIndR16A(R16Mem::from_bits(op >> 4)),
            0x03 => Op::IncR16(r16_from_bits(op >> 4)),
            0x09 => Op::AddHlR16(r16_from_bits(op >> 4)),
            0x0A => Op::LdAIndR16(R16Mem::from_bits(op >> 4)),
            0x0B => Op::DecR16(r16_from_bits(op >> 4)),
            _ => match op & 0x07 {
                0x04 => Op::IncR8(R8Slot::from_bits(op >> 3)),
                0x05 => Op::DecR8(R8Slot::from_bits(op >> 3)),
                0x06 => Op::LdR8Imm(R8Slot::from_bits(op >> 3)),
                0x07 => match (op >> 3) & 0x07 {
                    0 => Op::Rlca,
                    1 => Op::Rrca,
                    2 => Op::Rla,
                    3 => Op::Rra,
                    4 => Op::Daa,
                    5 => Op::Cpl,
                    6 => Op::Scf,
                    _ => Op::Ccf,
                },
                // Columns 0..=3 of block 00 are fully claimed by the arms above.
                _ => unreachable!(),
            },
        },
    }
}

fn decode_block3(op: u8) -> Op {
    match op {
        0xC0 | 0xC8 | 0xD0 | 0xD8 => Op::RetCond(Cond::from_bits(op >> 3)),
        0xC1 | 0xD1 | 0xE1 | 0xF1 => Op::Pop(R16Stk::from_bits(op >> 4)),
        0xC2 | 0xCA | 0xD2 | 0xDA => Op::JpCond(Cond::from_bits(op >> 3)),
        0xC3 => Op::Jp,
        0xC4 | 0xCC | 0xD4 | 0xDC => Op::CallCond(Cond::from_bits(op >> 3)),
        0xC5 | 0xD5 | 0xE5 | 0xF5 => Op::Push(R16Stk::from_bits(op >> 4)),
        0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
            Op::AluImm(AluOp::from_bits(op >> 3))
        }
        0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => Op::Rst((op & 0x38) as u16),
        0xC9 => Op::Ret,
        0xCB => Op::Prefix,
        0xCD => Op::Call,
        0xD9 => Op::Reti,
        0xE0 => Op::LdhIndImmA,
        0xE2 => Op::LdhIndCA,
        0xE8 => Op::AddSpImm,
        0xE9 => Op::JpHl,
        0xEA => Op::LdIndImmA,
        0xF0 => Op::LdhAIndImm,
        0xF2 => Op::LdhAIndC,
        0xF3 => Op::Di,
        0xF8 => Op::LdHlSpImm,
        0xF9 => Op::LdSpHl,
        0xFA => Op::LdAIndImm,
        0xFB => Op::Ei,
        _ => Op::Illegal,
    }
}

pub fn decode_cb(b: u8) -> CbOp {
    let target = R8Slot::from_bits(b);
    let n = (b >> 3) & 0x07;
    match b >> 6 {
        0b00 => CbOp::Rot(RotOp::from_bits(n), target),
        0b01 => CbOp::Bit(n, target),
        0b10 => CbOp::Res(n, target),
        _ => CbOp::Set(n, target),
    }
}

/// The eleven opcode bytes with no assigned encoding.
pub const ILLEGAL_OPCODES: [u8; 11] = [
    0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD,
];
