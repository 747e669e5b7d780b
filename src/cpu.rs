pub mod alu;
pub mod cycles;
pub mod decode;
pub mod register_file;

use log::trace;

use crate::bus::Bus;
use cycles::{CB_M_CYCLES, M_CYCLES};
use decode::{decode, decode_cb, AluOp, CbOp, Cond, Op, R8Slot, R16Mem, RotOp};
use register_file::{Flag, Registers, R8};

/// The bytes of the instruction currently being executed.
///
/// `imm1` and `imm2` are the bytes after the opcode, read unconditionally at fetch time.
/// Operations that take fewer operand bytes simply ignore the rest.
#[derive(Debug, Clone, Copy, Default)]
struct Instruction {
    opcode: u8,
    imm1: u8,
    imm2: u8,
}

impl Instruction {
    fn imm16(self) -> u16 {
        u16::from_le_bytes([self.imm1, self.imm2])
    }
}

/// A cycle-counted SM83 interpreter over a byte-level [`Bus`].
///
/// The CPU owns its bus for the lifetime of the core; a `step` therefore has exclusive
/// access to memory and every bus operation happens in program order.
pub struct Cpu<B: Bus> {
    pub regs: Registers,
    pub bus: B,
    instr: Instruction,
    m_cycles: u8,
}

impl<B: Bus> Cpu<B> {
    pub fn new(bus: B) -> Self {
        Cpu {
            regs: Registers::new(),
            bus,
            instr: Instruction::default(),
            m_cycles: 0,
        }
    }

    /// Fetch, decode and execute a single instruction.
    ///
    /// Returns the number of m-cycles the instruction consumed, with the taken-branch
    /// surcharge included, or `None` if the opcode byte is one of the eleven encodings
    /// the SM83 never assigned.
    ///
    /// The opcode and both potential immediate bytes are always read, even for
    /// zero-operand instructions; hosts with side-effecting mapped reads see exactly
    /// these three fetch reads plus whatever the instruction itself does.
    pub fn step(&mut self) -> Option<u8> {
        let pc = self.regs.pc;
        self.instr = Instruction {
            opcode: self.bus.read(pc),
            imm1: self.bus.read(pc.wrapping_add(1)),
            imm2: self.bus.read(pc.wrapping_add(2)),
        };
        self.regs.pc = pc.wrapping_add(1);
        self.trace_state(pc);

        let op = decode(self.instr.opcode);
        if op == Op::Illegal {
            return None;
        }
        self.m_cycles = if op == Op::Prefix {
            CB_M_CYCLES[self.instr.imm1 as usize]
        } else {
            M_CYCLES[self.instr.opcode as usize]
        };
        self.exec(op);
        Some(self.m_cycles)
    }

    /// Emit the per-step state line (Gameboy-Doctor shape) through the `log` facade.
    ///
    /// Built entirely from the register file and the just-fetched instruction record, so
    /// enabling tracing never changes the set of bus reads the host observes.
    fn trace_state(&self, pc: u16) {
        trace!(
            "A:{:02X} F:{:02X} B:{:02X} C:{:02X} D:{:02X} E:{:02X} H:{:02X} L:{:02X} SP:{:04X} PC:{:04X} PCMEM:{:02X},{:02X},{:02X}",
            self.regs.a(),
            self.regs.f(),
            self.regs.r8(R8::B),
            self.regs.r8(R8::C),
            self.regs.r8(R8::D),
            self.regs.r8(R8::E),
            self.regs.r8(R8::H),
            self.regs.r8(R8::L),
            self.regs.sp,
            pc,
            self.instr.opcode,
            self.instr.imm1,
            self.instr.imm2,
        );
    }

    fn exec(&mut self, op: Op) {
        match op {
            Op::Nop => {}
            // Low-power states and interrupt enable latching are host concerns; the
            // architectural registers are left untouched here.
            Op::Stop | Op::Halt | Op::Di | Op::Ei => {}

            Op::LdR16Imm(r) => {
                let word = self.instr.imm16();
                self.regs.set_r16(r, word);
                self.advance(2);
            }
            Op::LdIndR16A(m) => {
                let addr = self.regs.r16(m.r16());
                let a = self.regs.a();
                self.bus.write(addr, a);
                self.post_modify(m);
            }
            Op::LdAIndR16(m) => {
                let addr = self.regs.r16(m.r16());
                let val = self.bus.read(addr);
                self.regs.set_a(val);
                self.post_modify(m);
            }
            Op::LdIndImmSp => {
                let addr = self.instr.imm16();
                let [lo, hi] = self.regs.sp.to_le_bytes();
                self.bus.write(addr, lo);
                self.bus.write(addr.wrapping_add(1), hi);
                self.advance(2);
            }

            Op::IncR16(r) => {
                let word = self.regs.r16(r).wrapping_add(1);
                self.regs.set_r16(r, word);
            }
            Op::DecR16(r) => {
                let word = self.regs.r16(r).wrapping_sub(1);
                self.regs.set_r16(r, word);
            }
            Op::AddHlR16(r) => {
                let (result, h, c) = alu::add16(self.regs.hl(), self.regs.r16(r));
                self.regs.set_hl(result);
                let z = self.regs.flag(Flag::Z);
                self.regs.set_znhc(z, false, h, c);
            }

            Op::IncR8(slot) => {
                let x = self.read_slot(slot);
                let (result, flags) = alu::inc(x, self.regs.flag(Flag::C));
                self.write_slot(slot, result);
                self.apply(flags);
            }
            Op::DecR8(slot) => {
                let x = self.read_slot(slot);
                let (result, flags) = alu::dec(x, self.regs.flag(Flag::C));
                self.write_slot(slot, result);
                self.apply(flags);
            }
            Op::LdR8Imm(slot) => {
                let val = self.instr.imm1;
                self.write_slot(slot, val);
                self.advance(1);
            }

            Op::Rlca => self.rotate_a(alu::rlc(self.regs.a())),
            Op::Rrca => self.rotate_a(alu::rrc(self.regs.a())),
            Op::Rla => self.rotate_a(alu::rl(self.regs.a(), self.regs.flag(Flag::C))),
            Op::Rra => self.rotate_a(alu::rr(self.regs.a(), self.regs.flag(Flag::C))),

            Op::Daa => {
                let (result, flags) = alu::daa(
                    self.regs.a(),
                    self.regs.flag(Flag::N),
                    self.regs.flag(Flag::H),
                    self.regs.flag(Flag::C),
                );
                self.regs.set_a(result);
                self.apply(flags);
            }
            Op::Cpl => {
                let a = !self.regs.a();
                self.regs.set_a(a);
                let (z, c) = (self.regs.flag(Flag::Z), self.regs.flag(Flag::C));
                self.regs.set_znhc(z, true, true, c);
            }
            Op::Scf => {
                let z = self.regs.flag(Flag::Z);
                self.regs.set_znhc(z, false, false, true);
            }
            Op::Ccf => {
                let (z, c) = (self.regs.flag(Flag::Z), self.regs.flag(Flag::C));
                self.regs.set_znhc(z, false, false, !c);
            }

            Op::Jr => {
                self.advance(1);
                self.relative_jump();
            }
            Op::JrCond(cc) => {
                self.advance(1);
                if self.cond(cc) {
                    self.m_cycles += 1;
                    self.relative_jump();
                }
            }

            Op::LdR8R8 { dst, src } => {
                let val = self.read_slot(src);
                self.write_slot(dst, val);
            }
            Op::Alu(op, slot) => {
                let rhs = self.read_slot(slot);
                self.alu_a(op, rhs);
            }
            Op::AluImm(op) => {
                let rhs = self.instr.imm1;
                self.advance(1);
                self.alu_a(op, rhs);
            }

            Op::RetCond(cc) => {
                if self.cond(cc) {
                    self.m_cycles += 3;
                    self.regs.pc = self.pop_word();
                }
            }
            Op::Ret | Op::Reti => {
                self.regs.pc = self.pop_word();
            }
            Op::Pop(r) => {
                let word = self.pop_word();
                self.regs.set_r16(r.r16(), word);
            }
            Op::Push(r) => {
                let word = self.regs.r16(r.r16());
                self.push_word(word);
            }

            Op::Jp => {
                self.regs.pc = self.instr.imm16();
            }
            Op::JpCond(cc) => {
                self.advance(2);
                if self.cond(cc) {
                    self.m_cycles += 1;
                    self.regs.pc = self.instr.imm16();
                }
            }
            Op::JpHl => {
                self.regs.pc = self.regs.hl();
            }

            Op::Call => {
                self.advance(2);
                let ret = self.regs.pc;
                self.push_word(ret);
                self.regs.pc = self.instr.imm16();
            }
            Op::CallCond(cc) => {
                self.advance(2);
                if self.cond(cc) {
                    self.m_cycles += 3;
                    let ret = self.regs.pc;
                    self.push_word(ret);
                    self.regs.pc = self.instr.imm16();
                }
            }
            Op::Rst(vector) => {
                let ret = self.regs.pc;
                self.push_word(ret);
                self.regs.pc = vector;
            }

            Op::Prefix => {
                let b = self.instr.imm1;
                self.advance(1);
                self.exec_cb(decode_cb(b));
            }

            Op::LdhIndImmA => {
                let addr = 0xFF00 | self.instr.imm1 as u16;
                self.advance(1);
                let a = self.regs.a();
                self.bus.write(addr, a);
            }
            Op::LdhAIndImm => {
                let addr = 0xFF00 | self.instr.imm1 as u16;
                self.advance(1);
                let val = self.bus.read(addr);
                self.regs.set_a(val);
            }
            Op::LdhIndCA => {
                let addr = 0xFF00 | self.regs.r8(R8::C) as u16;
                let a = self.regs.a();
                self.bus.write(addr, a);
            }
            Op::LdhAIndC => {
                let addr = 0xFF00 | self.regs.r8(R8::C) as u16;
                let val = self.bus.read(addr);
                self.regs.set_a(val);
            }
            Op::LdIndImmA => {
                let addr = self.instr.imm16();
                self.advance(2);
                let a = self.regs.a();
                self.bus.write(addr, a);
            }
            Op::LdAIndImm => {
                let addr = self.instr.imm16();
                self.advance(2);
                let val = self.bus.read(addr);
                self.regs.set_a(val);
            }

            Op::AddSpImm => {
                let (result, flags) = alu::add_sp(self.regs.sp, self.instr.imm1);
                self.advance(1);
                self.regs.sp = result;
                self.apply(flags);
            }
            Op::LdHlSpImm => {
                let (result, flags) = alu::add_sp(self.regs.sp, self.instr.imm1);
                self.advance(1);
                self.regs.set_hl(result);
                self.apply(flags);
            }
            Op::LdSpHl => {
                self.regs.sp = self.regs.hl();
            }

            // Filtered out in `step` before dispatch.
            Op::Illegal => unreachable!(),
        }
    }

    fn exec_cb(&mut self, op: CbOp) {
        match op {
            CbOp::Rot(rot, slot) => {
                let x = self.read_slot(slot);
                let carry = self.regs.flag(Flag::C);
                let (result, flags) = match rot {
                    RotOp::Rlc => alu::rlc(x),
                    RotOp::Rrc => alu::rrc(x),
                    RotOp::Rl => alu::rl(x, carry),
                    RotOp::Rr => alu::rr(x, carry),
                    RotOp::Sla => alu::sla(x),
                    RotOp::Sra => alu::sra(x),
                    RotOp::Swap => alu::swap(x),
                    RotOp::Srl => alu::srl(x),
                };
                self.write_slot(slot, result);
                self.apply(flags);
            }
            CbOp::Bit(n, slot) => {
                let x = self.read_slot(slot);
                let flags = alu::bit(n, x, self.regs.flag(Flag::C));
                self.apply(flags);
            }
            CbOp::Res(n, slot) => {
                let x = self.read_slot(slot);
                self.write_slot(slot, x & !(1 << n));
            }
            CbOp::Set(n, slot) => {
                let x = self.read_slot(slot);
                self.write_slot(slot, x | 1 << n);
            }
        }
    }

    /// Run one of the eight-way accumulator operations and commit result and flags.
    fn alu_a(&mut self, op: AluOp, rhs: u8) {
        let a = self.regs.a();
        let carry = self.regs.flag(Flag::C);
        let (result, flags) = match op {
            AluOp::Add => alu::add(a, rhs, false),
            AluOp::Adc => alu::add(a, rhs, carry),
            AluOp::Sub => alu::sub(a, rhs, false),
            AluOp::Sbc => alu::sub(a, rhs, carry),
            AluOp::And => alu::and(a, rhs),
            AluOp::Xor => alu::xor(a, rhs),
            AluOp::Or => alu::or(a, rhs),
            // CP discards the result.
            AluOp::Cp => {
                let (_, flags) = alu::sub(a, rhs, false);
                (a, flags)
            }
        };
        self.regs.set_a(result);
        self.apply(flags);
    }

    /// The accumulator rotates force Z clear.
    fn rotate_a(&mut self, rotated: (u8, alu::Flags)) {
        let (result, mut flags) = rotated;
        flags.z = false;
        self.regs.set_a(result);
        self.apply(flags);
    }

    /// Read the 8-bit operand slot; index 6 goes through the bus at HL.
    fn read_slot(&mut self, slot: R8Slot) -> u8 {
        match slot.reg() {
            Some(r) => self.regs.r8(r),
            None => self.bus.read(self.regs.hl()),
        }
    }

    /// Write the 8-bit operand slot; index 6 goes through the bus at HL.
    fn write_slot(&mut self, slot: R8Slot, val: u8) {
        match slot.reg() {
            Some(r) => self.regs.set_r8(r, val),
            None => {
                let hl = self.regs.hl();
                self.bus.write(hl, val);
            }
        }
    }

    fn apply(&mut self, flags: alu::Flags) {
        self.regs.set_znhc(flags.z, flags.n, flags.h, flags.c);
    }

    /// Consume `n` operand bytes.
    fn advance(&mut self, n: u16) {
        self.regs.pc = self.regs.pc.wrapping_add(n);
    }

    /// Displace PC by the sign-extended first immediate. PC already points past the
    /// operand, so the target is relative to the following instruction.
    fn relative_jump(&mut self) {
        let offset = self.instr.imm1 as i8;
        self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
    }

    fn cond(&self, cc: Cond) -> bool {
        match cc {
            Cond::NZ => !self.regs.flag(Flag::Z),
            Cond::Z => self.regs.flag(Flag::Z),
            Cond::NC => !self.regs.flag(Flag::C),
            Cond::C => self.regs.flag(Flag::C),
        }
    }

    fn post_modify(&mut self, m: R16Mem) {
        match m {
            R16Mem::HlInc => {
                let hl = self.regs.hl().wrapping_add(1);
                self.regs.set_hl(hl);
            }
            R16Mem::HlDec => {
                let hl = self.regs.hl().wrapping_sub(1);
                self.regs.set_hl(hl);
            }
            R16Mem::BC | R16Mem::DE => {}
        }
    }

    /// Push a word: high byte at SP-1, low byte at SP-2, then SP moves down by two.
    fn push_word(&mut self, word: u16) {
        let [lo, hi] = word.to_le_bytes();
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.bus.write(self.regs.sp, hi);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.bus.write(self.regs.sp, lo);
    }

    /// Pop a word: low byte at SP, high byte at SP+1, then SP moves up by two.
    fn pop_word(&mut self) -> u16 {
        let lo = self.bus.read(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = self.bus.read(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        u16::from_le_bytes([lo, hi])
    }
}
