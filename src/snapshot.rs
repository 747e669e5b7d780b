//! Register + memory snapshots, the unit of exchange with the conformance harness.
//!
//! The serde field names match the per-opcode test corpus JSON, so a `{pc, sp, a, …,
//! ram: [[addr, byte], …]}` object deserializes straight into a [`Snapshot`]. Unknown
//! fields in the corpus (interrupt state, cycle traces) are ignored.

use serde::{Deserialize, Serialize};

use crate::bus::Bus;
use crate::cpu::register_file::R8;
use crate::cpu::Cpu;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub pc: u16,
    pub sp: u16,
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub f: u8,
    pub h: u8,
    pub l: u8,
    /// `(address, byte)` pairs. On load each pair is written through the bus; on
    /// compare each address is read back through the bus.
    #[serde(default)]
    pub ram: Vec<(u16, u8)>,
}

impl<B: Bus> Cpu<B> {
    /// Load every register, then write each memory pair through the bus.
    ///
    /// The flag byte goes through the masking write path, so a snapshot can never
    /// smuggle a dirty low nibble into F.
    pub fn set_state(&mut self, snapshot: &Snapshot) {
        self.regs.pc = snapshot.pc;
        self.regs.sp = snapshot.sp;
        self.regs.set_a(snapshot.a);
        self.regs.set_f(snapshot.f);
        self.regs.set_r8(R8::B, snapshot.b);
        self.regs.set_r8(R8::C, snapshot.c);
        self.regs.set_r8(R8::D, snapshot.d);
        self.regs.set_r8(R8::E, snapshot.e);
        self.regs.set_r8(R8::H, snapshot.h);
        self.regs.set_r8(R8::L, snapshot.l);
        for &(addr, byte) in &snapshot.ram {
            self.bus.write(addr, byte);
        }
    }

    /// True iff all registers equal the snapshot's values and every memory pair reads
    /// back identically through the bus.
    pub fn compare_state(&mut self, snapshot: &Snapshot) -> bool {
        self.regs.pc == snapshot.pc
            && self.regs.sp == snapshot.sp
            && self.regs.a() == snapshot.a
            && self.regs.f() == snapshot.f
            && self.regs.r8(R8::B) == snapshot.b
            && self.regs.r8(R8::C) == snapshot.c
            && self.regs.r8(R8::D) == snapshot.d
            && self.regs.r8(R8::E) == snapshot.e
            && self.regs.r8(R8::H) == snapshot.h
            && self.regs.r8(R8::L) == snapshot.l
            && snapshot
                .ram
                .iter()
                .all(|&(addr, byte)| self.bus.read(addr) == byte)
    }

    /// The current CPU state, with memory re-sampled at the given snapshot's addresses.
    ///
    /// Used to dump the actual state next to the expected one when a conformance case
    /// fails.
    pub fn state_for_debug(&mut self, snapshot: &Snapshot) -> Snapshot {
        Snapshot {
            pc: self.regs.pc,
            sp: self.regs.sp,
            a: self.regs.a(),
            b: self.regs.r8(R8::B),
            c: self.regs.r8(R8::C),
            d: self.regs.r8(R8::D),
            e: self.regs.r8(R8::E),
            f: self.regs.f(),
            h: self.regs.r8(R8::H),
            l: self.regs.r8(R8::L),
            ram: snapshot
                .ram
                .iter()
                .map(|&(addr, _)| (addr, self.bus.read(addr)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Snapshot;
    use crate::bus::{Bus, FlatBus};
    use crate::cpu::Cpu;

    fn sample() -> Snapshot {
        Snapshot {
            pc: 0x0100,
            sp: 0xFFFE,
            a: 0x01,
            b: 0x00,
            c: 0x13,
            d: 0x00,
            e: 0xD8,
            f: 0xB0,
            h: 0x01,
            l: 0x4D,
            ram: vec![(0x0100, 0x00), (0xC000, 0xAB)],
        }
    }

    #[test]
    fn set_then_compare_round_trips() {
        let mut cpu = Cpu::new(FlatBus::new());
        let snapshot = sample();
        cpu.set_state(&snapshot);
        assert!(cpu.compare_state(&snapshot));
    }

    #[test]
    fn compare_notices_register_and_memory_drift() {
        let mut cpu = Cpu::new(FlatBus::new());
        let snapshot = sample();
        cpu.set_state(&snapshot);

        let mut wrong = snapshot.clone();
        wrong.a = 0x02;
        assert!(!cpu.compare_state(&wrong));

        let mut wrong = snapshot.clone();
        wrong.ram[1] = (0xC000, 0xAC);
        assert!(!cpu.compare_state(&wrong));
    }

    #[test]
    fn state_for_debug_resamples_the_listed_addresses() {
        let mut cpu = Cpu::new(FlatBus::new());
        let snapshot = sample();
        cpu.set_state(&snapshot);
        cpu.bus.write(0xC000, 0xEE);

        let actual = cpu.state_for_debug(&snapshot);
        assert_eq!(actual.pc, snapshot.pc);
        assert_eq!(actual.ram, vec![(0x0100, 0x00), (0xC000, 0xEE)]);
    }

    #[test]
    fn loading_masks_the_flag_low_nibble() {
        let mut cpu = Cpu::new(FlatBus::new());
        let mut snapshot = sample();
        snapshot.f = 0xBF;
        cpu.set_state(&snapshot);
        assert_eq!(cpu.regs.f(), 0xB0);
    }

    #[test]
    fn snapshot_deserializes_from_corpus_json() {
        let json = r#"{
            "pc": 512, "sp": 65534,
            "a": 15, "b": 1, "c": 2, "d": 3, "e": 4, "f": 176, "h": 5, "l": 6,
            "ime": 0,
            "ram": [[512, 128], [49152, 171]]
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).expect("corpus-shaped JSON");
        assert_eq!(snapshot.pc, 0x0200);
        assert_eq!(snapshot.f, 0xB0);
        assert_eq!(snapshot.ram, vec![(0x0200, 0x80), (0xC000, 0xAB)]);
    }
}
