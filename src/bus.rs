use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

/// Byte-level view of the 16-bit address space, supplied by the host.
///
/// The CPU performs every memory effect through this trait and holds no mirror copy.
/// All addresses in 0x0000..=0xFFFF must be serviced; `read` must always return a defined
/// byte. Reads take `&mut self` because memory-mapped I/O reads have side effects on real
/// implementations, which is why the CPU's fetch reads are part of its observable contract.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, val: u8);
}

/// A 64 KiB flat memory with no mapping.
///
/// This is the bus the conformance harness and the unit tests run against: every address
/// is plain RAM and reads back exactly what was written.
#[derive(Clone, Serialize, Deserialize)]
pub struct FlatBus {
    #[serde(with = "BigArray")]
    mem: [u8; 0x10000],
}

impl FlatBus {
    pub fn new() -> Self {
        FlatBus { mem: [0; 0x10000] }
    }
}

impl Default for FlatBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for FlatBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.mem[addr as usize]
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.mem[addr as usize] = val;
    }
}

#[cfg(test)]
mod tests {
    use super::{Bus, FlatBus};

    #[test]
    fn flat_bus_reads_back_writes() {
        let mut bus = FlatBus::new();
        assert_eq!(bus.read(0x0000), 0);
        assert_eq!(bus.read(0xFFFF), 0);
        bus.write(0xC123, 0xAB);
        assert_eq!(bus.read(0xC123), 0xAB);
    }
}
