//! A cycle-counted interpreter for the SM83, the 8-bit CPU of the original Game Boy.
//!
//! The crate covers instruction fetch, decode and execute over the full main opcode page
//! and the 0xCB-prefixed rotate/shift/bit page, with per-instruction m-cycle accounting
//! including taken-branch surcharges. Memory is reached exclusively through the narrow
//! [`bus::Bus`] contract a host supplies; everything outside the CPU's byte-level view
//! (cartridge, video, timers, interrupt delivery) belongs to that host.
//!
//! [`snapshot::Snapshot`] and the `set_state` / `compare_state` methods on [`cpu::Cpu`]
//! form the harness surface the per-opcode conformance corpus runs against.

pub mod bus;
pub mod cpu;
pub mod snapshot;

pub use bus::{Bus, FlatBus};
pub use cpu::Cpu;
pub use snapshot::Snapshot;
