// rat.rs - Register Alias Table for register renaming
//
// Maps each architectural register to the ROB entry that will produce its
// next value, or to the architectural register file when no producer is in
// flight. Snapshots of the whole table are taken at branch issue and
// restored on misprediction.

use crate::simulator::registers::NUM_REGISTERS;
use serde::Serialize;

/// Where the current value of a register lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RatEntry {
    /// The architectural register file is authoritative.
    Architectural,
    /// The ROB entry with this id will produce the value.
    Rob(usize),
}

pub type RatSnapshot = [RatEntry; NUM_REGISTERS];

#[derive(Debug, Clone)]
pub struct RegisterAliasTable {
    pub entries: RatSnapshot,
}

impl Default for RegisterAliasTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterAliasTable {
    pub fn new() -> Self {
        Self {
            entries: [RatEntry::Architectural; NUM_REGISTERS],
        }
    }

    /// R0 is never renamed, so it always reads as architectural.
    pub fn read(&self, reg: usize) -> RatEntry {
        if reg == 0 || reg >= NUM_REGISTERS {
            RatEntry::Architectural
        } else {
            self.entries[reg]
        }
    }

    pub fn rename(&mut self, reg: usize, rob_id: usize) {
        if reg != 0 && reg < NUM_REGISTERS {
            self.entries[reg] = RatEntry::Rob(rob_id);
        }
    }

    /// Commit-time cleanup: drop the mapping only if it still points at the
    /// committing ROB entry, so a younger in-flight producer is preserved.
    pub fn clear_if_points_to(&mut self, reg: usize, rob_id: usize) {
        if reg < NUM_REGISTERS && self.entries[reg] == RatEntry::Rob(rob_id) {
            self.entries[reg] = RatEntry::Architectural;
        }
    }

    pub fn clear(&mut self, reg: usize) {
        if reg < NUM_REGISTERS {
            self.entries[reg] = RatEntry::Architectural;
        }
    }

    pub fn snapshot(&self) -> RatSnapshot {
        self.entries
    }

    pub fn restore(&mut self, snapshot: &RatSnapshot) {
        self.entries = *snapshot;
    }

    pub fn reset(&mut self) {
        self.entries = [RatEntry::Architectural; NUM_REGISTERS];
    }
}
