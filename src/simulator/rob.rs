// rob.rs - Reorder Buffer
//
// A fixed-capacity circular queue that retires instructions in program
// order. Issue allocates at the tail, commit pops the head, and a
// misprediction flush frees every entry younger than the offending branch
// and pulls the tail back to it.

use serde::Serialize;

pub const ROB_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RobKind {
    /// Writes a register at commit.
    Register,
    /// Writes memory at commit.
    Store,
    /// No architectural effect at commit.
    Branch,
}

#[derive(Debug, Clone, Serialize)]
pub struct RobEntry {
    pub busy: bool,
    pub kind: RobKind,
    /// Destination register for Register entries.
    pub dest: Option<usize>,
    /// Byte address for Store entries, filled once the store is staged.
    pub address: Option<i64>,
    pub value: i32,
    pub ready: bool,
    pub speculative: bool,
    pub instr_index: usize,
    /// Issue sequence number; the age order of in-flight entries.
    pub seq: u64,
}

impl RobEntry {
    fn empty() -> Self {
        Self {
            busy: false,
            kind: RobKind::Register,
            dest: None,
            address: None,
            value: 0,
            ready: false,
            speculative: false,
            instr_index: 0,
            seq: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReorderBuffer {
    pub entries: Vec<RobEntry>,
    pub head: usize,
    pub tail: usize,
    pub len: usize,
}

impl Default for ReorderBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReorderBuffer {
    pub fn new() -> Self {
        Self {
            entries: vec![RobEntry::empty(); ROB_SIZE],
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    pub fn can_issue(&self) -> bool {
        self.len < ROB_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn occupancy(&self) -> usize {
        self.len
    }

    pub fn entry(&self, rob_id: usize) -> &RobEntry {
        &self.entries[rob_id]
    }

    /// Place a new entry at the tail. The caller must check `can_issue`
    /// first; allocating into a full buffer is a programming error.
    pub fn allocate(
        &mut self,
        kind: RobKind,
        dest: Option<usize>,
        speculative: bool,
        instr_index: usize,
        seq: u64,
    ) -> usize {
        debug_assert!(self.can_issue(), "ROB allocate on a full buffer");
        let rob_id = self.tail;
        self.entries[rob_id] = RobEntry {
            busy: true,
            kind,
            dest,
            address: None,
            value: 0,
            ready: false,
            speculative,
            instr_index,
            seq,
        };
        self.tail = (self.tail + 1) % ROB_SIZE;
        self.len += 1;
        rob_id
    }

    /// Record a result. Idempotent within a cycle: marking an already-ready
    /// entry simply overwrites the same value.
    pub fn mark_ready(&mut self, rob_id: usize, value: i32) {
        let entry = &mut self.entries[rob_id];
        if entry.busy {
            entry.value = value;
            entry.ready = true;
        }
    }

    pub fn set_store_address(&mut self, rob_id: usize, address: i64) {
        let entry = &mut self.entries[rob_id];
        if entry.busy {
            entry.address = Some(address);
        }
    }

    pub fn head_ready(&self) -> Option<usize> {
        let entry = &self.entries[self.head];
        if self.len > 0 && entry.busy && entry.ready {
            Some(self.head)
        } else {
            None
        }
    }

    /// Pop the head entry. The caller applies the architectural side effect.
    pub fn commit_head(&mut self) -> RobEntry {
        let entry = self.entries[self.head].clone();
        self.entries[self.head].busy = false;
        self.entries[self.head].ready = false;
        self.head = (self.head + 1) % ROB_SIZE;
        self.len -= 1;
        entry
    }

    /// Free every entry strictly younger than `branch_seq` and pull the tail
    /// back to one past the branch. Returns the (rob_id, instr_index) pairs
    /// of the dropped entries, oldest first.
    pub fn flush_younger_than(&mut self, branch_seq: u64) -> Vec<(usize, usize)> {
        let mut kept = 0;
        for pos in 0..self.len {
            let idx = (self.head + pos) % ROB_SIZE;
            if self.entries[idx].seq > branch_seq {
                break;
            }
            kept += 1;
        }

        let mut dropped = Vec::new();
        for pos in kept..self.len {
            let idx = (self.head + pos) % ROB_SIZE;
            dropped.push((idx, self.entries[idx].instr_index));
            self.entries[idx].busy = false;
            self.entries[idx].ready = false;
            self.entries[idx].speculative = false;
        }
        self.len = kept;
        self.tail = (self.head + kept) % ROB_SIZE;
        dropped
    }

    /// Clear the speculative flag on entries no older than the resolved
    /// branch, up to and including the next checkpointed branch (or all
    /// remaining entries when `threshold` is None).
    pub fn promote(&mut self, threshold: Option<u64>) {
        let limit = threshold.unwrap_or(u64::MAX);
        for pos in 0..self.len {
            let idx = (self.head + pos) % ROB_SIZE;
            if self.entries[idx].seq <= limit {
                self.entries[idx].speculative = false;
            }
        }
    }

    /// Busy entries in program order, oldest first.
    pub fn iter_in_order(&self) -> impl Iterator<Item = (usize, &RobEntry)> {
        (0..self.len).map(move |pos| {
            let idx = (self.head + pos) % ROB_SIZE;
            (idx, &self.entries[idx])
        })
    }

    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            *entry = RobEntry::empty();
        }
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }
}
