// load_store_buffer.rs - Load/Store Buffer
//
// Memory operations are held here from issue until the load broadcasts its
// value (loads) or the store commits (stores). Memory is kept hazard-free
// by program order: a load may not access memory while any older store has
// an unresolved address or targets the same word.

use crate::errors::SimulatorError;
use crate::simulator::instruction::Instruction;
use crate::simulator::memory::DataMemory;
use crate::simulator::reservation_station::Operand;
use serde::Serialize;

pub const LSB_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MemOp {
    Load,
    Store,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadStoreEntry {
    pub id: usize,
    pub busy: bool,
    pub op: MemOp,
    pub instruction: Option<Instruction>,
    /// Base register operand; the address waits on it.
    pub base: Operand,
    pub offset: i32,
    /// Effective byte address, computed once the base is available.
    pub address: Option<i64>,
    /// Store data operand; None for loads.
    pub data: Option<Operand>,
    pub rob_id: usize,
    pub seq: u64,
    pub exec_remaining: Option<u32>,
    /// Memory access (load) or staging (store) finished this cycle.
    pub writable: bool,
    /// Store has reported to the ROB and now waits for commit.
    pub staged: bool,
    pub speculative: bool,
}

impl LoadStoreEntry {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            busy: false,
            op: MemOp::Load,
            instruction: None,
            base: Operand::Ready(0),
            offset: 0,
            address: None,
            data: None,
            rob_id: 0,
            seq: 0,
            exec_remaining: None,
            writable: false,
            staged: false,
            speculative: false,
        }
    }

    pub fn reset(&mut self) {
        let id = self.id;
        *self = Self::new(id);
    }

    fn data_ready(&self) -> bool {
        match &self.data {
            Some(operand) => operand.is_ready(),
            None => true,
        }
    }

    /// Ready to begin its memory access / staging, ignoring ordering rules.
    fn operands_complete(&self) -> bool {
        self.busy
            && !self.writable
            && !self.staged
            && self.exec_remaining.is_none()
            && self.address.is_some()
            && self.data_ready()
    }
}

#[derive(Debug, Clone)]
pub struct LoadStoreBuffer {
    pub entries: Vec<LoadStoreEntry>,
}

impl Default for LoadStoreBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadStoreBuffer {
    pub fn new() -> Self {
        let entries = (0..LSB_SIZE).map(LoadStoreEntry::new).collect();
        Self { entries }
    }

    pub fn has_free(&self) -> bool {
        self.entries.iter().any(|e| !e.busy)
    }

    pub fn busy_count(&self) -> usize {
        self.entries.iter().filter(|e| e.busy).count()
    }

    pub fn issue(
        &mut self,
        instruction: Instruction,
        op: MemOp,
        base: Operand,
        offset: i32,
        data: Option<Operand>,
        rob_id: usize,
        seq: u64,
        speculative: bool,
    ) -> Option<usize> {
        for entry in &mut self.entries {
            if !entry.busy {
                entry.busy = true;
                entry.op = op;
                entry.instruction = Some(instruction);
                entry.base = base;
                entry.offset = offset;
                entry.address = None;
                entry.data = data;
                entry.rob_id = rob_id;
                entry.seq = seq;
                entry.exec_remaining = None;
                entry.writable = false;
                entry.staged = false;
                entry.speculative = speculative;
                return Some(entry.id);
            }
        }
        None
    }

    pub fn snoop(&mut self, rob_id: usize, value: i32) {
        for entry in &mut self.entries {
            if entry.busy {
                entry.base.snoop(rob_id, value);
                if let Some(data) = &mut entry.data {
                    data.snoop(rob_id, value);
                }
            }
        }
    }

    /// Compute effective addresses for entries whose base register arrived.
    /// An address outside memory is fatal to the simulation.
    pub fn compute_addresses(&mut self, memory: &DataMemory) -> Result<(), SimulatorError> {
        for entry in &mut self.entries {
            if entry.busy && entry.address.is_none() {
                if let Some(base) = entry.base.value() {
                    let address = base as i64 + entry.offset as i64;
                    memory.word_index(address)?;
                    entry.address = Some(address);
                }
            }
        }
        Ok(())
    }

    /// True when an older store blocks this load: unresolved address, or a
    /// resolved address on the same word.
    fn load_blocked(&self, load_seq: u64, load_address: i64) -> bool {
        self.entries.iter().any(|e| {
            e.busy
                && e.op == MemOp::Store
                && e.seq < load_seq
                && match e.address {
                    None => true,
                    Some(address) => address / 4 == load_address / 4,
                }
        })
    }

    fn can_start(&self, entry: &LoadStoreEntry) -> bool {
        if !entry.operands_complete() {
            return false;
        }
        match entry.op {
            MemOp::Load => match entry.address {
                Some(address) => !self.load_blocked(entry.seq, address),
                None => false,
            },
            MemOp::Store => true,
        }
    }

    /// Begin the memory access of one eligible entry, oldest first.
    pub fn dispatch_one(&mut self) -> Option<(usize, usize, MemOp)> {
        let candidate = self
            .entries
            .iter()
            .filter(|e| self.can_start(e))
            .min_by_key(|e| e.seq)
            .map(|e| e.id);
        if let Some(id) = candidate {
            self.start(id)
        } else {
            None
        }
    }

    /// Arm the latency counter of a specific entry if it may start now.
    /// Used at issue so an operation with no outstanding operands begins
    /// executing the cycle it was issued.
    pub fn try_start(&mut self, id: usize) -> Option<(usize, usize, MemOp)> {
        if self.can_start(&self.entries[id]) {
            self.start(id)
        } else {
            None
        }
    }

    fn start(&mut self, id: usize) -> Option<(usize, usize, MemOp)> {
        let entry = &mut self.entries[id];
        let latency = entry.instruction.map(|i| i.op.latency()).unwrap_or(1);
        entry.exec_remaining = Some(latency);
        let instr_index = entry.instruction.map(|i| i.index).unwrap_or(0);
        Some((id, instr_index, entry.op))
    }

    pub fn advance_executing(&mut self) {
        for entry in &mut self.entries {
            if let Some(remaining) = entry.exec_remaining {
                if remaining > 0 {
                    let left = remaining - 1;
                    entry.exec_remaining = Some(left);
                    if left == 0 {
                        entry.writable = true;
                    }
                }
            }
        }
    }

    /// Collect finished memory operations. Loads read memory, are freed and
    /// returned as CDB broadcasts (rob_id, value, instr_index). Stores move
    /// to the staged state and are returned as
    /// (rob_id, value, address, instr_index) for the ROB to record.
    #[allow(clippy::type_complexity)]
    pub fn drain_writable(
        &mut self,
        memory: &DataMemory,
    ) -> Result<(Vec<(usize, i32, usize)>, Vec<(usize, i32, i64, usize)>), SimulatorError> {
        let mut loads = Vec::new();
        let mut stores = Vec::new();
        for entry in &mut self.entries {
            if !(entry.busy && entry.writable) {
                continue;
            }
            let instr_index = entry.instruction.map(|i| i.index).unwrap_or(0);
            match entry.op {
                MemOp::Load => {
                    if let Some(address) = entry.address {
                        let value = memory.read_word(address)?;
                        loads.push((entry.rob_id, value, instr_index));
                    }
                    entry.reset();
                },
                MemOp::Store => {
                    if let (Some(address), Some(data)) = (entry.address, &entry.data) {
                        let value = data.value().unwrap_or(0);
                        stores.push((entry.rob_id, value, address, instr_index));
                    }
                    entry.writable = false;
                    entry.staged = true;
                },
            }
        }
        Ok((loads, stores))
    }

    /// A store leaves the buffer only when its ROB entry commits.
    pub fn free_store(&mut self, rob_id: usize) {
        for entry in &mut self.entries {
            if entry.busy && entry.op == MemOp::Store && entry.rob_id == rob_id {
                entry.reset();
            }
        }
    }

    pub fn flush_younger_than(&mut self, branch_seq: u64) {
        for entry in &mut self.entries {
            if entry.busy && entry.seq > branch_seq {
                entry.reset();
            }
        }
    }

    pub fn promote(&mut self, threshold: Option<u64>) {
        let limit = threshold.unwrap_or(u64::MAX);
        for entry in &mut self.entries {
            if entry.busy && entry.seq <= limit {
                entry.speculative = false;
            }
        }
    }

    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.reset();
        }
    }
}
