// reservation_station.rs - Reservation stations for arithmetic and branches
//
// Each issued ADD/SUB/MUL/DIV/BEQ occupies one station until its result is
// broadcast on the CDB (or, for branches, until the branch resolves). A
// station either holds an operand value or waits on the ROB entry that will
// produce it.

use crate::simulator::instruction::{Instruction, Operation};
use serde::Serialize;

pub const NUM_STATIONS: usize = 8;

/// A source operand: either a captured value or a tag naming the ROB entry
/// that will produce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operand {
    Ready(i32),
    Waiting(usize),
}

impl Operand {
    pub fn is_ready(&self) -> bool {
        matches!(self, Operand::Ready(_))
    }

    pub fn value(&self) -> Option<i32> {
        match self {
            Operand::Ready(value) => Some(*value),
            Operand::Waiting(_) => None,
        }
    }

    pub fn tag(&self) -> Option<usize> {
        match self {
            Operand::Ready(_) => None,
            Operand::Waiting(rob_id) => Some(*rob_id),
        }
    }

    /// Capture a broadcast value if this operand waits on `rob_id`.
    pub fn snoop(&mut self, rob_id: usize, value: i32) {
        if *self == Operand::Waiting(rob_id) {
            *self = Operand::Ready(value);
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReservationStation {
    pub id: usize,
    pub busy: bool,
    pub instruction: Option<Instruction>,
    pub j: Operand,
    pub k: Operand,
    pub rob_id: usize,
    pub seq: u64,
    /// Cycles of latency left; None until the station is dispatched.
    pub exec_remaining: Option<u32>,
    /// Execution finished; the result is ready for the CDB.
    pub writable: bool,
    pub speculative: bool,
}

impl ReservationStation {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            busy: false,
            instruction: None,
            j: Operand::Ready(0),
            k: Operand::Ready(0),
            rob_id: 0,
            seq: 0,
            exec_remaining: None,
            writable: false,
            speculative: false,
        }
    }

    pub fn reset(&mut self) {
        self.busy = false;
        self.instruction = None;
        self.j = Operand::Ready(0);
        self.k = Operand::Ready(0);
        self.rob_id = 0;
        self.seq = 0;
        self.exec_remaining = None;
        self.writable = false;
        self.speculative = false;
    }

    /// Eligible for dispatch: both operands captured, not yet executing.
    pub fn is_ready(&self) -> bool {
        self.busy
            && !self.writable
            && self.exec_remaining.is_none()
            && self.j.is_ready()
            && self.k.is_ready()
    }

    fn result(&self) -> i32 {
        let vj = self.j.value().unwrap_or(0);
        let vk = self.k.value().unwrap_or(0);
        match self.instruction.map(|i| i.op) {
            Some(Operation::Add { .. }) => vj.wrapping_add(vk),
            Some(Operation::Sub { .. }) => vj.wrapping_sub(vk),
            Some(Operation::Mul { .. }) => vj.wrapping_mul(vk),
            Some(Operation::Div { .. }) => {
                // Integer division by zero is masked: the result is 0
                if vk == 0 {
                    0
                } else {
                    vj.wrapping_div(vk)
                }
            },
            _ => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReservationStations {
    pub stations: Vec<ReservationStation>,
}

impl Default for ReservationStations {
    fn default() -> Self {
        Self::new()
    }
}

impl ReservationStations {
    pub fn new() -> Self {
        let stations = (0..NUM_STATIONS).map(ReservationStation::new).collect();
        Self { stations }
    }

    pub fn has_free(&self) -> bool {
        self.stations.iter().any(|s| !s.busy)
    }

    pub fn busy_count(&self) -> usize {
        self.stations.iter().filter(|s| s.busy).count()
    }

    /// Occupy the lowest free station. Operands already available at issue
    /// start executing the same cycle, so the latency counter is armed here.
    pub fn issue(
        &mut self,
        instruction: Instruction,
        j: Operand,
        k: Operand,
        rob_id: usize,
        seq: u64,
        speculative: bool,
    ) -> Option<usize> {
        let latency = instruction.op.latency();
        for station in &mut self.stations {
            if !station.busy {
                station.busy = true;
                station.instruction = Some(instruction);
                station.j = j;
                station.k = k;
                station.rob_id = rob_id;
                station.seq = seq;
                station.writable = false;
                station.speculative = speculative;
                station.exec_remaining = if j.is_ready() && k.is_ready() {
                    Some(latency)
                } else {
                    None
                };
                return Some(station.id);
            }
        }
        None
    }

    /// Fold one CDB broadcast into every waiting operand.
    pub fn snoop(&mut self, rob_id: usize, value: i32) {
        for station in &mut self.stations {
            if station.busy {
                station.j.snoop(rob_id, value);
                station.k.snoop(rob_id, value);
            }
        }
    }

    /// Advance every executing station by one cycle. A station reaching zero
    /// becomes writable and is picked up by write-result (or branch resolve).
    pub fn advance_executing(&mut self) {
        for station in &mut self.stations {
            if let Some(remaining) = station.exec_remaining {
                if remaining > 0 {
                    let left = remaining - 1;
                    station.exec_remaining = Some(left);
                    if left == 0 {
                        station.writable = true;
                    }
                }
            }
        }
    }

    /// Begin execution of one waiting station whose operands are complete.
    /// Tie-break: lowest station id.
    pub fn dispatch_one(&mut self) -> Option<(usize, usize)> {
        for station in &mut self.stations {
            if station.is_ready() {
                let latency = station.instruction.map(|i| i.op.latency()).unwrap_or(1);
                station.exec_remaining = Some(latency);
                let instr_index = station.instruction.map(|i| i.index).unwrap_or(0);
                return Some((station.id, instr_index));
            }
        }
        None
    }

    /// Collect the results of stations that finished executing, freeing them.
    /// Branch stations are left for the resolve step. Returns
    /// (rob_id, value, instr_index) triples.
    pub fn drain_writable(&mut self) -> Vec<(usize, i32, usize)> {
        let mut results = Vec::new();
        for station in &mut self.stations {
            if station.busy && station.writable {
                if let Some(instruction) = station.instruction {
                    if instruction.op.is_branch() {
                        continue;
                    }
                    results.push((station.rob_id, station.result(), instruction.index));
                    station.reset();
                }
            }
        }
        results
    }

    /// The oldest branch station that finished executing this cycle.
    pub fn oldest_writable_branch(&self) -> Option<usize> {
        self.stations
            .iter()
            .filter(|s| {
                s.busy
                    && s.writable
                    && s.instruction.map(|i| i.op.is_branch()).unwrap_or(false)
            })
            .min_by_key(|s| s.seq)
            .map(|s| s.id)
    }

    /// Remove a resolved branch from its station, returning
    /// (rob_id, vj, vk, instr_index, seq).
    pub fn take_branch(&mut self, station_id: usize) -> (usize, i32, i32, usize, u64) {
        let station = &mut self.stations[station_id];
        let rob_id = station.rob_id;
        let vj = station.j.value().unwrap_or(0);
        let vk = station.k.value().unwrap_or(0);
        let instr_index = station.instruction.map(|i| i.index).unwrap_or(0);
        let seq = station.seq;
        station.reset();
        (rob_id, vj, vk, instr_index, seq)
    }

    pub fn flush_younger_than(&mut self, branch_seq: u64) {
        for station in &mut self.stations {
            if station.busy && station.seq > branch_seq {
                station.reset();
            }
        }
    }

    pub fn promote(&mut self, threshold: Option<u64>) {
        let limit = threshold.unwrap_or(u64::MAX);
        for station in &mut self.stations {
            if station.busy && station.seq <= limit {
                station.speculative = false;
            }
        }
    }

    pub fn reset(&mut self) {
        for station in &mut self.stations {
            station.reset();
        }
    }
}
