// Copyright (c) 2024 The tomasulo-rust contributors
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//

// simulator.rs
//
// This file contains the pipeline simulator itself. Each call to tick()
// advances one clock cycle through a fixed stage schedule:
//
//   commit -> execute -> write-result -> issue -> branch resolve
//
// Commit runs first and therefore observes results one cycle after their
// CDB broadcast. Execute runs before write-result, so a station whose
// latency counter reaches zero broadcasts in the same cycle; combined with
// issue-time dispatch of operations whose operands are already available,
// a lone ADD issued in cycle 1 executes in cycles 2-3, broadcasts in
// cycle 3 and commits in cycle 4.

use crate::assembler::parser::parse_program;
use crate::errors::SimulatorError;
use crate::simulator::branch_predictor::BranchPredictor;
use crate::simulator::checkpoint::{Checkpoint, CheckpointQueue};
use crate::simulator::config::SimulatorConfig;
use crate::simulator::instruction::{Instruction, Operation, PipelineStage};
use crate::simulator::load_store_buffer::{LoadStoreBuffer, MemOp};
use crate::simulator::memory::DataMemory;
use crate::simulator::rat::{RatEntry, RegisterAliasTable};
use crate::simulator::registers::{RegisterFile, NUM_REGISTERS};
use crate::simulator::reservation_station::{Operand, ReservationStations};
use crate::simulator::rob::{ReorderBuffer, RobKind};
use crate::simulator::snapshot::Snapshot;
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SimulatorState {
    Running,
    Halted,
}

/// Performance counters exposed to the viewer.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineMetrics {
    pub cycle: usize,
    pub committed: usize,
    pub total_instructions: usize,
    pub ipc: f64,
    pub stalls: usize,
    pub mispredictions: usize,
    pub predictor_accuracy: f64,
}

impl fmt::Display for PipelineMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline Statistics:")?;
        writeln!(f, "  Cycles: {}", self.cycle)?;
        writeln!(f, "  Instructions Committed: {}", self.committed)?;
        writeln!(f, "  Program Length: {}", self.total_instructions)?;
        writeln!(f, "  Instructions Per Cycle (IPC): {:.2}", self.ipc)?;
        writeln!(f, "  Stalls: {}", self.stalls)?;
        writeln!(f, "  Branch Mispredictions: {}", self.mispredictions)?;
        write!(
            f,
            "  Predictor Accuracy: {:.2}%",
            self.predictor_accuracy * 100.0
        )
    }
}

/// The pipeline simulator: an out-of-order core with in-order commit,
/// speculative execution across BEQ and a one-bit branch predictor.
pub struct Simulator {
    pub config: SimulatorConfig,
    pub program: Vec<Instruction>,

    // Architectural state
    pub registers: RegisterFile,
    pub memory: DataMemory,

    // Pipeline structures
    pub rob: ReorderBuffer,
    pub rat: RegisterAliasTable,
    pub stations: ReservationStations,
    pub lsb: LoadStoreBuffer,
    pub predictor: BranchPredictor,
    pub checkpoints: CheckpointQueue,

    pub fetch_pc: usize,
    pub next_seq: u64,

    // Performance counters
    pub cycle: usize,
    pub committed: usize,
    pub stalls: usize,
    pub mispredictions: usize,

    /// Fatal error; once set, tick() is a no-op.
    pub error: Option<SimulatorError>,

    /// Display stage per program instruction, for the viewer only.
    pub instr_stages: Vec<Option<PipelineStage>>,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(SimulatorConfig::new())
    }
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Self {
        let memory = DataMemory::new(config.memory_words);
        Self {
            config,
            program: Vec::new(),
            registers: RegisterFile::new(),
            memory,
            rob: ReorderBuffer::new(),
            rat: RegisterAliasTable::new(),
            stations: ReservationStations::new(),
            lsb: LoadStoreBuffer::new(),
            predictor: BranchPredictor::new(),
            checkpoints: CheckpointQueue::new(),
            fetch_pc: 0,
            next_seq: 0,
            cycle: 0,
            committed: 0,
            stalls: 0,
            mispredictions: 0,
            error: None,
            instr_stages: Vec::new(),
        }
    }

    /// Parse and install a program. On a parse error the previously loaded
    /// program (and all state) is left untouched.
    pub fn load_program(&mut self, text: &str) -> Result<(), SimulatorError> {
        let program = parse_program(text)?;
        self.program = program;
        self.predictor.clear();
        self.reset();
        info!("loaded program with {} instructions", self.program.len());
        Ok(())
    }

    /// Zero every structure but keep the loaded program. The branch
    /// predictor's direction table is microarchitectural and survives, so
    /// a re-run benefits from what it learned.
    pub fn reset(&mut self) {
        self.registers.reset();
        self.memory.reset();
        self.rob.reset();
        self.rat.reset();
        self.stations.reset();
        self.lsb.reset();
        self.checkpoints.clear();
        self.fetch_pc = 0;
        self.next_seq = 0;
        self.cycle = 0;
        self.committed = 0;
        self.stalls = 0;
        self.mispredictions = 0;
        self.error = None;
        self.instr_stages = vec![None; self.program.len()];
    }

    pub fn is_halted(&self) -> bool {
        self.error.is_some() || (self.fetch_pc >= self.program.len() && self.rob.is_empty())
    }

    pub fn state(&self) -> SimulatorState {
        if self.is_halted() {
            SimulatorState::Halted
        } else {
            SimulatorState::Running
        }
    }

    /// Advance the pipeline by one clock cycle. A no-op once halted.
    pub fn tick(&mut self) -> SimulatorState {
        if self.is_halted() {
            return SimulatorState::Halted;
        }

        self.commit_stage();
        if self.error.is_none() {
            self.execute_stage();
        }
        if self.error.is_none() {
            self.write_result_stage();
        }
        if self.error.is_none() {
            self.issue_stage();
        }
        if self.error.is_none() {
            self.resolve_branches();
        }

        self.cycle += 1;
        if self.error.is_none()
            && self.fetch_pc < self.program.len()
            && self.instr_stages[self.fetch_pc].is_none()
        {
            self.instr_stages[self.fetch_pc] = Some(PipelineStage::Fetch);
        }
        self.state()
    }

    /// Tick until the simulation halts or the configured cycle cap is hit.
    pub fn run_to_halt(&mut self) -> SimulatorState {
        while self.cycle < self.config.max_cycles {
            if self.tick() == SimulatorState::Halted {
                break;
            }
        }
        self.state()
    }

    pub fn metrics(&self) -> PipelineMetrics {
        let ipc = if self.cycle > 0 {
            self.committed as f64 / self.cycle as f64
        } else {
            0.0
        };
        PipelineMetrics {
            cycle: self.cycle,
            committed: self.committed,
            total_instructions: self.program.len(),
            ipc,
            stalls: self.stalls,
            mispredictions: self.mispredictions,
            predictor_accuracy: self.predictor.accuracy(),
        }
    }

    /// Read-only view of the whole machine for the viewer.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state(),
            error: self.error.as_ref().map(|e| e.to_string()),
            cycle: self.cycle,
            fetch_pc: self.fetch_pc,
            program: self.program.clone(),
            instruction_stages: self.instr_stages.clone(),
            rob: self.rob.entries.clone(),
            rob_head: self.rob.head,
            rob_tail: self.rob.tail,
            stations: self.stations.stations.clone(),
            load_store_buffer: self.lsb.entries.clone(),
            rat: self.rat.entries.to_vec(),
            registers: self.registers.data.clone(),
            memory: self.memory.words.clone(),
            metrics: self.metrics(),
        }
    }

    // -- Stage 1: commit ---------------------------------------------------

    fn commit_stage(&mut self) {
        let rob_id = match self.rob.head_ready() {
            Some(rob_id) => rob_id,
            None => return,
        };
        let entry = self.rob.commit_head();
        match entry.kind {
            RobKind::Register => {
                if let Some(reg) = entry.dest {
                    self.registers.write(reg, entry.value);
                    self.rat.clear_if_points_to(reg, rob_id);
                    info!(
                        "cycle {}: Committed i_{} (R{} = {})",
                        self.cycle, entry.instr_index, reg, entry.value
                    );
                }
            },
            RobKind::Store => {
                if let Some(address) = entry.address {
                    if let Err(error) = self.memory.write_word(address, entry.value) {
                        self.error = Some(error);
                        return;
                    }
                    info!(
                        "cycle {}: Committed i_{} (mem[{}] = {})",
                        self.cycle, entry.instr_index, address, entry.value
                    );
                }
                self.lsb.free_store(rob_id);
            },
            RobKind::Branch => {
                info!("cycle {}: Committed i_{} (branch)", self.cycle, entry.instr_index);
            },
        }
        self.committed += 1;
        self.instr_stages[entry.instr_index] = Some(PipelineStage::Commit);
    }

    // -- Stage 2: execute --------------------------------------------------

    fn execute_stage(&mut self) {
        self.stations.advance_executing();
        self.lsb.advance_executing();

        if let Err(error) = self.lsb.compute_addresses(&self.memory) {
            self.error = Some(error);
            return;
        }

        if let Some((station_id, instr_index)) = self.stations.dispatch_one() {
            debug!(
                "cycle {}: dispatched i_{} on station {}",
                self.cycle, instr_index, station_id
            );
        }
        if let Some((entry_id, instr_index, _)) = self.lsb.dispatch_one() {
            debug!(
                "cycle {}: i_{} began memory access on LSB entry {}",
                self.cycle, instr_index, entry_id
            );
        }

        // Viewer stages for everything currently executing
        for station in &self.stations.stations {
            if station.busy && station.exec_remaining.is_some() && !station.writable {
                if let Some(instruction) = station.instruction {
                    self.instr_stages[instruction.index] = Some(PipelineStage::Execute);
                }
            }
        }
        for entry in &self.lsb.entries {
            if entry.busy && entry.exec_remaining.is_some() && !entry.writable && !entry.staged {
                if let Some(instruction) = entry.instruction {
                    let stage = match entry.op {
                        MemOp::Load => PipelineStage::Memory,
                        MemOp::Store => PipelineStage::Execute,
                    };
                    self.instr_stages[instruction.index] = Some(stage);
                }
            }
        }
    }

    // -- Stage 3: write-result (CDB) ---------------------------------------

    fn write_result_stage(&mut self) {
        let mut broadcasts = self.stations.drain_writable();
        let (loads, stores) = match self.lsb.drain_writable(&self.memory) {
            Ok(results) => results,
            Err(error) => {
                self.error = Some(error);
                return;
            },
        };
        broadcasts.extend(loads);
        broadcasts.sort_by_key(|&(rob_id, _, _)| rob_id);

        for &(rob_id, value, instr_index) in &broadcasts {
            self.rob.mark_ready(rob_id, value);
            self.stations.snoop(rob_id, value);
            self.lsb.snoop(rob_id, value);
            self.instr_stages[instr_index] = Some(PipelineStage::WriteResult);
            debug!(
                "cycle {}: CDB broadcast (rob {}, value {})",
                self.cycle, rob_id, value
            );
        }
        for &(rob_id, value, address, instr_index) in &stores {
            self.rob.set_store_address(rob_id, address);
            self.rob.mark_ready(rob_id, value);
            self.instr_stages[instr_index] = Some(PipelineStage::WriteResult);
        }
    }

    // -- Stage 4: issue ----------------------------------------------------

    fn read_operand(&self, reg: usize) -> Operand {
        match self.rat.read(reg) {
            RatEntry::Architectural => Operand::Ready(self.registers.read(reg)),
            RatEntry::Rob(rob_id) => {
                let entry = self.rob.entry(rob_id);
                if entry.ready {
                    Operand::Ready(entry.value)
                } else {
                    Operand::Waiting(rob_id)
                }
            },
        }
    }

    fn issue_stage(&mut self) {
        if self.fetch_pc >= self.program.len() {
            return;
        }
        let instruction = self.program[self.fetch_pc];

        let slot_free = if instruction.op.is_memory() {
            self.lsb.has_free()
        } else {
            self.stations.has_free()
        };
        if !self.rob.can_issue() || !slot_free {
            self.stalls += 1;
            debug!("cycle {}: issue stalled at {}", self.cycle, instruction);
            return;
        }

        let speculative = !self.checkpoints.is_empty();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.instr_stages[instruction.index] = Some(PipelineStage::Issue);

        match instruction.op {
            Operation::Add { rd, rs, rt }
            | Operation::Sub { rd, rs, rt }
            | Operation::Mul { rd, rs, rt }
            | Operation::Div { rd, rs, rt } => {
                let j = self.read_operand(rs);
                let k = self.read_operand(rt);
                let rob_id = self.rob.allocate(
                    RobKind::Register,
                    Some(rd),
                    speculative,
                    instruction.index,
                    seq,
                );
                self.stations.issue(instruction, j, k, rob_id, seq, speculative);
                self.rat.rename(rd, rob_id);
                self.fetch_pc += 1;
            },
            Operation::Lw { rt, base, offset } => {
                let base_operand = self.read_operand(base);
                let rob_id = self.rob.allocate(
                    RobKind::Register,
                    Some(rt),
                    speculative,
                    instruction.index,
                    seq,
                );
                let entry_id = self.lsb.issue(
                    instruction,
                    MemOp::Load,
                    base_operand,
                    offset,
                    None,
                    rob_id,
                    seq,
                    speculative,
                );
                self.rat.rename(rt, rob_id);
                if let Some(entry_id) = entry_id {
                    if let Err(error) = self.lsb.compute_addresses(&self.memory) {
                        self.error = Some(error);
                        return;
                    }
                    let _ = self.lsb.try_start(entry_id);
                }
                self.fetch_pc += 1;
            },
            Operation::Sw { rt, base, offset } => {
                let base_operand = self.read_operand(base);
                let data = self.read_operand(rt);
                let rob_id =
                    self.rob
                        .allocate(RobKind::Store, None, speculative, instruction.index, seq);
                let entry_id = self.lsb.issue(
                    instruction,
                    MemOp::Store,
                    base_operand,
                    offset,
                    Some(data),
                    rob_id,
                    seq,
                    speculative,
                );
                if let Some(entry_id) = entry_id {
                    if let Err(error) = self.lsb.compute_addresses(&self.memory) {
                        self.error = Some(error);
                        return;
                    }
                    let _ = self.lsb.try_start(entry_id);
                }
                self.fetch_pc += 1;
            },
            Operation::Beq { rs, rt, target } => {
                // RAT snapshot is taken before the issue; BEQ renames
                // nothing, so the pre- and post-issue tables coincide.
                let rat_snapshot = self.rat.snapshot();
                let j = self.read_operand(rs);
                let k = self.read_operand(rt);
                let rob_id =
                    self.rob
                        .allocate(RobKind::Branch, None, speculative, instruction.index, seq);
                self.stations.issue(instruction, j, k, rob_id, seq, speculative);

                let taken_pc = self.config.branch_target_convention.resolve(target);
                let fallthrough_pc = instruction.index + 1;
                let predicted_taken = self.predictor.predict(instruction.index);
                self.checkpoints.push(Checkpoint {
                    branch_rob_id: rob_id,
                    branch_seq: seq,
                    instr_index: instruction.index,
                    predicted_taken,
                    taken_pc,
                    fallthrough_pc,
                    rat_snapshot,
                });
                self.fetch_pc = if predicted_taken { taken_pc } else { fallthrough_pc };
                debug!(
                    "cycle {}: issued {} predicted {}",
                    self.cycle,
                    instruction,
                    if predicted_taken { "taken" } else { "not-taken" }
                );
            },
        }
        debug!("cycle {}: issued {}", self.cycle, instruction);
    }

    // -- Stage 5: branch resolve -------------------------------------------

    fn resolve_branches(&mut self) {
        while let Some(station_id) = self.stations.oldest_writable_branch() {
            let (rob_id, vj, vk, instr_index, _) = self.stations.take_branch(station_id);
            let actual_taken = vj == vk;
            self.predictor.update(instr_index, actual_taken);
            self.rob.mark_ready(rob_id, actual_taken as i32);
            self.instr_stages[instr_index] = Some(PipelineStage::WriteResult);

            let checkpoint = match self.checkpoints.remove_for_branch(rob_id) {
                Some(checkpoint) => checkpoint,
                None => continue,
            };

            if actual_taken == checkpoint.predicted_taken {
                debug!(
                    "cycle {}: branch i_{} resolved correctly ({})",
                    self.cycle,
                    instr_index,
                    if actual_taken { "taken" } else { "not-taken" }
                );
                // Only the oldest live speculation can promote its entries;
                // everything stays speculative while an older branch is open.
                let resolved_oldest = self
                    .checkpoints
                    .oldest_seq()
                    .map_or(true, |seq| seq > checkpoint.branch_seq);
                if resolved_oldest {
                    let threshold = self.checkpoints.oldest_seq();
                    self.rob.promote(threshold);
                    self.stations.promote(threshold);
                    self.lsb.promote(threshold);
                }
            } else {
                self.mispredictions += 1;
                warn!(
                    "cycle {}: branch i_{} mispredicted (predicted {}, actual {})",
                    self.cycle,
                    instr_index,
                    if checkpoint.predicted_taken { "taken" } else { "not-taken" },
                    if actual_taken { "taken" } else { "not-taken" }
                );
                let target = if actual_taken {
                    checkpoint.taken_pc
                } else {
                    checkpoint.fallthrough_pc
                };
                self.flush(&checkpoint);
                self.fetch_pc = target;
                break;
            }
        }
    }

    /// Discard everything younger than the mispredicted branch: ROB tail,
    /// matching RS/LSB entries, nested checkpoints. The RAT is restored
    /// from the checkpoint; mappings whose producer has committed since the
    /// snapshot are cleared back to architectural.
    fn flush(&mut self, checkpoint: &Checkpoint) {
        let dropped = self.rob.flush_younger_than(checkpoint.branch_seq);
        for &(_, instr_index) in &dropped {
            self.instr_stages[instr_index] = Some(PipelineStage::Flushed);
        }
        self.stations.flush_younger_than(checkpoint.branch_seq);
        self.lsb.flush_younger_than(checkpoint.branch_seq);

        self.rat.restore(&checkpoint.rat_snapshot);
        for reg in 0..NUM_REGISTERS {
            if let RatEntry::Rob(rob_id) = self.rat.read(reg) {
                if !self.rob.entry(rob_id).busy {
                    self.rat.clear(reg);
                }
            }
        }
        self.checkpoints.discard_from(checkpoint.branch_seq);
        debug!(
            "cycle {}: flushed {} entries younger than i_{}",
            self.cycle,
            dropped.len(),
            checkpoint.instr_index
        );
    }

    /// Formatted dump of the pipeline structures for debugging.
    pub fn dump_state(&self) -> String {
        let mut result = String::new();

        result.push_str("=== Reorder Buffer ===\n");
        for (rob_id, entry) in self.rob.iter_in_order() {
            let marker = if rob_id == self.rob.head { "HEAD" } else { "    " };
            result.push_str(&format!(
                "[{:2}] {} i_{} {:?} dest: {:?} value: {} ready: {} spec: {}\n",
                rob_id,
                marker,
                entry.instr_index,
                entry.kind,
                entry.dest,
                entry.value,
                entry.ready,
                entry.speculative
            ));
        }

        result.push_str("\n=== Reservation Stations ===\n");
        for station in &self.stations.stations {
            if station.busy {
                result.push_str(&format!(
                    "[{}] {} j: {:?} k: {:?} rob: {} remaining: {:?}\n",
                    station.id,
                    station
                        .instruction
                        .map(|i| i.op.mnemonic())
                        .unwrap_or("?"),
                    station.j,
                    station.k,
                    station.rob_id,
                    station.exec_remaining
                ));
            }
        }

        result.push_str("\n=== Load/Store Buffer ===\n");
        for entry in &self.lsb.entries {
            if entry.busy {
                result.push_str(&format!(
                    "[{}] {:?} base: {:?} offset: {} address: {:?} data: {:?} rob: {} staged: {}\n",
                    entry.id,
                    entry.op,
                    entry.base,
                    entry.offset,
                    entry.address,
                    entry.data,
                    entry.rob_id,
                    entry.staged
                ));
            }
        }

        result.push_str("\n=== Register Alias Table ===\n");
        for (reg, entry) in self.rat.entries.iter().enumerate() {
            if let RatEntry::Rob(rob_id) = entry {
                result.push_str(&format!("R{} -> ROB[{}]\n", reg, rob_id));
            }
        }

        result
    }
}
