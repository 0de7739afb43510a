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

// snapshot.rs
//
// This file contains the read-only per-cycle state view handed to the
// viewer. It is a plain copy of the pipeline structures; the viewer must
// never mutate simulator state, so it only ever receives this snapshot.

use crate::simulator::instruction::{Instruction, PipelineStage};
use crate::simulator::load_store_buffer::LoadStoreEntry;
use crate::simulator::rat::RatEntry;
use crate::simulator::reservation_station::ReservationStation;
use crate::simulator::rob::RobEntry;
use crate::simulator::simulator::{PipelineMetrics, SimulatorState};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub state: SimulatorState,
    /// Fatal error description, if the simulation died.
    pub error: Option<String>,
    pub cycle: usize,
    pub fetch_pc: usize,
    pub program: Vec<Instruction>,
    pub instruction_stages: Vec<Option<PipelineStage>>,
    pub rob: Vec<RobEntry>,
    pub rob_head: usize,
    pub rob_tail: usize,
    pub stations: Vec<ReservationStation>,
    pub load_store_buffer: Vec<LoadStoreEntry>,
    pub rat: Vec<RatEntry>,
    pub registers: Vec<i32>,
    pub memory: Vec<i32>,
    pub metrics: PipelineMetrics,
}
