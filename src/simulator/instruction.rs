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

// instruction.rs
//
// This file contains the instruction definitions for the pipeline simulator.
// It defines the Operation enum, which represents the supported operations,
// the decoded Instruction record, and the per-operation execution latencies.

use serde::Serialize;
use std::fmt;

/// A decoded operation with its operands. Register operands are indices into
/// the 32-entry architectural register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operation {
    Add { rd: usize, rs: usize, rt: usize },
    Sub { rd: usize, rs: usize, rt: usize },
    Mul { rd: usize, rs: usize, rt: usize },
    Div { rd: usize, rs: usize, rt: usize },
    Lw { rt: usize, base: usize, offset: i32 },
    Sw { rt: usize, base: usize, offset: i32 },
    Beq { rs: usize, rt: usize, target: i32 },
}

/// An instruction as placed in the program: the operation plus its 0-based
/// position, which doubles as the fetch label `i_<index>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Instruction {
    pub index: usize,
    pub op: Operation,
}

impl Operation {
    /// Execution latency in cycles once the operation has been dispatched.
    pub fn latency(&self) -> u32 {
        match self {
            Operation::Add { .. } | Operation::Sub { .. } => 2,
            Operation::Mul { .. } => 4,
            Operation::Div { .. } => 6,
            Operation::Lw { .. } => 3,
            Operation::Sw { .. } => 2,
            Operation::Beq { .. } => 1,
        }
    }

    /// Destination register, if the operation writes one.
    pub fn destination(&self) -> Option<usize> {
        match self {
            Operation::Add { rd, .. }
            | Operation::Sub { rd, .. }
            | Operation::Mul { rd, .. }
            | Operation::Div { rd, .. } => Some(*rd),
            Operation::Lw { rt, .. } => Some(*rt),
            Operation::Sw { .. } | Operation::Beq { .. } => None,
        }
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, Operation::Lw { .. } | Operation::Sw { .. })
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Operation::Beq { .. })
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Operation::Add { .. } => "ADD",
            Operation::Sub { .. } => "SUB",
            Operation::Mul { .. } => "MUL",
            Operation::Div { .. } => "DIV",
            Operation::Lw { .. } => "LW",
            Operation::Sw { .. } => "SW",
            Operation::Beq { .. } => "BEQ",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Add { rd, rs, rt }
            | Operation::Sub { rd, rs, rt }
            | Operation::Mul { rd, rs, rt }
            | Operation::Div { rd, rs, rt } => {
                write!(f, "{} R{}, R{}, R{}", self.mnemonic(), rd, rs, rt)
            },
            Operation::Lw { rt, base, offset } | Operation::Sw { rt, base, offset } => {
                write!(f, "{} R{}, {}(R{})", self.mnemonic(), rt, offset, base)
            },
            Operation::Beq { rs, rt, target } => {
                write!(f, "BEQ R{}, R{}, {}", rs, rt, target)
            },
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i_{}: {}", self.index, self.op)
    }
}

/// Display stage of an instruction, kept for the viewer only. Pipeline
/// decisions never read this; they rely on ROB/RS/LSB state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineStage {
    Fetch,
    Issue,
    Execute,
    Memory,
    WriteResult,
    Commit,
    Flushed,
}

impl PipelineStage {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Fetch => "IF",
            PipelineStage::Issue => "ID",
            PipelineStage::Execute => "EX",
            PipelineStage::Memory => "MEM",
            PipelineStage::WriteResult => "WB",
            PipelineStage::Commit => "COMMIT",
            PipelineStage::Flushed => "FLUSHED",
        }
    }
}
