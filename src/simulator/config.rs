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

// config.rs
//
// This file contains the simulator configuration: memory size, the branch
// target convention, and the safety cap on run length.

use crate::simulator::memory::DEFAULT_MEMORY_WORDS;
use serde::Serialize;

/// How the literal target operand of a BEQ maps to an instruction index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BranchTargetConvention {
    /// A multiple of 4 is a word address and is divided by 4; any other
    /// value is the instruction index directly. `BEQ R1, R2, 12` branches
    /// to `i_3`. This is the default.
    WordAddress,
    /// The literal is always the instruction index.
    InstructionIndex,
}

impl BranchTargetConvention {
    pub fn resolve(&self, target: i32) -> usize {
        let target = target.max(0);
        match self {
            BranchTargetConvention::WordAddress => {
                if target % 4 == 0 {
                    (target / 4) as usize
                } else {
                    target as usize
                }
            },
            BranchTargetConvention::InstructionIndex => target as usize,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Data memory size in 4-byte words.
    pub memory_words: usize,
    pub branch_target_convention: BranchTargetConvention,
    /// Safety cap for run_to_halt; programs can loop forever.
    pub max_cycles: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatorConfig {
    pub fn new() -> Self {
        Self {
            memory_words: DEFAULT_MEMORY_WORDS,
            branch_target_convention: BranchTargetConvention::WordAddress,
            max_cycles: 10_000,
        }
    }

    pub fn with_memory_words(mut self, words: usize) -> Self {
        assert!(words > 0, "Memory size must be positive");
        self.memory_words = words;
        self
    }

    pub fn with_branch_target_convention(mut self, convention: BranchTargetConvention) -> Self {
        self.branch_target_convention = convention;
        self
    }

    pub fn with_max_cycles(mut self, max_cycles: usize) -> Self {
        self.max_cycles = max_cycles;
        self
    }
}
