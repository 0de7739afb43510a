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

// memory.rs
//
// This file contains the data memory for the simulator: a flat array of
// words addressed by byte address. Accesses must be word-aligned; any
// violation surfaces as a SimulatorError and is fatal to the simulation.

use crate::errors::SimulatorError;

pub const DEFAULT_MEMORY_WORDS: usize = 1024;

#[derive(Debug, Clone)]
pub struct DataMemory {
    pub words: Vec<i32>,
}

impl DataMemory {
    pub fn new(num_words: usize) -> Self {
        Self {
            words: vec![0; num_words],
        }
    }

    pub fn size_words(&self) -> usize {
        self.words.len()
    }

    pub fn size_bytes(&self) -> usize {
        self.words.len() * 4
    }

    /// Validate a byte address and convert it to a word index.
    pub fn word_index(&self, address: i64) -> Result<usize, SimulatorError> {
        if address % 4 != 0 {
            return Err(SimulatorError::MemoryMisaligned(address));
        }
        if address < 0 || (address / 4) as usize >= self.words.len() {
            return Err(SimulatorError::MemoryOutOfBounds(address));
        }
        Ok((address / 4) as usize)
    }

    pub fn read_word(&self, address: i64) -> Result<i32, SimulatorError> {
        let index = self.word_index(address)?;
        Ok(self.words[index])
    }

    pub fn write_word(&mut self, address: i64, value: i32) -> Result<(), SimulatorError> {
        let index = self.word_index(address)?;
        self.words[index] = value;
        Ok(())
    }

    pub fn reset(&mut self) {
        for word in &mut self.words {
            *word = 0;
        }
    }
}
