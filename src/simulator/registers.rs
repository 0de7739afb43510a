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

// registers.rs
//
// This file contains the architectural register file. R0 is hardwired to
// zero: writes to it are ignored and reads always return 0.

pub const NUM_REGISTERS: usize = 32;

#[derive(Debug, Clone)]
pub struct RegisterFile {
    pub data: Vec<i32>,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    pub fn new() -> Self {
        Self {
            data: vec![0; NUM_REGISTERS],
        }
    }

    pub fn read(&self, reg: usize) -> i32 {
        if reg == 0 || reg >= self.data.len() {
            0
        } else {
            self.data[reg]
        }
    }

    pub fn write(&mut self, reg: usize, value: i32) {
        if reg != 0 && reg < self.data.len() {
            self.data[reg] = value;
        }
        // Writes to R0 and out-of-range registers are ignored
    }

    pub fn reset(&mut self) {
        for value in &mut self.data {
            *value = 0;
        }
    }
}
