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

// branch_predictor.rs
//
// This file contains the one-bit branch predictor. Each branch, keyed by
// its instruction index, is predicted to repeat its last observed
// direction; unseen branches are predicted not-taken.

use std::collections::HashMap;

pub struct BranchPredictor {
    /// Last observed direction per branch instruction index.
    pub table: HashMap<usize, bool>,

    /// Statistics
    pub predictions: usize,
    pub correct_predictions: usize,
}

impl Default for BranchPredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl BranchPredictor {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
            predictions: 0,
            correct_predictions: 0,
        }
    }

    /// Predict the direction of the branch at `index`. Default: not-taken.
    pub fn predict(&mut self, index: usize) -> bool {
        self.predictions += 1;
        self.table.get(&index).copied().unwrap_or(false)
    }

    /// Record the actual direction. The stored bit still holds the value
    /// used at prediction time, so correctness is scored before updating.
    pub fn update(&mut self, index: usize, taken: bool) {
        let predicted = self.table.get(&index).copied().unwrap_or(false);
        if predicted == taken {
            self.correct_predictions += 1;
        }
        self.table.insert(index, taken);
    }

    pub fn accuracy(&self) -> f64 {
        if self.predictions == 0 {
            return 0.0;
        }
        self.correct_predictions as f64 / self.predictions as f64
    }

    /// Forget all history. Used when a new program is loaded; a plain
    /// `reset()` of the simulator keeps the table so a re-run can benefit
    /// from what the predictor learned.
    pub fn clear(&mut self) {
        self.table.clear();
        self.predictions = 0;
        self.correct_predictions = 0;
    }
}
