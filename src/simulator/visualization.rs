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

// visualization.rs
//
// This file renders per-cycle snapshots for the trace view. Text output is
// a compact program listing with the display stage of every instruction
// plus the busy pipeline structures; JSON output serializes the snapshot
// as-is.

use crate::simulator::instruction::PipelineStage;
use crate::simulator::rat::RatEntry;
use crate::simulator::snapshot::Snapshot;
use colored::Colorize;

#[derive(Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone)]
pub struct PipelineVisualization {
    pub output_format: OutputFormat,
    pub colorize_output: bool,
    pub show_structures: bool,
}

impl Default for PipelineVisualization {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineVisualization {
    pub fn new() -> Self {
        Self {
            output_format: OutputFormat::Text,
            colorize_output: true,
            show_structures: true,
        }
    }

    pub fn visualize(&self, snapshot: &Snapshot) -> String {
        match self.output_format {
            OutputFormat::Text => self.visualize_text(snapshot),
            OutputFormat::Json => self.visualize_json(snapshot),
        }
    }

    fn stage_label(&self, stage: Option<PipelineStage>) -> String {
        let label = stage.map(|s| s.label()).unwrap_or("-");
        if !self.colorize_output {
            return label.to_string();
        }
        match stage {
            Some(PipelineStage::Commit) => label.green().to_string(),
            Some(PipelineStage::Flushed) => label.red().to_string(),
            Some(PipelineStage::WriteResult) => label.yellow().to_string(),
            _ => label.to_string(),
        }
    }

    fn visualize_text(&self, snapshot: &Snapshot) -> String {
        let mut result = String::new();

        result.push_str(&format!("=== Cycle {} ===\n", snapshot.cycle));
        if let Some(error) = &snapshot.error {
            result.push_str(&format!("FATAL: {}\n", error));
        }

        for (instruction, stage) in snapshot
            .program
            .iter()
            .zip(snapshot.instruction_stages.iter())
        {
            let marker = if instruction.index == snapshot.fetch_pc {
                ">"
            } else {
                " "
            };
            result.push_str(&format!(
                "{} {:<28} {}\n",
                marker,
                instruction.to_string(),
                self.stage_label(*stage)
            ));
        }

        if self.show_structures {
            result.push_str(&format!(
                "\nROB {}/16  RS {}/8  LSB {}/8\n",
                snapshot.rob.iter().filter(|e| e.busy).count(),
                snapshot.stations.iter().filter(|s| s.busy).count(),
                snapshot.load_store_buffer.iter().filter(|e| e.busy).count()
            ));
            let renames: Vec<String> = snapshot
                .rat
                .iter()
                .enumerate()
                .filter_map(|(reg, entry)| match entry {
                    RatEntry::Rob(rob_id) => Some(format!("R{}->ROB[{}]", reg, rob_id)),
                    RatEntry::Architectural => None,
                })
                .collect();
            if !renames.is_empty() {
                result.push_str(&format!("RAT: {}\n", renames.join(" ")));
            }
        }

        result.push_str(&format!(
            "committed {}  stalls {}  mispredictions {}\n",
            snapshot.metrics.committed, snapshot.metrics.stalls, snapshot.metrics.mispredictions
        ));

        result
    }

    fn visualize_json(&self, snapshot: &Snapshot) -> String {
        match serde_json::to_string_pretty(snapshot) {
            Ok(json) => json,
            Err(error) => format!("{{\"error\": \"{}\"}}", error),
        }
    }
}
