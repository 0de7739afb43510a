// checkpoint.rs - Speculation checkpoints
//
// Issuing a BEQ records a checkpoint: the branch's ROB identity, the
// predicted direction with both possible successor fetch indices, and a
// copy of the RAT taken before the issue. Checkpoints live in a queue in
// program order; a misprediction restores the snapshot and discards the
// checkpoint together with every younger one.

use crate::simulator::rat::RatSnapshot;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub branch_rob_id: usize,
    pub branch_seq: u64,
    pub instr_index: usize,
    pub predicted_taken: bool,
    /// Fetch index when the branch is taken.
    pub taken_pc: usize,
    /// Fetch index when the branch falls through.
    pub fallthrough_pc: usize,
    pub rat_snapshot: RatSnapshot,
}

#[derive(Debug, Clone, Default)]
pub struct CheckpointQueue {
    pub checkpoints: VecDeque<Checkpoint>,
}

impl CheckpointQueue {
    pub fn new() -> Self {
        Self {
            checkpoints: VecDeque::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn push(&mut self, checkpoint: Checkpoint) {
        self.checkpoints.push_back(checkpoint);
    }

    pub fn find(&self, branch_rob_id: usize) -> Option<&Checkpoint> {
        self.checkpoints
            .iter()
            .find(|c| c.branch_rob_id == branch_rob_id)
    }

    pub fn remove_for_branch(&mut self, branch_rob_id: usize) -> Option<Checkpoint> {
        let position = self
            .checkpoints
            .iter()
            .position(|c| c.branch_rob_id == branch_rob_id)?;
        self.checkpoints.remove(position)
    }

    /// Discard the checkpoint at `branch_seq` and every younger one. Used
    /// on misprediction: nested speculation dies with the outer branch.
    pub fn discard_from(&mut self, branch_seq: u64) {
        self.checkpoints.retain(|c| c.branch_seq < branch_seq);
    }

    /// Sequence number of the oldest live checkpointed branch.
    pub fn oldest_seq(&self) -> Option<u64> {
        self.checkpoints.iter().map(|c| c.branch_seq).min()
    }

    pub fn clear(&mut self) {
        self.checkpoints.clear();
    }
}
