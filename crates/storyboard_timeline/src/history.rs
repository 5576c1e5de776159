// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history.
//!
//! Every committed edit stores the full timeline state before and after it as
//! an opaque bincode buffer. Entries are independent of the live clip
//! objects, so later in-place mutation can never corrupt history.

use crate::clip::Clip;
use crate::track::Track;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Default maximum undo history depth
pub const MAX_HISTORY: usize = 100;

/// History errors
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Nothing to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Nothing to redo
    #[error("Nothing to redo")]
    NothingToRedo,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

/// Result type for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Unique operation ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(u64);

impl OperationId {
    /// Get the raw ID value
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Timeline state recorded in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Tracks in display order
    pub tracks: Vec<Track>,
    /// Every clip at the time of capture
    pub clips: Vec<Clip>,
    /// Playhead position
    pub current_time: f64,
    /// Total duration including the trailing buffer
    pub total_duration: f64,
}

/// Serialized state (deep copy of a [`HistoryEntry`])
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Serialized state
    pub data: Vec<u8>,
    /// Size in bytes
    pub size: usize,
}

impl StateSnapshot {
    /// Create a new state snapshot
    pub fn new(data: Vec<u8>) -> Self {
        let size = data.len();
        Self { data, size }
    }

    /// Create from serializable value
    pub fn from_value<T: Serialize>(value: &T) -> Result<Self> {
        let data = bincode::serialize(value)?;
        Ok(Self::new(data))
    }

    /// Deserialize to value
    pub fn to_value<T: for<'de> Deserialize<'de>>(&self) -> Result<T> {
        Ok(bincode::deserialize(&self.data)?)
    }
}

/// An edit that can be undone/redone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// Unique operation ID
    pub id: OperationId,
    /// Human-readable description
    pub description: String,
    /// State before the edit (for undo)
    pub before: StateSnapshot,
    /// State after the edit (for redo)
    pub after: StateSnapshot,
}

impl Operation {
    /// Get memory size of this operation
    pub fn memory_size(&self) -> usize {
        self.before.size + self.after.size
    }
}

/// History statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Total operations in undo stack
    pub undo_count: usize,
    /// Total operations in redo stack
    pub redo_count: usize,
    /// Total memory used by both stacks (bytes)
    pub memory_used: usize,
    /// Maximum history depth
    pub max_depth: usize,
}

/// Undo/redo history manager
#[derive(Debug)]
pub struct History {
    /// Undo stack
    undo_stack: VecDeque<Operation>,
    /// Redo stack
    redo_stack: VecDeque<Operation>,
    /// Next operation ID
    next_id: u64,
    /// Maximum history depth
    max_depth: usize,
    /// Memory held by both stacks
    memory_used: usize,
}

impl History {
    /// Create a new history manager
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            next_id: 1,
            max_depth: max_depth.max(1),
            memory_used: 0,
        }
    }

    /// Record a committed edit.
    ///
    /// Clears the redo stack. Edits whose before and after states serialize
    /// identically are not recorded and yield `None`.
    pub fn record(
        &mut self,
        description: &str,
        before: &HistoryEntry,
        after: &HistoryEntry,
    ) -> Result<Option<OperationId>> {
        let before = StateSnapshot::from_value(before)?;
        let after = StateSnapshot::from_value(after)?;
        if before.data == after.data {
            return Ok(None);
        }

        let id = OperationId(self.next_id);
        self.next_id += 1;
        let operation = Operation {
            id,
            description: description.to_string(),
            before,
            after,
        };

        for dropped in self.redo_stack.drain(..) {
            self.memory_used = self.memory_used.saturating_sub(dropped.memory_size());
        }
        self.memory_used += operation.memory_size();
        self.undo_stack.push_back(operation);

        // Enforce history limit
        while self.undo_stack.len() > self.max_depth {
            if let Some(old) = self.undo_stack.pop_front() {
                self.memory_used = self.memory_used.saturating_sub(old.memory_size());
            }
        }

        tracing::debug!("Recorded history entry {}: {description}", id.value());
        Ok(Some(id))
    }

    /// Step back one edit, returning the state to restore
    pub fn undo(&mut self) -> Result<HistoryEntry> {
        let operation = self.undo_stack.back().ok_or(HistoryError::NothingToUndo)?;
        let entry = operation.before.to_value()?;

        if let Some(operation) = self.undo_stack.pop_back() {
            self.redo_stack.push_back(operation);
        }
        Ok(entry)
    }

    /// Step forward one edit, returning the state to restore
    pub fn redo(&mut self) -> Result<HistoryEntry> {
        let operation = self.redo_stack.back().ok_or(HistoryError::NothingToRedo)?;
        let entry = operation.after.to_value()?;

        if let Some(operation) = self.redo_stack.pop_back() {
            self.undo_stack.push_back(operation);
        }
        Ok(entry)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get redo stack depth
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.memory_used = 0;
    }

    /// Get history statistics
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            undo_count: self.undo_stack.len(),
            redo_count: self.redo_stack.len(),
            memory_used: self.memory_used,
            max_depth: self.max_depth,
        }
    }

    /// Get description of next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|op| op.description.as_str())
    }

    /// Get description of next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|op| op.description.as_str())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
