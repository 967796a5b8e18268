use std::fmt::{Display, Formatter};

use crate::cleaner::cleaner::ClearResult;
use crate::cleaner::generation::Generation;

/// Events published by a [`Cleaner`](crate::Cleaner) for clearing tasks started
/// with [`spawn_clear`](crate::Cleaner::spawn_clear).
#[derive(Debug, Clone, PartialEq)]
pub enum CleanerEvent {
    /// A clearing task was spawned.
    ClearStarted { generation: Generation },
    /// A clearing task completed.
    ClearFinished { generation: Generation, result: ClearResult },
    /// A clearing task was rejected before touching any data.
    ClearFailed { generation: Generation, reason: String },
}

impl CleanerEvent {
    pub fn generation(&self) -> Generation {
        match self {
            CleanerEvent::ClearStarted { generation }
            | CleanerEvent::ClearFinished { generation, .. }
            | CleanerEvent::ClearFailed { generation, .. } => *generation,
        }
    }
}

impl Display for CleanerEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CleanerEvent::ClearStarted { generation } => write!(f, "clear #{} started", generation.0),
            CleanerEvent::ClearFinished { generation, result } => {
                write!(f, "clear #{} finished ({} items)", generation.0, result.total())
            }
            CleanerEvent::ClearFailed { generation, reason } => write!(f, "clear #{} failed: {}", generation.0, reason),
        }
    }
}
