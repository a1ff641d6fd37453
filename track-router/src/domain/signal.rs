//! Signal vocabulary shared by the signal-state collaborator and the planner.

use serde::{Deserialize, Serialize};

/// Kind of signal installed on a track position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SignalType {
    /// Plain block signal. A stop aspect means the block ahead is occupied.
    #[default]
    Block,
    /// Entry presignal.
    Entry,
    /// Exit presignal.
    Exit,
    /// Combined entry/exit presignal.
    Combo,
    /// Path signal (reservation-based).
    Pbs,
    /// One-way path signal.
    PbsOneway,
}

impl SignalType {
    /// True for path signals, where occupancy is tracked per reservation
    /// rather than per block.
    pub fn is_pbs(self) -> bool {
        matches!(self, SignalType::Pbs | SignalType::PbsOneway)
    }

    /// True for presignals whose stop aspect is advisory.
    pub fn is_presignal(self) -> bool {
        matches!(self, SignalType::Entry | SignalType::Exit | SignalType::Combo)
    }

    /// True for signals that release a presignal block (exit and combo).
    pub fn is_exit_like(self) -> bool {
        matches!(self, SignalType::Exit | SignalType::Combo)
    }
}

/// Aspect currently shown by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalAspect {
    Go,
    Stop,
}

/// A signal facing the direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalType,
    pub aspect: SignalAspect,
}

impl Signal {
    pub fn new(kind: SignalType, aspect: SignalAspect) -> Self {
        Self { kind, aspect }
    }

    pub fn is_stop(&self) -> bool {
        self.aspect == SignalAspect::Stop
    }
}
