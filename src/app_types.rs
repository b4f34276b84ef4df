use std::sync::Arc;

use crate::engine::Snapshot;

/// lifecycle of a breeder
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BreederState {
    /// no lineage yet (or discarded by reset)
    Idle,
    Running,
    /// lineage present, worker parked
    Stopped,
}

/// scheduling hint for the worker thread. std has no portable thread
/// priority, so this is recorded and logged but not applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WorkerPriority {
    Idle,
    Low,
    #[default]
    Inherit,
    High,
}

/// why a run ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// stop() or a control call that needed the worker parked
    Requested,
    /// render/score/mutation error; the loop halted on its own
    Failed(String),
}

// messages from breeder thread to collaborators
#[derive(Clone, Debug)]
pub enum BreederEvent {
    /// candidate accepted; carries the new lineage head
    Evolved(Arc<Snapshot>),
    /// heartbeat, once per iteration
    Progressed { generation: u64 },
    /// last event of a run
    Stopped { generation: u64, reason: StopReason },
}
