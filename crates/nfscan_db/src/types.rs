//! Entity types for the NFScan stores.
//!
//! These types are the single source of truth. All interfaces (worker, UI,
//! tooling) should use these types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Task Types
// ============================================================================

/// Lifecycle status of a scan task.
///
/// Transitions are forward-only: created -> running -> {done, failed}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Created,
    Running,
    Done,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "created" => Some(Self::Created),
            "running" => Some(Self::Running),
            "done" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Statuses allowed to move to `next`.
    pub fn transition_sources(next: Self) -> &'static [Self] {
        match next {
            Self::Created => &[],
            Self::Running => &[Self::Created],
            Self::Done | Self::Failed => &[Self::Running],
        }
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        Self::transition_sources(next).contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One scan run with its lifecycle status and configuration snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanTask {
    /// Unique identifier
    pub id: String,
    /// Human-readable label
    pub name: String,
    /// Creation time, immutable
    pub created_at: DateTime<Utc>,
    /// Lifecycle status
    pub status: TaskStatus,
    /// Opaque serialized configuration, stored verbatim
    pub config: String,
    /// Free-text annotation
    pub note: String,
}

// ============================================================================
// Point Types
// ============================================================================

/// A spatial sample belonging to a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanPoint {
    /// Store-assigned sequential id (insertion order)
    pub id: i64,
    pub task_id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Measured value; None when the sample was not captured
    pub value: Option<f64>,
}

/// A point sample to append, before the store assigns an id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub value: Option<f64>,
}

impl NewPoint {
    pub fn new(x: f64, y: f64, z: f64, value: Option<f64>) -> Self {
        Self { x, y, z, value }
    }
}

// ============================================================================
// Queue Types
// ============================================================================

/// Lifecycle status of a scan queue item.
///
/// pending -> claimed -> {done, failed}; pending -> canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Pending,
    Claimed,
    Done,
    Failed,
    Canceled,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Claimed => "claimed",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "claimed" => Some(Self::Claimed),
            "done" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }

    /// Statuses allowed to move to `next`.
    pub fn transition_sources(next: Self) -> &'static [Self] {
        match next {
            Self::Pending => &[],
            Self::Claimed => &[Self::Pending],
            Self::Done | Self::Failed => &[Self::Claimed],
            Self::Canceled => &[Self::Pending],
        }
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        Self::transition_sources(next).contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Canceled)
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scan request awaiting (or having received) a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    /// Unique identifier
    pub id: String,
    /// Enqueue time, immutable, drives FIFO ordering
    pub created_at: DateTime<Utc>,
    /// Lifecycle status
    pub status: QueueStatus,
    /// Opaque serialized scan-request parameters, stored verbatim
    pub params: String,
    /// Opaque serialized list of requested traces, stored verbatim
    pub trace_list: String,
    /// Task created to fulfill this item; None while unclaimed
    pub task_id: Option<String>,
    /// Free-text status/error message
    pub message: String,
}

// ============================================================================
// Filter and Stats Types
// ============================================================================

/// Filter for listing tasks
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub limit: Option<usize>,
}

/// Queue statistics
#[derive(Debug, Clone, Default)]
pub struct QueueStats {
    pub total: u64,
    pub pending: u64,
    pub claimed: u64,
    pub done: u64,
    pub failed: u64,
    pub canceled: u64,
}
