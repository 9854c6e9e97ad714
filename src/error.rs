use grid_util::point::Point;
use thiserror::Error;

/// Failures reported by map construction, obstacle insertion and planning.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanningError {
    /// Non-positive resolution or a bounding box that yields no cells.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A continuous position whose cell lies outside the grid.
    #[error("position ({x}, {y}) is outside the grid")]
    OutOfBounds { x: f64, y: f64 },

    /// A grid index outside `0..width` x `0..height`.
    #[error("cell ({x}, {y}) is outside the grid")]
    CellOutOfBounds { x: i32, y: i32 },

    /// The open set ran dry before the goal cell was expanded.
    #[error("no path found from {start} to {goal}")]
    NoPathFound { start: Point, goal: Point },

    /// Obstacle segment rejected under [ObstaclePolicy::Reject](crate::ObstaclePolicy::Reject).
    #[error("invalid obstacle range: {0}")]
    ObstacleRangeInvalid(String),
}

pub type Result<T> = std::result::Result<T, PlanningError>;
