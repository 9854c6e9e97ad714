//! # grid_planning
//!
//! [A*](https://en.wikipedia.org/wiki/A*_search_algorithm) path planning on an occupancy grid
//! laid over a continuous plane. A [GridMap] cuts a bounding box into square cells of a given
//! resolution, obstacles are added as axis-aligned segments, and an [AStarPlanner] finds a path
//! between two continuous positions and hands it back in continuous coordinates.
//!
//! Moves go to any of the 8 neighbouring cells at a cost of 1 each, diagonals included, and the
//! heuristic is the [Euclidean distance](https://en.wikipedia.org/wiki/Euclidean_distance)
//! between cells.
//!
//! ```
//! use grid_planning::{AStarPlanner, GridMap};
//!
//! let mut map = GridMap::new((10.0, 10.0), (50.0, 50.0), (-10.0, -10.0), (60.0, 60.0), 2.0)?;
//! map.add_obstacle_range_y(20.0, (-10.0, 40.0))?;
//! let path = AStarPlanner::new(&map).plan_endpoints()?;
//! assert_eq!(path.positions().last().map(|p| (p.x, p.y)), Some((50.0, 50.0)));
//! # Ok::<(), grid_planning::PlanningError>(())
//! ```
pub mod astar;
pub mod error;
pub mod grid_map;

pub use astar::{
    AStarPlanner, Expansion, Frontier, NoopObserver, Path, SearchObserver, SearchStats, Waypoint,
};
pub use error::{PlanningError, Result};
pub use grid_map::{Components, GridMap, ObstaclePolicy, Position};
pub use grid_util::point::Point;
