use crate::error::{PlanningError, Result};
use core::fmt;
use core::ops::Range;
use grid_util::grid::{BoolGrid, ValueGrid};
use grid_util::point::Point;
use itertools::iproduct;
use log::{debug, warn};
use num_traits::ToPrimitive;
use petgraph::unionfind::UnionFind;

/// A point in continuous ("graph") coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Position {
        Position { x, y }
    }
    /// Euclidean distance in continuous units.
    pub fn distance(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Position {
        Position { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// What [GridMap] does with obstacle segments that reach outside the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ObstaclePolicy {
    /// Clamp the segment to the grid. A segment whose fixed coordinate lies off the grid marks
    /// nothing.
    #[default]
    Clamp,
    /// Fail with [PlanningError::ObstacleRangeInvalid] and leave the map untouched.
    Reject,
}

#[derive(Clone, Copy, Debug)]
enum Axis {
    X,
    Y,
}

/// [GridMap] discretizes the axis-aligned box `min..max` into square cells of side `resolution`
/// and keeps a [BoolGrid] of which cells are occupied ([true]) or free ([false]).
///
/// Cells only ever go from free to occupied; there is no way to clear an obstacle or resize the
/// grid after construction.
#[derive(Clone, Debug)]
pub struct GridMap {
    grid: BoolGrid,
    pub obstacle_policy: ObstaclePolicy,
    min: Position,
    max: Position,
    resolution: f64,
    width: usize,
    height: usize,
    start: Position,
    goal: Position,
    obstacle_cells: Vec<Point>,
}

/// Number of cells along one axis, i.e. `round((max - min) / resolution)`.
fn cells_along(min: f64, max: f64, resolution: f64, axis: &str) -> Result<usize> {
    let cells = ((max - min) / resolution).round_ties_even();
    match cells.to_i32() {
        Some(n) if n >= 1 => Ok(n as usize),
        Some(_) => Err(PlanningError::InvalidConfiguration(format!(
            "{axis} extent {min}..{max} holds no cells at resolution {resolution}"
        ))),
        None => Err(PlanningError::InvalidConfiguration(format!(
            "{axis} extent {min}..{max} at resolution {resolution} is not representable"
        ))),
    }
}

fn check_finite(coordinates: &[f64]) -> Result<()> {
    if coordinates.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(PlanningError::ObstacleRangeInvalid(format!(
            "non-finite coordinate in {coordinates:?}"
        )))
    }
}

impl GridMap {
    /// Builds an all-free grid covering `mins..maxs`. `start` and `goal` are remembered as the
    /// default endpoints for [AStarPlanner::plan_endpoints](crate::AStarPlanner::plan_endpoints).
    pub fn new(
        start: impl Into<Position>,
        goal: impl Into<Position>,
        mins: impl Into<Position>,
        maxs: impl Into<Position>,
        resolution: f64,
    ) -> Result<GridMap> {
        let (min, max) = (mins.into(), maxs.into());
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(PlanningError::InvalidConfiguration(format!(
                "resolution must be positive, got {resolution}"
            )));
        }
        if ![min.x, min.y, max.x, max.y].iter().all(|v| v.is_finite()) {
            return Err(PlanningError::InvalidConfiguration(format!(
                "bounding box {min}..{max} is not finite"
            )));
        }
        let width = cells_along(min.x, max.x, resolution, "x")?;
        let height = cells_along(min.y, max.y, resolution, "y")?;
        if width.checked_mul(height).is_none() {
            return Err(PlanningError::InvalidConfiguration(format!(
                "a {width}x{height} grid is too large"
            )));
        }
        debug!("Created {width}x{height} grid over {min}..{max} at resolution {resolution}");
        Ok(GridMap {
            grid: BoolGrid::new(width, height, false),
            obstacle_policy: ObstaclePolicy::default(),
            min,
            max,
            resolution,
            width,
            height,
            start: start.into(),
            goal: goal.into(),
            obstacle_cells: Vec::new(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }
    pub fn resolution(&self) -> f64 {
        self.resolution
    }
    pub fn min(&self) -> Position {
        self.min
    }
    pub fn max(&self) -> Position {
        self.max
    }
    pub fn start(&self) -> Position {
        self.start
    }
    pub fn goal(&self) -> Position {
        self.goal
    }

    /// Rounds `(value - axis_min) / resolution` half to even. Values too far off the grid to fit
    /// an [i32] saturate, so they still read as out of bounds.
    pub fn to_grid(&self, value: f64, axis_min: f64) -> i32 {
        let scaled = ((value - axis_min) / self.resolution).round_ties_even();
        scaled
            .to_i32()
            .unwrap_or(if scaled > 0.0 { i32::MAX } else { i32::MIN })
    }

    pub fn to_continuous(&self, index: i32, axis_min: f64) -> f64 {
        index as f64 * self.resolution + axis_min
    }

    /// Cell containing `position`, which may lie outside the grid.
    pub fn cell_of(&self, position: Position) -> Point {
        Point::new(
            self.to_grid(position.x, self.min.x),
            self.to_grid(position.y, self.min.y),
        )
    }

    /// Like [cell_of](Self::cell_of), but fails with [PlanningError::OutOfBounds] for cells
    /// outside the grid.
    pub fn locate(&self, position: Position) -> Result<Point> {
        let cell = self.cell_of(position);
        if self.in_bounds(cell.x, cell.y) {
            Ok(cell)
        } else {
            Err(PlanningError::OutOfBounds {
                x: position.x,
                y: position.y,
            })
        }
    }

    pub fn position_of(&self, cell: Point) -> Position {
        Position::new(
            self.to_continuous(cell.x, self.min.x),
            self.to_continuous(cell.y, self.min.y),
        )
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn is_occupied(&self, x: i32, y: i32) -> Result<bool> {
        if self.in_bounds(x, y) {
            Ok(self.grid.get(x, y))
        } else {
            Err(PlanningError::CellOutOfBounds { x, y })
        }
    }

    /// True for cells that are in bounds and free.
    pub fn can_move_to(&self, cell: Point) -> bool {
        self.in_bounds(cell.x, cell.y) && !self.grid.get(cell.x, cell.y)
    }

    /// The free cells of the Moore neighbourhood of `cell`, x-major then y.
    pub fn neighbours(&self, cell: Point) -> impl Iterator<Item = Point> + '_ {
        iproduct!(-1..=1, -1..=1)
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .map(move |(dx, dy)| Point::new(cell.x + dx, cell.y + dy))
            .filter(move |&p| self.can_move_to(p))
    }

    /// Marks the horizontal segment of cells `[to_grid(x_start), to_grid(x_end))` on row
    /// `to_grid(y)` as occupied. Returns how many cells became occupied.
    ///
    /// Non-finite coordinates fail with [PlanningError::ObstacleRangeInvalid] under either policy.
    pub fn add_obstacle_range_x(&mut self, x_range: (f64, f64), y: f64) -> Result<usize> {
        check_finite(&[x_range.0, x_range.1, y])?;
        let row = self.to_grid(y, self.min.y);
        let span = self.to_grid(x_range.0, self.min.x)..self.to_grid(x_range.1, self.min.x);
        self.mark_segment(span, row, Axis::X)
    }

    /// Vertical counterpart of [add_obstacle_range_x](Self::add_obstacle_range_x).
    pub fn add_obstacle_range_y(&mut self, x: f64, y_range: (f64, f64)) -> Result<usize> {
        check_finite(&[x, y_range.0, y_range.1])?;
        let column = self.to_grid(x, self.min.x);
        let span = self.to_grid(y_range.0, self.min.y)..self.to_grid(y_range.1, self.min.y);
        self.mark_segment(span, column, Axis::Y)
    }

    fn mark_segment(&mut self, span: Range<i32>, fixed: i32, axis: Axis) -> Result<usize> {
        if span.is_empty() {
            return Ok(0);
        }
        let (extent, fixed_extent) = match axis {
            Axis::X => (self.width, self.height),
            Axis::Y => (self.height, self.width),
        };
        let fixed_in_bounds = fixed >= 0 && (fixed as usize) < fixed_extent;
        let clamped = span.start.max(0)..span.end.min(extent as i32);
        if !fixed_in_bounds || clamped != span {
            let description = format!(
                "{axis:?} cells {span:?} at {fixed} on a {}x{} grid",
                self.width, self.height
            );
            match self.obstacle_policy {
                ObstaclePolicy::Reject => {
                    return Err(PlanningError::ObstacleRangeInvalid(description));
                }
                ObstaclePolicy::Clamp if !fixed_in_bounds => {
                    warn!("Skipping obstacle {description}: fixed coordinate is off the grid");
                    return Ok(0);
                }
                ObstaclePolicy::Clamp => {
                    warn!("Clamping obstacle {description} to {clamped:?}");
                }
            }
        }
        let mut marked = 0;
        for i in clamped {
            let cell = match axis {
                Axis::X => Point::new(i, fixed),
                Axis::Y => Point::new(fixed, i),
            };
            if !self.grid.get(cell.x, cell.y) {
                self.grid.set(cell.x, cell.y, true);
                self.obstacle_cells.push(cell);
                marked += 1;
            }
        }
        Ok(marked)
    }

    /// Every occupied cell in insertion order. Kept for reporting; search reads the grid.
    pub fn obstacle_cells(&self) -> &[Point] {
        &self.obstacle_cells
    }

    pub fn obstacle_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.obstacle_cells.iter().map(|&c| self.position_of(c))
    }

    /// Groups free cells into 8-connected components.
    pub fn components(&self) -> Components {
        let mut components = UnionFind::new(self.width * self.height);
        for x in 0..self.width as i32 {
            for y in 0..self.height as i32 {
                let point = Point::new(x, y);
                if !self.can_move_to(point) {
                    continue;
                }
                // The other half of the neighbourhood is covered when visiting those cells.
                for (dx, dy) in [(1, -1), (1, 0), (1, 1), (0, 1)] {
                    let n = Point::new(x + dx, y + dy);
                    if self.can_move_to(n) {
                        components.union(self.ix(point), self.ix(n));
                    }
                }
            }
        }
        Components {
            components,
            width: self.width,
            height: self.height,
        }
    }

    fn ix(&self, p: Point) -> usize {
        p.y as usize * self.width + p.x as usize
    }
}

/// Connected components of the free cells of a [GridMap] under 8-connectivity.
#[derive(Clone, Debug)]
pub struct Components {
    components: UnionFind<usize>,
    width: usize,
    height: usize,
}

impl Components {
    /// Checks if both cells are in bounds and share a component. Occupied cells are only
    /// reachable from themselves.
    pub fn reachable(&self, a: &Point, b: &Point) -> bool {
        let in_bounds = |p: &Point| {
            p.x >= 0 && p.y >= 0 && (p.x as usize) < self.width && (p.y as usize) < self.height
        };
        if !(in_bounds(a) && in_bounds(b)) {
            return false;
        }
        let ix = |p: &Point| p.y as usize * self.width + p.x as usize;
        self.components.equiv(ix(a), ix(b))
    }
}

impl fmt::Display for GridMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for y in (0..self.height as i32).rev() {
            let row = (0..self.width as i32)
                .map(|x| if self.grid.get(x, y) { '#' } else { '.' })
                .collect::<String>();
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}
