//! A* search over a [GridMap] with 8-connected unit-cost moves and a Euclidean heuristic.
//!
//! Discovered cells live in an [IndexMap] keyed by cell, so a cell's index doubles as its
//! discovery order and parents are stored as indices into that map. The index is also the
//! tie-breaker between open nodes of equal `f`: the earliest discovered wins.
use crate::error::{PlanningError, Result};
use crate::grid_map::{GridMap, Position};
use fxhash::FxBuildHasher;
use grid_util::point::Point;
use indexmap::map::Entry::{Occupied, Vacant};
use indexmap::IndexMap;
use log::{debug, info, warn};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

const NO_PARENT: usize = usize::MAX;

/// Straight-line distance between two cells, in cells.
pub fn euclidean(a: &Point, b: &Point) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

/// How the open set finds its minimum-`f` node. Both break ties on discovery order and therefore
/// return the same paths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Frontier {
    /// Scans every open node on each expansion.
    LinearScan,
    /// Binary heap with lazy deletion of stale entries.
    #[default]
    BinaryHeap,
}

/// Snapshot handed to a [SearchObserver] each time a node is expanded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Expansion {
    pub cell: Point,
    pub position: Position,
    pub g: u32,
    pub f: f64,
    /// Open set size after removing this node.
    pub open: usize,
    /// Closed set size including this node.
    pub closed: usize,
}

/// Watches search progress, e.g. to animate it. Observers cannot influence the search.
pub trait SearchObserver {
    fn on_expand(&mut self, _expansion: &Expansion) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {}

impl<F: FnMut(&Expansion)> SearchObserver for F {
    fn on_expand(&mut self, expansion: &Expansion) {
        self(expansion)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub expanded: usize,
    pub discovered: usize,
    pub relaxed: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Waypoint {
    pub cell: Point,
    pub position: Position,
    /// Steps from the start.
    pub cost: u32,
}

/// A start-to-goal sequence of cells, both ends included.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    pub waypoints: Vec<Waypoint>,
    pub stats: SearchStats,
}

impl Path {
    pub fn positions(&self) -> Vec<Position> {
        self.waypoints.iter().map(|w| w.position).collect()
    }
    pub fn cells(&self) -> Vec<Point> {
        self.waypoints.iter().map(|w| w.cell).collect()
    }
    /// Number of steps, each costing 1 whether straight or diagonal.
    pub fn cost(&self) -> u32 {
        self.waypoints.last().map_or(0, |w| w.cost)
    }
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

#[derive(Clone, Debug)]
struct Node {
    g: u32,
    h: f64,
    parent: usize,
    closed: bool,
}

impl Node {
    fn f(&self) -> f64 {
        self.g as f64 + self.h
    }
}

struct SmallestCostHolder {
    estimated_cost: f64,
    index: usize,
}

impl Eq for SmallestCostHolder {}

impl PartialEq for SmallestCostHolder {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for SmallestCostHolder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SmallestCostHolder {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed on both keys: the max-heap pops the smallest f, then the earliest discovery.
        match other.estimated_cost.total_cmp(&self.estimated_cost) {
            Ordering::Equal => other.index.cmp(&self.index),
            s => s,
        }
    }
}

enum OpenSet {
    Scan(Vec<usize>),
    Heap(BinaryHeap<SmallestCostHolder>),
}

impl OpenSet {
    fn new(frontier: Frontier) -> OpenSet {
        match frontier {
            Frontier::LinearScan => OpenSet::Scan(Vec::new()),
            Frontier::BinaryHeap => OpenSet::Heap(BinaryHeap::new()),
        }
    }

    fn push(&mut self, index: usize, f: f64) {
        match self {
            OpenSet::Scan(open) => open.push(index),
            OpenSet::Heap(heap) => heap.push(SmallestCostHolder {
                estimated_cost: f,
                index,
            }),
        }
    }

    /// Called after the node at `index` got a lower `f` in place.
    fn decrease(&mut self, index: usize, f: f64) {
        // The scan reads f from the node itself; the heap needs a fresh entry.
        if let OpenSet::Heap(_) = self {
            self.push(index, f);
        }
    }

    fn pop(&mut self, nodes: &FxIndexMap<Point, Node>) -> Option<usize> {
        match self {
            OpenSet::Scan(open) => {
                // Indices are pushed in discovery order, so the first minimum is the oldest.
                let mut best: Option<(usize, f64)> = None;
                for (pos, &index) in open.iter().enumerate() {
                    let f = nodes.get_index(index).map_or(f64::INFINITY, |(_, n)| n.f());
                    if best.map_or(true, |(_, best_f)| f < best_f) {
                        best = Some((pos, f));
                    }
                }
                best.map(|(pos, _)| open.remove(pos))
            }
            OpenSet::Heap(heap) => {
                // An entry is stale once its node has been expanded through a cheaper entry.
                while let Some(SmallestCostHolder { index, .. }) = heap.pop() {
                    if nodes.get_index(index).is_some_and(|(_, n)| !n.closed) {
                        return Some(index);
                    }
                }
                None
            }
        }
    }
}

/// Plans paths on a borrowed [GridMap]. Each call to [plan](Self::plan) builds its own open and
/// closed sets, so one map can back any number of planners, including on other threads.
#[derive(Clone, Debug)]
pub struct AStarPlanner<'a> {
    map: &'a GridMap,
    pub frontier: Frontier,
}

impl<'a> AStarPlanner<'a> {
    pub fn new(map: &'a GridMap) -> AStarPlanner<'a> {
        AStarPlanner {
            map,
            frontier: Frontier::default(),
        }
    }

    pub fn map(&self) -> &'a GridMap {
        self.map
    }

    /// Plans between the start and goal the map was constructed with.
    pub fn plan_endpoints(&self) -> Result<Path> {
        self.plan(self.map.start(), self.map.goal())
    }

    pub fn plan(&self, start: impl Into<Position>, goal: impl Into<Position>) -> Result<Path> {
        self.plan_with_observer(start, goal, &mut NoopObserver)
    }

    /// Computes a minimum-step path from `start` to `goal`, reporting every expansion to
    /// `observer`.
    ///
    /// Fails with [PlanningError::OutOfBounds] before searching if either end lies off the grid
    /// and with [PlanningError::NoPathFound] if the goal cannot be reached. The start cell is
    /// never checked for obstacles, so a search may leave an occupied start.
    pub fn plan_with_observer<O: SearchObserver + ?Sized>(
        &self,
        start: impl Into<Position>,
        goal: impl Into<Position>,
        observer: &mut O,
    ) -> Result<Path> {
        let start = self.map.locate(start.into())?;
        let goal = self.map.locate(goal.into())?;
        info!(
            "Planning from {} to {} on a {}x{} grid",
            start,
            goal,
            self.map.width(),
            self.map.height()
        );
        if start != goal && !self.map.can_move_to(goal) {
            info!("Goal {} is occupied", goal);
            return Err(PlanningError::NoPathFound { start, goal });
        }
        let result = Search::new(self.map, goal, self.frontier).run(start, observer);
        if let Ok(path) = &result {
            info!(
                "Found a {} step path after expanding {} nodes",
                path.cost(),
                path.stats.expanded
            );
        }
        result
    }
}

struct Search<'a> {
    map: &'a GridMap,
    goal: Point,
    nodes: FxIndexMap<Point, Node>,
    open: OpenSet,
    open_len: usize,
    stats: SearchStats,
}

impl<'a> Search<'a> {
    fn new(map: &'a GridMap, goal: Point, frontier: Frontier) -> Search<'a> {
        Search {
            map,
            goal,
            nodes: FxIndexMap::default(),
            open: OpenSet::new(frontier),
            open_len: 0,
            stats: SearchStats::default(),
        }
    }

    fn run<O: SearchObserver + ?Sized>(mut self, start: Point, observer: &mut O) -> Result<Path> {
        self.nodes.insert(
            start,
            Node {
                g: 0,
                h: 0.0,
                parent: NO_PARENT,
                closed: false,
            },
        );
        self.open.push(0, 0.0);
        self.open_len = 1;

        while let Some(index) = self.open.pop(&self.nodes) {
            self.open_len -= 1;
            let Some((&cell, node)) = self.nodes.get_index_mut(index) else {
                continue;
            };
            if cell == self.goal {
                return Ok(self.reconstruct(index));
            }
            node.closed = true;
            let (g, f) = (node.g, node.f());
            self.stats.expanded += 1;
            observer.on_expand(&Expansion {
                cell,
                position: self.map.position_of(cell),
                g,
                f,
                open: self.open_len,
                closed: self.stats.expanded,
            });
            self.expand(index, cell, g + 1);
        }
        warn!(
            "Open set exhausted after {} expansions, {} is not reachable from {}",
            self.stats.expanded, self.goal, start
        );
        Err(PlanningError::NoPathFound {
            start,
            goal: self.goal,
        })
    }

    fn expand(&mut self, index: usize, cell: Point, g: u32) {
        let map = self.map;
        for neighbour in map.neighbours(cell) {
            match self.nodes.entry(neighbour) {
                Vacant(e) => {
                    let h = euclidean(&neighbour, &self.goal);
                    let n = e.index();
                    e.insert(Node {
                        g,
                        h,
                        parent: index,
                        closed: false,
                    });
                    self.open.push(n, g as f64 + h);
                    self.open_len += 1;
                    self.stats.discovered += 1;
                }
                Occupied(mut e) => {
                    let n = e.index();
                    let existing = e.get_mut();
                    // h depends only on the cell and the goal, so it is kept as first computed.
                    if !existing.closed && existing.g > g {
                        debug!("Relaxing {} from g={} to g={}", neighbour, existing.g, g);
                        existing.g = g;
                        existing.parent = index;
                        self.open.decrease(n, existing.f());
                        self.stats.relaxed += 1;
                    }
                }
            }
        }
    }

    fn reconstruct(&self, index: usize) -> Path {
        let mut waypoints: Vec<Waypoint> = std::iter::successors(Some(index), |&i| {
            self.nodes
                .get_index(i)
                .map(|(_, node)| node.parent)
                .filter(|&parent| parent != NO_PARENT)
        })
        .filter_map(|i| self.nodes.get_index(i))
        .map(|(&cell, node)| Waypoint {
            cell,
            position: self.map.position_of(cell),
            cost: node.g,
        })
        .collect();
        waypoints.reverse();
        Path {
            waypoints,
            stats: self.stats,
        }
    }
}
