use grid_planning::{
    AStarPlanner, Expansion, Frontier, GridMap, ObstaclePolicy, PlanningError, Point, Position,
};
use std::thread;

/// A 70x70 field at resolution 2 with a wall along x = 20 from the bottom edge up to y = 40.
fn walled_field() -> GridMap {
    let mut map =
        GridMap::new((10.0, 10.0), (50.0, 50.0), (-10.0, -10.0), (60.0, 60.0), 2.0).unwrap();
    map.add_obstacle_range_x((-10.0, 60.0), -10.0).unwrap();
    map.add_obstacle_range_y(60.0, (-10.0, 60.0)).unwrap();
    map.add_obstacle_range_x((-10.0, 60.0), 60.0).unwrap();
    map.add_obstacle_range_y(-10.0, (-10.0, -60.0)).unwrap();
    map.add_obstacle_range_y(20.0, (-10.0, 40.0)).unwrap();
    map
}

#[test]
fn routes_around_the_partition() {
    let map = walled_field();
    let path = AStarPlanner::new(&map).plan_endpoints().unwrap();
    let positions = path.positions();
    assert_eq!(positions.first(), Some(&Position::new(10.0, 10.0)));
    assert_eq!(positions.last(), Some(&Position::new(50.0, 50.0)));

    // The wall occupies column 15 up to row 24, so the crossing must happen at row 25 or above.
    let crossings = path.cells().into_iter().filter(|c| c.x == 15).collect::<Vec<_>>();
    assert!(!crossings.is_empty());
    assert!(crossings.iter().all(|c| c.y >= 25), "{crossings:?}");

    for waypoint in &path.waypoints {
        let cell = waypoint.cell;
        assert!(!map.is_occupied(cell.x, cell.y).unwrap());
    }
    for pair in path.waypoints.windows(2) {
        let (a, b) = (pair[0].cell, pair[1].cell);
        assert!((a.x - b.x).abs() <= 1 && (a.y - b.y).abs() <= 1 && a != b);
        assert_eq!(pair[1].cost, pair[0].cost + 1);
    }
    assert_eq!(path.cost() as usize, path.len() - 1);
}

#[test]
fn repeated_plans_are_identical() {
    let map = walled_field();
    for frontier in [Frontier::LinearScan, Frontier::BinaryHeap] {
        let mut planner = AStarPlanner::new(&map);
        planner.frontier = frontier;
        let first = planner.plan((10.0, 10.0), (50.0, 50.0)).unwrap();
        let second = planner.plan((10.0, 10.0), (50.0, 50.0)).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn map_is_shared_between_threads() {
    let map = walled_field();
    let reference = AStarPlanner::new(&map).plan_endpoints().unwrap();
    thread::scope(|s| {
        let handles = (0..4)
            .map(|_| s.spawn(|| AStarPlanner::new(&map).plan_endpoints()))
            .collect::<Vec<_>>();
        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), reference);
        }
    });
}

#[test]
fn observer_does_not_change_the_result() {
    let map = walled_field();
    let planner = AStarPlanner::new(&map);
    let mut trace: Vec<Point> = Vec::new();
    let observed = planner
        .plan_with_observer((10.0, 10.0), (50.0, 50.0), &mut |e: &Expansion| {
            trace.push(e.cell)
        })
        .unwrap();
    assert_eq!(observed, planner.plan((10.0, 10.0), (50.0, 50.0)).unwrap());
    assert_eq!(trace.len(), observed.stats.expanded);
    assert!(!trace.contains(&Point::new(30, 30)));
}

#[test]
fn goal_on_far_edge_is_out_of_bounds() {
    let map = walled_field();
    let result = AStarPlanner::new(&map).plan((10.0, 10.0), (60.0, 60.0));
    assert_eq!(result, Err(PlanningError::OutOfBounds { x: 60.0, y: 60.0 }));
}

#[test]
fn sealed_goal_has_no_path() {
    let mut map = walled_field();
    // Box in the cell at (50, 50), i.e. cell (30, 30).
    map.add_obstacle_range_x((48.0, 54.0), 48.0).unwrap();
    map.add_obstacle_range_x((48.0, 54.0), 52.0).unwrap();
    map.add_obstacle_range_y(48.0, (50.0, 52.0)).unwrap();
    map.add_obstacle_range_y(52.0, (50.0, 52.0)).unwrap();
    assert!(!map.components().reachable(&Point::new(10, 10), &Point::new(30, 30)));
    let result = AStarPlanner::new(&map).plan_endpoints();
    assert_eq!(
        result,
        Err(PlanningError::NoPathFound {
            start: Point::new(10, 10),
            goal: Point::new(30, 30)
        })
    );
}

#[test]
fn strict_policy_rejects_the_far_walls() {
    let mut map =
        GridMap::new((10.0, 10.0), (50.0, 50.0), (-10.0, -10.0), (60.0, 60.0), 2.0).unwrap();
    map.obstacle_policy = ObstaclePolicy::Reject;
    assert!(map.add_obstacle_range_x((-10.0, 60.0), -10.0).is_ok());
    assert!(matches!(
        map.add_obstacle_range_y(60.0, (-10.0, 60.0)),
        Err(PlanningError::ObstacleRangeInvalid(_))
    ));
    assert!(matches!(
        map.add_obstacle_range_x((-10.0, 60.0), 60.0),
        Err(PlanningError::ObstacleRangeInvalid(_))
    ));
    assert_eq!(map.obstacle_cells().len(), 35);
}
