use grid_planning::{AStarPlanner, Expansion, GridMap, PlanningError};

// Plans across a 70x70 field at resolution 2 with a wall along x = 20 reaching from the bottom
// edge up to y = 40. Prints the grid with
// - # marking an obstacle
// - o marking a cell on the path
// - S and G marking the start and goal
// followed by the path in continuous coordinates.

fn main() -> Result<(), PlanningError> {
    let (sx, sy) = (10.0, 10.0);
    let (gx, gy) = (50.0, 50.0);
    let resolution = 2.0;
    let mut map = GridMap::new((sx, sy), (gx, gy), (-10.0, -10.0), (60.0, 60.0), resolution)?;

    map.add_obstacle_range_x((-10.0, 60.0), -10.0)?;
    map.add_obstacle_range_y(60.0, (-10.0, 60.0))?;
    map.add_obstacle_range_x((-10.0, 60.0), 60.0)?;
    map.add_obstacle_range_y(-10.0, (-10.0, -60.0))?;
    map.add_obstacle_range_y(20.0, (-10.0, 40.0))?;

    let planner = AStarPlanner::new(&map);
    let mut expanded = 0;
    let path = planner.plan_with_observer((sx, sy), (gx, gy), &mut |_: &Expansion| expanded += 1)?;

    let cells = path.cells();
    let mut rows: Vec<Vec<char>> = map
        .to_string()
        .lines()
        .map(|line| line.chars().collect())
        .collect();
    let top = map.height() as i32 - 1;
    for (i, cell) in cells.iter().enumerate() {
        let mark = match i {
            0 => 'S',
            i if i == cells.len() - 1 => 'G',
            _ => 'o',
        };
        rows[(top - cell.y) as usize][cell.x as usize] = mark;
    }
    for row in rows {
        println!("{}", row.into_iter().collect::<String>());
    }
    println!("Expanded {expanded} cells, {} steps:", path.cost());
    for p in path.positions() {
        println!("{p}");
    }
    Ok(())
}
