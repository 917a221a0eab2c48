//! Built-in facility map used by the CLI and the API tests.
//!
//! Four wings side by side, separated by wall columns with two doorways each:
//!
//! ```text
//! x:  0..7        8..15              16..23          24..29
//!     Main Hall | Production Floor | Research Wing | Command Center
//! ```

use clearance_core::GridWorld;
use contracts::{Cell, Zone};

pub const FACILITY_WIDTH: i32 = 30;
pub const FACILITY_HEIGHT: i32 = 20;

/// Wall columns; each is the first column of the wing to its right.
const PARTITIONS: [i32; 3] = [8, 16, 24];
const DOORWAY_ROWS: [i32; 2] = [4, 15];

pub const LOBBY: Cell = Cell::new(3, 10);

pub fn facility_layout() -> GridWorld {
    let mut world = GridWorld::new(FACILITY_WIDTH, FACILITY_HEIGHT);
    let bottom = FACILITY_HEIGHT - 1;
    world.add_zone(Zone::new("hall", "Main Hall"), Cell::new(0, 0), Cell::new(7, bottom));
    world.add_zone(
        Zone::new("production", "Production Floor"),
        Cell::new(8, 0),
        Cell::new(15, bottom),
    );
    world.add_zone(
        Zone::new("research", "Research Wing"),
        Cell::new(16, 0),
        Cell::new(23, bottom),
    );
    world.add_zone(
        Zone::new("command", "Command Center"),
        Cell::new(24, 0),
        Cell::new(FACILITY_WIDTH - 1, bottom),
    );

    for x in PARTITIONS {
        for y in 0..FACILITY_HEIGHT {
            if !DOORWAY_ROWS.contains(&y) {
                world.set_wall(Cell::new(x, y));
            }
        }
    }
    world
}

/// Derive a deterministic seed for an agent at a given tick and phase.
pub(crate) fn deterministic_agent_seed(seed: u64, agent_id: &str, tick: u64, phase: u64) -> u64 {
    let mut h = seed;
    h = h.wrapping_add(tick.wrapping_mul(0x9e3779b97f4a7c15));
    h = h.wrapping_add(phase.wrapping_mul(0xbf58476d1ce4e5b9));
    for b in agent_id.bytes() {
        h = h.wrapping_add(u64::from(b));
        h = h.wrapping_mul(0x94d049bb133111eb);
    }
    h ^ (h >> 31)
}

/// Pick an in-bounds cell from `roll`.
pub(crate) fn cell_from_roll(world: &GridWorld, roll: u64) -> Cell {
    let width = u64::try_from(world.width().max(1)).unwrap_or(1);
    let height = u64::try_from(world.height().max(1)).unwrap_or(1);
    let x = i32::try_from(roll % width).unwrap_or(0);
    let y = i32::try_from((roll >> 32) % height).unwrap_or(0);
    Cell::new(x, y)
}
