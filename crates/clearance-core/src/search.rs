//! Expanding ring search for the nearest safe cell.

use contracts::{AgentId, AgentRankState, Cell};

use crate::access::AccessPolicy;
use crate::host::WorldView;

/// Cells whose Euclidean distance from `center` lies in `(radius - 1, radius]`,
/// ordered by distance, then row, then column.
pub fn ring_cells(center: Cell, radius: u32) -> Vec<Cell> {
    if radius == 0 {
        return vec![center];
    }
    let r = i64::from(radius);
    let outer = r * r;
    let inner = (r - 1) * (r - 1);
    let span = radius as i32;
    let mut cells = Vec::new();
    for dy in -span..=span {
        for dx in -span..=span {
            let d2 = i64::from(dx) * i64::from(dx) + i64::from(dy) * i64::from(dy);
            if d2 > inner && d2 <= outer {
                cells.push((d2, dy, dx));
            }
        }
    }
    cells.sort_unstable();
    cells
        .into_iter()
        .filter_map(|(_, dy, dx)| center.checked_offset(dx, dy))
        .collect()
}

/// Nearest walkable, unrestricted cell around the agent, searching rings of
/// radius 1 up to `max_radius`. `None` means "do nothing this cycle".
pub fn find_nearest_safe_cell<W: WorldView + ?Sized>(
    world: &W,
    policy: &AccessPolicy,
    agent: &AgentId,
    state: Option<&AgentRankState>,
    max_radius: u32,
) -> Option<Cell> {
    let origin = world.position(agent)?;
    (1..=max_radius).find_map(|radius| {
        ring_cells(origin, radius).into_iter().find(|&cell| {
            world.is_walkable(agent, cell) && !policy.is_restricted(world, agent, cell, state)
        })
    })
}
