/*
This code is part of the MOLASSES lava flow simulation library.
Authors: Dr. John Lindsay
Created: 02/06/2023
Last Modified: 27/01/2024
License: MIT
*/
use crate::error::{GridEdge, SimError};
use crate::grid::FlowGrid;

// Parent direction bits. A set bit in a cell's parentcode names the
// direction of a cell that donated to it during the current step; lava is
// never pushed back toward a parent.
pub const PARENT_SOUTH: u8 = 1;
pub const PARENT_EAST: u8 = 2;
pub const PARENT_NORTH: u8 = 4;
pub const PARENT_WEST: u8 = 8;

const SQRT2: f64 = std::f64::consts::SQRT_2;

/// Whether donation considers the four cardinal neighbors or the full
/// Moore neighborhood of eight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborMode {
    Cardinal,
    Moore,
}

/// A neighbor eligible to receive lava, with its (distance-normalized)
/// elevation drop below the donating cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub row: usize,
    pub col: usize,
    pub elev_diff: f64,
}

/// The parent bits a receiving cell records for a donation from `center`.
/// Diagonal donors compose the bits of their two cardinal components, e.g.
/// a donor to the south-east encodes `PARENT_SOUTH | PARENT_EAST`.
pub fn parent_code(center: (usize, usize), neighbor: (usize, usize)) -> u8 {
    let mut code = 0u8;
    if neighbor.0 > center.0 {
        code |= PARENT_SOUTH;
    } else if neighbor.0 < center.0 {
        code |= PARENT_NORTH;
    }
    if neighbor.1 < center.1 {
        code |= PARENT_EAST;
    } else if neighbor.1 > center.1 {
        code |= PARENT_WEST;
    }
    code
}

/// Fills `list` with the neighbors of `(row, col)` that may receive lava:
/// in bounds, strictly lower than the center's surface, and not a parent
/// of the center. A center on any edge of the grid fails with the matching
/// `OffGrid` kind, which ends the current run.
///
/// `elev_diff` is the drop from the center's surface; diagonal drops are
/// divided by sqrt(2) to normalize by geometric distance.
pub fn find_eligible(
    grid: &FlowGrid,
    row: usize,
    col: usize,
    mode: NeighborMode,
    list: &mut Vec<Neighbor>,
) -> Result<(), SimError> {
    list.clear();

    if row == 0 {
        return Err(SimError::OffGrid(GridEdge::South));
    }
    if row + 1 >= grid.rows {
        return Err(SimError::OffGrid(GridEdge::North));
    }
    if col == 0 {
        return Err(SimError::OffGrid(GridEdge::West));
    }
    if col + 1 >= grid.columns {
        return Err(SimError::OffGrid(GridEdge::East));
    }

    let center = grid[(row, col)];
    let code = center.parentcode;

    let consider = |mask: u8, n_row: usize, n_col: usize, diagonal: bool,
                    list: &mut Vec<Neighbor>| {
        if code & mask != 0 {
            return; // a parent lies in this direction
        }
        let neighbor_elev = grid[(n_row, n_col)].eff_elev;
        if center.eff_elev > neighbor_elev {
            let mut elev_diff = center.eff_elev - neighbor_elev;
            if diagonal {
                elev_diff /= SQRT2;
            }
            list.push(Neighbor {
                row: n_row,
                col: n_col,
                elev_diff,
            });
        }
    };

    // cardinal directions; row + 1 is north of row because row 0 is the
    // southernmost row
    consider(PARENT_NORTH, row + 1, col, false, list);
    consider(PARENT_EAST, row, col + 1, false, list);
    consider(PARENT_SOUTH, row - 1, col, false, list);
    consider(PARENT_WEST, row, col - 1, false, list);

    if mode == NeighborMode::Moore {
        // a diagonal is blocked when either of its component directions
        // holds a parent
        consider(PARENT_SOUTH | PARENT_WEST, row - 1, col - 1, true, list);
        consider(PARENT_SOUTH | PARENT_EAST, row - 1, col + 1, true, list);
        consider(PARENT_NORTH | PARENT_EAST, row + 1, col + 1, true, list);
        consider(PARENT_NORTH | PARENT_WEST, row + 1, col - 1, true, list);
    }

    Ok(())
}
