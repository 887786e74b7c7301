/*
This code is part of the MOLASSES lava flow simulation library.
Authors: Dr. John Lindsay
Created: 16/06/2023
Last Modified: 27/01/2024
License: MIT
*/
use crate::active::ActiveList;
use crate::error::SimError;
use crate::grid::{FlowGrid, NOT_ACTIVE};
use crate::neighbors::{find_eligible, parent_code, Neighbor, NeighborMode};
use crate::rng::SimRng;

/// How a donating cell's excess is shared among its eligible neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowPolicy {
    /// Every eligible neighbor receives the same share.
    EqualSplit,
    /// Each neighbor's share is proportional to its elevation drop.
    SlopeProportional,
}

/// The outcome of one distribution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributeOutcome {
    Complete,
    /// A cell inside the area of interest became active during the pass.
    AoiHit,
}

/// One pass of the cellular automaton: every cell on the active list,
/// including cells appended while the pass runs, donates its
/// above-residual excess to its eligible downhill neighbors.
pub struct Distributor {
    pub policy: FlowPolicy,
    pub mode: NeighborMode,
    /// Keep the emerging active front across pulses. When false, the pass
    /// ends by dropping every appended cell so the next pulse starts from
    /// the vent alone.
    pub retain_front: bool,
    neighbors: Vec<Neighbor>,
}

impl Distributor {
    pub fn new(policy: FlowPolicy, mode: NeighborMode, retain_front: bool) -> Distributor {
        Distributor {
            policy,
            mode,
            retain_front,
            neighbors: Vec::with_capacity(8),
        }
    }

    pub fn distribute(
        &mut self,
        grid: &mut FlowGrid,
        active: &mut ActiveList,
        rng: &mut SimRng,
    ) -> Result<DistributeOutcome, SimError> {
        let mut aoi_hit = false;

        let mut i = 0;
        while i < active.len() {
            let (row, col) = active.get(i);
            i += 1;

            let donor = grid[(row, col)];
            let excess = donor.thickness() - donor.residual;
            if excess <= 0f64 {
                continue; // nothing to give
            }

            find_eligible(grid, row, col, self.mode, &mut self.neighbors)?;
            if self.neighbors.is_empty() {
                continue; // ponded against higher ground and parents
            }

            // the share order is randomized so the spread has no
            // directional bias
            rng.shuffle(&mut self.neighbors);

            let neighbor_count = self.neighbors.len();
            let total_diff: f64 = self.neighbors.iter().map(|n| n.elev_diff).sum();
            if self.policy == FlowPolicy::SlopeProportional && total_diff <= 0f64 {
                return Err(SimError::SlopeInvariant {
                    row,
                    col,
                    total: total_diff,
                });
            }

            for n in 0..neighbor_count {
                let neighbor = self.neighbors[n];
                let receiving = (neighbor.row, neighbor.col);

                let share = match self.policy {
                    FlowPolicy::EqualSplit => excess / neighbor_count as f64,
                    FlowPolicy::SlopeProportional => excess * neighbor.elev_diff / total_diff,
                };

                let code = parent_code((row, col), receiving);
                let cell = &mut grid[receiving];
                match self.policy {
                    FlowPolicy::EqualSplit => {
                        cell.parentcode = code;
                    }
                    FlowPolicy::SlopeProportional => {
                        // a cell walled in by donors on all four sides is
                        // freed again
                        let merged = cell.parentcode | code;
                        cell.parentcode = if merged == 15 { 0 } else { merged };
                    }
                }

                cell.eff_elev += share;
                let activates = cell.thickness() > cell.residual && cell.active == NOT_ACTIVE;
                let in_aoi = cell.aoi;
                if activates {
                    let index = active.push(receiving.0, receiving.1)?;
                    grid[receiving].active = index as i32;
                    if in_aoi {
                        aoi_hit = true;
                    }
                }
            }

            grid[(row, col)].eff_elev -= excess;
        }

        if !self.retain_front {
            for k in 1..active.len() {
                let (row, col) = active.get(k);
                grid[(row, col)].active = NOT_ACTIVE;
            }
            active.truncate_to_front();
        }

        if aoi_hit {
            return Ok(DistributeOutcome::AoiHit);
        }
        Ok(DistributeOutcome::Complete)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::active::ActiveList;
    use crate::error::GridEdge;
    use crate::grid::FlowGrid;
    use crate::neighbors::NeighborMode;
    use crate::rng::SimRng;

    fn grid_from_dem(rows: usize, columns: usize, dem: &[f64]) -> FlowGrid {
        let mut grid = FlowGrid::new(rows, columns);
        for row in 0..rows {
            for col in 0..columns {
                grid[(row, col)].dem_elev = dem[row * columns + col];
                grid[(row, col)].eff_elev = dem[row * columns + col];
            }
        }
        grid
    }

    fn activate_vent(grid: &mut FlowGrid, active: &mut ActiveList, cell: (usize, usize)) {
        active.set_front(cell.0, cell.1);
        grid[cell].active = 0;
    }

    fn total_volume(grid: &FlowGrid) -> f64 {
        let mut volume = 0.0;
        for row in 0..grid.rows {
            for col in 0..grid.columns {
                volume += grid[(row, col)].thickness();
            }
        }
        volume
    }

    // A pulse on a flat 3x3 grid splits equally among the four cardinal
    // neighbors and empties the centre. The activated ring sits on the
    // grid margin, so the same pass then runs off the map; the shared
    // volume is already in place when it does.
    #[test]
    fn test_equal_split_on_a_flat_grid() {
        let mut grid = grid_from_dem(3, 3, &[0.0; 9]);
        let mut active = ActiveList::for_grid(3, 3);
        let mut rng = SimRng::with_seed(11);
        let mut distributor =
            Distributor::new(FlowPolicy::EqualSplit, NeighborMode::Cardinal, false);

        grid[(1, 1)].eff_elev = 4.0; // one pulse of 4 cubic metres on 1 m cells
        activate_vent(&mut grid, &mut active, (1, 1));

        let err = distributor
            .distribute(&mut grid, &mut active, &mut rng)
            .unwrap_err();
        assert!(matches!(err, SimError::OffGrid(_)));
        assert_eq!(grid[(1, 1)].eff_elev, 0.0);
        for cell in [(0, 1), (2, 1), (1, 0), (1, 2)] {
            assert_eq!(grid[cell].eff_elev, 1.0, "{:?}", cell);
        }
        for cell in [(0, 0), (0, 2), (2, 0), (2, 2)] {
            assert_eq!(grid[cell].eff_elev, 0.0, "{:?}", cell);
        }
        assert!((total_volume(&grid) - 4.0).abs() < 1e-12);
    }

    // With a retaining residual the four cardinal neighbors each keep an
    // equal share and the pass completes quietly.
    #[test]
    fn test_equal_split_completes_when_the_ring_retains() {
        let mut grid = grid_from_dem(5, 5, &[0.0; 25]);
        grid.fill_residual(1.5);
        let mut active = ActiveList::for_grid(5, 5);
        let mut rng = SimRng::with_seed(11);
        let mut distributor =
            Distributor::new(FlowPolicy::EqualSplit, NeighborMode::Cardinal, false);

        grid[(2, 2)].eff_elev = 4.0;
        activate_vent(&mut grid, &mut active, (2, 2));

        let outcome = distributor
            .distribute(&mut grid, &mut active, &mut rng)
            .unwrap();
        assert_eq!(outcome, DistributeOutcome::Complete);
        // excess 2.5 split four ways; each receiver holds 0.625 < 1.5
        assert_eq!(grid[(2, 2)].eff_elev, 1.5);
        for cell in [(1, 2), (3, 2), (2, 1), (2, 3)] {
            assert_eq!(grid[cell].eff_elev, 0.625, "{:?}", cell);
        }
        assert!((total_volume(&grid) - 4.0).abs() < 1e-12);
        // the pass ended with only the vent on the list
        assert_eq!(active.len(), 1);
        assert_eq!(grid[(1, 2)].active, NOT_ACTIVE);
    }

    // A single downhill neighbor receives everything under the
    // slope-proportional policy, and holds it when it has nowhere lower
    // to spread.
    #[test]
    fn test_slope_proportional_single_receiver() {
        // the middle row falls to the east, walled by high ground
        let dem = [
            10.0, 10.0, 10.0, 10.0, //
            10.0, 0.0, 0.0, 10.0, //
            10.0, 10.0, 10.0, 10.0,
        ];
        let mut grid = grid_from_dem(3, 4, &dem);
        let mut active = ActiveList::for_grid(3, 4);
        let mut rng = SimRng::with_seed(5);
        let mut distributor =
            Distributor::new(FlowPolicy::SlopeProportional, NeighborMode::Cardinal, true);

        grid[(1, 1)].eff_elev = 2.0; // a pulse of 2 on the western cell
        activate_vent(&mut grid, &mut active, (1, 1));

        distributor
            .distribute(&mut grid, &mut active, &mut rng)
            .unwrap();
        assert_eq!(grid[(1, 1)].eff_elev, 0.0);
        assert_eq!(grid[(1, 2)].eff_elev, 2.0);
        assert_eq!(grid[(1, 3)].eff_elev, 10.0); // never touched
        assert!((total_volume(&grid) - 2.0).abs() < 1e-12);
        // the receiving cell stays on the active front
        assert_eq!(active.len(), 2);
        assert_eq!(grid[(1, 2)].active, 1);
    }

    // Proportional shares follow the elevation drops.
    #[test]
    fn test_slope_proportional_shares_follow_drops() {
        let dem = [
            10.0, 10.0, 10.0, //
            10.0, 4.0, 1.0, // east neighbor is 3 lower than the centre
            10.0, 3.0, 10.0, // south neighbor is 1 lower
        ];
        // row 0 of the grid is the southern row: build the dem so that the
        // centre (1,1) has a south neighbor at (0,1) and east at (1,2)
        let dem_south_first = [
            dem[6], dem[7], dem[8], //
            dem[3], dem[4], dem[5], //
            dem[0], dem[1], dem[2],
        ];
        let mut grid = grid_from_dem(3, 3, &dem_south_first);
        let mut active = ActiveList::for_grid(3, 3);
        let mut rng = SimRng::with_seed(23);
        let mut distributor =
            Distributor::new(FlowPolicy::SlopeProportional, NeighborMode::Cardinal, true);

        // receivers retain everything; only the donor sheds
        grid.fill_residual(10.0);
        grid[(1, 1)].residual = 0.0;
        grid[(1, 1)].eff_elev = 8.0;
        activate_vent(&mut grid, &mut active, (1, 1));

        distributor
            .distribute(&mut grid, &mut active, &mut rng)
            .unwrap();

        // drops: east 8 - 1 = 7, south 8 - 3 = 5; excess 4 split 7:5
        let east_share = 4.0 * 7.0 / 12.0;
        let south_share = 4.0 * 5.0 / 12.0;
        assert!((grid[(1, 2)].eff_elev - (1.0 + east_share)).abs() < 1e-12);
        assert!((grid[(0, 1)].eff_elev - (3.0 + south_share)).abs() < 1e-12);
        assert_eq!(grid[(1, 1)].eff_elev, 4.0); // drained to its dem elevation
    }

    // Equal-split overwrites the receiver's parent code; the proportional
    // policy accumulates codes and frees a cell surrounded by parents.
    #[test]
    fn test_parent_code_bookkeeping_differs_by_policy() {
        let mut grid = grid_from_dem(3, 3, &[0.0; 9]);
        grid.fill_residual(100.0); // receivers never activate
        grid[(1, 1)].residual = 0.0;
        grid[(1, 1)].eff_elev = 4.0;
        let mut active = ActiveList::for_grid(3, 3);
        activate_vent(&mut grid, &mut active, (1, 1));
        let mut rng = SimRng::with_seed(2);

        let mut equal = Distributor::new(FlowPolicy::EqualSplit, NeighborMode::Cardinal, false);
        equal.distribute(&mut grid, &mut active, &mut rng).unwrap();
        // the northern neighbor's parent is to its south
        assert_eq!(grid[(2, 1)].parentcode, 1);
        assert_eq!(grid[(1, 2)].parentcode, 8); // parent to the west
        assert_eq!(grid[(0, 1)].parentcode, 4); // parent to the north
        assert_eq!(grid[(1, 0)].parentcode, 2); // parent to the east

        // a proportional donor ORs onto existing codes, and 15 collapses
        let mut grid2 = grid_from_dem(3, 3, &[0.0; 9]);
        grid2.fill_residual(100.0);
        grid2[(1, 1)].residual = 0.0;
        grid2[(1, 1)].eff_elev = 4.0;
        grid2[(2, 1)].parentcode = 14; // already has parents N, E, W
        let mut active2 = ActiveList::for_grid(3, 3);
        activate_vent(&mut grid2, &mut active2, (1, 1));
        let mut proportional =
            Distributor::new(FlowPolicy::SlopeProportional, NeighborMode::Cardinal, true);
        proportional
            .distribute(&mut grid2, &mut active2, &mut rng)
            .unwrap();
        // 14 | 1 == 15, which is collapsed to 0
        assert_eq!(grid2[(2, 1)].parentcode, 0);
        assert_eq!(grid2[(1, 2)].parentcode, 8);
    }

    // Newly activated cells spread within the same pass: the first ring
    // activates, sheds its own excess, and lava reaches the second ring
    // before the pass ends.
    #[test]
    fn test_appended_cells_are_processed_in_the_same_pass() {
        let mut grid = grid_from_dem(7, 7, &[0.0; 49]);
        grid.fill_residual(0.5);
        let mut active = ActiveList::for_grid(7, 7);
        let mut rng = SimRng::with_seed(8);
        let mut distributor =
            Distributor::new(FlowPolicy::EqualSplit, NeighborMode::Cardinal, false);

        grid[(3, 3)].eff_elev = 8.0;
        activate_vent(&mut grid, &mut active, (3, 3));
        distributor
            .distribute(&mut grid, &mut active, &mut rng)
            .unwrap();

        // the centre shed its excess of 7.5, the first ring received
        // 1.875 each and re-donated down to its residual within the pass
        assert!((total_volume(&grid) - 8.0).abs() < 1e-12);
        assert_eq!(grid[(3, 3)].eff_elev, 0.5);
        let second_ring_total: f64 = [(1, 3), (5, 3), (3, 1), (3, 5)]
            .iter()
            .map(|&c| grid[c].eff_elev)
            .sum();
        assert!(second_ring_total > 0.0);
    }

    // An active cell pressed against the grid edge ends the run with the
    // matching off-grid kind.
    #[test]
    fn test_off_grid_ends_the_pass() {
        let mut grid = grid_from_dem(5, 5, &[0.0; 25]);
        let mut active = ActiveList::for_grid(5, 5);
        let mut rng = SimRng::with_seed(4);
        let mut distributor =
            Distributor::new(FlowPolicy::EqualSplit, NeighborMode::Cardinal, false);

        grid[(0, 0)].eff_elev = 1.0;
        activate_vent(&mut grid, &mut active, (0, 0));
        let err = distributor
            .distribute(&mut grid, &mut active, &mut rng)
            .unwrap_err();
        assert_eq!(err, SimError::OffGrid(GridEdge::South));
    }

    // A flow whose excess never exceeds the residual activates nothing.
    #[test]
    fn test_below_residual_cells_stay_quiet() {
        let mut grid = grid_from_dem(3, 3, &[0.0; 9]);
        grid.fill_residual(1.0);
        let mut active = ActiveList::for_grid(3, 3);
        let mut rng = SimRng::with_seed(6);
        let mut distributor =
            Distributor::new(FlowPolicy::EqualSplit, NeighborMode::Cardinal, false);

        grid[(1, 1)].eff_elev = 0.4;
        activate_vent(&mut grid, &mut active, (1, 1));
        distributor
            .distribute(&mut grid, &mut active, &mut rng)
            .unwrap();
        assert_eq!(grid[(1, 1)].eff_elev, 0.4);
        assert_eq!(active.len(), 1);
        for cell in [(0, 1), (2, 1), (1, 0), (1, 2)] {
            assert_eq!(grid[cell].eff_elev, 0.0);
        }
    }

    // The first activation of an AOI cell is reported.
    #[test]
    fn test_aoi_activation_is_reported() {
        let mut grid = grid_from_dem(5, 5, &[0.0; 25]);
        grid.fill_residual(0.6);
        grid[(2, 3)].aoi = true;
        let mut active = ActiveList::for_grid(5, 5);
        let mut rng = SimRng::with_seed(14);
        let mut distributor =
            Distributor::new(FlowPolicy::EqualSplit, NeighborMode::Cardinal, false);

        // one ring of spread: the four receivers activate, their own
        // leftovers stay below the residual
        grid[(2, 2)].eff_elev = 4.0;
        activate_vent(&mut grid, &mut active, (2, 2));
        let outcome = distributor
            .distribute(&mut grid, &mut active, &mut rng)
            .unwrap();
        assert_eq!(outcome, DistributeOutcome::AoiHit);
    }

    // Back-indices mirror the list exactly while the front is retained.
    #[test]
    fn test_active_back_indices_stay_consistent() {
        let mut grid = grid_from_dem(5, 5, &[0.0; 25]);
        let mut active = ActiveList::for_grid(5, 5);
        let mut rng = SimRng::with_seed(77);
        let mut distributor =
            Distributor::new(FlowPolicy::SlopeProportional, NeighborMode::Moore, true);

        grid.fill_residual(0.15);
        grid[(2, 2)].eff_elev = 2.0;
        activate_vent(&mut grid, &mut active, (2, 2));
        distributor
            .distribute(&mut grid, &mut active, &mut rng)
            .unwrap();

        // the vent plus its eight neighbors are on the front
        assert_eq!(active.len(), 9);
        for k in 0..active.len() {
            let (row, col) = active.get(k);
            assert_eq!(grid[(row, col)].active, k as i32);
        }
        for row in 0..5 {
            for col in 0..5 {
                let a = grid[(row, col)].active;
                if a >= 0 {
                    assert_eq!(active.get(a as usize), (row, col));
                }
            }
        }
    }
}
