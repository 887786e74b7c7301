/*
This code is part of the MOLASSES lava flow simulation library.
Authors: Dr. John Lindsay
Created: 18/05/2023
Last Modified: 27/01/2024
License: MIT
*/
use crate::aoi::Aoi;
use crate::geo::GeoTransform;
use molasses_raster::Raster;
use std::io::{Error, ErrorKind};
use std::ops::{Index, IndexMut};

/// Sentinel for a cell that is not on the active list.
pub const NOT_ACTIVE: i32 = -1;

/// One grid position: its ground and current surface elevations, the
/// minimum thickness it retains, its parent directions for the current
/// propagation step, its back-index into the active list, and the
/// counters that persist across runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataCell {
    pub dem_elev: f64,
    pub eff_elev: f64,
    pub residual: f64,
    pub elev_uncert: f64,
    pub parentcode: u8,
    pub active: i32,
    pub hit_count: u32,
    pub aoi: bool,
}

impl Default for DataCell {
    fn default() -> DataCell {
        DataCell {
            dem_elev: 0f64,
            eff_elev: 0f64,
            residual: 0f64,
            elev_uncert: 0f64,
            parentcode: 0u8,
            active: NOT_ACTIVE,
            hit_count: 0u32,
            aoi: false,
        }
    }
}

impl DataCell {
    /// Lava thickness currently sitting on this cell.
    pub fn thickness(&self) -> f64 {
        self.eff_elev - self.dem_elev
    }
}

/// Row-major store of `DataCell`s with O(1) `(row, col)` access. Row 0 is
/// the southernmost row of the DEM; the raster collaborator presents rows
/// top-down, so the loaders flip them.
pub struct FlowGrid {
    pub rows: usize,
    pub columns: usize,
    cells: Vec<DataCell>,
}

impl Index<(usize, usize)> for FlowGrid {
    type Output = DataCell;

    fn index(&self, index: (usize, usize)) -> &DataCell {
        &self.cells[index.0 * self.columns + index.1]
    }
}

impl IndexMut<(usize, usize)> for FlowGrid {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut DataCell {
        &mut self.cells[index.0 * self.columns + index.1]
    }
}

impl FlowGrid {
    pub fn new(rows: usize, columns: usize) -> FlowGrid {
        FlowGrid {
            rows,
            columns,
            cells: vec![DataCell::default(); rows * columns],
        }
    }

    /// Builds a grid from a DEM raster, assigning `dem_elev` and setting
    /// the working surface equal to it.
    pub fn from_raster(raster: &Raster) -> FlowGrid {
        let mut grid = FlowGrid::new(raster.configs.rows, raster.configs.columns);
        grid.load_topography(raster);
        grid
    }

    /// Writes `dem_elev` from the raster, bottom row first, and resets the
    /// per-run state of every cell.
    pub fn load_topography(&mut self, raster: &Raster) {
        for row in 0..self.rows {
            let raster_row = (self.rows - 1 - row) as isize;
            for col in 0..self.columns {
                let cell = &mut self[(row, col)];
                cell.dem_elev = raster.get_value(raster_row, col as isize);
                cell.eff_elev = cell.dem_elev;
                cell.parentcode = 0;
                cell.active = NOT_ACTIVE;
                cell.hit_count = 0;
            }
        }
    }

    /// Writes per-cell residual thicknesses from a raster of the same
    /// dimensions as the DEM.
    pub fn load_residual(&mut self, raster: &Raster) -> Result<(), Error> {
        self.check_dimensions(raster, "residual")?;
        for row in 0..self.rows {
            let raster_row = (self.rows - 1 - row) as isize;
            for col in 0..self.columns {
                self[(row, col)].residual = raster.get_value(raster_row, col as isize);
            }
        }
        Ok(())
    }

    /// Writes per-cell elevation uncertainties from a raster of the same
    /// dimensions as the DEM.
    pub fn load_uncertainty(&mut self, raster: &Raster) -> Result<(), Error> {
        self.check_dimensions(raster, "elevation uncertainty")?;
        for row in 0..self.rows {
            let raster_row = (self.rows - 1 - row) as isize;
            for col in 0..self.columns {
                self[(row, col)].elev_uncert = raster.get_value(raster_row, col as isize);
            }
        }
        Ok(())
    }

    pub fn fill_residual(&mut self, value: f64) {
        for cell in self.cells.iter_mut() {
            cell.residual = value;
        }
    }

    pub fn fill_uncertainty(&mut self, value: f64) {
        for cell in self.cells.iter_mut() {
            cell.elev_uncert = value;
        }
    }

    /// Prepares the grid for a new run. With `keep_flow_field` the previous
    /// run's lava is folded into the topography so successive runs build an
    /// edifice; otherwise the surface is restored to the ground elevation.
    /// Hit counts and AOI flags persist either way.
    pub fn reset_for_new_run(&mut self, keep_flow_field: bool) {
        for cell in self.cells.iter_mut() {
            if keep_flow_field {
                cell.dem_elev = cell.eff_elev;
            } else {
                cell.eff_elev = cell.dem_elev;
            }
            cell.active = NOT_ACTIVE;
            cell.parentcode = 0;
        }
    }

    /// Flags every cell whose reference coordinate falls strictly inside
    /// the disk. Returns the number of flagged cells.
    pub fn mark_aoi(&mut self, geo: &GeoTransform, aoi: &Aoi) -> usize {
        let mut count = 0;
        for row in 0..self.rows {
            let northing = geo.northing_from_row(row);
            for col in 0..self.columns {
                let easting = geo.easting_from_column(col);
                if aoi.contains(easting, northing) {
                    self[(row, col)].aoi = true;
                    count += 1;
                }
            }
        }
        count
    }

    fn check_dimensions(&self, raster: &Raster, what: &str) -> Result<(), Error> {
        if raster.configs.rows != self.rows || raster.configs.columns != self.columns {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!(
                    "The {} raster ({} x {}) does not match the DEM dimensions ({} x {}).",
                    what, raster.configs.rows, raster.configs.columns, self.rows, self.columns
                ),
            ));
        }
        Ok(())
    }
}
