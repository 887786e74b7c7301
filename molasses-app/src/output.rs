/*
This code is part of the MOLASSES lava flow simulation library.
Authors: Dr. John Lindsay
Created: 14/07/2023
Last Modified: 27/01/2024
License: MIT
*/
use crate::geo::GeoTransform;
use crate::grid::{DataCell, FlowGrid};
use crate::stats::FlowStats;
use crate::vents::LavaFlow;
use molasses_raster::{DataType, Raster};
use std::fs::OpenOptions;
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufWriter, Error};
use std::path::{Path, PathBuf};

/// Writes the per-run flow map: one line per inundated cell with its
/// coordinates, lava thickness, and old and new surface elevations.
/// Returns the path written.
pub fn write_ascii_flow(
    dir: &Path,
    id: &str,
    run: usize,
    grid: &FlowGrid,
    flow: &LavaFlow,
    geo: &GeoTransform,
) -> Result<PathBuf, Error> {
    let path = dir.join(format!("flow_{}-{}", id, run));
    let f = File::create(&path)?;
    let mut w = BufWriter::new(f);

    writeln!(w, "# VOLUME PULSE RESIDUAL VENTS")?;
    write!(
        w,
        "# {:.4}\t{:.4}\t{:.1} ",
        flow.volume_to_erupt, flow.pulse_volume, flow.residual
    )?;
    for vent in &flow.vents {
        write!(w, " {:.3}\t{:.3}\t", vent.easting, vent.northing)?;
    }
    writeln!(w)?;
    writeln!(w, "# EAST NORTH THICKNESS NEW_ELEV ORIG_ELEV")?;

    for row in 0..grid.rows {
        let northing = geo.northing_from_row(row);
        for col in 0..grid.columns {
            let cell = grid[(row, col)];
            let thickness = cell.thickness();
            if thickness > 0f64 {
                let easting = geo.easting_from_column(col);
                writeln!(
                    w,
                    "{:.3}\t{:.3}\t{:.6}\t{:.6}\t{:.6}",
                    easting, northing, thickness, cell.eff_elev, cell.dem_elev
                )?;
            }
        }
    }
    w.flush()?;
    Ok(path)
}

/// Writes the cumulative hit map: one `east north hit_count` line per cell
/// ever inundated.
pub fn write_ascii_hits(
    dir: &Path,
    id: &str,
    event_id: usize,
    grid: &FlowGrid,
    geo: &GeoTransform,
) -> Result<PathBuf, Error> {
    let path = dir.join(format!("hits_{}-{}", id, event_id));
    let f = File::create(&path)?;
    let mut w = BufWriter::new(f);
    for row in 0..grid.rows {
        let northing = geo.northing_from_row(row);
        for col in 0..grid.columns {
            let count = grid[(row, col)].hit_count;
            if count > 0 {
                let easting = geo.easting_from_column(col);
                writeln!(w, "{:.3}\t{:.3}\t{}", easting, northing, count)?;
            }
        }
    }
    w.flush()?;
    Ok(path)
}

pub fn write_raster_flow(
    dir: &Path,
    id: &str,
    event_id: usize,
    grid: &FlowGrid,
    dem: &Raster,
) -> Result<PathBuf, Error> {
    let path = raster_path(dir, &format!("raster-flow_{}-{}", id, event_id), dem);
    write_raster(&path, dem, grid, |cell| cell.thickness().max(0f64))?;
    Ok(path)
}

pub fn write_raster_hits(
    dir: &Path,
    id: &str,
    event_id: usize,
    grid: &FlowGrid,
    dem: &Raster,
) -> Result<PathBuf, Error> {
    let path = raster_path(dir, &format!("raster-hits_{}-{}", id, event_id), dem);
    write_raster(&path, dem, grid, |cell| cell.hit_count as f64)?;
    Ok(path)
}

/// The post-flow surface: ground elevation plus lava.
pub fn write_raster_post_dem(
    dir: &Path,
    id: &str,
    event_id: usize,
    grid: &FlowGrid,
    dem: &Raster,
) -> Result<PathBuf, Error> {
    let path = raster_path(dir, &format!("post-dem_{}-{}", id, event_id), dem);
    write_raster(&path, dem, grid, |cell| cell.eff_elev)?;
    Ok(path)
}

/// The basal topography as of the event's final run; distinct from the
/// input DEM once runs accumulate a flow field.
pub fn write_raster_pre_dem(
    dir: &Path,
    id: &str,
    event_id: usize,
    grid: &FlowGrid,
    dem: &Raster,
) -> Result<PathBuf, Error> {
    let path = raster_path(dir, &format!("pre-dem_{}-{}", id, event_id), dem);
    write_raster(&path, dem, grid, |cell| cell.dem_elev)?;
    Ok(path)
}

/// Appends one record per event to the stats CSV, writing the header when
/// the file is new. Vent coordinates are appended as column pairs.
pub fn append_stats(
    dir: &Path,
    id: &str,
    stats: &FlowStats,
    flow: &LavaFlow,
) -> Result<PathBuf, Error> {
    let path = dir.join(format!("stats_{}", id));
    let f = OpenOptions::new().create(true).append(true).open(&path)?;
    let new_file = f.metadata()?.len() == 0;
    let mut w = BufWriter::new(f);
    if new_file {
        writeln!(
            w,
            "Event,Runtime(s),Hit,Volume(km^3),Volume-Erupted(km^3),Cells-Inundated,\
             Area-Inundated(km^2),Pulse-volume(m^3),Residual(m),Vents"
        )?;
    }
    write!(
        w,
        "{},{},{},{:.2},{:.2},{},{:.2},{:.2},{:.1}",
        stats.event_id,
        stats.runtime,
        stats.hit as u8,
        stats.total_volume / 1e9,
        stats.volume_erupted / 1e9,
        stats.cells_inundated,
        stats.area_inundated,
        stats.pulse_volume,
        stats.residual
    )?;
    for vent in &flow.vents {
        write!(w, ",{:.0},{:.0}", vent.easting, vent.northing)?;
    }
    writeln!(w)?;
    w.flush()?;
    Ok(path)
}

// Output rasters take the DEM's own format.
fn raster_path(dir: &Path, base: &str, dem: &Raster) -> PathBuf {
    let extension = Path::new(&dem.file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "flt".to_string());
    dir.join(format!("{}.{}", base, extension))
}

/// Fills a single-band float32 raster from the grid, top row first, and
/// writes it with the DEM's geotransform and projection.
fn write_raster(
    path: &Path,
    dem: &Raster,
    grid: &FlowGrid,
    value: impl Fn(&DataCell) -> f64,
) -> Result<(), Error> {
    let file_name = path.to_string_lossy().to_string();
    let mut output = Raster::initialize_using_file(&file_name, dem);
    output.configs.data_type = DataType::F32;
    for raster_row in 0..grid.rows {
        let grid_row = grid.rows - 1 - raster_row;
        for col in 0..grid.columns {
            output.set_value(
                raster_row as isize,
                col as isize,
                value(&grid[(grid_row, col)]),
            );
        }
    }
    output.write()
}
