/*
This code is part of the MOLASSES lava flow simulation library.
Authors: Dr. John Lindsay
Created: 11/05/2023
Last Modified: 03/10/2023
License: MIT
*/

mod arcascii_raster;
mod esri_flt;

use self::arcascii_raster::*;
use self::esri_flt::*;
use molasses_common::utils::Endianness;
use std::default::Default;
use std::f64;
use std::io::{Error, ErrorKind};
use std::ops::{Index, IndexMut};
use std::path::Path;

/// Raster is a common data structure that abstracts over the grid formats
/// the simulator reads and writes: Esri ASCII grids (`.asc`/`.txt`) and
/// Esri binary float grids (`.flt` with a `.hdr` sidecar), the latter being
/// the single-band float32 layout produced by GDAL's EHdr driver.
///
/// Examples:
///
/// ```ignore
/// // Read an existing raster file
/// let input = Raster::new(&input_file, "r")?;
///
/// // Create a new raster file with the dimensions
/// // and location of an existing file.
/// let mut output = Raster::initialize_using_file(&output_file, &input);
/// ```
#[derive(Default, Clone)]
pub struct Raster {
    pub file_name: String,
    pub file_mode: String,
    pub raster_type: RasterType,
    pub configs: RasterConfigs,
    data: Vec<f64>,
}

impl Index<(isize, isize)> for Raster {
    type Output = f64;

    fn index<'a>(&'a self, index: (isize, isize)) -> &'a f64 {
        let row = index.0;
        let column = index.1;
        if column < 0 || row < 0 {
            return &self.configs.nodata;
        }
        let c: usize = column as usize;
        let r: usize = row as usize;
        if c >= self.configs.columns || r >= self.configs.rows {
            return &self.configs.nodata;
        }
        let idx: usize = r * self.configs.columns + c;
        &self.data[idx]
    }
}

impl IndexMut<(isize, isize)> for Raster {
    fn index_mut<'a>(&'a mut self, index: (isize, isize)) -> &'a mut f64 {
        let row = index.0;
        let column = index.1;
        if column < 0 || row < 0 {
            return &mut self.configs.nodata;
        }
        let c: usize = column as usize;
        let r: usize = row as usize;
        if c >= self.configs.columns || r >= self.configs.rows {
            return &mut self.configs.nodata;
        }
        let idx = r * self.configs.columns + c;
        &mut self.data[idx]
    }
}

impl Raster {
    /// Creates an in-memory `Raster` object. The data are either read from
    /// an existing file (`file_name`; `file_mode` is 'r') or prepared for
    /// new file creation (`file_mode` is 'w'). The raster format is
    /// determined by the file extension of the `file_name` string.
    pub fn new<'a>(file_name: &'a str, file_mode: &'a str) -> Result<Raster, Error> {
        let fm: String = file_mode.to_lowercase();
        let mut r = Raster {
            file_name: file_name.to_string(),
            file_mode: fm.clone(),
            raster_type: get_raster_type_from_file(file_name.to_string(), fm.clone()),
            ..Default::default()
        };
        if r.file_mode.contains("r") {
            match r.raster_type {
                RasterType::ArcAscii => {
                    read_arcascii(&r.file_name, &mut r.configs, &mut r.data)?;
                    r.update_min_max();
                    return Ok(r);
                }
                RasterType::EsriFlt => {
                    read_esri_flt(&r.file_name, &mut r.configs, &mut r.data)?;
                    r.update_min_max();
                    return Ok(r);
                }
                RasterType::Unknown => {
                    return Err(Error::new(ErrorKind::Other, "Unrecognized raster type"));
                }
            }
        }
        // write mode
        Ok(r)
    }

    /// Creates a new in-memory `Raster` object with grid extent and location
    /// based on specified configurations contained within a `RasterConfigs`.
    pub fn initialize_using_config<'a>(file_name: &'a str, configs: &'a RasterConfigs) -> Raster {
        let new_file_name = if file_name.contains(".") {
            file_name.to_string()
        } else {
            // likely no extension provided; default to .flt
            format!("{}.flt", file_name)
        };
        let mut output = Raster {
            file_name: new_file_name.clone(),
            ..Default::default()
        };
        output.file_mode = "w".to_string();
        output.raster_type = get_raster_type_from_file(new_file_name, "w".to_string());

        output.configs.rows = configs.rows;
        output.configs.columns = configs.columns;
        output.configs.north = configs.north;
        output.configs.south = configs.south;
        output.configs.east = configs.east;
        output.configs.west = configs.west;
        output.configs.resolution_x = configs.resolution_x;
        output.configs.resolution_y = configs.resolution_y;
        output.configs.nodata = configs.nodata;
        output.configs.data_type = configs.data_type;
        output.configs.projection = configs.projection.clone();
        output.configs.endian = configs.endian;

        output.data = vec![output.configs.nodata; output.configs.rows * output.configs.columns];
        output
    }

    /// Creates a new in-memory `Raster` object with grid extent and location
    /// based on an existing `Raster` contained within `file_name`.
    pub fn initialize_using_file<'a>(file_name: &'a str, input: &'a Raster) -> Raster {
        Raster::initialize_using_config(file_name, &input.configs)
    }

    pub fn get_value(&self, row: isize, column: isize) -> f64 {
        if row < 0 || column < 0 {
            return self.configs.nodata;
        }
        if row as usize >= self.configs.rows || column as usize >= self.configs.columns {
            return self.configs.nodata;
        }
        self.data[row as usize * self.configs.columns + column as usize]
    }

    pub fn set_value(&mut self, row: isize, column: isize, value: f64) {
        if row >= 0 && column >= 0 {
            let (r, c) = (row as usize, column as usize);
            if r < self.configs.rows && c < self.configs.columns {
                self.data[r * self.configs.columns + c] = value;
            }
        }
    }

    pub fn reinitialize_values(&mut self, value: f64) {
        self.data = vec![value; self.configs.rows * self.configs.columns];
    }

    pub fn get_row_data(&self, row: isize) -> Vec<f64> {
        let columns = self.configs.columns;
        let mut values: Vec<f64> = vec![self.configs.nodata; columns];
        if row >= 0 && (row as usize) < self.configs.rows {
            let start = row as usize * columns;
            values.copy_from_slice(&self.data[start..start + columns]);
        }
        values
    }

    pub fn set_row_data(&mut self, row: isize, values: Vec<f64>) {
        if row < 0 || row as usize >= self.configs.rows {
            return;
        }
        for (column, value) in values.iter().enumerate() {
            if column < self.configs.columns {
                self.data[row as usize * self.configs.columns + column] = *value;
            }
        }
    }

    /// Returns the x-coordinate of a column's cell centre.
    pub fn get_x_from_column(&self, column: isize) -> f64 {
        self.configs.west + self.configs.resolution_x / 2f64
            + column as f64 * self.configs.resolution_x
    }

    /// Returns the y-coordinate of a row's cell centre.
    pub fn get_y_from_row(&self, row: isize) -> f64 {
        self.configs.north - self.configs.resolution_y / 2f64
            - row as f64 * self.configs.resolution_y
    }

    pub fn get_column_from_x(&self, x: f64) -> isize {
        ((x - self.configs.west) / self.configs.resolution_x).floor() as isize
    }

    pub fn get_row_from_y(&self, y: f64) -> isize {
        ((self.configs.north - y) / self.configs.resolution_y).floor() as isize
    }

    pub fn num_cells(&self) -> usize {
        self.configs.rows * self.configs.columns
    }

    /// Recomputes the stored minimum and maximum values, ignoring nodata.
    pub fn update_min_max(&mut self) {
        self.configs.minimum = f64::INFINITY;
        self.configs.maximum = f64::NEG_INFINITY;
        for value in &self.data {
            if *value != self.configs.nodata {
                if *value < self.configs.minimum {
                    self.configs.minimum = *value;
                }
                if *value > self.configs.maximum {
                    self.configs.maximum = *value;
                }
            }
        }
    }

    /// Writes the in-memory raster to its `file_name` in the format implied
    /// by the file extension.
    pub fn write(&mut self) -> Result<(), Error> {
        match self.raster_type {
            RasterType::ArcAscii => write_arcascii(self)?,
            RasterType::EsriFlt => write_esri_flt(self)?,
            RasterType::Unknown => {
                return Err(Error::new(ErrorKind::Other, "Unrecognized raster type"));
            }
        }
        Ok(())
    }
}

pub fn get_raster_type_from_file(file_name: String, _file_mode: String) -> RasterType {
    let extension = Path::new(&file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "asc" | "txt" => RasterType::ArcAscii,
        "flt" => RasterType::EsriFlt,
        _ => RasterType::Unknown,
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RasterType {
    #[default]
    Unknown,
    ArcAscii,
    EsriFlt,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    F64,
    #[default]
    F32,
    I32,
}

impl DataType {
    pub fn get_data_size(&self) -> usize {
        match *self {
            DataType::F64 => 8,
            DataType::F32 => 4,
            DataType::I32 => 4,
        }
    }
}

/// The geographic configuration of a raster: grid dimensions, extent,
/// cell resolution, nodata value, on-disk number format, and projection.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterConfigs {
    pub title: String,
    pub rows: usize,
    pub columns: usize,
    pub bands: u8,
    pub nodata: f64,
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    pub resolution_x: f64,
    pub resolution_y: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub projection: String,
    pub endian: Endianness,
    pub data_type: DataType,
}

impl Default for RasterConfigs {
    fn default() -> RasterConfigs {
        RasterConfigs {
            title: String::from(""),
            rows: 0,
            columns: 0,
            bands: 1,
            nodata: -32768.0,
            north: f64::NEG_INFINITY,
            south: f64::INFINITY,
            east: f64::NEG_INFINITY,
            west: f64::INFINITY,
            resolution_x: f64::NEG_INFINITY,
            resolution_y: f64::NEG_INFINITY,
            minimum: f64::INFINITY,
            maximum: f64::NEG_INFINITY,
            projection: String::from(""),
            endian: Endianness::LittleEndian,
            data_type: DataType::F32,
        }
    }
}
