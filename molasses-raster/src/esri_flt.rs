use super::*;
use molasses_common::utils::{ByteOrderReader, ByteOrderWriter, Endianness};
use std::f64;
use std::fs::{self, File};
use std::io::prelude::*;
use std::io::{BufReader, BufWriter, Error, ErrorKind};
use std::path::Path;

/// Reads an Esri binary float grid: a flat file of float32 cell values in
/// row-major order, top row first, described by a `.hdr` sidecar. This is
/// the layout GDAL's EHdr driver produces for 32-bit float grids.
pub fn read_esri_flt(
    file_name: &String,
    configs: &mut RasterConfigs,
    data: &mut Vec<f64>,
) -> Result<(), Error> {
    // read the header file
    let header_file = Path::new(&file_name)
        .with_extension("hdr")
        .into_os_string()
        .into_string()
        .expect("Error creating header file name string for FLT file.");
    let f = File::open(&header_file)?;
    let f = BufReader::new(f);

    let mut xllcorner = f64::NEG_INFINITY;
    let mut yllcorner = f64::NEG_INFINITY;
    let mut xllcenter = f64::NEG_INFINITY;
    let mut yllcenter = f64::NEG_INFINITY;
    configs.nodata = -9999f64; // default in event that it is not in the header file
    configs.data_type = DataType::F32;

    for line in f.lines() {
        let line_unwrapped = line?;
        let vec = line_unwrapped.split_whitespace().collect::<Vec<&str>>();
        if vec.len() < 2 {
            continue;
        }
        let key = vec[0].to_lowercase();
        let value = vec[1].to_lowercase();

        if key.contains("byteorder") {
            configs.endian = Endianness::from_str(&value);
        } else if key.contains("nrows") {
            configs.rows = value.parse::<f32>().map_err(bad_header)? as usize;
        } else if key.contains("ncols") {
            configs.columns = value.parse::<f32>().map_err(bad_header)? as usize;
        } else if key.contains("xllcorner") {
            xllcorner = value.parse::<f64>().map_err(bad_header)?;
        } else if key.contains("yllcorner") {
            yllcorner = value.parse::<f64>().map_err(bad_header)?;
        } else if key.contains("xllcenter") {
            xllcenter = value.parse::<f64>().map_err(bad_header)?;
        } else if key.contains("yllcenter") {
            yllcenter = value.parse::<f64>().map_err(bad_header)?;
        } else if key.contains("cellsize") {
            configs.resolution_x = value.parse::<f64>().map_err(bad_header)?;
            configs.resolution_y = configs.resolution_x;
        } else if key.contains("nodata") {
            configs.nodata = value.parse::<f64>().map_err(bad_header)?;
        }
    }

    if configs.rows == 0 || configs.columns == 0 {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!("The header file {} does not specify the grid dimensions.", header_file),
        ));
    }

    if xllcorner != f64::NEG_INFINITY {
        configs.west = xllcorner;
        configs.south = yllcorner;
    } else if xllcenter != f64::NEG_INFINITY {
        configs.west = xllcenter - 0.5 * configs.resolution_x;
        configs.south = yllcenter - 0.5 * configs.resolution_y;
    } else {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!("The header file {} does not specify the grid origin.", header_file),
        ));
    }
    configs.east = configs.west + configs.columns as f64 * configs.resolution_x;
    configs.north = configs.south + configs.rows as f64 * configs.resolution_y;

    // read the projection sidecar, if there is one
    let prj_file = Path::new(&file_name)
        .with_extension("prj")
        .into_os_string()
        .into_string()
        .expect("Error creating projection file name string for FLT file.");
    if Path::new(&prj_file).exists() {
        configs.projection = fs::read_to_string(&prj_file)?.trim().to_string();
    }

    // read the data file
    let num_cells = configs.rows * configs.columns;
    let data_file = File::open(file_name)?;
    let mut reader = ByteOrderReader::new(BufReader::new(data_file), configs.endian);
    if reader.len() < num_cells * configs.data_type.get_data_size() {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!(
                "The FLT file {} is too short for a {} x {} grid.",
                file_name, configs.rows, configs.columns
            ),
        ));
    }
    data.clear();
    data.reserve(num_cells);
    for _ in 0..num_cells {
        data.push(reader.read_f32()? as f64);
    }

    Ok(())
}

fn bad_header(e: std::num::ParseFloatError) -> Error {
    Error::new(ErrorKind::InvalidData, format!("Malformed FLT header: {}", e))
}

pub fn write_esri_flt<'a>(r: &'a mut Raster) -> Result<(), Error> {
    // write the header file
    let header_file = Path::new(&r.file_name)
        .with_extension("hdr")
        .into_os_string()
        .into_string()
        .expect("Error creating header file name string for FLT file.");
    let f = File::create(&header_file)?;
    let mut writer = BufWriter::new(f);
    writer.write_all(format!("NCOLS {}\n", r.configs.columns).as_bytes())?;
    writer.write_all(format!("NROWS {}\n", r.configs.rows).as_bytes())?;
    writer.write_all(format!("XLLCORNER {}\n", r.configs.west).as_bytes())?;
    writer.write_all(format!("YLLCORNER {}\n", r.configs.south).as_bytes())?;
    writer.write_all(
        format!(
            "CELLSIZE {}\n",
            (r.configs.resolution_x + r.configs.resolution_y) / 2.0
        )
        .as_bytes(),
    )?;
    writer.write_all(format!("NODATA_value {}\n", r.configs.nodata).as_bytes())?;
    let byte_order = match r.configs.endian {
        Endianness::LittleEndian => "LSBFIRST",
        Endianness::BigEndian => "MSBFIRST",
    };
    writer.write_all(format!("BYTEORDER {}\n", byte_order).as_bytes())?;

    // write the projection sidecar, if a projection is known
    if !r.configs.projection.is_empty() {
        let prj_file = Path::new(&r.file_name)
            .with_extension("prj")
            .into_os_string()
            .into_string()
            .expect("Error creating projection file name string for FLT file.");
        fs::write(&prj_file, format!("{}\n", r.configs.projection))?;
    }

    // write the data file
    let f = File::create(&r.file_name)?;
    let mut writer = ByteOrderWriter::new(BufWriter::new(f), r.configs.endian);
    for value in &r.data {
        writer.write_f32(*value as f32)?;
    }
    writer.flush()?;

    Ok(())
}
