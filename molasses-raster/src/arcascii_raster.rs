use super::*;
use std::f64;
use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Error;
use std::io::ErrorKind;

pub fn read_arcascii(
    file_name: &String,
    configs: &mut RasterConfigs,
    data: &mut Vec<f64>,
) -> Result<(), Error> {
    // read the file
    let f = File::open(file_name)?;
    let f = BufReader::new(f);

    let mut xllcenter: f64 = f64::NEG_INFINITY;
    let mut yllcenter: f64 = f64::NEG_INFINITY;
    let mut xllcorner: f64 = f64::NEG_INFINITY;
    let mut yllcorner: f64 = f64::NEG_INFINITY;
    for line in f.lines() {
        let line_unwrapped = line?;
        let mut vec = line_unwrapped.split(" ").collect::<Vec<&str>>();
        if vec.len() == 1 {
            vec = line_unwrapped.split("\t").collect::<Vec<&str>>();
        }
        let key = vec[0].to_lowercase();
        let last = vec[vec.len() - 1].trim();
        if key.contains("nrows") {
            configs.rows = last.parse::<f32>().map_err(bad_header)? as usize;
            if configs.columns > 0 {
                data.reserve(configs.rows * configs.columns);
            }
        } else if key.contains("ncols") {
            configs.columns = last.parse::<f32>().map_err(bad_header)? as usize;
            if configs.rows > 0 {
                data.reserve(configs.rows * configs.columns);
            }
        } else if key.contains("xllcorner") {
            xllcorner = last.parse::<f64>().map_err(bad_header)?;
        } else if key.contains("yllcorner") {
            yllcorner = last.parse::<f64>().map_err(bad_header)?;
        } else if key.contains("xllcenter") {
            xllcenter = last.parse::<f64>().map_err(bad_header)?;
        } else if key.contains("yllcenter") {
            yllcenter = last.parse::<f64>().map_err(bad_header)?;
        } else if key.contains("cellsize") {
            configs.resolution_x = last.parse::<f64>().map_err(bad_header)?;
            configs.resolution_y = configs.resolution_x;
        } else if key.contains("nodata_value") {
            if last.contains(".") {
                configs.data_type = DataType::F32;
            } else {
                configs.data_type = DataType::I32;
            }
            configs.nodata = last.parse::<f64>().map_err(bad_header)?;
        } else {
            // it's a data line
            for val in vec {
                let val = val.trim();
                if !val.is_empty() {
                    data.push(val.parse::<f64>().map_err(bad_header)?);
                }
            }
        }
    }

    if configs.rows == 0 || configs.columns == 0 || data.len() != configs.rows * configs.columns {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!(
                "The Esri ASCII raster {} contains an incomplete grid ({} values for {} rows x {} columns).",
                file_name,
                data.len(),
                configs.rows,
                configs.columns
            ),
        ));
    }

    // set the North, East, South, and West coordinates
    if xllcorner != f64::NEG_INFINITY {
        configs.east = xllcorner + (configs.columns as f64) * configs.resolution_x;
        configs.west = xllcorner;
        configs.south = yllcorner;
        configs.north = yllcorner + (configs.rows as f64) * configs.resolution_y;
    } else {
        configs.east = xllcenter - (0.5 * configs.resolution_x)
            + (configs.columns as f64) * configs.resolution_x;
        configs.west = xllcenter - (0.5 * configs.resolution_x);
        configs.south = yllcenter - (0.5 * configs.resolution_y);
        configs.north =
            yllcenter - (0.5 * configs.resolution_y) + (configs.rows as f64) * configs.resolution_y;
    }

    Ok(())
}

fn bad_header(e: std::num::ParseFloatError) -> Error {
    Error::new(ErrorKind::InvalidData, format!("Malformed Esri ASCII raster: {}", e))
}

pub fn write_arcascii<'a>(r: &'a mut Raster) -> Result<(), Error> {
    // Save the file
    let f = File::create(&(r.file_name))?;
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
    writer.write_all(format!("NODATA_VALUE {:.2}\n", r.configs.nodata).as_bytes())?;

    // write the data
    let mut s2 = String::new();
    let num_cells: usize = r.configs.rows * r.configs.columns;
    let mut col = 0;
    for i in 0..num_cells {
        if col < r.configs.columns - 1 {
            s2 += &format!("{} ", r.data[i]);
        } else {
            s2 += &format!("{}\n", r.data[i]);
        }
        col += 1;
        if col == r.configs.columns {
            writer.write_all(s2.as_bytes())?;
            s2 = String::new();
            col = 0;
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn temp_file(name: &str) -> String {
        let mut path = std::env::temp_dir();
        path.push(name);
        path.to_string_lossy().to_string()
    }

    #[test]
    fn test_read_arcascii() {
        let file_name = temp_file("molasses_test_read.asc");
        fs::write(
            &file_name,
            "NCOLS 3\nNROWS 2\nXLLCORNER 100\nYLLCORNER 200\nCELLSIZE 10\nNODATA_VALUE -9999\n1 2 3\n4 5 6\n",
        )
        .unwrap();

        let raster = Raster::new(&file_name, "r").unwrap();
        assert_eq!(raster.configs.rows, 2);
        assert_eq!(raster.configs.columns, 3);
        assert_eq!(raster.configs.west, 100.0);
        assert_eq!(raster.configs.south, 200.0);
        assert_eq!(raster.configs.north, 220.0);
        assert_eq!(raster.configs.east, 130.0);
        // row 0 is the northern row
        assert_eq!(raster.get_value(0, 0), 1.0);
        assert_eq!(raster.get_value(1, 2), 6.0);
        assert_eq!(raster.configs.maximum, 6.0);
        fs::remove_file(&file_name).ok();
    }

    #[test]
    fn test_write_then_read_arcascii() {
        let file_name = temp_file("molasses_test_write.asc");
        let configs = RasterConfigs {
            rows: 2,
            columns: 2,
            west: 0.0,
            south: 0.0,
            east: 2.0,
            north: 2.0,
            resolution_x: 1.0,
            resolution_y: 1.0,
            nodata: -9999.0,
            ..Default::default()
        };
        let mut raster = Raster::initialize_using_config(&file_name, &configs);
        raster.set_value(0, 0, 10.0);
        raster.set_value(0, 1, 11.0);
        raster.set_value(1, 0, 12.0);
        raster.set_value(1, 1, 13.5);
        raster.write().unwrap();

        let readback = Raster::new(&file_name, "r").unwrap();
        assert_eq!(readback.get_value(0, 0), 10.0);
        assert_eq!(readback.get_value(1, 1), 13.5);
        assert_eq!(readback.configs.resolution_x, 1.0);
        fs::remove_file(&file_name).ok();
    }

    #[test]
    fn test_incomplete_grid_is_rejected() {
        let file_name = temp_file("molasses_test_short.asc");
        fs::write(
            &file_name,
            "NCOLS 3\nNROWS 2\nXLLCORNER 0\nYLLCORNER 0\nCELLSIZE 1\nNODATA_VALUE -9999\n1 2 3\n",
        )
        .unwrap();
        assert!(Raster::new(&file_name, "r").is_err());
        fs::remove_file(&file_name).ok();
    }
}
