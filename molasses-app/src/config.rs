/*
This code is part of the MOLASSES lava flow simulation library.
Authors: Dr. John Lindsay
Created: 07/07/2023
Last Modified: 27/01/2024
License: MIT
*/
use crate::aoi::Aoi;
use crate::distribute::FlowPolicy;
use crate::neighbors::NeighborMode;
use crate::params::{FlowParams, ParamRange};
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, Error, ErrorKind};

/// A value that may be a scalar or a path to a raster of per-cell values.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarOrMap {
    Unset,
    Scalar(f64),
    Map(String),
}

/// Everything the configuration file assigns: the input files, the
/// stochastic parameter ranges, the engine selectors, and the run plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Inputs {
    pub dem_file: String,
    pub events_file: String,
    pub events: Vec<String>,
    pub residual: ScalarOrMap,
    pub elev_uncert: ScalarOrMap,
    pub params: FlowParams,
    pub runs: usize,
    pub parents: bool,
    pub flow_field: bool,
    pub policy: FlowPolicy,
    pub neighbor_mode: NeighborMode,
    pub retain_front: bool,
    pub aoi: Option<Aoi>,
    pub seed: Option<u64>,
}

impl Default for Inputs {
    fn default() -> Inputs {
        Inputs {
            dem_file: String::new(),
            events_file: String::new(),
            events: Vec::new(),
            residual: ScalarOrMap::Unset,
            elev_uncert: ScalarOrMap::Unset,
            params: FlowParams::default(),
            runs: 1,
            parents: false,
            flow_field: false,
            policy: FlowPolicy::SlopeProportional,
            neighbor_mode: NeighborMode::Moore,
            retain_front: true,
            aoi: None,
            seed: None,
        }
    }
}

/// The output selection: which files to produce, and the ID woven into
/// their names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outputs {
    pub id: String,
    pub ascii_flow: bool,
    pub ascii_hits: bool,
    pub raster_flow: bool,
    pub raster_hits: bool,
    pub raster_post_dem: bool,
    pub raster_pre_dem: bool,
    pub stats: bool,
}

/// Reads the configuration file (`KEY = VALUE`, `#` comments) and the
/// events file it names, echoing each assignment. Missing mandatory
/// parameters abort the program.
pub fn initialize(config_file: &str) -> Result<(Inputs, Outputs), Error> {
    let mut inputs = Inputs::default();
    let mut outputs = Outputs::default();
    // track whether the front-retention default follows the policy or was
    // set explicitly
    let mut retain_front: Option<bool> = None;

    println!("Reading in parameters...");
    let f = File::open(config_file).map_err(|e| {
        Error::new(
            e.kind(),
            format!("Cannot open the configuration file {}: {}", config_file, e),
        )
    })?;
    let f = BufReader::new(f);

    for line in f.lines() {
        let line = line?;
        if line.starts_with('#') || line.starts_with(' ') || line.starts_with('\t') || line.is_empty()
        {
            continue;
        }
        let (key, value) = match line.split_once('=') {
            Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
            None => continue,
        };
        if key.is_empty() || value.is_empty() {
            continue;
        }
        println!("{:>24} = {}", key, value);

        match key.as_str() {
            "DEM_FILE" => inputs.dem_file = value,
            "EVENTS_FILE" => {
                inputs.events = load_events(&value)?;
                inputs.events_file = value;
            }
            "RESIDUAL" => inputs.residual = parse_scalar_or_map(&value),
            "ELEVATION_UNCERT" => inputs.elev_uncert = parse_scalar_or_map(&value),
            "ID" => outputs.id = value,
            "MIN_PULSE_VOLUME" => inputs.params.pulse_volume.min = parse_f64(&key, &value)?,
            "MAX_PULSE_VOLUME" => inputs.params.pulse_volume.max = parse_f64(&key, &value)?,
            "MIN_TOTAL_VOLUME" => inputs.params.total_volume.min = parse_f64(&key, &value)?,
            "MAX_TOTAL_VOLUME" => inputs.params.total_volume.max = parse_f64(&key, &value)?,
            "LOG_MEAN_TOTAL_VOLUME" => {
                inputs.params.total_volume.log_mean = parse_f64(&key, &value)?
            }
            "LOG_STD_DEV_TOTAL_VOLUME" => {
                inputs.params.total_volume.log_std = parse_f64(&key, &value)?
            }
            "MIN_RESIDUAL" => inputs.params.residual.min = parse_f64(&key, &value)?,
            "MAX_RESIDUAL" => inputs.params.residual.max = parse_f64(&key, &value)?,
            "LOG_MEAN_RESIDUAL" => inputs.params.residual.log_mean = parse_f64(&key, &value)?,
            "LOG_STD_DEV_RESIDUAL" => inputs.params.residual.log_std = parse_f64(&key, &value)?,
            "RUNS" => inputs.runs = parse_f64(&key, &value)? as usize,
            "CREATE_FLOW_FIELD" => inputs.flow_field = true,
            "PARENTS" => inputs.parents = true,
            "FLOW_POLICY" => {
                inputs.policy = match value.to_uppercase().as_str() {
                    "EQUAL" => FlowPolicy::EqualSplit,
                    "SLOPE" => FlowPolicy::SlopeProportional,
                    _ => {
                        return Err(Error::new(
                            ErrorKind::InvalidInput,
                            format!("FLOW_POLICY must be EQUAL or SLOPE, not '{}'.", value),
                        ));
                    }
                }
            }
            "NEIGHBORS" => {
                inputs.neighbor_mode = match value.as_str() {
                    "4" => NeighborMode::Cardinal,
                    "8" => NeighborMode::Moore,
                    _ => {
                        return Err(Error::new(
                            ErrorKind::InvalidInput,
                            format!("NEIGHBORS must be 4 or 8, not '{}'.", value),
                        ));
                    }
                }
            }
            "RETAIN_ACTIVE_FRONT" => retain_front = Some(parse_f64(&key, &value)? != 0f64),
            "AOI_EASTING" => aoi_mut(&mut inputs).easting = parse_f64(&key, &value)?,
            "AOI_NORTHING" => aoi_mut(&mut inputs).northing = parse_f64(&key, &value)?,
            "AOI_RADIUS" => aoi_mut(&mut inputs).radius = parse_f64(&key, &value)?,
            "SEED" => {
                inputs.seed = Some(value.parse::<u64>().map_err(|_| {
                    Error::new(
                        ErrorKind::InvalidInput,
                        format!("Unable to read a value for SEED from '{}'.", value),
                    )
                })?)
            }
            "ASCII_FLOW_MAP" => outputs.ascii_flow = true,
            "ASCII_HIT_MAP" => outputs.ascii_hits = true,
            "RASTER_FLOW_MAP" => outputs.raster_flow = true,
            "RASTER_HIT_MAP" => outputs.raster_hits = true,
            "RASTER_POST_DEM" => outputs.raster_post_dem = true,
            "RASTER_PRE_DEM" => outputs.raster_pre_dem = true,
            "STATS_FILE" => outputs.stats = true,
            _ => println!("{:>24}   [not assigned]", key),
        }
    }

    // the front-retention default follows the distribution policy
    inputs.retain_front =
        retain_front.unwrap_or(inputs.policy == FlowPolicy::SlopeProportional);

    check_required(&inputs)?;
    println!("Nothing missing.");
    Ok((inputs, outputs))
}

fn check_required(inputs: &Inputs) -> Result<(), Error> {
    let missing = |what: &str| {
        Err(Error::new(
            ErrorKind::InvalidInput,
            format!("{} Unable to continue.", what),
        ))
    };
    if inputs.dem_file.len() < 2 {
        return missing("No DEM file assigned.");
    }
    if inputs.events_file.is_empty() {
        return missing("No file of events assigned.");
    }
    if inputs.events.is_empty() {
        return missing("The number of assigned events is 0.");
    }
    if inputs.params.residual.min <= 0f64 || inputs.params.residual.max <= 0f64 {
        return missing("The flow residual thickness range is missing or not positive.");
    }
    if inputs.params.pulse_volume.min <= 0f64 || inputs.params.pulse_volume.max <= 0f64 {
        return missing("The lava pulse volume range is missing or not positive.");
    }
    if inputs.params.total_volume.min <= 0f64 || inputs.params.total_volume.max <= 0f64 {
        return missing("The total lava volume range is missing or not positive.");
    }
    inputs.params.validate()?;
    if let Some(aoi) = &inputs.aoi {
        if aoi.easting <= 0f64 || aoi.northing <= 0f64 || aoi.radius <= 0f64 {
            return missing("An area of interest needs AOI_EASTING, AOI_NORTHING and AOI_RADIUS.");
        }
    }
    Ok(())
}

fn aoi_mut(inputs: &mut Inputs) -> &mut Aoi {
    inputs.aoi.get_or_insert(Aoi {
        easting: 0f64,
        northing: 0f64,
        radius: 0f64,
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, Error> {
    value.parse::<f64>().map_err(|_| {
        Error::new(
            ErrorKind::InvalidInput,
            format!("Unable to read a value for {} from '{}'.", key, value),
        )
    })
}

fn parse_scalar_or_map(value: &str) -> ScalarOrMap {
    match value.parse::<f64>() {
        Ok(scalar) if scalar > 0f64 => ScalarOrMap::Scalar(scalar),
        Ok(_) => ScalarOrMap::Unset,
        Err(_) => ScalarOrMap::Map(value.to_string()),
    }
}

/// Reads the events file: one event per non-comment line.
fn load_events(events_file: &str) -> Result<Vec<String>, Error> {
    let f = File::open(events_file).map_err(|e| {
        Error::new(
            e.kind(),
            format!("Failed to open the events file {}: {}", events_file, e),
        )
    })?;
    let f = BufReader::new(f);
    let mut events = Vec::new();
    for line in f.lines() {
        let line = line?;
        if line.starts_with('#') || line.starts_with(' ') || line.starts_with('\t') || line.is_empty()
        {
            continue;
        }
        events.push(line.trim_end().to_string());
    }
    Ok(events)
}
