/*
This code is part of the MOLASSES lava flow simulation library.
Authors: Dr. John Lindsay
Created: 28/07/2023
Last Modified: 27/01/2024
License: MIT
*/

/*!
MOLASSES estimates the area inundated by lava flows with a cellular
automaton. Lava is injected at one or more vents in discrete pulses and
redistributed to downhill neighbors until the assigned eruption volume is
exhausted; the outputs are per-cell thicknesses, inundation masks,
cumulative hit counts over stochastic runs, and summary statistics.

Usage:

```text
>> molasses config.conf
>> molasses config.conf 10   # number runs from 10 upward
```

The configuration file is line oriented (`KEY = VALUE`, `#` comments); it
names the DEM, the events file, the stochastic parameter ranges, the
distribution policy, and the outputs to produce. Results are written to
the working directory.
*/

mod active;
mod aoi;
mod config;
mod distribute;
mod driver;
mod error;
mod geo;
mod grid;
mod neighbors;
mod output;
mod params;
mod pulse;
mod rng;
mod stats;
mod vents;

use crate::distribute::FlowPolicy;
use crate::driver::EventRunner;
use crate::neighbors::NeighborMode;
use crate::rng::SimRng;
use molasses_raster::Raster;
use std::env;
use std::io::Error;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <config-file> [start-run]", args[0]);
        process::exit(1);
    }
    match run(&args) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Exiting.");
            process::exit(1);
        }
    }
}

fn run(args: &[String]) -> Result<(), Error> {
    println!("\n               MOLASSES is a lava flow simulator.\n");

    let config_file = &args[1];
    println!("Config file: {}", config_file);
    let start_run = if args.len() > 2 {
        let start = args[2].parse::<i64>().unwrap_or(0).max(0) as usize;
        println!("Starting with run #{}", start);
        start
    } else {
        0
    };

    let (inputs, outputs) = config::initialize(config_file)?;

    let rng = match inputs.seed {
        Some(seed) => SimRng::with_seed(seed),
        None => SimRng::from_clock(),
    };
    println!("Seeding random number generator: {}", rng.seed());
    println!(
        "Distribution policy: {}; neighborhood: {}; parents flag: {}",
        match inputs.policy {
            FlowPolicy::EqualSplit => "equal split",
            FlowPolicy::SlopeProportional => "slope proportional",
        },
        match inputs.neighbor_mode {
            NeighborMode::Cardinal => "4 cells",
            NeighborMode::Moore => "8 cells",
        },
        inputs.parents
    );

    println!("Reading in the DEM...");
    let dem = Raster::new(&inputs.dem_file, "r")?;
    println!("\nDEM information:");
    println!("  File:              {}", dem.file_name);
    println!(
        "  Lower left origin: ({:.6}, {:.6})",
        dem.configs.west, dem.configs.south
    );
    println!(
        "  Pixel size:        ({:.6}, {:.6})",
        dem.configs.resolution_x, dem.configs.resolution_y
    );
    println!(
        "  Grid size:         ({}, {})",
        dem.configs.rows, dem.configs.columns
    );
    println!(
        "  Elevation range:   {:.3} to {:.3}",
        dem.configs.minimum, dem.configs.maximum
    );
    println!("loaded.\n");

    let mut runner = EventRunner::new(inputs, outputs, dem, rng, start_run)?;
    runner.run()?;
    Ok(())
}
