/*
This code is part of the MOLASSES lava flow simulation library.
Authors: Dr. John Lindsay
Created: 21/07/2023
Last Modified: 27/01/2024
License: MIT
*/
use crate::active::ActiveList;
use crate::config::{Inputs, Outputs, ScalarOrMap};
use crate::distribute::{DistributeOutcome, Distributor};
use crate::error::SimError;
use crate::geo::GeoTransform;
use crate::grid::{FlowGrid, NOT_ACTIVE};
use crate::output;
use crate::params::set_flow_params;
use crate::pulse::pulse;
use crate::rng::SimRng;
use crate::stats::FlowStats;
use crate::vents::{place_vents, LavaFlow};
use molasses_common::utils::get_formatted_elapsed_time;
use molasses_raster::Raster;
use std::io::{Error, ErrorKind};
use std::path::PathBuf;
use std::time::Instant;

/// Runs the configured events over the loaded DEM: for each event and each
/// repetition, initialize the grid, pulse and distribute until the volume
/// is exhausted, summarize, and emit the selected outputs.
pub struct EventRunner {
    inputs: Inputs,
    outputs: Outputs,
    dem: Raster,
    geo: GeoTransform,
    grid: FlowGrid,
    active: ActiveList,
    distributor: Distributor,
    rng: SimRng,
    start_run: usize,
    out_dir: PathBuf,
    default_residual: f64,
}

impl EventRunner {
    /// Builds the simulation state: the grid from the DEM, the residual
    /// and uncertainty fields from their maps or scalars, and the AOI
    /// flags.
    pub fn new(
        inputs: Inputs,
        outputs: Outputs,
        dem: Raster,
        rng: SimRng,
        start_run: usize,
    ) -> Result<EventRunner, Error> {
        let geo = GeoTransform::from_configs(&dem.configs);
        let mut grid = FlowGrid::from_raster(&dem);

        let default_residual = match &inputs.residual {
            ScalarOrMap::Scalar(value) => {
                grid.fill_residual(*value);
                *value
            }
            ScalarOrMap::Map(path) => {
                let raster = Raster::new(path, "r")?;
                grid.load_residual(&raster)?;
                0f64
            }
            ScalarOrMap::Unset => 0f64,
        };
        match &inputs.elev_uncert {
            ScalarOrMap::Scalar(value) => grid.fill_uncertainty(*value),
            ScalarOrMap::Map(path) => {
                let raster = Raster::new(path, "r")?;
                grid.load_uncertainty(&raster)?;
            }
            ScalarOrMap::Unset => {}
        }

        if let Some(aoi) = &inputs.aoi {
            let marked = grid.mark_aoi(&geo, aoi);
            println!("Marked {} cells inside the area of interest.", marked);
        }

        let active = ActiveList::for_grid(grid.rows, grid.columns);
        println!(
            "Allocated the active cell list ({} cells).",
            active.capacity()
        );
        let distributor = Distributor::new(
            inputs.policy,
            inputs.neighbor_mode,
            inputs.retain_front,
        );

        Ok(EventRunner {
            inputs,
            outputs,
            dem,
            geo,
            grid,
            active,
            distributor,
            rng,
            start_run,
            out_dir: PathBuf::from("."),
            default_residual,
        })
    }

    /// Runs every configured event; returns one stats record per event.
    pub fn run(&mut self) -> Result<Vec<FlowStats>, Error> {
        let mut records = Vec::with_capacity(self.inputs.events.len());
        for ev in 0..self.inputs.events.len() {
            println!("[{} of {}] events", ev + 1, self.inputs.events.len());
            let stats = self.run_event(ev)?;
            records.push(stats);
        }
        Ok(records)
    }

    fn run_event(&mut self, ev: usize) -> Result<FlowStats, Error> {
        let event_start = Instant::now();
        let mut flow = LavaFlow::from_event_line(&self.inputs.events[ev])?;
        println!("Number of vents: {}", flow.num_vents());
        for vent in &flow.vents {
            println!("\tE: {:.3} N: {:.3}", vent.easting, vent.northing);
        }

        let mut stats = FlowStats {
            event_id: ev,
            ..Default::default()
        };

        println!("Beginning flow simulation...");
        let end_run = self.start_run + self.inputs.runs;
        for run in self.start_run..end_run {
            self.run_once(ev, run, &mut flow, &mut stats)?;
        }

        stats.runtime = event_start.elapsed().as_secs();
        println!(
            "Elapsed time of the simulation: {}",
            get_formatted_elapsed_time(event_start)
        );
        self.emit_event_outputs(ev, &flow, &stats)?;
        Ok(stats)
    }

    /// One complete run of an event, from initialization to volume
    /// exhaustion.
    fn run_once(
        &mut self,
        ev: usize,
        run: usize,
        flow: &mut LavaFlow,
        stats: &mut FlowStats,
    ) -> Result<(), Error> {
        // INIT
        self.grid.reset_for_new_run(self.inputs.flow_field);
        self.active.clear();

        // SAMPLE_PARAMS
        set_flow_params(
            &self.inputs.params,
            self.default_residual,
            flow,
            &mut self.grid,
            &mut self.rng,
        );

        // PLACE_VENTS
        place_vents(flow, &self.geo, &self.grid)?;

        stats.run = run;
        stats.residual = flow.residual;
        stats.total_volume = flow.volume_to_erupt;
        stats.pulse_volume = flow.pulse_volume;
        stats.pulse_count = 0;

        // PULSE_LOOP; the vent index advances before each pulse, so with
        // several vents the first pulse goes to the second one
        let mut current_vent = 0usize;
        let mut off_map = false;
        while flow.current_volume > 0f64 {
            stats.volume_erupted = flow.volume_to_erupt - flow.current_volume;
            stats.cells_inundated = self.active.len();

            current_vent = (current_vent + 1) % flow.num_vents();
            let vent = flow.vents[current_vent];
            let vent_cell = (vent.row, vent.col);
            if let Some(front) = self.active.front() {
                if front != vent_cell {
                    self.grid[front].active = NOT_ACTIVE;
                }
            }
            self.active.set_front(vent_cell.0, vent_cell.1);
            self.grid[vent_cell].active = 0;

            pulse(&mut self.grid, vent_cell, flow, &self.geo);
            stats.pulse_count += 1;

            match self
                .distributor
                .distribute(&mut self.grid, &mut self.active, &mut self.rng)
            {
                Ok(DistributeOutcome::Complete) => {}
                Ok(DistributeOutcome::AoiHit) => {
                    if !stats.hit {
                        println!("The area of interest has been reached.");
                    }
                    stats.hit = true;
                }
                Err(SimError::OffGrid(edge)) => {
                    eprintln!(
                        "The flow reached the {} edge of the grid; ending run {}.",
                        edge, run
                    );
                    stats.off_map = true;
                    off_map = true;
                    flow.current_volume = 0f64;
                }
                Err(e) => {
                    // out of memory or a broken engine invariant
                    return Err(Error::new(ErrorKind::Other, format!("{}", e)));
                }
            }

            if off_map {
                break;
            }
            if stats.pulse_count % 100 == 0 {
                println!(
                    "[Event {}][Run {}] Vent: {:.0} {:.0}; active cells: {}; volume remaining: {:.3}; pulses: {}",
                    ev,
                    run,
                    vent.easting,
                    vent.northing,
                    self.active.len(),
                    flow.current_volume,
                    stats.pulse_count
                );
            }
        }

        // SUMMARIZE
        let cell_area = self.geo.cell_area();
        let mut volume_erupted = 0f64;
        let mut inundated = 0usize;
        for row in 0..self.grid.rows {
            for col in 0..self.grid.columns {
                let thickness = self.grid[(row, col)].thickness();
                if thickness > 0f64 {
                    self.grid[(row, col)].hit_count += 1;
                    inundated += 1;
                }
                volume_erupted += thickness * cell_area;
            }
        }
        stats.cells_inundated = inundated;
        stats.area_inundated = inundated as f64 * cell_area / 1e6;
        if !off_map {
            stats.volume_erupted = volume_erupted;
        }

        println!("[Run {}] Final distribute: {} cells inundated.", stats.run, inundated);
        println!(
            "Area inundated: {:12.3} square km",
            stats.area_inundated
        );
        if stats.off_map {
            println!("Note: part of the flow left the grid during this run.");
        }
        println!("Conservation of mass check:");
        println!(
            " Total (in) volume pulsed from vents: {:12.3}",
            flow.volume_to_erupt
        );
        println!(
            " Total (out) volume found in cells:   {:12.3}",
            volume_erupted
        );
        let excess = volume_erupted - flow.volume_to_erupt;
        if excess.abs() > 1e-8 {
            eprintln!("ERROR: mass is not conserved! Excess: {:12.3}", excess);
        }

        // per-run flow map
        if self.outputs.ascii_flow {
            let path = output::write_ascii_flow(
                &self.out_dir,
                &self.outputs.id,
                run,
                &self.grid,
                flow,
                &self.geo,
            )?;
            println!("Flow file {} written.", path.display());
            println!("OK");
        }
        Ok(())
    }

    fn emit_event_outputs(
        &mut self,
        ev: usize,
        flow: &LavaFlow,
        stats: &FlowStats,
    ) -> Result<(), Error> {
        let id = self.outputs.id.clone();
        if self.outputs.ascii_hits {
            let path =
                output::write_ascii_hits(&self.out_dir, &id, ev, &self.grid, &self.geo)?;
            println!("Hits file {} written.", path.display());
            println!("OK");
        }
        if self.outputs.raster_flow {
            let path =
                output::write_raster_flow(&self.out_dir, &id, ev, &self.grid, &self.dem)?;
            println!("Raster flow file {} written.", path.display());
            println!("OK");
        }
        if self.outputs.raster_hits {
            let path =
                output::write_raster_hits(&self.out_dir, &id, ev, &self.grid, &self.dem)?;
            println!("Raster hits file {} written.", path.display());
            println!("OK");
        }
        if self.outputs.raster_post_dem {
            let path = output::write_raster_post_dem(
                &self.out_dir,
                &id,
                ev,
                &self.grid,
                &self.dem,
            )?;
            println!("Post-flow DEM {} written.", path.display());
            println!("OK");
        }
        if self.outputs.raster_pre_dem && self.inputs.flow_field {
            let path = output::write_raster_pre_dem(
                &self.out_dir,
                &id,
                ev,
                &self.grid,
                &self.dem,
            )?;
            println!("Pre-flow DEM {} written.", path.display());
            println!("OK");
        }
        if self.outputs.stats {
            let path = output::append_stats(&self.out_dir, &id, stats, flow)?;
            println!("Stats file {} written.", path.display());
            println!("OK");
        }
        Ok(())
    }
}
