/*
This code is part of the MOLASSES lava flow simulation library.
Authors: Dr. John Lindsay
Created: 23/06/2023
Last Modified: 27/01/2024
License: MIT
*/
use crate::grid::FlowGrid;
use crate::rng::SimRng;
use crate::vents::LavaFlow;
use std::io::{Error, ErrorKind};

/// The configured range of one stochastic flow parameter. When `log_mean`
/// and `log_std` are positive the parameter is drawn from a truncated
/// normal on the log10 scale; otherwise it is drawn uniformly from
/// `[min, max]`. A range of `[0, 0]` leaves the parameter alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
    pub log_mean: f64,
    pub log_std: f64,
}

impl ParamRange {
    pub fn is_unset(&self) -> bool {
        self.min == 0f64 && self.max == 0f64
    }

    pub fn validate(&self, name: &str) -> Result<(), Error> {
        if self.min < 0f64 || self.max < 0f64 || self.min > self.max {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "The range for {} is inconsistent (min = {}, max = {}).",
                    name, self.min, self.max
                ),
            ));
        }
        Ok(())
    }

    /// Draws a value, or `None` when the range is unset.
    pub fn sample(&self, rng: &mut SimRng) -> Option<f64> {
        if self.is_unset() {
            return None;
        }
        if self.log_mean > 0f64 && self.log_std > 0f64 && self.min > 0f64 && self.max > 0f64 {
            let log_min = self.min.log10();
            let log_max = self.max.log10();
            let mut draw = rng.normal(self.log_mean, self.log_std);
            while draw < log_min || draw > log_max {
                draw = rng.normal(self.log_mean, self.log_std);
            }
            return Some(10f64.powf(draw));
        }
        Some(rng.uniform(self.min, self.max))
    }
}

/// The three per-event parameter ranges.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowParams {
    pub residual: ParamRange,
    pub total_volume: ParamRange,
    pub pulse_volume: ParamRange,
}

impl FlowParams {
    pub fn validate(&self) -> Result<(), Error> {
        self.residual.validate("the flow residual")?;
        self.total_volume.validate("the total eruption volume")?;
        self.pulse_volume.validate("the pulse volume")?;
        Ok(())
    }
}

/// Samples the flow parameters for one run: the residual thickness, the
/// volume to erupt, and the pulse volume. A sampled residual overwrites
/// every grid cell's residual; an unset residual range keeps the values
/// already in the grid (a scalar fill or a residual map) and falls back to
/// `default_residual` for the reported value. Sampling the total volume
/// recharges `current_volume`.
pub fn set_flow_params(
    params: &FlowParams,
    default_residual: f64,
    flow: &mut LavaFlow,
    grid: &mut FlowGrid,
    rng: &mut SimRng,
) {
    match params.residual.sample(rng) {
        Some(residual) => {
            flow.residual = residual;
            grid.fill_residual(residual);
            println!("Flow residual: {:.2} (meters)", residual);
        }
        None => {
            flow.residual = default_residual;
        }
    }

    if let Some(volume) = params.total_volume.sample(rng) {
        flow.volume_to_erupt = volume;
        flow.current_volume = volume;
        println!("Total lava volume: {:.2e} (cubic meters)", volume);
    }

    if let Some(pulse) = params.pulse_volume.sample(rng) {
        flow.pulse_volume = pulse;
        println!("Flow pulse volume: {:.2e} (cubic meters)", pulse);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::grid::FlowGrid;
    use crate::rng::SimRng;
    use crate::vents::LavaFlow;

    fn empty_flow() -> LavaFlow {
        LavaFlow {
            vents: Vec::new(),
            volume_to_erupt: 0.0,
            current_volume: 0.0,
            pulse_volume: 0.0,
            residual: 0.0,
        }
    }

    #[test]
    fn test_uniform_sampling_respects_the_bounds() {
        let range = ParamRange {
            min: 2.0,
            max: 9.0,
            ..Default::default()
        };
        let mut rng = SimRng::with_seed(31);
        for _ in 0..500 {
            let v = range.sample(&mut rng).unwrap();
            assert!((2.0..=9.0).contains(&v));
        }
    }

    #[test]
    fn test_log_normal_sampling_is_truncated() {
        let range = ParamRange {
            min: 1e5,
            max: 1e8,
            log_mean: 6.5,
            log_std: 1.5,
        };
        let mut rng = SimRng::with_seed(32);
        for _ in 0..500 {
            let v = range.sample(&mut rng).unwrap();
            assert!((1e5..=1e8).contains(&v));
        }
    }

    #[test]
    fn test_unset_range_is_skipped() {
        let range = ParamRange::default();
        let mut rng = SimRng::with_seed(33);
        assert_eq!(range.sample(&mut rng), None);
    }

    #[test]
    fn test_degenerate_range_is_a_fixed_value() {
        let range = ParamRange {
            min: 5.0,
            max: 5.0,
            ..Default::default()
        };
        let mut rng = SimRng::with_seed(34);
        assert_eq!(range.sample(&mut rng), Some(5.0));
    }

    #[test]
    fn test_validation_rejects_inverted_ranges() {
        let range = ParamRange {
            min: 7.0,
            max: 3.0,
            ..Default::default()
        };
        assert!(range.validate("a parameter").is_err());
        let range = ParamRange {
            min: -1.0,
            max: 3.0,
            ..Default::default()
        };
        assert!(range.validate("a parameter").is_err());
    }

    #[test]
    fn test_sampled_residual_is_written_into_the_grid() {
        let params = FlowParams {
            residual: ParamRange {
                min: 4.0,
                max: 4.0,
                ..Default::default()
            },
            total_volume: ParamRange {
                min: 100.0,
                max: 100.0,
                ..Default::default()
            },
            pulse_volume: ParamRange {
                min: 10.0,
                max: 10.0,
                ..Default::default()
            },
        };
        let mut grid = FlowGrid::new(3, 3);
        let mut flow = empty_flow();
        let mut rng = SimRng::with_seed(35);
        set_flow_params(&params, 0.0, &mut flow, &mut grid, &mut rng);
        assert_eq!(flow.residual, 4.0);
        assert_eq!(flow.volume_to_erupt, 100.0);
        assert_eq!(flow.current_volume, 100.0);
        assert_eq!(flow.pulse_volume, 10.0);
        assert_eq!(grid[(2, 1)].residual, 4.0);
    }

    #[test]
    fn test_unset_residual_keeps_the_grid_values() {
        let params = FlowParams {
            total_volume: ParamRange {
                min: 100.0,
                max: 100.0,
                ..Default::default()
            },
            pulse_volume: ParamRange {
                min: 10.0,
                max: 10.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut grid = FlowGrid::new(3, 3);
        grid.fill_residual(7.5); // as if loaded from a residual map
        let mut flow = empty_flow();
        let mut rng = SimRng::with_seed(36);
        set_flow_params(&params, 7.5, &mut flow, &mut grid, &mut rng);
        assert_eq!(flow.residual, 7.5);
        assert_eq!(grid[(0, 0)].residual, 7.5);
    }
}
