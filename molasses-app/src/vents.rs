/*
This code is part of the MOLASSES lava flow simulation library.
Authors: Dr. John Lindsay
Created: 09/06/2023
Last Modified: 27/01/2024
License: MIT
*/
use crate::geo::GeoTransform;
use crate::grid::FlowGrid;
use std::io::{Error, ErrorKind};

/// An erupting vent: its map coordinates and, once placed, its grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vent {
    pub easting: f64,
    pub northing: f64,
    pub row: usize,
    pub col: usize,
}

/// The state of one lava flow event: its vents and the sampled volumes and
/// residual thickness for the current run.
#[derive(Debug, Clone, PartialEq)]
pub struct LavaFlow {
    pub vents: Vec<Vent>,
    pub volume_to_erupt: f64,
    pub current_volume: f64,
    pub pulse_volume: f64,
    pub residual: f64,
}

impl LavaFlow {
    /// Parses one event line: a whitespace-separated list of
    /// `easting,northing` pairs, at least one.
    pub fn from_event_line(line: &str) -> Result<LavaFlow, Error> {
        let mut vents = Vec::new();
        for token in line.split_whitespace() {
            let mut parts = token.split(',');
            let easting = parts
                .next()
                .and_then(|v| v.trim().parse::<f64>().ok());
            let northing = parts
                .next()
                .and_then(|v| v.trim().parse::<f64>().ok());
            match (easting, northing, parts.next()) {
                (Some(easting), Some(northing), None) => {
                    vents.push(Vent {
                        easting,
                        northing,
                        row: 0,
                        col: 0,
                    });
                }
                _ => {
                    return Err(Error::new(
                        ErrorKind::InvalidData,
                        format!(
                            "Malformed vent '{}'; expected an easting,northing pair.",
                            token
                        ),
                    ));
                }
            }
        }
        if vents.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidData,
                "An event line must name at least one vent.",
            ));
        }
        Ok(LavaFlow {
            vents,
            volume_to_erupt: 0f64,
            current_volume: 0f64,
            pulse_volume: 0f64,
            residual: 0f64,
        })
    }

    pub fn num_vents(&self) -> usize {
        self.vents.len()
    }
}

/// Converts every vent's map coordinates to a grid cell and validates it:
/// a vent must lie strictly inside the DEM and at or above sea level.
/// Failure here aborts the program.
pub fn place_vents(
    flow: &mut LavaFlow,
    geo: &GeoTransform,
    grid: &FlowGrid,
) -> Result<(), Error> {
    for (i, vent) in flow.vents.iter_mut().enumerate() {
        let row = geo.row_from_northing(vent.northing);
        let col = geo.column_from_easting(vent.easting);
        let side = if row <= 0 {
            Some("south")
        } else if row as usize >= geo.rows - 1 {
            Some("north")
        } else if col <= 0 {
            Some("west")
        } else if col as usize >= geo.columns - 1 {
            Some("east")
        } else {
            None
        };
        if let Some(side) = side {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "Vent {} at ({}, {}) is not within the region covered by the DEM ({} of the region).",
                    i + 1,
                    vent.easting,
                    vent.northing,
                    side
                ),
            ));
        }
        let (row, col) = (row as usize, col as usize);
        if grid[(row, col)].dem_elev < 0f64 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "Vent {} at ({}, {}) is below sea level.",
                    i + 1,
                    vent.easting,
                    vent.northing
                ),
            ));
        }
        vent.row = row;
        vent.col = col;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geo::GeoTransform;
    use crate::grid::FlowGrid;

    fn geo_5x5() -> GeoTransform {
        GeoTransform {
            origin_x: 100.0,
            pixel_w: 10.0,
            columns: 5,
            origin_y: 200.0,
            rows: 5,
            pixel_h: 10.0,
        }
    }

    #[test]
    fn test_parse_single_vent() {
        let flow = LavaFlow::from_event_line("532490.0,2089867.5").unwrap();
        assert_eq!(flow.num_vents(), 1);
        assert_eq!(flow.vents[0].easting, 532490.0);
        assert_eq!(flow.vents[0].northing, 2089867.5);
    }

    #[test]
    fn test_parse_multiple_vents() {
        let flow = LavaFlow::from_event_line("100,200  300,400\t500,600").unwrap();
        assert_eq!(flow.num_vents(), 3);
        assert_eq!(flow.vents[2].easting, 500.0);
        assert_eq!(flow.vents[2].northing, 600.0);
    }

    #[test]
    fn test_malformed_lines_are_rejected() {
        assert!(LavaFlow::from_event_line("").is_err());
        assert!(LavaFlow::from_event_line("100").is_err());
        assert!(LavaFlow::from_event_line("100,abc").is_err());
        assert!(LavaFlow::from_event_line("100,200,300").is_err());
    }

    #[test]
    fn test_place_vents_assigns_cells() {
        let geo = geo_5x5();
        let grid = FlowGrid::new(5, 5);
        let mut flow = LavaFlow::from_event_line("125,225").unwrap();
        place_vents(&mut flow, &geo, &grid).unwrap();
        assert_eq!(flow.vents[0].row, 2);
        assert_eq!(flow.vents[0].col, 2);
    }

    #[test]
    fn test_vents_on_the_margin_are_rejected() {
        let geo = geo_5x5();
        let grid = FlowGrid::new(5, 5);
        // row 0 and the outermost ring do not count as inside
        for line in ["125,205", "125,245", "105,225", "145,225"] {
            let mut flow = LavaFlow::from_event_line(line).unwrap();
            assert!(place_vents(&mut flow, &geo, &grid).is_err(), "{}", line);
        }
    }

    #[test]
    fn test_submarine_vents_are_rejected() {
        let geo = geo_5x5();
        let mut grid = FlowGrid::new(5, 5);
        grid[(2, 2)].dem_elev = -5.0;
        let mut flow = LavaFlow::from_event_line("125,225").unwrap();
        let err = place_vents(&mut flow, &geo, &grid).unwrap_err();
        assert!(err.to_string().contains("below sea level"));
    }
}
