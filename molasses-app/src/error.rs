/*
This code is part of the MOLASSES lava flow simulation library.
Authors: Dr. John Lindsay
Created: 18/05/2023
Last Modified: 18/05/2023
License: MIT
*/
use std::error;
use std::fmt;

/// The side of the grid a flow escaped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridEdge {
    South,
    North,
    West,
    East,
}

impl fmt::Display for GridEdge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            GridEdge::South => write!(f, "south"),
            GridEdge::North => write!(f, "north"),
            GridEdge::West => write!(f, "west"),
            GridEdge::East => write!(f, "east"),
        }
    }
}

/// Failures that can arise inside a simulation run. Off-grid escapes end
/// the current run; the other kinds are fatal to the program.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// The flow reached the named edge of the DEM.
    OffGrid(GridEdge),
    /// The active list could not grow to the requested number of cells.
    OutOfMemory(usize),
    /// Policy B found a non-positive total elevation difference over a
    /// non-empty neighbor list.
    SlopeInvariant { row: usize, col: usize, total: f64 },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SimError::OffGrid(edge) => {
                write!(f, "The flow is off the map ({} edge).", edge)
            }
            SimError::OutOfMemory(cells) => {
                write!(
                    f,
                    "No more memory: could not grow the active cell list to {} cells.",
                    cells
                )
            }
            SimError::SlopeInvariant { row, col, total } => {
                write!(
                    f,
                    "Total elevation difference at cell ({}, {}) is {}; cannot share lava proportionally.",
                    row, col, total
                )
            }
        }
    }
}

impl error::Error for SimError {}
