/*
This code is part of the MOLASSES lava flow simulation library.
Authors: Dr. John Lindsay
Created: 04/05/2023
Last Modified: 22/09/2023
License: MIT
*/

pub mod utils;
