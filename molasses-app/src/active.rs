/*
This code is part of the MOLASSES lava flow simulation library.
Authors: Dr. John Lindsay
Created: 18/05/2023
Last Modified: 27/01/2024
License: MIT
*/
use crate::error::SimError;

/// Hard ceiling on the initial capacity, regardless of DEM size.
pub const MAX_INITIAL_CAPACITY: usize = 10_000_000;

/// The ordered list of cells currently holding lava above their residual.
/// Order matters: the distributor scans by increasing index so that cells
/// appended mid-scan are processed in the same pass. Slot 0 is overwritten
/// with the current vent before every pulse. Capacity starts at
/// `min(rows * columns, 10^7)` and doubles when exhausted.
pub struct ActiveList {
    cells: Vec<(usize, usize)>,
    capacity: usize,
}

impl ActiveList {
    pub fn for_grid(rows: usize, columns: usize) -> ActiveList {
        let capacity = (rows * columns).min(MAX_INITIAL_CAPACITY);
        ActiveList {
            cells: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, index: usize) -> (usize, usize) {
        self.cells[index]
    }

    pub fn front(&self) -> Option<(usize, usize)> {
        self.cells.first().copied()
    }

    /// Overwrites slot 0 with the given cell, creating the slot if the list
    /// is empty.
    pub fn set_front(&mut self, row: usize, col: usize) {
        if self.is_empty() {
            self.cells.push((row, col));
        } else {
            self.cells[0] = (row, col);
        }
    }

    /// Drops every entry but the vent slot.
    pub fn truncate_to_front(&mut self) {
        self.cells.truncate(1);
    }

    /// Appends a cell and returns its index, doubling the capacity when the
    /// list is full.
    pub fn push(&mut self, row: usize, col: usize) -> Result<usize, SimError> {
        if self.cells.len() == self.capacity {
            let grown = self.capacity * 2;
            eprintln!(
                "Active cell list is full at {} cells; growing to {}.",
                self.capacity, grown
            );
            self.cells
                .try_reserve_exact(self.capacity)
                .map_err(|_| SimError::OutOfMemory(grown))?;
            self.capacity = grown;
        }
        self.cells.push((row, col));
        Ok(self.cells.len() - 1)
    }
}

#[cfg(test)]
mod test {
    use super::{ActiveList, MAX_INITIAL_CAPACITY};

    #[test]
    fn test_initial_capacity_is_capped() {
        let small = ActiveList::for_grid(10, 10);
        assert_eq!(small.capacity(), 100);
        let large = ActiveList::for_grid(100_000, 1_000);
        assert_eq!(large.capacity(), MAX_INITIAL_CAPACITY);
    }

    #[test]
    fn test_push_returns_indices_in_order() {
        let mut list = ActiveList::for_grid(4, 4);
        assert_eq!(list.push(1, 1).unwrap(), 0);
        assert_eq!(list.push(1, 2).unwrap(), 1);
        assert_eq!(list.push(2, 1).unwrap(), 2);
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(1), (1, 2));
    }

    #[test]
    fn test_push_grows_past_initial_capacity() {
        let mut list = ActiveList::for_grid(2, 2);
        assert_eq!(list.capacity(), 4);
        for i in 0..9 {
            list.push(i, i).unwrap();
        }
        assert_eq!(list.len(), 9);
        assert!(list.capacity() >= 9);
    }

    #[test]
    fn test_front_slot_is_overwritten() {
        let mut list = ActiveList::for_grid(4, 4);
        list.set_front(2, 2);
        assert_eq!(list.front(), Some((2, 2)));
        list.push(1, 1).unwrap();
        list.set_front(3, 3);
        assert_eq!(list.front(), Some((3, 3)));
        assert_eq!(list.len(), 2);
        list.truncate_to_front();
        assert_eq!(list.len(), 1);
        list.clear();
        assert!(list.is_empty());
    }
}
