use std::collections::VecDeque;

use super::domain::VehicleCategory;

/// Transient per-run inventory of unassigned spot identifiers. Assignment
/// consumes spots from the front; nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotInventory {
    car: VecDeque<String>,
    motorcycle: VecDeque<String>,
}

impl SpotInventory {
    /// Sequentially numbered identifiers per category: `C-01`, `C-02`, ...
    /// for cars and `M-01`, `M-02`, ... for motorcycles.
    pub fn generate(num_car_spots: u32, num_moto_spots: u32) -> Self {
        Self {
            car: (1..=num_car_spots).map(|i| format!("C-{i:02}")).collect(),
            motorcycle: (1..=num_moto_spots).map(|i| format!("M-{i:02}")).collect(),
        }
    }

    /// Pops the front spot of the category's queue, if any remain.
    pub fn take(&mut self, category: VehicleCategory) -> Option<String> {
        match category {
            VehicleCategory::Car => self.car.pop_front(),
            VehicleCategory::Motorcycle => self.motorcycle.pop_front(),
        }
    }

    pub fn remaining(&self, category: VehicleCategory) -> usize {
        match category {
            VehicleCategory::Car => self.car.len(),
            VehicleCategory::Motorcycle => self.motorcycle.len(),
        }
    }
}
