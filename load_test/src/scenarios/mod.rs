// Scenarios module
// Payloads, checks and the food-ordering virtual-user workflow

pub mod checks;
pub mod food_ordering;
pub mod payloads;
