pub mod coordinate;
pub mod lookup;
