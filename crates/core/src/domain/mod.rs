pub mod challenge;
pub mod reviewer;
pub mod slot;
pub mod week;
