pub mod blocking;
pub mod delivery;
