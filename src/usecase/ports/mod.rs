pub mod delivery;
pub mod report;
pub mod source;
pub mod store;
