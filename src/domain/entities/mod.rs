pub mod column;
pub mod dataset;
pub mod grid;
pub mod preferences;
pub mod record;
