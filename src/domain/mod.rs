pub mod entities;
pub mod layout;
