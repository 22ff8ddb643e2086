pub mod export_service;
pub mod grid_controller;
pub mod import_service;
pub mod preference_service;
