pub mod editor;
pub mod menu;
pub mod models;
pub mod scoring;
