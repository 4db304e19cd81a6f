pub mod app;
pub mod color;
pub mod data;
pub mod plot;
pub mod state;
pub mod ui;
