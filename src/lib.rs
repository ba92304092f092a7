// Library surface for headless/integration tests and reuse.
// Terminal setup and rendering stay in main.rs/ui.rs.
pub mod app;
pub mod app_dirs;
pub mod batch;
pub mod config;
pub mod controller;
pub mod device;
pub mod editor;
pub mod runtime;
pub mod source;
