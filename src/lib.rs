pub mod logging;
pub mod recognition;
pub mod settings;
pub mod settings_store;
pub mod sketch;
