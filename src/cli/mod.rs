pub mod activities;
pub mod import;
pub mod metrics;
pub mod setup;
pub mod ui;
