// Library surface for the binary, headless runs and integration tests.
pub mod app_dirs;
pub mod config;
pub mod game;
pub mod headless;
pub mod logging;
pub mod mode_policy;
pub mod pid;
pub mod plant;
pub mod runtime;
pub mod session;
pub mod signal;
pub mod time_series;
