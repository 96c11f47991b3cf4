// Library surface for the binary and the headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod controller;
pub mod export;
pub mod identity;
pub mod logging;
pub mod puzzle;
pub mod remote;
pub mod runtime;
pub mod scramble;
pub mod session;
pub mod solve;
pub mod stats;
pub mod store;
pub mod timer;
pub mod ui;
