pub mod config;
pub mod credentials;
pub mod engine;
pub mod errors;
pub mod github;
pub mod logging;
pub mod ui;
pub mod util;
