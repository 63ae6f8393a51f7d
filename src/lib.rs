pub mod api;
pub mod cli;
pub mod controls;
pub mod dashboard;
pub mod display;
pub mod endpoint;
pub mod error;
pub mod history;
pub mod model;
pub mod retry;
pub mod updates;
pub mod watch;
