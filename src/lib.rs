pub mod alerts;
pub mod api;
pub mod attendance;
pub mod calendar;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod grid;
pub mod gui;
pub mod members;
pub mod model;
pub mod resolver;
pub mod upcoming;
pub mod util;
pub mod week;
