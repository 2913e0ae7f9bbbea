pub mod app;
pub mod async_bridge;
pub mod views;
