pub mod api;
pub mod html;
pub mod metrics;
pub mod state;
