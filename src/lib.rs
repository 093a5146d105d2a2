pub mod api;
pub mod bot;
