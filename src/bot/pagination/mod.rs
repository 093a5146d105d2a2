pub mod collector;
pub mod paginator;
pub mod session;
