pub mod channel_queue;
pub mod handler;
