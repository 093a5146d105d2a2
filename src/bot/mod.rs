use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use crate::bot::{chat_event::chat_event::GatewayEvent, handler::handler::handle_event, state::def::AppState};

pub mod chat_event;
pub mod commands;
pub mod db;
pub mod dispatcher;
pub mod handler;
pub mod pagination;
pub mod parser;
pub mod permissions;
pub mod platforms;
pub mod render;
pub mod replies;
pub mod runtime;
pub mod state;
#[cfg(test)]
pub mod testing;

/// Drains gateway events until the sender side closes.
pub async fn run_event_loop(state: Arc<AppState>, mut rx: UnboundedReceiver<GatewayEvent>) {
    while let Some(event) = rx.recv().await {
        handle_event(event, state.clone()).await;
    }
    info!("Gateway event stream closed");
}
