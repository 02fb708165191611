//! HTTP gateway for chat, repository listing, and knowledge base sync, with
//! bearer auth and a health endpoint.

mod backend;
mod error;
mod handlers;
mod router;
mod server;

pub use backend::{Backend, BoxFuture};
pub use error::GatewayError;
pub use server::GatewayServer;
