//! Request-side types: the inbound request and its per-request context.

mod context;
mod inbound;

pub use context::RequestContext;
pub use inbound::Request;
