//! Inbound envelope normalization and outbound envelope construction.

mod extract;
mod wrap;

pub use extract::{extract, extract_fields, Fields, Strategy, STRATEGIES};
pub use wrap::{
    resolve_routing, wrap, ActionResponse, JsonBody, OutboundEnvelope, ResponseBody, Routing,
    DEFAULT_ACTION_GROUP, DEFAULT_API_PATH, DEFAULT_HTTP_METHOD, MESSAGE_VERSION,
};
