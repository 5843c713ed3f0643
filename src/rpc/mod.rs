//! JSON-RPC 2.0 envelope and per-peer request bindings
//!
//! Every payload on the mesh is a JSON-RPC 2.0 message. [`RpcEnvelope`]
//! is the decoded wire shape; [`RpcBinding`] pairs outbound requests
//! with inbound responses for one peer and capability.

mod binding;
mod envelope;


pub use binding::{ContentBinding, PlayerBinding, RpcBinding};
pub use envelope::{RpcEnvelope, RpcFault, codes};
