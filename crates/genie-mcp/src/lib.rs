pub mod client;
pub mod registry;

pub use client::{McpClient, ServerConfig, ServerTransport, ToolInfo};
pub use registry::{filter_allowed, qualified_name, ToolRegistry};
