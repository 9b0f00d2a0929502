pub mod classify;
pub mod client;
pub mod spec;
pub mod update;

pub use classify::{classify_history_message, classify_message, scan_update, MessageKind};
pub use client::GraphClient;
pub use spec::{
    sanitize_agent_name, ResumeAction, RunSpec, SubAgentSpec, TurnInput, DEFAULT_RECURSION_LIMIT,
    DEFAULT_SYSTEM_PROMPT,
};
pub use update::{node_kind, NodeKind, RawUpdate, INTERRUPT_NODE, MODEL_NODE, TOOLS_NODE};
