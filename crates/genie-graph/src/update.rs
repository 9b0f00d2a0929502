use serde_json::{Map, Value};

/// Stream kind carrying node deltas; the only kind this adapter translates.
pub const UPDATES_KIND: &str = "updates";

/// Node that produced model output in a single-agent run.
pub const MODEL_NODE: &str = "model_request";
/// Node that reports completed tool executions.
pub const TOOLS_NODE: &str = "tools";
/// Marker node emitted when execution pauses for human tool approval.
pub const INTERRUPT_NODE: &str = "__interrupt__";

/// One raw record from the engine's update stream: a `(kind, payload)` pair
/// where the payload maps execution-node names to loosely-typed deltas.
#[derive(Debug, Clone)]
pub struct RawUpdate {
    pub kind: String,
    pub payload: Map<String, Value>,
}

impl RawUpdate {
    pub fn updates(payload: Map<String, Value>) -> Self {
        Self { kind: UPDATES_KIND.to_string(), payload }
    }

    pub fn is_updates(&self) -> bool {
        self.kind == UPDATES_KIND
    }
}

/// Resolved role of an execution node within an update payload.
///
/// Node names outside the known set are, by contract, dynamically named
/// sub-agents running under a supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'a> {
    ModelRequest,
    Tools,
    Interrupt,
    Agent(&'a str),
}

pub fn node_kind(name: &str) -> NodeKind<'_> {
    match name {
        MODEL_NODE => NodeKind::ModelRequest,
        TOOLS_NODE => NodeKind::Tools,
        INTERRUPT_NODE => NodeKind::Interrupt,
        other => NodeKind::Agent(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_nodes_resolve_to_fixed_kinds() {
        assert_eq!(node_kind("model_request"), NodeKind::ModelRequest);
        assert_eq!(node_kind("tools"), NodeKind::Tools);
        assert_eq!(node_kind("__interrupt__"), NodeKind::Interrupt);
    }

    #[test]
    fn unknown_nodes_are_dynamic_agents() {
        assert_eq!(node_kind("custom_node_7"), NodeKind::Agent("custom_node_7"));
        assert_eq!(node_kind("research_agent"), NodeKind::Agent("research_agent"));
    }
}
