use genie_mcp::ToolInfo;
use serde_json::{json, Value};

/// Iteration cap for supervisor runs, applied only when sub-agents exist.
pub const DEFAULT_RECURSION_LIMIT: u32 = 25;

/// System prompt used when neither the agent definition nor the request
/// carries one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Genie, a helpful assistant. \
Answer clearly and concisely, use the available tools when they help, and \
say so when you do not know something.";

/// Everything the engine needs to build one agent graph for one turn:
/// model + tools + system prompt + checkpoint thread, plus sub-agent specs
/// when running in supervisor mode. The execution semantics live entirely
/// on the engine side; this is configuration only.
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub thread_id: String,
    pub provider: String,
    pub model: String,
    pub system_prompt: String,
    pub tools: Vec<ToolInfo>,
    pub sub_agents: Vec<SubAgentSpec>,
    pub recursion_limit: u32,
    pub approve_all_tools: bool,
}

#[derive(Debug, Clone)]
pub struct SubAgentSpec {
    pub name: String,
    pub description: Option<String>,
    pub provider: String,
    pub model: String,
    pub system_prompt: String,
    pub tools: Vec<ToolInfo>,
}

impl RunSpec {
    pub fn new(
        thread_id: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            provider: provider.into(),
            model: model.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            tools: Vec::new(),
            sub_agents: Vec::new(),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            approve_all_tools: false,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolInfo>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_sub_agents(mut self, sub_agents: Vec<SubAgentSpec>) -> Self {
        self.sub_agents = sub_agents;
        self
    }

    pub fn with_recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn with_approve_all_tools(mut self, approve: bool) -> Self {
        self.approve_all_tools = approve;
        self
    }

    /// Supervisor mode is requested by configuring at least one sub-agent.
    pub fn is_supervisor(&self) -> bool {
        !self.sub_agents.is_empty()
    }

    /// Encode the agent configuration for the engine's run endpoint.
    pub fn to_payload(&self) -> Value {
        let prompt = if self.is_supervisor() && self.system_prompt == DEFAULT_SYSTEM_PROMPT {
            supervisor_prompt(&self.sub_agents)
        } else {
            self.system_prompt.clone()
        };

        let mut agent = json!({
            "provider": self.provider,
            "model": self.model,
            "system_prompt": prompt,
            "tools": tool_payloads(&self.tools),
            "approve_all_tools": self.approve_all_tools,
        });

        if self.is_supervisor() {
            let subs: Vec<Value> = self
                .sub_agents
                .iter()
                .map(|sub| {
                    json!({
                        "name": sanitize_agent_name(&sub.name),
                        "description": sub
                            .description
                            .clone()
                            .unwrap_or_else(|| format!("Agent: {}", sub.name)),
                        "provider": sub.provider,
                        "model": sub.model,
                        "system_prompt": sub.system_prompt,
                        "tools": tool_payloads(&sub.tools),
                    })
                })
                .collect();
            agent["sub_agents"] = Value::Array(subs);
        }

        agent
    }
}

fn tool_payloads(tools: &[ToolInfo]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "input_schema": tool.input_schema,
            })
        })
        .collect()
}

/// Supervisor prompt synthesized when the agent definition stores none.
fn supervisor_prompt(sub_agents: &[SubAgentSpec]) -> String {
    let roster = sub_agents
        .iter()
        .map(|sub| {
            format!(
                "- {}: {}",
                sub.name,
                sub.description.as_deref().unwrap_or("specialized agent")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a supervisor agent coordinating a team of specialized agents.\n\n\
Your sub-agents are:\n{}\n\n\
When you receive a request:\n\
1. Analyze what type of expertise is needed\n\
2. Delegate to the most appropriate sub-agent\n\
3. Coordinate responses from multiple agents if needed\n\
4. Synthesize final answers for the user",
        roster
    )
}

/// Restrict agent node names to the pattern the engine accepts
/// (no whitespace, `<`, `|`, `\`, `/`, `>`).
pub fn sanitize_agent_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| !matches!(c, '<' | '|' | '\\' | '/' | '>'))
        .collect();
    replaced.trim_matches('_').to_string()
}

/// Input for one engine run: either a fresh user message, or a resume
/// command answering a pending tool-approval interrupt.
#[derive(Debug, Clone)]
pub enum TurnInput {
    Messages(Vec<Value>),
    Resume { action: ResumeAction },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeAction {
    Continue,
    Update,
}

impl TurnInput {
    /// Wrap user content (plain text or multimodal blocks) as one human
    /// message, tagging attached document ids for the engine's records.
    pub fn human(content: Value, document_ids: Option<&[String]>) -> Self {
        let mut kwargs = json!({});
        if let Some(ids) = document_ids {
            kwargs["document_ids"] = json!(ids);
        }
        TurnInput::Messages(vec![json!({
            "type": "human",
            "content": content,
            "additional_kwargs": kwargs,
        })])
    }

    pub fn to_payload(&self) -> Value {
        match self {
            TurnInput::Messages(messages) => json!({ "messages": messages }),
            TurnInput::Resume { action } => {
                let action = match action {
                    ResumeAction::Continue => "continue",
                    ResumeAction::Update => "update",
                };
                json!({ "command": { "resume": { "action": action, "data": {} } } })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sanitize_replaces_spaces_and_strips_invalid_chars() {
        assert_eq!(sanitize_agent_name("Data Analyst"), "Data_Analyst");
        assert_eq!(sanitize_agent_name("a/b<c>d|e"), "abcde");
        assert_eq!(sanitize_agent_name("  padded  "), "padded");
    }

    #[test]
    fn supervisor_payload_lists_sanitized_sub_agents() {
        let spec = RunSpec::new("t-1", "google", "gemini-2.0-flash").with_sub_agents(vec![
            SubAgentSpec {
                name: "Data Analyst".into(),
                description: Some("crunches numbers".into()),
                provider: "openai".into(),
                model: "gpt-4o".into(),
                system_prompt: "You analyze data.".into(),
                tools: vec![],
            },
        ]);

        assert!(spec.is_supervisor());
        let payload = spec.to_payload();
        assert_eq!(payload["sub_agents"][0]["name"], "Data_Analyst");
        // Stored prompt is the default, so a supervisor prompt is synthesized.
        assert!(payload["system_prompt"]
            .as_str()
            .unwrap()
            .contains("Data Analyst: crunches numbers"));
    }

    #[test]
    fn single_agent_payload_has_no_sub_agents() {
        let spec = RunSpec::new("t-1", "openai", "gpt-4o").with_system_prompt("be terse");
        let payload = spec.to_payload();
        assert_eq!(payload["system_prompt"], "be terse");
        assert!(payload.get("sub_agents").is_none());
    }

    #[test]
    fn human_input_carries_document_ids() {
        let ids = vec!["d-1".to_string(), "d-2".to_string()];
        let input = TurnInput::human(json!("look at these"), Some(&ids));
        let payload = input.to_payload();
        assert_eq!(
            payload["messages"][0]["additional_kwargs"]["document_ids"],
            json!(["d-1", "d-2"])
        );
    }

    #[test]
    fn resume_input_encodes_the_decision() {
        let allow = TurnInput::Resume { action: ResumeAction::Continue }.to_payload();
        assert_eq!(allow["command"]["resume"]["action"], "continue");

        let deny = TurnInput::Resume { action: ResumeAction::Update }.to_payload();
        assert_eq!(deny["command"]["resume"]["action"], "update");
    }
}
