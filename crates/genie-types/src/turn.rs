use serde::{Deserialize, Serialize};

/// Thread id used by the client before a thread exists. Turns against it
/// still run, but no thread record is touched and no title is generated.
pub const PLACEHOLDER_THREAD_ID: &str = "unknown";

/// Titles that count as "not yet summarized" and may be overwritten once.
pub const TITLE_PLACEHOLDERS: [&str; 2] = ["New thread", "Untitled thread"];

/// Caller identity as resolved by the upstream OAuth proxy.
///
/// `user_id` falls back to the email when the provider supplies no stable id,
/// so ownership comparisons always go through [`UserInfo::resolved_id`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
}

impl UserInfo {
    pub fn resolved_id(&self) -> &str {
        if self.user_id.is_empty() {
            &self.user_email
        } else {
            &self.user_id
        }
    }
}

/// Per-turn overrides submitted alongside the user text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnOptions {
    pub model: Option<String>,
    pub provider: Option<String>,
    /// Allow-list of fully qualified `server__toolname` entries.
    pub tools: Option<Vec<String>>,
    /// Decision for a pending tool approval; turns the input into a resume.
    pub allow_tool: Option<ToolDecision>,
    pub approve_all_tools: bool,
    pub agent_id: Option<String>,
    pub document_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolDecision {
    Allow,
    Deny,
}

impl ToolDecision {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "allow" => Some(Self::Allow),
            "deny" => Some(Self::Deny),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_id_prefers_user_id() {
        let user = UserInfo {
            user_id: "u-1".into(),
            user_name: "Ada".into(),
            user_email: "ada@example.com".into(),
        };
        assert_eq!(user.resolved_id(), "u-1");
    }

    #[test]
    fn resolved_id_falls_back_to_email() {
        let user = UserInfo {
            user_id: String::new(),
            user_name: "Ada".into(),
            user_email: "ada@example.com".into(),
        };
        assert_eq!(user.resolved_id(), "ada@example.com");
    }

    #[test]
    fn tool_decision_parses_known_values_only() {
        assert_eq!(ToolDecision::parse("allow"), Some(ToolDecision::Allow));
        assert_eq!(ToolDecision::parse("deny"), Some(ToolDecision::Deny));
        assert_eq!(ToolDecision::parse("maybe"), None);
    }
}
