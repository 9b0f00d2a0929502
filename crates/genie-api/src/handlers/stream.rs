//! The SSE turn endpoint: ensure the thread, merge attachments, resolve the
//! agent configuration, run the engine and stream normalized events back.

use axum::extract::{Query, State};
use axum::response::sse::{Event, Sse};
use futures::{Stream, StreamExt};
use genie_graph::{ResumeAction, TurnInput};
use genie_types::{ToolDecision, TurnOptions, PLACEHOLDER_THREAD_ID};
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use std::convert::Infallible;

use crate::auth::AuthUser;
use crate::chat::{attachments, agent_config, sse, normalize_turn, TurnContext};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamQuery {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    pub model: Option<String>,
    pub provider: Option<String>,
    /// Comma-separated allow-list of qualified tool names.
    pub tools: Option<String>,
    /// Pending tool-approval decision: `allow` or `deny`.
    pub allow_tool: Option<String>,
    #[serde(default)]
    pub approve_all_tools: Option<String>,
    pub agent_id: Option<String>,
    /// Comma-separated attachment ids.
    pub document_ids: Option<String>,
}

fn split_csv(value: &Option<String>) -> Option<Vec<String>> {
    let raw = value.as_deref()?;
    if raw.is_empty() {
        return None;
    }
    Some(
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

impl StreamQuery {
    fn options(&self) -> TurnOptions {
        TurnOptions {
            model: self.model.clone(),
            provider: self.provider.clone(),
            tools: split_csv(&self.tools),
            allow_tool: self.allow_tool.as_deref().and_then(ToolDecision::parse),
            approve_all_tools: self.approve_all_tools.as_deref() == Some("true"),
            agent_id: self.agent_id.clone(),
            document_ids: split_csv(&self.document_ids),
        }
    }
}

/// Send one turn and stream the normalized response as server-sent events.
///
/// Authorization and thread resolution happen before the stream starts, so
/// those failures reject the request; everything after the first frame is
/// reported in-band as an `error` event.
pub async fn send_turn_stream(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<StreamQuery>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let options = query.options();
    let user_text = query.content.clone();
    let thread_id = query
        .thread_id
        .clone()
        .unwrap_or_else(|| PLACEHOLDER_THREAD_ID.to_string());

    let requested_agent_id = options
        .agent_id
        .as_deref()
        .map(ObjectId::parse_str)
        .transpose()
        .map_err(|_| ApiError::BadRequest("Invalid agent id".to_string()))?;

    // Ensure + authorize the thread, unless the client has not created one
    // yet. `ensure` may also update the thread's agent association.
    let thread = if thread_id != PLACEHOLDER_THREAD_ID {
        let object_id = ObjectId::parse_str(&thread_id)
            .map_err(|_| ApiError::BadRequest("Invalid thread ID format".to_string()))?;
        Some(
            state
                .persist
                .threads()
                .ensure(object_id, &user_text, &user, requested_agent_id)
                .await?,
        )
    } else {
        None
    };

    // A tool-approval decision resumes the paused run instead of submitting
    // new content.
    let input = match options.allow_tool {
        Some(ToolDecision::Allow) => TurnInput::Resume { action: ResumeAction::Continue },
        Some(ToolDecision::Deny) => TurnInput::Resume { action: ResumeAction::Update },
        None => {
            let content = attachments::resolve_turn_content(
                &state.persist,
                &user,
                &user_text,
                options.document_ids.as_deref().unwrap_or(&[]),
            )
            .await;
            TurnInput::human(content, options.document_ids.as_deref())
        }
    };

    // The stored definition wins over request overrides; the request's agent
    // id wins over the thread's remembered one.
    let effective_agent_id =
        requested_agent_id.or_else(|| thread.as_ref().and_then(|t| t.agent_id));
    let agent = match effective_agent_id {
        Some(id) => match state.persist.agents().get(id).await {
            Ok(agent) => agent,
            Err(e) => {
                tracing::error!("Error loading agent {}: {:#}", id.to_hex(), e);
                None
            }
        },
        None => None,
    };

    let spec = agent_config::build_run_spec(&state, &user, &thread_id, &options, agent).await?;

    // Engine invocation failures after this point surface as one in-band
    // error event; the submission itself is part of the streamed turn.
    let graph = state.graph.clone();
    let raw = async_stream::stream! {
        match graph.stream_run(&spec, input).await {
            Ok(mut updates) => {
                while let Some(update) = updates.next().await {
                    yield update;
                }
            }
            Err(e) => yield Err(e),
        }
    };

    let ctx = TurnContext { thread_id, user_text };
    let events = normalize_turn(raw, ctx, state.title_task.clone());

    Ok(Sse::new(sse::frame_stream(events)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_params_are_split_and_trimmed() {
        let value = Some("weather__forecast, calc__add ,".to_string());
        assert_eq!(
            split_csv(&value),
            Some(vec!["weather__forecast".to_string(), "calc__add".to_string()])
        );
        assert_eq!(split_csv(&Some(String::new())), None);
        assert_eq!(split_csv(&None), None);
    }

    #[test]
    fn options_parse_flags_and_decisions() {
        let query = StreamQuery {
            content: "hi".into(),
            thread_id: None,
            model: None,
            provider: None,
            tools: None,
            allow_tool: Some("allow".into()),
            approve_all_tools: Some("true".into()),
            agent_id: None,
            document_ids: None,
        };
        let options = query.options();
        assert_eq!(options.allow_tool, Some(ToolDecision::Allow));
        assert!(options.approve_all_tools);

        let query = StreamQuery { allow_tool: Some("nonsense".into()), ..query };
        assert_eq!(query.options().allow_tool, None);
    }
}
