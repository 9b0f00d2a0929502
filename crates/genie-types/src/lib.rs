pub mod events;
pub mod turn;

pub use events::{
    AiPayload, ChatMessage, ErrorPayload, HumanPayload, ToolPayload, TurnEvent,
};
pub use turn::{ToolDecision, TurnOptions, UserInfo, PLACEHOLDER_THREAD_ID, TITLE_PLACEHOLDERS};
