use serde::{Deserialize, Serialize};

/// Chat message in provider-neutral form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System { content: Content },
    Human { content: Content },
    AI { content: Option<Content> },
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Message::System { content: Content::text(text) }
    }

    pub fn human(text: impl Into<String>) -> Self {
        Message::Human { content: Content::text(text) }
    }
}

/// Message content: plain text or a list of multimodal blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text(text.into())
    }

    /// Concatenated text of all textual parts.
    pub fn as_text(&self) -> String {
        match self {
            Content::Text(text) => text.clone(),
            Content::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    ContentBlock::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_as_text_joins_text_blocks() {
        let content = Content::Blocks(vec![
            ContentBlock::Text { text: "Hel".into() },
            ContentBlock::ImageUrl {
                image_url: ImageUrl { url: "data:image/png;base64,AAAA".into() },
            },
            ContentBlock::Text { text: "lo".into() },
        ]);
        assert_eq!(content.as_text(), "Hello");
    }
}
