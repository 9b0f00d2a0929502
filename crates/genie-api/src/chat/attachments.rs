//! Document injection: resolve attached uploads and merge them into the
//! user's turn content before it reaches the engine.

use genie_persist::{DocumentRecord, PersistClient};
use genie_types::UserInfo;
use mongodb::bson::oid::ObjectId;
use serde_json::{json, Value};

/// Merge resolved documents into the turn content.
///
/// Text documents are appended to the user text as labelled blocks; image
/// documents switch the content to multimodal form, one `image_url` block
/// per image carrying its stored `data:` URI.
pub fn merge_documents(user_text: &str, documents: &[DocumentRecord]) -> Value {
    let (image_docs, text_docs): (Vec<_>, Vec<_>) =
        documents.iter().partition(|doc| doc.is_image());

    let mut final_text = user_text.to_string();
    if !text_docs.is_empty() {
        let doc_context: String = text_docs
            .iter()
            .map(|doc| {
                format!(
                    "\n---\n[Document: {}]\n{}\n---",
                    doc.name,
                    doc.full_text_content.as_deref().unwrap_or("(No text content)"),
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        final_text = format!("{}\n\nAttached Documents:{}", user_text, doc_context);
    }

    let image_blocks: Vec<Value> = image_docs
        .iter()
        .filter_map(|doc| {
            let uri = doc.full_text_content.as_deref()?;
            if !uri.starts_with("data:image") {
                return None;
            }
            Some(json!({ "type": "image_url", "image_url": { "url": uri } }))
        })
        .collect();

    if image_blocks.is_empty() {
        return json!(final_text);
    }

    let mut blocks = vec![json!({ "type": "text", "text": final_text })];
    blocks.extend(image_blocks);
    Value::Array(blocks)
}

/// Resolve attachment ids and merge their content into the turn. Resolution
/// failures degrade to the plain user text; a turn never fails because an
/// attachment could not be loaded.
pub async fn resolve_turn_content(
    persist: &PersistClient,
    user: &UserInfo,
    user_text: &str,
    document_ids: &[String],
) -> Value {
    if document_ids.is_empty() {
        return json!(user_text);
    }

    let object_ids: Vec<ObjectId> = document_ids
        .iter()
        .filter_map(|id| ObjectId::parse_str(id).ok())
        .collect();

    match persist.documents().find_many(&object_ids, user).await {
        Ok(documents) => merge_documents(user_text, &documents),
        Err(e) => {
            tracing::error!("Error fetching attached documents: {:#}", e);
            json!(user_text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use genie_persist::DocumentStatus;

    fn doc(name: &str, mime: &str, content: Option<&str>) -> DocumentRecord {
        let now = Utc::now();
        DocumentRecord {
            id: ObjectId::new(),
            name: name.to_string(),
            mime_type: mime.to_string(),
            size: 10,
            user_id: "u-1".to_string(),
            status: DocumentStatus::Ready,
            content_preview: None,
            full_text_content: content.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn no_documents_leaves_plain_text() {
        assert_eq!(merge_documents("hello", &[]), json!("hello"));
    }

    #[test]
    fn text_documents_are_appended_as_labelled_blocks() {
        let docs = vec![doc("notes.pdf", "application/pdf", Some("extracted text"))];
        let merged = merge_documents("summarize this", &docs);
        let text = merged.as_str().unwrap();
        assert!(text.starts_with("summarize this\n\nAttached Documents:"));
        assert!(text.contains("[Document: notes.pdf]"));
        assert!(text.contains("extracted text"));
    }

    #[test]
    fn missing_text_content_gets_a_marker() {
        let docs = vec![doc("empty.docx", "application/docx", None)];
        let merged = merge_documents("look", &docs);
        assert!(merged.as_str().unwrap().contains("(No text content)"));
    }

    #[test]
    fn images_switch_to_multimodal_blocks() {
        let docs = vec![
            doc("notes.txt", "text/plain", Some("some text")),
            doc("pic.png", "image/png", Some("data:image/png;base64,AAAA")),
        ];
        let merged = merge_documents("describe", &docs);
        let blocks = merged.as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0]["type"], "text");
        // Text doc context still rides along in the text block.
        assert!(blocks[0]["text"].as_str().unwrap().contains("[Document: notes.txt]"));
        assert_eq!(blocks[1]["image_url"]["url"], "data:image/png;base64,AAAA");
    }

    #[test]
    fn images_without_data_uri_are_skipped() {
        let docs = vec![doc("pic.png", "image/png", Some("https://cdn/pic.png"))];
        let merged = merge_documents("describe", &docs);
        // No usable image block, so content stays plain text.
        assert!(merged.is_string());
    }
}
