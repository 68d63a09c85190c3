// src/models/quote.rs
//! Structured records produced by the quote video workflow nodes.

use crate::llm_client::{object_schema, string_array_schema, string_schema, StructuredOutput};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

fn non_empty_list(name: &str, items: &[String]) -> Result<(), String> {
    if items.is_empty() || items.iter().all(|s| s.trim().is_empty()) {
        return Err(format!("{} must contain at least one entry", name));
    }
    Ok(())
}

fn non_empty_text(name: &str, text: &str) -> Result<(), String> {
    if text.trim().is_empty() {
        return Err(format!("{} must not be empty", name));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleAndThumbnailTextLists {
    pub titles: Vec<String>,
    pub thumbnail_text_list: Vec<String>,
}

impl StructuredOutput for TitleAndThumbnailTextLists {
    const NAME: &'static str = "title_and_thumbnail_text_lists";

    fn json_schema() -> Value {
        object_schema(json!({
            "titles": string_array_schema("Candidate video titles"),
            "thumbnail_text_list": string_array_schema("Candidate thumbnail texts"),
        }))
    }

    fn validate(&self) -> Result<(), String> {
        non_empty_list("titles", &self.titles)?;
        non_empty_list("thumbnail_text_list", &self.thumbnail_text_list)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestTitleAndThumbnailText {
    pub best_thumbnail_text: String,
    pub best_title: String,
}

impl StructuredOutput for BestTitleAndThumbnailText {
    const NAME: &'static str = "best_title_and_thumbnail_text";

    fn json_schema() -> Value {
        object_schema(json!({
            "best_thumbnail_text": string_schema("The chosen thumbnail text"),
            "best_title": string_schema("The chosen title"),
        }))
    }

    fn validate(&self) -> Result<(), String> {
        non_empty_text("best_title", &self.best_title)?;
        non_empty_text("best_thumbnail_text", &self.best_thumbnail_text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quotes {
    pub quotes: Vec<String>,
}

impl StructuredOutput for Quotes {
    const NAME: &'static str = "quotes";

    fn json_schema() -> Value {
        object_schema(json!({ "quotes": string_array_schema("Quotes for the video") }))
    }

    fn validate(&self) -> Result<(), String> {
        non_empty_list("quotes", &self.quotes)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailVisualDesc {
    pub thumbnail_visual_desc: String,
}

impl StructuredOutput for ThumbnailVisualDesc {
    const NAME: &'static str = "thumbnail_visual_desc";

    fn json_schema() -> Value {
        object_schema(json!({
            "thumbnail_visual_desc": string_schema("Image prompt for the thumbnail"),
        }))
    }

    fn validate(&self) -> Result<(), String> {
        non_empty_text("thumbnail_visual_desc", &self.thumbnail_visual_desc)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Description {
    pub description: String,
}

impl StructuredOutput for Description {
    const NAME: &'static str = "description";

    fn json_schema() -> Value {
        object_schema(json!({ "description": string_schema("Video description") }))
    }

    fn validate(&self) -> Result<(), String> {
        non_empty_text("description", &self.description)
    }
}
