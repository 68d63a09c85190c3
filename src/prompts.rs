// src/prompts.rs
//! Static prompt templates for the quote workflow and the MCQ generator.

use crate::llm_client::ChatMessage;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PromptError {
    #[error("Missing template variable: {0}")]
    MissingVariable(String),
}

/// A system/user message pair with `{name}` placeholders
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub system: &'static str,
    pub user: &'static str,
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder pattern"))
}

fn fill(template: &str, vars: &HashMap<&str, String>) -> Result<String, PromptError> {
    let re = placeholder_re();

    if let Some(missing) = re
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .find(|name| !vars.contains_key(name.as_str()))
    {
        return Err(PromptError::MissingVariable(missing));
    }

    Ok(re
        .replace_all(template, |caps: &Captures| vars[&caps[1]].clone())
        .into_owned())
}

impl PromptTemplate {
    pub fn render(&self, vars: &HashMap<&str, String>) -> Result<Vec<ChatMessage>, PromptError> {
        Ok(vec![
            ChatMessage::system(fill(self.system, vars)?),
            ChatMessage::user(fill(self.user, vars)?),
        ])
    }
}

pub const TITLES_AND_THUMBNAILS: PromptTemplate = PromptTemplate {
    system: "you are expert youtube content creator specialized in creating quotes types of video data like, Generating good list of title and thumbnail text for given topics.",
    user: "create list of titles and a list of thumbnail texts for this  {topic}. each list should contains 10 items.",
};

pub const SELECT_BEST_TITLE_AND_THUMBNAIL: PromptTemplate = PromptTemplate {
    system: "you are expert youtube content creator specialized in creating quotes types of video data like, selecting best title and thumbnail text for given list of titles and thumbnail texts for this {topic}.",
    user: "select best title and thumbnail text from given list of titles and thumbnail texts. \n\n **Title List:** {titles} \n\n **Thumbnail Text List:** {thumbnail_text_list}",
};

pub const QUOTES: PromptTemplate = PromptTemplate {
    system: "you are expert youtube content creator specialized in creating quotes types of video data like, generating good list of quotes for given title and thumbnail text for this {topic}.",
    user: "create a list of 40-50 quotes for this **Title:** {best_title} and **Thumbnail_text:** {best_thumbnail_text}.",
};

pub const THUMBNAIL_VISUAL_DESC: PromptTemplate = PromptTemplate {
    system: "you are an expert midjourney prompt creator specialized in creating youtube thumbnails images with small and concise prompts. Use oil painting style  and black, red, yellow, white colors scheme",
    user: "create a image description for youtube thumbnail image for title {best_title} and a place in image to write thumbnail text \"{best_thumbnail_text}\" manually after generating the image.",
};

pub const DESCRIPTION: PromptTemplate = PromptTemplate {
    system: "you are expert youtube content creator specialized in creating description for given title and thumbnail text for this *{topic}* topic.",
    user: "create a description for the youtube video for this **Title: {best_title} ** and **Thumbnail_text: {best_thumbnail_text}**.",
};

/// System message for the tool-calling chat graph
pub const CHAT_SYSTEM: &str = "You are an expert content creator specializing in inspirational quotes and videos. \
For each request, generate a compelling title, description, thumbnail text, visual description for the thumbnail, \
and a list of 5-7 powerful quotes related to the requested topic, then call create_video. \
If you need clarification from a person, call human_assistance.";

/// Canned one-liners
pub fn get_prompt(name: &str) -> &'static str {
    match name {
        "greeting" => "Hello! How can I assist you today?",
        "farewell" => "Goodbye! Have a great day!",
        "help" => "Here are some commands you can use: ...",
        _ => "Prompt not found.",
    }
}

/// Composite prompt for MCQ generation. `document` is expected to be
/// truncated already.
pub fn mcq_prompt(system_prompt: &str, document: &str, user_prompt: &str, question_count: usize) -> String {
    format!(
        "{system_prompt}\n\n\
         DOCUMENT CONTENT:\n\
         {document}\n\n\
         USER QUERY:\n\
         {user_prompt}\n\n\
         INSTRUCTIONS:\n\
         Generate exactly {question_count} multiple choice questions based on the document content.\n\
         Each question should have between 2-6 options with exactly one correct answer.\n\
         Ensure the questions are relevant to the document content and user query.\n"
    )
}
