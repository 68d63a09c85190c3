// src/models/mcq.rs
use crate::llm_client::{object_schema, string_schema, StructuredOutput};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 6;
pub const MIN_QUESTIONS: usize = 20;
pub const MAX_QUESTIONS: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McqOption {
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McqQuestion {
    pub question: String,
    pub question_description: String,
    pub options: Vec<McqOption>,
    pub options_description: String,
    pub correct_answer: String,
    pub correct_answer_description: String,
    pub explanation: String,
    pub explanation_description: String,
}

impl McqQuestion {
    /// Option bounds and the exactly-one-correct rule
    pub fn validate(&self) -> Result<(), String> {
        let n = self.options.len();
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&n) {
            return Err(format!(
                "question '{}' has {} options, expected {}-{}",
                self.question, n, MIN_OPTIONS, MAX_OPTIONS
            ));
        }

        let correct = self.options.iter().filter(|o| o.is_correct).count();
        if correct != 1 {
            return Err(format!(
                "question '{}' has {} correct options, expected exactly one",
                self.question, correct
            ));
        }

        Ok(())
    }

    pub fn correct_option(&self) -> Option<&McqOption> {
        self.options.iter().find(|o| o.is_correct)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqList {
    pub count: usize,
    pub raw: Vec<McqQuestion>,
}

impl StructuredOutput for McqList {
    const NAME: &'static str = "mcq_list";

    fn json_schema() -> Value {
        let option = object_schema(json!({
            "text": string_schema("Option text"),
            "isCorrect": { "type": "boolean", "description": "Whether this option is the correct answer" },
        }));

        let question = object_schema(json!({
            "question": string_schema("The question text"),
            "questionDescription": string_schema("Narration for the question"),
            "options": {
                "type": "array",
                "minItems": MIN_OPTIONS,
                "maxItems": MAX_OPTIONS,
                "items": option,
            },
            "optionsDescription": string_schema("Narration for the options"),
            "correctAnswer": string_schema("Text of the correct option"),
            "correctAnswerDescription": string_schema("Narration for the correct answer"),
            "explanation": string_schema("Why the answer is correct"),
            "explanationDescription": string_schema("Narration for the explanation"),
        }));

        object_schema(json!({
            "count": { "type": "integer", "description": "Number of questions in raw" },
            "raw": {
                "type": "array",
                "minItems": MIN_QUESTIONS,
                "maxItems": MAX_QUESTIONS,
                "items": question,
            },
        }))
    }

    fn validate(&self) -> Result<(), String> {
        let n = self.raw.len();
        if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&n) {
            return Err(format!(
                "expected {}-{} questions, got {}",
                MIN_QUESTIONS, MAX_QUESTIONS, n
            ));
        }
        if self.count != n {
            return Err(format!("declared count {} does not match {} questions", self.count, n));
        }
        self.raw.iter().try_for_each(McqQuestion::validate)
    }
}
