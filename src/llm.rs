//! Text-generation capability
//!
//! The pipeline only needs "fill this prompt template, give me text back".
//! Branching decisions and the final narrative both go through this trait,
//! so tests can swap in deterministic generators.

use crate::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::Mutex;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{(\w+)\}").unwrap();
}

/// Named values substituted into `{name}` placeholders of a prompt template.
pub type PromptVariables = HashMap<&'static str, String>;

/// Trait for text generation (LLM controlled)
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Render `prompt_template` with `variables` and return the model's text.
    async fn complete(&self, prompt_template: &str, variables: &PromptVariables) -> Result<String>;
}

/// Substitute every `{name}` with its value in a single pass over the
/// template. Substituted text is never rescanned; placeholders without a
/// value are left untouched.
pub fn render_prompt(template: &str, variables: &PromptVariables) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match variables.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Static generator for development & testing.
/// Returns a fixed reply and remembers every rendered prompt.
pub struct StaticGenerator {
    reply: std::result::Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl StaticGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A generator whose every call fails with an `LlmError`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts rendered so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        match self.prompts.lock() {
            Ok(prompts) => prompts.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl TextGenerator for StaticGenerator {
    async fn complete(&self, prompt_template: &str, variables: &PromptVariables) -> Result<String> {
        let rendered = render_prompt(prompt_template, variables);
        match self.prompts.lock() {
            Ok(mut prompts) => prompts.push(rendered),
            Err(poisoned) => poisoned.into_inner().push(rendered),
        }

        self.reply
            .clone()
            .map_err(crate::error::OrchestrationError::LlmError)
    }
}
