use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::llm_provider::{ChatMessage, LLMError, LLMProvider};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert GATE CSE (Computer Science Engineering) Exam Coach. \
Your goal is to help students clear the GATE exam with a top rank. \
You are knowledgeable in Algorithms, Data Structures, OS, DBMS, Networks, TOC, Compiler Design, Digital Logic, COA, and Mathematics. \
Keep answers concise, technical, and motivating. \
Provide formulas or short code snippets in C/C++ if relevant.";

pub const FALLBACK_REPLY: &str = "I couldn't generate a response. Please try again.";
pub const MAX_HISTORY_TURNS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentorRole {
    User,
    Model,
}

impl MentorRole {
    fn chat_role(self) -> &'static str {
        match self {
            MentorRole::User => "user",
            MentorRole::Model => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorTurn {
    pub role: MentorRole,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MentorRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub history: Vec<MentorTurn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MentorReply {
    pub reply: String,
    pub model: String,
}

#[derive(Debug, Error)]
pub enum MentorError {
    #[error("prompt is required")]
    EmptyPrompt,
    #[error("AI mentor is not configured")]
    NotConfigured,
    #[error("upstream failure: {0}")]
    Upstream(#[from] LLMError),
}

/// System instruction, then the most recent history turns, then the new prompt.
pub fn build_messages(system_prompt: &str, history: &[MentorTurn], prompt: &str) -> Vec<ChatMessage> {
    let skip = history.len().saturating_sub(MAX_HISTORY_TURNS);
    let mut messages = Vec::with_capacity(history.len() - skip + 2);
    messages.push(ChatMessage::new("system", system_prompt));
    messages.extend(
        history[skip..]
            .iter()
            .map(|turn| ChatMessage::new(turn.role.chat_role(), turn.text.as_str())),
    );
    messages.push(ChatMessage::new("user", prompt));
    messages
}

pub async fn ask(
    llm: &LLMProvider,
    system_prompt: &str,
    request: &MentorRequest,
) -> Result<MentorReply, MentorError> {
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err(MentorError::EmptyPrompt);
    }
    if !llm.is_available() {
        return Err(MentorError::NotConfigured);
    }

    let messages = build_messages(system_prompt, &request.history, prompt);
    let response = llm.chat(&messages).await?;

    let reply = response
        .first_content()
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_REPLY.to_string());
    let model = response
        .model
        .clone()
        .unwrap_or_else(|| llm.model().to_string());

    Ok(MentorReply { reply, model })
}
