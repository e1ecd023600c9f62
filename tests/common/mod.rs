//! Shared test doubles and response fixtures.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use lectern::error::{EngineError, Result};
use lectern::provider::{ChatModel, CompletionRequest};

/// A chat model that replays scripted responses in order and counts calls.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String>>>,
    calls: AtomicU32,
}

impl ScriptedModel {
    pub fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(EngineError::provider(
                    "scripted",
                    "script ran out of responses",
                ))
            })
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// JSON object for one plain slide.
pub fn slide_value(slide_type: &str, title: &str) -> serde_json::Value {
    serde_json::json!({
        "type": slide_type,
        "title": title,
        "content": format!("Body text for {title}."),
    })
}

/// Raw model reply containing one plain slide.
pub fn slide_response(slide_type: &str, title: &str) -> String {
    slide_value(slide_type, title).to_string()
}

/// Raw model reply for a content slide, optionally with image and question.
pub fn content_response(title: &str, with_image: bool, with_question: bool) -> String {
    let mut slide = slide_value("content", title);
    if with_image {
        slide["image"] = serde_json::json!(format!("diagram of {title}"));
    }
    if with_question {
        slide["question"] = question_value();
    }
    slide.to_string()
}

/// A question that passes validation.
pub fn question_value() -> serde_json::Value {
    serde_json::json!({
        "prompt": "What do plants absorb from sunlight?",
        "options": ["A) Energy", "B) Soil", "C) Plastic", "D) Metal"],
        "answer": "A) Energy",
    })
}

/// Raw model reply with a well-formed deck for `n` content slides.
pub fn deck_response(n: usize) -> String {
    let mut slides = vec![
        slide_value("title", "Photosynthesis"),
        slide_value("agenda", "What We Will Cover"),
    ];
    for i in 0..n {
        slides.push(slide_value("content", &format!("Subtopic {}", i + 1)));
    }
    slides.push(slide_value("conclusion", "Wrapping Up"));

    serde_json::json!({ "slides": slides }).to_string()
}

/// Raw model reply for the planning call.
pub fn subtopics_response(n: usize) -> String {
    let topics: Vec<String> = (0..n).map(|i| format!("Subtopic {}", i + 1)).collect();
    serde_json::json!(topics).to_string()
}
