//! Lesson deck data model.
//!
//! `LessonRequest` is the inbound surface; `Slide`, `Question` and
//! `Presentation` are the generated structures. Slide-level rules live here
//! next to the types, deck-level rules live in the assembler.

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{EngineError, Result};

/// Inclusive bounds for the number of content slides in one deck.
pub const MIN_CONTENT_SLIDES: u32 = 1;
pub const MAX_CONTENT_SLIDES: u32 = 15;

/// Parameters for one lesson deck.
///
/// `n_slides` counts content slides only; the generated deck always adds a
/// title, an agenda and a conclusion around them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct LessonRequest {
    /// Lesson subject, e.g. "Photosynthesis".
    #[validate(length(min = 3, max = 100, message = "must be between 3 and 100 characters"))]
    pub topic: String,

    /// Audience descriptor, e.g. "7th grade".
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub grade: String,

    /// Extra guidance folded into the prompts (focus areas, objectives).
    #[serde(default)]
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub context: String,

    /// Number of content slides to generate.
    #[validate(range(min = 1, max = 15, message = "must be between 1 and 15"))]
    pub n_slides: u32,
}

impl LessonRequest {
    /// Build a request with an empty context.
    pub fn new(topic: impl Into<String>, grade: impl Into<String>, n_slides: u32) -> Self {
        Self {
            topic: topic.into(),
            grade: grade.into(),
            context: String::new(),
            n_slides,
        }
    }

    /// Attach context text.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Trim free-text fields and check the documented bounds.
    ///
    /// Whitespace-only values are rejected by the post-trim length checks.
    pub fn normalized(mut self) -> Result<Self> {
        self.topic = self.topic.trim().to_string();
        self.grade = self.grade.trim().to_string();
        self.context = self.context.trim().to_string();
        self.validate()
            .map_err(|errors| EngineError::validation(flatten_errors(&errors)))?;
        Ok(self)
    }

    /// Total number of slides a deck for this request must contain.
    pub fn total_slides(&self) -> usize {
        self.n_slides as usize + 3
    }
}

fn flatten_errors(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    let parts: Vec<String> = fields
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                let detail = err
                    .message
                    .as_deref()
                    .unwrap_or(err.code.as_ref())
                    .to_string();
                format!("{field}: {detail}")
            })
        })
        .collect();

    parts.join("; ")
}

/// Structural role of a slide inside the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideType {
    Title,
    Agenda,
    Content,
    Conclusion,
}

impl SlideType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Agenda => "agenda",
            Self::Content => "content",
            Self::Conclusion => "conclusion",
        }
    }
}

impl fmt::Display for SlideType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Multiple-choice question attached to one content slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Question statement, at least 10 characters.
    pub prompt: String,
    /// 2 to 5 answer options, typically labeled "A) ..." through "D) ...".
    pub options: Vec<String>,
    /// The correct answer: an option verbatim, or its single-letter label.
    pub answer: String,
}

impl Question {
    /// Check the prompt/option bounds and that the answer resolves against
    /// the options. Models sometimes hallucinate an answer that matches
    /// nothing, which must be caught before the slide leaves the engine.
    pub fn check(&self) -> Result<()> {
        if self.prompt.chars().count() < 10 {
            return Err(EngineError::parse(
                "question prompt must be at least 10 characters",
            ));
        }
        if self.options.len() < 2 || self.options.len() > 5 {
            return Err(EngineError::parse(format!(
                "question must have 2 to 5 options, got {}",
                self.options.len()
            )));
        }

        let answer = self.answer.trim();
        let options: Vec<&str> = self.options.iter().map(|opt| opt.trim()).collect();

        if options.contains(&answer) {
            return Ok(());
        }

        // A bare letter may refer to an option label ("C" for "C) ...").
        let mut letters = answer.chars();
        if let (Some(letter), None) = (letters.next(), letters.next()) {
            if letter.is_alphabetic()
                && options.iter().any(|opt| {
                    opt.chars()
                        .next()
                        .is_some_and(|first| chars_eq_ignore_case(first, letter))
                })
            {
                return Ok(());
            }
        }

        Err(EngineError::parse(format!(
            "answer '{}' does not match any of the options {:?}",
            self.answer, self.options
        )))
    }
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a.to_lowercase().eq(b.to_lowercase())
}

/// One slide of a presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    /// Structural type; drives where the slide may appear in the deck.
    #[serde(rename = "type")]
    pub slide_type: SlideType,

    /// Slide heading, 1 to 200 characters.
    pub title: String,

    /// Main body text (bullet points or short paragraphs).
    pub content: String,

    /// Search query for an accompanying image, when one would help.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Interactive question; only meaningful on content slides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<Question>,
}

impl Slide {
    /// Build a slide of the given type with no image or question.
    pub fn new(
        slide_type: SlideType,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            slide_type,
            title: title.into(),
            content: content.into(),
            image: None,
            question: None,
        }
    }

    /// Attach an image search query.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Attach a multiple-choice question.
    pub fn with_question(mut self, question: Question) -> Self {
        self.question = Some(question);
        self
    }

    /// Check the slide's field bounds and type-specific rules.
    pub fn check(&self) -> Result<()> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(EngineError::parse("slide title must not be empty"));
        }
        if title.chars().count() > 200 {
            return Err(EngineError::parse(
                "slide title must be at most 200 characters",
            ));
        }
        if self.content.trim().is_empty() {
            return Err(EngineError::parse("slide content must not be empty"));
        }
        if let Some(image) = &self.image {
            let image = image.trim();
            if image.is_empty() || image.chars().count() > 200 {
                return Err(EngineError::parse(
                    "image query must be between 1 and 200 characters",
                ));
            }
        }
        if let Some(question) = &self.question {
            if self.slide_type != SlideType::Content {
                return Err(EngineError::parse(format!(
                    "questions are only allowed on content slides, found one on a {} slide",
                    self.slide_type
                )));
            }
            question.check()?;
        }
        Ok(())
    }
}

/// A complete, validated slide deck.
///
/// Construction goes through [`crate::assembler::assemble`], which enforces
/// the deck-level structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    /// Lesson topic, echoed from the request.
    pub topic: String,
    /// Target grade, echoed from the request.
    pub grade: String,
    /// Ordered slides: title, agenda, content slides, conclusion.
    pub slides: Vec<Slide>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(answer: &str) -> Question {
        Question {
            prompt: "Which pigment absorbs light?".to_string(),
            options: vec![
                "A) Chlorophyll".to_string(),
                "B) Melanin".to_string(),
                "C) Keratin".to_string(),
                "D) Hemoglobin".to_string(),
            ],
            answer: answer.to_string(),
        }
    }

    #[test]
    fn request_normalization_trims_fields() {
        let request = LessonRequest::new("  Photosynthesis  ", " 7th grade ", 5)
            .with_context("  focus on light reactions  ")
            .normalized()
            .unwrap();
        assert_eq!(request.topic, "Photosynthesis");
        assert_eq!(request.grade, "7th grade");
        assert_eq!(request.context, "focus on light reactions");
        assert_eq!(request.total_slides(), 8);
    }

    #[test]
    fn request_rejects_whitespace_only_topic() {
        let err = LessonRequest::new("   ", "7th grade", 5)
            .normalized()
            .unwrap_err();
        match err {
            EngineError::Validation(message) => assert!(message.contains("topic")),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn request_boundary_values() {
        assert!(LessonRequest::new("Algebra", "9th grade", 1).normalized().is_ok());
        assert!(LessonRequest::new("Algebra", "9th grade", 15).normalized().is_ok());
        assert!(LessonRequest::new("Algebra", "9th grade", 0).normalized().is_err());
        assert!(LessonRequest::new("Algebra", "9th grade", 16).normalized().is_err());

        let long_topic = "x".repeat(101);
        assert!(LessonRequest::new(long_topic, "9th grade", 5).normalized().is_err());
        assert!(LessonRequest::new("ab", "9th grade", 5).normalized().is_err());

        let long_context = "x".repeat(2001);
        let err = LessonRequest::new("Algebra", "9th grade", 5)
            .with_context(long_context)
            .normalized();
        assert!(err.is_err());
    }

    #[test]
    fn answer_matches_option_verbatim() {
        assert!(question("A) Chlorophyll").check().is_ok());
        assert!(question("  A) Chlorophyll  ").check().is_ok());
    }

    #[test]
    fn answer_matches_option_label() {
        assert!(question("A").check().is_ok());
        assert!(question("a").check().is_ok());
        assert!(question("D").check().is_ok());
    }

    #[test]
    fn answer_mismatch_is_rejected() {
        assert!(question("Xanthophyll").check().is_err());
        assert!(question("E").check().is_err());
        assert!(question("1").check().is_err());
    }

    #[test]
    fn question_option_count_bounds() {
        let mut q = question("A");
        q.options.truncate(1);
        assert!(q.check().is_err());

        let mut q = question("A");
        q.options.extend(["E) Carotene".to_string(), "F) Xanthophyll".to_string()]);
        assert!(q.check().is_err());
    }

    #[test]
    fn short_question_prompt_is_rejected() {
        let mut q = question("A");
        q.prompt = "Why?".to_string();
        assert!(q.check().is_err());
    }

    #[test]
    fn question_only_allowed_on_content_slides() {
        let slide = Slide {
            slide_type: SlideType::Agenda,
            title: "Agenda".to_string(),
            content: "What we will cover".to_string(),
            image: None,
            question: Some(question("A")),
        };
        let err = slide.check().unwrap_err();
        match err {
            EngineError::Parse(message) => assert!(message.contains("content slides")),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn slide_field_bounds() {
        let slide = Slide {
            slide_type: SlideType::Content,
            title: "  ".to_string(),
            content: "body".to_string(),
            image: None,
            question: None,
        };
        assert!(slide.check().is_err());

        let slide = Slide {
            slide_type: SlideType::Content,
            title: "t".repeat(201),
            content: "body".to_string(),
            image: None,
            question: None,
        };
        assert!(slide.check().is_err());

        let slide = Slide {
            slide_type: SlideType::Content,
            title: "Fine".to_string(),
            content: "".to_string(),
            image: None,
            question: None,
        };
        assert!(slide.check().is_err());
    }

    #[test]
    fn slide_type_serializes_lowercase() {
        let slide = Slide {
            slide_type: SlideType::Conclusion,
            title: "Wrap up".to_string(),
            content: "Summary".to_string(),
            image: None,
            question: None,
        };
        let json = serde_json::to_value(&slide).unwrap();
        assert_eq!(json["type"], "conclusion");
        assert!(json.get("image").is_none());
        assert!(json.get("question").is_none());
    }
}
