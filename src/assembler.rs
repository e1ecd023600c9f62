//! Deck assembly.
//!
//! The single place that knows what a well-formed deck looks like: exact
//! slide count, positional types, and the at-most-one-question rule. Bulk
//! generation routes parsed decks through [`assemble`]; the streaming
//! planner derives its per-position slide types from [`expected_type_at`]
//! so both modes share one definition of the layout.

use crate::error::{EngineError, Result};
use crate::types::{LessonRequest, Presentation, Slide, SlideType};

/// Slide type a valid deck carries at `index`, given the deck's total size.
pub fn expected_type_at(index: usize, total_slides: usize) -> SlideType {
    if index == 0 {
        SlideType::Title
    } else if index == 1 {
        SlideType::Agenda
    } else if index + 1 == total_slides {
        SlideType::Conclusion
    } else {
        SlideType::Content
    }
}

/// Validate the deck structure and build the final [`Presentation`].
///
/// Violations are [`EngineError::Validation`] values; the engine treats them
/// as retryable since a fresh LLM attempt may produce a well-formed deck.
pub fn assemble(request: &LessonRequest, slides: Vec<Slide>) -> Result<Presentation> {
    let expected_total = request.total_slides();
    if slides.len() != expected_total {
        return Err(EngineError::validation(format!(
            "deck must contain {expected_total} slides ({} content slides plus \
title, agenda and conclusion), got {}",
            request.n_slides,
            slides.len()
        )));
    }

    for (index, slide) in slides.iter().enumerate() {
        let expected = expected_type_at(index, expected_total);
        if slide.slide_type != expected {
            return Err(EngineError::validation(format!(
                "slide {index} must be of type '{expected}', got '{}'",
                slide.slide_type
            )));
        }
    }

    let questions = slides
        .iter()
        .filter(|slide| slide.question.is_some())
        .count();
    if questions > 1 {
        return Err(EngineError::validation(format!(
            "deck may contain at most one question, found {questions}"
        )));
    }
    if let Some(slide) = slides
        .iter()
        .find(|slide| slide.question.is_some() && slide.slide_type != SlideType::Content)
    {
        return Err(EngineError::validation(format!(
            "questions are only allowed on content slides, found one on a {} slide",
            slide.slide_type
        )));
    }

    Ok(Presentation {
        topic: request.topic.clone(),
        grade: request.grade.clone(),
        slides,
    })
}
