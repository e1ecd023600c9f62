//! The generation engine.
//!
//! Orchestrates the pipeline: resolve a provider once at construction,
//! build prompts, call the model, parse the reply and assemble the deck.
//! [`generate`](GenerationEngine::generate) produces a whole presentation
//! in one call; [`stream`](GenerationEngine::stream) yields it slide by
//! slide.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::assembler::{self, expected_type_at};
use crate::config::Settings;
use crate::error::{EngineError, Result};
use crate::parser;
use crate::prompt;
use crate::provider::{self, ChatModel, CompletionRequest};
use crate::retry::RetryPolicy;
use crate::stream::{CancelHandle, SlideStream, make_cancellable};
use crate::types::{LessonRequest, Presentation, Slide, SlideType};

/// LLM-backed presentation generator.
///
/// Cheap to clone; clones share the underlying HTTP client. Construction
/// resolves the provider and fails fast on missing credentials, so a live
/// engine is always able to issue calls.
#[derive(Clone)]
pub struct GenerationEngine {
    model: Arc<dyn ChatModel>,
    model_name: String,
    temperature: f32,
    retry: RetryPolicy,
    timeout: Option<Duration>,
}

impl GenerationEngine {
    /// Build an engine from settings, resolving the provider once.
    ///
    /// Returns [`EngineError::Configuration`] when no usable API key is
    /// present. No prompt is built and no request goes out in that case.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let provider = settings.resolve_provider()?;
        let model_name = settings.model_for(provider);
        let model = provider::build_model(settings, provider)?;
        tracing::info!(
            provider = model.provider_name(),
            model = %model_name,
            "generation engine ready"
        );

        Ok(Self {
            model,
            model_name,
            temperature: settings.temperature,
            retry: RetryPolicy::new(settings.max_retries),
            timeout: settings.timeout,
        })
    }

    /// Build an engine around a caller-supplied model.
    ///
    /// This is the seam for custom providers and for tests, which pass
    /// scripted fakes here.
    pub fn with_model(model: Arc<dyn ChatModel>, model_name: impl Into<String>) -> Self {
        Self {
            model,
            model_name: model_name.into(),
            temperature: crate::config::DEFAULT_TEMPERATURE,
            retry: RetryPolicy::new(crate::config::DEFAULT_MAX_RETRIES),
            timeout: None,
        }
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set a per-call deadline for LLM requests.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Name of the provider backing this engine.
    pub fn provider_name(&self) -> &'static str {
        self.model.provider_name()
    }

    /// Model identifier sent with every call.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Generate a complete presentation in one LLM call.
    ///
    /// Parse and validation failures are retried with the same prompt up
    /// to the configured budget; terminal failure is
    /// [`EngineError::Generation`] carrying the last cause.
    pub async fn generate(&self, request: &LessonRequest) -> Result<Presentation> {
        let request = request.clone().normalized()?;
        let request_id = Uuid::new_v4();
        let completion = CompletionRequest::new(
            prompt::deck_system_prompt(&request),
            prompt::deck_user_prompt(&request),
            self.temperature,
        );

        let presentation = self
            .retry
            .run("deck generation", |attempt| {
                let completion = &completion;
                let request = &request;
                async move {
                    tracing::debug!(%request_id, attempt, topic = %request.topic, "generating deck");
                    let raw = self.complete_once(completion).await?;
                    let slides = parser::parse_deck(&raw)?;
                    assembler::assemble(request, slides)
                }
            })
            .await?;

        tracing::info!(
            %request_id,
            topic = %presentation.topic,
            slides = presentation.slides.len(),
            "generated presentation"
        );
        Ok(presentation)
    }

    /// Stream the presentation slide by slide.
    ///
    /// See [`stream_with_cancel`](Self::stream_with_cancel); this variant
    /// keeps the cancel handle internal.
    pub fn stream(&self, request: &LessonRequest) -> SlideStream {
        self.stream_with_cancel(request, CancelHandle::new())
    }

    /// Stream the presentation slide by slide, ending early when `handle`
    /// is cancelled.
    ///
    /// The stream is lazy: nothing happens until it is polled. Slides
    /// arrive in deck order, exactly `n_slides + 3` of them on success.
    /// The first error ends the stream, so consumers never see a deck with
    /// a gap in the middle, and cancellation stops any further LLM calls.
    pub fn stream_with_cancel(
        &self,
        request: &LessonRequest,
        handle: CancelHandle,
    ) -> SlideStream {
        let engine = self.clone();
        let request = request.clone();

        let inner = async_stream::stream! {
            let request = match request.normalized() {
                Ok(request) => request,
                Err(err) => {
                    yield Err(err);
                    return;
                }
            };

            let stream_id = Uuid::new_v4();
            tracing::info!(
                %stream_id,
                topic = %request.topic,
                total = request.total_slides(),
                "streaming presentation"
            );

            let subtopics = engine.plan_subtopics(&request).await;

            for plan in deck_plan(&request) {
                match engine.generate_slide(&request, &plan, &subtopics).await {
                    Ok(slide) => yield Ok(slide),
                    Err(err) => {
                        tracing::warn!(%stream_id, error = %err, "stream ended early");
                        yield Err(err);
                        return;
                    }
                }
            }

            tracing::info!(%stream_id, "stream complete");
        };

        make_cancellable(Box::pin(inner), handle)
    }

    /// Plan the content-slide subtopics.
    ///
    /// Planning is best effort: on any failure the deck falls back to
    /// numbered placeholder subtopics, and short plans are padded the same
    /// way, so the deck shape never depends on the planning call.
    async fn plan_subtopics(&self, request: &LessonRequest) -> Vec<String> {
        let completion = CompletionRequest::new(
            prompt::PLANNING_SYSTEM_PROMPT,
            prompt::planning_prompt(request),
            self.temperature,
        );

        let n = request.n_slides as usize;
        let mut subtopics = match self.complete_once(&completion).await {
            Ok(raw) => match parser::parse_subtopics(&raw) {
                Ok(subtopics) => subtopics,
                Err(err) => {
                    tracing::warn!(error = %err, "unusable subtopic plan, using placeholders");
                    Vec::new()
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "subtopic planning failed, using placeholders");
                Vec::new()
            }
        };

        subtopics.truncate(n);
        for i in subtopics.len()..n {
            subtopics.push(format!("Topic {}", i + 1));
        }
        subtopics
    }

    /// Generate and validate one slide of the deck.
    async fn generate_slide(
        &self,
        request: &LessonRequest,
        plan: &SlidePlan,
        subtopics: &[String],
    ) -> Result<Slide> {
        let user = match plan.slide_type {
            SlideType::Title => prompt::title_slide_prompt(request),
            SlideType::Agenda => prompt::agenda_slide_prompt(request, subtopics),
            SlideType::Content => {
                let i = plan.index - 2;
                prompt::content_slide_prompt(
                    request,
                    i + 1,
                    &subtopics[i],
                    plan.include_image,
                    plan.include_question,
                )
            }
            SlideType::Conclusion => prompt::conclusion_slide_prompt(request, subtopics),
        };
        let completion =
            CompletionRequest::new(prompt::slide_system_prompt(request), user, self.temperature);

        let expected = plan.slide_type;
        let wants_question = plan.include_question;
        self.retry
            .run("slide generation", |attempt| {
                let completion = &completion;
                async move {
                    tracing::debug!(attempt, slide = %expected, "generating slide");
                    let raw = self.complete_once(completion).await?;
                    let slide = coerce_slide(parser::parse_slide(&raw)?, expected, wants_question);
                    slide.check()?;
                    Ok(slide)
                }
            })
            .await
    }

    /// One model call, bounded by the configured timeout when set.
    async fn complete_once(&self, completion: &CompletionRequest) -> Result<String> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.model.complete(completion))
                .await
                .map_err(|_| EngineError::Timeout(limit))?,
            None => self.model.complete(completion).await,
        }
    }
}

/// Position and extras of one planned slide.
#[derive(Debug, Clone, Copy)]
struct SlidePlan {
    /// 0-based position in the deck.
    index: usize,
    slide_type: SlideType,
    include_image: bool,
    include_question: bool,
}

/// Lay out the deck for a request: which slide goes where and which
/// content slides carry an image query or the question.
///
/// Images go on every other content slide starting with the first; the
/// single question goes on the middle content slide.
fn deck_plan(request: &LessonRequest) -> Vec<SlidePlan> {
    let total = request.total_slides();
    let n = request.n_slides as usize;

    (0..total)
        .map(|index| {
            let slide_type = expected_type_at(index, total);
            let (include_image, include_question) = if slide_type == SlideType::Content {
                let i = index - 2;
                (i % 2 == 0, i == n / 2)
            } else {
                (false, false)
            };
            SlidePlan {
                index,
                slide_type,
                include_image,
                include_question,
            }
        })
        .collect()
}

/// Repair model output that is valid on its own but wrong for its slot.
///
/// Mislabeled slide types are relabeled to the planned type, and questions
/// the plan did not ask for are dropped so the deck keeps at most one.
fn coerce_slide(mut slide: Slide, expected: SlideType, wants_question: bool) -> Slide {
    if slide.slide_type != expected {
        tracing::warn!(
            got = %slide.slide_type,
            expected = %expected,
            "model mislabeled slide type, relabeling"
        );
        slide.slide_type = expected;
    }
    if !wants_question && slide.question.is_some() {
        tracing::warn!(title = %slide.title, "dropping question the plan did not ask for");
        slide.question = None;
    }
    slide
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Question;

    fn request(n_slides: u32) -> LessonRequest {
        LessonRequest::new("Photosynthesis", "7th grade", n_slides)
    }

    #[test]
    fn deck_plan_matches_the_presentation_layout() {
        let plan = deck_plan(&request(5));

        assert_eq!(plan.len(), 8);
        assert_eq!(plan[0].slide_type, SlideType::Title);
        assert_eq!(plan[1].slide_type, SlideType::Agenda);
        assert!(
            plan[2..7]
                .iter()
                .all(|slot| slot.slide_type == SlideType::Content)
        );
        assert_eq!(plan[7].slide_type, SlideType::Conclusion);
    }

    #[test]
    fn images_alternate_and_the_question_lands_mid_deck() {
        let plan = deck_plan(&request(5));

        let images: Vec<bool> = plan[2..7].iter().map(|slot| slot.include_image).collect();
        assert_eq!(images, [true, false, true, false, true]);

        let questions: Vec<usize> = plan
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.include_question)
            .map(|(index, _)| index)
            .collect();
        assert_eq!(questions, [4]);
    }

    #[test]
    fn a_single_content_slide_gets_both_extras() {
        let plan = deck_plan(&request(1));

        assert_eq!(plan.len(), 4);
        assert!(plan[2].include_image);
        assert!(plan[2].include_question);
    }

    #[test]
    fn coercion_relabels_and_strips_unrequested_questions() {
        let question = Question {
            prompt: "What do plants absorb from the air?".to_string(),
            options: vec!["A) Carbon dioxide".to_string(), "B) Oxygen".to_string()],
            answer: "A) Carbon dioxide".to_string(),
        };

        let mislabeled = Slide::new(SlideType::Title, "Chlorophyll", "Green pigment.")
            .with_question(question.clone());
        let coerced = coerce_slide(mislabeled, SlideType::Content, false);
        assert_eq!(coerced.slide_type, SlideType::Content);
        assert!(coerced.question.is_none());

        let requested = Slide::new(SlideType::Content, "Chlorophyll", "Green pigment.")
            .with_question(question);
        let kept = coerce_slide(requested, SlideType::Content, true);
        assert!(kept.question.is_some());
    }
}
