//! Prompt construction.
//!
//! Pure functions from request parameters to instruction text. The wording
//! encodes the output contract the parser expects: JSON only, the exact
//! slide schema, and the deck structure (title, agenda, content slides,
//! conclusion).

use crate::types::LessonRequest;

/// System prompt for the agenda planning call in streaming mode.
pub const PLANNING_SYSTEM_PROMPT: &str =
    "You are an educational content planner. Respond ONLY with valid JSON.";

const SLIDE_SCHEMA: &str = r#"{
  "type": "title" | "agenda" | "content" | "conclusion",
  "title": "string, 1-200 characters",
  "content": "string, bullet points or short paragraphs",
  "image": "optional string, an image search query",
  "question": {
    "prompt": "string, at least 10 characters",
    "options": ["2 to 5 answer options, typically 4"],
    "answer": "string, must match one of the options"
  }
}"#;

fn context_line(request: &LessonRequest) -> &str {
    if request.context.is_empty() {
        "No specific context provided."
    } else {
        &request.context
    }
}

/// System prompt for whole-deck generation.
pub fn deck_system_prompt(request: &LessonRequest) -> String {
    format!(
        "You are an expert educational content creator. You design engaging, \
pedagogically sound lesson presentations and respond ONLY with valid JSON.\n\
\n\
Produce a JSON object with this shape:\n\
{{\"topic\": \"string\", \"grade\": \"string\", \"slides\": [ ...slide objects... ]}}\n\
\n\
Each slide object follows this schema:\n\
{schema}\n\
\n\
Structure requirements:\n\
- The slides array must contain exactly {total} slides in this order:\n\
  1 slide of type \"title\", then 1 of type \"agenda\", then {n} of type \
\"content\", then 1 of type \"conclusion\".\n\
- The title slide introduces the topic with an engaging heading.\n\
- The agenda slide lists the points covered by the content slides.\n\
- Content slides teach one subtopic each, written for this audience: {grade}.\n\
- The conclusion slide summarizes the key takeaways.\n\
\n\
Optional fields:\n\
- Some content slides may include an \"image\" field with a specific image \
search query.\n\
- AT MOST ONE content slide (around the middle) may include a \"question\" \
field. Its answer must match one of its options exactly or by letter label.\n\
\n\
Audience and context:\n\
- Adjust vocabulary, examples and depth to: {grade}.\n\
- Incorporate this context where relevant: {context}\n\
\n\
Keep slide text concise; slides are read, not narrated.",
        schema = SLIDE_SCHEMA,
        total = request.total_slides(),
        n = request.n_slides,
        grade = request.grade,
        context = context_line(request),
    )
}

/// User prompt for whole-deck generation.
pub fn deck_user_prompt(request: &LessonRequest) -> String {
    format!(
        "Create a lesson presentation with these details:\n\
\n\
Topic: {topic}\n\
Grade level: {grade}\n\
Number of content slides: {n}\n\
Additional context: {context}\n\
\n\
Respond with the complete presentation JSON and nothing else.",
        topic = request.topic,
        grade = request.grade,
        n = request.n_slides,
        context = context_line(request),
    )
}

/// User prompt asking for the list of content-slide subtopics.
pub fn planning_prompt(request: &LessonRequest) -> String {
    format!(
        "Plan a lesson on \"{topic}\" for this audience: {grade}.\n\
Additional context: {context}\n\
\n\
List the {n} subtopics the content slides should cover, ordered for \
teaching. Respond ONLY with a JSON array of {n} strings, for example \
[\"First subtopic\", \"Second subtopic\"].",
        topic = request.topic,
        grade = request.grade,
        context = context_line(request),
        n = request.n_slides,
    )
}

/// System prompt shared by all per-slide generation calls.
pub fn slide_system_prompt(request: &LessonRequest) -> String {
    format!(
        "You are an expert educational content creator writing one \
presentation slide at a time. Respond ONLY with a single JSON object \
following this schema:\n\
{schema}\n\
\n\
Write for this audience: {grade}.\n\
Incorporate this context where relevant: {context}\n\
Keep slide text concise and age appropriate. Do not include fields you \
were not asked for.",
        schema = SLIDE_SCHEMA,
        grade = request.grade,
        context = context_line(request),
    )
}

/// User prompt for the opening title slide.
pub fn title_slide_prompt(request: &LessonRequest) -> String {
    format!(
        "Create the title slide for a lesson on \"{topic}\". Use type \
\"title\", an engaging heading naming the topic, and one or two short \
lines of content introducing the lesson.",
        topic = request.topic,
    )
}

/// User prompt for the agenda slide, listing the planned subtopics.
pub fn agenda_slide_prompt(request: &LessonRequest, subtopics: &[String]) -> String {
    format!(
        "Create the agenda slide for a lesson on \"{topic}\". Use type \
\"agenda\". The {n} content slides will cover:\n\
{items}\n\
Present these as a bullet list in the content field.",
        topic = request.topic,
        n = request.n_slides,
        items = bullet_list(subtopics),
    )
}

/// User prompt for one content slide.
pub fn content_slide_prompt(
    request: &LessonRequest,
    slide_number: usize,
    subtopic: &str,
    include_image: bool,
    include_question: bool,
) -> String {
    let mut prompt = format!(
        "Create content slide {number} of {total} for a lesson on \
\"{topic}\". Use type \"content\". This slide covers the subtopic: \
\"{subtopic}\". Teach it with bullet points or a short paragraph.",
        number = slide_number,
        total = request.n_slides,
        topic = request.topic,
        subtopic = subtopic,
    );

    if include_image {
        prompt.push_str(
            "\nInclude an \"image\" field with a specific search query for a \
relevant illustration.",
        );
    }
    if include_question {
        prompt.push_str(
            "\nInclude a \"question\" field with a multiple choice question \
about this subtopic: a prompt, an options array with 4 choices, and an \
answer matching one of the options.",
        );
    }

    prompt
}

/// User prompt for the closing conclusion slide.
pub fn conclusion_slide_prompt(request: &LessonRequest, subtopics: &[String]) -> String {
    format!(
        "Create the conclusion slide for a lesson on \"{topic}\". Use type \
\"conclusion\". Summarize the key takeaways from these covered subtopics:\n\
{items}",
        topic = request.topic,
        items = bullet_list(subtopics),
    )
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}
