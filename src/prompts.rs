//! Prompts for outline extraction and lesson-plan generation.
//!
//! Unit tests inspect the prompts directly without calling a real LLM.
//!
//! Callers can override the system instruction via
//! [`crate::config::PlannerConfig::system_instruction`]; the constants here
//! are used only when no override is provided.

use crate::output::LessonPlanRequest;

/// Session-level steering text sent with every call.
pub const SYSTEM_INSTRUCTION: &str =
    "You are an expert educational content analyzer and lesson plan generator.";

/// Minimal prompt used to check that an API key works.
pub const API_KEY_CHECK_PROMPT: &str = "Hello";

/// The first `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Ask for the outline's structure as a single JSON object.
///
/// `outline_text` should already be truncated by the caller.
pub fn outline_extraction_prompt(outline_text: &str) -> String {
    format!(
        r#"Analyze the following academic subject outline PDF content and extract the required information in JSON format.

PDF Content:
{outline_text}

Please extract and return ONLY a JSON object with the following structure:
{{
    "subject_names": ["list of subject names found"],
    "lecture_topics": ["list of lecture topics from timetable of activities"],
    "lecture_focus_mapping": {{
        "Lecture Topic 1": ["focus topic 1.1", "focus topic 1.2"],
        "Lecture Topic 2": ["focus topic 2.1", "focus topic 2.2"],
        "etc": ["etc"]
    }}
}}

Instructions:
1. Look for subject names in headers, titles, or course information
2. Find lecture topics in the timetable of activities section
3. For each lecture topic, identify its corresponding focus topics (subtopics/subdivisions mentioned for that specific lecture/week)
4. Create a mapping where each lecture topic maps to its specific focus topics only
5. If a lecture topic has no specific focus topics, map it to an empty array []
6. Return clean, readable names without extra formatting
7. Return ONLY the JSON object, no other text"#
    )
}

/// Ask for a plain-text lesson plan with ALL-CAPS section headings.
pub fn lesson_plan_prompt(request: &LessonPlanRequest) -> String {
    let subject = request.subject_name.trim();
    let lecture = request.lecture_topic.trim();
    let blooms = request.blooms_taxonomy;
    let aqf = request.aqf_level.label();
    let duration = request.lesson_duration;

    let (focus_line, focus_area, focus_check) = match request.focus() {
        Some(focus) => (
            focus.to_string(),
            format!("Emphasize {focus} within the broader {lecture} context"),
            format!("Focused specifically on '{focus}'"),
        ),
        None => (
            "General coverage of the lecture topic".to_string(),
            format!("Provide comprehensive coverage of {lecture}"),
            format!("Comprehensively covering '{lecture}'"),
        ),
    };

    format!(
        r#"Create a detailed lesson plan based on the following parameters:

Subject: {subject}
Lecture Topic: {lecture}
Focus Topic: {focus_line}
Bloom's Taxonomy Level: {blooms}
AQF Level: {aqf}
Duration: {duration}

Please create a comprehensive lesson plan with professional formatting. Use proper headings, bullet points, and structure. DO NOT use markdown symbols like #, *, or other formatting characters. Format it as follows:

LEARNING OBJECTIVES
- Clear, measurable objectives aligned with the {blooms} level of Bloom's taxonomy

LEARNING OUTCOMES
- What students will achieve, appropriate for {aqf}

PRE-REQUISITES
- Required knowledge or skills

MATERIALS AND RESOURCES
- What's needed for the lesson

LESSON STRUCTURE ({duration})

Introduction/Hook (X minutes)
- Engage students activities

Main Content Delivery (X minutes)
- Explanation and demonstration activities

Active Learning Activities (X minutes)
- Hands-on, discussion, and practice activities

Assessment/Evaluation (X minutes)
- Formative assessment aligned with Bloom's level

Conclusion/Summary (X minutes)
- Wrap-up activities

ASSESSMENT CRITERIA
- How student understanding will be measured

EXTENSION ACTIVITIES
- For advanced students

DIFFERENTIATION STRATEGIES
- For diverse learning needs

Focus Area: {focus_area}

Ensure the content is:
- Age and level appropriate for {aqf}
- {focus_check}
- Designed to achieve {blooms} level cognitive skills
- Realistic for the {duration} timeframe
- Engaging and interactive
- Professionally formatted without markdown symbols

Format the response as clean, professional text with clear section headings in ALL CAPS and proper bullet points using hyphens."#
    )
}
