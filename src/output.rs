//! Result types produced by the planner.

use crate::error::PlannerError;
use crate::options::{AqfLevel, BloomsLevel, LessonDuration};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Structure pulled out of a course outline by the LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineExtraction {
    pub id: Uuid,
    /// Name of the uploaded file (display only).
    pub filename: String,
    pub subject_names: Vec<String>,
    /// Lecture topics in timetable order.
    pub lecture_topics: Vec<String>,
    /// Lecture topic → its focus topics (possibly empty).
    pub lecture_focus_mapping: IndexMap<String, Vec<String>>,
    pub extracted_at: DateTime<Utc>,
}

impl OutlineExtraction {
    /// Focus topics for `lecture_topic`; empty when the outline lists none.
    pub fn focus_topics(&self, lecture_topic: &str) -> &[String] {
        self.lecture_focus_mapping
            .get(lecture_topic)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Parameters a lesson plan is generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonPlanRequest {
    pub subject_name: String,
    pub lecture_topic: String,
    #[serde(default)]
    pub focus_topic: Option<String>,
    pub blooms_taxonomy: BloomsLevel,
    pub aqf_level: AqfLevel,
    pub lesson_duration: LessonDuration,
}

impl LessonPlanRequest {
    /// The focus topic, if one was given and is not blank.
    pub fn focus(&self) -> Option<&str> {
        self.focus_topic
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }

    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.subject_name.trim().is_empty() {
            return Err(PlannerError::InvalidRequest(
                "subject name must not be empty".into(),
            ));
        }
        if self.lecture_topic.trim().is_empty() {
            return Err(PlannerError::InvalidRequest(
                "lecture topic must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// A generated lesson plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonPlan {
    pub id: Uuid,
    pub request_data: LessonPlanRequest,
    /// Cleaned plain-text plan: ALL-CAPS section headings, hyphen bullets.
    pub content: String,
    pub generated_at: DateTime<Utc>,
}
