//! Downloadable lesson-plan document.
//!
//! The cleaned plan text uses ALL-CAPS headings and hyphen bullets; this
//! module lays it out as a Markdown document with a metadata table on top.

use crate::output::LessonPlan;

/// Rendered in place of a missing focus topic.
const GENERAL_COVERAGE: &str = "General coverage";

/// Render `plan` as a standalone Markdown document.
pub fn render_markdown(plan: &LessonPlan) -> String {
    let req = &plan.request_data;
    let mut out = String::with_capacity(plan.content.len() + 512);

    out.push_str("# Lesson Plan\n\n");
    out.push_str("| Field | Value |\n| --- | --- |\n");
    let rows = [
        ("Subject", req.subject_name.trim().to_string()),
        ("Lecture Topic", req.lecture_topic.trim().to_string()),
        (
            "Focus Topic",
            req.focus().unwrap_or(GENERAL_COVERAGE).to_string(),
        ),
        ("Bloom's Taxonomy", req.blooms_taxonomy.to_string()),
        ("AQF Level", req.aqf_level.label()),
        ("Duration", req.lesson_duration.to_string()),
        (
            "Generated",
            plan.generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ),
    ];
    for (field, value) in rows {
        out.push_str(&format!("| {} | {} |\n", field, escape_cell(&value)));
    }
    out.push('\n');

    let mut previous_blank = true;
    for line in plan.content.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !previous_blank {
                out.push('\n');
            }
            previous_blank = true;
            continue;
        }

        if is_section_heading(line) {
            if !previous_blank {
                out.push('\n');
            }
            out.push_str(&format!("## {}\n\n", line));
            previous_blank = true;
            continue;
        }

        match bullet_text(line) {
            Some(item) => {
                out.push_str(&format!("- {}\n", item));
                previous_blank = false;
            }
            None => {
                // Each plain line is its own paragraph; a line directly under
                // a bullet would otherwise continue that list item.
                if !previous_blank {
                    out.push('\n');
                }
                out.push_str(&format!("{}\n\n", line));
                previous_blank = true;
            }
        }
    }

    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out.push('\n');
    out
}

/// `lesson_plan_{subject}_{id8}.md` with spaces in the subject replaced by `_`.
pub fn download_filename(plan: &LessonPlan) -> String {
    let subject = plan.request_data.subject_name.trim().replace(' ', "_");
    let id = plan.id.simple().to_string();
    format!("lesson_plan_{}_{}.md", subject, &id[..8])
}

/// An ALL-CAPS line longer than three characters. Needs at least one cased
/// letter, so digits and uncased scripts never qualify.
fn is_section_heading(line: &str) -> bool {
    line.chars().count() > 3
        && line.chars().any(char::is_uppercase)
        && !line.chars().any(char::is_lowercase)
}

fn bullet_text(line: &str) -> Option<&str> {
    line.strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .map(str::trim)
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}
