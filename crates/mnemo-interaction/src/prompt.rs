//! Analysis prompt rendering.
//!
//! The prompt describes the knowledge-base layout and routing rules and asks
//! for a JSON proposal. It is rendered with minijinja so the folder list and
//! rules stay data rather than string concatenation.

use chrono::{DateTime, Datelike, TimeZone};
use minijinja::{Environment, context};
use mnemo_core::analysis::AnalysisRequest;
use mnemo_core::{MnemoError, Result};
use serde::Serialize;

const TEMPLATE_NAME: &str = "analysis";

const ANALYSIS_TEMPLATE: &str = r#"You are an assistant that organizes a personal knowledge base. Analyze the text and decide where it should be saved.

Available folders:
{% for folder in folders -%}
- {{ folder.pattern }} — {{ folder.purpose }}
{% endfor %}
Rules:
{% for rule in rules -%}
{{ loop.index }}. {{ rule }}
{% endfor %}
Text to analyze:
"{{ text }}"
{% if edit_instructions %}
The user reviewed a previous proposal for this text and asked for these corrections. Follow them:
"{{ edit_instructions }}"
{% endif %}
Reply in JSON:
{
    "actions": [
        {
            "file": "path/to/file.md",
            "action": "append" or "create",
            "content": "what to add (markdown formatted)",
            "description": "short description for the user"
        }
    ],
    "summary": "short description of what will be done (1-2 sentences, in the language of the text)"
}

Today's date: {{ today }}
Time: {{ time }}
Add timestamps to daily entries."#;

#[derive(Debug, Clone, Serialize)]
struct Folder {
    pattern: String,
    purpose: &'static str,
}

fn folders<Tz: TimeZone>(now: &DateTime<Tz>) -> Vec<Folder> {
    vec![
        Folder {
            pattern: format!("daily/{:04}/{:02}/{:02}.md", now.year(), now.month(), now.day()),
            purpose: "daily entries",
        },
        Folder {
            pattern: "projects/{project_name}/log.md".to_string(),
            purpose: "project logs",
        },
        Folder {
            pattern: "notes/{title}.md".to_string(),
            purpose: "standalone notes",
        },
        Folder {
            pattern: "ideas/{title}.md".to_string(),
            purpose: "ideas",
        },
        Folder {
            pattern: "people/{name}.md".to_string(),
            purpose: "notes about people",
        },
        Folder {
            pattern: "books-manga/{title}.md".to_string(),
            purpose: "books and manga",
        },
    ]
}

const RULES: [&str; 4] = [
    "If it is about the day or what was done, put it in daily",
    "If a project is mentioned, add it both to daily and to projects/{project}/log.md",
    "If it is about a person, add it both to the main category and to people/",
    "One entry may go to several places (cross-linking)",
];

/// Renders the analysis prompt for `request` as of `now`.
pub fn render_analysis_prompt<Tz>(request: &AnalysisRequest, now: &DateTime<Tz>) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut env = Environment::new();
    env.add_template(TEMPLATE_NAME, ANALYSIS_TEMPLATE)
        .map_err(|e| MnemoError::internal(format!("invalid analysis template: {e}")))?;
    let template = env
        .get_template(TEMPLATE_NAME)
        .map_err(|e| MnemoError::internal(format!("analysis template missing: {e}")))?;

    let edit_instructions = request
        .edit_instructions
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    template
        .render(context! {
            folders => folders(now),
            rules => RULES,
            text => request.text.trim(),
            edit_instructions => edit_instructions,
            today => now.format("%Y-%m-%d").to_string(),
            time => now.format("%H:%M").to_string(),
        })
        .map_err(|e| MnemoError::internal(format!("failed to render analysis prompt: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_prompt_contains_layout_and_date() {
        let prompt =
            render_analysis_prompt(&AnalysisRequest::new("bought milk today"), &fixed_now())
                .unwrap();

        assert!(prompt.contains("- daily/2024/05/01.md — daily entries"));
        assert!(prompt.contains("- projects/{project_name}/log.md — project logs"));
        assert!(prompt.contains("2. If a project is mentioned"));
        assert!(prompt.contains("\"bought milk today\""));
        assert!(prompt.contains("Today's date: 2024-05-01"));
        assert!(prompt.contains("Time: 09:30"));
        assert!(!prompt.contains("corrections"));
    }

    #[test]
    fn test_prompt_includes_edit_instructions() {
        let request = AnalysisRequest::new("met Anna about the garden project")
            .with_edit_instructions("only save it under projects/garden");
        let prompt = render_analysis_prompt(&request, &fixed_now()).unwrap();

        assert!(prompt.contains("asked for these corrections"));
        assert!(prompt.contains("\"only save it under projects/garden\""));
        assert!(prompt.contains("\"met Anna about the garden project\""));
    }

    #[test]
    fn test_blank_edit_instructions_are_ignored() {
        let request = AnalysisRequest::new("x").with_edit_instructions("   ");
        let prompt = render_analysis_prompt(&request, &fixed_now()).unwrap();
        assert!(!prompt.contains("corrections"));
    }
}
