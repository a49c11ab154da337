//! Prompt text for planning and generation requests

use crate::planner::TechStack;
use std::fmt::Write as _;

/// Prompt asking for the technical stack of a requirement as JSON
#[must_use]
pub fn tech_stack_prompt(requirement: &str) -> String {
    format!(
        r#"Analyze this project requirement and determine the technical stack.
Project Requirement: {requirement}

Rules:
1. Identify the main programming language (e.g., Python, JavaScript, Rust).
2. List key frameworks or libraries needed (e.g., Flask, React, Axum).
3. Determine the type of application (e.g., Web API, Frontend Web App, CLI Tool).

Your response MUST be a valid JSON object with exactly this structure:
{{
    "language": "string",
    "frameworks": ["string"],
    "app_type": "string"
}}"#
    )
}

/// Prompt asking for a numbered list of development goals
#[must_use]
pub fn goals_prompt(requirement: &str, tech_stack: &TechStack) -> String {
    let stack = serde_json::to_string(tech_stack).unwrap_or_default();
    format!(
        "Based on this project requirement and tech stack, break it down into 5-10 \
high-level, actionable development goals.
Project Requirement: {requirement}
Tech Stack: {stack}

Return ONLY a numbered list of goals, one goal per line. Start numbering from 1.
Example:
1. Set up the project with {language}.
2. Implement user authentication.
3. Develop API endpoints for core features.
...",
        language = tech_stack.language
    )
}

/// Prompt asking for a whole project as a `{"files":[...]}` manifest
#[must_use]
pub fn project_prompt(tasks: &[String], project_type: &str) -> String {
    let mut task_list = String::new();
    for task in tasks {
        let _ = writeln!(task_list, "- {task}");
    }

    format!(
        r#"Generate a complete {project_type} project based on the following tasks:
{task_list}
Return the output as a JSON object containing a list named "files".
Each item in the "files" list must be an object with two keys:
1. "name": the relative path of the file (e.g., "src/main.py", "index.html", "requirements.txt").
2. "content": the complete text content of that file.

Example JSON structure:
{{
  "files": [
    {{
      "name": "main.py",
      "content": "print('Hello World')"
    }},
    {{
      "name": "static/style.css",
      "content": "body {{ background-color: #f0f0f0; }}"
    }}
  ]
}}

Escape file content properly for JSON, especially newlines (\n) and quotes (\").
Include configuration files (like requirements.txt or package.json) where the project type needs them."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_prompt_lists_tasks_and_shape() {
        let tasks = vec!["1. Build API".to_string(), "2. Add tests".to_string()];
        let prompt = project_prompt(&tasks, "web");

        assert!(prompt.starts_with("Generate a complete web project"));
        assert!(prompt.contains("- 1. Build API\n- 2. Add tests\n"));
        assert!(prompt.contains(r#""files""#));
        assert!(prompt.contains("body { background-color"));
    }

    #[test]
    fn goals_prompt_embeds_stack() {
        let stack = TechStack {
            language: "Rust".into(),
            frameworks: vec!["axum".into()],
            app_type: "Web API".into(),
        };
        let prompt = goals_prompt("a todo service", &stack);

        assert!(prompt.contains("Project Requirement: a todo service"));
        assert!(prompt.contains(r#""frameworks":["axum"]"#));
        assert!(prompt.contains("1. Set up the project with Rust."));
    }

    #[test]
    fn tech_stack_prompt_requests_json() {
        let prompt = tech_stack_prompt("a chat app");
        assert!(prompt.contains("Project Requirement: a chat app"));
        assert!(prompt.contains(r#""app_type": "string""#));
    }
}
