use std::collections::HashMap;
use tracing::warn;

use super::shellexpand;

/// Bundled templates, embedded at compile time.
const BUNDLED_TEMPLATES: &str = include_str!("../../../../prompts/TEMPLATES.md");

/// File name of the templates under `{data_dir}/prompts/`.
pub const TEMPLATES_FILE: &str = "TEMPLATES.md";

/// Prompt templates for the two generation calls of the response gate.
///
/// Loaded from `{data_dir}/prompts/TEMPLATES.md` at startup; missing files
/// or sections fall back to the bundled copy.
#[derive(Debug, Clone)]
pub struct Templates {
    /// Classification prompt (RESPOND / IGNORE / STOP).
    pub should_respond: String,
    /// Reply generation prompt.
    pub message: String,
}

impl Default for Templates {
    fn default() -> Self {
        let sections = parse_markdown_sections(BUNDLED_TEMPLATES);
        Self {
            should_respond: sections
                .get("Should Respond")
                .cloned()
                .unwrap_or_default(),
            message: sections.get("Message").cloned().unwrap_or_default(),
        }
    }
}

impl Templates {
    /// Load templates, overriding the bundled ones section by section.
    pub fn load(data_dir: &str) -> Self {
        let mut templates = Self::default();
        let dir = shellexpand(data_dir);
        let path = format!("{dir}/prompts/{TEMPLATES_FILE}");

        if let Ok(content) = std::fs::read_to_string(&path) {
            let sections = parse_markdown_sections(&content);
            if let Some(v) = sections.get("Should Respond") {
                templates.should_respond = v.clone();
            }
            if let Some(v) = sections.get("Message") {
                templates.message = v.clone();
            }
            tracing::info!("loaded prompt templates from {path}");
        }

        templates
    }
}

/// Deploy the bundled templates to `{data_dir}/prompts/`, creating the directory if needed.
///
/// Never overwrites an existing file so user edits are preserved.
pub fn install_bundled_templates(data_dir: &str) {
    let expanded = shellexpand(data_dir);
    let dir = std::path::Path::new(&expanded).join("prompts");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        warn!("prompts: failed to create {}: {e}", dir.display());
        return;
    }

    let dest = dir.join(TEMPLATES_FILE);
    if !dest.exists() {
        if let Err(e) = std::fs::write(&dest, BUNDLED_TEMPLATES) {
            warn!("prompts: failed to write {}: {e}", dest.display());
        } else {
            tracing::info!("prompts: deployed bundled {TEMPLATES_FILE}");
        }
    }
}

/// Parse a markdown file with `## Section` headers into a map of section name -> body.
///
/// Only level-2 headers split sections, so templates may use `#` headings freely.
fn parse_markdown_sections(content: &str) -> HashMap<String, String> {
    let mut sections = HashMap::new();
    let mut current_key: Option<String> = None;
    let mut current_body = String::new();

    for line in content.lines() {
        if let Some(header) = line.strip_prefix("## ") {
            if let Some(key) = current_key.take() {
                let trimmed = current_body.trim().to_string();
                if !trimmed.is_empty() {
                    sections.insert(key, trimmed);
                }
            }
            current_key = Some(header.trim().to_string());
            current_body.clear();
        } else if current_key.is_some() {
            current_body.push_str(line);
            current_body.push('\n');
        }
    }

    if let Some(key) = current_key {
        let trimmed = current_body.trim().to_string();
        if !trimmed.is_empty() {
            sections.insert(key, trimmed);
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_templates_have_both_sections() {
        let t = Templates::default();
        assert!(t.should_respond.contains("{{priority_authors}}"));
        assert!(t.should_respond.contains("RESPOND"));
        assert!(t.message.contains("{{current_post}}"));
        assert!(t.message.contains("```json"));
        assert!(t.message.contains("{{adjectives}}"));
    }

    #[test]
    fn test_level_one_headings_stay_inside_section() {
        let sections = parse_markdown_sections("## A\n# Title\nbody\n## B\nother\n");
        assert_eq!(sections.get("A").unwrap(), "# Title\nbody");
        assert_eq!(sections.get("B").unwrap(), "other");
    }

    #[test]
    fn test_empty_section_is_skipped() {
        let sections = parse_markdown_sections("## A\n\n## B\nx\n");
        assert!(!sections.contains_key("A"));
        assert!(sections.contains_key("B"));
    }
}
