/*!
 * Prompt templates for batch translation.
 *
 * The system prompt is the same for every batch. The user prompt names the
 * direction, the separator and carries the delimited payload after a blank
 * line, optionally followed by an operator-supplied suffix.
 */

use crate::translation::codec::SEPARATOR;

/// System prompt template for batch translation.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// The default system prompt for spreadsheet translation.
    pub const SPREADSHEET_TRANSLATOR: &'static str = r#"You are a professional IT translator specializing in software development, programming, and technical documentation. Follow these rules strictly:

1. Output ONLY the translation, nothing else
2. DO NOT include the original text in your response
3. DO NOT add any explanations or notes
4. Keep IDs, model numbers, and special characters unchanged
5. Use standard terminology for technical terms in IT and software development
6. Preserve the original formatting (spaces, line breaks)
7. Use proper grammar and punctuation
8. Only keep unchanged: proper names, IDs, and technical codes
9. Translate all segments separated by "{separator}" and keep them separated with the same delimiter, in the same order and the same count

For IT-specific terminology:
- Maintain consistency in technical terms
- Keep programming language keywords, function names, and variable names unchanged
- Use industry-standard translations for common IT concepts
- Preserve acronyms like API, UI, UX, SQL, HTML, CSS, etc.
- Keep file extensions and paths unchanged"#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Create the default spreadsheet translator template.
    pub fn spreadsheet_translator() -> Self {
        Self::new(Self::SPREADSHEET_TRANSLATOR)
    }

    /// Render the template.
    pub fn render(&self) -> String {
        self.template.replace("{separator}", SEPARATOR)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::spreadsheet_translator()
    }
}

/// Builder for the prompt pair of one batch.
#[derive(Debug, Clone)]
pub struct TranslationPromptBuilder {
    source_language: String,
    target_language: String,
    payload: String,
    suffix: Option<String>,
}

impl TranslationPromptBuilder {
    /// Create a new prompt builder from language display names.
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            payload: String::new(),
            suffix: None,
        }
    }

    /// Set the delimited payload.
    pub fn with_payload(mut self, payload: &str) -> Self {
        self.payload = payload.to_string();
        self
    }

    /// Append a literal suffix on its own line after the payload.
    pub fn with_suffix(mut self, suffix: Option<&str>) -> Self {
        self.suffix = suffix.filter(|s| !s.is_empty()).map(str::to_string);
        self
    }

    /// Build the system prompt.
    pub fn build_system_prompt(&self) -> String {
        PromptTemplate::spreadsheet_translator().render()
    }

    /// Build the user prompt.
    pub fn build_user_prompt(&self) -> String {
        let mut prompt = format!(
            "Translate the following text from {} to {}, keeping segments separated by '{}':\n\n{}",
            self.source_language, self.target_language, SEPARATOR, self.payload
        );
        if let Some(suffix) = &self.suffix {
            prompt.push('\n');
            prompt.push_str(suffix);
        }
        prompt
    }

    /// Build both system and user prompts.
    pub fn build(&self) -> (String, String) {
        (self.build_system_prompt(), self.build_user_prompt())
    }
}
