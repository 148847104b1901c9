//! Prompt for generating interface mocks.
//!
//! The conversation is a system prompt describing the output convention, one
//! worked example (user input and assistant output), then the real request.
//! Templates are embedded at compile time and rendered with Handlebars so the
//! fence language tag matches what the parser expects.

use crate::types::ChatMessage;
use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during prompt rendering.
#[derive(Debug, Error)]
pub enum PromptError {
    /// Template rendering failed.
    #[error("prompt rendering failed: {0}")]
    RenderFailed(#[from] handlebars::RenderError),

    /// Template registration failed.
    #[error("prompt registration failed: {0}")]
    RegistrationFailed(#[from] handlebars::TemplateError),
}

const SYSTEM_TEMPLATE: &str = include_str!("../prompts/generate-mock-implementations.md.hbs");
const EXAMPLE_INPUT_TEMPLATE: &str = include_str!("../prompts/single-shot.example-input.md.hbs");
const EXAMPLE_OUTPUT_TEMPLATE: &str = include_str!("../prompts/single-shot.example-output.md.hbs");

const TEMPLATES: [(&str, &str); 3] = [
    ("system", SYSTEM_TEMPLATE),
    ("example-input", EXAMPLE_INPUT_TEMPLATE),
    ("example-output", EXAMPLE_OUTPUT_TEMPLATE),
];

#[derive(Serialize)]
struct PromptContext<'a> {
    language: &'a str,
}

/// Builds the chat messages that ask for mocks of every interface in
/// `interface_source`.
///
/// The final user message is `"<package>\n\n<interface_source>"`.
///
/// # Errors
///
/// Returns [`PromptError`] if an embedded template fails to render.
///
/// # Examples
///
/// ```
/// use llm_tools_openai::{ChatRole, mock_generation_messages};
///
/// let messages = mock_generation_messages("mocks", "type Store interface{}", "go").unwrap();
///
/// assert_eq!(messages.len(), 4);
/// assert_eq!(messages[0].role, ChatRole::System);
/// assert_eq!(messages[3].content, "mocks\n\ntype Store interface{}");
/// ```
pub fn mock_generation_messages(
    package: &str,
    interface_source: &str,
    language: &str,
) -> Result<Vec<ChatMessage>, PromptError> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);
    for (name, template) in TEMPLATES {
        handlebars.register_template_string(name, template)?;
    }

    let context = PromptContext { language };
    let render = |name: &str| handlebars.render(name, &context);

    Ok(vec![
        ChatMessage::system(render("system")?),
        ChatMessage::user(render("example-input")?),
        ChatMessage::assistant(render("example-output")?),
        ChatMessage::user(format!("{package}\n\n{interface_source}")),
    ])
}
