//! Prompt templates
//!
//! Templates are loaded once into a [`PromptTemplates`] value owned by the
//! task executor. A template directory may override either file; anything
//! not overridden falls back to the built-in text.

use std::path::Path;

use crate::error::{PanelError, PanelResult};

/// Placeholder replaced by the persona text
pub const PERSONA_PLACEHOLDER: &str = "{persona_description}";

/// Placeholder replaced by the product description
pub const PRODUCT_PLACEHOLDER: &str = "{product_description}";

/// File name of the persona-wrapping template
pub const AGENT_PERSONA_FILE: &str = "agent_persona.txt";

/// File name of the evaluation template
pub const AGENT_EVALUATION_FILE: &str = "agent_evaluation.txt";

/// Personas containing one of these markers already carry response
/// instructions and are used verbatim as the system prompt
pub const INSTRUCTION_MARKERS: &[&str] = &["INSTRUCTIONS FOR RESPONDING:", "IMPORTANT INSTRUCTIONS:"];

const DEFAULT_AGENT_PERSONA: &str = "\
You are role-playing as a real customer. Stay in character for the whole conversation.

{persona_description}

INSTRUCTIONS FOR RESPONDING:
- Answer in the first person, as this customer would actually speak.
- Be honest: say whether you would buy the product and why.
- Refer to your own tastes, budget and habits where relevant.
- Keep your answer to a few sentences.
";

const DEFAULT_AGENT_EVALUATION: &str = "\
A brand is testing a new product idea with its customers. Here is the description:

{product_description}

What is your honest reaction? Would you buy it?
";

/// The two templates used to build each request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    agent_persona: String,
    evaluation: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            agent_persona: DEFAULT_AGENT_PERSONA.to_string(),
            evaluation: DEFAULT_AGENT_EVALUATION.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Build from explicit template text, checking both placeholders exist
    pub fn new(
        agent_persona: impl Into<String>,
        evaluation: impl Into<String>,
    ) -> PanelResult<Self> {
        let agent_persona = agent_persona.into();
        let evaluation = evaluation.into();

        if !agent_persona.contains(PERSONA_PLACEHOLDER) {
            return Err(PanelError::Template(format!(
                "persona template lacks {PERSONA_PLACEHOLDER}"
            )));
        }
        if !evaluation.contains(PRODUCT_PLACEHOLDER) {
            return Err(PanelError::Template(format!(
                "evaluation template lacks {PRODUCT_PLACEHOLDER}"
            )));
        }

        Ok(Self {
            agent_persona,
            evaluation,
        })
    }

    /// Load templates from `dir`; a file that does not exist keeps its
    /// built-in default
    pub fn load_dir(dir: &Path) -> PanelResult<Self> {
        let defaults = Self::default();
        let agent_persona = read_or(dir, AGENT_PERSONA_FILE, defaults.agent_persona)?;
        let evaluation = read_or(dir, AGENT_EVALUATION_FILE, defaults.evaluation)?;

        tracing::debug!(dir = %dir.display(), "Loaded prompt templates");
        Self::new(agent_persona, evaluation)
    }

    /// System prompt for a persona
    pub fn format_agent_prompt(&self, persona: &str) -> String {
        if INSTRUCTION_MARKERS.iter().any(|m| persona.contains(m)) {
            return persona.to_string();
        }
        self.agent_persona.replace(PERSONA_PLACEHOLDER, persona)
    }

    /// User message for a product description
    pub fn format_evaluation_prompt(&self, product: &str) -> String {
        self.evaluation.replace(PRODUCT_PLACEHOLDER, product)
    }
}

fn read_or(dir: &Path, name: &str, default: String) -> PanelResult<String> {
    let path = dir.join(name);
    match std::fs::read_to_string(&path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(default),
        Err(e) => Err(PanelError::Template(format!("{}: {e}", path.display()))),
    }
}
