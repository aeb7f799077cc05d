//! Prompt templates and rendering.
//!
//! Placeholders use the `{{field}}` syntax. Every placeholder in a body must
//! be declared as a required or optional field of its template.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

use super::context::SubstitutionContext;
use crate::services::completion::CompletionRequest;

/// Text substituted for blank or absent optional fields.
pub const NOT_PROVIDED: &str = "N/A";

static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("placeholder pattern is valid")
    })
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TemplateError {
    #[error("unknown template: {0}")]
    UnknownTemplate(TemplateId),

    #[error("template {template} is missing required field '{field}'")]
    MissingField { template: TemplateId, field: String },

    #[error("template {template} references undeclared placeholder '{placeholder}'")]
    UndeclaredPlaceholder {
        template: TemplateId,
        placeholder: String,
    },

    #[error("invalid generation parameters: {0}")]
    InvalidGeneration(String),
}

/// Identifier of a built-in template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
    ProjectAnalysis,
    ProductBrief,
    TechStack,
    MarketAnalysis,
    CompetitiveAnalysis,
    CompetitorSearch,
    CompetitionGapAnalysis,
}

impl TemplateId {
    pub const ALL: [TemplateId; 7] = [
        Self::ProjectAnalysis,
        Self::ProductBrief,
        Self::TechStack,
        Self::MarketAnalysis,
        Self::CompetitiveAnalysis,
        Self::CompetitorSearch,
        Self::CompetitionGapAnalysis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectAnalysis => "project_analysis",
            Self::ProductBrief => "product_brief",
            Self::TechStack => "tech_stack",
            Self::MarketAnalysis => "market_analysis",
            Self::CompetitiveAnalysis => "competitive_analysis",
            Self::CompetitorSearch => "competitor_search",
            Self::CompetitionGapAnalysis => "competition_gap_analysis",
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model selection and sampling settings for one template.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerationParams {
    /// Validates `temperature` in `[0, 2]` and `max_tokens > 0`.
    pub fn new(
        model: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<Self, TemplateError> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(TemplateError::InvalidGeneration(
                "model must not be empty".to_string(),
            ));
        }
        if max_tokens == 0 {
            return Err(TemplateError::InvalidGeneration(
                "max_tokens must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&temperature) {
            return Err(TemplateError::InvalidGeneration(format!(
                "temperature {} is outside [0, 2]",
                temperature
            )));
        }

        Ok(Self {
            model,
            max_tokens,
            temperature,
        })
    }
}

/// A named, parameterized prompt with its declared output schema.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub id: TemplateId,
    pub system_prompt: Option<&'static str>,
    pub body: &'static str,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    /// Ordered `field -> description of expected content`.
    pub output_schema: &'static [(&'static str, &'static str)],
    pub generation: GenerationParams,
}

impl PromptTemplate {
    fn is_declared(&self, field: &str) -> bool {
        self.required.contains(&field) || self.optional.contains(&field)
    }

    /// Substitute every placeholder and append the output schema.
    pub fn render(&self, ctx: &SubstitutionContext) -> Result<String, TemplateError> {
        let re = placeholder_regex();

        for caps in re.captures_iter(self.body) {
            let field = &caps[1];
            if !self.is_declared(field) {
                return Err(TemplateError::UndeclaredPlaceholder {
                    template: self.id,
                    placeholder: field.to_string(),
                });
            }
        }

        for field in self.required {
            if ctx.get(field).is_none() {
                return Err(TemplateError::MissingField {
                    template: self.id,
                    field: (*field).to_string(),
                });
            }
        }

        let rendered = re.replace_all(self.body, |caps: &regex::Captures<'_>| {
            match ctx.get(&caps[1]).map(str::trim) {
                Some(value) if !value.is_empty() => value.to_string(),
                _ => NOT_PROVIDED.to_string(),
            }
        });

        let mut prompt = rendered.trim().to_string();
        if !self.output_schema.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(&self.schema_block());
        }
        Ok(prompt)
    }

    /// Render and package as an outbound completion request.
    pub fn request(&self, ctx: &SubstitutionContext) -> Result<CompletionRequest, TemplateError> {
        Ok(CompletionRequest {
            template: self.id,
            system_prompt: self.system_prompt.map(str::to_string),
            prompt: self.render(ctx)?,
            model: self.generation.model.clone(),
            max_tokens: self.generation.max_tokens,
            temperature: self.generation.temperature,
            request_id: None,
        })
    }

    fn schema_block(&self) -> String {
        let fields: Vec<String> = self
            .output_schema
            .iter()
            .map(|(field, description)| {
                format!(
                    "    {}: {}",
                    Value::from(*field),
                    Value::from(*description)
                )
            })
            .collect();

        format!(
            "Return only a valid JSON object with these keys and nothing else:\n{{\n{}\n}}",
            fields.join(",\n")
        )
    }
}
