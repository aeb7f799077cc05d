//! Built-in prompt templates.
//!
//! Each endpoint variant is a row in this table rather than its own code
//! path: model names, token budgets and temperatures live here.

use std::collections::HashMap;

use super::template::{GenerationParams, PromptTemplate, TemplateError, TemplateId};

pub const DEFAULT_MODEL: &str = "gpt-4";

const PROJECT_ANALYSIS: &str = r#"
Analyze this business project and summarize it for a product team.

- Domain: {{domain}}
- Problem: {{problem}}
- Website: {{website}}
- MVP: {{mvp}}
"#;

const PRODUCT_BRIEF: &str = r#"
Write a concise product brief for the project described below.

Industry: {{industry}}
Product: {{product}}
Website: {{website}}
MVP: {{minimum_viable_product}}
Impact: {{business_impact}}

Additional context: {{website_overview}}

Keep every section short and focused on what a delivery team needs to know.
"#;

const TECH_STACK: &str = r#"
Using the product brief below, describe a technical implementation plan.

Industry: {{industry}}
Product: {{product}}
MVP: {{minimum_viable_product}}
Proposed solution: {{proposed_solution}}
Additional context: {{website_overview}}

Cover, with markdown headings and bullet points:
- Frontend technologies
- Backend technologies
- Cloud infrastructure
- AI/ML components
- Database choice and justification
- APIs and integration between components
- Security measures

Also draw the system architecture as a Mermaid diagram. The diagram must use
'graph LR' so it reads left to right.
"#;

const MARKET_ANALYSIS: &str = r#"
Using the product brief below, produce a market and competitor analysis.

Industry: {{industry}}
Product: {{product}}
MVP: {{minimum_viable_product}}
Proposed solution: {{proposed_solution}}
Additional context: {{website_overview}}

Address market size, trends and growth; the target segments and
demographics; the key competitors with their strengths and weaknesses;
market gaps and threats; and how this product differentiates itself.
"#;

const COMPETITIVE_ANALYSIS: &str = r#"
Using the product brief below, analyze the three or four most relevant
competitors.

Industry: {{industry}}
Product: {{product}}
MVP features: {{minimum_viable_product}}
Proposed solution: {{proposed_solution}}

For each competitor give its name, a short description, its main features,
its strengths, its weaknesses and its market positioning. Add a Mermaid
'graph LR' diagram comparing this product with the competitors.
"#;

const COMPETITOR_SEARCH: &str = r#"
List the companies and products that already address the problem below.
Prefer well-known, currently active offerings.

Domain: {{domain}}
Problem: {{problem}}
Website: {{website}}
MVP: {{mvp}}
"#;

const COMPETITION_GAP_ANALYSIS: &str = r#"
A founder wants to build the following product.

Domain: {{domain}}
Problem: {{problem}}
MVP: {{mvp}}

These competitors were identified:
{{competitors}}

Compare the MVP with each competitor. Point out the gaps the competitors
leave open, where the MVP overlaps with them, and what the founder should
focus on to stand out. Write the analysis as markdown.
"#;

/// Lookup table of prompt templates keyed by id.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: HashMap<TemplateId, PromptTemplate>,
}

impl TemplateRegistry {
    /// Registry of the built-in templates, optionally forcing one model for all.
    pub fn builtin(model_override: Option<&str>) -> Result<Self, TemplateError> {
        let model = model_override.unwrap_or(DEFAULT_MODEL);

        let templates = vec![
            PromptTemplate {
                id: TemplateId::ProjectAnalysis,
                system_prompt: None,
                body: PROJECT_ANALYSIS,
                required: &["domain", "problem", "mvp"],
                optional: &["website"],
                output_schema: &[
                    ("industry", "industry category"),
                    ("product", "product type"),
                    ("website", "website URL"),
                    ("minimum_viable_product", "MVP description"),
                    ("business_impact", "expected impact"),
                ],
                generation: GenerationParams::new(model, 4000, 0.7)?,
            },
            PromptTemplate {
                id: TemplateId::ProductBrief,
                system_prompt: None,
                body: PRODUCT_BRIEF,
                required: &[],
                optional: &[
                    "industry",
                    "product",
                    "website",
                    "minimum_viable_product",
                    "business_impact",
                    "website_overview",
                ],
                output_schema: &[
                    ("problem_statement", "Brief description of the problem and its impact"),
                    ("target_audience", "Core user base"),
                    ("why_it_matters", "Key importance and alignment"),
                    ("proposed_solution", "Core solution and features"),
                    ("success_criteria", "Key success metrics"),
                    ("risks_and_considerations", "Main challenges"),
                    ("next_steps", "Immediate actions"),
                    ("additional_notes", "Key information for teams"),
                ],
                generation: GenerationParams::new(model, 2000, 0.7)?,
            },
            PromptTemplate {
                id: TemplateId::TechStack,
                system_prompt: None,
                body: TECH_STACK,
                required: &[],
                optional: &[
                    "industry",
                    "product",
                    "minimum_viable_product",
                    "proposed_solution",
                    "website_overview",
                ],
                output_schema: &[
                    ("technical_details", "Detailed explanation in markdown format"),
                    ("mermaid_diagram", "Mermaid 'graph LR' system diagram"),
                ],
                generation: GenerationParams::new(model, 2500, 0.5)?,
            },
            PromptTemplate {
                id: TemplateId::MarketAnalysis,
                system_prompt: None,
                body: MARKET_ANALYSIS,
                required: &[],
                optional: &[
                    "industry",
                    "product",
                    "minimum_viable_product",
                    "proposed_solution",
                    "website_overview",
                ],
                output_schema: &[
                    ("market_overview", "Size, trends, and growth potential"),
                    ("target_market", "Specific segments and demographics"),
                    ("competitive_landscape", "Key competitors, strengths and weaknesses"),
                    ("opportunities_and_threats", "Market gaps and potential challenges"),
                    ("differentiation", "How this product stands out"),
                ],
                generation: GenerationParams::new(model, 4000, 0.7)?,
            },
            PromptTemplate {
                id: TemplateId::CompetitiveAnalysis,
                system_prompt: Some(
                    "You are a market research expert conducting competitive analysis.",
                ),
                body: COMPETITIVE_ANALYSIS,
                required: &[],
                optional: &[
                    "industry",
                    "product",
                    "minimum_viable_product",
                    "proposed_solution",
                ],
                output_schema: &[
                    (
                        "competitors",
                        "Array of objects with name, description, features, strengths, weaknesses, market_position",
                    ),
                    ("mermaid_diagram", "Mermaid 'graph LR' comparison diagram"),
                ],
                generation: GenerationParams::new(model, 2000, 0.7)?,
            },
            PromptTemplate {
                id: TemplateId::CompetitorSearch,
                system_prompt: Some("You are a market researcher who knows the current software landscape."),
                body: COMPETITOR_SEARCH,
                required: &["domain", "problem", "mvp"],
                optional: &["website"],
                output_schema: &[(
                    "competitors",
                    "Markdown list of competitors, one line each with name and a short description",
                )],
                generation: GenerationParams::new(model, 2000, 0.3)?,
            },
            PromptTemplate {
                id: TemplateId::CompetitionGapAnalysis,
                system_prompt: Some("You are a startup advisor reviewing a product idea."),
                body: COMPETITION_GAP_ANALYSIS,
                required: &["domain", "problem", "mvp", "competitors"],
                optional: &[],
                output_schema: &[("analysis", "Gap analysis in markdown format")],
                generation: GenerationParams::new(model, 3000, 0.7)?,
            },
        ];

        Ok(Self {
            templates: templates.into_iter().map(|t| (t.id, t)).collect(),
        })
    }

    pub fn get(&self, id: TemplateId) -> Result<&PromptTemplate, TemplateError> {
        self.templates
            .get(&id)
            .ok_or(TemplateError::UnknownTemplate(id))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
