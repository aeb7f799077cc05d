//! Request and response shapes for the analysis endpoints.
//!
//! Response types are filled from a decoded payload with
//! [`field_text`], so a key the model left out reads as "Not available"
//! instead of failing the request.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::Outcome;
use crate::pipeline::{field_text, Payload, SubstitutionContext, NOT_AVAILABLE};

/// Business idea fields entered by the user.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalysisRequest {
    pub domain: String,
    pub problem: String,
    pub website: String,
    pub mvp: String,
}

impl AnalysisRequest {
    pub fn context(&self) -> SubstitutionContext {
        SubstitutionContext::new()
            .with("domain", self.domain.as_str())
            .with("problem", self.problem.as_str())
            .with("website", self.website.as_str())
            .with("mvp", self.mvp.as_str())
    }
}

/// Earlier results forwarded by the client for a follow-up step.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContextRequest {
    pub context: Map<String, Value>,
    pub website_overview: String,
}

impl ContextRequest {
    pub fn substitution_context(&self) -> SubstitutionContext {
        SubstitutionContext::from_json_map(&self.context)
            .with("website_overview", self.website_overview.as_str())
    }
}

// =============================================================================
// Project analysis
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectAnalysis {
    pub industry: String,
    pub product: String,
    pub website: String,
    pub minimum_viable_product: String,
    pub business_impact: String,
}

impl ProjectAnalysis {
    pub fn from_payload(payload: &Payload) -> Self {
        Self {
            industry: field_text(payload, "industry"),
            product: field_text(payload, "product"),
            website: field_text(payload, "website"),
            minimum_viable_product: field_text(payload, "minimum_viable_product"),
            business_impact: field_text(payload, "business_impact"),
        }
    }

    /// One-paragraph summary reused as context by later steps.
    pub fn website_overview(&self) -> String {
        format!(
            "A {} business developing {}. MVP: {}. Impact: {}.",
            or_na(&self.industry),
            or_na(&self.product),
            or_na(&self.minimum_viable_product),
            or_na(&self.business_impact),
        )
    }
}

fn or_na(value: &str) -> &str {
    if value == NOT_AVAILABLE {
        "N/A"
    } else {
        value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptAnalysis {
    pub json_analysis: ProjectAnalysis,
    pub website_overview: String,
}

impl From<ProjectAnalysis> for PromptAnalysis {
    fn from(json_analysis: ProjectAnalysis) -> Self {
        let website_overview = json_analysis.website_overview();
        Self {
            json_analysis,
            website_overview,
        }
    }
}

// =============================================================================
// Follow-up documents
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductBrief {
    pub problem_statement: String,
    pub target_audience: String,
    pub why_it_matters: String,
    pub proposed_solution: String,
    pub success_criteria: String,
    pub risks_and_considerations: String,
    pub next_steps: String,
    pub additional_notes: String,
}

impl ProductBrief {
    pub fn from_payload(payload: &Payload) -> Self {
        Self {
            problem_statement: field_text(payload, "problem_statement"),
            target_audience: field_text(payload, "target_audience"),
            why_it_matters: field_text(payload, "why_it_matters"),
            proposed_solution: field_text(payload, "proposed_solution"),
            success_criteria: field_text(payload, "success_criteria"),
            risks_and_considerations: field_text(payload, "risks_and_considerations"),
            next_steps: field_text(payload, "next_steps"),
            additional_notes: field_text(payload, "additional_notes"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechStack {
    /// Markdown.
    pub technical_details: String,
    pub mermaid_diagram: String,
}

impl TechStack {
    pub fn from_payload(payload: &Payload) -> Self {
        Self {
            technical_details: field_text(payload, "technical_details"),
            mermaid_diagram: strip_mermaid_fence(&field_text(payload, "mermaid_diagram")),
        }
    }
}

/// Models sometimes wrap the diagram in its own ```` ```mermaid ```` fence.
fn strip_mermaid_fence(diagram: &str) -> String {
    let trimmed = diagram.trim();
    trimmed
        .strip_prefix("```mermaid")
        .and_then(|rest| rest.strip_suffix("```"))
        .map(|inner| inner.trim().to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub market_overview: String,
    pub target_market: String,
    pub competitive_landscape: String,
    pub opportunities_and_threats: String,
    pub differentiation: String,
}

impl MarketAnalysis {
    pub fn from_payload(payload: &Payload) -> Self {
        Self {
            market_overview: field_text(payload, "market_overview"),
            target_market: field_text(payload, "target_market"),
            competitive_landscape: field_text(payload, "competitive_landscape"),
            opportunities_and_threats: field_text(payload, "opportunities_and_threats"),
            differentiation: field_text(payload, "differentiation"),
        }
    }
}

// =============================================================================
// Competitors
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Competitor {
    pub name: String,
    pub description: String,
    pub features: Vec<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub market_position: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitiveLandscape {
    pub market_overview: String,
    pub competitors: Vec<Competitor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitiveAnalysis {
    pub competitive_analysis: CompetitiveLandscape,
    pub mermaid_diagram: String,
}

impl CompetitiveAnalysis {
    /// `product` names the analysed product in the overview line.
    pub fn from_payload(payload: &Payload, product: &str) -> Self {
        // Accept both a top-level list and one nested under
        // "competitive_analysis".
        let listed = payload.get("competitors").or_else(|| {
            payload
                .get("competitive_analysis")
                .and_then(|nested| nested.get("competitors"))
        });

        let competitors = match listed {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value::<Competitor>(item.clone()).ok())
                .filter(|c| !c.name.trim().is_empty())
                .collect(),
            _ => Vec::new(),
        };

        let product = if product.trim().is_empty() {
            NOT_AVAILABLE
        } else {
            product.trim()
        };

        Self {
            competitive_analysis: CompetitiveLandscape {
                market_overview: format!("Competitive analysis for {}", product),
                competitors,
            },
            mermaid_diagram: strip_mermaid_fence(&field_text(payload, "mermaid_diagram")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionResearch {
    pub analysis: String,
}

// =============================================================================
// Chained results
// =============================================================================

/// The brief may fail to decode on its own; the analysis is kept either way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompleteAnalysis {
    pub analysis: PromptAnalysis,
    pub product_brief: Outcome<ProductBrief>,
}
