//! Endpoint-level operations on top of the pipeline.
//!
//! Each method picks a template, builds its substitution context, runs the
//! pipeline and shapes the payload into the endpoint's response type.

use tracing::instrument;

use crate::api::Outcome;
use crate::domain::analysis::{
    AnalysisRequest, CompetitionResearch, CompetitiveAnalysis, CompleteAnalysis, ContextRequest,
    MarketAnalysis, ProductBrief, ProjectAnalysis, PromptAnalysis, TechStack,
};
use crate::pipeline::{
    field_text, ChainResult, Payload, Pipeline, PipelineError, StructuredResult, TemplateId,
};

#[derive(Clone)]
pub struct AnalysisService {
    pipeline: Pipeline,
}

impl AnalysisService {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Structure the raw idea into the five analysis fields.
    #[instrument(skip_all)]
    pub async fn prompt_to_json(
        &self,
        req: &AnalysisRequest,
        request_id: Option<&str>,
    ) -> Result<Outcome<PromptAnalysis>, PipelineError> {
        let result = self
            .pipeline
            .run(TemplateId::ProjectAnalysis, &req.context(), request_id)
            .await?;

        Ok(shape(result, |payload| {
            PromptAnalysis::from(ProjectAnalysis::from_payload(payload))
        }))
    }

    #[instrument(skip_all)]
    pub async fn product_brief(
        &self,
        req: &ContextRequest,
        request_id: Option<&str>,
    ) -> Result<Outcome<ProductBrief>, PipelineError> {
        let result = self
            .pipeline
            .run(TemplateId::ProductBrief, &req.substitution_context(), request_id)
            .await?;

        Ok(shape(result, ProductBrief::from_payload))
    }

    #[instrument(skip_all)]
    pub async fn tech_stack(
        &self,
        req: &ContextRequest,
        request_id: Option<&str>,
    ) -> Result<Outcome<TechStack>, PipelineError> {
        let result = self
            .pipeline
            .run(TemplateId::TechStack, &req.substitution_context(), request_id)
            .await?;

        Ok(shape(result, TechStack::from_payload))
    }

    #[instrument(skip_all)]
    pub async fn market_analysis(
        &self,
        req: &ContextRequest,
        request_id: Option<&str>,
    ) -> Result<Outcome<MarketAnalysis>, PipelineError> {
        let result = self
            .pipeline
            .run(TemplateId::MarketAnalysis, &req.substitution_context(), request_id)
            .await?;

        Ok(shape(result, MarketAnalysis::from_payload))
    }

    #[instrument(skip_all)]
    pub async fn competitive_analysis(
        &self,
        req: &ContextRequest,
        request_id: Option<&str>,
    ) -> Result<Outcome<CompetitiveAnalysis>, PipelineError> {
        let ctx = req.substitution_context();
        let result = self
            .pipeline
            .run(TemplateId::CompetitiveAnalysis, &ctx, request_id)
            .await?;
        let product = ctx.get("product").unwrap_or_default().to_string();

        Ok(shape(result, |payload| {
            CompetitiveAnalysis::from_payload(payload, &product)
        }))
    }

    /// Project analysis followed by a product brief built from it.
    #[instrument(skip_all)]
    pub async fn complete_analysis(
        &self,
        req: &AnalysisRequest,
        request_id: Option<&str>,
    ) -> Result<Outcome<CompleteAnalysis>, PipelineError> {
        let chained = self
            .pipeline
            .chain(
                TemplateId::ProjectAnalysis,
                req.context(),
                TemplateId::ProductBrief,
                request_id,
                |payload, ctx| {
                    ctx.merge_json(payload);
                    ctx.insert(
                        "website_overview",
                        ProjectAnalysis::from_payload(payload).website_overview(),
                    );
                },
            )
            .await?;

        Ok(match chained {
            ChainResult::ShortCircuited(failure) => failure.into(),
            ChainResult::Completed { first, second } => Outcome::Ready(CompleteAnalysis {
                analysis: PromptAnalysis::from(ProjectAnalysis::from_payload(&first)),
                product_brief: shape(second, ProductBrief::from_payload),
            }),
        })
    }

    /// Competitor search followed by a gap analysis against the MVP.
    #[instrument(skip_all)]
    pub async fn competition_research(
        &self,
        req: &AnalysisRequest,
        request_id: Option<&str>,
    ) -> Result<Outcome<CompetitionResearch>, PipelineError> {
        let chained = self
            .pipeline
            .chain(
                TemplateId::CompetitorSearch,
                req.context(),
                TemplateId::CompetitionGapAnalysis,
                request_id,
                |payload, ctx| ctx.insert("competitors", field_text(payload, "competitors")),
            )
            .await?;

        Ok(match chained {
            ChainResult::ShortCircuited(failure) => failure.into(),
            ChainResult::Completed { second, .. } => shape(second, |payload| CompetitionResearch {
                analysis: field_text(payload, "analysis"),
            }),
        })
    }
}

fn shape<T>(result: StructuredResult, build: impl FnOnce(&Payload) -> T) -> Outcome<T> {
    match result {
        StructuredResult::Ok(payload) => Outcome::Ready(build(&payload)),
        StructuredResult::Failed(failure) => failure.into(),
    }
}
