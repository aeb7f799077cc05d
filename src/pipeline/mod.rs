//! Prompt-to-structured-result pipeline.
//!
//! One invocation renders a template, issues one completion call and decodes
//! the reply:
//!
//! ```text
//! Rendering -> Invoking -> Parsed(Ok | Failed)
//! ```
//!
//! Render and transport problems are errors. A reply that is not a JSON
//! object is not: it comes back as [`StructuredResult::Failed`] with the raw
//! text so callers can show it.

pub mod context;
pub mod extract;
pub mod registry;
pub mod result;
pub mod template;

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

pub use context::SubstitutionContext;
pub use extract::{extract_json_candidate, parse_reply};
pub use registry::TemplateRegistry;
pub use result::{field_text, DecodeFailure, Payload, StructuredResult, NOT_AVAILABLE};
pub use template::{GenerationParams, PromptTemplate, TemplateError, TemplateId};

use crate::services::completion::{CompletionError, CompletionService};

/// Upper bound on extra attempts after an undecodable reply.
pub const MAX_DECODE_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

/// Result of a two-step chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainResult {
    /// Step one could not be decoded; step two never ran.
    ShortCircuited(DecodeFailure),
    Completed {
        first: Payload,
        second: StructuredResult,
    },
}

#[derive(Clone)]
pub struct Pipeline {
    completion: Arc<dyn CompletionService>,
    templates: Arc<TemplateRegistry>,
    decode_retries: u32,
}

impl Pipeline {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        templates: TemplateRegistry,
        decode_retries: u32,
    ) -> Self {
        Self {
            completion,
            templates: Arc::new(templates),
            decode_retries: decode_retries.min(MAX_DECODE_RETRIES),
        }
    }

    pub async fn health_check(&self) -> Result<(), CompletionError> {
        self.completion.health_check().await
    }

    /// Render `id` with `ctx`, call the model and decode the reply.
    #[instrument(skip(self, ctx), fields(template = %id))]
    pub async fn run(
        &self,
        id: TemplateId,
        ctx: &SubstitutionContext,
        request_id: Option<&str>,
    ) -> Result<StructuredResult, PipelineError> {
        let mut request = self.templates.get(id)?.request(ctx)?;
        request.request_id = request_id.map(str::to_string);

        let mut attempt = 0;
        loop {
            let reply = self.completion.complete(&request).await?;

            let failure = match parse_reply(&reply) {
                StructuredResult::Ok(payload) => {
                    debug!(keys = payload.len(), "Decoded completion reply");
                    return Ok(StructuredResult::Ok(payload));
                }
                StructuredResult::Failed(failure) => failure,
            };

            if attempt < self.decode_retries {
                attempt += 1;
                warn!(
                    reason = %failure.reason,
                    attempt,
                    max = self.decode_retries,
                    "Undecodable reply, re-prompting"
                );
                continue;
            }

            warn!(
                reason = %failure.reason,
                reply_len = failure.raw_text.len(),
                "Completion reply is not a JSON object"
            );
            return Ok(StructuredResult::Failed(failure));
        }
    }

    /// Run `first`, let `carry` fold its payload into the context, then run
    /// `second`. Stops after `first` if its reply could not be decoded.
    pub async fn chain<F>(
        &self,
        first: TemplateId,
        mut ctx: SubstitutionContext,
        second: TemplateId,
        request_id: Option<&str>,
        carry: F,
    ) -> Result<ChainResult, PipelineError>
    where
        F: FnOnce(&Payload, &mut SubstitutionContext),
    {
        let payload = match self.run(first, &ctx, request_id).await?.into_payload() {
            Ok(payload) => payload,
            Err(failure) => {
                info!(first = %first, second = %second, "Chain stopped after first step");
                return Ok(ChainResult::ShortCircuited(failure));
            }
        };

        carry(&payload, &mut ctx);
        let second = self.run(second, &ctx, request_id).await?;

        Ok(ChainResult::Completed {
            first: payload,
            second,
        })
    }
}
