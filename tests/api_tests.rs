use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use projectbrief_backend::config::Settings;
use projectbrief_backend::pipeline::{Pipeline, TemplateId, TemplateRegistry};
use projectbrief_backend::services::{
    AnalysisService, CompletionError, CompletionRequest, CompletionService,
};
use projectbrief_backend::{create_app, AppState};

/// Completion double: replays canned replies in order and records requests.
#[derive(Default)]
struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, CompletionError>>>,
    seen: Mutex<Vec<CompletionRequest>>,
    healthy: bool,
}

impl ScriptedCompletion {
    fn new(replies: Vec<Result<String, CompletionError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
            healthy: true,
        })
    }

    fn templates_called(&self) -> Vec<TemplateId> {
        self.seen.lock().unwrap().iter().map(|r| r.template).collect()
    }

    fn request_ids(&self) -> Vec<Option<String>> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.request_id.clone())
            .collect()
    }

    fn prompt(&self, index: usize) -> String {
        self.seen.lock().unwrap()[index].prompt.clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.seen.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected completion call")
    }

    async fn health_check(&self) -> Result<(), CompletionError> {
        if self.healthy {
            Ok(())
        } else {
            Err(CompletionError::Unavailable("down".to_string()))
        }
    }
}

fn test_app(completion: Arc<ScriptedCompletion>) -> Router {
    let settings =
        Settings::from_lookup(|key| (key == "API_KEY").then(|| "sk-test".to_string()))
            .expect("settings");
    let pipeline = Pipeline::new(
        completion,
        TemplateRegistry::builtin(None).expect("registry"),
        settings.llm_decode_retries,
    );
    create_app(AppState::new(settings, AnalysisService::new(pipeline)))
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn idea() -> Value {
    json!({
        "domain": "Logistics",
        "problem": "Small couriers plan routes by hand",
        "website": "https://routebot.example",
        "mvp": "Route planner for five vans"
    })
}

fn analysis_reply() -> String {
    json!({
        "industry": "Logistics",
        "product": "route planning SaaS",
        "website": "https://routebot.example",
        "minimum_viable_product": "Route planner for five vans",
        "business_impact": "Fewer miles driven"
    })
    .to_string()
}

fn brief_reply() -> String {
    json!({
        "problem_statement": "Manual planning wastes hours",
        "target_audience": "Small couriers",
        "why_it_matters": "Fuel costs",
        "proposed_solution": "Automatic routing",
        "success_criteria": "20% fewer miles",
        "risks_and_considerations": "Map data quality",
        "next_steps": ["Interview couriers", "Build prototype"],
        "additional_notes": "None"
    })
    .to_string()
}

mod prompt_to_json {
    use super::*;

    #[tokio::test]
    async fn test_returns_analysis_and_overview() {
        let completion = ScriptedCompletion::new(vec![Ok(analysis_reply())]);
        let (status, body) = post(test_app(completion.clone()), "/prompt_to_json", idea()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["json_analysis"]["industry"], "Logistics");
        assert_eq!(
            body["website_overview"],
            "A Logistics business developing route planning SaaS. MVP: Route planner for five vans. Impact: Fewer miles driven."
        );
        assert_eq!(completion.templates_called(), vec![TemplateId::ProjectAnalysis]);
    }

    #[tokio::test]
    async fn test_partial_reply_still_has_all_five_keys() {
        let completion = ScriptedCompletion::new(vec![Ok(
            "```json\n{\"industry\": \"Logistics\"}\n```".to_string()
        )]);
        let (status, body) = post(test_app(completion), "/prompt_to_json", idea()).await;

        assert_eq!(status, StatusCode::OK);
        let analysis = body["json_analysis"].as_object().unwrap();
        for key in [
            "industry",
            "product",
            "website",
            "minimum_viable_product",
            "business_impact",
        ] {
            assert!(analysis.contains_key(key), "missing {}", key);
        }
        assert_eq!(analysis["product"], "Not available");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_malformed_reply_is_soft_error() {
        let completion = ScriptedCompletion::new(vec![Ok("not json at all".to_string())]);
        let (status, body) = post(test_app(completion), "/prompt_to_json", idea()).await;

        assert_eq!(status, StatusCode::OK);
        let obj = body.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(obj["error"]
            .as_str()
            .unwrap()
            .starts_with("invalid JSON from completion service"));
        assert_eq!(obj["raw_response"], "not json at all");
    }

    #[tokio::test]
    async fn test_empty_problem_is_sent_as_not_provided() {
        let completion = ScriptedCompletion::new(vec![Ok(analysis_reply())]);
        let mut request = idea();
        request["problem"] = json!("");
        request.as_object_mut().unwrap().remove("website");

        let (status, _) = post(test_app(completion.clone()), "/prompt_to_json", request).await;

        assert_eq!(status, StatusCode::OK);
        let prompt = completion.prompt(0);
        assert!(prompt.contains("- Problem: N/A"));
        assert!(prompt.contains("- Website: N/A"));
    }

    #[tokio::test]
    async fn test_unavailable_service_is_500_with_detail() {
        let completion = ScriptedCompletion::new(vec![Err(CompletionError::Unavailable(
            "connection refused".to_string(),
        ))]);
        let (status, body) = post(test_app(completion), "/prompt_to_json", idea()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
        assert_eq!(
            body["detail"],
            "completion service unavailable: connection refused"
        );
    }

    #[tokio::test]
    async fn test_empty_response_is_500() {
        let completion = ScriptedCompletion::new(vec![Err(CompletionError::EmptyResponse)]);
        let (status, body) = post(test_app(completion), "/prompt_to_json", idea()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "EMPTY_RESPONSE");
    }
}

mod chains {
    use super::*;

    #[tokio::test]
    async fn test_complete_analysis_returns_both_documents() {
        let completion = ScriptedCompletion::new(vec![Ok(analysis_reply()), Ok(brief_reply())]);
        let (status, body) = post(test_app(completion.clone()), "/complete_analysis", idea()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"]["json_analysis"]["product"], "route planning SaaS");
        assert_eq!(body["product_brief"]["target_audience"], "Small couriers");
        assert_eq!(
            body["product_brief"]["next_steps"],
            "- Interview couriers\n- Build prototype"
        );

        assert_eq!(
            completion.templates_called(),
            vec![TemplateId::ProjectAnalysis, TemplateId::ProductBrief]
        );
        let brief_prompt = completion.prompt(1);
        assert!(brief_prompt.contains("Product: route planning SaaS"));
        assert!(brief_prompt.contains("Additional context: A Logistics business"));
    }

    #[tokio::test]
    async fn test_request_id_is_forwarded_to_every_step() {
        let completion = ScriptedCompletion::new(vec![Ok(analysis_reply()), Ok(brief_reply())]);
        let response = test_app(completion.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/complete_analysis")
                    .header("content-type", "application/json")
                    .header("x-request-id", "req-chain-1")
                    .body(Body::from(idea().to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            completion.request_ids(),
            vec![Some("req-chain-1".to_string()), Some("req-chain-1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_complete_analysis_short_circuits_on_bad_first_step() {
        let completion = ScriptedCompletion::new(vec![Ok("I cannot help with that".to_string())]);
        let (status, body) = post(test_app(completion.clone()), "/complete_analysis", idea()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["raw_response"], "I cannot help with that");
        assert!(body.get("product_brief").is_none());
        assert_eq!(completion.templates_called(), vec![TemplateId::ProjectAnalysis]);
    }

    #[tokio::test]
    async fn test_complete_analysis_keeps_analysis_when_brief_fails() {
        let completion =
            ScriptedCompletion::new(vec![Ok(analysis_reply()), Ok("brief: tbd".to_string())]);
        let (status, body) = post(test_app(completion), "/complete_analysis", idea()).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.get("error").is_none());
        assert_eq!(body["analysis"]["json_analysis"]["industry"], "Logistics");
        assert!(body["analysis"]["website_overview"]
            .as_str()
            .unwrap()
            .starts_with("A Logistics business"));

        let brief = &body["product_brief"];
        assert_eq!(brief["raw_response"], "brief: tbd");
        assert!(brief["error"]
            .as_str()
            .unwrap()
            .starts_with("invalid JSON from completion service"));
    }

    #[tokio::test]
    async fn test_competition_research_runs_search_then_gap_analysis() {
        let completion = ScriptedCompletion::new(vec![
            Ok(json!({"competitors": ["Onfleet: delivery management", "Routific: route optimisation"]})
                .to_string()),
            Ok(json!({"analysis": "## Gaps\nNo one targets five-van fleets."}).to_string()),
        ]);
        let (status, body) =
            post(test_app(completion.clone()), "/competition_research", idea()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"analysis": "## Gaps\nNo one targets five-van fleets."}));
        assert_eq!(
            completion.templates_called(),
            vec![
                TemplateId::CompetitorSearch,
                TemplateId::CompetitionGapAnalysis
            ]
        );
        assert!(completion.prompt(1).contains("- Routific: route optimisation"));
    }

    #[tokio::test]
    async fn test_competition_research_short_circuits() {
        let completion = ScriptedCompletion::new(vec![Ok("Onfleet, Routific".to_string())]);
        let (status, body) = post(test_app(completion.clone()), "/competition_research", idea()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["raw_response"], "Onfleet, Routific");
        assert_eq!(completion.templates_called(), vec![TemplateId::CompetitorSearch]);
    }
}

mod follow_ups {
    use super::*;

    fn brief_context() -> Value {
        json!({
            "context": {
                "industry": "Logistics",
                "product": "RouteBot",
                "proposed_solution": "Automatic routing"
            },
            "website_overview": "A Logistics business developing RouteBot."
        })
    }

    #[tokio::test]
    async fn test_product_brief_from_context() {
        let completion = ScriptedCompletion::new(vec![Ok(brief_reply())]);
        let (status, body) =
            post(test_app(completion.clone()), "/generate_product_brief", brief_context()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_object().unwrap().len(), 8);
        assert_eq!(body["problem_statement"], "Manual planning wastes hours");

        let prompt = completion.prompt(0);
        assert!(prompt.contains("Industry: Logistics"));
        assert!(prompt.contains("Impact: N/A"));
    }

    #[tokio::test]
    async fn test_tech_stack_extracts_fenced_json() {
        let reply = "Sure! Here is the plan:\n```json\n{\"technical_details\": \"## Backend\\n- Rust\", \"mermaid_diagram\": \"graph LR\\n  UI-->API\"}\n```";
        let completion = ScriptedCompletion::new(vec![Ok(reply.to_string())]);
        let (status, body) =
            post(test_app(completion.clone()), "/generate_tech_stack", brief_context()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["technical_details"], "## Backend\n- Rust");
        assert_eq!(body["mermaid_diagram"], "graph LR\n  UI-->API");

        let seen = completion.seen.lock().unwrap();
        assert_eq!(seen[0].max_tokens, 2500);
        assert_eq!(seen[0].temperature, 0.5);
    }

    #[tokio::test]
    async fn test_market_analysis_defaults_missing_sections() {
        let completion = ScriptedCompletion::new(vec![Ok(
            json!({"market_overview": "Growing 8% a year"}).to_string()
        )]);
        let (status, body) =
            post(test_app(completion), "/generate_market_analysis", brief_context()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["market_overview"], "Growing 8% a year");
        assert_eq!(body["differentiation"], "Not available");
    }

    #[tokio::test]
    async fn test_analyze_competition_shapes_competitors() {
        let completion = ScriptedCompletion::new(vec![Ok(json!({
            "competitive_analysis": {
                "competitors": [{
                    "name": "Onfleet",
                    "description": "Delivery management",
                    "features": ["dispatch"],
                    "strengths": ["mature"],
                    "weaknesses": ["price"],
                    "market_position": "Mid-market leader"
                }]
            },
            "mermaid_diagram": "graph LR\n  A[RouteBot] --> B[Market]"
        })
        .to_string())]);
        let (status, body) =
            post(test_app(completion.clone()), "/analyze_competition", brief_context()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["competitive_analysis"]["market_overview"],
            "Competitive analysis for RouteBot"
        );
        assert_eq!(body["competitive_analysis"]["competitors"][0]["name"], "Onfleet");
        assert_eq!(
            completion.seen.lock().unwrap()[0].system_prompt.as_deref(),
            Some("You are a market research expert conducting competitive analysis.")
        );
    }
}

mod health {
    use super::*;

    #[tokio::test]
    async fn test_health_reports_completion_service() {
        let app = test_app(ScriptedCompletion::new(vec![]));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "req-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-request-id"], "req-123");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["services"]["completion_service"], "ok");
    }

    #[tokio::test]
    async fn test_health_degraded_when_service_down() {
        let completion = Arc::new(ScriptedCompletion {
            healthy: false,
            ..Default::default()
        });
        let response = test_app(completion)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "degraded");
    }
}
