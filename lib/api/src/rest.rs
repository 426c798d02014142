use crate::context::ServiceContext;
use crate::error::ApiError;
use crate::models::{ReadinessResponse, StructuredRecommendRequest, TextRecommendRequest};
use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use std::sync::Arc;

type Context = web::Data<Arc<ServiceContext>>;

pub struct RestApi;

impl RestApi {
    pub async fn start(context: Arc<ServiceContext>, host: &str, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(context.clone()))
                .configure(routes)
        })
        .bind((host, port))?
        .run()
        .await
    }
}

/// Register every endpoint; the app must provide `web::Data<Arc<ServiceContext>>`
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::BadRequest(format!("Invalid request body: {}", err)).into()
    }))
    .route("/healthz", web::get().to(healthz))
    .route("/readyz", web::get().to(readyz))
    .route("/recommend", web::post().to(recommend))
    .route("/recommend/structured", web::post().to(recommend_structured));
}

async fn healthz() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

async fn readyz(context: Context) -> HttpResponse {
    let readiness = context.readiness();
    let body = ReadinessResponse {
        ready: context.is_ready(),
        status: readiness.as_str().to_string(),
        reason: match readiness {
            crate::context::Readiness::Failed(reason) => Some(reason),
            _ => None,
        },
    };

    if body.ready {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

async fn recommend(
    context: Context,
    req: web::Json<TextRecommendRequest>,
) -> Result<HttpResponse, ApiError> {
    let engine = context.engine()?;
    let response = engine
        .recommend_text(&req, &context.cancellation_token())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn recommend_structured(
    context: Context,
    req: web::Json<StructuredRecommendRequest>,
) -> Result<HttpResponse, ApiError> {
    let engine = context.engine()?;
    let response = engine
        .recommend_structured(&req, &context.cancellation_token())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::test_engine;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tailor_generation::{ExplanationGenerator, GenerationBackend, GenerationConfig};

    struct EchoBackend;

    #[async_trait]
    impl GenerationBackend for EchoBackend {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, _prompt: &str) -> tailor_generation::error::Result<String> {
            Ok("Recommendation: Wear the red dress, image: 1.jpg".to_string())
        }
    }

    fn app_context(context: ServiceContext) -> web::Data<Arc<ServiceContext>> {
        web::Data::new(Arc::new(context))
    }

    #[actix_web::test]
    async fn test_healthz_and_readyz_while_loading() {
        let app = test::init_service(
            App::new()
                .app_data(app_context(ServiceContext::new()))
                .configure(routes),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/healthz").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/readyz").to_request()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: ReadinessResponse = test::read_body_json(resp).await;
        assert_eq!(body.status, "loading");
    }

    #[actix_web::test]
    async fn test_recommend_not_ready() {
        let app = test::init_service(
            App::new()
                .app_data(app_context(ServiceContext::new()))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/recommend")
            .set_json(json!({ "query": "red dress", "topK": 2 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn test_recommend_text() {
        let app = test::init_service(
            App::new()
                .app_data(app_context(ServiceContext::with_engine(test_engine())))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/recommend")
            .set_json(json!({ "query": "red dress for a summer wedding party", "topK": 2 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        let recommendations = body["recommendations"].as_array().unwrap();
        assert_eq!(recommendations.len(), 2);
        assert_eq!(recommendations[0]["imageReference"], "1.jpg");
        assert!(recommendations[0]["explain"]["color"].is_number());
        assert_eq!(body["filter"]["colors"], json!(["red"]));
        assert!(body.get("explanation").is_none());
    }

    #[actix_web::test]
    async fn test_recommend_rejects_bad_top_k() {
        let app = test::init_service(
            App::new()
                .app_data(app_context(ServiceContext::with_engine(test_engine())))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/recommend")
            .set_json(json!({ "query": "red dress", "topK": -1 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("topK"));
    }

    #[actix_web::test]
    async fn test_oversized_attribute_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(app_context(ServiceContext::with_engine(test_engine())))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/recommend/structured")
            .set_json(json!({
                "gender": "women",
                "baseColour": ["red"],
                "season": "summer",
                "usage": "party",
                "articleType": "d".repeat(10_000),
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("articleType"));
    }

    #[actix_web::test]
    async fn test_malformed_body_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(app_context(ServiceContext::with_engine(test_engine())))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/recommend/structured")
            .set_json(json!({ "gender": "women" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_structured_with_explanation() {
        let engine = test_engine().with_generator(ExplanationGenerator::new(
            Arc::new(EchoBackend),
            GenerationConfig::default(),
        ));
        let app = test::init_service(
            App::new()
                .app_data(app_context(ServiceContext::with_engine(engine)))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/recommend/structured")
            .set_json(json!({
                "gender": "women",
                "baseColour": ["red"],
                "season": "summer",
                "usage": "party",
                "articleType": "dress",
                "topK": 2,
                "explain": true
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["explanation"]["status"], "success");
        assert_eq!(body["explanation"]["imageReferences"], json!(["1.jpg"]));
        assert_eq!(body["explanation"]["attempts"], 1);
        assert_eq!(body["stats"]["resultsCount"], 2);
    }
}
