pub mod health;
pub mod sessions;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::export::handlers as export_handlers;
use crate::generation::handlers as generation_handlers;
use crate::grading::handlers as grading_handlers;
use crate::ingest;
use crate::progress::handlers as progress_handlers;
use crate::report::handlers as report_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Sessions
        .route("/api/v1/sessions", post(sessions::handle_create_session))
        .route(
            "/api/v1/sessions/:sid",
            delete(sessions::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:sid/summary",
            get(sessions::handle_summary),
        )
        .route("/api/v1/sessions/:sid/clear", post(sessions::handle_clear))
        .route(
            "/api/v1/sessions/:sid/data",
            get(sessions::handle_export_data).post(sessions::handle_import_data),
        )
        // Notes
        .route(
            "/api/v1/sessions/:sid/notes",
            get(generation_handlers::handle_list_notes)
                .post(generation_handlers::handle_generate_note),
        )
        .route(
            "/api/v1/sessions/:sid/notes/export",
            get(export_handlers::handle_export_notes),
        )
        .route(
            "/api/v1/sessions/:sid/notes/:id",
            delete(generation_handlers::handle_delete_note),
        )
        // Flashcards
        .route(
            "/api/v1/sessions/:sid/flashcards",
            get(generation_handlers::handle_list_flashcards)
                .post(generation_handlers::handle_generate_flashcards),
        )
        .route(
            "/api/v1/sessions/:sid/flashcards/export",
            get(export_handlers::handle_export_flashcards),
        )
        .route(
            "/api/v1/sessions/:sid/flashcards/import",
            post(export_handlers::handle_import_flashcards),
        )
        .route(
            "/api/v1/sessions/:sid/flashcards/:id",
            delete(generation_handlers::handle_delete_flashcard),
        )
        .route(
            "/api/v1/sessions/:sid/flashcards/:id/review",
            post(generation_handlers::handle_review_flashcard),
        )
        // Quizzes
        .route(
            "/api/v1/sessions/:sid/quizzes",
            get(generation_handlers::handle_list_quizzes)
                .post(generation_handlers::handle_generate_quiz),
        )
        .route(
            "/api/v1/sessions/:sid/quizzes/:id",
            get(generation_handlers::handle_get_quiz)
                .delete(generation_handlers::handle_delete_quiz),
        )
        .route(
            "/api/v1/sessions/:sid/quizzes/:id/attempts",
            post(grading_handlers::handle_submit_attempt),
        )
        // Grading
        .route(
            "/api/v1/sessions/:sid/grade-text",
            post(grading_handlers::handle_grade_text),
        )
        // Progress
        .route(
            "/api/v1/sessions/:sid/progress",
            get(progress_handlers::handle_progress),
        )
        .route(
            "/api/v1/sessions/:sid/progress/weekly",
            get(progress_handlers::handle_weekly),
        )
        .route(
            "/api/v1/sessions/:sid/progress/recommendations",
            get(progress_handlers::handle_recommendations),
        )
        .route(
            "/api/v1/sessions/:sid/progress/charts",
            get(progress_handlers::handle_charts),
        )
        // Reports
        .route(
            "/api/v1/sessions/:sid/reports/progress",
            post(report_handlers::handle_progress_report),
        )
        .route(
            "/api/v1/sessions/:sid/reports/flashcards",
            post(report_handlers::handle_flashcard_report),
        )
        // Ingestion
        .route("/api/v1/ingest", post(ingest::handle_ingest))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::Config;
    use crate::errors::AppError;
    use crate::grading::judge::AnswerJudge;
    use crate::llm_client::LlmClient;
    use crate::store::SessionStore;

    struct NeverCorrectJudge;

    #[async_trait]
    impl AnswerJudge for NeverCorrectJudge {
        async fn is_correct(
            &self,
            _question: &str,
            _canonical: &str,
            _submitted: &str,
        ) -> Result<bool, AppError> {
            Ok(false)
        }
    }

    fn test_state(llm_base_url: String) -> AppState {
        AppState {
            store: SessionStore::new(),
            llm: LlmClient::new("test-key".to_string(), llm_base_url.clone()),
            judge: Arc::new(NeverCorrectJudge),
            config: Config {
                openrouter_api_key: "test-key".to_string(),
                llm_base_url,
                report_font_dir: "/nonexistent".to_string(),
                report_font_family: "LiberationSans".to_string(),
                port: 0,
                rust_log: "info".to_string(),
            },
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn chat_body(content: &str) -> Value {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_router(test_state("http://127.0.0.1:9".to_string()));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        assert_eq!(value["status"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_session_returns_404() {
        let app = build_router(test_state("http://127.0.0.1:9".to_string()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/sessions/{}/notes", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_flashcard_generate_then_csv_round_trip() {
        let server = MockServer::start().await;
        let cards = json!([
            {"front": "Q1", "back": "A1", "category": "Biology", "difficulty": "Easy"},
            {"front": "Q2", "back": "A2", "category": "Biology", "difficulty": "Easy"}
        ])
        .to_string();
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(&cards)))
            .mount(&server)
            .await;

        let app = build_router(test_state(server.uri()));

        // Create a session
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/sessions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let session_id = body_json(response).await["session_id"]
            .as_str()
            .unwrap()
            .to_string();

        // Generate flashcards through the HTTP surface
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/sessions/{session_id}/flashcards"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"content": "Photosynthesis basics", "num_cards": 2}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Export as CSV
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/sessions/{session_id}/flashcards/export"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let csv = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        // Re-import the same CSV
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/sessions/{session_id}/flashcards/import"))
                    .header(header::CONTENT_TYPE, "text/csv")
                    .body(Body::from(csv))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["imported"], 2);

        // Summary sees both generations
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/sessions/{session_id}/summary"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let summary = body_json(response).await;
        assert_eq!(summary["flashcards_count"], 4);
    }

    #[tokio::test]
    async fn test_quiz_attempt_exact_match_scores_full() {
        let server = MockServer::start().await;
        let quiz_reply = json!({
            "title": "Biology Quiz",
            "questions": [{
                "question": "Mitochondria produce ATP.",
                "type": "true_false",
                "correct_answer": "True",
                "explanation": "Cellular respiration."
            }]
        })
        .to_string();
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(&quiz_reply)))
            .mount(&server)
            .await;

        let app = build_router(test_state(server.uri()));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/sessions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let session_id = body_json(response).await["session_id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/sessions/{session_id}/quizzes"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({
                            "content": "Mitochondria",
                            "kind": "true_false",
                            "num_questions": 1,
                            "subject": "Biology"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let quiz = body_json(response).await;
        let quiz_id = quiz["id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!(
                        "/api/v1/sessions/{session_id}/quizzes/{quiz_id}/attempts"
                    ))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({"answers": {"1": "True"}}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let attempt = body_json(response).await;
        assert_eq!(attempt["score"], 100.0);
        assert_eq!(attempt["correct_count"], 1);
    }
}
