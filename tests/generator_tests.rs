// tests/generator_tests.rs

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use pdf_quiz::{
    config::{Config, normalize_base_url},
    error::AppError,
    services::question_generator::{GeneratorFactory, OpenAiFactory},
    utils::credential::ApiCredential,
};
use serde_json::{Value, json};

/// What the mock endpoint answers with.
#[derive(Clone)]
enum Reply {
    Content(String),
    Status(StatusCode),
    Raw(Value),
    Slow(Duration),
}

#[derive(Clone)]
struct Mock {
    reply: Reply,
    seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn chat_completions(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    mock.seen.lock().unwrap().push((auth, body));

    match mock.reply {
        Reply::Content(content) => Json(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        }))
        .into_response(),
        Reply::Status(status) => (status, Json(json!({ "error": { "message": "nope" } }))).into_response(),
        Reply::Raw(value) => Json(value).into_response(),
        Reply::Slow(delay) => {
            tokio::time::sleep(delay).await;
            StatusCode::OK.into_response()
        }
    }
}

/// Spawns a fake chat-completions API and returns a factory pointed at it.
async fn spawn_mock(reply: Reply, timeout_secs: u64) -> (OpenAiFactory, Mock) {
    let mock = Mock {
        reply,
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = Config {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        rust_log: "error".to_string(),
        openai_base_url: normalize_base_url(&format!("http://127.0.0.1:{}/v1", port)).unwrap(),
        openai_model: "test-model".to_string(),
        generation_timeout_secs: timeout_secs,
        max_upload_bytes: 1024,
        max_source_chars: 20,
        tick_interval_ms: 1000,
        session_idle_secs: 3600,
        allowed_origins: Vec::new(),
    };

    (OpenAiFactory::from_config(&config).unwrap(), mock)
}

fn questions_json(count: usize) -> String {
    let questions: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "question": format!("What is fact {}?", i),
                "options": ["one", "two", "three", "four"],
                "correct_answer": 3,
            })
        })
        .collect();
    json!({ "questions": questions }).to_string()
}

fn credential() -> ApiCredential {
    ApiCredential::parse("sk-test-key").unwrap()
}

#[tokio::test]
async fn generates_questions_with_bearer_key() {
    let (factory, mock) = spawn_mock(Reply::Content(questions_json(2)), 5).await;
    let generator = factory.connect(credential());

    let source = "A very long document that will be truncated";
    let questions = generator.generate(source, 2).await.expect("generation succeeds");

    assert_eq!(questions.len(), 2);
    assert_eq!(questions[1].id, 2);
    assert_eq!(questions[1].prompt, "What is fact 1?");
    assert_eq!(questions[1].correct_option_index, 3);

    let seen = mock.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (auth, body) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test-key"));
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["response_format"]["type"], "json_object");

    let user_prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(user_prompt.contains("exactly 2"));
    assert!(user_prompt.ends_with("A very long document"));
}

#[tokio::test]
async fn upstream_error_status_fails() {
    let (factory, _) = spawn_mock(Reply::Status(StatusCode::UNAUTHORIZED), 5).await;
    let err = factory
        .connect(credential())
        .generate("text", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::QuestionGenerationFailed(d) if d.contains("401")));
}

#[tokio::test]
async fn unparseable_content_fails() {
    let (factory, _) = spawn_mock(Reply::Content("Sure! Here are your questions:".into()), 5).await;
    let err = factory
        .connect(credential())
        .generate("text", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::QuestionGenerationFailed(_)));
}

#[tokio::test]
async fn missing_choices_fails() {
    let (factory, _) = spawn_mock(Reply::Raw(json!({ "choices": [] })), 5).await;
    let err = factory
        .connect(credential())
        .generate("text", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::QuestionGenerationFailed(_)));
}

#[tokio::test]
async fn too_few_questions_fails() {
    let (factory, _) = spawn_mock(Reply::Content(questions_json(1)), 5).await;
    let err = factory
        .connect(credential())
        .generate("text", 3)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::QuestionGenerationFailed(_)));
}

#[tokio::test]
async fn transport_timeout_fails() {
    let (factory, mock) = spawn_mock(Reply::Slow(Duration::from_secs(3)), 1).await;
    let err = factory
        .connect(credential())
        .generate("text", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::QuestionGenerationFailed(_)));
    // No retry on failure.
    assert_eq!(mock.seen.lock().unwrap().len(), 1);
}
