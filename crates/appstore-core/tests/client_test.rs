use appstore_core::session::FALLBACK_REPLY;
use appstore_core::{
    CatalogBackend, ConversationSession, QueryDispatcher, Resolution, ResultSource, Sender,
    SessionState, StoreClient, StoreError,
};
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

fn seed_apps() -> Value {
    json!([
        {
            "id": 1,
            "name": "SuperGame",
            "category": "Games",
            "description": "Arcade fun for everyone",
            "rating": 4.5,
            "downloads": "1000000",
            "size": "50MB",
            "price": "Free",
            "icon": "https://example.com/supergame.png",
            "screenshots": [],
            "developer": "Fun Co"
        },
        {
            "id": 2,
            "name": "TaxHelper",
            "category": "Productivity",
            "description": "Prepare your return",
            "rating": 4.1,
            "downloads": 5000,
            "size": "20MB",
            "price": "$4.99",
            "icon": "https://example.com/tax.png",
            "developer": "Ledger Ltd",
            "apk_filename": "2_taxhelper.apk"
        }
    ])
}

/// Name-only substring search, like the real store backend
async fn search(Json(body): Json<Value>) -> Json<Value> {
    let query = body["query"].as_str().unwrap_or_default().to_lowercase();
    let apps = seed_apps()
        .as_array()
        .unwrap()
        .iter()
        .filter(|a| a["name"].as_str().unwrap().to_lowercase().contains(&query))
        .cloned()
        .collect();
    Json(Value::Array(apps))
}

async fn app_by_id(Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    seed_apps()
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["id"].to_string() == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

fn healthy_store() -> Router {
    Router::new()
        .route("/api/apps", get(|| async { Json(seed_apps()) }))
        .route("/api/apps/:id", get(app_by_id))
        .route(
            "/api/categories",
            get(|| async {
                Json(json!([
                    { "id": "1", "name": "Games", "description": "Fun and entertaining games" },
                    { "id": "2", "name": "Productivity", "description": "Tools to boost your productivity" }
                ]))
            }),
        )
        .route("/api/search", post(search))
        .route(
            "/api/chatbot",
            post(|| async { Json(json!({ "response": "Try SuperGame!" })) }),
        )
}

/// Catalog works, search errors out, chatbot answers with the wrong shape
fn degraded_store() -> Router {
    Router::new()
        .route("/api/apps", get(|| async { Json(seed_apps()) }))
        .route(
            "/api/search",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route(
            "/api/chatbot",
            post(|| async { Json(json!({ "reply": "wrong field" })) }),
        )
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// An address nothing is listening on
async fn unreachable() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn visible_names(dispatcher: &QueryDispatcher) -> Vec<&str> {
    dispatcher.visible().iter().map(|a| a.name.as_str()).collect()
}

#[tokio::test]
async fn test_search_game_via_remote() {
    let client = StoreClient::new(&serve(healthy_store()).await);
    let mut dispatcher = QueryDispatcher::new();
    dispatcher.refresh_catalog(client.fetch_catalog().await.unwrap());

    let resolution = dispatcher.search(&client, "game").await;
    assert_eq!(
        resolution,
        Resolution::Applied {
            source: ResultSource::Remote,
            count: 1
        }
    );
    assert_eq!(visible_names(&dispatcher), vec!["SuperGame"]);
    assert_eq!(dispatcher.visible()[0].id, "1");
}

#[tokio::test]
async fn test_search_game_via_fallback_on_server_error() {
    let client = StoreClient::new(&serve(degraded_store()).await);
    let mut dispatcher = QueryDispatcher::new();
    dispatcher.refresh_catalog(client.fetch_catalog().await.unwrap());

    let resolution = dispatcher.search(&client, "game").await;
    assert_eq!(
        resolution,
        Resolution::Applied {
            source: ResultSource::LocalFallback,
            count: 1
        }
    );
    assert_eq!(visible_names(&dispatcher), vec!["SuperGame"]);
}

#[tokio::test]
async fn test_search_falls_back_when_backend_unreachable() {
    let live = StoreClient::new(&serve(healthy_store()).await);
    let dead = StoreClient::new(&unreachable().await);

    let mut dispatcher = QueryDispatcher::new();
    dispatcher.refresh_catalog(live.fetch_catalog().await.unwrap());

    dispatcher.search(&dead, "GAME").await;
    assert_eq!(dispatcher.source(), Some(ResultSource::LocalFallback));
    assert_eq!(visible_names(&dispatcher), vec!["SuperGame"]);

    // Empty query degrades to the full cached catalog
    dispatcher.search(&dead, "").await;
    assert_eq!(visible_names(&dispatcher), vec!["SuperGame", "TaxHelper"]);
}

#[tokio::test]
async fn test_cleared_search_returns_full_catalog_remotely() {
    let client = StoreClient::new(&serve(healthy_store()).await);
    let mut dispatcher = QueryDispatcher::new();

    dispatcher.search(&client, "tax").await;
    assert_eq!(visible_names(&dispatcher), vec!["TaxHelper"]);

    dispatcher.search(&client, "").await;
    assert_eq!(dispatcher.source(), Some(ResultSource::Remote));
    assert_eq!(visible_names(&dispatcher), vec!["SuperGame", "TaxHelper"]);
    assert_eq!(dispatcher.cache().records().len(), 2);
}

#[tokio::test]
async fn test_chat_turn_round_trip() {
    let client = StoreClient::new(&serve(healthy_store()).await);
    let mut session = ConversationSession::new();

    session.converse(&client, "recommend games").await;

    let transcript: Vec<(Sender, &str)> = session
        .transcript()
        .iter()
        .map(|t| (t.sender, t.text.as_str()))
        .collect();
    assert_eq!(
        transcript,
        vec![
            (Sender::User, "recommend games"),
            (Sender::Assistant, "Try SuperGame!"),
        ]
    );
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_chat_malformed_reply_becomes_apology() {
    let client = StoreClient::new(&serve(degraded_store()).await);
    let mut session = ConversationSession::new();

    session.converse(&client, "hello").await;
    assert_eq!(session.transcript().len(), 2);
    assert_eq!(session.transcript()[1].text, FALLBACK_REPLY);
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_chat_unreachable_becomes_apology() {
    let client = StoreClient::new(&unreachable().await);
    let mut session = ConversationSession::new();

    session.converse(&client, "hello").await;
    assert_eq!(session.transcript()[1].text, FALLBACK_REPLY);
}

#[tokio::test]
async fn test_error_classification() {
    let degraded = StoreClient::new(&serve(degraded_store()).await);
    match degraded.search("x").await {
        Err(StoreError::Status { status, body }) => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected status error, got {:?}", other),
    }

    let dead = StoreClient::new(&unreachable().await);
    let err = dead.fetch_catalog().await.unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_app_detail_and_categories() {
    let client = StoreClient::new(&serve(healthy_store()).await);

    let app = client.fetch_app("2").await.unwrap();
    assert_eq!(app.name, "TaxHelper");
    assert!(!app.is_free());
    assert_eq!(
        client.download_url(&app),
        Some(format!("{}/api/apps/2/download", client.base_url()))
    );

    assert!(matches!(
        client.fetch_app("99").await,
        Err(StoreError::NotFound(id)) if id == "99"
    ));

    let categories = client.fetch_categories().await.unwrap();
    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Games", "Productivity"]);
}
