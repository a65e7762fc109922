use feedback_board::{
    AppConfig, AppState, InMemoryRepository, create_router,
    models::{Comment, FeedbackBlog, FeedbackResponse, LoginResponse, User},
    repository::RepositoryState,
};
use std::sync::Arc;
use tokio::net::TcpListener;

// Serves the real router over an in-memory store on an ephemeral port and
// returns the base address.
async fn spawn_app() -> String {
    let repo = Arc::new(InMemoryRepository::new()) as RepositoryState;
    let state = AppState {
        repo,
        config: AppConfig::default(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

async fn register_and_login(
    client: &reqwest::Client,
    address: &str,
    username: &str,
    password: &str,
) -> LoginResponse {
    let response = client
        .post(format!("{}/users", address))
        .json(&serde_json::json!({
            "username": username, "name": "Richard", "password": password
        }))
        .send()
        .await
        .expect("registration request failed");
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/login", address))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(response.status(), 200);

    response.json().await.expect("login body should deserialize")
}

#[tokio::test]
async fn test_health_check() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", address))
        .send()
        .await
        .expect("request failed");

    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_feedback_lifecycle() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let user = register_and_login(&client, &address, "LionHeart", "plantagenet1234").await;
    assert_eq!(user.username, "LionHeart");
    assert!(!user.token.is_empty());

    // Create
    let response = client
        .post(format!("{}/feedbacks", address))
        .bearer_auth(&user.token)
        .json(&serde_json::json!({ "title": "T", "tag": "Bug", "content": "C" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let created: FeedbackBlog = response.json().await.unwrap();
    assert!(created.likes.is_empty());
    assert!(created.comments.is_empty());

    // Listed
    let listing: Vec<FeedbackResponse> = client
        .get(format!("{}/feedbacks", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listing.iter().any(|f| f.id == created.id));

    // Delete
    let response = client
        .delete(format!("{}/feedbacks/{}", address, created.id))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    // Gone from the listing
    let listing: Vec<FeedbackResponse> = client
        .get(format!("{}/feedbacks", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listing.iter().all(|f| f.id != created.id));
}

#[tokio::test]
async fn test_create_feedback_with_tampered_token_fails() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let user = register_and_login(&client, &address, "LionHeart", "plantagenet1234").await;

    let response = client
        .post(format!("{}/feedbacks", address))
        .bearer_auth(format!("{}324", user.token))
        .json(&serde_json::json!({ "title": "T", "tag": "Bug", "content": "C" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);

    let listing: Vec<FeedbackResponse> = client
        .get(format!("{}/feedbacks", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listing.is_empty());
}

#[tokio::test]
async fn test_create_feedback_without_token_fails() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/feedbacks", address))
        .json(&serde_json::json!({ "title": "T", "tag": "Bug", "content": "C" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_login_with_bad_credentials_fails() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    register_and_login(&client, &address, "LionHeart", "plantagenet1234").await;

    for body in [
        serde_json::json!({ "username": "blabla", "password": "plantagenet1234" }),
        serde_json::json!({ "username": "LionHeart", "password": "notTheActualPassword" }),
    ] {
        let response = client
            .post(format!("{}/login", address))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
    }
}

#[tokio::test]
async fn test_registration_never_exposes_password_material() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/users", address))
        .json(&serde_json::json!({
            "username": "LionHeart", "name": "Richard", "password": "plantagenet1234"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body.get("password_hash").is_none());
    assert!(body.get("password").is_none());
    assert_eq!(body["username"], "LionHeart");
}

#[tokio::test]
async fn test_comment_lifecycle() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let author = register_and_login(&client, &address, "LionHeart", "plantagenet1234").await;
    let commenter = register_and_login(&client, &address, "bob22", "Foobar").await;

    let created: FeedbackBlog = client
        .post(format!("{}/feedbacks", address))
        .bearer_auth(&author.token)
        .json(&serde_json::json!({ "title": "Latin translation", "tag": "Feature", "content": "Lorem ipsum dolor" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Comment as a different authenticated user.
    let response = client
        .post(format!("{}/feedbacks/{}", address, created.id))
        .bearer_auth(&commenter.token)
        .json(&serde_json::json!({ "comment": "That is a great suggestion!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let comment: Comment = response.json().await.unwrap();

    // The listing shows the populated comment.
    let listing: Vec<FeedbackResponse> = client
        .get(format!("{}/feedbacks", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing[0].comments.len(), 1);
    assert_eq!(listing[0].comments[0].id, comment.id);

    // The feedback author may not delete someone else's comment.
    let response = client
        .delete(format!("{}/feedbacks/{}/{}", address, created.id, comment.id))
        .bearer_auth(&author.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    // The comment author may.
    let response = client
        .delete(format!("{}/feedbacks/{}/{}", address, created.id, comment.id))
        .bearer_auth(&commenter.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let listing: Vec<FeedbackResponse> = client
        .get(format!("{}/feedbacks", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listing[0].comments.is_empty());
}

#[tokio::test]
async fn test_like_toggle_over_http() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let author = register_and_login(&client, &address, "LionHeart", "plantagenet1234").await;
    let liker = register_and_login(&client, &address, "bob22", "Foobar").await;

    let created: FeedbackBlog = client
        .post(format!("{}/feedbacks", address))
        .bearer_auth(&author.token)
        .json(&serde_json::json!({ "title": "Latin translation", "tag": "Feature", "content": "Lorem ipsum dolor" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Anonymous toggling is rejected.
    let response = client
        .put(format!("{}/feedbacks/likes/{}", address, created.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    // First toggle records the like.
    let liked: FeedbackBlog = client
        .put(format!("{}/feedbacks/likes/{}", address, created.id))
        .bearer_auth(&liker.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(liked.likes, vec![liker.user_id]);

    // Second toggle removes it again.
    let unliked: FeedbackBlog = client
        .put(format!("{}/feedbacks/likes/{}", address, created.id))
        .bearer_auth(&liker.token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(unliked.likes.is_empty());
}

#[tokio::test]
async fn test_register_validation_over_http() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    for body in [
        serde_json::json!({ "username": "Li", "name": "Richard", "password": "plantagenet1234" }),
        serde_json::json!({ "username": "LionHeart", "name": "Richard", "password": "pla" }),
    ] {
        let response = client
            .post(format!("{}/users", address))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }
}

#[tokio::test]
async fn test_created_user_deserializes_without_hash() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/users", address))
        .json(&serde_json::json!({
            "username": "timmy123", "name": "Tim", "password": "Brains123"
        }))
        .send()
        .await
        .unwrap();

    // The public JSON shape omits the hash; it reads back defaulted-empty.
    let user: User = response.json().await.unwrap();
    assert_eq!(user.username, "timmy123");
    assert!(user.password_hash.is_empty());
}
