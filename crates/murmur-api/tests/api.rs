//! End-to-end tests over the API router, driven in-process with `oneshot`.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use murmur_api::auth::{AppState, AppStateInner};
use murmur_api::token::TokenService;
use murmur_db::Database;
use murmur_types::api::{Claims, IdentityClaim};

const SECRET: &str = "integration-test-secret";

fn app() -> Router {
    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        tokens: TokenService::new(SECRET),
    });
    murmur_api::router(state)
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Signs up a user and returns the `{token, user}` response body.
async fn signup(app: &Router, username: &str, email: &str, password: &str) -> Value {
    let (status, body) = request(
        app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({ "username": username, "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);
    body
}

#[tokio::test]
async fn signup_token_claim_matches_created_user() {
    let app = app();
    let body = signup(&app, "alice", "alice@example.com", "pw123").await;

    let token = body["token"].as_str().unwrap();
    let claim = TokenService::new(SECRET).verify(token).unwrap();
    assert_eq!(claim.username, "alice");
    assert_eq!(claim.email, "alice@example.com");
    assert_eq!(claim.id.to_string(), body["user"]["id"].as_str().unwrap());
}

#[tokio::test]
async fn signup_duplicates_conflict() {
    let app = app();
    signup(&app, "alice", "alice@example.com", "pw123").await;

    let (status, body) = request(
        &app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({ "username": "alice", "email": "other@example.com", "password": "pw123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, _) = request(
        &app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({ "username": "bob", "email": "alice@example.com", "password": "pw123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = app();
    signup(&app, "alice", "alice@example.com", "pw123").await;

    let (wrong_pw_status, wrong_pw_body) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "wrongpass" })),
    )
    .await;
    let (no_user_status, no_user_body) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "nouser@example.com", "password": "x" })),
    )
    .await;

    assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
    assert_eq!(no_user_status, StatusCode::UNAUTHORIZED);
    // Identical body for both failure modes — no account enumeration.
    assert_eq!(wrong_pw_body, no_user_body);
    assert_eq!(wrong_pw_body["message"], "Incorrect credentials");
}

#[tokio::test]
async fn bob_posts_hello_world() {
    let app = app();
    signup(&app, "bob", "bob@x.com", "pw123").await;

    let (status, login) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "bob@x.com", "password": "pw123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = login["token"].as_str().unwrap().to_string();

    let (status, thought) = request(
        &app,
        "POST",
        "/thoughts",
        Some(&token),
        Some(json!({ "thought_text": "hello world" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(thought["username"], "bob");
    assert_eq!(thought["thought_text"], "hello world");

    let (status, feed) = request(&app, "GET", "/thoughts", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feed[0]["thought_text"], "hello world");
}

#[tokio::test]
async fn thoughts_list_newest_first_and_filters_by_author() {
    let app = app();
    let bob = signup(&app, "bob", "bob@x.com", "pw123").await;
    let alice = signup(&app, "alice", "alice@x.com", "pw123").await;
    let bob_token = bob["token"].as_str().unwrap();
    let alice_token = alice["token"].as_str().unwrap();

    for (token, text) in [
        (bob_token, "first"),
        (bob_token, "second"),
        (alice_token, "third"),
    ] {
        let (status, _) = request(
            &app,
            "POST",
            "/thoughts",
            Some(token),
            Some(json!({ "thought_text": text })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, feed) = request(&app, "GET", "/thoughts", None, None).await;
    let texts: Vec<&str> = feed
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["thought_text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, ["third", "second", "first"]);

    let (_, bobs) = request(&app, "GET", "/thoughts?username=bob", None, None).await;
    let texts: Vec<&str> = bobs
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["thought_text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, ["second", "first"]);
}

#[tokio::test]
async fn anonymous_mutations_fail_without_touching_storage() {
    let app = app();
    signup(&app, "bob", "bob@x.com", "pw123").await;

    let some_id = Uuid::new_v4();
    let attempts = [
        ("POST", "/thoughts".to_string(), Some(json!({ "thought_text": "hi" }))),
        (
            "POST",
            format!("/thoughts/{}/reactions", some_id),
            Some(json!({ "reaction_body": "!" })),
        ),
        (
            "POST",
            "/me/friends".to_string(),
            Some(json!({ "friend_id": some_id })),
        ),
        ("GET", "/me".to_string(), None),
    ];

    for (method, uri, body) in attempts {
        let (status, body) = request(&app, method, &uri, None, body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(body["error"], "unauthenticated");
    }

    // Nothing was written
    let (_, feed) = request(&app, "GET", "/thoughts", None, None).await;
    assert_eq!(feed.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn bad_tokens_degrade_to_anonymous() {
    let app = app();

    // Tampered/foreign signature
    let foreign = TokenService::new("another-secret")
        .issue(&IdentityClaim {
            id: Uuid::new_v4(),
            username: "mallory".into(),
            email: "mallory@example.com".into(),
        })
        .unwrap();

    // Expired but correctly signed
    let now = chrono::Utc::now().timestamp();
    let expired = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &Claims {
            data: IdentityClaim {
                id: Uuid::new_v4(),
                username: "mallory".into(),
                email: "mallory@example.com".into(),
            },
            iat: now - 4 * 3600,
            exp: now - 2 * 3600,
        },
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    for token in [foreign.as_str(), expired.as_str(), "garbage"] {
        let (status, body) = request(&app, "GET", "/me", Some(token), None).await;
        // Anonymous context, so the resolver's own check fires — never a 500.
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthenticated");
    }
}

#[tokio::test]
async fn me_returns_the_caller() {
    let app = app();
    signup(&app, "alice", "alice@x.com", "pw123").await;
    let bob = signup(&app, "bob", "bob@x.com", "pw123").await;
    let token = bob["token"].as_str().unwrap();

    let (status, me) = request(&app, "GET", "/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "bob");
    assert_eq!(me["id"], bob["user"]["id"]);
}

#[tokio::test]
async fn add_friend_is_idempotent() {
    let app = app();
    let alice = signup(&app, "alice", "alice@x.com", "pw123").await;
    let bob = signup(&app, "bob", "bob@x.com", "pw123").await;
    let token = alice["token"].as_str().unwrap();
    let bob_id = bob["user"]["id"].as_str().unwrap();

    for _ in 0..2 {
        let (status, user) = request(
            &app,
            "POST",
            "/me/friends",
            Some(token),
            Some(json!({ "friend_id": bob_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["friends"].as_array().unwrap().len(), 1);
        assert_eq!(user["friend_count"], 1);
        assert_eq!(user["friends"][0]["username"], "bob");
    }
}

#[tokio::test]
async fn add_friend_rejects_self_and_unknown() {
    let app = app();
    let alice = signup(&app, "alice", "alice@x.com", "pw123").await;
    let token = alice["token"].as_str().unwrap();
    let own_id = alice["user"]["id"].as_str().unwrap();

    let (status, body) = request(
        &app,
        "POST",
        "/me/friends",
        Some(token),
        Some(json!({ "friend_id": own_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");

    let (status, _) = request(
        &app,
        "POST",
        "/me/friends",
        Some(token),
        Some(json!({ "friend_id": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reactions_append_to_a_thought() {
    let app = app();
    let bob = signup(&app, "bob", "bob@x.com", "pw123").await;
    let alice = signup(&app, "alice", "alice@x.com", "pw123").await;

    let (_, thought) = request(
        &app,
        "POST",
        "/thoughts",
        Some(bob["token"].as_str().unwrap()),
        Some(json!({ "thought_text": "deep thought" })),
    )
    .await;
    let thought_id = thought["id"].as_str().unwrap();

    let (status, updated) = request(
        &app,
        "POST",
        &format!("/thoughts/{}/reactions", thought_id),
        Some(alice["token"].as_str().unwrap()),
        Some(json!({ "reaction_body": "wow" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["reactions"].as_array().unwrap().len(), 1);
    assert_eq!(updated["reactions"][0]["username"], "alice");
    assert_eq!(updated["reactions"][0]["reaction_body"], "wow");

    // Reacting to a thought that does not exist
    let (status, _) = request(
        &app,
        "POST",
        &format!("/thoughts/{}/reactions", Uuid::new_v4()),
        Some(alice["token"].as_str().unwrap()),
        Some(json!({ "reaction_body": "wow" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reaction_body_bounds() {
    let app = app();
    let bob = signup(&app, "bob", "bob@x.com", "pw123").await;
    let token = bob["token"].as_str().unwrap();

    let (_, thought) = request(
        &app,
        "POST",
        "/thoughts",
        Some(token),
        Some(json!({ "thought_text": "react to this" })),
    )
    .await;
    let uri = format!("/thoughts/{}/reactions", thought["id"].as_str().unwrap());

    let long = "x".repeat(281);
    for body in ["", long.as_str()] {
        let (status, err) = request(
            &app,
            "POST",
            &uri,
            Some(token),
            Some(json!({ "reaction_body": body })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "validation");
    }

    // A body within bounds still goes through, and the rejects left nothing behind
    let (status, updated) = request(
        &app,
        "POST",
        &uri,
        Some(token),
        Some(json!({ "reaction_body": "ok" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["reactions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn user_projections_exclude_password_and_populate_relations() {
    let app = app();
    let bob = signup(&app, "bob", "bob@x.com", "pw123").await;
    let alice = signup(&app, "alice", "alice@x.com", "pw123").await;

    request(
        &app,
        "POST",
        "/thoughts",
        Some(bob["token"].as_str().unwrap()),
        Some(json!({ "thought_text": "hello" })),
    )
    .await;
    request(
        &app,
        "POST",
        "/me/friends",
        Some(bob["token"].as_str().unwrap()),
        Some(json!({ "friend_id": alice["user"]["id"].as_str().unwrap() })),
    )
    .await;

    let (status, users) = request(&app, "GET", "/users", None, None).await;
    assert_eq!(status, StatusCode::OK);
    for user in users.as_array().unwrap() {
        assert!(user.get("password").is_none());
        assert!(user.get("password_hash").is_none());
    }

    // The listing attributes relations to the right user
    let find = |name: &str| {
        users
            .as_array()
            .unwrap()
            .iter()
            .find(|u| u["username"] == name)
            .unwrap()
            .clone()
    };
    let bob_listed = find("bob");
    assert_eq!(bob_listed["thoughts"].as_array().unwrap().len(), 1);
    assert_eq!(bob_listed["friends"][0]["username"], "alice");
    assert_eq!(bob_listed["friend_count"], 1);
    let alice_listed = find("alice");
    assert_eq!(alice_listed["thoughts"].as_array().unwrap().len(), 0);
    assert_eq!(alice_listed["friend_count"], 0);

    let (status, bob_view) = request(&app, "GET", "/users/bob", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bob_view["thoughts"].as_array().unwrap().len(), 1);
    assert_eq!(bob_view["thoughts"][0]["thought_text"], "hello");
    assert_eq!(bob_view["friends"][0]["username"], "alice");
    assert_eq!(bob_view["friend_count"], 1);

    let (status, _) = request(&app, "GET", "/users/nobody", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_thought_by_id() {
    let app = app();
    let bob = signup(&app, "bob", "bob@x.com", "pw123").await;

    let (_, thought) = request(
        &app,
        "POST",
        "/thoughts",
        Some(bob["token"].as_str().unwrap()),
        Some(json!({ "thought_text": "findable" })),
    )
    .await;
    let id = thought["id"].as_str().unwrap();

    let (status, fetched) = request(&app, "GET", &format!("/thoughts/{}", id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["thought_text"], "findable");

    let (status, _) = request(
        &app,
        "GET",
        &format!("/thoughts/{}", Uuid::new_v4()),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn signup_validation_bounds() {
    let app = app();

    let cases = [
        json!({ "username": "", "email": "a@x.com", "password": "pw123" }),
        json!({ "username": "bob", "email": "not-an-email", "password": "pw123" }),
        json!({ "username": "bob", "email": "bob@x.com", "password": "pw" }),
    ];
    for body in cases {
        let (status, err) = request(&app, "POST", "/auth/signup", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "validation");
    }

    // Thought text bounds
    let bob = signup(&app, "bob", "bob@x.com", "pw123").await;
    let token = bob["token"].as_str().unwrap();
    let long = "x".repeat(281);
    for text in ["", long.as_str()] {
        let (status, _) = request(
            &app,
            "POST",
            "/thoughts",
            Some(token),
            Some(json!({ "thought_text": text })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
