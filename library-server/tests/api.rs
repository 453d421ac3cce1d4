//! Router-level scenarios against the in-memory store

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use library_core::config::SessionSection;
use library_server::auth::SessionKeys;
use library_server::{build_router, AppState, FixedWindowLimiter, MemoryStore, ServerConfig};

fn state() -> AppState {
    let sessions = SessionKeys::new(&SessionSection {
        secret: "integration-secret".into(),
        ..SessionSection::default()
    });
    AppState::new(Arc::new(MemoryStore::new()), sessions)
}

fn app() -> Router {
    build_router(Arc::new(state()), &ServerConfig::default())
}

async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

struct Registered {
    token: String,
    user_id: String,
    owner_id: String,
}

async fn register(app: &Router, name: &str) -> Registered {
    let (status, body) = call(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "email": format!("{name}@example.com"),
            "password": "long-enough-password",
            "name": name,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    Registered {
        token: body["data"]["token"].as_str().unwrap().to_string(),
        user_id: body["data"]["user"]["id"].as_str().unwrap().to_string(),
        owner_id: body["data"]["personalOwnerId"].as_str().unwrap().to_string(),
    }
}

#[tokio::test]
async fn health_is_enveloped() {
    let (status, body) = call(&app(), Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert!(body["error"].is_null());
}

#[tokio::test]
async fn session_is_required() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");

    let (status, _) = call(&app, Method::GET, "/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_sets_cookie_that_authenticates() {
    let app = app();
    register(&app, "ada").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"email": "ada@example.com", "password": "long-enough-password"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with("library_session="));
    assert!(cookie.contains("HttpOnly"));

    let pair = cookie.split(';').next().unwrap().to_string();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/me")
                .header(header::COOKIE, pair)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "ada@example.com", "password": "wrong-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn follow_org_owner_shows_up_once() {
    let app = app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/orgs",
        Some(&bob.token),
        Some(json!({"name": "Bob's Books", "slug": "bobs-books"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let org_owner = body["data"]["ownerId"].as_str().unwrap().to_string();

    let follow = json!({"followingOwnerId": org_owner});
    let (status, _) = call(&app, Method::POST, "/follows", Some(&alice.token), Some(follow.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(&app, Method::POST, "/follows", Some(&alice.token), Some(follow)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "conflict");

    let (status, body) = call(&app, Method::GET, &format!("/owners/{org_owner}/followers"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["items"].as_array().unwrap();
    let hits = items.iter().filter(|e| e["owner"]["id"] == alice.owner_id.as_str()).count();
    assert_eq!(hits, 1);
    assert_eq!(items[0]["owner"]["displayName"], "alice");

    let (_, body) = call(&app, Method::GET, &format!("/owners/{org_owner}"), None, None).await;
    assert_eq!(body["data"]["followerCount"], 1);
    assert_eq!(body["data"]["kind"], "org");
}

#[tokio::test]
async fn self_follow_is_bad_request() {
    let app = app();
    let alice = register(&app, "alice").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/follows",
        Some(&alice.token),
        Some(json!({"followingOwnerId": alice.owner_id})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn inbox_and_mark_read() {
    let app = app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/messages",
        Some(&alice.token),
        Some(json!({"receiverOwnerId": bob.owner_id, "content": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let message_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = call(&app, Method::GET, "/messages/inbox", Some(&bob.token), None).await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["content"], "hi");
    assert!(items[0]["readAt"].is_null());

    // only the receiver may mark it read
    let uri = format!("/messages/{message_id}/read");
    let (status, _) = call(&app, Method::PATCH, &uri, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&app, Method::PATCH, &uri, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::OK);
    let read_at = body["data"]["readAt"].as_str().unwrap().to_string();
    let created_at = body["data"]["createdAt"].as_str().unwrap();
    let parse = |s: &str| chrono::DateTime::parse_from_rfc3339(s).unwrap();
    assert!(parse(&read_at) >= parse(created_at));

    let (_, body) = call(&app, Method::PATCH, &uri, Some(&bob.token), None).await;
    assert_eq!(body["data"]["readAt"], read_at.as_str());

    let (_, body) = call(&app, Method::GET, "/messages/inbox?unread=true", Some(&bob.token), None).await;
    assert_eq!(body["data"]["total"], 0);

    let (_, body) = call(&app, Method::GET, "/messages/sent", Some(&alice.token), None).await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn empty_message_is_bad_request() {
    let app = app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/messages",
        Some(&alice.token),
        Some(json!({"receiverOwnerId": bob.owner_id, "content": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn switching_to_an_org_and_losing_access() {
    let app = app();
    let boss = register(&app, "boss").await;
    let helper = register(&app, "helper").await;

    let (_, body) = call(
        &app,
        Method::POST,
        "/orgs",
        Some(&boss.token),
        Some(json!({"name": "Acme", "slug": "acme"})),
    )
    .await;
    let org_id = body["data"]["id"].as_str().unwrap().to_string();
    let org_owner = body["data"]["ownerId"].as_str().unwrap().to_string();

    // not a member yet
    let switch = json!({"ownerId": org_owner});
    let (status, _) = call(&app, Method::POST, "/session/active-owner", Some(&helper.token), Some(switch.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let members = format!("/orgs/{org_id}/members");
    let (status, _) = call(
        &app,
        Method::PUT,
        &members,
        Some(&boss.token),
        Some(json!({"userId": helper.user_id, "role": "admin"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::POST, "/session/active-owner", Some(&helper.token), Some(switch)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["activeOwner"]["id"], org_owner.as_str());
    let org_token = body["data"]["token"].as_str().unwrap().to_string();

    let (_, body) = call(&app, Method::GET, "/me", Some(&org_token), None).await;
    assert_eq!(body["data"]["activeOwner"]["kind"], "org");
    assert!(body["data"]["staleActiveOwnerId"].is_null());
    assert_eq!(body["data"]["personalOwnerId"], helper.owner_id.as_str());

    // a message sent while acting as the org carries its id
    let (_, body) = call(
        &app,
        Method::POST,
        "/messages",
        Some(&org_token),
        Some(json!({"receiverOwnerId": boss.owner_id, "content": "hello from acme"})),
    )
    .await;
    assert_eq!(body["data"]["senderOrgId"], org_id.as_str());

    // demoted: the old token no longer resolves
    call(
        &app,
        Method::PUT,
        &members,
        Some(&boss.token),
        Some(json!({"userId": helper.user_id, "role": "member"})),
    )
    .await;
    let (status, _) = call(&app, Method::GET, "/messages/inbox", Some(&org_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // their own profile stays reachable and flags the stale owner
    let (status, body) = call(&app, Method::GET, "/me", Some(&org_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["activeOwner"]["id"], helper.owner_id.as_str());
    assert_eq!(body["data"]["staleActiveOwnerId"], org_owner.as_str());

    let (status, body) = call(
        &app,
        Method::PUT,
        "/me/user",
        Some(&org_token),
        Some(json!({"bio": "still here"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["bio"], "still here");

    // null switches back to the personal owner
    let (status, body) = call(
        &app,
        Method::POST,
        "/session/active-owner",
        Some(&org_token),
        Some(json!({"ownerId": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["activeOwner"]["id"], helper.owner_id.as_str());
}

#[tokio::test]
async fn profile_update_and_topics() {
    let app = app();
    let alice = register(&app, "alice").await;

    let (status, body) = call(
        &app,
        Method::PUT,
        "/me/user",
        Some(&alice.token),
        Some(json!({"bio": "Reads a lot", "interests": ["poetry", "Poetry", "maps"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["bio"], "Reads a lot");
    assert_eq!(body["data"]["interests"], json!(["poetry", "maps"]));

    let (_, body) = call(&app, Method::POST, "/topics", Some(&alice.token), Some(json!({"name": "History"}))).await;
    let history = body["data"]["id"].as_str().unwrap().to_string();
    let (status, _) = call(
        &app,
        Method::POST,
        "/topics",
        Some(&alice.token),
        Some(json!({"name": "Ancient Rome", "parentId": history})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = call(&app, Method::GET, "/topics/tree", None, None).await;
    assert_eq!(body["data"][0]["name"], "History");
    assert_eq!(body["data"][0]["children"][0]["slug"], "ancient-rome");
}

#[tokio::test]
async fn images_belong_to_the_active_owner() {
    let app = app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/images",
        Some(&alice.token),
        Some(json!({"url": "https://img.example.com/shelf.jpg", "caption": "my shelf"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/images/{}", body["data"]["id"].as_str().unwrap());

    let (status, _) = call(&app, Method::DELETE, &uri, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = call(&app, Method::GET, &format!("/owners/{}/images", alice.owner_id), None, None).await;
    assert_eq!(body["data"]["total"], 1);

    let (status, _) = call(&app, Method::DELETE, &uri, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_input_is_enveloped() {
    let app = app();
    let alice = register(&app, "alice").await;

    let (status, body) = call(&app, Method::GET, "/owners/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, body) = call(&app, Method::POST, "/follows", Some(&alice.token), Some(json!({"wrong": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"].is_null());

    let (status, body) = call(&app, Method::GET, "/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn rate_limit_returns_429() {
    let state = state().with_rate_limiter(Arc::new(FixedWindowLimiter::new(2, Duration::from_secs(60))));
    let app = build_router(Arc::new(state), &ServerConfig::default());

    for _ in 0..2 {
        let (status, _) = call(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
}

fn health_from(peer: [u8; 4], forwarded: &str) -> Request<Body> {
    let mut req = Request::builder()
        .uri("/health")
        .header("x-forwarded-for", forwarded)
        .body(Body::empty())
        .unwrap();
    req.extensions_mut().insert(ConnectInfo(SocketAddr::from((peer, 5000))));
    req
}

#[tokio::test]
async fn rotating_forwarded_for_does_not_reset_the_limit() {
    let state = state().with_rate_limiter(Arc::new(FixedWindowLimiter::new(1, Duration::from_secs(60))));
    let app = build_router(Arc::new(state), &ServerConfig::default());

    let mut statuses = Vec::new();
    for i in 0..5 {
        let response = app
            .clone()
            .oneshot(health_from([198, 51, 100, 4], &format!("10.0.0.{i}")))
            .await
            .unwrap();
        statuses.push(response.status());
    }

    assert_eq!(statuses[0], StatusCode::OK);
    assert!(statuses[1..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn trusted_proxy_keys_on_forwarded_for() {
    let state = state()
        .with_rate_limiter(Arc::new(FixedWindowLimiter::new(1, Duration::from_secs(60))))
        .trusting_forwarded_for(true);
    let app = build_router(Arc::new(state), &ServerConfig::default());

    // one proxy address, two real clients behind it
    let first = app.clone().oneshot(health_from([10, 1, 1, 1], "203.0.113.1")).await.unwrap();
    let second = app.clone().oneshot(health_from([10, 1, 1, 1], "203.0.113.2")).await.unwrap();
    let again = app.clone().oneshot(health_from([10, 1, 1, 1], "203.0.113.1")).await.unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(again.status(), StatusCode::TOO_MANY_REQUESTS);
}
