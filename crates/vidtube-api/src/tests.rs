//! Router-level tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;
use vidtube_store_sqlite::SqliteStore;

use crate::{ApiSettings, AppState, actor::ACTOR_HEADER, api_router};

async fn make_state() -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  AppState::new(Arc::new(store), ApiSettings { edit_history_limit: 2 })
}

async fn send_raw(
  state: &AppState<SqliteStore>,
  method: Method,
  uri: &str,
  actor: Option<&str>,
  content_type: Option<&str>,
  body: Body,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(actor) = actor {
    builder = builder.header(ACTOR_HEADER, actor);
  }
  if let Some(content_type) = content_type {
    builder = builder.header(header::CONTENT_TYPE, content_type);
  }
  let resp = api_router(state.clone())
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();

  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn send(
  state: &AppState<SqliteStore>,
  method: Method,
  uri: &str,
  actor: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  match body {
    Some(json) => {
      send_raw(
        state,
        method,
        uri,
        actor,
        Some("application/json"),
        Body::from(json.to_string()),
      )
      .await
    }
    None => send_raw(state, method, uri, actor, None, Body::empty()).await,
  }
}

async fn register(state: &AppState<SqliteStore>, username: &str) -> String {
  let (status, body) = send(
    state,
    Method::POST,
    "/users",
    None,
    Some(json!({
      "full_name":  format!("{username} Example"),
      "email":      format!("{}@example.com", username.to_lowercase()),
      "username":   username,
      "password":   "correct horse",
      "avatar_url": "https://cdn.example.com/avatar.png",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["user_id"].as_str().unwrap().to_owned()
}

async fn publish(state: &AppState<SqliteStore>, owner: &str, title: &str) -> String {
  let (status, body) = send(
    state,
    Method::POST,
    "/videos",
    Some(owner),
    Some(json!({
      "title":         title,
      "description":   format!("{title} description"),
      "video_url":     "https://cdn.example.com/v.mp4",
      "thumbnail_url": "https://cdn.example.com/v.jpg",
      "duration_secs": 42.5,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["video_id"].as_str().unwrap().to_owned()
}

fn error_kind(body: &Value) -> &str { body["error"]["kind"].as_str().unwrap() }

// ─── Health / registration ───────────────────────────────────────────────────

#[tokio::test]
async fn healthcheck_is_ok() {
  let state = make_state().await;
  let (status, body) = send(&state, Method::GET, "/healthcheck", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn register_lowercases_username_and_hides_hash() {
  let state = make_state().await;
  let id = register(&state, "Alice").await;

  let (status, body) = send(&state, Method::GET, &format!("/users/{id}"), None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["username"], "alice");
  assert!(body.get("password_hash").is_none());
  assert!(body.get("password").is_none());
}

#[tokio::test]
async fn duplicate_registration_is_already_exists() {
  let state = make_state().await;
  register(&state, "alice").await;

  let (status, body) = send(
    &state,
    Method::POST,
    "/users",
    None,
    Some(json!({
      "full_name":  "Another Alice",
      "email":      "another@example.com",
      "username":   "ALICE",
      "password":   "pw",
      "avatar_url": "https://cdn.example.com/a.png",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(error_kind(&body), "already_exists");
}

#[tokio::test]
async fn registration_requires_fields() {
  let state = make_state().await;
  let (status, body) = send(
    &state,
    Method::POST,
    "/users",
    None,
    Some(json!({ "username": "bob", "password": "pw" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_kind(&body), "invalid_argument");
  assert!(body["error"]["message"].as_str().unwrap().contains("full_name"));
}

// ─── Toggles ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn like_toggles_and_reports_count() {
  let state = make_state().await;
  let owner = register(&state, "owner").await;
  let fan = register(&state, "fan").await;
  let video = publish(&state, &owner, "intro").await;
  let uri = format!("/videos/{video}/like");

  let (status, body) = send(&state, Method::POST, &uri, Some(&fan), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "state": "added", "count": 1 }));

  let (_, body) = send(&state, Method::POST, &uri, Some(&owner), None).await;
  assert_eq!(body, json!({ "state": "added", "count": 2 }));

  let (_, body) = send(&state, Method::POST, &uri, Some(&fan), None).await;
  assert_eq!(body, json!({ "state": "removed", "count": 1 }));

  let (_, liked) = send(&state, Method::GET, "/users/me/liked-videos", Some(&owner), None).await;
  assert_eq!(liked["total"], 1);
  assert_eq!(liked["items"][0]["video_id"], video.as_str());
}

#[tokio::test]
async fn toggle_error_mapping() {
  let state = make_state().await;
  let fan = register(&state, "fan").await;
  let missing = Uuid::new_v4();

  let (status, body) =
    send(&state, Method::POST, &format!("/videos/{missing}/like"), None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(error_kind(&body), "unauthenticated");

  let (status, body) =
    send(&state, Method::POST, "/videos/not-a-uuid/like", Some(&fan), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_kind(&body), "invalid_argument");

  let (status, body) = send(
    &state,
    Method::POST,
    &format!("/tweets/{missing}/like"),
    Some(&fan),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(error_kind(&body), "not_found");

  let (status, _) = send(
    &state,
    Method::POST,
    &format!("/videos/{missing}/like"),
    Some("garbage"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn subscribe_updates_profile_and_listings() {
  let state = make_state().await;
  let alice = register(&state, "alice").await;
  let bob = register(&state, "bob").await;

  let (status, body) = send(
    &state,
    Method::POST,
    &format!("/channels/{alice}/subscribe"),
    Some(&alice),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_kind(&body), "invalid_argument");

  let (_, body) = send(
    &state,
    Method::POST,
    &format!("/channels/{bob}/subscribe"),
    Some(&alice),
    None,
  )
  .await;
  assert_eq!(body, json!({ "state": "added", "count": 1 }));

  let (_, profile) =
    send(&state, Method::GET, &format!("/channels/{bob}"), Some(&alice), None).await;
  assert_eq!(profile["subscriber_count"], 1);
  assert_eq!(profile["is_subscribed"], true);

  let (_, profile) = send(&state, Method::GET, &format!("/channels/{alice}"), None, None).await;
  assert_eq!(profile["subscribed_to_count"], 1);
  assert_eq!(profile["subscribed_to"], json!([bob]));
  assert_eq!(profile["is_subscribed"], false);

  let (_, subs) =
    send(&state, Method::GET, &format!("/channels/{bob}/subscribers"), None, None).await;
  assert_eq!(subs["total"], 1);
  assert_eq!(subs["items"][0]["user_id"], alice.as_str());

  let (_, mine) =
    send(&state, Method::GET, "/users/me/subscriptions", Some(&alice), None).await;
  assert_eq!(mine["items"][0]["user_id"], bob.as_str());
}

// ─── Videos ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn viewing_counts_and_records_history() {
  let state = make_state().await;
  let owner = register(&state, "owner").await;
  let viewer = register(&state, "viewer").await;
  let video = publish(&state, &owner, "clip").await;
  let uri = format!("/videos/{video}");

  send(&state, Method::GET, &uri, None, None).await;
  let (status, body) = send(&state, Method::GET, &uri, Some(&viewer), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["views"], 2);

  let (_, history) = send(&state, Method::GET, "/users/me/history", Some(&viewer), None).await;
  assert_eq!(history.as_array().unwrap().len(), 1);
  assert_eq!(history[0]["video"]["video_id"], video.as_str());

  let (status, _) = send(&state, Method::GET, "/users/me/history", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn only_the_owner_may_modify_a_video() {
  let state = make_state().await;
  let owner = register(&state, "owner").await;
  let other = register(&state, "other").await;
  let video = publish(&state, &owner, "clip").await;
  let uri = format!("/videos/{video}");

  let (status, body) = send(
    &state,
    Method::PATCH,
    &uri,
    Some(&other),
    Some(json!({ "title": "hijacked" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(error_kind(&body), "forbidden");

  let (status, body) = send(
    &state,
    Method::PATCH,
    &uri,
    Some(&owner),
    Some(json!({ "title": "renamed" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["title"], "renamed");

  let (status, _) = send(&state, Method::PATCH, &uri, Some(&owner), Some(json!({}))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(&state, Method::DELETE, &uri, Some(&other), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, body) = send(&state, Method::DELETE, &uri, Some(&owner), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  assert_eq!(body, Value::Null);
  let (status, _) = send(&state, Method::GET, &uri, None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_hides_unpublished_and_validates_params() {
  let state = make_state().await;
  let owner = register(&state, "owner").await;
  let shown = publish(&state, &owner, "Rust tips").await;
  let hidden = publish(&state, &owner, "rust drafts").await;

  let (status, body) = send(
    &state,
    Method::PATCH,
    &format!("/videos/{hidden}/publish"),
    Some(&owner),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["is_published"], false);

  let (status, page) = send(&state, Method::GET, "/videos?query=RUST", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(page["total"], 1);
  assert_eq!(page["items"][0]["video_id"], shown.as_str());

  let (_, all) =
    send(&state, Method::GET, &format!("/channels/{owner}/videos"), None, None).await;
  assert_eq!(all.as_array().unwrap().len(), 2);

  for bad in ["/videos?sort_by=rating", "/videos?sort_type=sideways", "/videos?limit=0", "/videos?page=0"] {
    let (status, body) = send(&state, Method::GET, bad, None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{bad}");
    assert_eq!(error_kind(&body), "invalid_argument");
  }
}

// ─── Comments and tweets ─────────────────────────────────────────────────────

#[tokio::test]
async fn comment_lifecycle() {
  let state = make_state().await;
  let owner = register(&state, "owner").await;
  let fan = register(&state, "fan").await;
  let video = publish(&state, &owner, "clip").await;

  let (status, comment) = send(
    &state,
    Method::POST,
    &format!("/videos/{video}/comments"),
    Some(&fan),
    Some(json!({ "content": "first!" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let comment_id = comment["comment_id"].as_str().unwrap().to_owned();
  let uri = format!("/comments/{comment_id}");

  for text in ["second", "third", "fourth"] {
    let (status, _) =
      send(&state, Method::PATCH, &uri, Some(&fan), Some(json!({ "content": text }))).await;
    assert_eq!(status, StatusCode::OK);
  }
  let (_, page) =
    send(&state, Method::GET, &format!("/videos/{video}/comments"), None, None).await;
  let listed = &page["items"][0];
  assert_eq!(listed["content"], "fourth");
  assert_eq!(listed["history"].as_array().unwrap().len(), 2);
  assert_eq!(listed["history"][0]["content"], "second");

  let (_, liked) =
    send(&state, Method::POST, &format!("{uri}/like"), Some(&owner), None).await;
  assert_eq!(liked["count"], 1);

  let (status, _) = send(&state, Method::DELETE, &uri, Some(&owner), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = send(&state, Method::DELETE, &uri, Some(&fan), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) =
    send(&state, Method::POST, &format!("{uri}/like"), Some(&owner), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tweets_list_newest_first() {
  let state = make_state().await;
  let alice = register(&state, "alice").await;

  let (_, body) = send(&state, Method::GET, &format!("/users/{alice}/tweets"), None, None).await;
  assert_eq!(body, json!([]));

  for text in ["one", "two"] {
    let (status, _) = send(
      &state,
      Method::POST,
      "/tweets",
      Some(&alice),
      Some(json!({ "content": text })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
  }
  let (_, body) = send(&state, Method::GET, &format!("/users/{alice}/tweets"), None, None).await;
  assert_eq!(body[0]["content"], "two");
  assert_eq!(body[1]["content"], "one");

  let (status, _) = send(
    &state,
    Method::POST,
    "/tweets",
    Some(&alice),
    Some(json!({ "content": "   " })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Playlists / dashboard ───────────────────────────────────────────────────

#[tokio::test]
async fn playlist_entries() {
  let state = make_state().await;
  let alice = register(&state, "alice").await;
  let video = publish(&state, &alice, "clip").await;

  let (status, playlist) = send(
    &state,
    Method::POST,
    "/playlists",
    Some(&alice),
    Some(json!({ "name": "faves" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let playlist_id = playlist["playlist_id"].as_str().unwrap().to_owned();
  let entry = format!("/playlists/{playlist_id}/videos/{video}");

  let (status, body) = send(&state, Method::POST, &entry, Some(&alice), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["videos"], json!([video]));

  let (status, body) = send(&state, Method::POST, &entry, Some(&alice), None).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(error_kind(&body), "already_exists");

  let (_, detail) =
    send(&state, Method::GET, &format!("/playlists/{playlist_id}"), None, None).await;
  assert_eq!(detail["name"], "faves");
  assert_eq!(detail["entries"][0]["title"], "clip");

  let ghost = format!("/playlists/{playlist_id}/videos/{}", Uuid::new_v4());
  let (status, _) = send(&state, Method::POST, &ghost, Some(&alice), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  for _ in 0..2 {
    let (status, body) = send(&state, Method::DELETE, &entry, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["videos"], json!([]));
  }
}

#[tokio::test]
async fn dashboard_stats_count_likes_from_edges() {
  let state = make_state().await;
  let owner = register(&state, "owner").await;
  let fan = register(&state, "fan").await;
  let video = publish(&state, &owner, "clip").await;

  send(&state, Method::GET, &format!("/videos/{video}"), None, None).await;
  send(&state, Method::POST, &format!("/videos/{video}/like"), Some(&fan), None).await;
  send(&state, Method::POST, &format!("/channels/{owner}/subscribe"), Some(&fan), None).await;

  let (status, stats) =
    send(&state, Method::GET, &format!("/channels/{owner}/stats"), None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    stats,
    json!({
      "total_videos":      1,
      "total_views":       1,
      "total_subscribers": 1,
      "total_likes":       1,
    })
  );

  let (status, _) = send(
    &state,
    Method::GET,
    &format!("/channels/{}/stats", Uuid::new_v4()),
    None,
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Malformed requests ──────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_query_uses_error_envelope() {
  let state = make_state().await;
  let (status, body) = send(&state, Method::GET, "/videos?page=abc", None, None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_kind(&body), "invalid_argument");
  assert!(body["error"]["message"].as_str().unwrap().contains("page"));
}

#[tokio::test]
async fn malformed_bodies_use_error_envelope() {
  let state = make_state().await;
  let alice = register(&state, "alice").await;

  let (status, body) = send_raw(
    &state,
    Method::POST,
    "/tweets",
    Some(&alice),
    Some("application/json"),
    Body::from("{not json"),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_kind(&body), "invalid_argument");

  let (status, body) = send_raw(
    &state,
    Method::POST,
    "/tweets",
    Some(&alice),
    None,
    Body::from(r#"{"content":"hi"}"#),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_kind(&body), "invalid_argument");

  let (status, body) = send(
    &state,
    Method::POST,
    "/videos",
    Some(&alice),
    Some(json!({
      "title":         "clip",
      "description":   "d",
      "video_url":     "https://cdn.example.com/v.mp4",
      "thumbnail_url": "https://cdn.example.com/v.jpg",
      "duration_secs": "long",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_kind(&body), "invalid_argument");
  assert!(body["error"]["message"].as_str().unwrap().contains("duration_secs"));
}
