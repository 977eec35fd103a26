//! JSON REST API for Ruty.
//!
//! Exposes an axum [`Router`] backed by any [`ruty_core::store::HabitStore`].
//! Every handler expects a [`ruty_core::session::Session`] request extension;
//! inserting it (token checks, TLS, transport) is the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(ruty_api::api_router(store.clone()).layer(auth_layer))
//! ```

pub mod achievements;
pub mod characters;
pub mod error;
pub mod habits;
pub mod instances;
pub mod stats;
pub mod sync;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use ruty_core::store::HabitStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: HabitStore + 'static,
{
  Router::new()
    // Habits
    .route("/habits", get(habits::list::<S>).post(habits::create::<S>))
    .route("/habits/{id}", get(habits::get_one::<S>).patch(habits::update::<S>))
    // Instances
    .route("/habits/{id}/check", post(instances::check::<S>))
    .route("/habits/{id}/instances", get(instances::list::<S>))
    .route("/instances/{id}", get(instances::get_one::<S>))
    // Statistics
    .route("/habits/{id}/stats", get(stats::habit::<S>))
    .route("/stats", get(stats::all::<S>))
    // Character and achievements
    .route(
      "/characters",
      get(characters::get::<S>)
        .post(characters::create::<S>)
        .patch(characters::update::<S>),
    )
    .route("/achievements", get(achievements::list::<S>))
    .route("/achievements/unlock", post(achievements::unlock::<S>))
    // Sync
    .route("/sync/down", get(sync::down::<S>))
    .route("/sync/up", post(sync::up::<S>))
    .with_state(store)
}

// ─── Router tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    Extension,
    body::Body,
    http::{Request, StatusCode, header},
  };
  use ruty_core::{session::Session, user::NewUser};
  use ruty_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::*;

  struct Harness {
    store:   Arc<SqliteStore>,
    session: Session,
  }

  impl Harness {
    async fn new() -> Self {
      let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
      let session = signed_in(&store, "tester@example.com").await;
      Self { store, session }
    }

    fn app(&self, session: &Session) -> Router {
      api_router(self.store.clone()).layer(Extension(session.clone()))
    }

    async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
      self.call_as(&self.session, method, uri, body).await
    }

    async fn call_as(
      &self,
      session: &Session,
      method: &str,
      uri: &str,
      body: Option<Value>,
    ) -> (StatusCode, Value) {
      let builder = Request::builder().method(method).uri(uri);
      let req = match body {
        Some(v) => builder
          .header(header::CONTENT_TYPE, "application/json")
          .body(Body::from(v.to_string())),
        None => builder.body(Body::empty()),
      }
      .unwrap();

      let resp = self.app(session).oneshot(req).await.unwrap();
      let status = resp.status();
      let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
      let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
      (status, value)
    }

    async fn habit(&self, title: &str, difficulty: u8) -> String {
      let (status, body) = self
        .call("POST", "/habits", Some(json!({ "title": title, "difficulty": difficulty })))
        .await;
      assert_eq!(status, StatusCode::CREATED, "{body}");
      body["id"].as_str().unwrap().to_owned()
    }
  }

  async fn signed_in(store: &SqliteStore, email: &str) -> Session {
    let user = store
      .create_user(NewUser {
        email:         email.into(),
        password_hash: "unused".into(),
        display_name:  None,
      })
      .await
      .unwrap()
      .unwrap();
    Session { user_id: user.id, email: user.email }
  }

  // ── Habits ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_and_fetch_habit() {
    let h = Harness::new().await;
    let id = h.habit("Read", 2).await;

    let (status, body) = h.call("GET", &format!("/habits/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Read");
    assert_eq!(body["schedule"]["recurrence"], "daily");

    let (_, list) = h.call("GET", "/habits", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn invalid_habits_are_rejected() {
    let h = Harness::new().await;
    let (status, body) = h.call("POST", "/habits", Some(json!({ "title": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("title"));

    let monthly = json!({ "title": "Rent", "schedule": { "recurrence": "monthly", "days_of_month": [] } });
    let (status, _) = h.call("POST", "/habits", Some(monthly)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn list_filters_by_due_date() {
    let h = Harness::new().await;
    let weekends = json!({
      "title": "Hike",
      "schedule": { "recurrence": "daily", "days_of_week": [0, 6] }
    });
    h.call("POST", "/habits", Some(weekends)).await;
    h.habit("Every day", 1).await;

    // 2024-03-14 is a Thursday, 2024-03-16 a Saturday.
    let (_, thursday) = h.call("GET", "/habits?date=2024-03-14", None).await;
    assert_eq!(thursday.as_array().unwrap().len(), 1);
    let (_, saturday) = h.call("GET", "/habits?date=2024-03-16", None).await;
    assert_eq!(saturday.as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn soft_deleted_habit_is_gone() {
    let h = Harness::new().await;
    let id = h.habit("Nap", 1).await;

    let (status, body) =
      h.call("PATCH", &format!("/habits/{id}"), Some(json!({ "is_deleted": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_deleted"], true);

    let (status, _) = h.call("GET", &format!("/habits/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = h.call("POST", &format!("/habits/{id}/check"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, list) = h.call("GET", "/habits", None).await;
    assert!(list.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn foreign_habit_is_not_found() {
    let h = Harness::new().await;
    let id = h.habit("Private", 1).await;
    let other = signed_in(&h.store, "other@example.com").await;

    let (status, _) = h.call_as(&other, "GET", &format!("/habits/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = h.call_as(&other, "GET", &format!("/habits/{id}/stats"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Check-ins and instances ────────────────────────────────────────────────

  #[tokio::test]
  async fn check_awards_xp_once() {
    let h = Harness::new().await;
    h.call("POST", "/characters", Some(json!({ "type": "dog" }))).await;
    let id = h.habit("Run", 3).await;
    let check = json!({ "date": "2024-01-01" });

    let (status, first) = h.call("POST", &format!("/habits/{id}/check"), Some(check.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["instance"]["completed"], true);
    assert_eq!(first["character"]["total_xp"], 30);
    assert_eq!(first["character"]["happiness"], 55);

    let (_, second) = h.call("POST", &format!("/habits/{id}/check"), Some(check)).await;
    assert_eq!(second["character"]["total_xp"], 30);
    assert_eq!(second["instance"]["id"], first["instance"]["id"]);

    let instance_id = first["instance"]["id"].as_str().unwrap();
    let (status, one) = h.call("GET", &format!("/instances/{instance_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(one["date"], "2024-01-01");
  }

  #[tokio::test]
  async fn inverted_instance_range_is_bad_request() {
    let h = Harness::new().await;
    let id = h.habit("Swim", 2).await;
    let uri = format!("/habits/{id}/instances?from=2024-02-01&to=2024-01-01");
    let (status, _) = h.call("GET", &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/habits/{id}/instances?from=2024-01-01&to=2024-02-01");
    let (status, body) = h.call("GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn unknown_instance_is_not_found() {
    let h = Harness::new().await;
    let (status, body) = h.call("GET", &format!("/instances/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
  }

  // ── Statistics ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn habit_stats_report() {
    let h = Harness::new().await;
    let id = h.habit("Write", 1).await;
    for date in ["2024-03-12", "2024-03-13", "2024-03-14"] {
      h.call("POST", &format!("/habits/{id}/check"), Some(json!({ "date": date }))).await;
    }

    let (status, body) = h.call("GET", &format!("/habits/{id}/stats?date=2024-03-15"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentStreak"], 3);
    assert_eq!(body["streakStatus"], "missed_yesterday");
    assert_eq!(body["weekly"]["completed"], 3);
    assert_eq!(body["weekly"]["rate"], 42.86);
    assert_eq!(body["instances"].as_array().unwrap().len(), 3);
  }

  #[tokio::test]
  async fn overall_stats_with_no_habits() {
    let h = Harness::new().await;
    let (status, body) = h.call("GET", "/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalHabits"], 0);
    assert_eq!(body["overallDailyRate"], 0.0);
    assert_eq!(body["averageStreak"], 0.0);
  }

  #[tokio::test]
  async fn overall_stats_use_strict_streaks() {
    let h = Harness::new().await;
    let a = h.habit("A", 1).await;
    let b = h.habit("B", 1).await;
    for date in ["2024-03-13", "2024-03-14"] {
      h.call("POST", &format!("/habits/{a}/check"), Some(json!({ "date": date }))).await;
    }
    h.call("POST", &format!("/habits/{b}/check"), Some(json!({ "date": "2024-03-13" }))).await;

    let (_, body) = h.call("GET", "/stats?date=2024-03-14", None).await;
    assert_eq!(body["totalHabits"], 2);
    assert_eq!(body["overallDailyRate"], 50.0);
    assert_eq!(body["averageStreak"], 1.0);
  }

  // ── Characters ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn character_lifecycle() {
    let h = Harness::new().await;
    let (status, _) = h.call("GET", "/characters", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = h.call("POST", "/characters", Some(json!({ "type": "dragon" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) =
      h.call("POST", "/characters", Some(json!({ "type": "fox", "custom_name": " Rue " }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["type"], "fox");
    assert_eq!(body["custom_name"], "Rue");

    let (status, _) = h.call("POST", "/characters", Some(json!({ "type": "cat" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = h.call("PATCH", "/characters", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = h.call("PATCH", "/characters", Some(json!({ "energy": -20 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["energy"], 0);
  }

  // ── Achievements ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unlock_twice() {
    let h = Harness::new().await;
    let body = json!({ "type": "first_check" });

    let (status, first) = h.call("POST", "/achievements/unlock", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["unlocked"], true);

    let (status, again) = h.call("POST", "/achievements/unlock", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["message"], "achievement already unlocked");

    let (_, list) = h.call("GET", "/achievements", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
  }

  // ── Sync ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn sync_round_trip() {
    let h = Harness::new().await;
    let id = h.habit("Synced", 2).await;

    let (status, down) = h.call("GET", "/sync/down", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(down["habits"].as_array().unwrap().len(), 1);
    assert!(down["server_time"].is_string());

    let mut habit = down["habits"][0].clone();
    habit["title"] = json!("Edited offline");
    habit["updated_at"] = json!("2099-01-01T00:00:00Z");
    let (status, report) =
      h.call("POST", "/sync/up", Some(json!({ "habits": [habit], "habit_instances": [] }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["habits_applied"], 1);

    let (_, fetched) = h.call("GET", &format!("/habits/{id}"), None).await;
    assert_eq!(fetched["title"], "Edited offline");

    let since = "2100-01-01T00:00:00Z";
    let (_, later) = h.call("GET", &format!("/sync/down?since={since}"), None).await;
    assert!(later["habits"].as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn sync_up_rejects_blank_titles() {
    let h = Harness::new().await;
    h.habit("Named", 1).await;
    let (_, down) = h.call("GET", "/sync/down", None).await;

    let mut habit = down["habits"][0].clone();
    habit["title"] = json!("  ");
    habit["updated_at"] = json!("2099-01-01T00:00:00Z");
    let (status, body) =
      h.call("POST", "/sync/up", Some(json!({ "habits": [habit], "habit_instances": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("title"));
  }

  #[tokio::test]
  async fn sync_down_rejects_malformed_since() {
    let h = Harness::new().await;
    // An unencoded `+` decodes to a space.
    let (status, body) =
      h.call("GET", "/sync/down?since=2024-01-01T00:00:00+02:00", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) =
      h.call("GET", "/sync/down?since=2024-01-01T00:00:00%2B02:00", None).await;
    assert_eq!(status, StatusCode::OK);
  }
}
