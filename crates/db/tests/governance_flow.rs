//! End-to-end governance flow tests against a live PostgreSQL database.
//!
//! Set `TEST_DATABASE_URL` to run these; without it each test returns
//! early (environments without Postgres still get a green suite). The
//! pure state-machine and geometry logic is covered by unit tests in
//! `atrium-core`.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use atrium_core::status::{area_status, permission_status, version_status};
use atrium_db::models::apply::CreateApply;
use atrium_db::models::layout::CreateVersion;
use atrium_db::models::permission::CreatePermission;
use atrium_db::repositories::apply_repo::{ApproveOutcome, RejectOutcome, SubmitOutcome};
use atrium_db::repositories::layout_repo::{DraftOutcome, PublishOutcome};
use atrium_db::repositories::permission_repo::RevokeOutcome;
use atrium_db::repositories::{ApplyRepo, AreaRepo, LayoutVersionRepo, PermissionRepo};

const ADMIN_ID: i64 = 1;
const MERCHANT_A: i64 = 101;
const MERCHANT_B: i64 = 102;

/// Connect and migrate, or `None` when no test database is configured.
async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = atrium_db::create_pool(&url)
        .await
        .expect("failed to connect to TEST_DATABASE_URL");
    atrium_db::run_migrations(&pool)
        .await
        .expect("failed to run migrations");
    Some(pool)
}

/// Seed a mall, one floor, and one LOCKED area; returns (mall_id, area_id).
async fn seed_area(pool: &PgPool) -> (i64, i64) {
    let mall_id: i64 =
        sqlx::query_scalar("INSERT INTO malls (name) VALUES ('test mall') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();
    let floor_id: i64 = sqlx::query_scalar(
        "INSERT INTO floors (mall_id, name, level) VALUES ($1, 'F1', 1) RETURNING id",
    )
    .bind(mall_id)
    .fetch_one(pool)
    .await
    .unwrap();
    let geometry = serde_json::json!({
        "kind": "box",
        "min": {"x": 0.0, "y": 0.0, "z": 0.0},
        "max": {"x": 20.0, "y": 5.0, "z": 20.0},
    });
    let area_id: i64 = sqlx::query_scalar(
        "INSERT INTO areas (floor_id, mall_id, name, geometry) \
         VALUES ($1, $2, 'unit A', $3) RETURNING id",
    )
    .bind(floor_id)
    .bind(mall_id)
    .bind(geometry)
    .fetch_one(pool)
    .await
    .unwrap();
    (mall_id, area_id)
}

fn apply_input(area_id: i64, merchant_id: i64) -> CreateApply {
    CreateApply {
        area_id,
        merchant_id,
        reason: "need retail space".to_string(),
        requested_duration_days: Some(365),
    }
}

async fn area_status_of(pool: &PgPool, area_id: i64) -> String {
    let area = AreaRepo::find_by_id(pool, area_id).await.unwrap().unwrap();
    area.status
}

#[tokio::test]
async fn submit_then_approve_grants_permission() {
    let Some(pool) = test_pool().await else { return };
    let (_, area_id) = seed_area(&pool).await;

    let outcome = ApplyRepo::submit(&pool, &apply_input(area_id, MERCHANT_A))
        .await
        .unwrap();
    let SubmitOutcome::Submitted(apply) = outcome else {
        panic!("submit should succeed, got {outcome:?}");
    };
    assert_eq!(apply.status, "PENDING");
    assert_eq!(area_status_of(&pool, area_id).await, area_status::PENDING);

    let expires = Utc::now() + Duration::days(365);
    let outcome = ApplyRepo::approve(&pool, apply.id, ADMIN_ID, Some("ok"), Some(expires))
        .await
        .unwrap();
    let ApproveOutcome::Approved { apply, permission } = outcome else {
        panic!("approve should succeed, got {outcome:?}");
    };
    assert_eq!(apply.status, "APPROVED");
    assert_eq!(permission.status, permission_status::ACTIVE);
    // timestamptz stores microseconds; compare with a tolerance.
    let stored = permission.expires_at.unwrap();
    assert!((stored - expires).num_milliseconds().abs() < 1000);
    assert_eq!(area_status_of(&pool, area_id).await, area_status::AUTHORIZED);

    assert!(PermissionRepo::check_active(&pool, area_id, MERCHANT_A, Utc::now())
        .await
        .unwrap());
    assert!(!PermissionRepo::check_active(&pool, area_id, MERCHANT_B, Utc::now())
        .await
        .unwrap());
}

#[tokio::test]
async fn second_submit_loses_the_race() {
    let Some(pool) = test_pool().await else { return };
    let (_, area_id) = seed_area(&pool).await;

    let first = ApplyRepo::submit(&pool, &apply_input(area_id, MERCHANT_A))
        .await
        .unwrap();
    assert!(matches!(first, SubmitOutcome::Submitted(_)));

    // The area is now PENDING, so the loser sees an invalid state rather
    // than a duplicate.
    let second = ApplyRepo::submit(&pool, &apply_input(area_id, MERCHANT_B))
        .await
        .unwrap();
    let SubmitOutcome::AreaNotLocked { status } = second else {
        panic!("second submit should observe the area mid-workflow, got {second:?}");
    };
    assert_eq!(status, area_status::PENDING);
}

#[tokio::test]
async fn reject_requires_pending_and_relocks_area() {
    let Some(pool) = test_pool().await else { return };
    let (_, area_id) = seed_area(&pool).await;

    let SubmitOutcome::Submitted(apply) =
        ApplyRepo::submit(&pool, &apply_input(area_id, MERCHANT_A))
            .await
            .unwrap()
    else {
        panic!("submit should succeed");
    };

    let outcome = ApplyRepo::reject(&pool, apply.id, ADMIN_ID, "zone reserved")
        .await
        .unwrap();
    let RejectOutcome::Rejected(rejected) = outcome else {
        panic!("reject should succeed, got {outcome:?}");
    };
    assert_eq!(rejected.status, "REJECTED");
    assert_eq!(area_status_of(&pool, area_id).await, area_status::LOCKED);

    // A rejected application never blocks a fresh submission.
    let again = ApplyRepo::submit(&pool, &apply_input(area_id, MERCHANT_B))
        .await
        .unwrap();
    assert!(matches!(again, SubmitOutcome::Submitted(_)));

    // And resolved applications are immutable: a second decision fails.
    let double = ApplyRepo::reject(&pool, apply.id, ADMIN_ID, "again").await.unwrap();
    assert!(matches!(double, RejectOutcome::NotPending { .. }));
}

#[tokio::test]
async fn revoke_relocks_area_and_area_is_reappliable() {
    let Some(pool) = test_pool().await else { return };
    let (_, area_id) = seed_area(&pool).await;

    let SubmitOutcome::Submitted(apply) =
        ApplyRepo::submit(&pool, &apply_input(area_id, MERCHANT_A))
            .await
            .unwrap()
    else {
        panic!("submit should succeed");
    };
    let ApproveOutcome::Approved { permission, .. } =
        ApplyRepo::approve(&pool, apply.id, ADMIN_ID, None, None)
            .await
            .unwrap()
    else {
        panic!("approve should succeed");
    };

    let outcome =
        PermissionRepo::revoke(&pool, permission.id, ADMIN_ID, "policy violation", None)
            .await
            .unwrap();
    let RevokeOutcome::Revoked(revoked) = outcome else {
        panic!("revoke should succeed, got {outcome:?}");
    };
    assert_eq!(revoked.status, permission_status::REVOKED);
    assert_eq!(revoked.revoke_reason.as_deref(), Some("policy violation"));
    assert_eq!(area_status_of(&pool, area_id).await, area_status::LOCKED);

    // Revoked permissions are terminal.
    let again = PermissionRepo::revoke(&pool, permission.id, ADMIN_ID, "again", None)
        .await
        .unwrap();
    assert!(matches!(again, RevokeOutcome::NotActive { .. }));

    // The area accepts a fresh application.
    let resubmit = ApplyRepo::submit(&pool, &apply_input(area_id, MERCHANT_B))
        .await
        .unwrap();
    assert!(matches!(resubmit, SubmitOutcome::Submitted(_)));
}

#[tokio::test]
async fn revoke_with_stale_version_conflicts() {
    let Some(pool) = test_pool().await else { return };
    let (_, area_id) = seed_area(&pool).await;

    let SubmitOutcome::Submitted(apply) =
        ApplyRepo::submit(&pool, &apply_input(area_id, MERCHANT_A))
            .await
            .unwrap()
    else {
        panic!("submit should succeed");
    };
    let ApproveOutcome::Approved { permission, .. } =
        ApplyRepo::approve(&pool, apply.id, ADMIN_ID, None, None)
            .await
            .unwrap()
    else {
        panic!("approve should succeed");
    };

    let stale = permission.version + 1;
    let outcome = PermissionRepo::revoke(&pool, permission.id, ADMIN_ID, "stale", Some(stale))
        .await
        .unwrap();
    let RevokeOutcome::VersionConflict { actual } = outcome else {
        panic!("stale revoke should conflict, got {outcome:?}");
    };
    assert_eq!(actual, permission.version);

    // The permission is untouched by the failed attempt.
    let reloaded = PermissionRepo::find_by_id(&pool, permission.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.status, permission_status::ACTIVE);
}

#[tokio::test]
async fn unique_index_rejects_second_active_permission() {
    let Some(pool) = test_pool().await else { return };
    let (_, area_id) = seed_area(&pool).await;

    let input = CreatePermission {
        area_id,
        merchant_id: MERCHANT_A,
        grant_type: "ADMIN_APPROVAL".to_string(),
        granted_by: ADMIN_ID,
        expires_at: None,
    };
    assert!(matches!(
        PermissionRepo::grant(&pool, &input).await.unwrap(),
        atrium_db::repositories::permission_repo::GrantOutcome::Granted(_)
    ));

    // Bypass the repository checks; the partial unique index must hold
    // the line on its own.
    let err = sqlx::query(
        "INSERT INTO area_permissions (area_id, merchant_id, granted_by) VALUES ($1, $2, $3)",
    )
    .bind(area_id)
    .bind(MERCHANT_B)
    .bind(ADMIN_ID)
    .execute(&pool)
    .await
    .unwrap_err();

    let sqlx::Error::Database(db_err) = err else {
        panic!("expected a database error");
    };
    assert_eq!(db_err.code().as_deref(), Some("23505"));
    assert_eq!(db_err.constraint(), Some("uq_area_permissions_active"));
}

#[tokio::test]
async fn publish_archives_previous_active_atomically() {
    let Some(pool) = test_pool().await else { return };
    let (mall_id, _) = seed_area(&pool).await;

    let make = |description: &str| CreateVersion {
        mall_id,
        snapshot: serde_json::json!([]),
        description: Some(description.to_string()),
        created_by: ADMIN_ID,
        created_by_role: "ADMIN".to_string(),
    };

    let DraftOutcome::Created(v1) =
        LayoutVersionRepo::create_draft(&pool, &make("first"), &[]).await.unwrap()
    else {
        panic!("draft v1 should be created");
    };
    let DraftOutcome::Created(v2) =
        LayoutVersionRepo::create_draft(&pool, &make("second"), &[]).await.unwrap()
    else {
        panic!("draft v2 should be created");
    };
    assert!(v2.version_number > v1.version_number);

    let PublishOutcome::Published { version, archived_id } =
        LayoutVersionRepo::publish(&pool, v1.id, ADMIN_ID, None).await.unwrap()
    else {
        panic!("publish v1 should succeed");
    };
    assert_eq!(version.status, version_status::ACTIVE);
    assert_eq!(archived_id, None);

    let PublishOutcome::Published { version, archived_id } =
        LayoutVersionRepo::publish(&pool, v2.id, ADMIN_ID, None).await.unwrap()
    else {
        panic!("publish v2 should succeed");
    };
    assert_eq!(version.status, version_status::ACTIVE);
    assert_eq!(archived_id, Some(v1.id));

    // Exactly one ACTIVE version per mall, and getActive resolves it.
    let active_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM layout_versions WHERE mall_id = $1 AND status = 'ACTIVE'",
    )
    .bind(mall_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(active_count, 1);

    let active = LayoutVersionRepo::find_active(&pool, mall_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(active.id, v2.id);
    assert!(active.published_at.is_some());

    // Publishing a non-draft is rejected.
    let again = LayoutVersionRepo::publish(&pool, v1.id, ADMIN_ID, None).await.unwrap();
    assert!(matches!(again, PublishOutcome::NotDraft { .. }));
}

#[tokio::test]
async fn expired_permissions_are_swept_and_lazily_inactive() {
    let Some(pool) = test_pool().await else { return };
    let (_, area_id) = seed_area(&pool).await;

    let input = CreatePermission {
        area_id,
        merchant_id: MERCHANT_A,
        grant_type: "ADMIN_APPROVAL".to_string(),
        granted_by: ADMIN_ID,
        expires_at: Some(Utc::now() - Duration::minutes(5)),
    };
    let atrium_db::repositories::permission_repo::GrantOutcome::Granted(permission) =
        PermissionRepo::grant(&pool, &input).await.unwrap()
    else {
        panic!("grant should succeed");
    };

    // Lazy expiry: the stored row still says ACTIVE, but the check
    // already answers false.
    assert!(!PermissionRepo::check_active(&pool, area_id, MERCHANT_A, Utc::now())
        .await
        .unwrap());

    let swept = PermissionRepo::expire_elapsed(&pool, Utc::now()).await.unwrap();
    assert!(swept >= 1);

    let reloaded = PermissionRepo::find_by_id(&pool, permission.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.status, permission_status::EXPIRED);
    assert_eq!(area_status_of(&pool, area_id).await, area_status::LOCKED);
}

#[tokio::test]
async fn occupied_area_blocks_submission() {
    let Some(pool) = test_pool().await else { return };
    let (_, area_id) = seed_area(&pool).await;

    let SubmitOutcome::Submitted(apply) =
        ApplyRepo::submit(&pool, &apply_input(area_id, MERCHANT_A))
            .await
            .unwrap()
    else {
        panic!("submit should succeed");
    };
    assert!(matches!(
        ApplyRepo::approve(&pool, apply.id, ADMIN_ID, None, None).await.unwrap(),
        ApproveOutcome::Approved { .. }
    ));

    // A store moves in: structural tooling flips the area to OCCUPIED.
    assert!(AreaRepo::set_status_checked(
        &pool,
        area_id,
        area_status::AUTHORIZED,
        area_status::OCCUPIED
    )
    .await
    .unwrap());

    // The checked setter refuses a transition from the wrong predecessor.
    assert!(!AreaRepo::set_status_checked(
        &pool,
        area_id,
        area_status::AUTHORIZED,
        area_status::OCCUPIED
    )
    .await
    .unwrap());

    let outcome = ApplyRepo::submit(&pool, &apply_input(area_id, MERCHANT_B))
        .await
        .unwrap();
    assert!(matches!(outcome, SubmitOutcome::AreaNotLocked { .. }));
}

#[tokio::test]
async fn governance_mutations_leave_an_audit_trail() {
    let Some(pool) = test_pool().await else { return };
    let (_, area_id) = seed_area(&pool).await;

    let SubmitOutcome::Submitted(apply) =
        ApplyRepo::submit(&pool, &apply_input(area_id, MERCHANT_A))
            .await
            .unwrap()
    else {
        panic!("submit should succeed");
    };

    let entries: Vec<(String, Option<String>)> = sqlx::query_as(
        "SELECT action, integrity_hash FROM audit_logs \
         WHERE entity_type = 'area_apply' AND entity_id = $1",
    )
    .bind(apply.id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, "apply_submit");
    assert_eq!(entries[0].1.as_ref().map(|h| h.len()), Some(64));

    // The trail is append-only at the storage level.
    let err = sqlx::query("DELETE FROM audit_logs WHERE entity_id = $1")
        .bind(apply.id)
        .execute(&pool)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("append-only"));
}
