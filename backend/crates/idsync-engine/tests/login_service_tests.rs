//! Login flow against an in-memory store and a scripted registry

use idsync_core::{AuthResponse, FixedClock, Member};
use idsync_engine::attribute_names::{DOMAIN, PICTURE, PROFILE_HASH, ROLES, group_email};
use idsync_engine::{LoginError, LoginService, SyncSettings, SyncStatus};
use idsync_registry::{AuthFailure, RegistryApi, RegistryError};
use idsync_store::{IdentityStore, MemoryStore};

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use googletest::prelude::*;
use serde_json::json;

const MEMBER_NO: i64 = 3169207;
const USERNAME: &str = "registry|3169207";

struct FakeRegistry {
    auth: std::result::Result<AuthResponse, AuthFailure>,
    profile: String,
    roles: Option<String>,
    roles_unavailable: bool,
    image: Option<Vec<u8>>,
    identifiers: Mutex<Vec<String>>,
}

impl FakeRegistry {
    fn new() -> Self {
        Self {
            auth: Ok(AuthResponse {
                token: Some("token-1".to_string()),
                member: Some(Member {
                    member_no: MEMBER_NO,
                    ..Member::default()
                }),
            }),
            profile: json!({
                "member_no": MEMBER_NO,
                "first_name": "Anna",
                "last_name": "Öberg",
                "last_login": "2026-10-18 07:00:00",
                "memberships": {
                    "group": {
                        "1001": {"is_primary": true, "group": {"name": "Forest Scouts", "group_no": 1001}}
                    }
                }
            })
            .to_string(),
            roles: Some(json!({"troop": {"5501": {"12": "leader"}}}).to_string()),
            roles_unavailable: false,
            image: None,
            identifiers: Mutex::new(Vec::new()),
        }
    }

    fn identifiers(&self) -> Vec<String> {
        self.identifiers.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegistryApi for FakeRegistry {
    async fn authenticate(
        &self,
        identifier: &str,
        _secret: &str,
    ) -> std::result::Result<AuthResponse, AuthFailure> {
        self.identifiers.lock().unwrap().push(identifier.to_string());
        self.auth.clone()
    }

    async fn fetch_profile(&self, _token: &str) -> idsync_registry::Result<String> {
        Ok(self.profile.clone())
    }

    async fn fetch_roles(&self, _token: &str) -> idsync_registry::Result<Option<String>> {
        if self.roles_unavailable {
            return Err(RegistryError::status(503, "roles backend down"));
        }
        Ok(self.roles.clone())
    }

    async fn fetch_image(&self, _token: &str) -> idsync_registry::Result<Option<Vec<u8>>> {
        Ok(self.image.clone())
    }
}

fn settings() -> SyncSettings {
    SyncSettings {
        format_version: "test-1".to_string(),
        ..SyncSettings::default()
    }
}

fn service(registry: &Arc<FakeRegistry>, store: &MemoryStore, settings: SyncSettings) -> LoginService {
    let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
    LoginService::new(
        registry.clone(),
        Arc::new(store.clone()),
        Arc::new(FixedClock(today)),
        settings,
    )
}

async fn user_attribute(store: &MemoryStore, name: &str) -> Vec<String> {
    let user = store.find_user_by_username(USERNAME).await.unwrap().unwrap();
    store.get_user_attribute(user.id, name).await.unwrap()
}

async fn user_subgroups(store: &MemoryStore) -> Vec<String> {
    let user = store.find_user_by_username(USERNAME).await.unwrap().unwrap();
    let mut names: Vec<String> = store
        .list_user_groups(user.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|group| group.parent_id.is_some())
        .map(|group| group.name)
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn given_valid_credentials_when_first_login_then_user_created_and_synced() {
    // Given
    let registry = Arc::new(FakeRegistry::new());
    let store = MemoryStore::new();

    // When
    let outcome = service(&registry, &store, settings())
        .login("anna@example.org", "secret")
        .await
        .unwrap();

    // Then
    assert_that!(outcome.username, eq(USERNAME));
    assert_that!(outcome.member_no, eq(MEMBER_NO));
    assert_that!(outcome.correlation_id.len(), eq(8));
    assert!(matches!(outcome.sync, SyncStatus::Updated { .. }));
    assert_eq!(user_attribute(&store, ROLES).await, vec![
        "*:*:leader",
        "troop:*:*",
        "troop:*:leader",
        "troop:5501:*",
        "troop:5501:leader",
    ]);
    assert_that!(user_attribute(&store, PROFILE_HASH).await.len(), eq(1));
}

#[tokio::test]
async fn given_synced_user_when_logging_in_again_then_sync_unchanged() {
    // Given
    let registry = Arc::new(FakeRegistry::new());
    let store = MemoryStore::new();
    let service = service(&registry, &store, settings());
    service.login("anna@example.org", "secret").await.unwrap();
    let writes_before = store.write_count();

    // When
    let outcome = service.login("anna@example.org", "secret").await.unwrap();

    // Then
    assert_eq!(outcome.sync, SyncStatus::Unchanged);
    assert_that!(store.write_count(), eq(writes_before));
}

#[tokio::test]
async fn given_short_national_id_when_logging_in_then_normalized_before_authentication() {
    // Given
    let registry = Arc::new(FakeRegistry::new());
    let store = MemoryStore::new();

    // When
    service(&registry, &store, settings())
        .login("900101-1234", "secret")
        .await
        .unwrap();

    // Then
    assert_eq!(registry.identifiers(), vec!["199001011234"]);
}

#[tokio::test]
async fn given_blank_identifier_when_logging_in_then_missing_credentials_without_registry_call() {
    // Given
    let registry = Arc::new(FakeRegistry::new());
    let store = MemoryStore::new();

    // When
    let result = service(&registry, &store, settings()).login("  ", "secret").await;

    // Then
    let error = result.unwrap_err();
    assert!(matches!(error, LoginError::MissingCredentials { .. }));
    assert!(registry.identifiers().is_empty());
}

#[tokio::test]
async fn given_wrong_password_when_logging_in_then_invalid_credentials() {
    // Given
    let registry = Arc::new(FakeRegistry {
        auth: Err(AuthFailure::InvalidCredentials),
        ..FakeRegistry::new()
    });
    let store = MemoryStore::new();

    // When
    let error = service(&registry, &store, settings())
        .login("anna@example.org", "wrong")
        .await
        .unwrap_err();

    // Then
    assert!(matches!(error, LoginError::InvalidCredentials { .. }));
    assert_that!(error.message_key(), eq("registry.auth.invalid.credentials"));
    assert!(store.find_user_by_username(USERNAME).await.unwrap().is_none());
}

#[tokio::test]
async fn given_registry_down_when_logging_in_then_service_unavailable() {
    // Given
    let registry = Arc::new(FakeRegistry {
        auth: Err(AuthFailure::ServiceUnavailable),
        ..FakeRegistry::new()
    });
    let store = MemoryStore::new();

    // When
    let error = service(&registry, &store, settings())
        .login("anna@example.org", "secret")
        .await
        .unwrap_err();

    // Then
    assert!(matches!(error, LoginError::ServiceUnavailable { .. }));
    assert_that!(error.message_key(), eq("registry.auth.service.unavailable"));
}

#[tokio::test]
async fn given_reply_without_token_when_logging_in_then_service_unavailable() {
    // Given
    let registry = Arc::new(FakeRegistry {
        auth: Ok(AuthResponse {
            token: Some(String::new()),
            member: None,
        }),
        ..FakeRegistry::new()
    });
    let store = MemoryStore::new();

    // When
    let error = service(&registry, &store, settings())
        .login("anna@example.org", "secret")
        .await
        .unwrap_err();

    // Then
    assert!(matches!(error, LoginError::ServiceUnavailable { .. }));
}

#[tokio::test]
async fn given_malformed_profile_when_logging_in_then_login_fails() {
    // Given
    let registry = Arc::new(FakeRegistry {
        profile: "<html>maintenance</html>".to_string(),
        ..FakeRegistry::new()
    });
    let store = MemoryStore::new();

    // When
    let error = service(&registry, &store, settings())
        .login("anna@example.org", "secret")
        .await
        .unwrap_err();

    // Then
    assert!(matches!(error, LoginError::ProfileParse { .. }));
}

#[tokio::test]
async fn given_roles_unavailable_when_logging_in_then_memberships_still_synced() {
    // Given
    let registry = Arc::new(FakeRegistry {
        roles_unavailable: true,
        ..FakeRegistry::new()
    });
    let store = MemoryStore::new();

    // When
    let outcome = service(&registry, &store, settings())
        .login("anna@example.org", "secret")
        .await
        .unwrap();

    // Then
    let SyncStatus::Updated { report } = outcome.sync else {
        panic!("expected an update");
    };
    assert_eq!(report.joined, vec!["registry", "1001"]);
    assert!(user_attribute(&store, ROLES).await.is_empty());
}

#[tokio::test]
async fn given_malformed_roles_after_synced_login_when_logging_in_then_role_groups_kept() {
    for payload in ["null", r#""x""#, "42", r#"{"organisation":"oops"}"#, r#"{"troop":7}"#] {
        // Given
        let store = MemoryStore::new();
        let good = Arc::new(FakeRegistry::new());
        service(&good, &store, settings())
            .login("anna@example.org", "secret")
            .await
            .unwrap();
        let roles_before = user_attribute(&store, ROLES).await;
        let malformed = Arc::new(FakeRegistry {
            roles: Some(payload.to_string()),
            ..FakeRegistry::new()
        });

        // When
        let outcome = service(&malformed, &store, settings())
            .login("anna@example.org", "secret")
            .await
            .unwrap();

        // Then
        let SyncStatus::Updated { report } = outcome.sync else {
            panic!("expected an update for {payload}");
        };
        assert!(report.left.is_empty(), "left groups for {payload}");
        assert_eq!(user_subgroups(&store).await, vec!["1001", "5501"], "{payload}");
        assert_eq!(user_attribute(&store, ROLES).await, roles_before, "{payload}");
    }
}

#[tokio::test]
async fn given_roles_unavailable_after_synced_login_when_logging_in_then_role_groups_kept() {
    // Given
    let store = MemoryStore::new();
    let good = Arc::new(FakeRegistry::new());
    service(&good, &store, settings())
        .login("anna@example.org", "secret")
        .await
        .unwrap();
    let down = Arc::new(FakeRegistry {
        roles_unavailable: true,
        ..FakeRegistry::new()
    });

    // When
    service(&down, &store, settings())
        .login("anna@example.org", "secret")
        .await
        .unwrap();

    // Then
    assert_eq!(user_subgroups(&store).await, vec!["1001", "5501"]);
}

#[tokio::test]
async fn given_roles_disabled_after_synced_login_when_logging_in_then_role_groups_left() {
    // Given
    let store = MemoryStore::new();
    let registry = Arc::new(FakeRegistry::new());
    service(&registry, &store, settings())
        .login("anna@example.org", "secret")
        .await
        .unwrap();
    let settings = SyncSettings {
        fetch_roles: false,
        ..settings()
    };

    // When
    service(&registry, &store, settings)
        .login("anna@example.org", "secret")
        .await
        .unwrap();

    // Then
    assert_eq!(user_subgroups(&store).await, vec!["1001"]);
}

#[tokio::test]
async fn given_oversized_image_when_logging_in_then_image_dropped() {
    // Given
    let mut settings = settings();
    settings.fetch_image = true;
    settings.max_image_bytes = 4;
    let registry = Arc::new(FakeRegistry {
        image: Some(vec![0xff; 5]),
        ..FakeRegistry::new()
    });
    let store = MemoryStore::new();

    // When
    service(&registry, &store, settings)
        .login("anna@example.org", "secret")
        .await
        .unwrap();

    // Then
    assert!(user_attribute(&store, PICTURE).await.is_empty());
}

#[tokio::test]
async fn given_sync_failure_when_logging_in_then_login_succeeds_with_failed_status() {
    // Given
    let registry = Arc::new(FakeRegistry::new());
    let store = MemoryStore::new();
    let parent = store.create_group("registry", None).await.unwrap();
    let group = store.create_group("1001", Some(parent.id)).await.unwrap();
    store
        .set_group_attribute(group.id, DOMAIN, &["scouts.se".to_string()])
        .await
        .unwrap();
    let other = store.create_user("registry|1").await.unwrap();
    store
        .claim_unique_user_attribute(other.id, &group_email("1001"), "anna.oberg@scouts.se")
        .await
        .unwrap();
    let settings = SyncSettings {
        max_alias_attempts: 1,
        ..settings()
    };

    // When
    let outcome = service(&registry, &store, settings)
        .login("anna@example.org", "secret")
        .await
        .unwrap();

    // Then
    assert!(matches!(outcome.sync, SyncStatus::Failed { .. }));
    assert!(user_attribute(&store, PROFILE_HASH).await.is_empty());
}
