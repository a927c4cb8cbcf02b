//! RBAC middleware in front of a recording inner service.

mod support;

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use http::{Request, Response};
use tonic::body::{empty_body, BoxBody};
use tower::{service_fn, Layer, ServiceExt};
use uuid::Uuid;

use auth_service_lib::rbac::{operations, PermissionTable, RbacInterceptor, RbacLayer};
use auth_service_lib::service::TokenEngine;
use domain::Role;
use support::{roles, token_engine};

/// Outcome of one call through the layer.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Forwarded,
    Rejected(String),
}

struct Harness {
    layer: RbacLayer,
    tokens: Arc<TokenEngine>,
}

impl Harness {
    fn new(permissions: PermissionTable) -> Self {
        let tokens = token_engine();
        let layer = RbacLayer::new(RbacInterceptor::new(Arc::clone(&tokens), permissions))
            .allow_public([operations::REGISTER_USER, operations::LOGIN_USER]);
        Self { layer, tokens }
    }

    fn standard() -> Self {
        Self::new(PermissionTable::standard())
    }

    fn token(&self, granted: &[Role]) -> String {
        self.tokens.issue(Uuid::new_v4(), &roles(granted)).unwrap()
    }

    async fn call(&self, operation: &str, authorization: Option<&str>) -> Outcome {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let inner = service_fn(move |_req: Request<()>| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<Response<BoxBody>, Infallible>(Response::new(empty_body())) }
        });

        let mut request = Request::builder().uri(format!("/auth.AuthService/{}", operation));
        if let Some(value) = authorization {
            request = request.header("authorization", value);
        }

        let response = self
            .layer
            .layer(inner)
            .oneshot(request.body(()).unwrap())
            .await
            .unwrap();

        match response.headers().get("grpc-status") {
            Some(code) => {
                assert_eq!(hits.load(Ordering::SeqCst), 0, "rejected call reached the handler");
                Outcome::Rejected(code.to_str().unwrap().to_string())
            }
            None => {
                assert_eq!(hits.load(Ordering::SeqCst), 1);
                Outcome::Forwarded
            }
        }
    }
}

const UNAUTHENTICATED: &str = "16";
const PERMISSION_DENIED: &str = "7";

fn rejected(code: &str) -> Outcome {
    Outcome::Rejected(code.to_string())
}

#[tokio::test]
async fn test_public_operations_need_no_token() {
    let harness = Harness::standard();

    assert_eq!(harness.call("RegisterUser", None).await, Outcome::Forwarded);
    assert_eq!(harness.call("LoginUser", Some("garbage")).await, Outcome::Forwarded);
}

#[tokio::test]
async fn test_missing_token_is_unauthenticated() {
    let harness = Harness::standard();

    assert_eq!(harness.call("GetUserData", None).await, rejected(UNAUTHENTICATED));
    assert_eq!(harness.call("GetUserData", Some("")).await, rejected(UNAUTHENTICATED));
}

#[tokio::test]
async fn test_invalid_token_is_unauthenticated() {
    let harness = Harness::standard();

    assert_eq!(
        harness.call("GetUserData", Some("Bearer not.a.token")).await,
        rejected(UNAUTHENTICATED)
    );
}

#[tokio::test]
async fn test_expired_token_is_unauthenticated() {
    let harness = Harness::standard();
    let expired = harness
        .tokens
        .issue_at(Uuid::new_v4(), &roles(&[Role::Admin]), Utc::now() - Duration::hours(48))
        .unwrap();

    assert_eq!(
        harness.call("GetUserData", Some(&expired)).await,
        rejected(UNAUTHENTICATED)
    );
}

#[tokio::test]
async fn test_token_from_other_secret_is_unauthenticated() {
    let harness = Harness::standard();
    let foreign = TokenEngine::new(b"some-other-secret-that-is-long-enough", Duration::hours(1))
        .unwrap()
        .issue(Uuid::new_v4(), &roles(&[Role::Admin]))
        .unwrap();

    assert_eq!(
        harness.call("GetUserData", Some(&foreign)).await,
        rejected(UNAUTHENTICATED)
    );
}

#[tokio::test]
async fn test_authorization_key_is_case_insensitive() {
    let harness = Harness::standard();
    let user = harness.token(&[Role::User]);

    let response = harness
        .layer
        .layer(service_fn(|_req: Request<()>| async {
            Ok::<Response<BoxBody>, Infallible>(Response::new(empty_body()))
        }))
        .oneshot(
            Request::builder()
                .uri("/auth.AuthService/GetUserData")
                .header("Authorization", format!("Bearer {}", user))
                .body(())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.headers().get("grpc-status").is_none());
}

#[tokio::test]
async fn test_permitted_role_is_forwarded() {
    let harness = Harness::standard();
    let user = harness.token(&[Role::User]);

    assert_eq!(
        harness.call("GetUserData", Some(&format!("Bearer {}", user))).await,
        Outcome::Forwarded
    );
    assert_eq!(harness.call("GetUserData", Some(&user)).await, Outcome::Forwarded);
}

#[tokio::test]
async fn test_unpermitted_role_is_denied() {
    let harness = Harness::standard();
    let user = harness.token(&[Role::User]);
    let logistics = harness.token(&[Role::Logistics]);

    assert_eq!(harness.call("GrantRole", Some(&user)).await, rejected(PERMISSION_DENIED));
    assert_eq!(
        harness.call("GrantAdminRights", Some(&logistics)).await,
        rejected(PERMISSION_DENIED)
    );
}

#[tokio::test]
async fn test_any_granting_role_suffices() {
    let harness = Harness::standard();
    let mixed = harness.token(&[Role::User, Role::Logistics]);

    assert_eq!(harness.call("CreateRequest", Some(&mixed)).await, Outcome::Forwarded);
}

#[tokio::test]
async fn test_empty_role_set_is_denied() {
    let harness = Harness::standard();
    let nobody = harness.token(&[]);

    assert_eq!(
        harness.call("GetUserData", Some(&nobody)).await,
        rejected(PERMISSION_DENIED)
    );
}

#[tokio::test]
async fn test_unknown_operation_is_denied_to_everyone() {
    let harness = Harness::standard();
    let admin = harness.token(&Role::ALL);

    assert_eq!(
        harness.call("DropDatabase", Some(&admin)).await,
        rejected(PERMISSION_DENIED)
    );
}

#[tokio::test]
async fn test_custom_policy() {
    let permissions =
        PermissionTable::from_json(r#"{"admin": ["GetUserData"], "user": []}"#).unwrap();
    let harness = Harness::new(permissions);

    let user = harness.token(&[Role::User]);
    let admin = harness.token(&[Role::Admin]);

    assert_eq!(harness.call("GetUserData", Some(&user)).await, rejected(PERMISSION_DENIED));
    assert_eq!(harness.call("GetUserData", Some(&admin)).await, Outcome::Forwarded);
}
