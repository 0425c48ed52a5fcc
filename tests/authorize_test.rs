//! Integration tests for the client and permissions authorizers.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    extract::Request,
    http::{StatusCode, header::AUTHORIZATION},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::get,
};
use gatekeeper::{
    AuthError, Authenticator, BasicApiClient, ClientAuthorizer, Guard, HasPermission, Identity,
    JsonErrorHandler, PermissionCheck, PermissionsAuthorizer, RequestContext, RequestContextExt,
    StandardErrorHandler, guard_middleware, validate_fn,
};
use tower::ServiceExt;

/// Identity with no capabilities at all.
struct Opaque;

impl Identity for Opaque {}

/// Permission source that remembers every permission it was asked about.
#[derive(Default)]
struct Recording {
    granted: Vec<&'static str>,
    unavailable: bool,
    asked: Mutex<Vec<String>>,
}

impl Recording {
    fn granting(granted: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            granted: granted.to_vec(),
            ..Self::default()
        })
    }

    fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            unavailable: true,
            ..Self::default()
        })
    }

    fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl HasPermission for Recording {
    async fn has_permission(&self, permission: &str) -> Result<bool, AuthError> {
        self.asked.lock().unwrap().push(permission.to_string());
        if self.unavailable {
            return Err(AuthError::internal("permission service down"));
        }
        Ok(self.granted.iter().any(|granted| *granted == permission))
    }
}

impl Identity for Recording {
    fn as_permission_source(&self) -> Option<&dyn HasPermission> {
        Some(self)
    }
}

fn request_as(identity: Option<Arc<dyn Identity>>) -> Request {
    let request = Request::builder()
        .uri("/")
        .body(Body::empty())
        .expect("request build");
    match identity {
        Some(identity) => {
            let context = RequestContext::new().with_value("ApiClient", identity);
            request.with_context(context)
        }
        None => request,
    }
}

fn client(id: &str) -> Option<Arc<dyn Identity>> {
    Some(Arc::new(BasicApiClient::new(id, ["users.read"])))
}

async fn rejection_of<G: Guard>(guard: &G, request: Request) -> AuthError {
    guard
        .check(request)
        .await
        .err()
        .expect("request should be rejected")
        .error
}

async fn send(app: Router, request: Request) -> (StatusCode, String) {
    let response = app.oneshot(request).await.expect("request execution");
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body extraction");
    (status, String::from_utf8(body.to_vec()).expect("utf-8 body"))
}

fn ok_routes() -> Router {
    Router::new().route("/", get(|| async { "ok" }))
}

#[tokio::test]
async fn client_authorizer_requires_an_identity() {
    let authorizer = ClientAuthorizer::new("ApiClient", StandardErrorHandler);

    let error = rejection_of(&authorizer, request_as(None)).await;
    assert!(matches!(error, AuthError::AuthenticationRequired));

    let error = rejection_of(&authorizer, request_as(Some(Arc::new(Opaque)))).await;
    assert!(matches!(error, AuthError::AuthenticationRequired));

    // stored under another key
    let someone_else = Arc::new(BasicApiClient::new("x", ["a"]));
    let elsewhere = RequestContext::new().with_value("User", someone_else);
    let request = request_as(None).with_context(elsewhere);
    let error = rejection_of(&authorizer, request).await;
    assert!(matches!(error, AuthError::AuthenticationRequired));
}

#[tokio::test]
async fn client_authorizer_rejects_empty_identifier() {
    let authorizer = ClientAuthorizer::new("ApiClient", StandardErrorHandler);

    let error = rejection_of(&authorizer, request_as(client(""))).await;
    assert!(matches!(error, AuthError::AuthorizationFailed));
}

#[tokio::test]
async fn client_authorizer_passes_identified_client() {
    let authorizer = ClientAuthorizer::new("ApiClient", StandardErrorHandler);

    let request = authorizer
        .check(request_as(client("good-key-1")))
        .await
        .expect("request should pass");
    assert!(request.context().contains("ApiClient"));
}

#[tokio::test]
async fn client_authorizer_responses() {
    let cases = [
        (None, StatusCode::UNAUTHORIZED, "Authentication required"),
        (client(""), StatusCode::FORBIDDEN, "Access denied"),
        (client("good-key-1"), StatusCode::OK, "ok"),
    ];

    for (identity, expected_status, expected_body) in cases {
        let layered = ok_routes()
            .layer(ClientAuthorizer::new("ApiClient", StandardErrorHandler).layer());
        let (status, body) = send(layered, request_as(identity.clone())).await;
        assert_eq!(status, expected_status);
        assert_eq!(body, expected_body);

        let middleware = ok_routes().layer(from_fn_with_state(
            Arc::new(ClientAuthorizer::new("ApiClient", StandardErrorHandler)),
            guard_middleware::<ClientAuthorizer>,
        ));
        let (status, body) = send(middleware, request_as(identity)).await;
        assert_eq!(status, expected_status);
        assert_eq!(body, expected_body);
    }
}

#[tokio::test]
async fn permissions_require_a_checkable_identity() {
    let perms = PermissionsAuthorizer::new("ApiClient", StandardErrorHandler);
    let check = perms.guard(["users.read"]);

    let error = rejection_of(&check, request_as(None)).await;
    assert!(matches!(error, AuthError::AuthenticationRequired));

    let error = rejection_of(&check, request_as(Some(Arc::new(Opaque)))).await;
    assert!(matches!(error, AuthError::AuthenticationRequired));
}

#[tokio::test]
async fn first_missing_permission_stops_the_check() {
    let perms = PermissionsAuthorizer::new("ApiClient", StandardErrorHandler);
    let check = perms.guard(["a", "b", "c"]);
    let source = Recording::granting(&["a"]);

    let error = rejection_of(&check, request_as(Some(source.clone()))).await;

    assert_eq!(error.permission(), Some("b"));
    assert_eq!(source.asked(), ["a", "b"]);
}

#[tokio::test]
async fn all_permissions_granted_passes() {
    let perms = PermissionsAuthorizer::new("ApiClient", StandardErrorHandler);
    let check = perms.guard(["a", "b"]);
    let source = Recording::granting(&["b", "a"]);

    assert!(check.check(request_as(Some(source.clone()))).await.is_ok());
    assert_eq!(source.asked(), ["a", "b"]);
    assert_eq!(check.permissions(), ["a", "b"]);
}

#[tokio::test]
async fn empty_permission_list_is_satisfied() {
    let perms = PermissionsAuthorizer::new("ApiClient", StandardErrorHandler);
    let check = perms.guard(Vec::<String>::new());
    let source = Recording::granting(&[]);

    assert!(check.check(request_as(Some(source.clone()))).await.is_ok());
    assert!(source.asked().is_empty());

    // still needs someone to ask
    let error = rejection_of(&check, request_as(None)).await;
    assert!(matches!(error, AuthError::AuthenticationRequired));
}

#[tokio::test]
async fn permission_source_failure_is_propagated() {
    let perms = PermissionsAuthorizer::new("ApiClient", StandardErrorHandler);
    let source = Recording::unavailable();

    let error = rejection_of(&perms.guard(["a", "b"]), request_as(Some(source.clone()))).await;
    assert!(matches!(error, AuthError::Other(_)));
    assert_eq!(source.asked(), ["a"]);

    let app = ok_routes().layer(perms.require(["a"]));
    let (status, body) = send(app, request_as(Some(source))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal error");
}

#[tokio::test]
async fn permission_responses() {
    let perms = PermissionsAuthorizer::new("ApiClient", StandardErrorHandler);
    let cases = [
        (None, StatusCode::UNAUTHORIZED, "Authentication required"),
        (client("good-key-2"), StatusCode::FORBIDDEN, "Access denied"),
        (
            Some(Arc::new(BasicApiClient::new("good-key-1", ["users.read", "users.write"]))
                as Arc<dyn Identity>),
            StatusCode::OK,
            "ok",
        ),
    ];

    for (identity, expected_status, expected_body) in cases {
        let layered = ok_routes().layer(perms.require(["users.read", "users.write"]));
        let (status, body) = send(layered, request_as(identity.clone())).await;
        assert_eq!(status, expected_status);
        assert_eq!(body, expected_body);

        let middleware = ok_routes().layer(from_fn_with_state(
            Arc::new(perms.guard(["users.read", "users.write"])),
            guard_middleware::<PermissionCheck>,
        ));
        let (status, body) = send(middleware, request_as(identity)).await;
        assert_eq!(status, expected_status);
        assert_eq!(body, expected_body);
    }
}

#[tokio::test]
async fn json_error_handler_reports_errors_array() {
    let perms = PermissionsAuthorizer::new("ApiClient", JsonErrorHandler);
    let app = ok_routes().layer(perms.require(["users.write"]));

    let (status, body) = send(app, request_as(client("good-key-2"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"errors":["Access denied"]}"#);
}

#[tokio::test]
async fn custom_error_handler_sees_denied_permission() {
    let handler = |request: &Request, error: AuthError| -> Response {
        let message = format!(
            "{} {} needs {}",
            request.method(),
            request.uri().path(),
            error.permission().unwrap_or("nothing")
        );
        (StatusCode::FORBIDDEN, message).into_response()
    };
    let perms = PermissionsAuthorizer::new("ApiClient", handler);
    let app = ok_routes().layer(perms.require(["users.read", "users.write"]));

    let (status, body) = send(app, request_as(client("good-key-2"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, "GET / needs users.write");
}

fn nameless_key_authenticator() -> Authenticator {
    let validator = validate_fn(|_token: String| async {
        let nameless: Arc<dyn Identity> = Arc::new(BasicApiClient::new("", ["users.read"]));
        Ok::<_, AuthError>(Some(nameless))
    });
    Authenticator::new("Key", "ApiClient", StandardErrorHandler, validator)
}

fn keyed_request() -> Request {
    Request::builder()
        .uri("/")
        .header(AUTHORIZATION, "Key nameless-key")
        .body(Body::empty())
        .expect("request build")
}

#[tokio::test]
async fn authenticator_leaves_identifier_checks_to_client_authorizer() {
    // the authenticator alone lets the nameless identity through
    let app = ok_routes().layer(nameless_key_authenticator().layer());
    let (status, body) = send(app, keyed_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    let layered = ok_routes()
        .route_layer(ClientAuthorizer::new("ApiClient", StandardErrorHandler).layer())
        .layer(nameless_key_authenticator().layer());
    let middleware = ok_routes()
        .route_layer(from_fn_with_state(
            Arc::new(ClientAuthorizer::new("ApiClient", StandardErrorHandler)),
            guard_middleware::<ClientAuthorizer>,
        ))
        .layer(from_fn_with_state(
            Arc::new(nameless_key_authenticator()),
            guard_middleware::<Authenticator>,
        ));

    for app in [layered, middleware] {
        let (status, body) = send(app, keyed_request()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, "Access denied");
    }
}
