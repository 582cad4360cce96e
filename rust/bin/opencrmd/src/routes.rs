//! Route registration: module routes under `/api` plus system endpoints.

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;

use auth::service::AuthService;
use opencrm_core::Module;

use crate::auth_middleware;

/// Build the complete router. The session middleware wraps everything.
pub fn build_router(auth: Arc<AuthService>, modules: &[&dyn Module]) -> Router {
    let mut api = Router::new();
    for module in modules {
        tracing::info!(module = module.name(), "mounting routes");
        api = api.merge(module.routes());
    }

    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(auth, auth_middleware::auth_middleware))
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "opencrmd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    use auth::service::{AuthConfig, hash_password};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use customer::CustomerModule;
    use holiday::{Holiday, HolidayError, HolidayModule, HolidaySource};
    use opencrm_kv::{KVStore, RedbStore};
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use worklog::WorkLogModule;

    struct NoHolidays;

    #[async_trait::async_trait]
    impl HolidaySource for NoHolidays {
        async fn holidays(&self, _year: u16) -> Result<Vec<Holiday>, HolidayError> {
            Ok(vec![])
        }
    }

    struct TestApp {
        router: Router,
        kv: Arc<dyn KVStore>,
        _dir: tempfile::TempDir,
    }

    fn app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let kv: Arc<dyn KVStore> = Arc::new(RedbStore::open(&dir.path().join("crm.redb")).unwrap());

        let auth_module = auth::AuthModule::new(kv.clone(), AuthConfig::default());
        for (user, pw) in [("admin", "pw"), ("staff", "pw2")] {
            auth_module.service().create_user(user, &hash_password(pw).unwrap()).unwrap();
        }
        let customers = CustomerModule::new(kv.clone());
        let worklog = WorkLogModule::new(kv.clone());
        let holidays = HolidayModule::new(Arc::new(NoHolidays));

        let router = build_router(
            auth_module.service().clone(),
            &[&auth_module, &customers, &worklog, &holidays],
        );
        TestApp { router, kv, _dir: dir }
    }

    async fn call(
        app: &TestApp,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header("x-auth-token", t);
        }
        let body = match body {
            Some(v) => {
                req = req.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&v).unwrap())
            }
            None => Body::empty(),
        };
        let resp = app.router.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    async fn login(app: &TestApp, user: &str, pw: &str) -> String {
        let (status, body) =
            call(app, "POST", "/api/auth/login", None, Some(json!({"username": user, "password": pw}))).await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn public_endpoints_need_no_token() {
        let app = app();
        assert_eq!(call(&app, "GET", "/health", None, None).await.0, StatusCode::OK);
        assert_eq!(call(&app, "GET", "/version", None, None).await.0, StatusCode::OK);
        let (status, body) = call(&app, "GET", "/api/holidays/2024", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn protected_endpoints_reject_missing_or_bad_token_without_mutation() {
        let app = app();
        let requests = [
            ("GET", "/api/customers", None),
            ("POST", "/api/customers", Some(json!({"name": "Kim"}))),
            ("PATCH", "/api/customers/abc", Some(json!({"name": "Kim"}))),
            ("DELETE", "/api/customers/abc", None),
            ("POST", "/api/customers/replace", Some(json!([{"name": "Kim"}]))),
            ("POST", "/api/customers/add", Some(json!([{"name": "Kim"}]))),
            ("GET", "/api/worklog", None),
            ("POST", "/api/worklog", Some(json!({"date": "2024-01-01", "log": "x"}))),
            ("PUT", "/api/worklog/2024-01-01", Some(json!({"log": "x"}))),
            ("DELETE", "/api/worklog/2024-01-01", None),
        ];

        for (method, uri, body) in requests {
            for token in [None, Some("not-a-jwt")] {
                let (status, resp) = call(&app, method, uri, token, body.clone()).await;
                assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri} with {token:?}");
                assert_eq!(resp["code"], "UNAUTHENTICATED");
            }
        }

        assert!(app.kv.scan("crm:customer:").unwrap().is_empty());
        assert!(app.kv.scan("crm:worklog:").unwrap().is_empty());
    }

    #[tokio::test]
    async fn bearer_header_is_accepted() {
        let app = app();
        let token = login(&app, "admin", "pw").await;
        let req = Request::builder()
            .uri("/api/customers")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let resp = app.router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn bad_login_is_400() {
        let app = app();
        let (status, _) =
            call(&app, "POST", "/api/auth/login", None, Some(json!({"username": "ghost", "password": "pw"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) =
            call(&app, "POST", "/api/auth/login", None, Some(json!({"username": "admin", "password": "bad"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn import_then_crud_end_to_end() {
        let app = app();
        let token = login(&app, "admin", "pw").await;
        let t = Some(token.as_str());

        let rows = json!([{"이름": "A"}, {"이름": "B"}, {"이름": " "}, {"이름": "D"}, {"이름": "E"}]);
        let (status, body) = call(&app, "POST", "/api/customers/add", t, Some(rows)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!((body["inserted"].clone(), body["errors"].clone(), body["total"].clone()), (json!(4), json!(1), json!(5)));

        let (status, created) = call(&app, "POST", "/api/customers", t, Some(json!({"name": "F"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["serialNo"], 5);

        let (status, _) = call(&app, "PATCH", "/api/customers/missing", t, Some(json!({"name": "X"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let rows = json!([{"name": "Z"}, {"name": "Y"}]);
        let (status, _) = call(&app, "POST", "/api/customers/replace", t, Some(rows)).await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, list) = call(&app, "GET", "/api/customers", t, None).await;
        let got: Vec<_> = list
            .as_array()
            .unwrap()
            .iter()
            .map(|c| (c["name"].clone(), c["serialNo"].clone()))
            .collect();
        assert_eq!(got, vec![(json!("Z"), json!(1)), (json!("Y"), json!(2))]);
    }

    #[tokio::test]
    async fn worklog_is_scoped_to_the_caller() {
        let app = app();
        let admin = login(&app, "admin", "pw").await;
        let staff = login(&app, "staff", "pw2").await;

        let (status, _) = call(
            &app,
            "POST",
            "/api/worklog",
            Some(&admin),
            Some(json!({"date": "2024-05-01", "log": "admin notes"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, mine) = call(&app, "GET", "/api/worklog/2024-05-01", Some(&admin), None).await;
        assert_eq!(mine["log"], "admin notes");

        let (status, theirs) = call(&app, "GET", "/api/worklog/2024-05-01", Some(&staff), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(theirs["log"], "");

        let (status, _) = call(&app, "DELETE", "/api/worklog/2024-05-01", Some(&staff), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
