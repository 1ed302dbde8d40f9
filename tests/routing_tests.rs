use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use yatube::{build_router, config::Config, services::Database, state::AppState};

/// 测试路由不需要真实数据库: 惰性连接池只在执行查询时拨号,
/// 这里只覆盖不触发查询的路径 (重定向、404、静态表单页)。
fn test_app() -> Router {
    std::env::set_var("JWT_SECRET", "routing-test-secret");
    let config = Config::from_env().expect("config from env");
    let db = Arc::new(Database::connect_lazy(&config).expect("lazy pool"));
    let state = Arc::new(AppState::new(config, db).expect("app state"));
    build_router(state)
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn unknown_path_renders_custom_404_page() {
    let app = test_app();

    let response = app
        .oneshot(Request::builder().uri("/no/such/page").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_string(response).await;
    assert!(body.contains("404"));
    assert!(body.contains("does not exist"));
}

#[tokio::test]
async fn malformed_post_id_is_treated_as_not_found() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/posts/not-a-valid-id")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_requires_login_and_carries_next() {
    let app = test_app();

    let response = app
        .oneshot(Request::builder().uri("/create").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers().get("location").unwrap().to_str().unwrap();
    assert_eq!(location, "/auth/login?next=%2Fcreate");
}

#[tokio::test]
async fn follow_feed_requires_login() {
    let app = test_app();

    let response = app
        .oneshot(Request::builder().uri("/follow").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers().get("location").unwrap().to_str().unwrap();
    assert_eq!(location, "/auth/login?next=%2Ffollow");
}

#[tokio::test]
async fn anonymous_comment_attempt_redirects_without_creating() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/posts/8f6f8b86-3f95-4a3e-bd62-1d1e3e6c2a10/comment")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from("text=hello"))
                .unwrap(),
        )
        .await
        .unwrap();

    // 未登录的评论请求静默重定向到登录页, 不创建评论
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers().get("location").unwrap().to_str().unwrap();
    assert!(location.starts_with("/auth/login?next="));
}

#[tokio::test]
async fn login_page_renders_form_with_next_field() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/login?next=/create")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("name=\"username\""));
    assert!(body.contains("name=\"password\""));
    assert!(body.contains("value=\"/create\""));
}

#[tokio::test]
async fn signup_page_renders_form() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/signup")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Sign up"));
}

#[tokio::test]
async fn logout_clears_the_session_cookie() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap();
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn media_path_traversal_is_rejected() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/media/..%2Fsecrets.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
