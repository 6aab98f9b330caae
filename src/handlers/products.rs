use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::{
    error::AppResult,
    models::{CreateProduct, Product, UpdateProduct},
    AppState,
};

// ── List ──────────────────────────────────────────────────────────────────────

pub async fn list_products(State(state): State<AppState>) -> AppResult<Json<Vec<Product>>> {
    Ok(Json(state.products.list().await?))
}

// ── Create ────────────────────────────────────────────────────────────────────

pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<CreateProduct>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let Json(payload) = payload?;
    let product = state.products.create(payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

// ── Get by ID ─────────────────────────────────────────────────────────────────

pub async fn get_product(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> AppResult<Json<Product>> {
    let Path(id) = id?;
    Ok(Json(state.products.get(&id).await?))
}

// ── Update (PUT and PATCH are both partial) ───────────────────────────────────

pub async fn update_product(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateProduct>, JsonRejection>,
) -> AppResult<Json<Product>> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    Ok(Json(state.products.update(&id, payload).await?))
}

// ── Delete ────────────────────────────────────────────────────────────────────

pub async fn delete_product(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> AppResult<Json<serde_json::Value>> {
    let Path(id) = id?;
    let id = state.products.delete(&id).await?;
    Ok(Json(json!({ "message": "Product deleted", "id": id })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{build_router, db::MemoryProductStore, services::ProductService, AppState};

    use super::*;

    fn app() -> Router {
        build_router(AppState {
            products: ProductService::new(Arc::new(MemoryProductStore::new())),
        })
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_widget(app: &Router) -> Value {
        let (status, body) = send(
            app,
            Method::POST,
            "/products",
            Some(json!({ "name": "Widget", "price": 9.99 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    #[tokio::test]
    async fn health_check_answers_without_store() {
        let (status, body) = send(&app(), Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true, "message": "API Estoque" }));
    }

    #[tokio::test]
    async fn create_returns_201_with_defaults() {
        let app = app();
        let body = create_widget(&app).await;

        assert_eq!(body["name"], "Widget");
        assert_eq!(body["price"], 9.99);
        assert_eq!(body["quantity"], 0);
        assert_eq!(body["id"].as_str().unwrap().len(), 24);
        assert!(body["createdAt"].is_string());
        assert!(body["updatedAt"].is_string());
    }

    #[tokio::test]
    async fn create_without_required_fields_is_400() {
        let (status, body) = send(&app(), Method::POST, "/products", Some(json!({ "sku": "X" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let app = app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/products")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\": "))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn wrong_field_type_is_400() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/products",
            Some(json!({ "name": "Widget", "price": "cheap" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn get_created_and_list() {
        let app = app();
        let created = create_widget(&app).await;
        let id = created["id"].as_str().unwrap();

        let (status, body) = send(&app, Method::GET, &format!("/products/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, created);

        let (status, body) = send(&app, Method::GET, "/products", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([created]));
    }

    #[tokio::test]
    async fn get_unknown_id_is_404_with_error_body() {
        let app = app();
        let (status, body) =
            send(&app, Method::GET, "/products/65f000000000000000000000", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());

        let (status, _) = send(&app, Method::GET, "/products/not-an-id", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn patch_negative_price_is_400_and_leaves_record() {
        let app = app();
        let created = create_widget(&app).await;
        let uri = format!("/products/{}", created["id"].as_str().unwrap());

        let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({ "price": -5 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (_, after) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(after, created);
    }

    #[tokio::test]
    async fn put_and_patch_are_partial() {
        let app = app();
        let created = create_widget(&app).await;
        let uri = format!("/products/{}", created["id"].as_str().unwrap());

        let (status, body) = send(&app, Method::PUT, &uri, Some(json!({ "quantity": 12 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["quantity"], 12);
        assert_eq!(body["name"], "Widget");

        let (status, body) = send(
            &app,
            Method::PATCH,
            &uri,
            Some(json!({ "category": "Tools", "name": "  Gadget " })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Gadget");
        assert_eq!(body["category"], "Tools");
        assert_eq!(body["quantity"], 12);
        assert_eq!(body["price"], 9.99);
    }

    #[tokio::test]
    async fn update_unknown_id_is_404() {
        let (status, _) = send(
            &app(),
            Method::PATCH,
            "/products/65f000000000000000000000",
            Some(json!({ "price": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_twice_is_200_then_404() {
        let app = app();
        let created = create_widget(&app).await;
        let id = created["id"].as_str().unwrap();
        let uri = format!("/products/{}", id);

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], id);

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn unknown_route_is_404_json() {
        let (status, body) = send(&app(), Method::GET, "/nowhere", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn wrong_method_is_405_json() {
        let app = app();

        let (status, body) =
            send(&app, Method::POST, "/products/65f000000000000000000000", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["code"], "METHOD_NOT_ALLOWED");

        let (status, body) = send(&app, Method::DELETE, "/products", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn undecodable_id_is_400_json() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/products/%FF")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn trailing_slash_serves_collection() {
        let app = app();
        let (status, created) = send(
            &app,
            Method::POST,
            "/products/",
            Some(json!({ "name": "Widget", "price": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, Method::GET, "/products/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([created]));
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/products")
            .header(header::ORIGIN, "http://example.com")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
