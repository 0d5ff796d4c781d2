mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::util::ServiceExt;

use common::TestApp;

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn get(app: &TestApp, uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, app.bearer())
        .body(Body::empty())
        .unwrap()
}

fn with_json(app: &TestApp, method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, app.bearer())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn create_folder(app: &TestApp, name: &str) -> String {
    let response = send(app.router(), with_json(app, "POST", "/folders", &json!({ "name": name }))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_str().unwrap().to_string()
}

async fn create_invoice(app: &TestApp, folder_id: &str, body: &Value) -> Value {
    let uri = format!("/folders/{}/invoices", folder_id);
    let response = send(app.router(), with_json(app, "POST", &uri, body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[tokio::test]
async fn health_needs_no_token() {
    let app = TestApp::new().await;

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = send(app.router(), request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn rejects_missing_and_unknown_tokens() {
    let app = TestApp::new().await;

    let request = Request::builder().uri("/folders").body(Body::empty()).unwrap();
    let response = send(app.router(), request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert!(body["error"].is_string());

    let request = Request::builder()
        .uri("/folders")
        .header(header::AUTHORIZATION, "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();
    let response = send(app.router(), request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_the_token_owner() {
    let app = TestApp::new().await;

    let response = send(app.router(), get(&app, "/me")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let user = body_json(response).await;
    assert_eq!(user["id"], common::USER_ID);
    assert_eq!(user["name"], common::USER_NAME);
}

#[tokio::test]
async fn folders_are_created_and_listed_by_name() {
    let app = TestApp::new().await;
    let zeta = create_folder(&app, "Zeta Labs").await;
    create_folder(&app, "acme corp").await;

    let response = send(app.router(), get(&app, "/folders")).await;
    let folders = body_json(response).await;
    let names: Vec<&str> = folders
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["acme corp", "Zeta Labs"]);

    let response = send(app.router(), get(&app, &format!("/folders/{}", zeta))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["userId"], common::USER_ID);

    let response = send(app.router(), get(&app, "/folders/nope")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_folder_name_is_rejected() {
    let app = TestApp::new().await;
    let response = send(app.router(), with_json(&app, "POST", "/folders", &json!({ "name": "   " }))).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn creates_invoice_with_derived_id_and_stored_total() {
    let app = TestApp::new().await;
    let folder_id = create_folder(&app, "Acme Corp").await;

    let created = create_invoice(&app, &folder_id, &common::invoice_body()).await;
    let invoice = &created["invoice"];

    assert_eq!(invoice["id"], "INV-JOH-ACME-0001");
    assert_eq!(invoice["sequence"], 1);
    assert_eq!(invoice["total"], 119.99);
    assert_eq!(invoice["currency"], "USD");
    assert_eq!(invoice["status"], "due");
    assert_eq!(created["totals"]["finalTotal"], 119.99);

    let second = create_invoice(&app, &folder_id, &common::invoice_body()).await;
    assert_eq!(second["invoice"]["id"], "INV-JOH-ACME-0002");
}

#[tokio::test]
async fn invoice_level_rates_only_change_rendered_totals() {
    let app = TestApp::new().await;
    let folder_id = create_folder(&app, "Acme Corp").await;

    let created = create_invoice(&app, &folder_id, &common::adjusted_invoice_body()).await;
    assert_eq!(created["invoice"]["total"], 1000.0);
    assert_eq!(created["totals"]["taxAmount"], 200.0);
    assert_eq!(created["totals"]["discountAmount"], 150.0);
    assert_eq!(created["totals"]["finalTotal"], 1050.0);

    let id = created["invoice"]["id"].as_str().unwrap();
    let detail = body_json(send(app.router(), get(&app, &format!("/invoices/{}", id))).await).await;
    assert_eq!(detail["invoice"]["total"], 1000.0);
    assert_eq!(detail["totals"]["finalTotal"], 1050.0);
    assert_eq!(detail["request"]["notes"], "Thanks for your business");
}

#[tokio::test]
async fn invalid_invoices_are_rejected() {
    let app = TestApp::new().await;
    let folder_id = create_folder(&app, "Acme Corp").await;
    let uri = format!("/folders/{}/invoices", folder_id);

    let mut no_items = common::invoice_body();
    no_items["items"] = json!([]);
    let response = send(app.router(), with_json(&app, "POST", &uri, &no_items)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"], "Validation error");

    let mut bad_currency = common::invoice_body();
    bad_currency["currency"] = json!("DOLLARS");
    let response = send(app.router(), with_json(&app, "POST", &uri, &bad_currency)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let mut bad_tax = common::invoice_body();
    bad_tax["taxRate"] = json!(140);
    let response = send(app.router(), with_json(&app, "POST", &uri, &bad_tax)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = send(
        app.router(),
        with_json(&app, "POST", "/folders/missing/invoices", &common::invoice_body()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn overflowing_amounts_are_rejected_without_breaking_listings() {
    let app = TestApp::new().await;
    let folder_id = create_folder(&app, "Acme Corp").await;
    let uri = format!("/folders/{}/invoices", folder_id);

    let mut huge = common::invoice_body();
    huge["items"] = json!([{ "description": "Everything", "qty": 1e200, "unit": 1e200, "tax": 0 }]);
    let response = send(app.router(), with_json(&app, "POST", &uri, &huge)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    create_invoice(&app, &folder_id, &common::invoice_body()).await;

    let response = send(app.router(), get(&app, "/invoices")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

    let response = send(app.router(), get(&app, "/stats")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn status_round_trip_leaves_everything_else_alone() {
    let app = TestApp::new().await;
    let folder_id = create_folder(&app, "Acme Corp").await;
    let created = create_invoice(&app, &folder_id, &common::invoice_body()).await;
    let original = created["invoice"].clone();
    let id = original["id"].as_str().unwrap();
    let uri = format!("/invoices/{}/status", id);

    let response = send(app.router(), with_json(&app, "PATCH", &uri, &json!({ "status": "paid" }))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let paid = body_json(response).await;
    assert_eq!(paid["status"], "paid");
    assert_eq!(paid["total"], original["total"]);

    let response = send(app.router(), with_json(&app, "PATCH", &uri, &json!({ "status": "due" }))).await;
    let due = body_json(response).await;
    assert_eq!(due, original);

    let response = send(
        app.router(),
        with_json(&app, "PATCH", "/invoices/INV-NOPE/status", &json!({ "status": "paid" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_filters_by_status_folder_and_text() {
    let app = TestApp::new().await;
    let acme = create_folder(&app, "Acme Corp").await;
    let globex = create_folder(&app, "Globex").await;

    let first = create_invoice(&app, &acme, &common::invoice_body()).await;
    create_invoice(&app, &acme, &common::adjusted_invoice_body()).await;
    let mut globex_body = common::invoice_body();
    globex_body["buyerContact"]["name"] = json!("Globex Inc");
    create_invoice(&app, &globex, &globex_body).await;

    let first_id = first["invoice"]["id"].as_str().unwrap();
    let uri = format!("/invoices/{}/status", first_id);
    send(app.router(), with_json(&app, "PATCH", &uri, &json!({ "status": "paid" }))).await;

    let all = body_json(send(app.router(), get(&app, "/invoices")).await).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let paid = body_json(send(app.router(), get(&app, "/invoices?status=paid")).await).await;
    assert_eq!(paid.as_array().unwrap().len(), 1);
    assert_eq!(paid[0]["id"], first_id);

    let in_acme = body_json(send(app.router(), get(&app, &format!("/invoices?folder={}", acme))).await).await;
    assert_eq!(in_acme.as_array().unwrap().len(), 2);

    let text = body_json(send(app.router(), get(&app, "/invoices?q=globex")).await).await;
    assert_eq!(text.as_array().unwrap().len(), 1);
    assert_eq!(text[0]["id"], "INV-JOH-GLOB-0001");

    let per_folder = body_json(send(app.router(), get(&app, &format!("/folders/{}/invoices", globex))).await).await;
    assert_eq!(per_folder.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn other_users_cannot_see_invoices() {
    let app = TestApp::new().await;
    let folder_id = create_folder(&app, "Acme Corp").await;
    let created = create_invoice(&app, &folder_id, &common::invoice_body()).await;
    let id = created["invoice"]["id"].as_str().unwrap();

    app.db.ensure_user("janedoe", "Jane Doe").await.unwrap();
    let other = app.db.issue_token("janedoe").await.unwrap();

    let request = Request::builder()
        .uri(format!("/invoices/{}", id))
        .header(header::AUTHORIZATION, format!("Bearer {}", other))
        .body(Body::empty())
        .unwrap();
    let response = send(app.router(), request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pdf_download_is_a_pdf() {
    let app = TestApp::new().await;
    let folder_id = create_folder(&app, "Acme Corp").await;
    let created = create_invoice(&app, &folder_id, &common::adjusted_invoice_body()).await;
    let id = created["invoice"]["id"].as_str().unwrap();

    let response = send(app.router(), get(&app, &format!("/invoices/{}/pdf", id))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.contains(&format!("{}.pdf", id)));

    let bytes = body_bytes(response).await;
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn stats_sum_stored_totals_per_currency() {
    let app = TestApp::new().await;
    let acme = create_folder(&app, "Acme Corp").await;
    let globex = create_folder(&app, "Globex").await;

    // due 2024-01-31, so overdue by now
    let overdue = create_invoice(&app, &acme, &common::invoice_body()).await;
    create_invoice(&app, &acme, &common::invoice_body()).await;
    create_invoice(&app, &globex, &common::adjusted_invoice_body()).await;

    let id = overdue["invoice"]["id"].as_str().unwrap();
    let uri = format!("/invoices/{}/status", id);
    send(app.router(), with_json(&app, "PATCH", &uri, &json!({ "status": "paid" }))).await;

    let stats = body_json(send(app.router(), get(&app, "/stats")).await).await;
    assert_eq!(stats["invoiceCount"], 3);
    assert_eq!(stats["paidCount"], 1);
    assert_eq!(stats["dueCount"], 2);
    assert_eq!(stats["overdueCount"], 1);
    assert_eq!(stats["byCurrency"]["USD"]["invoiced"], 239.98);
    assert_eq!(stats["byCurrency"]["USD"]["paid"], 119.99);
    assert_eq!(stats["byCurrency"]["USD"]["overdue"], 119.99);
    assert_eq!(stats["byCurrency"]["EUR"]["outstanding"], 1000.0);

    let scoped = body_json(send(app.router(), get(&app, &format!("/stats?folder={}", globex))).await).await;
    assert_eq!(scoped["invoiceCount"], 1);
    assert!(scoped["byCurrency"].get("USD").is_none());
}
