//! Black-box API tests.
//!
//! These need a real Postgres database; set `STOCKBOOK_TEST_DATABASE_URL`
//! to run them (they skip silently otherwise). Each test uses fresh product
//! codes, so a shared scratch database works.

use reqwest::StatusCode;
use serde_json::json;

use stockbook_store::Store;

const PASSWORD: &str = "test-password";

fn test_database_url() -> Option<String> {
    std::env::var("STOCKBOOK_TEST_DATABASE_URL").ok()
}

fn unique_code(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{prefix}-{nanos}")
}

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(database_url: &str) -> Self {
        // Build the same router as prod, bound to an ephemeral port.
        let store = Store::connect(database_url).await.expect("failed to connect");
        store.migrate().await.expect("failed to migrate");
        let app = stockbook_api::app::build_app(store, PASSWORD);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap()
}

async fn login(client: &reqwest::Client, base_url: &str) {
    let res = client
        .post(format!("{}/auth/login", base_url))
        .json(&json!({ "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let Some(url) = test_database_url() else {
        eprintln!("STOCKBOOK_TEST_DATABASE_URL not set; skipping");
        return;
    };
    let srv = TestServer::spawn(&url).await;

    let res = client()
        .get(format!("{}/products", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Not authenticated");
}

#[tokio::test]
async fn login_validates_the_shared_password() {
    let Some(url) = test_database_url() else {
        eprintln!("STOCKBOOK_TEST_DATABASE_URL not set; skipping");
        return;
    };
    let srv = TestServer::spawn(&url).await;
    let client = client();

    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Incorrect password");

    login(&client, &srv.base_url).await;

    let res = client
        .get(format!("{}/auth/check", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn scan_lifecycle_create_reconcile_query() {
    let Some(url) = test_database_url() else {
        eprintln!("STOCKBOOK_TEST_DATABASE_URL not set; skipping");
        return;
    };
    let srv = TestServer::spawn(&url).await;
    let client = client();
    login(&client, &srv.base_url).await;

    // Create
    let code = unique_code("SKU");
    let res = client
        .post(format!("{}/products", srv.base_url))
        .json(&json!({
            "code": code,
            "name": "Widget",
            "price": "1,234.50",
            "manufacturer": unique_code("Maker"),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["quantity"], 0);
    assert_eq!(created["price"], "1234.50");

    // Duplicate scans of one product coalesce: +3 then -1 nets to +2.
    let res = client
        .post(format!("{}/products/scan", srv.base_url))
        .json(&json!([
            { "id": id, "quantity": 3 },
            { "id": id, "quantity": -1 },
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let event: serde_json::Value = res.json().await.unwrap();
    assert_eq!(event["products"].as_array().unwrap().len(), 1);
    assert_eq!(event["products"][0]["quantity"], 2);

    // Overdraw fails with the entry index and mutates nothing.
    let res = client
        .post(format!("{}/products/scan", srv.base_url))
        .json(&json!([{ "id": id, "quantity": -20 }]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Not enough stock");
    assert_eq!(body["index"], 0);

    // Unknown product reference fails with its index.
    let res = client
        .post(format!("{}/products/scan", srv.base_url))
        .json(&json!([
            { "id": id, "quantity": 1 },
            { "id": 9_007_199_254i64, "quantity": 1 },
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["index"], 1);

    // Quantity and history reflect exactly the one successful batch.
    let res = client
        .get(format!("{}/products/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let detail: serde_json::Value = res.json().await.unwrap();
    assert_eq!(detail["quantity"], 2);
    assert_eq!(detail["update_events"].as_array().unwrap().len(), 1);
    assert_eq!(detail["update_events"][0]["quantity"], 2);

    // Duplicate code is a field-scoped conflict.
    let res = client
        .post(format!("{}/products", srv.base_url))
        .json(&json!({ "code": code, "name": "Widget again" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["field"], "code");

    // Bulk reset zeroes the quantity without adding history.
    let res = client
        .post(format!("{}/products/clear", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/products/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    let detail: serde_json::Value = res.json().await.unwrap();
    assert_eq!(detail["quantity"], 0);
    assert_eq!(detail["update_events"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn export_produces_the_fixed_csv_columns() {
    let Some(url) = test_database_url() else {
        eprintln!("STOCKBOOK_TEST_DATABASE_URL not set; skipping");
        return;
    };
    let srv = TestServer::spawn(&url).await;
    let client = client();
    login(&client, &srv.base_url).await;

    let code = unique_code("EXP");
    let res = client
        .post(format!("{}/products", srv.base_url))
        .json(&json!({ "code": code, "name": "Exported widget" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let res = client
        .post(format!("{}/products/scan", srv.base_url))
        .json(&json!([{ "id": id, "quantity": 5 }]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!(
            "{}/updates/export?product_id={}",
            srv.base_url, id
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[reqwest::header::CONTENT_TYPE]
            .to_str()
            .unwrap(),
        "text/csv"
    );

    let csv = res.text().await.unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Time,Code,Name,Manufacturer,Supplier,Price,Change"
    );
    let row = lines.next().unwrap();
    assert!(row.contains(&code));
    assert!(row.ends_with(",5"));

    // Filtering by a month long past yields headers only.
    let res = client
        .get(format!(
            "{}/updates/export?product_id={}&month=1999-01",
            srv.base_url, id
        ))
        .send()
        .await
        .unwrap();
    let csv = res.text().await.unwrap();
    assert_eq!(csv.lines().count(), 1);

    // Malformed month is rejected.
    let res = client
        .get(format!("{}/updates/export?month=nope", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid month");
}
