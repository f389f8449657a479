//! End-to-end tests against the HTTP router with an in-memory database
//! Run: cargo test -p regalia-server --test catalog_api

use axum::Router;
use axum::body::Body;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use regalia_server::db::DbService;
use regalia_server::services::http::build_router;
use regalia_server::{Config, ServerState};

struct TestApp {
    app: Router,
    state: ServerState,
    _tmp: tempfile::TempDir,
}

async fn setup() -> TestApp {
    let tmp = tempfile::tempdir().unwrap();
    let config = Config::with_overrides(tmp.path().to_string_lossy(), 0);
    let db = DbService::in_memory("test", "test").await.unwrap();
    let state = ServerState::from_db(config, db.db);
    let app = build_router(state.clone());
    TestApp {
        app,
        state,
        _tmp: tmp,
    }
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str) -> Value {
        let (status, body) = self.send(Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK, "GET {} -> {}", uri, body);
        body
    }

    async fn post(&self, uri: &str, body: Value) -> Value {
        let (status, body) = self.send(Method::POST, uri, Some(body)).await;
        assert_eq!(status, StatusCode::OK, "POST {} -> {}", uri, body);
        body
    }

    async fn put(&self, uri: &str, body: Value) -> Value {
        let (status, body) = self.send(Method::PUT, uri, Some(body)).await;
        assert_eq!(status, StatusCode::OK, "PUT {} -> {}", uri, body);
        body
    }

    async fn create_rite(&self, name: &str, code: &str) -> String {
        let rite = self
            .post("/api/rites", json!({ "name": name, "code": code }))
            .await;
        rite["id"].as_str().unwrap().to_string()
    }

    async fn create_product(&self, body: Value) -> Value {
        self.post("/api/products", body).await
    }
}

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

/// code -> count of a taxonomy facet array
fn counts_by_code(facets: &Value) -> Vec<(String, u64)> {
    let mut counts: Vec<(String, u64)> = facets
        .as_array()
        .unwrap()
        .iter()
        .map(|f| {
            (
                f["code"].as_str().unwrap_or_default().to_string(),
                f["count"].as_u64().unwrap(),
            )
        })
        .collect();
    counts.sort();
    counts
}

#[tokio::test]
async fn filters_count_active_products_unless_inactive_requested() {
    let t = setup().await;
    let reaa = t.create_rite("Rite Écossais Ancien et Accepté", "REAA").await;
    let rer = t.create_rite("Rite Écossais Rectifié", "RER").await;

    t.create_product(json!({ "name": "Tablier Maître REAA", "price": 12000, "rites": [reaa] }))
        .await;
    t.create_product(json!({ "name": "Cordon RER", "price": 8000, "rites": [rer] }))
        .await;
    t.create_product(json!({
        "name": "Sautoir REAA (archive)",
        "price": 9000,
        "rites": [reaa],
        "is_active": false
    }))
    .await;

    let active = t.get("/api/filters").await;
    assert_eq!(
        counts_by_code(&active["rites"]),
        vec![("REAA".to_string(), 1), ("RER".to_string(), 1)]
    );
    assert_eq!(active["includeInactive"], json!(false));

    let all = t.get("/api/filters?includeInactive=true").await;
    assert_eq!(
        counts_by_code(&all["rites"]),
        vec![("REAA".to_string(), 2), ("RER".to_string(), 1)]
    );
    assert_eq!(all["includeInactive"], json!(true));
}

#[tokio::test]
async fn filters_omit_inactive_entities_and_empty_buckets() {
    let t = setup().await;
    let reaa = t.create_rite("REAA", "REAA").await;
    let retired = t.create_rite("Rite Français", "RF").await;
    t.create_rite("Rite d'York", "YORK").await;

    t.create_product(json!({ "name": "Tablier", "price": 5000, "rites": [reaa, retired] }))
        .await;
    t.put(&format!("/api/rites/{}", retired), json!({ "is_active": false }))
        .await;

    let filters = t.get("/api/filters").await;
    // RF is inactive, YORK has no product
    assert_eq!(
        counts_by_code(&filters["rites"]),
        vec![("REAA".to_string(), 1)]
    );
}

#[tokio::test]
async fn filters_are_cached_until_a_product_changes() {
    let t = setup().await;
    let reaa = t.create_rite("REAA", "REAA").await;
    t.create_product(json!({ "name": "Gants blancs", "price": 1500, "rites": [reaa] }))
        .await;

    let first = t.get("/api/filters").await;
    assert_eq!(first["fromCache"], json!(false));

    let second = t.get("/api/filters").await;
    assert_eq!(second["fromCache"], json!(true));
    assert_eq!(first["computedAt"], second["computedAt"]);

    t.create_product(json!({ "name": "Bijou de Vénérable", "price": 4500, "rites": [reaa] }))
        .await;

    let third = t.get("/api/filters").await;
    assert_eq!(third["fromCache"], json!(false));
    assert_eq!(counts_by_code(&third["rites"]), vec![("REAA".to_string(), 2)]);
}

#[tokio::test]
async fn delete_filters_invalidates_every_variant() {
    let t = setup().await;
    t.get("/api/filters").await;
    t.get("/api/filters?includeInactive=true").await;

    let (status, body) = t.send(Method::DELETE, "/api/filters", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["invalidated"], json!(2));

    let again = t.get("/api/filters").await;
    assert_eq!(again["fromCache"], json!(false));
}

#[tokio::test]
async fn filters_report_price_range_and_attribute_values() {
    let t = setup().await;
    t.create_product(json!({
        "name": "Tablier",
        "price": 10000,
        "sizes": ["M", "L"],
        "colors": ["bleu"],
        "stock_quantity": 20
    }))
    .await;
    t.create_product(json!({
        "name": "Cordon",
        "price": 20000,
        "sizes": ["M"],
        "colors": ["rouge", "bleu"],
        "stock_quantity": 0
    }))
    .await;

    let filters = t.get("/api/filters").await;
    assert_eq!(filters["priceRange"]["min"], json!(10000));
    assert_eq!(filters["priceRange"]["max"], json!(20000));
    assert_eq!(filters["priceRange"]["avg"], json!(15000.0));

    let sizes = filters["sizes"].as_array().unwrap();
    assert_eq!(sizes[0]["value"], json!("M"));
    assert_eq!(sizes[0]["count"], json!(2));

    let stock: Vec<&str> = filters["stockStatuses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["value"].as_str().unwrap())
        .collect();
    assert!(stock.contains(&"in_stock"));
    assert!(stock.contains(&"out_of_stock"));
}

#[tokio::test]
async fn creating_a_product_fills_denormalized_fields() {
    let t = setup().await;
    let rite = t
        .post(
            "/api/rites",
            json!({ "name": "Rite Écossais Rectifié", "code": "RER", "abbreviation": "R.E.R." }),
        )
        .await;
    let degree = t
        .post(
            "/api/degrees",
            json!({ "name": "Maître", "code": "M3", "lodge_type": "bleue", "degree": 3 }),
        )
        .await;

    let product = t
        .create_product(json!({
            "name": "Tablier de Maître",
            "price": 15000,
            "rites": [id_of(&rite)],
            "degree_orders": [id_of(&degree)]
        }))
        .await;

    assert_eq!(product["rite_codes"], json!(["R.E.R.", "RER"]));
    assert_eq!(product["lodge_types"], json!(["bleue"]));
    assert_eq!(product["slug"], json!("tablier-de-maitre"));
}

#[tokio::test]
async fn renaming_a_rite_code_resyncs_referencing_products() {
    let t = setup().await;
    let rite = t.create_rite("Rite Écossais Ancien et Accepté", "REAA").await;
    let product = t
        .create_product(json!({ "name": "Cordon 18e", "price": 7000, "rites": [rite] }))
        .await;
    assert_eq!(product["rite_codes"], json!(["REAA"]));

    t.put(&format!("/api/rites/{}", rite), json!({ "code": "R.E.A.A." }))
        .await;

    let reloaded = t.get(&format!("/api/products/{}", id_of(&product))).await;
    assert_eq!(reloaded["rite_codes"], json!(["R.E.A.A."]));
}

#[tokio::test]
async fn renaming_a_rite_code_resyncs_every_batch() {
    let t = setup().await;
    let rite = t.create_rite("Rite Écossais Ancien et Accepté", "REAA").await;
    // more than two sync batches
    for i in 0..25 {
        t.create_product(json!({ "name": format!("Cordon {i}"), "price": 7000, "rites": [rite] }))
            .await;
    }

    t.put(&format!("/api/rites/{}", rite), json!({ "code": "R.E.A.A." }))
        .await;

    let products = t.get("/api/products").await;
    let products = products.as_array().unwrap();
    assert_eq!(products.len(), 25);
    let stale: Vec<&Value> = products
        .iter()
        .filter(|p| p["rite_codes"] != json!(["R.E.A.A."]))
        .collect();
    assert!(stale.is_empty(), "stale products: {:?}", stale);

    let filters = t.get("/api/filters").await;
    assert_eq!(counts_by_code(&filters["rites"]), vec![("R.E.A.A.".to_string(), 25)]);
}

#[tokio::test]
async fn changing_product_rites_resyncs_and_refreshes_filters() {
    let t = setup().await;
    let reaa = t.create_rite("REAA", "REAA").await;
    let rer = t.create_rite("RER", "RER").await;
    let product = t
        .create_product(json!({ "name": "Tablier", "price": 7000, "rites": [reaa] }))
        .await;

    let before = t.get("/api/filters").await;
    assert_eq!(counts_by_code(&before["rites"]), vec![("REAA".to_string(), 1)]);
    assert_eq!(t.get("/api/filters").await["fromCache"], json!(true));

    let updated = t
        .put(&format!("/api/products/{}", id_of(&product)), json!({ "rites": [rer] }))
        .await;
    assert_eq!(updated["rite_codes"], json!(["RER"]));

    let after = t.get("/api/filters").await;
    assert_eq!(after["fromCache"], json!(false));
    assert_eq!(counts_by_code(&after["rites"]), vec![("RER".to_string(), 1)]);
}

#[tokio::test]
async fn null_clears_a_promotion() {
    let t = setup().await;
    let product = t
        .create_product(json!({
            "name": "Bijou de Vénérable",
            "price": 4500,
            "compare_at_price": 6000,
            "sale_starts_at": 1_000,
            "sale_ends_at": 2_000,
        }))
        .await;
    let uri = format!("/api/products/{}", id_of(&product));

    // absent fields are left alone
    let renamed = t.put(&uri, json!({ "name": "Bijou du Vénérable" })).await;
    assert_eq!(renamed["compare_at_price"], json!(6000));

    let cleared = t
        .put(
            &uri,
            json!({ "compare_at_price": null, "sale_starts_at": null, "sale_ends_at": null }),
        )
        .await;
    assert_eq!(cleared["compare_at_price"], Value::Null);
    assert_eq!(cleared["sale_starts_at"], Value::Null);
    assert_eq!(cleared["sale_ends_at"], Value::Null);

    let reloaded = t.get(&uri).await;
    assert_eq!(reloaded["compare_at_price"], Value::Null);
    assert_eq!(reloaded["price"], json!(4500));
}

#[tokio::test]
async fn deleting_an_entity_drops_it_from_denormalized_fields() {
    let t = setup().await;
    let reaa = t.create_rite("REAA", "REAA").await;
    let rer = t.create_rite("RER", "RER").await;
    let product = t
        .create_product(json!({ "name": "Tablier", "price": 7000, "rites": [reaa, rer] }))
        .await;
    assert_eq!(product["rite_codes"], json!(["REAA", "RER"]));

    let (status, _) = t
        .send(Method::DELETE, &format!("/api/rites/{}", rer), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let reloaded = t.get(&format!("/api/products/{}", id_of(&product))).await;
    assert_eq!(reloaded["rite_codes"], json!(["REAA"]));
    // 引用本身保留
    assert_eq!(reloaded["rites"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn sync_many_reports_missing_products_as_failures() {
    let t = setup().await;
    let a = t
        .create_product(json!({ "name": "Tablier", "price": 1000 }))
        .await;
    let b = t
        .create_product(json!({ "name": "Cordon", "price": 1000 }))
        .await;

    let ids = vec![id_of(&a), "product:missing".to_string(), id_of(&b)];
    let report = t.state.sync.sync_many(&ids).await;

    assert_eq!(report.successes, 2);
    assert_eq!(report.failures, 1);
    assert_eq!(report.total, 3);
}

#[tokio::test]
async fn sync_one_is_idempotent() {
    let t = setup().await;
    let rite = t.create_rite("REAA", "REAA").await;
    let product = t
        .create_product(json!({ "name": "Tablier", "price": 1000, "rites": [rite] }))
        .await;
    let id = id_of(&product);

    assert!(t.state.sync.sync_one(&id).await.unwrap());
    let first = t.get(&format!("/api/products/{}", id)).await;
    assert!(t.state.sync.sync_one(&id).await.unwrap());
    let second = t.get(&format!("/api/products/{}", id)).await;

    assert_eq!(first["rite_codes"], second["rite_codes"]);
    assert_eq!(first["updated_at"], second["updated_at"]);
}

#[tokio::test]
async fn taxonomy_listing_counts_and_hides_empty() {
    let t = setup().await;
    let reaa = t.create_rite("REAA", "REAA").await;
    t.create_rite("RER", "RER").await;
    t.create_product(json!({ "name": "Tablier", "price": 1000, "rites": [reaa] }))
        .await;

    let plain = t.get("/api/rites").await;
    assert_eq!(plain.as_array().unwrap().len(), 2);
    assert!(plain[0].get("productCount").is_none());

    let counted = t.get("/api/rites?withProductCount=true").await;
    let counts: Vec<(String, u64)> = counted
        .as_array()
        .unwrap()
        .iter()
        .map(|r| {
            (
                r["code"].as_str().unwrap().to_string(),
                r["productCount"].as_u64().unwrap(),
            )
        })
        .collect();
    assert!(counts.contains(&("REAA".to_string(), 1)));
    assert!(counts.contains(&("RER".to_string(), 0)));

    let non_empty = t.get("/api/rites?withProductCount=true&hideEmpty=true").await;
    assert_eq!(non_empty.as_array().unwrap().len(), 1);
    assert_eq!(non_empty[0]["code"], json!("REAA"));
}

#[tokio::test]
async fn duplicate_rite_code_conflicts() {
    let t = setup().await;
    t.create_rite("REAA", "REAA").await;

    let (status, body) = t
        .send(
            Method::POST,
            "/api/rites",
            Some(json!({ "name": "Autre", "code": "REAA" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 6501);
}

#[tokio::test]
async fn duplicate_product_slug_conflicts() {
    let t = setup().await;
    t.create_product(json!({ "name": "Tablier", "slug": "tablier", "price": 1000 }))
        .await;

    let (status, body) = t
        .send(
            Method::POST,
            "/api/products",
            Some(json!({ "name": "Autre tablier", "slug": "tablier", "price": 1000 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 6003);
}

#[tokio::test]
async fn unknown_product_returns_not_found() {
    let t = setup().await;
    let (status, _) = t.send(Method::GET, "/api/products/product:nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t
        .send(Method::POST, "/api/products/product:nope/sync", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_resync_reports_every_product() {
    let t = setup().await;
    t.create_product(json!({ "name": "Tablier", "price": 1000 }))
        .await;
    t.create_product(json!({ "name": "Cordon", "price": 1000 }))
        .await;

    let (status, report) = t.send(Method::POST, "/api/admin/resync", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total"], json!(2));
    assert_eq!(report["failures"], json!(0));
}
