use ai_client::AssistantConfig;
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{analysis_handlers, chat_handlers, handlers, repository::CalculatorRepository};

/// Shared by every handler.
pub struct AppState {
    pub repo: Arc<dyn CalculatorRepository>,
    /// `None` when no API key is configured; `/api/chat` then reports an error.
    pub assistant: Option<AssistantConfig>,
    /// Held by every worksheet write from load to save, so overlapping edits
    /// apply one after another instead of overwriting each other.
    pub edits: Mutex<()>,
}

impl AppState {
    pub fn new(repo: Arc<dyn CalculatorRepository>, assistant: Option<AssistantConfig>) -> Self {
        Self {
            repo,
            assistant,
            edits: Mutex::new(()),
        }
    }
}

pub type SharedState = Arc<AppState>;

/// Create the main application router with all API endpoints
pub fn create_router(state: SharedState) -> Router {
    // Create CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Worksheets
        .route(
            "/api/sales-forecast",
            get(handlers::get_sales_forecast).put(handlers::put_sales_forecast),
        )
        .route("/api/sales-forecast/cells", patch(handlers::patch_sales_cell))
        .route(
            "/api/salaries",
            get(handlers::get_salaries).put(handlers::put_salaries),
        )
        .route("/api/salaries/rows", post(handlers::add_salary_row))
        .route(
            "/api/salaries/rows/:id",
            patch(handlers::rename_salary_row).delete(handlers::remove_salary_row),
        )
        .route("/api/salaries/cells", patch(handlers::patch_salary_cell))
        .route(
            "/api/expenses",
            get(handlers::get_expenses).put(handlers::put_expenses),
        )
        .route("/api/expenses/rows", post(handlers::add_expense_row))
        .route(
            "/api/expenses/rows/:index",
            patch(handlers::relabel_expense_row).delete(handlers::remove_expense_row),
        )
        .route("/api/expenses/cells", patch(handlers::patch_expense_cell))
        .route(
            "/api/variable-costs",
            get(handlers::get_variable_costs).put(handlers::put_variable_costs),
        )
        .route("/api/variable-costs/rows", post(handlers::add_variable_cost_row))
        .route(
            "/api/variable-costs/rows/:id",
            patch(handlers::edit_variable_cost_row).delete(handlers::remove_variable_cost_row),
        )
        .route(
            "/api/startup-costs",
            get(handlers::get_startup_costs).put(handlers::put_startup_costs),
        )
        .route(
            "/api/unit-economics",
            get(handlers::get_unit_economics).put(handlers::put_unit_economics),
        )
        .route(
            "/api/unit-economics/calculate",
            post(handlers::calculate_unit_economics),
        )
        .route(
            "/api/projection",
            get(handlers::get_projection).put(handlers::put_projection),
        )
        .route(
            "/api/glossary",
            get(handlers::get_glossary).put(handlers::put_glossary),
        )
        // Analyses
        .route("/api/break-even", get(analysis_handlers::get_break_even))
        .route(
            "/api/break-even/simple",
            post(analysis_handlers::calculate_simple_break_even),
        )
        .route("/api/forecast-pl", get(analysis_handlers::get_profit_and_loss))
        .route(
            "/api/forecast-pl/predictions",
            get(analysis_handlers::get_predictions),
        )
        .route(
            "/api/forecast-pl/snapshot",
            get(analysis_handlers::get_snapshot).post(analysis_handlers::create_snapshot),
        )
        .route("/api/forecast", post(analysis_handlers::forecast_series))
        // Assistant
        .route("/api/chat", post(chat_handlers::chat))
        // Add shared state
        .with_state(state)
        // Add middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::StoreRepository;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use database::{JsonFileStore, MemoryStore};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app_with(store: MemoryStore) -> Router {
        create_router(Arc::new(AppState::new(
            Arc::new(StoreRepository::new(Arc::new(store))),
            None,
        )))
    }

    fn app() -> Router {
        app_with(MemoryStore::default())
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(match body {
                Some(b) => Body::from(b.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn approx(value: &Value, expected: f64) -> bool {
        value.as_f64().map(|v| (v - expected).abs() < 1e-6).unwrap_or(false)
    }

    fn flat(value: f64, len: usize) -> Value {
        json!(vec![value; len])
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_sales_cell_edits_persist() {
        let app = app();
        let (status, _) = send(
            &app,
            "PATCH",
            "/api/sales-forecast/cells",
            Some(json!({"series": "unitsSold", "index": 0, "value": "10"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        send(
            &app,
            "PATCH",
            "/api/sales-forecast/cells",
            Some(json!({"series": "pricePerUnit", "index": 0, "value": 25})),
        )
        .await;

        let (status, body) = send(&app, "GET", "/api/sales-forecast", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(approx(&body["table"]["unitsSold"][0], 10.0));
        assert!(approx(&body["breakdown"]["revenue"][0], 250.0));
        assert!(approx(&body["breakdown"]["totalRevenue"], 250.0));
    }

    #[tokio::test]
    async fn test_sales_cell_rejects_bad_edits() {
        let app = app();
        let (status, body) = send(
            &app,
            "PATCH",
            "/api/sales-forecast/cells",
            Some(json!({"series": "unitsSold", "index": 12, "value": "1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("out of range"));

        let (status, _) = send(
            &app,
            "PATCH",
            "/api/sales-forecast/cells",
            Some(json!({"series": "discounts", "index": 0, "value": "1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_cell_edits_all_persist() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("planner.json")).unwrap();
        let app = create_router(Arc::new(AppState::new(
            Arc::new(StoreRepository::new(Arc::new(store))),
            None,
        )));

        let edits: Vec<_> = (0..12)
            .map(|i| {
                let app = app.clone();
                tokio::spawn(async move {
                    send(
                        &app,
                        "PATCH",
                        "/api/sales-forecast/cells",
                        Some(json!({"series": "unitsSold", "index": i, "value": 1})),
                    )
                    .await
                    .0
                })
            })
            .collect();
        for edit in edits {
            assert_eq!(edit.await.unwrap(), StatusCode::OK);
        }

        let (_, body) = send(&app, "GET", "/api/sales-forecast", None).await;
        assert!(approx(&body["breakdown"]["totalUnits"], 12.0), "lost edits: {}", body["table"]["unitsSold"]);
        assert_eq!(body["table"]["unitsSold"], flat(1.0, 12));
    }

    #[tokio::test]
    async fn test_replacing_worksheets_normalizes_lengths() {
        let app = app();
        let (_, body) = send(
            &app,
            "PUT",
            "/api/salaries",
            Some(json!({"rows": [{"id": 1, "name": "CEO", "monthlySalaries": [100, 100]}]})),
        )
        .await;
        assert_eq!(body["rows"][0]["monthlySalaries"].as_array().unwrap().len(), 12);

        let (_, body) = send(
            &app,
            "PUT",
            "/api/expenses",
            Some(json!([{"label": "Rent", "values": flat(10.0, 15)}])),
        )
        .await;
        assert_eq!(body["rows"][0]["values"], flat(10.0, 12));
        assert!(approx(&body["total"], 120.0));

        let (_, body) = send(
            &app,
            "PUT",
            "/api/projection",
            Some(json!({"sales": [1, 2], "price": [5, 5, 5, 5, 5, 5, 5], "cost": [], "rows": []})),
        )
        .await;
        assert_eq!(body["projection"]["sales"], json!([1.0, 2.0, 0.0, 0.0, 0.0]));
        assert_eq!(body["projection"]["price"].as_array().unwrap().len(), 5);
        assert_eq!(body["projection"]["cost"], flat(0.0, 5));
    }

    #[tokio::test]
    async fn test_stored_projection_is_normalized_on_read() {
        let store = MemoryStore::with_entries([(
            "five_year_projection",
            json!({"sales": [3], "price": [2], "cost": [], "rows": []}),
        )]);
        let (_, body) = send(&app_with(store), "GET", "/api/projection", None).await;
        assert_eq!(body["projection"]["sales"], json!([3.0, 0.0, 0.0, 0.0, 0.0]));
        assert_eq!(body["summary"]["years"].as_array().unwrap().len(), 5);
        assert!(approx(&body["summary"]["years"][0]["revenue"], 6.0));
    }

    #[tokio::test]
    async fn test_variable_costs_give_cogs_per_unit() {
        let app = app();
        let (status, body) = send(&app, "GET", "/api/variable-costs", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"][0]["name"], "Raw material");
        assert!(approx(&body["breakdown"]["cogsPerUnit"], 0.0));

        let (_, body) = send(&app, "POST", "/api/variable-costs/rows", Some(json!({}))).await;
        assert_eq!(body["rows"][3]["id"], 4);

        send(&app, "PATCH", "/api/variable-costs/rows/1", Some(json!({"cost": "12.5"}))).await;
        let (status, body) = send(
            &app,
            "PATCH",
            "/api/variable-costs/rows/4",
            Some(json!({"name": "Shipping", "cost": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"][3]["name"], "Shipping");
        assert!(approx(&body["breakdown"]["cogsPerUnit"], 15.5));
        assert_eq!(body["breakdown"]["itemCount"], 4);

        let (status, _) = send(&app, "PATCH", "/api/variable-costs/rows/9", Some(json!({"cost": 1}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(&app, "DELETE", "/api/variable-costs/rows/1", None).await;
        assert!(approx(&body["breakdown"]["cogsPerUnit"], 3.0));
    }

    #[tokio::test]
    async fn test_corrupt_document_falls_back_to_defaults() {
        let store = MemoryStore::with_entries([("sales_forecast_table", json!(42))]);
        let (status, body) = send(&app_with(store), "GET", "/api/sales-forecast", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["table"]["unitsSold"], flat(0.0, 12));
    }

    #[tokio::test]
    async fn test_salary_roster_edits() {
        let app = app();
        let (status, body) = send(&app, "POST", "/api/salaries/rows", Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"][3]["id"], 4);
        assert_eq!(body["rows"][3]["name"], "Emp 4");

        let (_, body) = send(
            &app,
            "PATCH",
            "/api/salaries/cells",
            Some(json!({"id": 4, "month": 1, "value": "2500"})),
        )
        .await;
        assert!(approx(&body["totals"][1], 2500.0));
        assert!(approx(&body["total"], 2500.0));

        let (status, _) = send(&app, "DELETE", "/api/salaries/rows/99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, "DELETE", "/api/salaries/rows/4", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_expense_roster_edits() {
        let app = app();
        let (_, body) = send(&app, "POST", "/api/expenses/rows", Some(json!({"label": "Insurance"}))).await;
        let index = body["rows"].as_array().unwrap().len() - 1;
        assert_eq!(body["rows"][index]["label"], "Insurance");

        let (status, body) = send(
            &app,
            "PATCH",
            "/api/expenses/cells",
            Some(json!({"index": index, "month": 0, "value": "120.5"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(approx(&body["totals"][0], 120.5));

        let (status, _) = send(&app, "DELETE", "/api/expenses/rows/40", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_break_even_composes_stored_worksheets() {
        let app = app();
        send(
            &app,
            "PUT",
            "/api/sales-forecast",
            Some(json!({
                "unitsSold": flat(100.0, 12),
                "pricePerUnit": flat(50.0, 12),
                "costPerUnit": flat(20.0, 12),
            })),
        )
        .await;
        send(
            &app,
            "PUT",
            "/api/salaries",
            Some(json!({"rows": [{"id": 1, "name": "CEO", "monthlySalaries": flat(1000.0, 12)}]})),
        )
        .await;

        let (status, body) = send(&app, "GET", "/api/break-even", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(approx(&body["totalFixedCosts"], 12000.0));
        assert!(approx(&body["grossMarginPct"], 60.0));
        assert!(approx(&body["breakEvenSales"], 20000.0));
        assert!(approx(&body["breakEvenUnits"], 400.0));
    }

    #[tokio::test]
    async fn test_break_even_without_sales_is_undefined() {
        let (status, body) = send(&app(), "GET", "/api/break-even", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["breakEvenSales"].is_null());
        assert!(body["breakEvenUnits"].is_null());
    }

    #[tokio::test]
    async fn test_simple_break_even() {
        let (status, body) = send(
            &app(),
            "POST",
            "/api/break-even/simple",
            Some(json!({"pricePerUnit": 50, "costPerUnit": 30, "fixedCosts": 550})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(approx(&body["breakEvenUnits"], 28.0));
        assert!(approx(&body["breakEvenSales"], 1400.0));
    }

    #[tokio::test]
    async fn test_unit_economics_calculate_does_not_persist() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/unit-economics/calculate",
            Some(json!({"customersAtStart": 100, "customersAtEnd": 90})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(approx(&body["churnRate"], 0.1));

        let (_, body) = send(&app, "GET", "/api/unit-economics", None).await;
        assert!(approx(&body["inputs"]["revenue"], 119.0));
    }

    #[tokio::test]
    async fn test_snapshot_lifecycle() {
        let app = app();
        let (status, _) = send(&app, "GET", "/api/forecast-pl/snapshot", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, created) = send(&app, "POST", "/api/forecast-pl/snapshot", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["profitAndLoss"]["months"].as_array().unwrap().len(), 12);

        let (status, stored) = send(&app, "GET", "/api/forecast-pl/snapshot", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored["generatedAt"], created["generatedAt"]);
    }

    #[tokio::test]
    async fn test_forecast_endpoint() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/forecast",
            Some(json!({"values": [100, 200, 300], "floorAtZero": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["future"].as_array().unwrap().len(), 6);
        assert!(approx(&body["future"][0], 400.0));

        let (status, body) = send(&app, "POST", "/api/forecast", Some(json!({"values": [1, 2]}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("at least 3"));
    }

    #[tokio::test]
    async fn test_projection_and_glossary_defaults() {
        let app = app();
        let (_, body) = send(&app, "GET", "/api/projection", None).await;
        assert!(approx(&body["summary"]["years"][4]["revenue"], -120.0));

        let (_, body) = send(&app, "GET", "/api/glossary", None).await;
        assert_eq!(body.as_array().unwrap().len(), 12);
    }

    #[tokio::test]
    async fn test_startup_costs_budget() {
        let app = app();
        let (status, body) = send(
            &app,
            "PUT",
            "/api/startup-costs",
            Some(json!({
                "startupCost": [{"id": "registration", "label": "Registration", "value": 500}],
                "capWork": [{"id": "capital_work", "label": "Fit-out", "value": 2000}],
                "startUpCapital": [{"id": "start_up_capital", "label": "Share Capital", "value": 10000}]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(approx(&body["budget"]["startingOperationsBudget"], 7500.0));
    }

    #[tokio::test]
    async fn test_chat_without_key_reports_error() {
        let (status, body) = send(
            &app(),
            "POST",
            "/api/chat",
            Some(json!({"message": "hi", "history": []})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("Gemini API key not configured"));
    }
}
