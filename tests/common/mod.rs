#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request},
    routing::get,
    Router,
};
use luminova_api::{
    auth::{AuthConfig, AuthService, CreateUserRequest, LoginCredentials},
    config::AppConfig,
    db::{self, DbConfig},
    entities::{ProductionOrderStatus, SalesOrderStatus},
    events::{self, EventSender},
    handlers::AppServices,
    services::inventory::CreateSupplyItemRequest,
    services::partners::CreatePartnerRequest,
    services::products::{ComponentRequirementRequest, CreateProductRequest},
    services::sales_orders::{CreateSalesOrderRequest, SalesOrderLineRequest},
    AppState,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

const TEST_PASSWORD: &str = "factory-floor-42";

/// Helper harness for spinning up application state backed by a private
/// SQLite database file per test.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub auth_service: Arc<AuthService>,
    token: String,
    db_file: PathBuf,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_file =
            std::env::temp_dir().join(format!("luminova_test_{}.db", Uuid::new_v4().simple()));
        let _ = std::fs::remove_file(&db_file);

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_file.display()),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            3600,
            86_400,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.default_account_password = TEST_PASSWORD.to_string();

        let pool = db::establish_connection_with_config(&DbConfig {
            url: cfg.database_url().to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        })
        .await
        .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_cfg = AuthConfig::new(
            cfg.jwt_secret.clone(),
            cfg.auth_issuer.clone(),
            cfg.auth_audience.clone(),
            Duration::from_secs(cfg.jwt_expiration as u64),
            Duration::from_secs(cfg.refresh_token_expiration as u64),
            cfg.default_account_password.clone(),
        );
        let auth_service = Arc::new(AuthService::new(auth_cfg, db_arc.clone()));
        let services = AppServices::new(db_arc.clone(), event_sender.clone());

        // Seed the admin account used for authenticated requests.
        services
            .roles
            .create_role("admin".to_string(), None, Vec::new())
            .await
            .expect("seed admin role");
        auth_service
            .create_user(CreateUserRequest {
                name: "Test Admin".to_string(),
                email: "admin@test.local".to_string(),
                password: None,
                roles: vec!["admin".to_string()],
            })
            .await
            .expect("seed admin user");
        let tokens = auth_service
            .login(&LoginCredentials {
                email: "admin@test.local".to_string(),
                password: TEST_PASSWORD.to_string(),
            })
            .await
            .expect("admin login");

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
            auth: auth_service.clone(),
        };

        let auth_for_layer = auth_service.clone();
        let router = Router::new()
            .route("/", get(|| async { "up" }))
            .nest("/api/v1", luminova_api::api_v1_routes())
            .nest_service(
                "/auth",
                luminova_api::auth::auth_routes().with_state(auth_service.clone()),
            )
            .layer(axum::middleware::from_fn_with_state(
                auth_for_layer,
                |axum::extract::State(auth): axum::extract::State<Arc<AuthService>>,
                 mut req: Request<Body>,
                 next: axum::middleware::Next| async move {
                    req.extensions_mut().insert(auth);
                    next.run(req).await
                },
            ))
            .with_state(state.clone());

        Self {
            router,
            state,
            auth_service,
            token: tokens.access_token,
            db_file,
            _event_task: event_task,
        }
    }

    /// Bearer token for the default admin user.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    // ---- Seeding helpers -------------------------------------------------

    pub async fn seed_customer(&self, name: &str) -> Uuid {
        self.state
            .services
            .customers
            .create(CreatePartnerRequest {
                name: name.to_string(),
                email: None,
                phone: None,
                address: None,
            })
            .await
            .expect("seed customer")
            .id
    }

    pub async fn seed_supplier(&self, name: &str) -> Uuid {
        self.state
            .services
            .suppliers
            .create(CreatePartnerRequest {
                name: name.to_string(),
                email: None,
                phone: None,
                address: None,
            })
            .await
            .expect("seed supplier")
            .id
    }

    pub async fn seed_product(&self, sku: &str, unit_price: Decimal) -> Uuid {
        self.state
            .services
            .products
            .create_product(CreateProductRequest {
                sku: sku.to_string(),
                name: format!("Product {}", sku),
                description: None,
                unit_price,
                image_path: None,
            })
            .await
            .expect("seed product")
            .id
    }

    pub async fn seed_supply_item(&self, sku: &str, stock: i32) -> Uuid {
        self.state
            .services
            .inventory
            .create_supply_item(CreateSupplyItemRequest {
                sku: sku.to_string(),
                name: format!("Supply {}", sku),
                stock,
                reorder_threshold: 0,
                unit_cost: Decimal::ONE,
                image_path: None,
            })
            .await
            .expect("seed supply item")
            .id
    }

    pub async fn set_bom(&self, product_id: Uuid, lines: &[(Uuid, i32)]) {
        let components = lines
            .iter()
            .map(|(supply_item_id, quantity_per_unit)| ComponentRequirementRequest {
                supply_item_id: *supply_item_id,
                quantity_per_unit: *quantity_per_unit,
            })
            .collect();
        self.state
            .services
            .products
            .set_components(product_id, components)
            .await
            .expect("seed bill of materials");
    }

    /// Creates a sales order with one line per (product, quantity) pair.
    pub async fn create_sales_order(
        &self,
        customer_id: Uuid,
        lines: &[(Uuid, i32)],
    ) -> luminova_api::services::sales_orders::CreatedSalesOrder {
        self.state
            .services
            .sales_orders
            .create_order(
                CreateSalesOrderRequest {
                    customer_id,
                    lines: lines
                        .iter()
                        .map(|(product_id, quantity)| SalesOrderLineRequest {
                            product_id: *product_id,
                            quantity: *quantity,
                        })
                        .collect(),
                    notes: None,
                },
                Some("tests".to_string()),
            )
            .await
            .expect("create sales order")
    }

    /// Drives one production order from pending all the way to completed.
    pub async fn complete_production_order(&self, production_order_id: Uuid) {
        for status in [
            ProductionOrderStatus::SuppliesReceived,
            ProductionOrderStatus::Started,
            ProductionOrderStatus::Completed,
        ] {
            self.state
                .services
                .production_orders
                .transition(production_order_id, status, None)
                .await
                .expect("production transition");
        }
    }

    pub async fn sales_order_status(&self, order_id: Uuid) -> SalesOrderStatus {
        self.state
            .services
            .sales_orders
            .get_order(order_id)
            .await
            .expect("fetch sales order")
            .status
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
        let _ = std::fs::remove_file(&self.db_file);
    }
}
