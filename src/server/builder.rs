//! ServerBuilder for fluent API to build HTTP servers

use super::handlers::AppState;
use super::router::{build_api_routes, health_routes};
use crate::config::{PriceAdjustments, RentalsConfig};
use crate::core::assembler::{DEFAULT_DEADLINE, OrderAssembler};
use crate::core::pricing::PricingEngine;
use crate::core::service::{MovieCatalog, OrderRepository};
use crate::storage::seed::seed_demo_data;
use anyhow::Result;
use axum::Router;
use axum::http::Method;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builder for the rental HTTP server
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(InMemoryStore::new());
/// let app = ServerBuilder::new()
///     .with_store(store)
///     .with_price_adjustments(PriceAdjustments::default())
///     .build()?;
/// ```
pub struct ServerBuilder {
    catalog: Option<Arc<dyn MovieCatalog>>,
    orders: Option<Arc<dyn OrderRepository>>,
    adjustments: PriceAdjustments,
    request_timeout: Duration,
    cors: bool,
    seed_demo_data: bool,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            catalog: None,
            orders: None,
            adjustments: PriceAdjustments::default(),
            request_timeout: DEFAULT_DEADLINE,
            cors: true,
            seed_demo_data: false,
            custom_routes: Vec::new(),
        }
    }

    /// Apply the server settings of a loaded configuration
    pub fn with_config(self, config: &RentalsConfig, adjustments: PriceAdjustments) -> Self {
        self.with_price_adjustments(adjustments)
            .with_request_timeout(config.server.request_timeout())
            .with_cors(config.server.cors)
            .with_demo_data(config.seed_demo_data)
    }

    /// Set the movie catalog (required)
    pub fn with_catalog(mut self, catalog: Arc<dyn MovieCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Set the order repository (required)
    pub fn with_order_repository(mut self, orders: Arc<dyn OrderRepository>) -> Self {
        self.orders = Some(orders);
        self
    }

    /// Use one store as both catalog and order repository
    pub fn with_store<S>(self, store: Arc<S>) -> Self
    where
        S: MovieCatalog + OrderRepository + 'static,
    {
        self.with_catalog(store.clone()).with_order_repository(store)
    }

    /// Set the tag -> multiplier mapping
    pub fn with_price_adjustments(mut self, adjustments: PriceAdjustments) -> Self {
        self.adjustments = adjustments;
        self
    }

    /// Deadline of a whole order create/update
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Enable or disable permissive CORS
    pub fn with_cors(mut self, enabled: bool) -> Self {
        self.cors = enabled;
        self
    }

    /// Load the demo catalog before serving
    pub fn with_demo_data(mut self, enabled: bool) -> Self {
        self.seed_demo_data = enabled;
        self
    }

    /// Add custom routes to the server
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the handler state
    pub fn build_state(&self) -> Result<AppState> {
        let catalog = self
            .catalog
            .clone()
            .ok_or_else(|| anyhow::anyhow!("MovieCatalog is required. Call .with_catalog()"))?;
        let orders = self.orders.clone().ok_or_else(|| {
            anyhow::anyhow!("OrderRepository is required. Call .with_order_repository()")
        })?;

        let pricing = PricingEngine::new(Arc::new(self.adjustments.clone()));
        let assembler = OrderAssembler::new(catalog.clone(), orders, pricing)
            .with_deadline(self.request_timeout);

        Ok(AppState { catalog, assembler })
    }

    /// Build the final router
    pub fn build(self) -> Result<Router> {
        let state = self.build_state()?;
        Ok(self.into_router(state))
    }

    fn into_router(self, state: AppState) -> Router {
        let mut app = health_routes().merge(build_api_routes(state));
        for custom_router in self.custom_routes {
            app = app.merge(custom_router);
        }

        if self.cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers(Any);
            app = app.layer(cors);
        }

        app.layer(TraceLayer::new_for_http())
    }

    /// Serve the application with graceful shutdown
    ///
    /// Seeds the demo data first when enabled, then handles SIGTERM and
    /// SIGINT (Ctrl+C) for graceful shutdown.
    pub async fn serve(self, addr: &str) -> Result<()> {
        let state = self.build_state()?;
        if self.seed_demo_data {
            seed_demo_data(state.catalog.as_ref(), &state.assembler).await?;
        }

        let app = self.into_router(state);
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
