use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path as AxumPath, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use webaudit_bridge::{AutomationBridge, BridgeEvent, ProcedureInvoker};
use webaudit_core::{Config, Paths};
use webaudit_pipeline::AuditOrchestrator;
use webaudit_providers::{create_provider, Provider};

// ---------------------------------------------------------------------------
// Shared state passed to HTTP handlers
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct GatewayState {
    bridge: Arc<AutomationBridge>,
    orchestrator: Arc<AuditOrchestrator>,
    started_at: Instant,
}

pub async fn run(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let paths = Paths::new();
    paths.ensure_dirs()?;
    let config = Config::load_or_default(&paths)?;
    let host = host.unwrap_or_else(|| config.gateway.host.clone());
    let port = port.unwrap_or(config.gateway.port);

    let provider: Arc<dyn Provider> = Arc::from(create_provider(&config)?);
    let bridge = Arc::new(AutomationBridge::new(config.mcp.clone()));

    // Surface lifecycle events. Restart policy stays with the operator:
    // the bridge reports exits, it never restarts itself.
    let mut events = bridge.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                BridgeEvent::Ready => info!("Bridge ready"),
                BridgeEvent::Error(e) => error!(error = %e, "Bridge error"),
                BridgeEvent::Exit { code } => warn!(?code, "Automation subprocess exited"),
            }
        }
    });

    if let Err(e) = bridge.start().await {
        // Serve anyway; /health reports 503 until the bridge is ready.
        error!(error = %e, "Bridge failed to start; gateway will report unavailable");
    }

    let orchestrator = Arc::new(AuditOrchestrator::new(
        bridge.clone() as Arc<dyn ProcedureInvoker>,
        provider,
        config.audit.clone(),
    ));

    let state = GatewayState {
        bridge: bridge.clone(),
        orchestrator,
        started_at: Instant::now(),
    };

    let app = Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/tools", get(handle_tools))
        .route("/tools/:name", post(handle_tool_call))
        .route("/audit", post(handle_audit))
        .layer(middleware::from_fn(correlation_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gateway listening");
    axum::serve(listener, app).await?;

    bridge.stop().await;
    Ok(())
}

// ---------------------------------------------------------------------------
// Correlation-id + timing middleware
// ---------------------------------------------------------------------------

async fn correlation_middleware(req: Request, next: Next) -> Response {
    let correlation_id: String = Uuid::new_v4().to_string().chars().take(8).collect();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    info!(request_id = %correlation_id, %method, %path, "Request started");
    let mut response = next.run(req).await;
    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        request_id = %correlation_id,
        %method,
        %path,
        status = %response.status(),
        duration_ms,
        "Request completed"
    );

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert("x-correlation-id", value);
    }
    response
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn handle_root() -> impl IntoResponse {
    Json(json!({
        "name": "webaudit",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Web performance & security auditor",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "tools": "/tools",
            "audit": "/audit"
        }
    }))
}

async fn handle_health(State(state): State<GatewayState>) -> Response {
    let mcp = state.bridge.status().await;
    let code = if mcp.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = json!({
        "status": if mcp.ready { "healthy" } else { "unavailable" },
        "service": "webaudit",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime": state.started_at.elapsed().as_secs(),
        "mcp": mcp,
    });
    (code, Json(body)).into_response()
}

async fn handle_tools(State(state): State<GatewayState>) -> Response {
    let status = state.bridge.status().await;
    if !status.ready {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "Automation bridge is not ready" })),
        )
            .into_response();
    }

    let tools = state.bridge.procedures().await;
    let count = tools.len();
    Json(json!({ "tools": tools, "count": count })).into_response()
}

#[derive(Deserialize)]
struct ToolCallBody {
    #[serde(default)]
    arguments: serde_json::Value,
}

async fn handle_tool_call(
    State(state): State<GatewayState>,
    AxumPath(name): AxumPath<String>,
    Json(body): Json<ToolCallBody>,
) -> Response {
    let status = state.bridge.status().await;
    if !status.ready {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "Automation bridge is not ready" })),
        )
            .into_response();
    }

    let known = state
        .bridge
        .procedures()
        .await
        .iter()
        .any(|def| def.name == name);
    if !known {
        let err = webaudit_core::Error::UnknownProcedure(name.clone());
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response();
    }

    let args = if body.arguments.is_null() {
        json!({})
    } else {
        body.arguments
    };

    let start = Instant::now();
    let result = state.bridge.invoke(&name, args).await;
    let metadata = json!({
        "tool": name,
        "duration": start.elapsed().as_secs_f64(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    match result {
        Ok(result) => Json(json!({
            "success": true,
            "result": result,
            "metadata": metadata,
        }))
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "error": e.to_string(),
                "metadata": metadata,
            })),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
struct AuditRequest {
    url: String,
}

async fn handle_audit(
    State(state): State<GatewayState>,
    Json(req): Json<AuditRequest>,
) -> Response {
    if let Err(e) = super::validate_url(&req.url) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response();
    }

    if !state.bridge.status().await.ready {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "Automation bridge is not ready" })),
        )
            .into_response();
    }

    match state.orchestrator.run_audit(&req.url).await {
        Ok(report) => Json(report).into_response(),
        Err(failure) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": failure.to_string(),
                "phase": format!("{:?}", failure.phase).to_lowercase(),
            })),
        )
            .into_response(),
    }
}
