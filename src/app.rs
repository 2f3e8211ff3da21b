use anyhow::Context;
use axum::{
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{AuthGate, DenyMessages, PolicyTable, RoutePolicy, StaticWhitelist};
use crate::chat::{ChatService, ConversationStore, LanguageModel, OllamaModel};
use crate::config::{AppConfig, SecurityConfig};
use crate::handlers::{elevated, protected, public};
use crate::middleware::auth_gate_middleware;

/// Shared handles passed to every handler and to the gate middleware.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AuthGate>,
    pub policies: Arc<PolicyTable>,
    pub whitelist: Arc<StaticWhitelist>,
    pub chat: Arc<ChatService>,
    pub token_header: Arc<String>,
}

impl AppState {
    pub fn new(config: &AppConfig, whitelist: StaticWhitelist, model: Arc<dyn LanguageModel>) -> Self {
        let whitelist = Arc::new(whitelist);
        let gate = AuthGate::new(whitelist.clone(), DenyMessages::from(&config.auth));
        let chat = ChatService::new(
            model,
            ConversationStore::from_config(&config.conversation),
            config.compiler.max_limit,
        );

        Self {
            gate: Arc::new(gate),
            policies: Arc::new(policy_table()),
            whitelist,
            chat: Arc::new(chat),
            token_header: Arc::new(config.auth.token_header.clone()),
        }
    }
}

/// Static route policies: admin scope plus per-route entries.
pub fn policy_table() -> PolicyTable {
    PolicyTable::new()
        .scope("/api/admin", RoutePolicy::required().with_roles(["ADMIN"]))
        .route(Method::POST, "/api/compile", RoutePolicy::required())
        .route(Method::POST, "/api/chat", RoutePolicy::required())
        .route(Method::GET, "/api/auth/whoami", RoutePolicy::optional())
        .route(
            Method::GET,
            "/api/admin/whitelist/:user_id",
            RoutePolicy::required().with_roles(["ADMIN", "OPERATOR"]),
        )
}

pub fn router(state: AppState, security: &SecurityConfig) -> Router {
    let api = Router::new()
        .route("/api/compile", post(protected::compile_post))
        .route("/api/chat", post(protected::chat_post))
        .route(
            "/api/conversation/:id",
            get(protected::conversation_get).delete(protected::conversation_delete),
        )
        .route("/api/auth/whoami", get(protected::whoami_get))
        .route("/api/admin/whitelist", get(elevated::whitelist_list))
        .route("/api/admin/whitelist/:user_id", get(elevated::whitelist_show))
        .route_layer(from_fn_with_state(state.clone(), auth_gate_middleware));

    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(api)
        .with_state(state)
        .layer(cors_layer(security))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(tower_http::cors::Any)
    }
}

/// Seed the whitelist from the inline list and the YAML file, file entries last.
pub fn load_whitelist(config: &AppConfig) -> anyhow::Result<StaticWhitelist> {
    let mut whitelist = StaticWhitelist::default();

    if let Some(inline) = config.auth.whitelist.as_deref() {
        whitelist = whitelist.merge(StaticWhitelist::parse_inline(inline).context("parsing AUTH_WHITELIST")?);
    }
    if let Some(path) = config.auth.whitelist_file.as_deref() {
        let from_file =
            StaticWhitelist::from_yaml_file(path).with_context(|| format!("loading whitelist file {}", path))?;
        whitelist = whitelist.merge(from_file);
    }

    if whitelist.is_empty() {
        tracing::warn!("Whitelist is empty: every protected route will answer 403");
    } else {
        tracing::info!("Whitelist loaded with {} user(s)", whitelist.len());
    }
    Ok(whitelist)
}

pub fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let whitelist = load_whitelist(config)?;
    let model = OllamaModel::new(&config.llm).context("building language model client")?;
    Ok(AppState::new(config, whitelist, Arc::new(model)))
}

/// Bind and run the HTTP server until the process is stopped.
pub async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    let state = build_state(config)?;
    let app = router(state, &config.security);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("ChatBI API listening on http://{}", bind_addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
