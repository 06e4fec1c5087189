mod api;
mod config;
mod db;
mod images;
mod models;
mod ratelimit;
mod schema;
mod store;

use axum::extract::{DefaultBodyLimit, MatchedPath};
use axum::http::{header, HeaderValue, Method, Request};
use axum::routing::get;
use axum::{middleware, Router};
use config::Config;
use images::ImageStore;
use ratelimit::RateLimiter;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{self, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::Span;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use utoipa_swagger_ui::SwaggerUi;

/// Application context shared across all handlers; constructed once at
/// startup, no hidden module-level state.
pub struct AppContext {
    pub pool: db::DbPool,
    pub images: Option<ImageStore>,
    pub rate_limiter: RateLimiter,
    pub config: Config,
}

pub type AppState = Arc<AppContext>;

fn init_telemetry() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.iter().any(|origin| origin == "*") {
        layer.allow_origin(cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        layer.allow_origin(origins)
    }
}

struct SeedRecipe {
    title: &'static str,
    ingredients: &'static [&'static str],
    instructions: &'static str,
}

const SAMPLE_RECIPES: &[SeedRecipe] = &[
    SeedRecipe {
        title: "Tiramisù",
        ingredients: &[
            "300 g di savoiardi",
            "3 uova (tuorli + albumi montati)",
            "250 g di mascarpone",
            "300 ml di caffè espresso freddo",
            "80 g di zucchero",
            "Cacao amaro q.b.",
        ],
        instructions: "Monta i tuorli con lo zucchero fino a ottenere una crema chiara e spumosa. \
            Aggiungi il mascarpone e mescola bene. Monta a neve gli albumi e incorporali \
            delicatamente alla crema. Intingi velocemente i savoiardi nel caffè e disponili in \
            una pirofila. Copri con uno strato di crema, poi continua alternando savoiardi e \
            crema. Termina con crema e spolvera di cacao amaro. Lascia riposare in frigo almeno \
            3 ore prima di servire.",
    },
    SeedRecipe {
        title: "Carbonara",
        ingredients: &[
            "200 g di spaghetti",
            "2 uova (solo i tuorli)",
            "80 g di guanciale",
            "40 g di pecorino romano grattugiato",
            "Pepe nero q.b.",
        ],
        instructions: "Cuoci gli spaghetti in acqua salata. Rosola il guanciale a cubetti fino a \
            renderlo croccante. Sbatti i tuorli con il pecorino e abbondante pepe. Scola la \
            pasta al dente, unisci al guanciale e togli dal fuoco. Aggiungi la crema di uova e \
            pecorino, mescola velocemente. Servi subito con altro pecorino e pepe.",
    },
];

/// Start from a clean collection, then insert the samples.
fn seed(pool: &db::DbPool) -> anyhow::Result<()> {
    let cleared = store::clear(pool)?;
    tracing::info!("Cleared {} existing recipes", cleared);

    for sample in SAMPLE_RECIPES {
        let ingredients: Vec<String> = sample.ingredients.iter().map(|s| s.to_string()).collect();
        let recipe = store::create(pool, sample.title, &ingredients, sample.instructions, "")?;
        tracing::info!("Seeded {} ({})", recipe.title, recipe.id);
    }

    Ok(())
}

async fn root() -> &'static str {
    "API is working!"
}

#[tokio::main]
async fn main() {
    // Check for --openapi flag to dump spec and exit
    if env::args().any(|arg| arg == "--openapi") {
        let spec = api::openapi().to_pretty_json().unwrap();
        println!("{}", spec);
        return;
    }

    init_telemetry();

    let config = Config::from_env();
    let pool = db::create_pool(&config.database_url);

    if env::args().any(|arg| arg == "--seed") {
        seed(&pool).expect("Seeding failed");
        tracing::info!("Seed done");
        return;
    }

    let images = match (&config.image_dir, &config.public_base_url) {
        (Some(dir), Some(base)) => Some(ImageStore::new(dir.clone(), base)),
        _ => {
            tracing::warn!("IMAGE_DIR / PUBLIC_BASE_URL not set, image uploads disabled");
            None
        }
    };

    let state: AppState = Arc::new(AppContext {
        pool,
        rate_limiter: RateLimiter::new(config.rate_limit_max, config.rate_limit_window),
        images,
        config: config.clone(),
    });

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi());

    let mut app = Router::new()
        .route("/", get(root))
        .route("/healthz", get(api::health::healthz))
        .nest("/recipes", api::recipes::router())
        .merge(swagger_ui);

    if let Some(images) = state.images.as_ref() {
        app = app.nest_service("/uploads", ServeDir::new(images.root()));
    }

    let app = app
        .fallback(api::route_not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            ratelimit::require_capacity,
        ))
        .with_state(state)
        // Form text plus the capped image field
        .layer(DefaultBodyLimit::max(config.max_upload_bytes + 512 * 1024))
        .layer(cors_layer(&config.allowed_origins))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());

                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %matched_path,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &Span| {
                        let status = response.status().as_u16();
                        if status >= 500 {
                            tracing::error!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request failed with server error"
                            );
                        } else {
                            tracing::info!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request completed"
                            );
                        }
                    },
                ),
        );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");
    tracing::info!("Server running on port {}", config.port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server failed");
}
