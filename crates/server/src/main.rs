//! recipebox server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use recipebox_api::{AppState, ChannelRegistry};
use recipebox_common::{Config, ErrorLog};
use recipebox_core::{
    ActivityService, BookmarkService, CommentService, FanoutQueue, FeedService,
    FollowingService, HealthService, LikeService, NotificationService, RecipeService,
    UserService,
};
use recipebox_db::repositories::{
    ActivityRepository, BookmarkRepository, CommentRepository, FollowingRepository,
    LikeRepository, NotificationRepository, RecipeRepository, UserRepository,
};
use sea_orm::DatabaseConnection;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long the fan-out worker may take to drain after the HTTP server stops.
const FANOUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing() {
    let json = std::env::var("RECIPEBOX_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recipebox=debug,tower_http=debug".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

/// Wire repositories and services. The fan-out sender is attached to the
/// activity service before it is shared with the domain services.
fn build_state(
    db: &Arc<DatabaseConnection>,
    config: &Config,
    fanout: &FanoutQueue,
    notification_service: NotificationService,
    registry: ChannelRegistry,
    error_log: ErrorLog,
) -> AppState {
    let user_repo = UserRepository::new(Arc::clone(db));
    let recipe_repo = RecipeRepository::new(Arc::clone(db));
    let following_repo = FollowingRepository::new(Arc::clone(db));
    let activity_repo = ActivityRepository::new(Arc::clone(db));

    let mut activity_service = ActivityService::new(activity_repo.clone(), recipe_repo.clone());
    activity_service.set_fanout(fanout.sender());
    activity_service.set_error_log(error_log.clone());

    AppState {
        user_service: UserService::new(user_repo.clone()),
        following_service: FollowingService::new(following_repo.clone(), user_repo),
        recipe_service: RecipeService::new(recipe_repo.clone(), activity_service.clone()),
        comment_service: CommentService::new(
            CommentRepository::new(Arc::clone(db)),
            recipe_repo.clone(),
            activity_service.clone(),
        ),
        like_service: LikeService::new(
            LikeRepository::new(Arc::clone(db)),
            recipe_repo.clone(),
            activity_service.clone(),
        ),
        bookmark_service: BookmarkService::new(
            BookmarkRepository::new(Arc::clone(db)),
            recipe_repo,
            activity_service,
        ),
        feed_service: FeedService::new(following_repo, activity_repo, config.server.url.clone()),
        notification_service,
        health_service: HealthService::new(Arc::clone(db), error_log.clone()),
        registry,
        error_log,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting recipebox server...");

    let config = Config::load()?;

    let db = recipebox_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    recipebox_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);
    let error_log = ErrorLog::new(config.health.error_log_capacity);
    let registry = ChannelRegistry::new();

    let mut notification_service = NotificationService::new(
        NotificationRepository::new(Arc::clone(&db)),
        RecipeRepository::new(Arc::clone(&db)),
        UserRepository::new(Arc::clone(&db)),
        FollowingRepository::new(Arc::clone(&db)),
    );
    notification_service.set_event_publisher(Arc::new(registry.clone()));
    notification_service.set_concurrency(config.realtime.fanout_concurrency);
    notification_service.set_broadcast_on_list(config.realtime.broadcast_on_list);

    let fanout = FanoutQueue::new(config.realtime.fanout_buffer, error_log.clone());
    let state = build_state(
        &db,
        &config,
        &fanout,
        notification_service.clone(),
        registry,
        error_log,
    );
    let fanout_worker = fanout.start(notification_service);
    info!("Notification fan-out worker started");

    let app = recipebox_api::app(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router and every sender it held are gone; the worker finishes the
    // queued activities and exits.
    info!("Draining notification fan-out queue...");
    match tokio::time::timeout(FANOUT_DRAIN_TIMEOUT, fanout_worker).await {
        Ok(Ok(())) => info!("Fan-out queue drained"),
        Ok(Err(e)) => error!(error = %e, "Fan-out worker panicked"),
        Err(_) => warn!("Fan-out queue did not drain in time"),
    }

    info!("Server shutdown complete");
    Ok(())
}
