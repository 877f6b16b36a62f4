use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::config::app_conf::AppConfig;
use crate::config::{MongoConfig, NotificationConfig, RateLimitConfig, RedisConfig};
use crate::handler::quote_handler::QuoteHandlerState;
use crate::repository::comment_repo::MongoCommentRepository;
use crate::repository::line_item_repo::MongoLineItemRepository;
use crate::repository::material_repo::MongoMaterialRepository;
use crate::repository::quote_repo::MongoQuoteRepository;
use crate::router::line_item_router::line_item_router;
use crate::router::material_router::material_router;
use crate::router::quote_router::quote_router;
use crate::router::webhook_router::webhook_router;
use crate::service::material_service::MaterialServiceImpl;
use crate::service::pricing_service::PricingServiceImpl;
use crate::service::quote_service::QuoteServiceImpl;
use crate::service::revision_service::RevisionServiceImpl;
use crate::util::notification::RedisNotificationQueue;
use crate::util::rate_limit::RedisRateLimiter;
use crate::util::redis::{RedisService, RedisServiceTrait};

pub struct App {
    config: AppConfig,
    router: Router,
    pub quote_service: Arc<QuoteServiceImpl>,
    pub pricing_service: Arc<PricingServiceImpl>,
    pub revision_service: Arc<RevisionServiceImpl>,
    pub material_service: Arc<MaterialServiceImpl>,
}

impl App {
    pub async fn new() -> Self {
        let config = AppConfig::from_env();
        let mongo_config = MongoConfig::from_env().expect("Mongo config error");
        let redis_config = RedisConfig::from_env().expect("Redis config error");
        let rate_limit_config = RateLimitConfig::from_env().expect("Rate limit config error");
        let notification_config =
            NotificationConfig::from_env().expect("Notification config error");

        let redis_service = Arc::new(
            RedisService::new(redis_config)
                .await
                .expect("Redis service error"),
        ) as Arc<dyn RedisServiceTrait>;
        let rate_limiter = Arc::new(RedisRateLimiter::new(
            rate_limit_config,
            redis_service.clone(),
        ));
        let notification = Arc::new(RedisNotificationQueue::new(
            notification_config,
            redis_service,
        ));

        let quote_repo = Arc::new(
            MongoQuoteRepository::new(&mongo_config)
                .await
                .expect("Quote repo error"),
        );
        let line_item_repo = Arc::new(
            MongoLineItemRepository::new(&mongo_config)
                .await
                .expect("Line item repo error"),
        );
        let material_repo = Arc::new(
            MongoMaterialRepository::new(&mongo_config)
                .await
                .expect("Material repo error"),
        );
        let comment_repo = Arc::new(
            MongoCommentRepository::new(&mongo_config)
                .await
                .expect("Comment repo error"),
        );

        let quote_service = Arc::new(QuoteServiceImpl::new(
            quote_repo.clone(),
            line_item_repo.clone(),
            comment_repo.clone(),
            notification.clone(),
            rate_limiter,
        ));
        let pricing_service = Arc::new(PricingServiceImpl::new(
            quote_repo.clone(),
            line_item_repo.clone(),
            material_repo.clone(),
        ));
        let revision_service = Arc::new(RevisionServiceImpl::new(
            quote_repo,
            line_item_repo,
            comment_repo,
            notification,
        ));
        let material_service = Arc::new(MaterialServiceImpl::new(material_repo));

        let mut app = App {
            config,
            router: Router::new(),
            quote_service,
            pricing_service,
            revision_service,
            material_service,
        };
        app.router = app.create_router();
        app
    }

    fn create_router(&self) -> Router {
        let quote_state = QuoteHandlerState {
            quote_service: self.quote_service.clone(),
            revision_service: self.revision_service.clone(),
        };
        Router::new()
            .merge(quote_router(quote_state))
            .merge(line_item_router(self.pricing_service.clone()))
            .merge(material_router(self.material_service.clone()))
            .merge(webhook_router(self.quote_service.clone()))
            .route("/health", get(|| async { "OK" }))
    }

    pub async fn start(self) {
        let addr = SocketAddr::new(self.config.host.parse().expect("Invalid host"), self.config.port);
        info!("🚀 Server running at http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("Failed to bind address");
        axum::serve(listener, self.router).await.expect("Failed to start server");
    }
}
