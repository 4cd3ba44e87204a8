use crate::{
    api::{attendance, health},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, error::InternalError, middleware::from_fn, web};
use serde_json::json;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let requests_per_min = requests_per_min.max(1);
        let per_ms = (60_000 / requests_per_min as u64).max(1);
        let cfg = GovernorConfigBuilder::default()
            .milliseconds_per_request(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("rate limiter period and burst are non-zero");
        Governor::new(&cfg)
    }

    // Malformed bodies and query strings get the same `{message}` shape as validation errors
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let resp = HttpResponse::BadRequest().json(json!({ "message": err.to_string() }));
        InternalError::from_response(err, resp).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let resp = HttpResponse::BadRequest().json(json!({ "message": err.to_string() }));
        InternalError::from_response(err, resp).into()
    }));

    // Public routes
    cfg.service(health::health);

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(build_limiter(config.rate_protected_per_min)) // rate limiting
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(web::resource("").route(web::post().to(attendance::mark_attendance)))
                    // /attendance/date/{date}
                    .service(
                        web::resource("/date/{date}")
                            .route(web::get().to(attendance::get_attendance_for_date)),
                    )
                    // /attendance/stats
                    .service(web::resource("/stats").route(web::get().to(attendance::get_statistics)))
                    // /attendance/history
                    .service(
                        web::resource("/history").route(web::get().to(attendance::get_history)),
                    ),
            ),
    );
}
