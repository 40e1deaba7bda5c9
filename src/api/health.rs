use actix_web::{HttpResponse, get, web};
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::error;

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Probe the jobs database with a trivial statement
async fn check_database(
    pool: &Pool<Sqlite>,
    healthy: &'static str,
    unhealthy: &'static str,
) -> HttpResponse {
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => HttpResponse::Ok().json(HealthResponse {
            status: healthy,
            database: "connected",
            error: None,
        }),
        Err(e) => {
            error!("{} check failed: {:?}", healthy, e);
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: unhealthy,
                database: "disconnected",
                error: Some(format!("Database error: {}", e)),
            })
        }
    }
}

/// General health check including database connectivity.
#[get("/health")]
async fn health_check(pool: web::Data<Pool<Sqlite>>) -> HttpResponse {
    check_database(pool.get_ref(), "healthy", "unhealthy").await
}

/// Readiness: the jobs database answers queries.
#[get("/ready")]
async fn readiness_check(pool: web::Data<Pool<Sqlite>>) -> HttpResponse {
    check_database(pool.get_ref(), "ready", "not_ready").await
}

/// Liveness: the process is up. Does not touch the database.
#[get("/live")]
async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "alive",
        database: "not_checked",
        error: None,
    })
}

pub fn health_config(config: &mut web::ServiceConfig) {
    config
        .service(health_check)
        .service(readiness_check)
        .service(liveness_check);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::temp_pool;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::Value;

    #[actix_web::test]
    async fn checks_report_connected_database() {
        let (_dir, pool) = temp_pool().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pool.clone()))
                .configure(health_config),
        )
        .await;

        for (uri, status) in [("/health", "healthy"), ("/ready", "ready"), ("/live", "alive")] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["status"], status);
        }
    }

    #[actix_web::test]
    async fn closed_pool_is_not_ready() {
        let (_dir, pool) = temp_pool().await;
        pool.close().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pool.clone()))
                .configure(health_config),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/ready").to_request()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "not_ready");
        assert_eq!(body["database"], "disconnected");
    }
}
