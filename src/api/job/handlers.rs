use actix_web::{
    delete, get, patch, post,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    web::{Bytes, Data, Json as RawJson, Path, Query, ServiceConfig, scope},
    HttpResponse,
};
use actix_web_validator::Json;
use futures_util::stream;
use tracing::info;

use super::dto::{
    DashboardQuery, JobListResponse, JobResponse, MessageResponse, SearchQuery, StatusQuery,
    TopQuery,
};
use super::export::{csv_line, default_file_name};
use super::models::{ApplicationStatus, JobUpdate, NewJob};
use super::query::QueryOutcome;
use super::service::{JobService, ServiceError};
use super::stats::{DashboardFilter, SUMMARY_TOP_COMPANIES};

#[post("")]
async fn create_job(
    service: Data<JobService>,
    job: Json<NewJob>,
) -> Result<HttpResponse, ServiceError> {
    let outcome = service.create(&job).await?;
    let stored = service
        .read(outcome.id)
        .await?
        .ok_or(ServiceError::NotFound(outcome.id))?;

    Ok(HttpResponse::Created().json(JobResponse {
        message: "Job created successfully".to_string(),
        job: stored,
        warnings: outcome.warnings,
    }))
}

#[get("")]
async fn list_jobs(service: Data<JobService>) -> Result<HttpResponse, ServiceError> {
    let jobs = service.list().await?;
    Ok(HttpResponse::Ok().json(JobListResponse {
        performed: true,
        count: jobs.len(),
        jobs,
    }))
}

#[get("/filter")]
async fn filter_jobs(
    service: Data<JobService>,
    query: Query<StatusQuery>,
) -> Result<HttpResponse, ServiceError> {
    let outcome = service.filter_by_status(&query.status).await?;
    Ok(HttpResponse::Ok().json(list_response(outcome)))
}

#[get("/search")]
async fn search_jobs(
    service: Data<JobService>,
    query: Query<SearchQuery>,
) -> Result<HttpResponse, ServiceError> {
    let outcome = service.search(&query.keyword).await?;
    Ok(HttpResponse::Ok().json(list_response(outcome)))
}

#[get("/stats")]
async fn job_stats(
    service: Data<JobService>,
    query: Query<TopQuery>,
) -> Result<HttpResponse, ServiceError> {
    let summary = service
        .summary(query.top.unwrap_or(SUMMARY_TOP_COMPANIES))
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[get("/dashboard")]
async fn dashboard(
    service: Data<JobService>,
    query: Query<Vec<(String, String)>>,
) -> Result<HttpResponse, ServiceError> {
    let selections: DashboardQuery = query.into_inner().into_iter().collect();
    let filter = DashboardFilter::from(selections);
    let view = service.dashboard(&filter).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[get("/statuses")]
async fn suggested_statuses() -> HttpResponse {
    let labels: Vec<String> = ApplicationStatus::suggested()
        .iter()
        .map(|s| s.label().to_string())
        .collect();
    HttpResponse::Ok().json(labels)
}

/// Stream every job as a CSV attachment
#[get("/export")]
async fn export_jobs(service: Data<JobService>) -> Result<HttpResponse, ServiceError> {
    let rows = service.export_all().await?;
    info!("Exporting {} jobs as CSV", rows.record_count());

    let file_name = default_file_name(&chrono::Local::now());
    let body = stream::iter(rows.map(|row| csv_line(&row).map(Bytes::from)));

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(file_name)],
        })
        .streaming(body))
}

#[get("/{id}")]
async fn get_job(
    service: Data<JobService>,
    id: Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let job = service.read(id).await?.ok_or(ServiceError::NotFound(id))?;
    Ok(HttpResponse::Ok().json(job))
}

#[patch("/{id}")]
async fn update_job(
    service: Data<JobService>,
    id: Path<i64>,
    changes: RawJson<JobUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let outcome = service.update(id, &changes).await?;
    if !outcome.found {
        return Err(ServiceError::NotFound(id));
    }

    let job = service.read(id).await?.ok_or(ServiceError::NotFound(id))?;
    Ok(HttpResponse::Ok().json(JobResponse {
        message: "Job updated successfully".to_string(),
        job,
        warnings: outcome.warnings,
    }))
}

#[delete("/{id}")]
async fn delete_job(
    service: Data<JobService>,
    id: Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    if !service.delete(id).await? {
        return Err(ServiceError::NotFound(id));
    }
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Job deleted successfully".to_string(),
    }))
}

fn list_response(outcome: QueryOutcome) -> JobListResponse {
    let performed = !outcome.is_skipped();
    let jobs = outcome.into_jobs();
    JobListResponse {
        performed,
        count: jobs.len(),
        jobs,
    }
}

pub fn job_config(config: &mut ServiceConfig) {
    // Fixed segments are registered ahead of `/{id}`.
    config.service(
        scope("jobs")
            .service(create_job)
            .service(list_jobs)
            .service(filter_jobs)
            .service(search_jobs)
            .service(job_stats)
            .service(dashboard)
            .service(suggested_statuses)
            .service(export_jobs)
            .service(get_job)
            .service(update_job)
            .service(delete_job),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::validation;
    use crate::db::test_support::temp_pool;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    macro_rules! app {
        ($service:expr) => {
            test::init_service(
                App::new()
                    .app_data(Data::new($service.clone()))
                    .app_data(validation::json_config())
                    .configure(job_config),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn create_then_fetch() {
        let (_dir, pool) = temp_pool().await;
        let service = JobService::new(pool);
        let app = app!(service);

        let req = test::TestRequest::post()
            .uri("/jobs")
            .set_json(json!({"company": " Acme ", "role": "Engineer", "salary": "abc"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["job"]["company"], "Acme");
        assert_eq!(body["job"]["salary"], Value::Null);
        assert_eq!(body["warnings"][0]["fallback"], "null");

        let id = body["job"]["id"].as_i64().unwrap();
        let req = test::TestRequest::get().uri(&format!("/jobs/{id}")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn blank_company_is_a_bad_request() {
        let (_dir, pool) = temp_pool().await;
        let service = JobService::new(pool);
        let app = app!(service);

        let req = test::TestRequest::post()
            .uri("/jobs")
            .set_json(json!({"company": "  ", "role": "Engineer"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(service.total_count().await.unwrap(), 0);
    }

    #[actix_web::test]
    async fn missing_jobs_are_not_found() {
        let (_dir, pool) = temp_pool().await;
        let service = JobService::new(pool);
        let app = app!(service);

        let req = test::TestRequest::get().uri("/jobs/7").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete().uri("/jobs/7").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::patch()
            .uri("/jobs/7")
            .set_json(json!({"status": "Offer"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn blank_filter_reports_no_query() {
        let (_dir, pool) = temp_pool().await;
        let service = JobService::new(pool);
        service.create(&NewJob::new("Acme", "Engineer")).await.unwrap();
        let app = app!(service);

        let req = test::TestRequest::get().uri("/jobs/filter?status=").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["performed"], false);

        let req = test::TestRequest::get().uri("/jobs/search?keyword=ACM").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["performed"], true);
        assert_eq!(body["count"], 1);
    }

    #[actix_web::test]
    async fn patch_updates_and_export_streams_csv() {
        let (_dir, pool) = temp_pool().await;
        let service = JobService::new(pool);
        let id = service.create(&NewJob::new("Acme", "Engineer")).await.unwrap().id;
        let app = app!(service);

        let req = test::TestRequest::patch()
            .uri(&format!("/jobs/{id}"))
            .set_json(json!({"status": "Offer", "salary": 90000}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["job"]["status"], "Offer");
        assert_eq!(body["job"]["salary"], 90000.0);

        let req = test::TestRequest::get().uri("/jobs/export").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(
            std::str::from_utf8(&body).unwrap(),
            format!(
                "ID,Company,Role,Location,Applied Date,Status,Salary,Notes\n\
                 {id},Acme,Engineer,,,Offer,90000.0,\n"
            )
        );
    }

    #[actix_web::test]
    async fn dashboard_accepts_repeated_company_parameters() {
        let (_dir, pool) = temp_pool().await;
        let service = JobService::new(pool);
        service.create(&NewJob::new("Acme, Inc", "Engineer")).await.unwrap();
        service.create(&NewJob::new("Globex", "Clerk")).await.unwrap();
        service.create(&NewJob::new("Initech", "Clerk")).await.unwrap();
        let app = app!(service);

        let req = test::TestRequest::get()
            .uri("/jobs/dashboard?company=Acme%2C%20Inc&company=Globex")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 3);
        assert_eq!(body["filtered"], 2);
        assert_eq!(body["jobs"][1]["company"], "Acme, Inc");
    }

    #[actix_web::test]
    async fn non_text_salary_is_coerced_not_rejected() {
        let (_dir, pool) = temp_pool().await;
        let service = JobService::new(pool);
        let app = app!(service);

        let req = test::TestRequest::post()
            .uri("/jobs")
            .set_json(json!({"company": "Acme", "role": "Engineer", "salary": true}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["job"]["salary"], Value::Null);
        assert_eq!(body["warnings"][0]["input"], "true");
    }
}
