use actix_web::{HttpResponse, error::InternalError};
use serde::Serialize;
use serde_json::{Map, Value, json};

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub fields: Value,
}

fn bad_request(error: &str, fields: Map<String, Value>) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        fields: Value::Object(fields),
    });
    InternalError::from_response("", response).into()
}

/// Message for a JSON body that could not be deserialized
fn describe_deserialize_error(err: &str) -> &'static str {
    if err.contains("EOF while parsing") {
        "Request body is empty. Expected JSON payload"
    } else if err.contains("missing field") {
        "Company and Role are required"
    } else if err.contains("invalid type") || err.contains("did not match any variant") {
        "A field has the wrong type. Text fields take strings, salary takes a number or text"
    } else {
        "Invalid JSON format"
    }
}

/// JsonConfig rendering validation failures of job payloads as `ErrorResponse`
pub fn json_config() -> actix_web_validator::JsonConfig {
    actix_web_validator::JsonConfig::default().error_handler(|err, _req| {
        let mut fields = Map::new();

        match err {
            actix_web_validator::Error::Validate(validation_errors) => {
                for (field, errors) in validation_errors.field_errors() {
                    let messages: Vec<String> = errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| format!("Validation error in field: {}", field))
                        })
                        .collect();
                    fields.insert(field.to_string(), json!({ "errors": messages }));
                }
                bad_request("Validation failed", fields)
            }
            actix_web_validator::Error::Deserialize(de_err) => {
                let message = describe_deserialize_error(&de_err.to_string());
                fields.insert("message".to_string(), json!(message));
                bad_request("Request validation failed", fields)
            }
            _ => {
                fields.insert("message".to_string(), json!("Validation error"));
                bad_request("Validation failed", fields)
            }
        }
    })
}
