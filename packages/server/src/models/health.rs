use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
    #[schema(example = "0.1.0")]
    pub version: &'static str,
    /// Package authors.
    pub author: &'static str,
    /// Host serving the request.
    #[schema(example = "fragments-7d9c")]
    pub hostname: String,
}
