use fragments_core::{Fragment, FragmentList};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing fragments.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// `true` or `1` returns full metadata instead of ids.
    pub expand: Option<String>,
}

impl ListQuery {
    pub fn expand(&self) -> bool {
        matches!(self.expand.as_deref(), Some("true" | "1"))
    }
}

#[derive(Serialize, ToSchema)]
pub struct FragmentResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
    pub fragment: Fragment,
}

impl FragmentResponse {
    pub fn ok(fragment: Fragment) -> Self {
        Self {
            status: "ok",
            fragment,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct FragmentListResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
    pub fragments: FragmentList,
}

/// Body of a successful response that carries no data.
#[derive(Serialize, ToSchema)]
pub struct StatusResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
}
