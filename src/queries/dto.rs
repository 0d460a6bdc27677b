use serde::Deserialize;

use crate::queries::repo_types::StatusFilter;

/// Request body for submitting a query. `mobile` arrives as text and must be numeric.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitQueryRequest {
    pub email: String,
    pub mobile: String,
    pub heading: String,
    pub description: String,
}

/// `?status=All|Open|Closed` on the listing route.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub status: StatusFilter,
}
