use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateInsightRequest {
    #[validate(range(min = 1, max = 12, message = "month must be between 1 and 12"))]
    pub month: u32,

    #[validate(range(min = 2000, max = 2100, message = "year must be between 2000 and 2100"))]
    pub year: i32,

    /// Regenerate even when a cached report exists.
    #[serde(default)]
    pub force: bool,
}
