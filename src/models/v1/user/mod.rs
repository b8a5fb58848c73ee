use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User record as served by the users API
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema, PartialEq, Eq)]
pub struct UserRecord {
    #[schema(example = "johnd")]
    pub username: String,
    #[serde(rename = "firstname")]
    #[schema(example = "John")]
    pub first_name: String,
    #[serde(rename = "lastname")]
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "user")]
    pub role: String,
}
