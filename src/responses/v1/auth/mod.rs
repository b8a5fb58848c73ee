use actix_web::body::BoxBody;
use actix_web::{HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use utoipa::{IntoResponses, ToSchema};

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema, IntoResponses, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[response(status = 200, description = "Authenticated")]
pub struct Authenticated {
    /// HS256 bearer token carrying the user's identity claims
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
}

impl Responder for Authenticated {
    type Body = BoxBody;

    fn respond_to(self, _: &HttpRequest) -> HttpResponse<Self::Body> {
        HttpResponse::Ok().json(self)
    }
}
