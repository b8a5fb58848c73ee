use utoipa::OpenApi;

use crate::{controllers, error, requests, responses};

#[derive(OpenApi)]
#[openapi(
    info(title = "Auth API", description = "Username/password login issuing signed access tokens"),
    tags(
        (name = "Auth"),
        (name = "Health"),
        (name = "Meta"),
    ),
    paths(
        controllers::v1::auth::login,

        controllers::health::health,
        controllers::health::ready,

        controllers::version::version,
    ),
    components(schemas(
        requests::v1::auth::LoginRequest,
        responses::v1::auth::Authenticated,
        error::ErrorResponse,

        controllers::health::LivenessResponse,
        controllers::health::ReadinessResponse,
    )),
)]
pub struct Definition;
