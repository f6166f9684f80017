use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::files::{dtos as files_dtos, handlers as files_handlers};
use crate::shared::types::DetailResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Files
        files_handlers::list_files,
        files_handlers::list_my_files,
        files_handlers::get_file_data,
        files_handlers::upload_file,
        files_handlers::delete_file,
    ),
    components(
        schemas(
            // Shared
            DetailResponse,
            // Auth
            auth::model::AuthenticatedUser,
            // Files
            files_dtos::UploadFileDto,
            files_dtos::FileResponseDto,
            files_dtos::DataRowDto,
        )
    ),
    tags(
        (name = "files", description = "CSV upload, listing, querying and deletion"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "CSVDataHub API",
        version = "0.1.0",
        description = "API documentation for CSVDataHub",
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` JWT scheme referenced by the file paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
