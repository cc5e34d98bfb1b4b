use super::handlers::{auth, health, submissions};
use utoipa::openapi::{InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both
/// served and included in the generated `OpenAPI` spec. Handlers sharing a
/// path go in one `routes!` call.
pub(crate) fn api_router() -> OpenApiRouter {
    OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(auth::send_link::send_link))
        .routes(routes!(auth::validate::validate))
        .routes(routes!(auth::password_login::password_login))
        .routes(routes!(auth::session::session, auth::session::logout))
        .routes(routes!(auth::dashboard::dashboard_auth))
        .routes(routes!(
            submissions::create::create,
            submissions::list::list
        ))
        .routes(routes!(
            submissions::item::get_submission,
            submissions::item::patch_submission
        ))
        .routes(routes!(submissions::ready::ready))
        .routes(routes!(submissions::regenerate::regenerate))
        .routes(routes!(submissions::approval::send_for_approval))
        .routes(routes!(submissions::approval::decide))
        .routes(routes!(submissions::publish::publish))
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the crate info defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.license = cargo_license();

    OpenApiBuilder::new()
        .info(info)
        .tags(Some(service_tags()))
        .build()
}

fn service_tags() -> Vec<Tag> {
    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Magic-link, password, and session endpoints".to_string());

    let mut submissions_tag = Tag::new("submissions");
    submissions_tag.description = Some("Submission lifecycle and publishing".to_string());

    let mut health_tag = Tag::new("health");
    health_tag.description = Some("Service health".to_string());

    vec![auth_tag, submissions_tag, health_tag]
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));

        let license = spec.info.license;
        assert!(license.is_some());
        if let Some(license) = license {
            assert_eq!(license.name, "BSD-3-Clause");
        }
    }

    #[test]
    fn openapi_tags_and_paths() {
        let spec = openapi();
        let tags = spec.tags.clone().unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "auth"));
        assert!(tags.iter().any(|tag| tag.name == "submissions"));
        assert!(spec.paths.paths.contains_key("/v1/auth/send-link"));
        assert!(spec.paths.paths.contains_key("/v1/submissions/{id}/post"));
        assert!(
            spec.paths
                .paths
                .contains_key("/v1/submissions/{id}/send-for-approval")
        );
    }
}
