use std::collections::HashSet;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub capabilities: Option<Vec<String>>,
}

/// Capabilities granted to report callers. Mirrors the host roles: graders
/// can view the report, managers can close quizzes, archivists can produce
/// artifacts and downloaders can fetch them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Grade,
    Manage,
    ArchiveReviews,
    DownloadReviews,
}

impl Capability {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "grade" => Some(Capability::Grade),
            "manage" => Some(Capability::Manage),
            "archivereviews" => Some(Capability::ArchiveReviews),
            "downloadreviews" => Some(Capability::DownloadReviews),
            _ => None,
        }
    }
}

/// The caller identity the archive tracker sees: just a set of capabilities.
/// Unknown capability strings in the token are ignored.
#[derive(Debug, Clone, Default)]
pub struct ReportContext {
    capabilities: HashSet<Capability>,
}

impl ReportContext {
    pub fn new<I: IntoIterator<Item = Capability>>(capabilities: I) -> Self {
        Self {
            capabilities: capabilities.into_iter().collect(),
        }
    }

    pub fn from_claims(claims: &Claims) -> Self {
        let capabilities = claims
            .capabilities
            .iter()
            .flatten()
            .filter_map(|raw| Capability::parse(raw))
            .collect();
        Self { capabilities }
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn require(&self, capability: Capability) -> Result<()> {
        if self.has(capability) {
            Ok(())
        } else {
            Err(Error::Forbidden(format!(
                "Missing capability: {:?}",
                capability
            )))
        }
    }
}

pub async fn require_bearer_auth(mut req: Request, next: Next) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"missing_authorization"})),
        )
            .into_response();
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"bad_authorization"})),
        )
            .into_response();
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"unsupported_scheme"})),
        )
            .into_response();
    };

    let config = crate::config::get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => {
            req.extensions_mut().insert(data.claims);
            next.run(req).await
        }
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"invalid_token"})),
        )
            .into_response(),
    }
}
