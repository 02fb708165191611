#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GitHub API returned {status} for {path}")]
    Status { status: u16, path: String },

    #[error("GitHub rate limit exceeded")]
    RateLimited,

    #[error("authentication required")]
    Unauthorized,

    #[error("invalid file content for {path}: {reason}")]
    Content { path: String, reason: String },
}

impl GitHubError {
    /// Whether the failure belongs to one requested resource. Rate limits,
    /// rejected credentials, and transport failures affect every request the
    /// account makes.
    #[must_use]
    pub fn is_resource_scoped(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::Content { .. } | Self::Json(_))
    }
}
