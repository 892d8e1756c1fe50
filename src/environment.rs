//! Deployment environment flags consumed by the engine.

/// Deployment-level flags. Constructed once at startup and passed where
/// needed; the engine never reads process globals on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct Environment {
    /// Managed-cloud deployments require backups to be encrypted.
    pub is_cloud: bool,
}

impl Environment {
    /// Reads the environment from process variables.
    ///
    /// `CLOUD_MODE=true` (or `1`) enables cloud mode; anything else, or an
    /// absent variable, means self-hosted.
    pub fn from_env() -> Self {
        let is_cloud = std::env::var("CLOUD_MODE")
            .map(|v| {
                let v = v.trim().to_ascii_lowercase();
                v == "true" || v == "1"
            })
            .unwrap_or(false);

        Self { is_cloud }
    }

    /// Environment with cloud mode enabled.
    pub fn cloud() -> Self {
        Self { is_cloud: true }
    }

    /// Self-hosted environment (the default).
    pub fn self_hosted() -> Self {
        Self { is_cloud: false }
    }
}
