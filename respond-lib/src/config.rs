/// Default spacing between resize-triggered evaluation passes.
pub const DEFAULT_THROTTLE_MS: u64 = 30;

/// Engine settings supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Minimum time between passes triggered by viewport changes.
    pub throttle_ms: u64,
    /// The environment applies `@media` blocks itself, so stylesheets are
    /// not parsed and only live queries are evaluated.
    pub native_media_queries: bool,
    /// Host of the page, for deciding which absolute stylesheet URLs are
    /// same-origin.
    pub page_host: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            throttle_ms: DEFAULT_THROTTLE_MS,
            native_media_queries: false,
            page_host: None,
        }
    }
}
