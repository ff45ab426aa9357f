//! Common constants used across Parley

/// Base URL of a locally running Ollama server, including the `/api` prefix
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/api";

/// Model used when the backend cannot tell us which models it has
pub const FALLBACK_MODEL: &str = "llama2";

/// Backend endpoint paths, relative to the base URL
pub mod endpoints {
    pub const TAGS: &str = "tags";
    pub const CHAT: &str = "chat";
}

/// Provider identifiers reported to observers
pub mod providers {
    pub const OLLAMA: &str = "ollama";
}

/// Invocation parameters reported with every chat span
pub mod invocation {
    pub const DEFAULT_TEMPERATURE: f64 = 0.7;
    pub const DEFAULT_TOP_P: f64 = 1.0;
    pub const DEFAULT_MAX_TOKENS: u32 = 2048;
}

/// Default timeout values in seconds
pub mod timeouts {
    pub const DEFAULT_HTTP_TIMEOUT: u64 = 120;
}
