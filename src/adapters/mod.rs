// Adapters layer: concrete implementations for external systems (platform http client, session file).

pub mod platform;
pub mod session_store;

pub use platform::HttpPlatformClient;
pub use session_store::FileSessionStore;
