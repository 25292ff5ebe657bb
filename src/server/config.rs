use super::RequestsLoggingLevel;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    /// Port of the Prometheus endpoint. `None` disables it.
    pub metrics_port: Option<u16>,
    /// Largest request body accepted by the bulk import endpoint.
    pub max_import_bytes: usize,
}

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_METRICS_PORT: u16 = 9091;
pub const DEFAULT_MAX_IMPORT_BYTES: usize = 10 * 1024 * 1024;

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: DEFAULT_PORT,
            metrics_port: Some(DEFAULT_METRICS_PORT),
            max_import_bytes: DEFAULT_MAX_IMPORT_BYTES,
        }
    }
}
