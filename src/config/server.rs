/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl ServerConfig {
    /// `workers` defaults to twice the CPU count
    pub fn new(host: impl Into<String>, port: u16, workers: Option<usize>) -> Self {
        Self {
            host: host.into(),
            port,
            workers: workers
                .filter(|w| *w > 0)
                .unwrap_or_else(|| num_cpus::get() * 2),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
