//! Server configuration: defaults, then env `HOST`, `PORT`, `PATHTRIE_POLICY`.
//! Command-line flags are applied on top by the CLI.

use serde::{Deserialize, Serialize};

use crate::{CoreError, RegistrationPolicy};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub policy: RegistrationPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            policy: RegistrationPolicy::Lenient,
        }
    }
}

impl ServerConfig {
    pub fn apply_env(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        if let Some(host) = var("HOST") {
            self.host = host;
        }
        if let Some(port) = var("PORT") {
            self.port = parse_port(&port)?;
        }
        if let Some(policy) = var("PATHTRIE_POLICY") {
            self.policy = policy.parse()?;
        }
        Ok(self)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_port(s: &str) -> Result<u16, CoreError> {
    s.trim()
        .parse()
        .map_err(|_| CoreError::Config(format!("invalid port {:?}", s)))
}
