use serde::{Deserialize, Serialize};
use std::net::ToSocketAddrs;

/// Where to reach the strut-length device and how patiently.
///
/// ```rust,ignore
/// let config = LengthDriverConfig::new("127.0.0.1".to_string(), 16101);
///
/// if let Err(e) = config.validate() {
///     println!("Configuration error: {}", e);
///     return;
/// }
///
/// let raw = LengthDriver::acquire_once(config).await?;
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LengthDriverConfig {
    pub addr: String,
    pub port: u32,
    /// How long to wait for a reply line
    pub timeout_ms: u64,
    pub connect_retries: u32,
    pub retry_delay_ms: u64,
}

impl LengthDriverConfig {
    pub fn new(addr: String, port: u32) -> Self {
        Self {
            addr,
            port,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.addr.is_empty() {
            return Err("Address cannot be empty.".to_string());
        }
        if self.port == 0 || self.port > u16::MAX as u32 {
            return Err("Port number must be between 1 and 65535.".to_string());
        }
        if self.timeout_ms == 0 {
            return Err("Reply timeout must be greater than 0.".to_string());
        }
        if self.connect_retries == 0 {
            return Err("At least one connection attempt is required.".to_string());
        }
        Ok(())
    }

    /// Generates a connection URL from the address and port.
    pub fn connection_url(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }

    /// Resolves the address to a socket address string.
    pub fn resolve(&self) -> Result<String, String> {
        let address_with_port = self.connection_url();
        match address_with_port.to_socket_addrs() {
            Ok(mut iter) => match iter.next() {
                Some(socket_addr) => Ok(socket_addr.to_string()),
                None => Err("Could not resolve address".to_string()),
            },
            Err(_) => Err("Invalid address format".to_string()),
        }
    }
}

impl Default for LengthDriverConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1".to_string(),
            port: 16101,
            timeout_ms: 1000,
            connect_retries: 3,
            retry_delay_ms: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(LengthDriverConfig::default().validate().is_ok());
        assert!(LengthDriverConfig::new(String::new(), 16101).validate().is_err());
        assert!(LengthDriverConfig::new("localhost".to_string(), 0).validate().is_err());
        assert!(LengthDriverConfig::new("localhost".to_string(), 70000).validate().is_err());
    }

    #[test]
    fn test_resolve_loopback() {
        let config = LengthDriverConfig::new("127.0.0.1".to_string(), 16101);
        assert_eq!(config.connection_url(), "127.0.0.1:16101");
        assert_eq!(config.resolve(), Ok("127.0.0.1:16101".to_string()));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LengthDriverConfig = serde_json::from_str(r#"{"port": 4000}"#).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.timeout_ms, 1000);
    }
}
