use crate::ws::connections::ConnectionManager;
use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_STUN_SERVER: &str = "stun:stun.l.google.com:19302";
const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub stun_servers: Vec<String>,
    pub turn_servers: Vec<TurnServer>,
    /// Largest inbound WebSocket message accepted, in bytes
    pub max_message_size: usize,
    /// Relay frames that are neither a join, a session description nor
    /// an ICE candidate. Turning this off restricts the relay to `sdp`
    /// and `candidate` frames.
    pub forward_unknown: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnServer {
    pub url: String,
    pub username: String,
    pub credential: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            stun_servers: vec![DEFAULT_STUN_SERVER.to_string()],
            turn_servers: vec![],
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            forward_unknown: true,
        }
    }
}

impl Config {
    /// Load from environment variables
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind_address = lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
        let mut bind_address: SocketAddr = bind_address
            .parse()
            .with_context(|| format!("Invalid BIND_ADDRESS: {bind_address}"))?;

        if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .parse()
                .with_context(|| format!("Invalid PORT: {port}"))?;
            bind_address.set_port(port);
        }

        let stun_servers = lookup("STUN_SERVERS")
            .map(|s| split_list(&s).map(String::from).collect())
            .unwrap_or_else(|| vec![DEFAULT_STUN_SERVER.to_string()]);

        let turn_servers = match lookup("TURN_SERVERS") {
            Some(s) => split_list(&s)
                .map(parse_turn_server)
                .collect::<anyhow::Result<Vec<_>>>()?,
            None => vec![],
        };

        let max_message_size = match lookup("MAX_MESSAGE_SIZE") {
            Some(size) => size
                .parse()
                .with_context(|| format!("Invalid MAX_MESSAGE_SIZE: {size}"))?,
            None => DEFAULT_MAX_MESSAGE_SIZE,
        };

        let forward_unknown = match lookup("FORWARD_UNKNOWN_MESSAGES") {
            Some(flag) => parse_flag(&flag)
                .with_context(|| format!("Invalid FORWARD_UNKNOWN_MESSAGES: {flag}"))?,
            None => true,
        };

        Ok(Config {
            bind_address,
            stun_servers,
            turn_servers,
            max_message_size,
            forward_unknown,
        })
    }
}

fn split_list(s: &str) -> impl Iterator<Item = &str> {
    s.split(',').map(str::trim).filter(|item| !item.is_empty())
}

/// `url|username|credential`
fn parse_turn_server(entry: &str) -> anyhow::Result<TurnServer> {
    let mut parts = entry.splitn(3, '|');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(url), Some(username), Some(credential)) if !url.is_empty() => Ok(TurnServer {
            url: url.to_string(),
            username: username.to_string(),
            credential: credential.to_string(),
        }),
        _ => anyhow::bail!("Invalid TURN server entry (expected url|username|credential): {entry}"),
    }
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("expected a boolean, got {other:?}"),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub connections: Arc<ConnectionManager>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let connections = Arc::new(ConnectionManager::with_forward_unknown(config.forward_unknown));
        Self {
            config,
            connections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address.port(), 8080);
        assert_eq!(config.stun_servers, vec![DEFAULT_STUN_SERVER.to_string()]);
        assert!(config.turn_servers.is_empty());
        assert_eq!(config.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
        assert!(config.forward_unknown);
        assert_eq!(config.forward_unknown, Config::default().forward_unknown);
    }

    #[test]
    fn test_port_overrides_bind_address() {
        let config = load(&[("BIND_ADDRESS", "127.0.0.1:9000"), ("PORT", "9100")]).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:9100".parse().unwrap());
    }

    #[test]
    fn test_server_lists() {
        let config = load(&[
            ("STUN_SERVERS", "stun:a.example:3478, stun:b.example:3478,"),
            ("TURN_SERVERS", "turn:t.example:3478|alice|s3cret"),
        ])
        .unwrap();
        assert_eq!(config.stun_servers, vec!["stun:a.example:3478", "stun:b.example:3478"]);
        assert_eq!(
            config.turn_servers,
            vec![TurnServer {
                url: "turn:t.example:3478".to_string(),
                username: "alice".to_string(),
                credential: "s3cret".to_string(),
            }]
        );
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(load(&[("BIND_ADDRESS", "localhost")]).is_err());
        assert!(load(&[("PORT", "eighty")]).is_err());
        assert!(load(&[("MAX_MESSAGE_SIZE", "-1")]).is_err());
        assert!(load(&[("FORWARD_UNKNOWN_MESSAGES", "maybe")]).is_err());
        assert!(load(&[("TURN_SERVERS", "turn:t.example:3478")]).is_err());
    }

    #[test]
    fn test_forward_unknown_flag() {
        assert!(load(&[("FORWARD_UNKNOWN_MESSAGES", "true")]).unwrap().forward_unknown);
        assert!(!load(&[("FORWARD_UNKNOWN_MESSAGES", "0")]).unwrap().forward_unknown);
        assert!(!load(&[("FORWARD_UNKNOWN_MESSAGES", "false")]).unwrap().forward_unknown);
    }
}
