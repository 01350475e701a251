//! 从环境变量读取服务器配置。

use std::env;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 25917;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    // 设置后每张新牌桌的随机源都由它派生，发牌可复现
    pub seed: Option<u64>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let host_str = lookup("TIEN_LEN_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host = host_str
            .parse::<IpAddr>()
            .map_err(|_| format!("TIEN_LEN_HOST 必须是合法的 IP 地址，实际为 '{}'", host_str))?;

        let port = match lookup("TIEN_LEN_PORT") {
            Some(port_str) => port_str
                .parse::<u16>()
                .map_err(|_| format!("TIEN_LEN_PORT 必须是合法的端口号，实际为 '{}'", port_str))?,
            None => DEFAULT_PORT,
        };

        let seed = match lookup("TIEN_LEN_SEED") {
            Some(seed_str) => Some(
                seed_str
                    .parse::<u64>()
                    .map_err(|_| format!("TIEN_LEN_SEED 必须是无符号整数，实际为 '{}'", seed_str))?,
            ),
            None => None,
        };

        Ok(ServerConfig { host, port, seed })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
