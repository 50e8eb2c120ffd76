use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    /// address for the HTTP server to listen on.
    ///  if not set then 0.0.0.0:8080 will be used
    pub listen_addr: SocketAddr,

    // data store configuration
    /// a path to a sqlite database, if not set then an
    ///  in-memory database will be used
    pub sqlite_path: Option<PathBuf>,
    /// directory for physical content objects, if not set then
    ///  a directory under the system temp dir will be used
    pub objects_path: Option<PathBuf>,

    /// public base URL used when building grant and action hrefs
    pub public_url: Url,

    // misc
    pub log_level: tracing::Level,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 8080),
            sqlite_path: None,
            objects_path: None,
            public_url: Url::parse("http://localhost:8080").expect("valid default url"),
            log_level: tracing::Level::INFO,
        }
    }
}
