#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to bind listener on {0}: {1}")]
    Bind(std::net::SocketAddr, std::io::Error),

    #[error("invalid listen address {0}:{1}")]
    InvalidAddress(String, u16),

    #[error("server loop failed: {0}")]
    Serve(#[from] std::io::Error),

    #[error("mDNS registration failed: {0}")]
    Mdns(#[from] mdns_sd::Error),

    #[error(transparent)]
    Config(#[from] relay_proto::config::ConfigError),

    #[error("could not determine local IP address: {0}")]
    LocalIp(#[from] local_ip_address::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
