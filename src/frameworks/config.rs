use std::{env, net::IpAddr, path::PathBuf, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("CURLING_SERVER_PORT")
        .or_else(|_| env::var("PORT"))
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000)
}

pub fn bind_addr() -> IpAddr {
    env::var("CURLING_BIND_ADDR")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

pub fn static_root() -> PathBuf {
    env::var("CURLING_STATIC_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("html"))
}

pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
pub const SNAPSHOT_BROADCAST_CAPACITY: usize = 128;

pub const TICK_INTERVAL: Duration = Duration::from_millis(50);
