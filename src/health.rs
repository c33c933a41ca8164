use std::net::TcpListener;

use crate::model::{ForwardMode, Tunnel};

/// Check if a local port is free (not already bound by another process).
pub fn is_port_free(port: u16) -> bool {
    TcpListener::bind(("127.0.0.1", port)).is_ok()
}

/// The local port a tunnel will bind, if it binds one.
pub fn bound_local_port(tunnel: &Tunnel) -> Option<u16> {
    match tunnel.mode {
        ForwardMode::Local | ForwardMode::Dynamic if tunnel.local_port != 0 => Some(tunnel.local_port),
        _ => None,
    }
}
