// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Network address and platform label reported on job completion.

use std::net::{IpAddr, UdpSocket};

pub const UNKNOWN_IP: &str = "Unknown IP";
pub const UNKNOWN_OS: &str = "Unknown OS";

/// Facts an agent reports about the machine it runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub ip_address: String,
    pub operating_system: String,
}

impl Platform {
    /// Probe the local address and OS once.
    ///
    /// Blocking: may resolve the authority's hostname.
    pub fn detect(server_url: &str) -> Self {
        let ip_address = outbound_ipv4(server_url).map(|ip| ip.to_string());
        Self {
            ip_address: ip_address.unwrap_or_else(|| UNKNOWN_IP.to_owned()),
            operating_system: os_label(std::env::consts::OS).to_owned(),
        }
    }
}

/// Human-readable name for a `std::env::consts::OS` value.
pub fn os_label(os: &str) -> &'static str {
    match os {
        "macos" => "MacOS",
        "windows" => "Windows",
        "linux" => "Linux",
        _ => UNKNOWN_OS,
    }
}

/// Local IPv4 address of the interface that routes toward the authority.
///
/// Connecting a UDP socket sends nothing; it only asks the OS to pick a
/// route. Loopback is never reported: an authority on the same host falls
/// through to the route toward a public address.
fn outbound_ipv4(server_url: &str) -> Option<IpAddr> {
    let mut targets = Vec::new();
    if let Ok(url) = reqwest::Url::parse(server_url) {
        if let (Some(host), Some(port)) = (url.host_str(), url.port_or_known_default()) {
            targets.push(format!("{host}:{port}"));
        }
    }
    targets.push("8.8.8.8:80".to_owned());

    targets.iter().find_map(|target| {
        let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
        socket.connect(target.as_str()).ok()?;
        let ip = socket.local_addr().ok()?.ip();
        (ip.is_ipv4() && !ip.is_unspecified() && !ip.is_loopback()).then_some(ip)
    })
}

#[cfg(test)]
#[path = "platform_tests.rs"]
mod tests;
