/*
 * uri.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Cannocchiale, a TAP/UWS client for astronomical archives.
 *
 * Cannocchiale is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Cannocchiale is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Cannocchiale.  If not, see <http://www.gnu.org/licenses/>.
 */

//! TAP service URLs: scheme + host + port + server path. The TAP endpoint is
//! `scheme://host[:port]/path`; sync/async/tables endpoints hang off it.

use std::fmt;

use crate::error::TapError;

/// Location of a TAP service. Default ports: http 80, https 443.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapUrl {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl TapUrl {
    /// Build from parts. The path is normalized to a single leading slash.
    pub fn new(protocol: &str, host: &str, port: u16, path: &str) -> Self {
        Self {
            protocol: protocol.to_string(),
            host: host.to_string(),
            port,
            path: path_with_leading_slash(path),
        }
    }

    /// Parse `[http(s)://]host[:port][/path]`. The scheme is mandatory and
    /// must be `http` or `https`; when the port is absent the scheme default
    /// (80 or 443) is used.
    pub fn from_url(url: &str) -> Result<Self, TapError> {
        let (protocol, rest) = url
            .split_once("://")
            .ok_or_else(|| TapError::usage("`url` must start with \"scheme://\""))?;
        let default_port = match protocol {
            "http" => 80,
            "https" => 443,
            other => {
                return Err(TapError::usage(format!(
                    "unsupported scheme \"{}\" (expected http or https)",
                    other
                )))
            }
        };
        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, "/"),
        };
        let (host, port) = match authority.rsplit_once(':') {
            Some((h, p)) => {
                let port: u16 = p
                    .parse()
                    .map_err(|_| TapError::usage(format!("invalid port \"{}\"", p)))?;
                (h, port)
            }
            None => (authority, default_port),
        };
        if host.is_empty() {
            return Err(TapError::usage("`url` has no host"));
        }
        Ok(Self::new(protocol, host, port, path))
    }

    /// Authority with the port elided when it is the scheme default.
    fn authority(&self) -> String {
        let default = if self.protocol == "https" { 443 } else { 80 };
        if self.port == default {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// TAP endpoint: `scheme://host[:port]/path`.
    pub fn tap_endpoint(&self) -> String {
        format!("{}://{}{}", self.protocol, self.authority(), self.path)
    }

    /// Base URL without the service path: `scheme://host[:port]`.
    pub fn base(&self) -> String {
        format!("{}://{}", self.protocol, self.authority())
    }

    /// Base URL over https regardless of the configured protocol, used for
    /// the login/logout endpoints which the server only serves over TLS.
    pub fn secure_base(&self) -> String {
        format!("https://{}", self.host)
    }
}

impl fmt::Display for TapUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tap_endpoint())
    }
}

/// Normalize path: ensure a single leading slash and no trailing slash.
fn path_with_leading_slash(path: &str) -> String {
    let path = path.trim_matches('/');
    if path.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_url_with_explicit_port() {
        let u = TapUrl::from_url("http://host:80/ctx/tap").unwrap();
        assert_eq!(u.protocol, "http");
        assert_eq!(u.host, "host");
        assert_eq!(u.port, 80);
        assert_eq!(u.path, "/ctx/tap");
    }

    #[test]
    fn from_url_default_ports() {
        let u = TapUrl::from_url("http://gea.esac.esa.int/tap-server/tap").unwrap();
        assert_eq!(u.port, 80);
        let u = TapUrl::from_url("https://gea.esac.esa.int/tap-server/tap").unwrap();
        assert_eq!(u.port, 443);
    }

    #[test]
    fn from_url_without_scheme_is_usage_error() {
        let e = TapUrl::from_url("gea.esac.esa.int/tap").unwrap_err();
        assert!(matches!(e, TapError::Usage(_)));
    }

    #[test]
    fn from_url_rejects_unknown_scheme() {
        let e = TapUrl::from_url("ftp://host/tap").unwrap_err();
        assert!(matches!(e, TapError::Usage(_)));
    }

    #[test]
    fn tap_endpoint_elides_default_port() {
        let u = TapUrl::from_url("https://host:443/ctx/tap").unwrap();
        assert_eq!(u.tap_endpoint(), "https://host/ctx/tap");
        let u = TapUrl::from_url("http://host:8080/ctx/tap").unwrap();
        assert_eq!(u.tap_endpoint(), "http://host:8080/ctx/tap");
    }

    #[test]
    fn path_normalized_to_leading_slash() {
        let u = TapUrl::new("http", "host", 80, "ctx/tap/");
        assert_eq!(u.path, "/ctx/tap");
        assert_eq!(u.tap_endpoint(), "http://host/ctx/tap");
    }

    #[test]
    fn secure_base_always_https() {
        let u = TapUrl::from_url("http://host:8080/ctx/tap").unwrap();
        assert_eq!(u.secure_base(), "https://host");
    }
}
