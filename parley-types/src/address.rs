//! SIP addresses
//!
//! A small SIP name-addr / addr-spec model: enough to identify chat room
//! participants, build contact addresses carrying the `isfocus` marker and
//! compose REFER targets with `method=BYE` URI parameters.
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ParleyError, Result};

/// A `name=value` (or bare `name`) parameter
pub type Param = (String, Option<String>);

/// SIP address: optional display name, URI, and header parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SipAddress {
    display_name: Option<String>,
    /// `sip` or `sips`
    scheme: String,
    username: Option<String>,
    host: String,
    port: Option<u16>,
    /// Parameters inside the URI (`sip:a@b;method=BYE`)
    uri_params: Vec<Param>,
    /// Parameters outside the URI (`<sip:a@b>;isfocus`)
    params: Vec<Param>,
}

impl SipAddress {
    /// Create a `sip:` address from a user part and a host
    pub fn new(username: Option<&str>, host: impl Into<String>) -> Self {
        Self {
            display_name: None,
            scheme: "sip".to_string(),
            username: username.map(str::to_string),
            host: host.into(),
            port: None,
            uri_params: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Parse an address such as `"Alice" <sip:alice@example.org>;tag=1`
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParleyError::InvalidAddress("empty address".to_string()));
        }

        match input.find('<') {
            Some(open) => {
                let close = input[open..]
                    .find('>')
                    .map(|i| open + i)
                    .ok_or_else(|| ParleyError::InvalidAddress(format!("unterminated '<' in {}", input)))?;

                let display = input[..open].trim().trim_matches('"').trim();
                let mut address = Self::parse_uri(&input[open + 1..close])?;
                if !display.is_empty() {
                    address.display_name = Some(display.to_string());
                }
                address.params = parse_params(&input[close + 1..]);
                Ok(address)
            }
            None => Self::parse_uri(input),
        }
    }

    fn parse_uri(uri: &str) -> Result<Self> {
        let (scheme, rest) = uri
            .split_once(':')
            .ok_or_else(|| ParleyError::InvalidAddress(format!("missing scheme in {}", uri)))?;
        let scheme = scheme.trim().to_ascii_lowercase();
        if scheme != "sip" && scheme != "sips" {
            return Err(ParleyError::InvalidAddress(format!("unsupported scheme {}", scheme)));
        }

        let (hostport_part, param_part) = match rest.find(';') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };

        let (username, hostport) = match hostport_part.rsplit_once('@') {
            Some((user, hostport)) if !user.is_empty() => (Some(user.to_string()), hostport),
            Some((_, hostport)) => (None, hostport),
            None => (None, hostport_part),
        };

        let (host, port) = split_host_port(hostport)?;
        if host.is_empty() {
            return Err(ParleyError::InvalidAddress(format!("missing host in {}", uri)));
        }

        Ok(Self {
            display_name: None,
            scheme,
            username,
            host,
            port,
            uri_params: parse_params(param_part),
            params: Vec::new(),
        })
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn set_display_name(&mut self, display_name: Option<&str>) {
        self.display_name = display_name.map(str::to_string);
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn set_username(&mut self, username: Option<&str>) {
        self.username = username.map(str::to_string);
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Value of a URI parameter; `Some(None)` for a bare flag
    pub fn uri_param(&self, name: &str) -> Option<Option<&str>> {
        find_param(&self.uri_params, name)
    }

    pub fn has_uri_param(&self, name: &str) -> bool {
        self.uri_param(name).is_some()
    }

    /// Set (or replace) a URI parameter
    pub fn set_uri_param(&mut self, name: &str, value: Option<&str>) {
        upsert_param(&mut self.uri_params, name, value);
    }

    pub fn remove_uri_param(&mut self, name: &str) {
        self.uri_params.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Value of a header parameter; `Some(None)` for a bare flag
    pub fn param(&self, name: &str) -> Option<Option<&str>> {
        find_param(&self.params, name)
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.param(name).is_some()
    }

    /// Set (or replace) a header parameter
    pub fn set_param(&mut self, name: &str, value: Option<&str>) {
        upsert_param(&mut self.params, name, value);
    }

    pub fn remove_param(&mut self, name: &str) {
        self.params.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Compare identities only: scheme, user, host and port.
    ///
    /// Display names and all parameters are ignored, so a contact carrying
    /// `gr` or `isfocus` still matches the bare identity.
    pub fn weak_equal(&self, other: &SipAddress) -> bool {
        self.scheme == other.scheme
            && self.username == other.username
            && self.host.eq_ignore_ascii_case(&other.host)
            && self.port == other.port
    }

    /// Copy of this address stripped of display name and parameters
    pub fn identity(&self) -> SipAddress {
        Self {
            display_name: None,
            scheme: self.scheme.clone(),
            username: self.username.clone(),
            host: self.host.clone(),
            port: self.port,
            uri_params: Vec::new(),
            params: Vec::new(),
        }
    }

    /// The URI alone, without display name or header parameters
    pub fn uri_string(&self) -> String {
        let mut uri = format!("{}:", self.scheme);
        if let Some(user) = &self.username {
            uri.push_str(user);
            uri.push('@');
        }
        uri.push_str(&self.host);
        if let Some(port) = self.port {
            uri.push_str(&format!(":{}", port));
        }
        write_params(&mut uri, &self.uri_params);
        uri
    }
}

fn split_host_port(hostport: &str) -> Result<(String, Option<u16>)> {
    let hostport = hostport.trim();

    // IPv6 reference
    if let Some(stripped) = hostport.strip_prefix('[') {
        let end = stripped
            .find(']')
            .ok_or_else(|| ParleyError::InvalidAddress(format!("unterminated IPv6 host {}", hostport)))?;
        let host = format!("[{}]", &stripped[..end]);
        let port = match stripped[end + 1..].strip_prefix(':') {
            Some(port) => Some(parse_port(port)?),
            None => None,
        };
        return Ok((host, port));
    }

    match hostport.rsplit_once(':') {
        Some((host, port)) => Ok((host.to_string(), Some(parse_port(port)?))),
        None => Ok((hostport.to_string(), None)),
    }
}

fn parse_port(port: &str) -> Result<u16> {
    port.parse::<u16>()
        .map_err(|_| ParleyError::InvalidAddress(format!("invalid port {}", port)))
}

fn parse_params(input: &str) -> Vec<Param> {
    input
        .split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| match p.split_once('=') {
            Some((name, value)) => (name.trim().to_string(), Some(value.trim().to_string())),
            None => (p.to_string(), None),
        })
        .collect()
}

fn find_param<'a>(params: &'a [Param], name: &str) -> Option<Option<&'a str>> {
    params
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_deref())
}

fn upsert_param(params: &mut Vec<Param>, name: &str, value: Option<&str>) {
    let value = value.map(str::to_string);
    match params.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
        Some(existing) => existing.1 = value,
        None => params.push((name.to_string(), value)),
    }
}

fn write_params(out: &mut String, params: &[Param]) {
    for (name, value) in params {
        out.push(';');
        out.push_str(name);
        if let Some(value) = value {
            out.push('=');
            out.push_str(value);
        }
    }
}

impl fmt::Display for SipAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.display_name.is_none() && self.params.is_empty() {
            return f.write_str(&self.uri_string());
        }

        if let Some(name) = &self.display_name {
            write!(f, "\"{}\" ", name)?;
        }
        let mut out = format!("<{}>", self.uri_string());
        write_params(&mut out, &self.params);
        f.write_str(&out)
    }
}

impl FromStr for SipAddress {
    type Err = ParleyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SipAddress {
    type Error = ParleyError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<SipAddress> for String {
    fn from(address: SipAddress) -> Self {
        address.to_string()
    }
}
