//! Endpoint declarations: address autofill and parsing.
//!
//! An endpoint is declared as an `Endpoint` child of some element:
//!
//! ```text
//! <Gateway>
//!   <Endpoint Address="10.0.0.4" Port="30000" AccessAddr="gw.example.net:443" />
//! </Gateway>
//! ```
//!
//! `Address` may be left out, in which case [`autofill_endpoints`] fills it
//! in when the host has exactly one usable IPv4 address.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::names;
use crate::node::ConfigNode;

/// Source of the host's local IPv4 addresses.
pub trait AddressResolver: Send + Sync {
    /// Non-loopback IPv4 addresses of the host.
    fn local_ipv4_addresses(&self) -> Vec<Ipv4Addr>;
}

/// Resolver that enumerates the host's network interfaces.
///
/// Only interfaces that are up contribute, and loopback addresses are
/// skipped. On non-unix targets it reports no addresses, so autofill never
/// happens there.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAddressResolver;

impl AddressResolver for SystemAddressResolver {
    #[cfg(unix)]
    fn local_ipv4_addresses(&self) -> Vec<Ipv4Addr> {
        use std::net::SocketAddrV4;

        use nix::net::if_::InterfaceFlags;

        let interfaces = match nix::ifaddrs::getifaddrs() {
            Ok(interfaces) => interfaces,
            Err(e) => {
                warn!(error = %e, "failed to enumerate network interfaces");
                return Vec::new();
            },
        };

        let mut found: Vec<Ipv4Addr> = interfaces
            .filter(|ifaddr| ifaddr.flags.contains(InterfaceFlags::IFF_UP))
            .filter_map(|ifaddr| {
                let sin = ifaddr.address.as_ref()?.as_sockaddr_in()?;
                let ip = *SocketAddrV4::from(*sin).ip();
                (!ip.is_loopback()).then_some(ip)
            })
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }

    #[cfg(not(unix))]
    fn local_ipv4_addresses(&self) -> Vec<Ipv4Addr> {
        Vec::new()
    }
}

/// Return `endpoint` with `Address` set to the host's IPv4 address, if it
/// has no `Address` and the resolver reports exactly one.
#[must_use]
pub fn set_address_if_not_exist(endpoint: &ConfigNode, resolver: &dyn AddressResolver) -> ConfigNode {
    let mut filled = endpoint.clone();
    if endpoint.attribute(names::ADDRESS).is_some() {
        return filled;
    }

    match resolver.local_ipv4_addresses().as_slice() {
        [only] => {
            debug!(address = %only, "filled in endpoint address");
            filled.set_attribute(names::ADDRESS, only.to_string());
        },
        [] => {
            debug!("no local IPv4 address to fill in endpoint address");
        },
        many => {
            warn!(
                candidates = many.len(),
                "endpoint has no Address and the host has several IPv4 addresses; leaving it unset"
            );
        },
    }
    filled
}

/// Apply [`set_address_if_not_exist`] to every `Endpoint` in `tree`.
#[must_use]
pub fn autofill_endpoints(tree: &ConfigNode, resolver: &dyn AddressResolver) -> ConfigNode {
    let mut filled = tree.clone();
    filled.visit_mut(&mut |node| {
        if node.name() == names::ENDPOINT {
            *node = set_address_if_not_exist(node, resolver);
        }
    });
    filled
}

/// Parse the `Endpoint` child of `element` into a socket address.
///
/// # Errors
///
/// - [`ConfigError::MissingElement`] if `element` has no `Endpoint` child.
/// - [`ConfigError::MissingAttribute`] if `Port` or `Address` is absent.
/// - [`ConfigError::InvalidAttribute`] if either fails to parse.
pub fn read_endpoint(element: &ConfigNode) -> ConfigResult<SocketAddr> {
    let endpoint = endpoint_of(element)?;
    let raw_port = required(endpoint, names::PORT)?;
    let raw_address = required(endpoint, names::ADDRESS)?;

    let port: u16 = raw_port
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| invalid(names::PORT, raw_port, &e))?;
    let ip: IpAddr = raw_address
        .trim()
        .parse()
        .map_err(|e: std::net::AddrParseError| invalid(names::ADDRESS, raw_address, &e))?;

    Ok(SocketAddr::new(ip, port))
}

/// The optional `AccessAddr` of the `Endpoint` child of `element`.
///
/// # Errors
///
/// Returns [`ConfigError::MissingElement`] if `element` has no `Endpoint` child.
pub fn read_access_address(element: &ConfigNode) -> ConfigResult<Option<String>> {
    Ok(endpoint_of(element)?
        .attribute(names::ACCESS_ADDR)
        .map(str::to_owned))
}

fn endpoint_of(element: &ConfigNode) -> ConfigResult<&ConfigNode> {
    element
        .child(names::ENDPOINT)
        .ok_or_else(|| ConfigError::MissingElement {
            element: names::ENDPOINT.to_owned(),
            parent: element.qualified_name(),
        })
}

fn required<'a>(endpoint: &'a ConfigNode, attribute: &str) -> ConfigResult<&'a str> {
    endpoint
        .attribute(attribute)
        .ok_or_else(|| ConfigError::MissingAttribute {
            attribute: attribute.to_owned(),
            element: names::ENDPOINT.to_owned(),
        })
}

fn invalid(attribute: &str, value: &str, error: &dyn std::fmt::Display) -> ConfigError {
    ConfigError::InvalidAttribute {
        attribute: attribute.to_owned(),
        element: names::ENDPOINT.to_owned(),
        value: value.to_owned(),
        message: error.to_string(),
    }
}
