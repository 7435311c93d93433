// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IPv4 address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefixLength(u8),

    #[error("Invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("Invalid VLAN ID: {0} (must be 1-4094)")]
    InvalidVlanId(u16),
}

/// IPv4 network value object
///
/// Invariants:
/// - Prefix length within 0-32
/// - Base address is canonical (host bits cleared)
///
/// # Examples
///
/// ```rust
/// use cim_ipam::domain::Ipv4Network;
///
/// let net: Ipv4Network = "10.0.0.0/24".parse().unwrap();
/// assert_eq!(net.netmask().to_string(), "255.255.255.0");
/// assert_eq!(net.gateway().unwrap().to_string(), "10.0.0.1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Network {
    base: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Network {
    /// Create a network, masking the address to its canonical base
    pub fn new(address: Ipv4Addr, prefix_len: u8) -> Result<Self, NetworkError> {
        if prefix_len > 32 {
            return Err(NetworkError::InvalidPrefixLength(prefix_len));
        }

        let base = Ipv4Addr::from(u32::from(address) & mask_bits(prefix_len));
        Ok(Self { base, prefix_len })
    }

    /// Parse CIDR notation (e.g., "192.0.2.0/24")
    pub fn from_cidr(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref();
        let Some((addr_str, prefix_str)) = cidr.split_once('/') else {
            return Err(NetworkError::InvalidCidr(cidr.to_string()));
        };

        let address = Ipv4Addr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;
        let prefix_len = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        Self::new(address, prefix_len)
    }

    /// Canonical network (base) address
    pub fn base(&self) -> Ipv4Addr {
        self.base
    }

    /// Prefix length
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Dotted-quad netmask
    pub fn netmask(&self) -> Ipv4Addr {
        Ipv4Addr::from(mask_bits(self.prefix_len))
    }

    /// Broadcast address (all host bits set)
    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.base) | !mask_bits(self.prefix_len))
    }

    /// First usable host; `None` for /31 and /32
    pub fn first_usable(&self) -> Option<Ipv4Addr> {
        if self.prefix_len >= 31 {
            return None;
        }
        Some(Ipv4Addr::from(u32::from(self.base) + 1))
    }

    /// Last usable host; `None` for /31 and /32
    pub fn last_usable(&self) -> Option<Ipv4Addr> {
        if self.prefix_len >= 31 {
            return None;
        }
        Some(Ipv4Addr::from(u32::from(self.broadcast()) - 1))
    }

    /// Gateway by convention: the first usable host
    pub fn gateway(&self) -> Option<Ipv4Addr> {
        self.first_usable()
    }

    /// Number of usable hosts
    pub fn usable_count(&self) -> u64 {
        if self.prefix_len >= 31 {
            return 0;
        }
        (1u64 << (32 - self.prefix_len)) - 2
    }

    /// Usable hosts in ascending numeric order, excluding base and broadcast
    pub fn usable_hosts(&self) -> impl Iterator<Item = Ipv4Addr> {
        // (1, 0) yields an empty range
        let (start, end) = match (self.first_usable(), self.last_usable()) {
            (Some(first), Some(last)) => (u32::from(first), u32::from(last)),
            _ => (1, 0),
        };
        (start..=end).map(Ipv4Addr::from)
    }

    /// Check if an address falls inside this network (boundaries included)
    pub fn contains(&self, address: Ipv4Addr) -> bool {
        u32::from(address) & mask_bits(self.prefix_len) == u32::from(self.base)
    }

    /// Get as CIDR notation string
    pub fn as_cidr(&self) -> String {
        format!("{}/{}", self.base, self.prefix_len)
    }
}

fn mask_bits(prefix_len: u8) -> u32 {
    if prefix_len == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix_len))
    }
}

impl fmt::Display for Ipv4Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_cidr())
    }
}

impl FromStr for Ipv4Network {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_cidr(s)
    }
}

impl TryFrom<String> for Ipv4Network {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_cidr(value)
    }
}

impl From<Ipv4Network> for String {
    fn from(net: Ipv4Network) -> Self {
        net.as_cidr()
    }
}

/// MAC Address value object
///
/// Represents a 48-bit L2 address. Equality is on the octets, so
/// "de:ad:be:ef:12:34", "DE-AD-BE-EF-12-34" and "DEADBEEF1234" are the same value.
///
/// # Examples
///
/// ```rust
/// use cim_ipam::domain::MacAddress;
///
/// let mac = MacAddress::new("DE:AD:BE:EF:12:34").unwrap();
/// assert_eq!(mac.as_str(), "de:ad:be:ef:12:34");
/// assert_eq!(mac.storage_form(), "DEADBEEF1234");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Create a new MAC address with validation
    ///
    /// # Invariants
    /// - 12 hex digits, bare or grouped as six octets separated by ':' or '-',
    ///   or as three 4-digit groups separated by '.'
    /// - Separators only between groups
    pub fn new(mac: impl AsRef<str>) -> Result<Self, NetworkError> {
        let mac = mac.as_ref().trim();
        let invalid = || NetworkError::InvalidMacAddress(mac.to_string());

        let groups: Vec<&str> = mac.split([':', '-', '.']).collect();
        let group_len = match (groups.len(), mac.contains('.')) {
            (1, _) => 12,
            (3, true) => 4,
            (6, false) => 2,
            _ => return Err(invalid()),
        };
        let well_formed = groups
            .iter()
            .all(|g| g.len() == group_len && g.bytes().all(|b| b.is_ascii_hexdigit()));
        if !well_formed {
            return Err(invalid());
        }

        let digits = groups.concat();
        let mut octets = [0u8; 6];
        for (i, octet) in octets.iter_mut().enumerate() {
            *octet = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }

        Ok(Self(octets))
    }

    /// Create from raw octets
    pub fn from_octets(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// Get the octets
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Get as canonical string (lowercase, colon-separated)
    pub fn as_str(&self) -> String {
        format!(
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }

    /// Form persisted by the asset database (uppercase, no separators)
    pub fn storage_form(&self) -> String {
        self.0.iter().map(|b| format!("{:02X}", b)).collect()
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MacAddress {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for MacAddress {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.as_str()
    }
}

/// VLAN ID value object
///
/// Represents a VLAN ID (IEEE 802.1Q) with validation.
/// Invariants:
/// - Valid VLAN ID range (1-4094)
/// - VLAN 0 and 4095 are reserved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct VlanId(u16);

impl VlanId {
    /// Minimum valid VLAN ID
    pub const MIN: u16 = 1;

    /// Maximum valid VLAN ID
    pub const MAX: u16 = 4094;

    /// Create a new VLAN ID with validation
    pub fn new(id: u16) -> Result<Self, NetworkError> {
        if !(Self::MIN..=Self::MAX).contains(&id) {
            return Err(NetworkError::InvalidVlanId(id));
        }

        Ok(Self(id))
    }

    /// Get the VLAN ID value
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for VlanId {
    type Error = NetworkError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VlanId> for u16 {
    fn from(vlan: VlanId) -> Self {
        vlan.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("10.0.0.0/24", "255.255.255.0", "10.0.0.1", "10.0.0.255" ; "class c")]
    #[test_case("10.0.0.0/30", "255.255.255.252", "10.0.0.1", "10.0.0.3" ; "point to point")]
    #[test_case("172.16.0.0/12", "255.240.0.0", "172.16.0.1", "172.31.255.255" ; "private b")]
    #[test_case("0.0.0.0/0", "0.0.0.0", "0.0.0.1", "255.255.255.255" ; "default route")]
    fn test_prefix_math(cidr: &str, netmask: &str, gateway: &str, broadcast: &str) {
        let net = Ipv4Network::from_cidr(cidr).unwrap();
        assert_eq!(net.netmask().to_string(), netmask);
        assert_eq!(net.gateway().unwrap().to_string(), gateway);
        assert_eq!(net.broadcast().to_string(), broadcast);
    }

    #[test]
    fn test_base_is_masked() {
        let net = Ipv4Network::from_cidr("192.168.1.77/24").unwrap();
        assert_eq!(net.base().to_string(), "192.168.1.0");
        assert_eq!(net.as_cidr(), "192.168.1.0/24");
    }

    #[test]
    fn test_invalid_network() {
        assert!(Ipv4Network::from_cidr("10.0.0.0/33").is_err());
        assert!(Ipv4Network::from_cidr("10.0.0.0").is_err());
        assert!(Ipv4Network::from_cidr("10.0.0/24").is_err());
        assert!(Ipv4Network::from_cidr("2001:db8::/64").is_err());
    }

    #[test]
    fn test_usable_hosts_exclude_boundaries() {
        let net = Ipv4Network::from_cidr("10.0.0.0/29").unwrap();
        let hosts: Vec<String> = net.usable_hosts().map(|a| a.to_string()).collect();
        assert_eq!(
            hosts,
            vec!["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4", "10.0.0.5", "10.0.0.6"]
        );
        assert_eq!(net.usable_count(), 6);
    }

    #[test_case("10.0.0.0/31" ; "slash 31")]
    #[test_case("10.0.0.7/32" ; "slash 32")]
    fn test_tiny_networks_have_no_usable_hosts(cidr: &str) {
        let net = Ipv4Network::from_cidr(cidr).unwrap();
        assert_eq!(net.usable_hosts().count(), 0);
        assert_eq!(net.usable_count(), 0);
        assert!(net.gateway().is_none());
    }

    #[test]
    fn test_contains() {
        let net = Ipv4Network::from_cidr("10.0.1.0/24").unwrap();
        assert!(net.contains("10.0.1.0".parse().unwrap()));
        assert!(net.contains("10.0.1.255".parse().unwrap()));
        assert!(!net.contains("10.0.0.255".parse().unwrap()));
    }

    #[test]
    fn test_network_serde_as_cidr() {
        let net = Ipv4Network::from_cidr("10.0.0.0/24").unwrap();
        let json = serde_json::to_string(&net).unwrap();
        assert_eq!(json, "\"10.0.0.0/24\"");
        let back: Ipv4Network = serde_json::from_str(&json).unwrap();
        assert_eq!(back, net);
    }

    #[test]
    fn test_mac_address_formats_are_equal() {
        let a = MacAddress::new("DE:AD:BE:EF:12:34").unwrap();
        let b = MacAddress::new("de-ad-be-ef-12-34").unwrap();
        let c = MacAddress::new("DEADBEEF1234").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.storage_form(), "DEADBEEF1234");
    }

    #[test]
    fn test_cisco_dotted_mac_address() {
        let mac = MacAddress::new("dead.beef.1234").unwrap();
        assert_eq!(mac.storage_form(), "DEADBEEF1234");
    }

    #[test_case("DE:AD:BE:EF:12" ; "too short")]
    #[test_case("zz:ad:be:ef:12:34" ; "not hex")]
    #[test_case("+a+b+c+d+e+f" ; "sign characters")]
    #[test_case("d:e:a:d:b:e:e:f:1:2:3:4" ; "separator inside octet")]
    #[test_case("dead:beef:1234" ; "colon separated words")]
    #[test_case("de:ad:be:ef:12:34:" ; "trailing separator")]
    #[test_case("de.ad.be.ef.12.34" ; "dotted octets")]
    fn test_invalid_mac_address(raw: &str) {
        assert!(MacAddress::new(raw).is_err());
    }

    #[test]
    fn test_vlan_id() {
        assert!(VlanId::new(100).is_ok());
        assert!(VlanId::new(0).is_err());
        assert!(VlanId::new(4095).is_err());
    }
}
