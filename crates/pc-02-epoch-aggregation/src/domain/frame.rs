//! Link-layer frames delivered by the capture collaborator
//!
//! Only the fields needed for presence counting are modelled. Frames arrive
//! already parsed; 802.11 decoding happens outside this crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Management-frame subtype of a probe request
pub const PROBE_REQUEST_SUBTYPE: u8 = 4;

/// 802.11 frame type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameType {
    Management,
    Control,
    Data,
}

/// A 48-bit hardware address
///
/// Always rendered as lowercase `aa:bb:cc:dd:ee:ff`, so one device hashes to
/// the same filter bits regardless of how the capture side formats it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddress({self})")
    }
}

impl FromStr for MacAddress {
    type Err = String;

    /// Accepts `:` or `-` separated hex octets in either case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.trim().split([':', '-']);
        for octet in octets.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| format!("address {s:?} has fewer than 6 octets"))?;
            if part.len() != 2 {
                return Err(format!("octet {part:?} in {s:?} is not two hex digits"));
            }
            *octet = u8::from_str_radix(part, 16)
                .map_err(|_| format!("octet {part:?} in {s:?} is not hex"))?;
        }
        if parts.next().is_some() {
            return Err(format!("address {s:?} has more than 6 octets"));
        }
        Ok(Self(octets))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}

/// One frame as seen by the sensor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedFrame {
    #[serde(rename = "type")]
    pub frame_type: FrameType,
    pub subtype: u8,
    /// Transmitter (source) address
    #[serde(default)]
    pub addr2: Option<MacAddress>,
}

impl CapturedFrame {
    /// A probe request from `source`
    pub fn probe_request(source: MacAddress) -> Self {
        Self {
            frame_type: FrameType::Management,
            subtype: PROBE_REQUEST_SUBTYPE,
            addr2: Some(source),
        }
    }

    pub fn is_probe_request(&self) -> bool {
        self.frame_type == FrameType::Management && self.subtype == PROBE_REQUEST_SUBTYPE
    }

    /// Source address if this is a probe request that carries one
    pub fn probe_source(&self) -> Option<MacAddress> {
        if self.is_probe_request() {
            self.addr2
        } else {
            None
        }
    }
}
