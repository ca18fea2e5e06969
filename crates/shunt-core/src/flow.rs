use std::fmt;
use std::net::Ipv4Addr;

pub const PROTO_UDP: u32 = 17;

/// Canonical 5-tuple key of both tables.
///
/// Address and port fields hold the wire image of the packet headers (network
/// byte order loaded natively), so a key built from a parsed packet and a key
/// built by the control plane compare byte-for-byte. `proto` is a plain host
/// value and is always UDP in this system.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct FlowKey {
    pub src_addr: u32,
    pub dst_addr: u32,
    pub src_port: u16,
    pub dst_port: u16,
    pub proto: u32,
}

impl FlowKey {
    pub fn udp(src: Ipv4Addr, src_port: u16, dst: Ipv4Addr, dst_port: u16) -> Self {
        Self {
            src_addr: u32::from(src).to_be(),
            dst_addr: u32::from(dst).to_be(),
            src_port: src_port.to_be(),
            dst_port: dst_port.to_be(),
            proto: PROTO_UDP,
        }
    }

    /// Build a key from raw header fields, exactly as they sit in the packet.
    pub fn from_wire(src_addr: u32, dst_addr: u32, src_port: u16, dst_port: u16) -> Self {
        Self {
            src_addr,
            dst_addr,
            src_port,
            dst_port,
            proto: PROTO_UDP,
        }
    }

    /// The fallback lookup key: same destination and protocol, any source.
    pub fn wildcard_src(&self) -> Self {
        Self {
            src_addr: 0,
            src_port: 0,
            ..*self
        }
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x}:{} -> {:08x}:{}",
            u32::from_be(self.src_addr),
            u16::from_be(self.src_port),
            u32::from_be(self.dst_addr),
            u16::from_be(self.dst_port),
        )
    }
}
