#![allow(dead_code)]

use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

use shunt::fib::{FibLookup, FibQuery, NextHop};
use shunt_proto::{checksum, parse_eth, parse_ipv4, parse_udp, udp_checksum, ETH_P_IP, IPPROTO_UDP};

pub const ETH_LEN: usize = 14;
pub const IP_LEN: usize = 20;
pub const UDP_LEN: usize = 8;

/// Build a complete Ethernet+IPv4+UDP frame with valid checksums.
pub fn udp_frame(
    src: Ipv4Addr,
    src_port: u16,
    dst: Ipv4Addr,
    dst_port: u16,
    payload: &[u8],
) -> Vec<u8> {
    let udp_len = UDP_LEN + payload.len();
    let total_len = IP_LEN + udp_len;
    let mut frame = vec![0u8; ETH_LEN + total_len];

    frame[0..6].copy_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
    frame[6..12].copy_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x02]);
    frame[12..14].copy_from_slice(&ETH_P_IP.to_be_bytes());

    {
        let ip = &mut frame[ETH_LEN..ETH_LEN + IP_LEN];
        ip[0] = 0x45;
        ip[2..4].copy_from_slice(&(total_len as u16).to_be_bytes());
        ip[8] = 64; // TTL
        ip[9] = IPPROTO_UDP;
        ip[12..16].copy_from_slice(&src.octets());
        ip[16..20].copy_from_slice(&dst.octets());
        let csum = checksum(ip);
        ip[10..12].copy_from_slice(&csum.to_be_bytes());
    }

    {
        let udp = &mut frame[ETH_LEN + IP_LEN..];
        udp[0..2].copy_from_slice(&src_port.to_be_bytes());
        udp[2..4].copy_from_slice(&dst_port.to_be_bytes());
        udp[4..6].copy_from_slice(&(udp_len as u16).to_be_bytes());
        udp[8..].copy_from_slice(payload);
        let csum = udp_checksum(src, dst, udp);
        udp[6..8].copy_from_slice(&csum.to_be_bytes());
    }

    frame
}

/// The frame's current 5-tuple in host order.
pub fn frame_flow(frame: &[u8]) -> (Ipv4Addr, u16, Ipv4Addr, u16) {
    let (_, l3) = parse_eth(frame).expect("eth");
    let (ip, l4) = parse_ipv4(l3).expect("ipv4");
    let (udp, _) = parse_udp(l4).expect("udp");
    (ip.src_addr(), udp.src_port(), ip.dst_addr(), udp.dst_port())
}

pub fn frame_ttl(frame: &[u8]) -> u8 {
    frame[ETH_LEN + 8]
}

pub fn ip_checksum_valid(frame: &[u8]) -> bool {
    let (_, l3) = parse_eth(frame).expect("eth");
    let (ip, _) = parse_ipv4(l3).expect("ipv4");
    ip.is_valid()
}

pub fn udp_checksum_valid(frame: &[u8]) -> bool {
    let (_, l3) = parse_eth(frame).expect("eth");
    let (ip, l4) = parse_ipv4(l3).expect("ipv4");
    let (udp, _) = parse_udp(l4).expect("udp");
    udp.verify_checksum(ip, l4)
}

/// Next-hop resolver that always answers the same thing.
#[derive(Debug)]
pub struct StubFib(pub NextHop);

impl FibLookup for StubFib {
    fn lookup(&self, _query: &FibQuery) -> NextHop {
        self.0
    }
}

/// Resolver that remembers the last query it was asked.
#[derive(Clone)]
pub struct RecordingFib {
    result: NextHop,
    last: Arc<Mutex<Option<FibQuery>>>,
}

impl RecordingFib {
    pub fn new(result: NextHop) -> Self {
        Self {
            result,
            last: Arc::new(Mutex::new(None)),
        }
    }

    pub fn last_query(&self) -> Option<FibQuery> {
        *self.last.lock().unwrap()
    }
}

impl FibLookup for RecordingFib {
    fn lookup(&self, query: &FibQuery) -> NextHop {
        *self.last.lock().unwrap() = Some(*query);
        self.result
    }
}
