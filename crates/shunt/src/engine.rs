use std::net::Ipv4Addr;
use std::sync::Arc;

use shunt_core::{clock, FlowKey, LruTable, StatsMap};
use shunt_proto::{
    checksum_update, parse_eth_mut, parse_ipv4_mut, parse_udp_mut, ETH_P_IP, IPPROTO_UDP,
};

use crate::config::EngineConfig;
use crate::fib::{FibLookup, FibQuery, NextHop};

/// Forwarding decision for one packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Leave the packet to the regular stack, untouched or rewritten.
    Pass,
    Drop,
    Redirect(RedirectTarget),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectTarget {
    pub ifindex: u32,
    /// Re-inject on the ingress side of the target interface. Implies the
    /// packet is reclassified as locally destined first.
    pub ingress: bool,
}

/// One execution context's view of the dataplane: shared tables, a private
/// counter replica and the host's routing hook.
#[derive(Debug)]
pub struct RedirectEngine<F> {
    redirects: Arc<LruTable<FlowKey, FlowKey>>,
    statistics: Arc<StatsMap>,
    replica: usize,
    config: EngineConfig,
    fib: F,
}

impl<F: FibLookup> RedirectEngine<F> {
    pub(crate) fn new(
        redirects: Arc<LruTable<FlowKey, FlowKey>>,
        statistics: Arc<StatsMap>,
        replica: usize,
        config: EngineConfig,
        fib: F,
    ) -> Self {
        Self {
            redirects,
            statistics,
            replica,
            config,
            fib,
        }
    }

    pub fn replica(&self) -> usize {
        self.replica
    }

    /// Process one raw frame in place and return the forwarding decision.
    ///
    /// Anything that is not a complete Ethernet+IPv4+UDP packet, and any
    /// flow without a redirect entry, passes through byte-identical. Only a
    /// definitive negative from the routing lookup ever drops.
    pub fn process(&self, frame: &mut [u8], ingress_ifindex: u32) -> Verdict {
        let frame_len = frame.len() as u64;

        let Some((eth, l3)) = parse_eth_mut(frame) else {
            return Verdict::Pass;
        };
        if eth.eth_type() != ETH_P_IP {
            return Verdict::Pass;
        }
        let Some((ip, l4)) = parse_ipv4_mut(l3) else {
            return Verdict::Pass;
        };
        if ip.proto != IPPROTO_UDP {
            return Verdict::Pass;
        }
        let Some((udp, _payload)) = parse_udp_mut(l4) else {
            return Verdict::Pass;
        };

        // Exact 5-tuple first, then the source-wildcarded fallback. The key
        // that hit is also the statistics key: it is the key the control
        // plane installed and reads back.
        let flow = FlowKey::from_wire(ip.src, ip.dst, udp.src_port, udp.dst_port);
        let (matched, replacement) = match self.redirects.lookup(&flow) {
            Some(replacement) => (flow, replacement),
            None => {
                let wild = flow.wildcard_src();
                match self.redirects.lookup(&wild) {
                    Some(replacement) => (wild, replacement),
                    None => return Verdict::Pass,
                }
            }
        };

        // Substitute the 5-tuple in place.
        ip.src = replacement.src_addr;
        ip.dst = replacement.dst_addr;
        udp.src_port = replacement.src_port;
        udp.dst_port = replacement.dst_port;

        // The IP header checksum is rebuilt from scratch; the UDP checksum
        // is patched incrementally against the packet's pre-rewrite fields.
        // Unchanged ports are left out so a checksum transmitted as 0xFFFF
        // is not refolded into the reserved zero.
        ip.compute_checksum();
        udp.check = checksum_update(udp.check, flow.src_addr, replacement.src_addr);
        udp.check = checksum_update(udp.check, flow.dst_addr, replacement.dst_addr);
        if replacement.dst_port != flow.dst_port {
            udp.check = checksum_update(
                udp.check,
                flow.dst_port as u32,
                replacement.dst_port as u32,
            );
        }
        if replacement.src_port != flow.src_port {
            udp.check = checksum_update(
                udp.check,
                flow.src_port as u32,
                replacement.src_port as u32,
            );
        }

        let verdict = if ip.dst == u32::from(Ipv4Addr::LOCALHOST).to_be() {
            // Loopback shortcut: hand the packet to the local stack without
            // a routing lookup. The TTL is deliberately left alone here.
            eth.dst = self.config.loopback_mac;
            eth.src = self.config.loopback_mac;
            Verdict::Redirect(RedirectTarget {
                ifindex: self.config.loopback_ifindex,
                ingress: true,
            })
        } else {
            let query = FibQuery {
                tos: ip.tos,
                protocol: ip.proto,
                total_len: ip.total_len(),
                src: ip.src_addr(),
                dst: ip.dst_addr(),
                ingress_ifindex,
            };
            match self.fib.lookup(&query) {
                NextHop::Resolved {
                    ifindex,
                    src_mac,
                    dst_mac,
                } => {
                    ip.decrement_ttl();
                    eth.dst = dst_mac;
                    eth.src = src_mac;
                    Verdict::Redirect(RedirectTarget {
                        ifindex,
                        ingress: false,
                    })
                }
                NextHop::Blackhole | NextHop::Unreachable | NextHop::Prohibited => Verdict::Drop,
                NextHop::NotForwarded
                | NextHop::ForwardingDisabled
                | NextHop::UnsupportedEncap
                | NextHop::NoNeighbor
                | NextHop::FragmentationNeeded => Verdict::Pass,
            }
        };

        // Account the packet; dropped packets are not counted.
        if verdict != Verdict::Drop {
            self.statistics
                .record(self.replica, matched, frame_len, clock::monotonic_ns());
        }

        verdict
    }
}
