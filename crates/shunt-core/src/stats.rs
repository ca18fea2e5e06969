use crate::flow::FlowKey;
use crate::table::LruTable;

/// Per-flow traffic counters. Timestamps are monotonic nanoseconds.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FlowStat {
    pub pkts: u64,
    pub bytes: u64,
    pub last_seen: u64,
}

impl FlowStat {
    /// Fold another replica's counters in: sum the counts, keep the newest
    /// timestamp.
    pub fn merge(&mut self, other: &FlowStat) {
        self.pkts = self.pkts.wrapping_add(other.pkts);
        self.bytes = self.bytes.wrapping_add(other.bytes);
        self.last_seen = self.last_seen.max(other.last_seen);
    }
}

/// Aggregate counter replicas into the reported value.
pub fn aggregate<'a, I>(replicas: I) -> FlowStat
where
    I: IntoIterator<Item = &'a FlowStat>,
{
    let mut agg = FlowStat::default();
    for stat in replicas {
        agg.merge(stat);
    }
    agg
}

/// Statistics table split into one physical replica per execution context.
///
/// Each packet-processing context writes only the replica it owns, so
/// concurrent contexts never contend on a counter; consistency is deferred
/// to the read side, which snapshots every replica and folds.
#[derive(Debug)]
pub struct StatsMap {
    replicas: Vec<LruTable<FlowKey, FlowStat>>,
}

impl StatsMap {
    pub fn new(replicas: usize, capacity: usize) -> Self {
        let replicas = replicas.max(1);
        Self {
            replicas: (0..replicas).map(|_| LruTable::new(capacity)).collect(),
        }
    }

    pub fn replicas(&self) -> usize {
        self.replicas.len()
    }

    /// Account one packet of `frame_len` bytes against `key` in the given
    /// replica. Creates the entry on first sight.
    pub fn record(&self, replica: usize, key: FlowKey, frame_len: u64, now: u64) {
        self.replicas[replica].update_or_insert(
            key,
            |stat| {
                stat.pkts += 1;
                stat.bytes += frame_len;
                stat.last_seen = now;
            },
            || FlowStat {
                pkts: 1,
                bytes: frame_len,
                last_seen: now,
            },
        );
    }

    /// The per-replica values currently recorded for `key`. Replicas that
    /// have never seen the flow contribute nothing.
    pub fn snapshot(&self, key: &FlowKey) -> Vec<FlowStat> {
        self.replicas
            .iter()
            .filter_map(|table| table.lookup(key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn key() -> FlowKey {
        FlowKey::udp(
            Ipv4Addr::new(10, 0, 0, 2),
            1234,
            Ipv4Addr::new(10, 0, 0, 1),
            1234,
        )
    }

    #[test]
    fn test_record_creates_then_updates() {
        let map = StatsMap::new(2, 16);
        map.record(0, key(), 100, 5);
        map.record(0, key(), 50, 9);

        let snap = map.snapshot(&key());
        assert_eq!(snap.len(), 1);
        assert_eq!(
            snap[0],
            FlowStat {
                pkts: 2,
                bytes: 150,
                last_seen: 9
            }
        );
    }

    #[test]
    fn test_replicas_are_isolated() {
        let map = StatsMap::new(4, 16);
        map.record(0, key(), 100, 1);
        map.record(2, key(), 200, 7);
        map.record(2, key(), 10, 3);

        let snap = map.snapshot(&key());
        assert_eq!(snap.len(), 2);

        let agg = aggregate(&snap);
        assert_eq!(agg.pkts, 3);
        assert_eq!(agg.bytes, 310);
        assert_eq!(agg.last_seen, 7);
    }

    #[test]
    fn test_aggregate_sums_and_takes_max_timestamp() {
        let stats = [
            FlowStat {
                pkts: 2,
                bytes: 100,
                last_seen: 50,
            },
            FlowStat {
                pkts: 1,
                bytes: 60,
                last_seen: 80,
            },
            FlowStat {
                pkts: 0,
                bytes: 0,
                last_seen: 0,
            },
        ];
        let agg = aggregate(&stats);
        assert_eq!(
            agg,
            FlowStat {
                pkts: 3,
                bytes: 160,
                last_seen: 80
            }
        );
    }

    #[test]
    fn test_snapshot_of_unknown_flow_is_empty() {
        let map = StatsMap::new(2, 16);
        assert!(map.snapshot(&key()).is_empty());
    }
}
