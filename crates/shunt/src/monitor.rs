use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::debug;
use shunt_core::{aggregate, open, FlowKey, FlowStat, LruTable, StatsMap};

use crate::config::{DEFAULT_REDIRECTS_TABLE, DEFAULT_STATISTICS_TABLE};

/// One run of the control tool: the substitutions to install, the flow whose
/// counters to read back, and how long to wait in between.
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    pub redirects_name: String,
    pub statistics_name: String,
    pub entries: Vec<(FlowKey, FlowKey)>,
    pub stat_flow: FlowKey,
    pub delay: Duration,
}

impl MonitorOptions {
    pub fn new(entries: Vec<(FlowKey, FlowKey)>, stat_flow: FlowKey) -> Self {
        Self {
            redirects_name: DEFAULT_REDIRECTS_TABLE.to_string(),
            statistics_name: DEFAULT_STATISTICS_TABLE.to_string(),
            entries,
            stat_flow,
            delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowReport {
    pub flow: FlowKey,
    pub stat: FlowStat,
    /// Number of counter replicas that contributed to the aggregate.
    pub replicas: usize,
}

/// Install the redirect entries, wait, then read and fold the statistics
/// replicas for the chosen flow.
///
/// Every table access failure is fatal to the run; entries already inserted
/// are not rolled back.
pub fn run(opts: &MonitorOptions) -> Result<FlowReport> {
    let redirects = open::<LruTable<FlowKey, FlowKey>>(&opts.redirects_name)
        .with_context(|| format!("opening redirect table '{}'", opts.redirects_name))?;
    let statistics = open::<StatsMap>(&opts.statistics_name)
        .with_context(|| format!("opening statistics table '{}'", opts.statistics_name))?;

    for (flow, replacement) in &opts.entries {
        debug!("redirect {} => {}", flow, replacement);
        redirects.upsert(*flow, *replacement);
    }

    if !opts.delay.is_zero() {
        debug!("waiting {:?} before reading statistics", opts.delay);
        thread::sleep(opts.delay);
    }

    let snapshot = statistics.snapshot(&opts.stat_flow);
    if snapshot.is_empty() {
        bail!(
            "no statistics recorded for flow {} in table '{}'",
            opts.stat_flow,
            opts.statistics_name
        );
    }
    debug!("aggregating {} replica snapshot(s)", snapshot.len());

    Ok(FlowReport {
        flow: opts.stat_flow,
        stat: aggregate(&snapshot),
        replicas: snapshot.len(),
    })
}
