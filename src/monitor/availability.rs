//! Cumulative per-domain availability

use std::collections::BTreeMap;

use crate::monitor::CheckResult;

/// UP count and total probes for one domain
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DomainTally {
    pub up: u64,
    pub total: u64,
}

impl DomainTally {
    /// Whole-number availability percentage, rounded down.
    pub fn availability(&self) -> u64 {
        if self.total == 0 {
            0
        } else {
            self.up * 100 / self.total
        }
    }
}

/// Running UP/total counters keyed by domain.
///
/// Only counters are kept; individual probe results are not retained.
#[derive(Debug, Default, Clone)]
pub struct AvailabilityTracker {
    domains: BTreeMap<String, DomainTally>,
}

impl AvailabilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &CheckResult) {
        let tally = self.domains.entry(result.domain.clone()).or_default();
        tally.total += 1;
        if result.verdict().is_up() {
            tally.up += 1;
        }
    }

    pub fn record_all<'a, I>(&mut self, results: I)
    where
        I: IntoIterator<Item = &'a CheckResult>,
    {
        for result in results {
            self.record(result);
        }
    }

    pub fn tally(&self, domain: &str) -> Option<DomainTally> {
        self.domains.get(domain).copied()
    }

    pub fn availability(&self, domain: &str) -> Option<u64> {
        self.tally(domain).map(|t| t.availability())
    }

    /// Domains in sorted order with their availability
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.domains
            .iter()
            .map(|(domain, tally)| (domain.as_str(), tally.availability()))
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// One report line per domain
    pub fn report_lines(&self) -> Vec<String> {
        self.iter()
            .map(|(domain, pct)| format!("{} has {}% availability percentage", domain, pct))
            .collect()
    }
}
