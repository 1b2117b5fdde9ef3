use super::kernel::KernelSpec;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::ops::AddAssign;

/// Fixed flop estimate for one kernel variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CostModel {
    pub flops_outer: u64,
    pub flops_inner: u64,
}

/// Loop iterations executed by one or more passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IterationCounts {
    pub outer: u64,
    pub inner: u64,
}

impl AddAssign for IterationCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.outer += rhs.outer;
        self.inner += rhs.inner;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkRecord {
    pub cost: CostModel,
    pub counts: IterationCounts,
    pub passes: u64,
}

impl WorkRecord {
    pub fn flops(&self) -> u64 {
        self.counts.outer * self.cost.flops_outer + self.counts.inner * self.cost.flops_inner
    }
}

/// Per-variant operation counts. Purely observational.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkCounter {
    records: BTreeMap<KernelSpec, WorkRecord>,
}

impl WorkCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, spec: KernelSpec, cost: CostModel, counts: IterationCounts) {
        let record = self.records.entry(spec).or_insert(WorkRecord {
            cost,
            counts: IterationCounts::default(),
            passes: 0,
        });
        record.counts += counts;
        record.passes += 1;
    }

    pub fn merge(&mut self, other: &WorkCounter) {
        for (spec, theirs) in &other.records {
            let record = self.records.entry(*spec).or_insert(WorkRecord {
                cost: theirs.cost,
                counts: IterationCounts::default(),
                passes: 0,
            });
            record.counts += theirs.counts;
            record.passes += theirs.passes;
        }
    }

    pub fn get(&self, spec: &KernelSpec) -> Option<&WorkRecord> {
        self.records.get(spec)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, KernelSpec, WorkRecord> {
        self.records.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_flops(&self) -> u64 {
        self.records.values().map(WorkRecord::flops).sum()
    }

    pub fn reset(&mut self) {
        self.records.clear();
    }
}

impl fmt::Display for WorkCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<36} {:>12} {:>14} {:>16}",
            "Kernel", "Outer", "Inner", "Flops"
        )?;
        for (spec, record) in &self.records {
            writeln!(
                f,
                "{:<36} {:>12} {:>14} {:>16}",
                spec.to_string(),
                record.counts.outer,
                record.counts.inner,
                record.flops()
            )?;
        }
        write!(f, "{:<36} {:>12} {:>14} {:>16}", "Total", "", "", self.total_flops())
    }
}
