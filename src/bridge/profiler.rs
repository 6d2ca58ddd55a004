//! Call-count and timing profiler for the bridge loop.
use std::{
    cmp::Ordering,
    collections::BTreeMap,
    io::{self, Write},
    time::{Duration, Instant},
};

/// Column the profile report is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMetric {
    Ncalls,
    Tottime,
    Percall,
    Cumtime,
    Name,
}

impl SortMetric {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SortMetric::Ncalls => "ncalls",
            SortMetric::Tottime => "tottime",
            SortMetric::Percall => "percall",
            SortMetric::Cumtime => "cumtime",
            SortMetric::Name => "name",
        }
    }

    const fn description(&self) -> &'static str {
        match self {
            SortMetric::Ncalls => "call count",
            SortMetric::Tottime => "internal time",
            SortMetric::Percall => "internal time per call",
            SortMetric::Cumtime => "cumulative time",
            SortMetric::Name => "name",
        }
    }
}

/// Aggregated timings for one measured section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    pub ncalls: u64,
    /// Time spent in the section itself, excluding nested sections.
    pub tottime: Duration,
    /// Time spent in the section including nested sections.
    pub cumtime: Duration,
}

impl CallStats {
    pub fn percall(&self) -> Duration {
        per_call(self.tottime, self.ncalls)
    }

    pub fn cum_percall(&self) -> Duration {
        per_call(self.cumtime, self.ncalls)
    }
}

fn per_call(total: Duration, ncalls: u64) -> Duration {
    if ncalls == 0 {
        return Duration::ZERO;
    }
    let nanos = total.as_nanos() / u128::from(ncalls);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

struct Frame {
    started_at: Instant,
    child_time: Duration,
}

/// Records nested sections and renders a report ordered by a [`SortMetric`].
pub struct Profiler {
    metric: SortMetric,
    stats: BTreeMap<&'static str, CallStats>,
    stack: Vec<Frame>,
}

impl Profiler {
    pub fn new(metric: SortMetric) -> Self {
        Self {
            metric,
            stats: BTreeMap::new(),
            stack: Vec::new(),
        }
    }

    /// Run `f` as section `name`; sections opened inside `f` count as children.
    pub fn measure<T>(&mut self, name: &'static str, f: impl FnOnce(&mut Self) -> T) -> T {
        self.stack.push(Frame {
            started_at: Instant::now(),
            child_time: Duration::ZERO,
        });
        let output = f(self);
        if let Some(frame) = self.stack.pop() {
            let elapsed = frame.started_at.elapsed();
            self.add(name, elapsed.saturating_sub(frame.child_time), elapsed);
        }
        output
    }

    /// Record a section timed elsewhere (e.g. across an await point).
    pub fn record(&mut self, name: &'static str, elapsed: Duration) {
        self.add(name, elapsed, elapsed);
    }

    fn add(&mut self, name: &'static str, own: Duration, elapsed: Duration) {
        if let Some(parent) = self.stack.last_mut() {
            parent.child_time += elapsed;
        }
        let entry = self.stats.entry(name).or_default();
        entry.ncalls += 1;
        entry.tottime += own;
        entry.cumtime += elapsed;
    }

    pub fn stats(&self, name: &str) -> Option<CallStats> {
        self.stats.get(name).copied()
    }

    /// Sections ordered by the metric; numeric metrics descend, names ascend.
    pub fn sorted(&self) -> Vec<(&'static str, CallStats)> {
        let mut rows: Vec<(&'static str, CallStats)> =
            self.stats.iter().map(|(name, stats)| (*name, *stats)).collect();
        let metric = self.metric;
        rows.sort_by(|(left_name, left), (right_name, right)| {
            let ordering = match metric {
                SortMetric::Ncalls => right.ncalls.cmp(&left.ncalls),
                SortMetric::Tottime => right.tottime.cmp(&left.tottime),
                SortMetric::Percall => right.percall().cmp(&left.percall()),
                SortMetric::Cumtime => right.cumtime.cmp(&left.cumtime),
                SortMetric::Name => Ordering::Equal,
            };
            ordering.then_with(|| left_name.cmp(right_name))
        });
        rows
    }

    pub fn write_report(&self, out: &mut dyn Write) -> io::Result<()> {
        let rows = self.sorted();
        let total_calls: u64 = rows.iter().map(|(_, stats)| stats.ncalls).sum();
        let total_time: Duration = rows.iter().map(|(_, stats)| stats.tottime).sum();

        writeln!(
            out,
            "{total_calls} calls in {:.3} seconds",
            total_time.as_secs_f64()
        )?;
        writeln!(out)?;
        writeln!(out, "   Ordered by: {}", self.metric.description())?;
        writeln!(out)?;
        writeln!(
            out,
            "{:>9} {:>9} {:>9} {:>9} {:>9} name",
            "ncalls", "tottime", "percall", "cumtime", "percall"
        )?;
        for (name, stats) in rows {
            writeln!(
                out,
                "{:>9} {:>9.3} {:>9.3} {:>9.3} {:>9.3} {name}",
                stats.ncalls,
                stats.tottime.as_secs_f64(),
                stats.percall().as_secs_f64(),
                stats.cumtime.as_secs_f64(),
                stats.cum_percall().as_secs_f64(),
            )?;
        }
        out.flush()
    }
}
