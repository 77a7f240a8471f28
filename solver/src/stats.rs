use crate::core::IntCst;
use std::fmt::{Display, Error, Formatter};
use std::time::Duration;

/// Counters of one search run. All times are wall-clock.
#[derive(Clone, Default)]
pub struct Stats {
    pub solve_time: Duration,
    pub num_decisions: u64,
    pub num_conflicts: u64,
    pub num_restarts: u64,
    pub num_solutions: u64,
    /// Value of the best solution found, when optimizing.
    pub best_cost: Option<IntCst>,
    /// Deepest world reached.
    pub max_depth: u32,
}

impl Stats {
    pub fn new() -> Stats {
        Stats::default()
    }

    pub fn add_decision(&mut self, depth: u32) {
        self.num_decisions += 1;
        self.max_depth = self.max_depth.max(depth);
    }

    pub fn add_conflict(&mut self) {
        self.num_conflicts += 1;
    }

    pub fn add_restart(&mut self) {
        self.num_restarts += 1;
    }

    pub fn add_solution(&mut self, cost: Option<IntCst>) {
        self.num_solutions += 1;
        if cost.is_some() {
            self.best_cost = cost;
        }
    }
}

impl Display for Stats {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        fn label(f: &mut Formatter<'_>, label: &str) -> Result<(), Error> {
            write!(f, "{label:<20}: ")
        }
        fn val_throughput(f: &mut Formatter<'_>, value: u64, time: &Duration) -> Result<(), Error> {
            writeln!(f, "{:<12} ({:.0} /sec)", value, (value as f64) / time.as_secs_f64())
        }

        label(f, "solutions")?;
        writeln!(f, "{:<12}", self.num_solutions)?;

        if let Some(cost) = self.best_cost {
            label(f, "best cost")?;
            writeln!(f, "{cost:<12}")?;
        }

        label(f, "restarts")?;
        writeln!(f, "{:<12}", self.num_restarts)?;

        label(f, "max depth")?;
        writeln!(f, "{:<12}", self.max_depth)?;

        label(f, "decisions")?;
        val_throughput(f, self.num_decisions, &self.solve_time)?;

        label(f, "conflicts")?;
        val_throughput(f, self.num_conflicts, &self.solve_time)?;

        label(f, "solve time")?;
        writeln!(f, "{:.6} s", self.solve_time.as_secs_f64())?;

        Ok(())
    }
}
