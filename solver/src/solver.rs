//! The solver: ties the model, the engine and the decision layer into a
//! depth-first search with chronological backtracking.

use crate::backtrack::{Backtrack, World};
use crate::cons::ClauseProp;
use crate::core::state::{Cause, Contradiction};
use crate::core::VarRef;
use crate::engine::{Engine, Entailment, Propagate};
use crate::explain::{Clause, ConflictAnalyzer, FirstUip};
use crate::model::{ConstraintId, ConstraintStatus, Model};
use crate::search::{Brancher, Decision, DecisionFrame, Limits, Solution, SolutionPool};
use crate::signals::{InputSignal, InputStream, StopFlag, Synchro};
use crate::stats::Stats;
use env_param::EnvParam;
use std::sync::Arc;
use std::time::Instant;

/// If true, decisions and conflicts are printed to standard output.
static LOG_DECISIONS: EnvParam<bool> = EnvParam::new("TAURUS_LOG_DECISIONS", "false");

/// Same syntax as `println!` but only prints when `TAURUS_LOG_DECISIONS` is set.
macro_rules! log_dec {
    ($($arg:tt)+) => {
        if LOG_DECISIONS.get() {
            println!($($arg)+);
        }
    }
}

/// Whether a search run exhausted its search space.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Completeness {
    /// The answer is definitive.
    Complete,
    /// A limit or an interrupt cut the run short; the result is the best
    /// known so far.
    Unknown,
}

/// What the driver does with a leaf.
#[derive(Copy, Clone, Eq, PartialEq)]
enum Mode {
    /// Stop at the first solution.
    Satisfy,
    /// Visit every solution.
    Enumerate,
    /// Improve the objective until the space is exhausted.
    Optimize,
}

/// The state machine of the search loop.
#[derive(Copy, Clone, Debug)]
enum State {
    /// Quiescent node: emit a solution or pick a decision.
    OpenNode,
    /// Apply the left branch of a fresh decision.
    Decide(VarRef, crate::search::DecisionKind),
    /// Run the engine to fixed point.
    Propagate,
    /// Backtrack: pop the current world, refute or give up the last decision.
    Up,
}

pub struct Solver {
    pub model: Model,
    pub engine: Engine,
    pub brancher: Brancher,
    pub stats: Stats,
    pub limits: Limits,
    pub solutions: SolutionPool,
    /// The clause-learning sub-solver; present when explanations are enabled.
    analyzer: Option<Box<dyn ConflictAnalyzer>>,
    learned: Vec<Clause>,
    sync: Synchro,
    stop: StopFlag,
    frames: Vec<DecisionFrame>,
    /// Temporary constraints with the world they were posted in.
    temp_posts: Vec<(u32, ConstraintId)>,
}

impl Solver {
    pub fn new(model: Model) -> Solver {
        let analyzer: Option<Box<dyn ConflictAnalyzer>> = if model.store.explanations_enabled() {
            Some(Box::new(FirstUip))
        } else {
            None
        };
        Solver {
            model,
            engine: Engine::new(),
            brancher: Brancher::default(),
            stats: Stats::new(),
            limits: Limits::none(),
            solutions: SolutionPool::new(),
            analyzer,
            learned: Vec::new(),
            sync: Synchro::new(),
            stop: StopFlag::new(),
            frames: Vec::new(),
            temp_posts: Vec::new(),
        }
    }

    pub fn set_brancher(&mut self, brancher: Brancher) {
        self.brancher = brancher;
    }

    /// Replaces the clause-learning sub-solver.
    pub fn set_analyzer(&mut self, analyzer: Box<dyn ConflictAnalyzer>) {
        self.analyzer = Some(analyzer);
    }

    /// Clauses learned so far, in learning order.
    pub fn learned_clauses(&self) -> &[Clause] {
        &self.learned
    }

    /// Handle for interrupting this solver from another thread.
    pub fn input_stream(&self) -> InputStream {
        self.sync.input_stream()
    }

    /// Streams every recorded solution to `sink` as it is found.
    pub fn set_solution_sink(&mut self, sink: crossbeam_channel::Sender<Arc<Solution>>) {
        self.sync.set_solution_sink(sink);
    }

    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    // ======== posting ========

    /// Moves the model's pending constraints into the engine.
    fn post_pending(&mut self) {
        let pending: Vec<_> = self.model.pending.drain(..).collect();
        for (cid, props) in pending {
            let mut ids = Vec::with_capacity(props.len());
            for prop in props {
                let prop = crate::engine::DynPropagator::new(prop);
                ids.push(self.engine.add_propagator(prop, &mut self.model.store));
            }
            let info = self.model.constraint_mut(cid);
            info.propagators = ids;
            info.status = ConstraintStatus::Posted;
        }
    }

    /// Posts a constraint immediately, to be unposted automatically when the
    /// current world is popped. Posting in the root world makes it permanent.
    pub fn post_temporary(&mut self, name: &str, prop: impl Propagate + 'static) -> ConstraintId {
        let cid = self.model.post(name, prop);
        self.post_pending();
        let world = self.current_world();
        if world > World::ROOT {
            self.temp_posts.push((world.depth(), cid));
        }
        cid
    }

    /// Unposts a constraint. Unposting an unknown or already unposted
    /// constraint is a programming error.
    pub fn unpost(&mut self, cid: ConstraintId) {
        let info = self.model.constraint_mut(cid);
        assert_eq!(info.status, ConstraintStatus::Posted, "unposting {cid:?} twice");
        info.status = ConstraintStatus::Unposted;
        let props = std::mem::take(&mut info.propagators);
        for pid in props {
            self.engine.unpost(pid);
        }
    }

    // ======== search API ========

    /// Searches for the first satisfying assignment.
    pub fn solve(&mut self) -> (Option<Arc<Solution>>, Completeness) {
        self.solutions.clear();
        let completeness = self.run(Mode::Satisfy, &mut |_| {});
        (self.solutions.last().cloned(), completeness)
    }

    /// Visits every solution, invoking the callback on each.
    pub fn enumerate_with(&mut self, mut on_solution: impl FnMut(&Arc<Solution>)) -> (u64, Completeness) {
        self.solutions.clear();
        let completeness = self.run(Mode::Enumerate, &mut on_solution);
        (self.solutions.len() as u64, completeness)
    }

    /// Visits every solution, recording them in the pool.
    pub fn enumerate(&mut self) -> (u64, Completeness) {
        self.enumerate_with(|_| {})
    }

    /// Optimizes the model's objective; the returned solution is the best
    /// found. Panics if no objective was declared.
    pub fn optimize(&mut self) -> (Option<Arc<Solution>>, Completeness) {
        assert!(self.model.objective.is_some(), "optimize without an objective");
        self.solutions.clear();
        let completeness = self.run(Mode::Optimize, &mut |_| {});
        // the cut makes every recorded solution improve on the previous one
        let best = self.solutions.last().cloned();
        (best, completeness)
    }

    /// Undoes every decision, bringing the solver back to the root so that
    /// another search can start (a successful `solve` leaves the solver at
    /// the solution).
    pub fn reset_search(&mut self) {
        self.pop_worlds_to(World::ROOT);
        self.frames.clear();
    }

    /// The depth-first search driver: an initial propagation, then an
    /// explicit open/decide/propagate/backtrack state machine until the
    /// space is exhausted, a stop condition fires, or (in satisfaction mode)
    /// a solution is found.
    fn run(&mut self, mode: Mode, on_solution: &mut dyn FnMut(&Arc<Solution>)) -> Completeness {
        assert_eq!(self.current_world(), World::ROOT, "search must start at the root");
        self.stop.lower();
        let started = Instant::now();
        self.post_pending();

        let decision_vars: Vec<VarRef> = self.model.variables();
        let restarts_allowed = mode != Mode::Enumerate;

        // INIT: bring the root to fixed point
        let mut state = match self.engine.propagate(&mut self.model.store, &self.stop) {
            Ok(()) => State::OpenNode,
            Err(_) => {
                // infeasible problem
                self.stats.solve_time += started.elapsed();
                return Completeness::Complete;
            }
        };

        let completeness = loop {
            // node boundary: poll limits and external interrupts
            while let Ok(signal) = self.sync.signals.try_recv() {
                match signal {
                    InputSignal::Interrupt => self.stop.raise(),
                }
            }
            if self.limits.exhausted(&self.stats, started) {
                self.stop.raise();
            }
            if self.stop.is_raised() {
                break Completeness::Unknown;
            }

            state = match state {
                State::OpenNode => {
                    match self.brancher.next_decision(&self.model.store, &decision_vars, restarts_allowed) {
                        Some(Decision::Branch(var, kind)) => State::Decide(var, kind),
                        Some(Decision::Restart) => {
                            log_dec!("<<< restart");
                            self.pop_worlds_to(World::ROOT);
                            self.frames.clear();
                            self.stats.add_restart();
                            State::Propagate
                        }
                        None => {
                            // quiescent leaf with every decision variable instantiated
                            self.emit_solution(on_solution);
                            match mode {
                                Mode::Satisfy => break Completeness::Complete,
                                Mode::Enumerate | Mode::Optimize => State::Up,
                            }
                        }
                    }
                }
                State::Decide(var, kind) => {
                    self.push_world();
                    let frame = DecisionFrame::new(var, kind);
                    log_dec!(
                        "decision {:?}: {} {:?}",
                        self.current_world(),
                        self.model.fmt_var(var),
                        kind
                    );
                    tracing::debug!(world = ?self.current_world(), ?var, ?kind, "decide");
                    let applied = self.model.store.apply(frame.lit(), Cause::Decision, None);
                    assert_eq!(applied, Ok(true), "decision did not restrict the domain");
                    self.frames.push(frame);
                    self.stats.add_decision(self.current_world().depth());
                    State::Propagate
                }
                State::Propagate => {
                    // re-install the objective cut: it is trailed like any
                    // other update and vanished with the last backtrack
                    let cut = if mode == Mode::Optimize {
                        let objective = self.model.objective.expect("optimize mode without objective");
                        objective.apply_cut(&mut self.model.store)
                    } else {
                        Ok(false)
                    };
                    match cut {
                        Err(w) => {
                            self.on_conflict(&Contradiction::Wipeout(w));
                            State::Up
                        }
                        Ok(_) => match self.engine.propagate(&mut self.model.store, &self.stop) {
                            Ok(()) => State::OpenNode,
                            Err(contradiction) => {
                                self.on_conflict(&contradiction);
                                State::Up
                            }
                        },
                    }
                }
                State::Up => {
                    if self.frames.is_empty() {
                        // the root is exhausted
                        break Completeness::Complete;
                    }
                    self.pop_world();
                    let exhausted = {
                        let frame = self.frames.last_mut().unwrap();
                        if frame.exhausted() {
                            true
                        } else {
                            frame.branch += 1;
                            false
                        }
                    };
                    if exhausted {
                        let _ = self.frames.pop();
                        State::Up
                    } else {
                        let frame = *self.frames.last().unwrap();
                        self.push_world();
                        log_dec!(
                            "refute   {:?}: {} {:?}",
                            self.current_world(),
                            self.model.fmt_var(frame.var),
                            frame.lit()
                        );
                        match self.model.store.apply(frame.lit(), Cause::Decision, None) {
                            Ok(changed) => {
                                assert!(changed, "refutation was a no-op");
                                State::Propagate
                            }
                            Err(_) => {
                                // the refutation is itself infeasible: an
                                // arbitrary choice failed, nothing to learn
                                self.stats.add_conflict();
                                self.brancher.on_conflict();
                                State::Up
                            }
                        }
                    }
                }
            };
        };

        if completeness == Completeness::Unknown {
            // orderly unwind so that the solver can be reused
            self.pop_worlds_to(World::ROOT);
            self.frames.clear();
        }
        self.stats.solve_time += started.elapsed();
        completeness
    }

    fn emit_solution(&mut self, on_solution: &mut dyn FnMut(&Arc<Solution>)) {
        let objective_value = self
            .model
            .objective
            .as_mut()
            .map(|obj| obj.on_solution(&self.model.store));
        let solution = Arc::new(Solution::from_store(&self.model.store, objective_value));
        debug_assert!(self.solution_is_valid(), "emitted solution violates a constraint");
        log_dec!("=> solution {:?}", objective_value);
        tracing::debug!(?objective_value, "solution found");
        self.stats.add_solution(objective_value);
        self.sync.notify_solution(&solution);
        on_solution(&solution);
        self.solutions.record(solution);
    }

    fn on_conflict(&mut self, contradiction: &Contradiction) {
        tracing::debug!(world = ?self.current_world(), "conflict");
        self.stats.add_conflict();
        self.brancher.on_conflict();
        if let Some(analyzer) = &mut self.analyzer {
            if let Some(clause) = analyzer.analyze(contradiction, &self.model.store) {
                if !clause.is_empty() {
                    tracing::debug!(?clause, "learned clause");
                    #[cfg(feature = "explanation_checks")]
                    {
                        let open = clause
                            .literals()
                            .iter()
                            .filter(|&&l| self.model.store.lit_value(l) != Some(false))
                            .count();
                        assert!(open <= 1, "learned clause is not asserting: {clause:?}");
                    }
                    self.learned.push(clause.clone());
                    let _ = self
                        .engine
                        .add_propagator(ClauseProp::new(clause), &mut self.model.store);
                }
            }
        }
    }

    /// True if every posted constraint is entailed by the current domains.
    pub fn solution_is_valid(&self) -> bool {
        self.posted_entailments()
            .all(|(_, e)| e == Entailment::True)
    }

    fn posted_entailments(&self) -> impl Iterator<Item = (ConstraintId, Entailment)> + '_ {
        self.model
            .constraints()
            .filter(|(_, info)| info.status == ConstraintStatus::Posted)
            .flat_map(move |(cid, info)| {
                info.propagators
                    .iter()
                    .map(move |&pid| (cid, self.engine.entailment(pid, &self.model.store)))
            })
    }

    pub fn print_stats(&self) {
        println!("{}", self.stats);
        println!("propagations        : {}", self.engine.stats.propagations);
        println!("events seen         : {}", self.engine.stats.events_seen);
        println!("engine conflicts    : {}", self.engine.stats.contradictions);
    }
}

impl Backtrack for Solver {
    fn push_world(&mut self) -> World {
        let w = self.model.store.push_world();
        let we = self.engine.push_world();
        debug_assert_eq!(w, we);
        w
    }

    fn num_worlds(&self) -> u32 {
        debug_assert_eq!(self.model.store.num_worlds(), self.engine.num_worlds());
        self.model.store.num_worlds()
    }

    fn pop_world(&mut self) {
        // temporary constraints registered in the popped world go away first
        let world = self.current_world().depth();
        while let Some(&(w, cid)) = self.temp_posts.last() {
            if w == world {
                let _ = self.temp_posts.pop();
                self.unpost(cid);
            } else {
                break;
            }
        }
        self.model.store.pop_world();
        self.engine.pop_world();
    }
}
