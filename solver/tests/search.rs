//! End-to-end scenarios: enumeration counts against a brute-force oracle,
//! optimization, infeasibility, limits, learning.

use itertools::Itertools;
use taurus::cons::{LinearLeq, SumElem};
use taurus::core::state::DomainStore;
use taurus::core::{IntCst, Lit, Rel, VarRef};
use taurus::prelude::*;
use taurus::search::{Geometric, RandomVal, RandomVar};

/// Brute-force count of the assignments of `domains` satisfying `accept`.
fn oracle_count(domains: &[Vec<IntCst>], accept: impl Fn(&[IntCst]) -> bool) -> usize {
    domains
        .iter()
        .map(|d| d.iter().copied())
        .multi_cartesian_product()
        .filter(|vals| accept(vals))
        .count()
}

fn eval_lit(lit: Lit, values: &[IntCst]) -> bool {
    let v = values[usize::from(lit.variable())];
    match lit.relation() {
        Rel::Eq => v == lit.value(),
        Rel::Neq => v != lit.value(),
        Rel::Leq => v <= lit.value(),
        Rel::Geq => v >= lit.value(),
    }
}

#[test]
fn two_variable_sum() {
    // x, y in [1,3], x + y = 4: exactly (1,3), (2,2), (3,1)
    let mut model = Model::named("sum4");
    let x = model.new_int_var(1, 3, "x");
    let y = model.new_int_var(1, 3, "y");
    model.linear_eq(&[(1, x), (1, y)], 4);

    let mut solver = Solver::new(model);
    let mut seen = Vec::new();
    let (count, completeness) = solver.enumerate_with(|s| seen.push((s.value(x), s.value(y))));
    assert_eq!(completeness, Completeness::Complete);
    assert_eq!(count, 3);
    seen.sort_unstable();
    assert_eq!(seen, vec![(1, 3), (2, 2), (3, 1)]);
    // the search left the domains as it found them
    assert_eq!(solver.model.store.bounds(x), (1, 3));
    assert_eq!(solver.model.store.bounds(y), (1, 3));
}

#[test]
fn doubling_constraint() {
    // x in [0,10], y in [0,10], x = 2y: 6 solutions
    let mut model = Model::named("double");
    let x = model.new_int_var(0, 10, "x");
    let y = model.new_int_var(0, 10, "y");
    model.linear_eq(&[(1, x), (-2, y)], 0);

    let mut solver = Solver::new(model);
    let mut seen = Vec::new();
    let (count, _) = solver.enumerate_with(|s| seen.push((s.value(x), s.value(y))));
    assert_eq!(count, 6);
    seen.sort_unstable();
    assert_eq!(seen, vec![(0, 0), (2, 1), (4, 2), (6, 3), (8, 4), (10, 5)]);
}

#[test]
fn all_different_triple() {
    // x, y, z in [1,5] pairwise distinct: 5 * 4 * 3 solutions
    let mut model = Model::named("alldiff");
    let vars: Vec<VarRef> = ["x", "y", "z"]
        .iter()
        .map(|n| model.new_enum_var(1..=5, *n))
        .collect();
    model.all_different(vars.clone());

    let mut solver = Solver::new(model);
    let (count, completeness) = solver.enumerate();
    assert_eq!(completeness, Completeness::Complete);
    assert_eq!(count, 60);
}

#[test]
fn infeasible_at_the_root() {
    // x in [1,3] with every value forbidden
    let mut model = Model::named("wipeout");
    let x = model.new_int_var(1, 3, "x");
    for v in 1..=3 {
        model.neq_val(x, v);
    }
    let mut solver = Solver::new(model);
    let (solution, completeness) = solver.solve();
    assert!(solution.is_none());
    assert_eq!(completeness, Completeness::Complete);
    assert_eq!(solver.stats.num_solutions, 0);
}

#[test]
fn minimize_a_sum() {
    // minimize x + y subject to x, y in [1,5] and x + y >= 3
    let mut model = Model::named("optimize");
    let x = model.new_int_var(1, 5, "x");
    let y = model.new_int_var(1, 5, "y");
    let obj = model.new_int_var(2, 10, "obj");
    model.linear_eq(&[(1, x), (1, y), (-1, obj)], 0);
    model.linear_geq(&[(1, x), (1, y)], 3);
    model.minimize(obj);

    let mut solver = Solver::new(model);
    let (best, completeness) = solver.optimize();
    let best = best.expect("feasible problem");
    assert_eq!(completeness, Completeness::Complete);
    assert_eq!(best.objective(), Some(3));
    assert_eq!(best.value(x) + best.value(y), 3);
    assert_eq!(solver.stats.best_cost, Some(3));
    assert!(solver.stats.num_decisions <= 10, "took {} decisions", solver.stats.num_decisions);
}

#[test]
fn counts_match_brute_force() {
    // a mixed model: enumerated domains with holes and two constraints
    let dx: Vec<IntCst> = vec![0, 2, 3, 5];
    let dy: Vec<IntCst> = vec![1, 2, 4];
    let dz: Vec<IntCst> = vec![0, 1, 2, 3, 4, 5];
    let expected = oracle_count(&[dx.clone(), dy.clone(), dz.clone()], |v| {
        v[0] + v[1] <= 6 && v[0] != v[2] && v[1] != v[2]
    });

    let mut model = Model::named("oracle");
    let x = model.new_enum_var(dx, "x");
    let y = model.new_enum_var(dy, "y");
    let z = model.new_enum_var(dz, "z");
    model.linear_leq(&[(1, x), (1, y)], 6);
    model.neq(x, z);
    model.neq(y, z);

    let mut solver = Solver::new(model);
    let (count, _) = solver.enumerate();
    assert_eq!(count as usize, expected);
}

#[test]
fn strategies_agree_on_the_count() {
    let build = || {
        let mut model = Model::named("strategies");
        let x = model.new_enum_var(1..=4, "x");
        let y = model.new_enum_var(1..=4, "y");
        let z = model.new_enum_var(1..=4, "z");
        model.all_different([x, y, z]);
        model.linear_leq(&[(1, x), (1, y), (1, z)], 8);
        Solver::new(model)
    };
    let expected = oracle_count(
        &[(1..=4).collect(), (1..=4).collect(), (1..=4).collect()],
        |v| v[0] != v[1] && v[0] != v[2] && v[1] != v[2] && v[0] + v[1] + v[2] <= 8,
    ) as u64;

    let branchers = [
        Brancher::new(VarOrderKind::Lexical, ValueOrderKind::Min, RestartKind::default()),
        Brancher::new(VarOrderKind::FirstFail, ValueOrderKind::Max, RestartKind::default()),
        Brancher::new(VarOrderKind::Lexical, ValueOrderKind::LowerHalf, RestartKind::default()),
        Brancher::new(
            VarOrderKind::Random(RandomVar::new(17)),
            ValueOrderKind::Random(RandomVal::new(23)),
            RestartKind::default(),
        ),
    ];
    for brancher in branchers {
        let mut solver = build();
        solver.set_brancher(brancher);
        let (count, completeness) = solver.enumerate();
        assert_eq!(completeness, Completeness::Complete);
        assert_eq!(count, expected);
    }
}

#[test]
fn random_strategies_are_reproducible() {
    let run = || {
        let mut model = Model::named("deterministic");
        let x = model.new_enum_var(1..=5, "x");
        let y = model.new_enum_var(1..=5, "y");
        model.neq(x, y);
        let mut solver = Solver::new(model);
        solver.set_brancher(Brancher::new(
            VarOrderKind::Random(RandomVar::new(11)),
            ValueOrderKind::Random(RandomVal::new(13)),
            RestartKind::default(),
        ));
        let mut trace = Vec::new();
        let _ = solver.enumerate_with(|s| trace.push((s.value(x), s.value(y))));
        trace
    };
    assert_eq!(run(), run());
}

#[test]
fn solution_limit_reports_unknown() {
    let mut model = Model::named("limited");
    let vars: Vec<VarRef> = (0..3).map(|i| model.new_enum_var(1..=5, format!("v{i}"))).collect();
    model.all_different(vars);
    let mut solver = Solver::new(model);
    solver.limits = Limits::none().with_solutions(2);
    let (count, completeness) = solver.enumerate();
    assert_eq!(count, 2);
    assert_eq!(completeness, Completeness::Unknown);
}

#[test]
fn interrupt_stops_the_search() {
    let mut model = Model::named("interrupted");
    let vars: Vec<VarRef> = (0..6).map(|i| model.new_enum_var(1..=6, format!("v{i}"))).collect();
    model.all_different(vars);
    let mut solver = Solver::new(model);
    solver.input_stream().interrupt();
    let (count, completeness) = solver.enumerate();
    assert_eq!(count, 0);
    assert_eq!(completeness, Completeness::Unknown);
}

#[test]
fn restarts_preserve_completeness() {
    // infeasible pigeonhole: 4 distinct variables over 3 values
    let mut model = Model::named("restarting");
    let vars: Vec<VarRef> = (0..4).map(|i| model.new_enum_var(1..=3, format!("p{i}"))).collect();
    model.all_different(vars);
    let mut solver = Solver::new(model);
    solver.set_brancher(Brancher::new(
        VarOrderKind::Lexical,
        ValueOrderKind::Min,
        RestartKind::Geometric(Geometric::new(1.5, 2)),
    ));
    let (solution, completeness) = solver.solve();
    assert!(solution.is_none());
    assert_eq!(completeness, Completeness::Complete);
    assert!(solver.stats.num_restarts >= 1);
}

#[test]
fn solutions_satisfy_every_posted_constraint() {
    let mut model = Model::named("validity");
    let x = model.new_enum_var(1..=4, "x");
    let y = model.new_enum_var(1..=4, "y");
    let z = model.new_enum_var(1..=4, "z");
    model.all_different([x, y, z]);
    model.linear_leq(&[(1, x), (2, y), (1, z)], 11);
    let mut solver = Solver::new(model);
    let (solution, _) = solver.solve();
    assert!(solution.is_some());
    // the solver is standing on the solution: every constraint is entailed
    assert!(solver.solution_is_valid());
}

#[test]
fn temporary_constraints_vanish_on_backtrack() {
    use taurus::cons::NeqVal;

    let mut model = Model::named("temporary");
    let x = model.new_enum_var(1..=3, "x");
    let mut solver = Solver::new(model);
    let stop = solver.stop_flag();

    solver.push_world();
    solver.post_temporary("forbid-2", NeqVal::new(x, 2));
    solver.engine.propagate(&mut solver.model.store, &stop).unwrap();
    assert!(!solver.model.store.contains(x, 2));

    solver.pop_world();
    assert!(solver.model.store.contains(x, 2));
    // the constraint was unposted with its world: a full search sees all
    // three values again
    let (total, _) = solver.enumerate();
    assert_eq!(total, 3);
}

#[test]
fn learned_clauses_are_consequences() {
    // pigeonhole-flavored instance that forces conflicts, with learning on
    let domains: Vec<Vec<IntCst>> = vec![
        (1..=3).collect(),
        (1..=3).collect(),
        (1..=3).collect(),
        (1..=6).collect(),
    ];
    let accept = |v: &[IntCst]| {
        v[0] != v[1] && v[0] != v[2] && v[1] != v[2] && v[0] + v[1] + v[2] <= v[3]
    };

    let mut model = Model::named("learning");
    model.enable_explanations();
    let x = model.new_enum_var(1..=3, "x");
    let y = model.new_enum_var(1..=3, "y");
    let z = model.new_enum_var(1..=3, "z");
    let w = model.new_enum_var(1..=6, "w");
    model.all_different([x, y, z]);
    model.linear_leq(&[(1, x), (1, y), (1, z), (-1, w)], 0);

    let expected = oracle_count(&domains, accept) as u64;
    let mut solver = Solver::new(model);
    let (count, completeness) = solver.enumerate();
    assert_eq!(completeness, Completeness::Complete);
    assert_eq!(count, expected);

    // every learned clause must hold in every solution of the instance
    for clause in solver.learned_clauses() {
        let violated = domains
            .iter()
            .map(|d| d.iter().copied())
            .multi_cartesian_product()
            .filter(|v| accept(v))
            .find(|v| !clause.literals().iter().any(|&l| eval_lit(l, v)));
        assert!(
            violated.is_none(),
            "learned clause {clause:?} prunes the model solution {violated:?}"
        );
    }
}

#[test]
fn optimization_with_learning_finds_the_same_best() {
    let build = |explanations: bool| {
        let mut model = Model::named("learn-opt");
        if explanations {
            model.enable_explanations();
        }
        let x = model.new_enum_var(1..=5, "x");
        let y = model.new_enum_var(1..=5, "y");
        let obj = model.new_int_var(2, 10, "obj");
        model.all_different([x, y]);
        model.linear_eq(&[(1, x), (1, y), (-1, obj)], 0);
        model.linear_geq(&[(1, x), (1, y)], 4);
        model.minimize(obj);
        Solver::new(model)
    };
    let (plain, c1) = build(false).optimize();
    let (learning, c2) = build(true).optimize();
    assert_eq!(c1, Completeness::Complete);
    assert_eq!(c2, Completeness::Complete);
    assert_eq!(plain.unwrap().objective(), Some(4));
    assert_eq!(learning.unwrap().objective(), Some(4));
}

#[test]
fn solutions_stream_to_the_sink() {
    let mut model = Model::named("sink");
    let x = model.new_enum_var(1..=3, "x");
    let y = model.new_enum_var(1..=3, "y");
    model.neq(x, y);
    let mut solver = Solver::new(model);
    let (tx, rx) = crossbeam_channel::unbounded();
    solver.set_solution_sink(tx);
    let (count, _) = solver.enumerate();
    let streamed: Vec<_> = rx.try_iter().collect();
    assert_eq!(streamed.len() as u64, count);
    assert!(streamed.iter().all(|s| s.value(x) != s.value(y)));
}

#[test]
fn stopped_engine_finishes_cleanly() {
    // a raised stop flag makes the engine return before quiescence
    use taurus::engine::Engine;
    use taurus::signals::StopFlag;

    let mut store = DomainStore::new();
    let mut engine = Engine::new();
    let stop = StopFlag::new();
    let x = store.new_interval_var(0, 100);
    let y = store.new_interval_var(0, 100);
    engine.add_propagator(
        LinearLeq::new(vec![SumElem::new(1, x), SumElem::new(1, y)], 50),
        &mut store,
    );
    stop.raise();
    assert!(engine.propagate(&mut store, &stop).is_ok());
}
