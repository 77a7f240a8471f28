use crate::backtrack::{Backtrack, Env, EventIdx, Log, World};
use crate::core::domain::{Dom, DomainKind, EnumeratedDom, IntervalDom};
use crate::core::state::{Cause, DeltaMonitor, Event, EventMask, Reason, Wipeout};
use crate::core::{clamped, IntCst, Lit, Rel, VarRef};
use crate::collections::ref_store::RefVec;

/// Holds the domains of all variables of one model, the event log and the
/// reversible memory backing both.
///
/// **Invariant:** every domain is non-empty. A mutator whose effect would
/// empty a domain returns `Err(Wipeout)` and leaves the domain untouched.
///
/// All mutators are idempotent: a no-op returns `Ok(false)` and emits
/// nothing. A successful change emits exactly one event whose mask is the
/// strongest applicable description of the change.
pub struct DomainStore {
    env: Env,
    doms: RefVec<VarRef, Dom>,
    events: Log<Event>,
    /// Number of live delta monitors; world commits are refused while > 0.
    monitors: u32,
    /// When true, reasons supplied to mutators are recorded on the events.
    explaining: bool,
}

impl Default for DomainStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainStore {
    pub fn new() -> Self {
        DomainStore {
            env: Env::new(),
            doms: RefVec::new(),
            events: Log::new(),
            monitors: 0,
            explaining: false,
        }
    }

    /// Activates the explanation layer: reasons passed to mutators will be
    /// recorded on the event log for conflict analysis.
    pub fn enable_explanations(&mut self) {
        self.explaining = true;
    }

    pub fn explanations_enabled(&self) -> bool {
        self.explaining
    }

    // =========== variable creation ===========

    /// Creates a variable with the bounded-interval representation.
    pub fn new_interval_var(&mut self, lb: IntCst, ub: IntCst) -> VarRef {
        let (lb, ub) = (clamped(lb), clamped(ub));
        assert!(lb <= ub, "empty initial domain [{lb}, {ub}]");
        let lb = self.env.make_int(lb);
        let ub = self.env.make_int(ub);
        self.doms.push(Dom::Interval(IntervalDom { lb, ub }))
    }

    /// Creates a variable from an explicit value set, with the enumerated
    /// (bit-set) representation.
    pub fn new_enum_var(&mut self, values: impl IntoIterator<Item = IntCst>) -> VarRef {
        let mut values: Vec<IntCst> = values.into_iter().map(clamped).collect();
        values.sort_unstable();
        values.dedup();
        assert!(!values.is_empty(), "empty initial domain");
        let lb = values[0];
        let ub = *values.last().unwrap();
        let capacity = (ub - lb + 1) as u32;
        let bits = self.env.make_bitset(capacity);
        for &v in &values {
            bits.insert(&mut self.env, (v - lb) as u32);
        }
        let size = self.env.make_int(values.len() as IntCst);
        let dom = EnumeratedDom {
            bits,
            lb: self.env.make_int(lb),
            ub: self.env.make_int(ub),
            size,
            offset: lb,
        };
        self.doms.push(Dom::Enumerated(dom))
    }

    /// Creates a variable fixed to `value`; it never touches the trail.
    pub fn new_const(&mut self, value: IntCst) -> VarRef {
        self.doms.push(Dom::Constant(clamped(value)))
    }

    // =========== queries ===========

    pub fn num_variables(&self) -> usize {
        self.doms.len()
    }

    pub fn variables(&self) -> impl Iterator<Item = VarRef> {
        (0..self.doms.len()).map(VarRef::from)
    }

    pub fn kind(&self, var: VarRef) -> DomainKind {
        self.doms[var].kind()
    }

    pub fn has_enumerated_domain(&self, var: VarRef) -> bool {
        self.doms[var].kind() == DomainKind::Enumerated
    }

    pub fn lb(&self, var: VarRef) -> IntCst {
        self.doms[var].lb(&self.env)
    }

    pub fn ub(&self, var: VarRef) -> IntCst {
        self.doms[var].ub(&self.env)
    }

    pub fn bounds(&self, var: VarRef) -> (IntCst, IntCst) {
        (self.lb(var), self.ub(var))
    }

    pub fn size(&self, var: VarRef) -> u64 {
        self.doms[var].size(&self.env)
    }

    pub fn contains(&self, var: VarRef, value: IntCst) -> bool {
        self.doms[var].contains(&self.env, value)
    }

    pub fn is_instantiated(&self, var: VarRef) -> bool {
        self.doms[var].is_instantiated(&self.env)
    }

    /// The value of an instantiated variable.
    pub fn value(&self, var: VarRef) -> Option<IntCst> {
        let (lb, ub) = self.bounds(var);
        (lb == ub).then_some(lb)
    }

    /// Least domain value strictly greater than `value`, if any.
    pub fn next_value(&self, var: VarRef, value: IntCst) -> Option<IntCst> {
        self.doms[var].next_value(&self.env, value)
    }

    /// Greatest domain value strictly smaller than `value`, if any.
    pub fn previous_value(&self, var: VarRef, value: IntCst) -> Option<IntCst> {
        self.doms[var].previous_value(&self.env, value)
    }

    pub fn entails(&self, lit: Lit) -> bool {
        let (var, v) = (lit.variable(), lit.value());
        match lit.relation() {
            Rel::Leq => self.ub(var) <= v,
            Rel::Geq => self.lb(var) >= v,
            Rel::Eq => self.bounds(var) == (v, v),
            Rel::Neq => !self.contains(var, v),
        }
    }

    /// Three-valued truth of a literal in the current domains.
    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        if self.entails(lit) {
            Some(true)
        } else if self.entails(!lit) {
            Some(false)
        } else {
            None
        }
    }

    // =========== mutators ===========

    /// Applies a literal as a domain restriction.
    pub fn apply(&mut self, lit: Lit, cause: Cause, reason: Option<Reason>) -> Result<bool, Wipeout> {
        let (var, v) = (lit.variable(), lit.value());
        match lit.relation() {
            Rel::Leq => self.update_ub(var, v, cause, reason),
            Rel::Geq => self.update_lb(var, v, cause, reason),
            Rel::Eq => self.instantiate(var, v, cause, reason),
            Rel::Neq => self.remove_value(var, v, cause, reason),
        }
    }

    /// Tightens the lower bound of `var` to `new_lb`.
    ///
    ///  - `Ok(true)`: the bound was tightened.
    ///  - `Ok(false)`: no-op, `new_lb` is not stronger than the current bound.
    ///  - `Err(Wipeout)`: `new_lb` exceeds the upper bound; domain unchanged.
    pub fn update_lb(
        &mut self,
        var: VarRef,
        new_lb: IntCst,
        cause: Cause,
        reason: Option<Reason>,
    ) -> Result<bool, Wipeout> {
        let (lb, ub) = self.bounds(var);
        if new_lb <= lb {
            return Ok(false);
        }
        if new_lb > ub {
            return Err(self.wipeout(var, Lit::geq(var, new_lb), cause, reason));
        }
        let new_lb = match &self.doms[var] {
            Dom::Interval(d) => {
                let cell = d.lb;
                self.env.set_int(cell, new_lb);
                new_lb
            }
            Dom::Enumerated(d) => {
                let d = d.clone();
                // land on the next present value, then drop the bits below it
                let landed = d.next_present(&self.env, new_lb).expect("ub is a present bit");
                let removed = d.bits.remove_below(&mut self.env, d.bit_of(landed).unwrap());
                let size = self.env.get_int(d.size) - removed as IntCst;
                debug_assert!(size >= 1);
                self.env.set_int(d.size, size);
                self.env.set_int(d.lb, landed);
                landed
            }
            Dom::Constant(_) => unreachable!("constants never pass the bound checks"),
        };
        let mut mask = EventMask::INCLOW;
        if new_lb == ub {
            mask = EventMask::ALL;
        }
        self.emit(Event {
            var,
            mask,
            cause,
            removed: None,
            prev_lb: lb,
            new_lb,
            prev_ub: ub,
            new_ub: ub,
            reason: self.recorded(reason),
        });
        Ok(true)
    }

    /// Tightens the upper bound of `var` to `new_ub`. Same contract as
    /// [`DomainStore::update_lb`].
    pub fn update_ub(
        &mut self,
        var: VarRef,
        new_ub: IntCst,
        cause: Cause,
        reason: Option<Reason>,
    ) -> Result<bool, Wipeout> {
        let (lb, ub) = self.bounds(var);
        if new_ub >= ub {
            return Ok(false);
        }
        if new_ub < lb {
            return Err(self.wipeout(var, Lit::leq(var, new_ub), cause, reason));
        }
        let new_ub = match &self.doms[var] {
            Dom::Interval(d) => {
                let cell = d.ub;
                self.env.set_int(cell, new_ub);
                new_ub
            }
            Dom::Enumerated(d) => {
                let d = d.clone();
                let landed = d.prev_present(&self.env, new_ub).expect("lb is a present bit");
                let removed = d.bits.remove_above(&mut self.env, d.bit_of(landed).unwrap());
                let size = self.env.get_int(d.size) - removed as IntCst;
                debug_assert!(size >= 1);
                self.env.set_int(d.size, size);
                self.env.set_int(d.ub, landed);
                landed
            }
            Dom::Constant(_) => unreachable!("constants never pass the bound checks"),
        };
        let mut mask = EventMask::DECUPP;
        if new_ub == lb {
            mask = EventMask::ALL;
        }
        self.emit(Event {
            var,
            mask,
            cause,
            removed: None,
            prev_lb: lb,
            new_lb: lb,
            prev_ub: ub,
            new_ub,
            reason: self.recorded(reason),
        });
        Ok(true)
    }

    /// Removes `value` from the domain of `var`.
    ///
    /// On an interval variable, removing an interior value is a `false`
    /// no-op: holes are not representable. Callers that rely on hole-keeping
    /// must check [`DomainStore::has_enumerated_domain`].
    pub fn remove_value(
        &mut self,
        var: VarRef,
        value: IntCst,
        cause: Cause,
        reason: Option<Reason>,
    ) -> Result<bool, Wipeout> {
        if !self.contains(var, value) {
            return Ok(false);
        }
        let (lb, ub) = self.bounds(var);
        if lb == ub {
            // removing the last value
            return Err(self.wipeout(var, Lit::neq(var, value), cause, reason));
        }
        let mut mask = EventMask::REMOVE;
        let (mut new_lb, mut new_ub) = (lb, ub);
        match &self.doms[var] {
            Dom::Interval(d) => {
                let d = d.clone();
                if value == lb {
                    new_lb = lb + 1;
                    self.env.set_int(d.lb, new_lb);
                    mask |= EventMask::INCLOW;
                } else if value == ub {
                    new_ub = ub - 1;
                    self.env.set_int(d.ub, new_ub);
                    mask |= EventMask::DECUPP;
                } else {
                    // interior value of an interval: not representable
                    return Ok(false);
                }
            }
            Dom::Enumerated(d) => {
                let d = d.clone();
                d.bits.remove(&mut self.env, d.bit_of(value).unwrap());
                let size = self.env.get_int(d.size) - 1;
                debug_assert!(size >= 1);
                self.env.set_int(d.size, size);
                if value == lb {
                    new_lb = d.next_present(&self.env, lb + 1).expect("non-empty domain");
                    self.env.set_int(d.lb, new_lb);
                    mask |= EventMask::INCLOW;
                } else if value == ub {
                    new_ub = d.prev_present(&self.env, ub - 1).expect("non-empty domain");
                    self.env.set_int(d.ub, new_ub);
                    mask |= EventMask::DECUPP;
                }
            }
            Dom::Constant(_) => unreachable!("covered by the singleton check"),
        }
        if new_lb == new_ub {
            mask = EventMask::ALL;
        }
        self.emit(Event {
            var,
            mask,
            cause,
            removed: Some(value),
            prev_lb: lb,
            new_lb,
            prev_ub: ub,
            new_ub,
            reason: self.recorded(reason),
        });
        Ok(true)
    }

    /// Fixes `var` to `value`.
    pub fn instantiate(
        &mut self,
        var: VarRef,
        value: IntCst,
        cause: Cause,
        reason: Option<Reason>,
    ) -> Result<bool, Wipeout> {
        if !self.contains(var, value) {
            return Err(self.wipeout(var, Lit::eq(var, value), cause, reason));
        }
        let (lb, ub) = self.bounds(var);
        if lb == ub {
            return Ok(false);
        }
        match &self.doms[var] {
            Dom::Interval(d) => {
                let d = d.clone();
                self.env.set_int(d.lb, value);
                self.env.set_int(d.ub, value);
            }
            Dom::Enumerated(d) => {
                let d = d.clone();
                d.bits.retain_single(&mut self.env, d.bit_of(value).unwrap());
                self.env.set_int(d.size, 1);
                self.env.set_int(d.lb, value);
                self.env.set_int(d.ub, value);
            }
            Dom::Constant(_) => unreachable!("constants are always instantiated"),
        }
        self.emit(Event {
            var,
            mask: EventMask::ALL,
            cause,
            removed: None,
            prev_lb: lb,
            new_lb: value,
            prev_ub: ub,
            new_ub: value,
            reason: self.recorded(reason),
        });
        Ok(true)
    }

    fn wipeout(&self, var: VarRef, lit: Lit, cause: Cause, reason: Option<Reason>) -> Wipeout {
        Wipeout {
            var,
            lit,
            cause,
            reason: if self.explaining { reason } else { None },
        }
    }

    fn recorded(&self, reason: Option<Reason>) -> Option<Reason> {
        if self.explaining {
            reason
        } else {
            None
        }
    }

    fn emit(&mut self, event: Event) {
        tracing::trace!(?event, "domain update");
        let _ = self.events.push(event);
    }

    // =========== events & history ===========

    pub fn events(&self) -> &Log<Event> {
        &self.events
    }

    pub fn num_events(&self) -> usize {
        self.events.len()
    }

    /// Index of the event that made `lit` become true, or `None` if the
    /// literal held in the initial state.
    ///
    /// Linear scan of the live event log; fine at the scale of conflict
    /// analysis, where it is only invoked on reason literals.
    pub fn implying_event(&self, lit: Lit) -> Option<EventIdx> {
        debug_assert!(self.entails(lit));
        let entries = self.events.entries();
        for i in (0..entries.len()).rev() {
            if entries[i].makes_true(lit) {
                return Some(EventIdx::from(i));
            }
        }
        None
    }

    /// World in which `lit` became entailed.
    pub fn entailing_world(&self, lit: Lit) -> World {
        match self.implying_event(lit) {
            Some(idx) => self.events.world_of(idx),
            None => World::ROOT,
        }
    }

    // =========== delta monitors ===========

    /// Creates an independent cursor over the removal stream of `var`.
    ///
    /// The read position is a reversible cell: backtracking restores the
    /// consumer's view.
    pub fn delta_monitor(&mut self, var: VarRef) -> DeltaMonitor {
        self.monitors += 1;
        let pos = self.env.make_int(self.events.len() as IntCst);
        DeltaMonitor::new(var, pos)
    }

    /// Releases a monitor, making world commits legal again once all
    /// monitors are released.
    pub fn release_monitor(&mut self, _monitor: DeltaMonitor) {
        debug_assert!(self.monitors > 0);
        self.monitors -= 1;
    }

    pub(crate) fn monitor_read(&mut self, monitor: &DeltaMonitor) -> Option<crate::core::state::DeltaEntry> {
        monitor.read(&mut self.env, &self.events)
    }

    // =========== environment access ===========

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Env {
        &mut self.env
    }

    /// Merges the current world into its parent.
    ///
    /// Refused while delta monitors are registered: the interaction between a
    /// commit and in-flight monitors is deliberately unsupported.
    pub fn commit_world(&mut self) {
        assert!(self.monitors == 0, "commit_world with live delta monitors");
        self.env.commit_world();
        self.events.commit_world();
    }
}

impl Backtrack for DomainStore {
    fn push_world(&mut self) -> World {
        self.env.push_world();
        self.events.push_world()
    }

    fn num_worlds(&self) -> u32 {
        debug_assert_eq!(self.env.num_worlds(), self.events.num_worlds());
        self.events.num_worlds()
    }

    fn pop_world(&mut self) {
        self.env.pop_world();
        self.events.pop_world();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_updates_and_events() {
        let mut store = DomainStore::new();
        let a = store.new_interval_var(0, 10);

        assert_eq!(store.update_lb(a, -1, Cause::Decision, None), Ok(false));
        assert_eq!(store.update_lb(a, 0, Cause::Decision, None), Ok(false));
        assert_eq!(store.num_events(), 0);

        assert_eq!(store.update_lb(a, 1, Cause::Decision, None), Ok(true));
        assert_eq!(store.num_events(), 1);
        assert_eq!(store.events().entries()[0].mask, EventMask::INCLOW);

        assert_eq!(store.update_ub(a, 9, Cause::Decision, None), Ok(true));
        assert_eq!(store.bounds(a), (1, 9));

        assert!(store.update_lb(a, 10, Cause::Decision, None).is_err());
        assert_eq!(store.bounds(a), (1, 9));
    }

    #[test]
    fn interval_hole_removal_is_a_noop() {
        let mut store = DomainStore::new();
        let a = store.new_interval_var(0, 10);
        assert!(!store.has_enumerated_domain(a));
        assert_eq!(store.remove_value(a, 5, Cause::Decision, None), Ok(false));
        assert_eq!(store.num_events(), 0);
        // removals at the bounds are representable and promoted
        assert_eq!(store.remove_value(a, 0, Cause::Decision, None), Ok(true));
        assert_eq!(store.lb(a), 1);
        let e = &store.events().entries()[0];
        assert!(e.mask.contains(EventMask::INCLOW));
        assert!(e.mask.contains(EventMask::REMOVE));
    }

    #[test]
    fn enumerated_holes_and_iteration() {
        let mut store = DomainStore::new();
        let a = store.new_enum_var([1, 3, 5, 9]);
        assert_eq!(store.bounds(a), (1, 9));
        assert_eq!(store.size(a), 4);
        assert!(store.contains(a, 3));
        assert!(!store.contains(a, 4));
        assert_eq!(store.next_value(a, 1), Some(3));
        assert_eq!(store.next_value(a, 9), None);
        assert_eq!(store.previous_value(a, 9), Some(5));
        assert_eq!(store.previous_value(a, 1), None);

        assert_eq!(store.remove_value(a, 3, Cause::Decision, None), Ok(true));
        assert_eq!(store.size(a), 3);
        assert_eq!(store.next_value(a, 1), Some(5));
    }

    #[test]
    fn bound_removal_promotion_on_enumerated() {
        let mut store = DomainStore::new();
        let a = store.new_enum_var([1, 3, 5]);
        // removing the lb lands on the next present value
        assert_eq!(store.remove_value(a, 1, Cause::Decision, None), Ok(true));
        assert_eq!(store.lb(a), 3);
        let e = store.events().entries().last().unwrap();
        assert!(e.mask.contains(EventMask::INCLOW));
        assert_eq!(e.removed, Some(1));
        // removing one of two remaining values instantiates
        assert_eq!(store.remove_value(a, 5, Cause::Decision, None), Ok(true));
        let e = store.events().entries().last().unwrap();
        assert_eq!(e.mask, EventMask::ALL);
        assert!(store.is_instantiated(a));
        // removing the last value wipes out and leaves the domain observable
        assert!(store.remove_value(a, 3, Cause::Decision, None).is_err());
        assert_eq!(store.value(a), Some(3));
    }

    #[test]
    fn enumerated_bound_update_lands_on_present_value() {
        let mut store = DomainStore::new();
        let a = store.new_enum_var([0, 2, 7, 8]);
        assert_eq!(store.update_lb(a, 3, Cause::Decision, None), Ok(true));
        assert_eq!(store.lb(a), 7);
        assert_eq!(store.size(a), 2);
        assert_eq!(store.update_ub(a, 7, Cause::Decision, None), Ok(true));
        assert!(store.is_instantiated(a));
        assert_eq!(store.value(a), Some(7));
    }

    #[test]
    fn constants_never_trail() {
        let mut store = DomainStore::new();
        let c = store.new_const(4);
        assert!(store.is_instantiated(c));
        assert_eq!(store.remove_value(c, 3, Cause::Decision, None), Ok(false));
        assert!(store.remove_value(c, 4, Cause::Decision, None).is_err());
        assert_eq!(store.instantiate(c, 4, Cause::Decision, None), Ok(false));
        assert_eq!(store.num_events(), 0);
    }

    #[test]
    fn backtracking_restores_domains() {
        let mut store = DomainStore::new();
        let a = store.new_enum_var([1, 2, 3, 4, 5]);
        let b = store.new_interval_var(0, 9);

        store.push_world();
        store.remove_value(a, 3, Cause::Decision, None).unwrap();
        store.update_ub(b, 4, Cause::Decision, None).unwrap();
        store.push_world();
        store.instantiate(a, 5, Cause::Decision, None).unwrap();
        assert_eq!(store.value(a), Some(5));

        store.pop_world();
        assert_eq!(store.bounds(a), (1, 5));
        assert_eq!(store.size(a), 4);
        assert!(!store.contains(a, 3));

        store.pop_world();
        assert_eq!(store.size(a), 5);
        assert!(store.contains(a, 3));
        assert_eq!(store.bounds(b), (0, 9));
        assert_eq!(store.num_events(), 0);
    }

    #[test]
    fn monotone_within_world() {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};

        let mut rng = SmallRng::seed_from_u64(7);
        let mut store = DomainStore::new();
        let vars = [
            store.new_interval_var(-20, 20),
            store.new_enum_var(-10..=10),
            store.new_enum_var([-3, 0, 2, 8, 13]),
        ];
        store.push_world();
        for _ in 0..500 {
            let var = vars[rng.random_range(0..vars.len())];
            let (lb, ub) = store.bounds(var);
            let size = store.size(var);
            let v = rng.random_range(-25..25);
            let res = match rng.random_range(0..4) {
                0 => store.update_lb(var, v, Cause::Decision, None),
                1 => store.update_ub(var, v, Cause::Decision, None),
                2 => store.remove_value(var, v, Cause::Decision, None),
                _ => store.instantiate(var, v, Cause::Decision, None),
            };
            let (lb2, ub2) = store.bounds(var);
            let size2 = store.size(var);
            assert!(lb2 >= lb && ub2 <= ub && size2 <= size);
            if res == Ok(false) {
                assert!((lb2, ub2, size2) == (lb, ub, size));
            }
        }
    }

    #[test]
    fn no_op_mutators_emit_nothing() {
        let mut store = DomainStore::new();
        let a = store.new_enum_var([1, 2, 4]);
        let before = store.num_events();
        assert_eq!(store.update_lb(a, 0, Cause::Decision, None), Ok(false));
        assert_eq!(store.update_ub(a, 9, Cause::Decision, None), Ok(false));
        assert_eq!(store.remove_value(a, 3, Cause::Decision, None), Ok(false));
        assert_eq!(store.num_events(), before);
    }

    #[test]
    fn implying_events() {
        let mut store = DomainStore::new();
        let a = store.new_interval_var(0, 10);
        store.push_world();
        store.update_lb(a, 3, Cause::Decision, None).unwrap();
        store.push_world();
        store.update_lb(a, 6, Cause::Decision, None).unwrap();

        let w = |lit| store.entailing_world(lit);
        assert_eq!(w(Lit::geq(a, 2)), World::new(1));
        assert_eq!(w(Lit::geq(a, 3)), World::new(1));
        assert_eq!(w(Lit::geq(a, 4)), World::new(2));
        assert_eq!(w(Lit::geq(a, 0)), World::ROOT);
    }
}
