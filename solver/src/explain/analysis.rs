use crate::backtrack::{EventIdx, WorldClass};
use crate::core::state::{Cause, Contradiction, DomainStore};
use crate::core::Lit;
use hashbrown::HashSet;
use std::collections::BinaryHeap;

/// A learned clause: a disjunction of literals of which at least one must be
/// true to avoid a previously seen conflict.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clause {
    lits: Vec<Lit>,
}

impl Clause {
    pub fn new(lits: Vec<Lit>) -> Clause {
        let mut seen = HashSet::with_capacity(lits.len());
        let lits = lits.into_iter().filter(|&l| seen.insert(l)).collect();
        Clause { lits }
    }

    pub fn literals(&self) -> &[Lit] {
        &self.lits
    }

    pub fn len(&self) -> usize {
        self.lits.len()
    }

    /// The empty clause: unavoidable conflict, the problem is infeasible.
    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }
}

/// The clause-learning sub-solver, as seen by the search loop.
///
/// Given a contradiction raised in the current world, derives a clause that
/// is a logical consequence of the posted constraints and excludes the
/// conflict. Returning `None` means no clause could be derived (typically a
/// propagator did not supply reasons); search then falls back to plain
/// chronological backtracking.
pub trait ConflictAnalyzer {
    fn analyze(&mut self, contradiction: &Contradiction, store: &DomainStore) -> Option<Clause>;
}

/// First-unique-implication-point resolution over the event log.
///
/// Starting from the literals entailing the conflict, repeatedly replaces the
/// latest literal of the current world by the reason of the event that made
/// it true, until a single current-world literal remains. Literals entailed
/// in earlier worlds go to the clause negated; root facts are dropped.
#[derive(Default)]
pub struct FirstUip;

/// A literal in the resolution queue, keyed by its implying event. The heap
/// serves the latest event first.
#[derive(Copy, Clone)]
struct InQueueLit {
    idx: EventIdx,
    lit: Lit,
}

impl PartialEq for InQueueLit {
    fn eq(&self, other: &Self) -> bool {
        self.idx == other.idx
    }
}
impl Eq for InQueueLit {}
impl Ord for InQueueLit {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.idx.cmp(&other.idx)
    }
}
impl PartialOrd for InQueueLit {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl ConflictAnalyzer for FirstUip {
    fn analyze(&mut self, contradiction: &Contradiction, store: &DomainStore) -> Option<Clause> {
        // literals entailed in the current state that jointly produce the conflict
        let mut pending: Vec<Lit> = Vec::new();
        match contradiction {
            Contradiction::Wipeout(w) => {
                match (&w.reason, w.cause) {
                    (Some(reason), _) => pending.extend(reason.literals().iter().copied()),
                    // a failed decision is an arbitrary choice, not a
                    // constraint consequence: nothing to learn
                    (None, Cause::Decision) => return None,
                    // the cut (and root postings) hold for the remainder of
                    // the search and need no antecedent
                    (None, Cause::Root | Cause::Cut) => {}
                    // an unexplained inference cannot be resolved away
                    (None, Cause::Inference(_)) => return None,
                }
                // the rejected literal's negation holds and participates
                pending.push(!w.lit);
            }
            Contradiction::Failure(reason) => {
                pending.extend(reason.literals().iter().copied());
            }
        }

        let mut clause: Vec<Lit> = Vec::new();
        let mut queue: BinaryHeap<InQueueLit> = BinaryHeap::new();
        let mut resolved: HashSet<EventIdx> = HashSet::new();

        loop {
            for lit in pending.drain(..) {
                debug_assert!(store.entails(lit), "reason literal {lit:?} is not entailed");
                match store.implying_event(lit) {
                    // entailed in the initial state: always true, drop
                    None => {}
                    Some(idx) => match store.events().world_class(idx) {
                        WorldClass::Root => {}
                        WorldClass::Intermediate => clause.push(!lit),
                        WorldClass::Current => queue.push(InQueueLit { idx, lit }),
                    },
                }
            }

            // drop queue entries whose event was already resolved away
            let top = loop {
                match queue.pop() {
                    Some(entry) if resolved.contains(&entry.idx) => {}
                    other => break other,
                }
            };
            let Some(InQueueLit { idx, mut lit }) = top else {
                // every remaining literal lies below the current world; this
                // is the empty clause when the conflict arose at the root
                return Some(Clause::new(clause));
            };
            // several queued literals may be entailed by the same event;
            // collapse them, keeping the strongest
            while let Some(&next) = queue.peek() {
                if next.idx == idx {
                    let _ = queue.pop();
                    if next.lit.entails(lit) {
                        lit = next.lit;
                    }
                } else if resolved.contains(&next.idx) {
                    let _ = queue.pop();
                } else {
                    break;
                }
            }

            if queue.is_empty() {
                // first UIP reached
                clause.push(!lit);
                return Some(Clause::new(clause));
            }

            // replace the literal by the reason of its implying event
            resolved.insert(idx);
            let event = store.events().get(idx);
            match (event.cause, &event.reason) {
                (Cause::Decision, _) => {
                    // a decision is the first event of its world and thus the
                    // last one popped; reaching it with company is a bug
                    debug_assert!(false, "resolving past a decision");
                    return None;
                }
                // the cut is valid for the remainder of the search: no antecedent
                (Cause::Cut, _) => {}
                (Cause::Root, _) => {}
                (Cause::Inference(_), Some(reason)) => {
                    pending.extend(reason.literals().iter().copied());
                }
                (Cause::Inference(_), None) => return None,
            }
        }
    }
}
