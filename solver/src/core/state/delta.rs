use crate::backtrack::{Env, Log, RevInt};
use crate::core::state::{Cause, Event};
use crate::core::{IntCst, VarRef};

/// One element of a variable's removal stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeltaChange {
    /// A single value left the domain.
    Removed(IntCst),
    /// A bound update shrank the domain; the removed values are the two
    /// (possibly empty) ranges between the previous and new bounds.
    Bounds {
        prev_lb: IntCst,
        new_lb: IntCst,
        prev_ub: IntCst,
        new_ub: IntCst,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DeltaEntry {
    pub change: DeltaChange,
    pub cause: Cause,
}

/// An independent cursor over the removal stream of one variable.
///
/// The read position is a reversible integer: popping a world restores the
/// consumer's view, and entries recorded in abandoned branches are never
/// observed (the event log is truncated below the read position on
/// backtrack).
pub struct DeltaMonitor {
    var: VarRef,
    pos: RevInt,
}

impl DeltaMonitor {
    pub(crate) fn new(var: VarRef, pos: RevInt) -> DeltaMonitor {
        DeltaMonitor { var, pos }
    }

    pub fn var(&self) -> VarRef {
        self.var
    }

    /// Next unread removal of the monitored variable, advancing the cursor.
    pub(crate) fn read(&self, env: &mut Env, events: &Log<Event>) -> Option<DeltaEntry> {
        let mut pos = env.get_int(self.pos) as usize;
        // the position may point past the end after a backtrack
        pos = pos.min(events.len());
        let entries = events.entries();
        let mut found = None;
        while pos < entries.len() {
            let ev = &entries[pos];
            pos += 1;
            if ev.var == self.var {
                let change = match ev.removed {
                    Some(v) => DeltaChange::Removed(v),
                    None => DeltaChange::Bounds {
                        prev_lb: ev.prev_lb,
                        new_lb: ev.new_lb,
                        prev_ub: ev.prev_ub,
                        new_ub: ev.new_ub,
                    },
                };
                found = Some(DeltaEntry { change, cause: ev.cause });
                break;
            }
        }
        env.set_int(self.pos, pos as IntCst);
        found
    }
}
