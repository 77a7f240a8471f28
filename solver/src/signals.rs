use crate::search::Solution;
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cooperatively polled stop signal.
///
/// Raised by limits or by an external interrupt; polled at node boundaries
/// and before every propagator dispatch. Raising is sticky.
#[derive(Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> StopFlag {
        StopFlag::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn lower(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Signals that can be sent to a running solver.
pub enum InputSignal {
    /// The solver should stop as soon as possible and return its best-known
    /// result.
    Interrupt,
}

/// Handle given to whoever wants to talk to a solver.
#[derive(Clone)]
pub struct InputStream {
    pub sender: Sender<InputSignal>,
}

impl InputStream {
    pub fn interrupt(&self) {
        // ignore the error: a finished solver is as interrupted as it gets
        let _ = self.sender.send(InputSignal::Interrupt);
    }
}

/// The communication endpoints owned by a solver: an input channel for
/// interrupts and an optional sink to which solutions are streamed as they
/// are found.
pub struct Synchro {
    pub sender: Sender<InputSignal>,
    pub signals: Receiver<InputSignal>,
    pub solution_sink: Option<Sender<Arc<Solution>>>,
}

impl Synchro {
    pub fn new() -> Synchro {
        let (sender, signals) = crossbeam_channel::unbounded();
        Synchro {
            sender,
            signals,
            solution_sink: None,
        }
    }

    pub fn input_stream(&self) -> InputStream {
        InputStream {
            sender: self.sender.clone(),
        }
    }

    pub fn set_solution_sink(&mut self, sink: Sender<Arc<Solution>>) {
        self.solution_sink = Some(sink);
    }

    pub fn notify_solution(&self, solution: &Arc<Solution>) {
        if let Some(sink) = &self.solution_sink {
            let _ = sink.send(solution.clone());
        }
    }
}

impl Default for Synchro {
    fn default() -> Self {
        Self::new()
    }
}
