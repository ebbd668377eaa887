//! Observable events of a run, in the order they happened

use std::fmt;

/// One observable effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Value written by `out`
    Output(i64),
    /// Live-object count right after an allocation or reclamation
    Gc { live: usize },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Output(n) => write!(f, "{n}"),
            Event::Gc { live } => write!(f, "gc:{live}"),
        }
    }
}

/// Ordered event log shared by the memory store and the interpreter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    events: Vec<Event>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Only the values written by `out`
    pub fn outputs(&self) -> Vec<i64> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Output(n) => Some(*n),
                Event::Gc { .. } => None,
            })
            .collect()
    }

    /// Only the live counts from gc events
    pub fn gc_counts(&self) -> Vec<usize> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Gc { live } => Some(*live),
                Event::Output(_) => None,
            })
            .collect()
    }

    /// One event per line, optionally hiding gc events
    pub fn render(&self, show_gc: bool) -> String {
        self.events
            .iter()
            .filter(|event| show_gc || matches!(event, Event::Output(_)))
            .map(|event| format!("{event}\n"))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl fmt::Display for Transcript {
    /// Space-separated, as used in compact test expectations
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, event) in self.events.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{event}")?;
        }
        Ok(())
    }
}
