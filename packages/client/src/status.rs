//! Transient status line shown under the auth forms.
//!
//! Every update bumps a generation counter. Loading entries hand out a
//! [`StatusTicket`] for that generation; an expiry only clears the line when
//! the ticket still matches, so two identical loading texts never cancel
//! each other.

/// Severity of a status entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Loading,
    Success,
    Error,
}

/// Identity of one loading entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTicket(u64);

#[derive(Debug, Default)]
pub struct StatusLine {
    generation: u64,
    current: Option<(String, StatusKind)>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the status text.
    ///
    /// Returns a ticket for loading entries, which expire on their own.
    pub fn set(&mut self, text: impl Into<String>, kind: StatusKind) -> Option<StatusTicket> {
        self.generation += 1;
        self.current = Some((text.into(), kind));
        (kind == StatusKind::Loading).then_some(StatusTicket(self.generation))
    }

    /// Clear unconditionally, e.g. when the auth view is rebuilt
    pub fn reset(&mut self) {
        self.generation += 1;
        self.current = None;
    }

    /// Clear only if nothing replaced the entry the ticket was issued for.
    ///
    /// Returns `true` when the line was cleared.
    pub fn expire(&mut self, ticket: StatusTicket) -> bool {
        if ticket.0 == self.generation && self.current.is_some() {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<(&str, StatusKind)> {
        self.current.as_ref().map(|(text, kind)| (text.as_str(), *kind))
    }
}
