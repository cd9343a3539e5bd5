/*
[INPUT]:  Begin/apply pairs of operations that await a collaborator
[OUTPUT]: Tickets that tell whether a late result still targets current state
[POS]:    Core support - stale-response guard
[UPDATE]: When another suspendable operation needs guarding
*/

/// Identifies one outstanding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Monotonic request counter. Only the most recently issued ticket is
/// current, and `invalidate` retires it without issuing a new one.
#[derive(Debug, Clone, Default)]
pub struct RequestSequence {
    latest: u64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> RequestTicket {
        self.latest += 1;
        RequestTicket(self.latest)
    }

    pub fn invalidate(&mut self) {
        self.latest += 1;
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_ticket_wins() {
        let mut sequence = RequestSequence::new();
        let first = sequence.issue();
        assert!(sequence.is_current(first));

        let second = sequence.issue();
        assert!(!sequence.is_current(first));
        assert!(sequence.is_current(second));
        assert!(second.value() > first.value());
    }

    #[test]
    fn invalidate_retires_outstanding_ticket() {
        let mut sequence = RequestSequence::new();
        let ticket = sequence.issue();
        sequence.invalidate();
        assert!(!sequence.is_current(ticket));

        let next = sequence.issue();
        assert!(sequence.is_current(next));
    }
}
