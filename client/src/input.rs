//! Client intent state with change detection

use shared::IntentFlags;

/// Movement intent the client reports to the server
///
/// Key handlers call [`IntentState::start_move`] and [`IntentState::stop_move`]
/// as keys go down and up. The network layer only sends a `Client` command
/// when something changed since the last send.
#[derive(Debug, Default)]
pub struct IntentState {
    current: IntentFlags,
    changed: bool,
}

impl IntentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets every flag that is set in `flags`
    pub fn start_move(&mut self, flags: IntentFlags) {
        self.apply(flags, true);
    }

    /// Clears every flag that is set in `flags`
    pub fn stop_move(&mut self, flags: IntentFlags) {
        self.apply(flags, false);
    }

    fn apply(&mut self, flags: IntentFlags, value: bool) {
        if !flags.any() {
            return;
        }
        if flags.forward {
            self.current.forward = value;
        }
        if flags.backward {
            self.current.backward = value;
        }
        if flags.rotate_cw {
            self.current.rotate_cw = value;
        }
        if flags.rotate_ccw {
            self.current.rotate_ccw = value;
        }
        self.changed = true;
    }

    pub fn flags(&self) -> IntentFlags {
        self.current
    }

    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Returns the flags if they changed since the last call, clearing the marker
    pub fn take_changed(&mut self) -> Option<IntentFlags> {
        if self.changed {
            self.changed = false;
            Some(self.current)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_state_creation() {
        let intent = IntentState::new();
        assert_eq!(intent.flags(), IntentFlags::default());
        assert!(!intent.changed());
    }

    #[test]
    fn test_start_and_stop_move() {
        let mut intent = IntentState::new();
        intent.start_move(IntentFlags::FORWARD);
        intent.start_move(IntentFlags::ROTATE_CW);

        let flags = intent.flags();
        assert!(flags.forward && flags.rotate_cw);
        assert!(!flags.backward && !flags.rotate_ccw);

        intent.stop_move(IntentFlags::FORWARD);
        assert!(!intent.flags().forward);
        assert!(intent.flags().rotate_cw);
    }

    #[test]
    fn test_take_changed_clears_marker() {
        let mut intent = IntentState::new();
        assert_eq!(intent.take_changed(), None);

        intent.start_move(IntentFlags::BACKWARD);
        assert_eq!(intent.take_changed(), Some(IntentFlags::BACKWARD));
        assert_eq!(intent.take_changed(), None);

        intent.stop_move(IntentFlags::BACKWARD);
        assert_eq!(intent.take_changed(), Some(IntentFlags::default()));
    }

    #[test]
    fn test_empty_flags_do_not_mark_changed() {
        let mut intent = IntentState::new();
        intent.start_move(IntentFlags::default());
        intent.stop_move(IntentFlags::default());
        assert!(!intent.changed());
    }
}
