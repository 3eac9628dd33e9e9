// Key command dispatcher - Maps raw key input to operator commands

use std::time::Duration;

use tracing::trace;

use crate::domain::model::{Command, Key};
use crate::domain::rules::Keymap;
use crate::error::TrimResult;
use crate::ports::KeyInput;

/// Polls an input backend and yields at most one command per poll.
///
/// After the first key arrives, every key already pending is drained; the
/// most recent mapped key wins and earlier ones are dropped, so input never
/// queues up across ticks.
pub struct KeyCommandDispatcher<I: KeyInput> {
    input: I,
    keymap: Keymap,
}

impl<I: KeyInput> KeyCommandDispatcher<I> {
    /// Create a dispatcher with the default key bindings
    pub fn new(input: I) -> Self {
        Self::with_keymap(input, Keymap::default())
    }

    /// Create a dispatcher with custom key bindings
    pub fn with_keymap(input: I, keymap: Keymap) -> Self {
        Self { input, keymap }
    }

    /// Wait up to `timeout` (forever when `None`) for the next command.
    /// Unmapped input and an elapsed timeout both yield `Ok(None)`.
    pub fn poll(&mut self, timeout: Option<Duration>) -> TrimResult<Option<Command>> {
        let Some(first) = self.input.wait_key(timeout)? else {
            return Ok(None);
        };

        let mut command = self.keymap.command_for(first);
        while let Some(key) = self.input.pending_key()? {
            match self.keymap.command_for(key) {
                Some(next) => {
                    if let Some(dropped) = command.replace(next) {
                        trace!("Dropping buffered command: {}", dropped);
                    }
                }
                None => trace!("Ignoring unmapped key: {:?}", key),
            }
        }

        Ok(command)
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// Take back the input backend
    pub fn into_inner(self) -> I {
        self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Keys arrive in batches; each `wait_key` releases the next batch
    struct ScriptedInput {
        batches: VecDeque<Vec<Key>>,
        pending: VecDeque<Key>,
        waits: Vec<Option<Duration>>,
    }

    impl ScriptedInput {
        fn new(batches: Vec<Vec<Key>>) -> Self {
            Self {
                batches: batches.into(),
                pending: VecDeque::new(),
                waits: Vec::new(),
            }
        }
    }

    impl KeyInput for ScriptedInput {
        fn wait_key(&mut self, timeout: Option<Duration>) -> TrimResult<Option<Key>> {
            self.waits.push(timeout);
            if let Some(batch) = self.batches.pop_front() {
                self.pending.extend(batch);
            }
            Ok(self.pending.pop_front())
        }

        fn pending_key(&mut self) -> TrimResult<Option<Key>> {
            Ok(self.pending.pop_front())
        }
    }

    #[test]
    fn test_single_key_maps_to_command() {
        let mut dispatcher = KeyCommandDispatcher::new(ScriptedInput::new(vec![vec![Key::Char('s')]]));
        assert_eq!(dispatcher.poll(Some(Duration::from_millis(33))).unwrap(), Some(Command::StartSegment));
    }

    #[test]
    fn test_timeout_yields_none() {
        let mut dispatcher = KeyCommandDispatcher::new(ScriptedInput::new(vec![vec![]]));
        assert_eq!(dispatcher.poll(Some(Duration::from_millis(1))).unwrap(), None);
    }

    #[test]
    fn test_unmapped_key_yields_none() {
        let mut dispatcher = KeyCommandDispatcher::new(ScriptedInput::new(vec![vec![Key::Char('z')]]));
        assert_eq!(dispatcher.poll(None).unwrap(), None);
    }

    #[test]
    fn test_most_recent_pending_key_wins() {
        let input = ScriptedInput::new(vec![vec![Key::Char('s'), Key::Char('f'), Key::Char('e')], vec![]]);
        let mut dispatcher = KeyCommandDispatcher::new(input);

        assert_eq!(dispatcher.poll(None).unwrap(), Some(Command::EndSegment));
        // Nothing carried over into the next tick
        assert_eq!(dispatcher.poll(Some(Duration::from_millis(5))).unwrap(), None);
    }

    #[test]
    fn test_trailing_unmapped_key_keeps_last_command() {
        let input = ScriptedInput::new(vec![vec![Key::Space, Key::Other]]);
        let mut dispatcher = KeyCommandDispatcher::new(input);
        assert_eq!(dispatcher.poll(None).unwrap(), Some(Command::TogglePause));
    }

    #[test]
    fn test_timeout_is_forwarded() {
        let mut dispatcher = KeyCommandDispatcher::new(ScriptedInput::new(vec![vec![], vec![]]));
        dispatcher.poll(Some(Duration::from_millis(40))).unwrap();
        dispatcher.poll(None).unwrap();

        let input = dispatcher.into_inner();
        assert_eq!(input.waits, vec![Some(Duration::from_millis(40)), None]);
    }
}
