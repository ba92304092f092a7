use std::collections::VecDeque;
use std::time::Duration;

use tracing::{debug, info};

use crate::device::{DeviceError, KeystrokeSink, Point, PointerSource};

/// Where a typing session currently is
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum TypingState {
    Idle,
    Waiting,
    Typing,
    Cancelled,
    Completed,
}

impl TypingState {
    /// Cancelled and Completed both reset to Idle on the next tick
    pub fn is_terminal(&self) -> bool {
        matches!(self, TypingState::Cancelled | TypingState::Completed)
    }
}

/// What a single tick did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickEvent {
    Idle,
    CountingDown { remaining: Duration },
    Started,
    PointerSampled,
    Interrupted,
    Typed(char),
    Finished,
    Reset,
}

/// The in-flight typing task
#[derive(Debug, Clone)]
pub struct Session {
    pub buffer: VecDeque<char>,
    pub delay: Duration,
    pub interval: Duration,
    pub countdown: Duration,
    pub last_pointer: Option<Point>,
    pub state: TypingState,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            buffer: VecDeque::new(),
            delay: Duration::ZERO,
            interval: Duration::ZERO,
            countdown: Duration::ZERO,
            last_pointer: None,
            state: TypingState::Idle,
        }
    }
}

/// Tick-driven typing state machine.
///
/// One char is emitted per tick while typing. If the pointer moves between
/// ticks the session drops back to waiting and the countdown restarts from the
/// full delay, keeping whatever text is left.
pub struct TypingController<K: KeystrokeSink, P: PointerSource> {
    keyboard: K,
    pointer: P,
    session: Session,
}

impl<K: KeystrokeSink, P: PointerSource> TypingController<K, P> {
    pub fn new(keyboard: K, pointer: P) -> Self {
        Self {
            keyboard,
            pointer,
            session: Session::default(),
        }
    }

    /// Begin a new session, replacing any active one. Empty text is ignored.
    pub fn start(&mut self, text: &str, delay: Duration, interval: Duration) -> bool {
        if text.is_empty() {
            debug!("ignoring start with empty text");
            return false;
        }

        self.session = Session {
            buffer: text.chars().collect(),
            delay,
            interval,
            countdown: delay,
            last_pointer: None,
            state: TypingState::Waiting,
        };
        info!(
            chars = self.session.buffer.len(),
            delay_ms = delay.as_millis() as u64,
            interval_ms = interval.as_millis() as u64,
            "typing session started"
        );
        true
    }

    pub fn cancel(&mut self) {
        info!(state = %self.session.state, "typing session cancelled");
        self.session.state = TypingState::Cancelled;
    }

    pub fn tick(&mut self, elapsed: Duration) -> Result<TickEvent, DeviceError> {
        if self.session.state.is_terminal() {
            self.session.state = TypingState::Idle;
            self.session.last_pointer = None;
            self.session.countdown = Duration::ZERO;
            return Ok(TickEvent::Reset);
        }

        match self.session.state {
            TypingState::Waiting => self.tick_waiting(elapsed),
            TypingState::Typing => self.tick_typing(),
            _ => Ok(TickEvent::Idle),
        }
    }

    fn tick_waiting(&mut self, elapsed: Duration) -> Result<TickEvent, DeviceError> {
        self.session.countdown = self.session.countdown.saturating_sub(elapsed);
        if !self.session.countdown.is_zero() {
            return Ok(TickEvent::CountingDown {
                remaining: self.session.countdown,
            });
        }

        self.session.last_pointer = Some(self.pointer.position()?);
        self.session.state = TypingState::Typing;
        debug!(pointer = ?self.session.last_pointer, "countdown elapsed, typing");
        Ok(TickEvent::Started)
    }

    fn tick_typing(&mut self) -> Result<TickEvent, DeviceError> {
        let current = self.pointer.position()?;

        let Some(last) = self.session.last_pointer else {
            self.session.last_pointer = Some(current);
            return Ok(TickEvent::PointerSampled);
        };

        if current != last {
            info!(from = ?last, to = ?current, "pointer moved, pausing");
            self.session.last_pointer = Some(current);
            self.session.countdown = self.session.delay;
            self.session.state = TypingState::Waiting;
            return Ok(TickEvent::Interrupted);
        }

        match self.session.buffer.front().copied() {
            Some(c) => {
                // pop only after the keystroke went out so a failed char is retried
                self.keyboard.type_char(c)?;
                self.session.buffer.pop_front();
                Ok(TickEvent::Typed(c))
            }
            None => {
                info!("typing session completed");
                self.session.state = TypingState::Completed;
                Ok(TickEvent::Finished)
            }
        }
    }

    pub fn state(&self) -> TypingState {
        self.session.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn countdown(&self) -> Duration {
        self.session.countdown
    }

    /// Cadence the scheduler should tick at for the current session
    pub fn interval(&self) -> Duration {
        self.session.interval
    }

    /// Waiting or Typing
    pub fn is_active(&self) -> bool {
        matches!(
            self.session.state,
            TypingState::Waiting | TypingState::Typing
        )
    }

    pub fn remaining(&self) -> String {
        self.session.buffer.iter().collect()
    }

    pub fn take_remaining(&mut self) -> String {
        self.session.buffer.drain(..).collect()
    }

    pub fn keyboard(&self) -> &K {
        &self.keyboard
    }

    pub fn pointer(&self) -> &P {
        &self.pointer
    }
}
