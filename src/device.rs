//! Synthetic keyboard and pointer access.
//!
//! The controller only talks to the two traits here. `enigo` backs them in the
//! binary; the recording/scripted types back them in tests and headless runs.

use std::cell::Cell;
use std::thread;
use std::time::Duration;

use enigo::{Enigo, Keyboard, Mouse, Settings};
use thiserror::Error;
use tracing::debug;

use crate::batch;

/// Screen coordinates of the pointer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("could not connect to the input subsystem: {0}")]
    Connect(String),
    #[error("failed to emit keystroke for {character:?}: {reason}")]
    Emit { character: char, reason: String },
    #[error("failed to read pointer position: {0}")]
    Pointer(String),
}

/// Accepts synthetic keystrokes and delivers them to the focused window
pub trait KeystrokeSink {
    fn type_char(&mut self, c: char) -> Result<(), DeviceError>;

    /// Type `text` one char at a time, sleeping `interval` between chars.
    fn type_text(&mut self, text: &str, interval: Duration) -> Result<(), DeviceError>
    where
        Self: Sized,
    {
        batch::type_text(self, text, interval, thread::sleep).map(|_| ())
    }
}

/// Reports where the on-screen pointer currently is
pub trait PointerSource {
    fn position(&self) -> Result<Point, DeviceError>;
}

fn connect() -> Result<Enigo, DeviceError> {
    Enigo::new(&Settings::default()).map_err(|e| DeviceError::Connect(e.to_string()))
}

/// Keyboard sink backed by enigo
pub struct EnigoKeyboard {
    enigo: Enigo,
}

impl EnigoKeyboard {
    pub fn connect() -> Result<Self, DeviceError> {
        Ok(Self { enigo: connect()? })
    }
}

impl KeystrokeSink for EnigoKeyboard {
    fn type_char(&mut self, c: char) -> Result<(), DeviceError> {
        let mut buf = [0u8; 4];
        // text() handles unicode and newlines more reliably than key()
        self.enigo
            .text(c.encode_utf8(&mut buf))
            .map_err(|e| DeviceError::Emit {
                character: c,
                reason: e.to_string(),
            })
    }
}

/// Pointer source backed by enigo
pub struct EnigoPointer {
    enigo: Enigo,
}

impl EnigoPointer {
    pub fn connect() -> Result<Self, DeviceError> {
        Ok(Self { enigo: connect()? })
    }
}

impl PointerSource for EnigoPointer {
    fn position(&self) -> Result<Point, DeviceError> {
        let location = self
            .enigo
            .location()
            .map_err(|e| DeviceError::Pointer(e.to_string()))?;
        Ok(Point::from(location))
    }
}

/// Keyboard sink that records every char instead of emitting it
#[derive(Debug, Default)]
pub struct RecordingKeyboard {
    typed: String,
    fail_on: Option<char>,
}

impl RecordingKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make emission of `c` fail, as a keyboard with no focused target would.
    pub fn failing_on(c: char) -> Self {
        Self {
            typed: String::new(),
            fail_on: Some(c),
        }
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }
}

impl KeystrokeSink for RecordingKeyboard {
    fn type_char(&mut self, c: char) -> Result<(), DeviceError> {
        if self.fail_on == Some(c) {
            return Err(DeviceError::Emit {
                character: c,
                reason: "no focused window".to_string(),
            });
        }
        debug!(?c, "recorded keystroke");
        self.typed.push(c);
        Ok(())
    }
}

/// Pointer whose position is moved explicitly by the caller
#[derive(Debug, Default)]
pub struct ScriptedPointer {
    position: Cell<Point>,
}

impl ScriptedPointer {
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            position: Cell::new(Point::new(x, y)),
        }
    }

    pub fn move_to(&self, x: i32, y: i32) {
        self.position.set(Point::new(x, y));
    }
}

impl PointerSource for ScriptedPointer {
    fn position(&self) -> Result<Point, DeviceError> {
        Ok(self.position.get())
    }
}
