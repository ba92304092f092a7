//! Non-interactive typing: wait once, then type everything.
//!
//! Unlike the controller there is no pointer check and no resume; the whole
//! text goes out in one pass after a visible countdown.

use std::io::{self, Write};
use std::time::Duration;

use tracing::info;

use crate::device::{DeviceError, KeystrokeSink};

const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

/// Sleep out `delay`, writing the seconds left to `out` once per second.
pub fn countdown<W, S>(delay: Duration, out: &mut W, mut sleep: S) -> io::Result<()>
where
    W: Write,
    S: FnMut(Duration),
{
    let mut remaining = delay;
    while !remaining.is_zero() {
        write!(
            out,
            "\rWaiting ... {:>4.1}s ",
            remaining.as_secs_f64()
        )?;
        out.flush()?;

        let step = remaining.min(COUNTDOWN_STEP);
        sleep(step);
        remaining -= step;
    }
    if !delay.is_zero() {
        writeln!(out, "\rWaiting ... done ")?;
    }
    Ok(())
}

/// Type `text` char by char with `interval` between keystrokes.
pub fn type_text<K, S>(
    keyboard: &mut K,
    text: &str,
    interval: Duration,
    mut sleep: S,
) -> Result<usize, DeviceError>
where
    K: KeystrokeSink,
    S: FnMut(Duration),
{
    let mut typed = 0;
    for c in text.chars() {
        if typed > 0 && !interval.is_zero() {
            sleep(interval);
        }
        keyboard.type_char(c)?;
        typed += 1;
    }
    info!(chars = typed, "finished typing");
    Ok(typed)
}
