//! Bounded rendering of result values.

use std::fmt::{self, Write as _};

use super::TRUNCATION_MARKER;

/// `fmt::Write` sink that stops accepting characters once `limit` is reached.
struct LimitedWriter {
    buffer: String,
    remaining: usize,
    reached: bool,
}

impl LimitedWriter {
    fn new(limit: usize) -> Self {
        Self {
            buffer: String::new(),
            remaining: limit,
            reached: limit == 0,
        }
    }

    fn finish(mut self) -> String {
        if self.reached {
            self.buffer.push_str(TRUNCATION_MARKER);
        }
        self.buffer
    }
}

impl fmt::Write for LimitedWriter {
    fn write_str(&mut self, text: &str) -> fmt::Result {
        for ch in text.chars() {
            if self.remaining == 0 {
                self.reached = true;
                return Err(fmt::Error);
            }
            self.buffer.push(ch);
            self.remaining -= 1;
        }
        if self.remaining == 0 {
            self.reached = true;
        }
        Ok(())
    }
}

/// Renders `value`, keeping at most `limit` characters.
///
/// When the rendering reaches the limit the kept prefix is followed by
/// [`TRUNCATION_MARKER`]. Rendering is abandoned as soon as the limit is
/// exceeded, so very large values are never fully materialised.
pub(super) fn render_limited(value: &impl fmt::Display, limit: usize) -> String {
    let mut writer = LimitedWriter::new(limit);
    if write!(writer, "{value}").is_err() {
        writer.reached = true;
    }
    writer.finish()
}
