//! Interface-only stand-in for the original's social-feed listener
//! (`examples/original_source/python/bot.py`): receive program text, run it
//! through the same pipeline the CLI uses, post the PNG back. No network
//! client is implemented here — out of scope per spec.md §1.

use std::path::Path;

use crate::error::InterpretError;

/// A source of incoming program texts, one per feed message.
pub trait FeedSource {
    /// Returns the next received program, or `None` once the feed is
    /// exhausted/closed.
    fn next_program(&mut self) -> Option<String>;
}

/// Drives one program per message from `source` through
/// [`crate::run_program`], writing each result to `output` in turn.
/// Returns after the source is exhausted or a program fails.
pub fn drive<S: FeedSource>(source: &mut S, output: &Path) -> Result<usize, InterpretError> {
    let mut count = 0;
    while let Some(program) = source.next_program() {
        crate::run_program(&program, output)?;
        count += 1;
    }
    Ok(count)
}
