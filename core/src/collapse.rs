// SPDX-License-Identifier: MIT
use crate::source::ByteChunk;

/// Literal line standing in for a run of repeated rows
pub const COLLAPSE_MARKER: &str = "*";

/// Decision of the run collapser for a single chunk.
#[derive(Debug, PartialEq, Eq)]
pub enum Collapse<'a> {
    /// The chunk differs from its predecessor and is dumped.
    Emit(ByteChunk<'a>),
    /// The chunk starts a run of repeats; a marker replaces it.
    Marker,
    /// The chunk continues a run that already has a marker.
    Suppress,
}

/// Collapses consecutive identical chunks like classic hex dump tools.
///
/// The first repeat of a chunk yields a single marker, all further
/// repeats of the same run are dropped silently.
#[derive(Default)]
pub struct RunCollapser<'a> {
    previous: Option<ByteChunk<'a>>,
    repeats: usize,
}

impl<'a> RunCollapser<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies the next chunk of the source.
    pub fn feed(&mut self, chunk: ByteChunk<'a>) -> Collapse<'a> {
        if self.previous.as_deref() == Some(&*chunk) {
            self.repeats += 1;

            return if self.repeats == 1 {
                Collapse::Marker
            } else {
                Collapse::Suppress
            };
        }

        self.repeats = 0;
        self.previous = Some(chunk.clone());

        Collapse::Emit(chunk)
    }
}
