// SPDX-License-Identifier: MIT
use crate::{
    collapse::{Collapse, RunCollapser, COLLAPSE_MARKER},
    error::{DumpError, Result},
    hex_dump::{DumpLine, LineFormatter, HEX_DUMP_MAX_CHUNKS},
    source::ChunkSource,
};
use std::{
    fmt,
    io::{self, Read, Write},
};

/// Data to be dumped.
///
/// Text is accepted by the conversions only to be rejected by the engine,
/// as the dump renders raw bytes and never an encoding of characters.
pub enum DumpInput<'a> {
    Bytes(&'a [u8]),
    Stream(Box<dyn Read + 'a>),
    Text(&'a str),
}

impl<'a> DumpInput<'a> {
    /// Wraps a sequential reader, e.g. an open file.
    pub fn stream<R: Read + 'a>(reader: R) -> Self {
        Self::Stream(Box::new(reader))
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Bytes(_) => "buffer",
            Self::Stream(_) => "stream",
            Self::Text(_) => "text",
        }
    }
}

impl<'a> From<&'a [u8]> for DumpInput<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for DumpInput<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for DumpInput<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'a> From<&'a str> for DumpInput<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a String> for DumpInput<'a> {
    fn from(text: &'a String) -> Self {
        Self::Text(text)
    }
}

/// A single line of dump output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Line {
    Data(DumpLine),
    /// Marker for a run of repeated rows
    Collapsed,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Data(line) => write!(f, "{line}"),
            Self::Collapsed => f.write_str(COLLAPSE_MARKER),
        }
    }
}

/// Consumer of dump lines.
pub trait LineSink {
    fn write_line(&mut self, line: &str) -> io::Result<()>;
}

impl LineSink for Vec<String> {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}

/// Writes newline terminated lines to any writer, e.g. stdout.
pub struct WriteSink<W>(pub W);

impl<W: Write> LineSink for WriteSink<W> {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.0, "{line}")
    }
}

/// Lazy sequence of dump lines.
///
/// Every pull reads at most one chunk from the underlying source. The
/// sequence can only be consumed once and ends after the first error.
pub struct DumpLines<'a> {
    source: ChunkSource<'a>,
    collapser: RunCollapser<'a>,
    formatter: LineFormatter,
    index: u64,
    failed: bool,
}

impl<'a> Iterator for DumpLines<'a> {
    type Item = Result<Line>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let chunk = match self.source.next_chunk() {
                Ok(Some(chunk)) => chunk,
                Ok(None) => return None,
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            };

            let address = self.index * HEX_DUMP_MAX_CHUNKS as u64;
            self.index += 1;

            match self.collapser.feed(chunk) {
                Collapse::Emit(chunk) => {
                    return Some(Ok(Line::Data(self.formatter.format(address, &chunk))))
                }
                Collapse::Marker => {
                    log::trace!("Collapsing repeated rows starting at {address:#X}.");
                    return Some(Ok(Line::Collapsed));
                }
                Collapse::Suppress => continue,
            }
        }
    }
}

/// Drives the dump pipeline from a source to formatted lines.
#[derive(Clone, Debug, Default)]
pub struct DumpEngine {
    formatter: LineFormatter,
    limit: Option<u64>,
}

impl DumpEngine {
    /// Creates an engine grouping `group_width` hex digits per row.
    pub fn new(group_width: usize) -> Result<Self> {
        Ok(Self {
            formatter: LineFormatter::new(group_width)?,
            limit: None,
        })
    }

    /// Restricts dumps to the first `limit` bytes of a source.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Byte limit of this engine, `None` dumps sources completely.
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Returns the lazy line sequence for the given input.
    ///
    /// # Error
    ///
    /// Text input is rejected with `UnsupportedInputType` before any
    /// data is read.
    pub fn lines<'a>(&self, input: impl Into<DumpInput<'a>>) -> Result<DumpLines<'a>> {
        let input = input.into();

        log::debug!(
            "Dumping {} input with group width {}.",
            input.kind(),
            self.formatter.group_width()
        );

        let source = match input {
            DumpInput::Text(_) => return Err(DumpError::UnsupportedInputType),
            DumpInput::Bytes(bytes) => {
                let len = match self.limit {
                    Some(limit) => bytes.len().min(usize::try_from(limit).unwrap_or(usize::MAX)),
                    None => bytes.len(),
                };
                ChunkSource::buffer(&bytes[..len], HEX_DUMP_MAX_CHUNKS)?
            }
            DumpInput::Stream(reader) => match self.limit {
                Some(limit) => ChunkSource::stream(reader.take(limit), HEX_DUMP_MAX_CHUNKS)?,
                None => ChunkSource::stream(reader, HEX_DUMP_MAX_CHUNKS)?,
            },
        };

        Ok(DumpLines {
            source,
            collapser: RunCollapser::new(),
            formatter: self.formatter.clone(),
            index: 0,
            failed: false,
        })
    }

    /// Writes every line to the sink as soon as it is produced.
    ///
    /// Returns the number of lines written. Lines already written stay
    /// in the sink if the dump fails midway.
    pub fn emit<'a, S>(&self, input: impl Into<DumpInput<'a>>, sink: &mut S) -> Result<usize>
    where
        S: LineSink + ?Sized,
    {
        let mut count = 0;

        for line in self.lines(input)? {
            sink.write_line(&line?.to_string())?;
            count += 1;
        }

        log::debug!("Dumped {count} lines.");

        Ok(count)
    }

    /// Renders the whole dump into a single string, one row per line.
    pub fn render<'a>(&self, input: impl Into<DumpInput<'a>>) -> Result<String> {
        let lines = self
            .lines(input)?
            .map(|line| line.map(|line| line.to_string()))
            .collect::<Result<Vec<_>>>()?;

        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use mockall::{mock, predicate};
    use std::io::Cursor;

    mock! {
        Sink {}

        impl LineSink for Sink {
            fn write_line(&mut self, line: &str) -> io::Result<()>;
        }
    }

    /// Reader failing after it handed out a fixed amount of data.
    struct Failing {
        data: Cursor<Vec<u8>>,
    }

    impl Read for Failing {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::Other, "read failed")),
                read => Ok(read),
            }
        }
    }

    fn counting(len: usize) -> Vec<u8> {
        (0..len).map(|i| i as u8).collect()
    }

    /// Test that runs of zero rows collapse into a single marker.
    #[test]
    fn test_collapse_zero_rows() {
        let mut data = vec![0u8; 48];
        data.extend_from_slice(b"0123456789abcdef");

        let dump = DumpEngine::default().render(&data).unwrap();

        assert_eq!(
            dump,
            [
                "00000000: 00 00 00 00 00 00 00 00  00 00 00 00 00 00 00 00  ................",
                "*",
                "00000030: 30 31 32 33 34 35 36 37  38 39 61 62 63 64 65 66  0123456789abcdef",
            ]
            .join("\n")
        );
    }

    /// Test that a source ending within a run only yields the marker.
    #[test]
    fn test_source_ends_in_run() {
        let data = [0xFFu8; 64];
        let lines: Vec<String> = DumpEngine::default()
            .lines(&data)
            .unwrap()
            .map(|line| line.unwrap().to_string())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "*");
    }

    /// Test that buffers and streams render identically.
    #[test]
    fn test_buffer_and_stream_agree() {
        let data = counting(100);
        let engine = DumpEngine::new(2).unwrap();

        let from_buffer = engine.render(&data).unwrap();
        let from_stream = engine
            .render(DumpInput::stream(Cursor::new(data.clone())))
            .unwrap();

        assert_eq!(from_buffer, from_stream);
        assert_eq!(from_buffer.lines().count(), 7);
        assert!(from_buffer.ends_with(&format!(
            "00000060: 60 61 62 63{}`abc",
            " ".repeat(39)
        )));
    }

    /// Test that text input is rejected before anything is dumped.
    #[test]
    fn test_text_input_rejected() {
        let engine = DumpEngine::default();
        let mut sink = MockSink::new();
        sink.expect_write_line().never();

        assert!(matches!(
            engine.emit("not bytes", &mut sink),
            Err(DumpError::UnsupportedInputType)
        ));
        assert!(matches!(
            engine.render(&String::from("text")),
            Err(DumpError::UnsupportedInputType)
        ));
    }

    /// Test that lines are handed to the sink in order.
    #[test]
    fn test_emit_to_sink() {
        let data = counting(20);
        let mut sink = MockSink::new();
        let mut sequence = mockall::Sequence::new();

        sink.expect_write_line()
            .with(predicate::function(|line: &str| line.starts_with("00000000: ")))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));
        sink.expect_write_line()
            .with(predicate::function(|line: &str| line.starts_with("00000010: ")))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));

        assert_eq!(DumpEngine::default().emit(&data, &mut sink).unwrap(), 2);
    }

    /// Test the writer sink and the empty source.
    #[test]
    fn test_write_sink() {
        let mut sink = WriteSink(Vec::new());
        let engine = DumpEngine::default();

        assert_eq!(engine.emit(b"AB", &mut sink).unwrap(), 1);
        assert_eq!(engine.emit(&Vec::<u8>::new(), &mut sink).unwrap(), 0);

        let written = String::from_utf8(sink.0).unwrap();
        assert_eq!(written, format!("00000000: 41 42{}AB\n", " ".repeat(45)));
    }

    /// Test that a failing read stops the dump after the emitted lines.
    #[test]
    fn test_mid_stream_failure() {
        let reader = Failing {
            data: Cursor::new(counting(32)),
        };
        let mut sink: Vec<String> = Vec::new();

        let result = DumpEngine::default().emit(DumpInput::stream(reader), &mut sink);

        assert!(matches!(result, Err(DumpError::Io(_))));
        assert_eq!(sink.len(), 2);
    }

    /// Test that the byte limit applies to buffers and streams.
    #[test]
    fn test_limit() {
        let data = counting(64);
        let engine = DumpEngine::default().with_limit(20);

        let from_buffer = engine.render(&data).unwrap();
        let from_stream = engine
            .render(DumpInput::stream(Cursor::new(data.clone())))
            .unwrap();

        assert_eq!(from_buffer, from_stream);
        assert_eq!(from_buffer.lines().count(), 2);
        assert!(from_buffer.lines().last().unwrap().starts_with("00000010: 10 11 12 13 "));
        assert_eq!(engine.limit(), Some(20));
    }

    /// Test that a default engine dumps whole sources.
    #[test]
    fn test_no_limit_by_default() {
        let data = counting(64);
        let engine = DumpEngine::default();

        assert_eq!(engine.limit(), None);
        assert_eq!(engine.render(&data).unwrap().lines().count(), 4);
    }

    /// Test that an engine reused for a second source starts without a run.
    #[test]
    fn test_run_not_carried_between_sources() {
        let engine = DumpEngine::default();
        let data = [0u8; 16];

        assert_eq!(engine.render(&data).unwrap(), engine.render(&data).unwrap());
        assert!(!engine.render(&data).unwrap().starts_with('*'));
    }

    /// Test that the lazy sequence ends after an error.
    #[test]
    fn test_lines_fused_after_error() {
        let reader = Failing {
            data: Cursor::new(Vec::new()),
        };
        let mut lines = DumpEngine::default().lines(DumpInput::stream(reader)).unwrap();

        assert!(matches!(lines.next(), Some(Err(DumpError::Io(_)))));
        assert!(lines.next().is_none());
    }
}
