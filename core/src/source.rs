// SPDX-License-Identifier: MIT
use crate::error::{DumpError, Result};
use std::{borrow::Cow, fmt, io::Read, ops::Deref};

/// Raw bytes of a single chunk.
///
/// Chunks cut from a buffer borrow the buffer, chunks read from a
/// stream own their bytes. Only the last chunk of a source may be
/// shorter than the requested chunk size.
#[derive(Clone, PartialEq, Eq)]
pub struct ByteChunk<'a>(Cow<'a, [u8]>);

impl<'a> ByteChunk<'a> {
    pub fn into_owned(self) -> Vec<u8> {
        self.0.into_owned()
    }
}

impl<'a> Deref for ByteChunk<'a> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> fmt::Debug for ByteChunk<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ByteChunk({:02X?})", &*self.0)
    }
}

/// Chunks an in-memory byte buffer by slicing.
pub struct BufferSource<'a> {
    data: &'a [u8],
    size: usize,
}

impl<'a> BufferSource<'a> {
    pub fn new(data: &'a [u8], size: usize) -> Result<Self> {
        if size == 0 {
            return Err(DumpError::InvalidChunkSize);
        }

        Ok(Self { data, size })
    }

    fn next_chunk(&mut self) -> Option<ByteChunk<'a>> {
        if self.data.is_empty() {
            return None;
        }

        let (chunk, rest) = self.data.split_at(self.size.min(self.data.len()));
        self.data = rest;

        Some(ByteChunk(Cow::Borrowed(chunk)))
    }
}

/// Chunks a sequential reader, one bounded read per chunk.
pub struct StreamSource<R> {
    reader: R,
    size: usize,
    exhausted: bool,
}

impl<R: Read> StreamSource<R> {
    pub fn new(reader: R, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(DumpError::InvalidChunkSize);
        }

        Ok(Self {
            reader,
            size,
            exhausted: false,
        })
    }

    fn next_chunk(&mut self) -> Result<Option<ByteChunk<'static>>> {
        if self.exhausted {
            return Ok(None);
        }

        // Short reads from pipes are retried until the chunk is full or the stream ends.
        let mut buffer = Vec::with_capacity(self.size);
        let read = match (&mut self.reader)
            .take(self.size as u64)
            .read_to_end(&mut buffer)
        {
            Ok(read) => read,
            Err(err) => {
                self.exhausted = true;
                return Err(err.into());
            }
        };

        if read == 0 {
            self.exhausted = true;
            return Ok(None);
        }

        Ok(Some(ByteChunk(Cow::Owned(buffer))))
    }
}

/// Uniform chunk producer over both kinds of binary sources.
///
/// The sequence is lazy, finite and can only be consumed once. It covers
/// the source front to back without gaps or overlaps.
pub enum ChunkSource<'a> {
    Buffer(BufferSource<'a>),
    Stream(StreamSource<Box<dyn Read + 'a>>),
}

impl<'a> ChunkSource<'a> {
    /// Creates a source slicing the given buffer into chunks of `size` bytes.
    pub fn buffer(data: &'a [u8], size: usize) -> Result<Self> {
        Ok(Self::Buffer(BufferSource::new(data, size)?))
    }

    /// Creates a source reading chunks of `size` bytes from the given reader.
    pub fn stream<R: Read + 'a>(reader: R, size: usize) -> Result<Self> {
        Ok(Self::Stream(StreamSource::new(Box::new(reader) as Box<dyn Read + 'a>, size)?))
    }

    /// Returns the next chunk or `None` once the source is exhausted.
    ///
    /// # Error
    ///
    /// If reading from a stream fails, the I/O error is returned and the
    /// source is considered exhausted.
    pub fn next_chunk(&mut self) -> Result<Option<ByteChunk<'a>>> {
        match self {
            Self::Buffer(source) => Ok(source.next_chunk()),
            Self::Stream(source) => source.next_chunk(),
        }
    }
}

impl<'a> Iterator for ChunkSource<'a> {
    type Item = Result<ByteChunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use mockall::mock;
    use std::io::{self, Cursor};

    mock! {
        Reader {}

        impl Read for Reader {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
        }
    }

    /// Reader handing out at most three bytes per call, like a pipe.
    struct Trickle(Cursor<Vec<u8>>);

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let len = buf.len().min(3);
            self.0.read(&mut buf[..len])
        }
    }

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 % 251) as u8).collect()
    }

    fn collect(source: ChunkSource) -> Vec<Vec<u8>> {
        source.map(|chunk| chunk.unwrap().into_owned()).collect()
    }

    /// Test that concatenating all chunks reconstructs the input.
    #[test]
    fn test_chunks_reconstruct_input() {
        for len in [0, 1, 15, 16, 17, 100, 256] {
            let data = sample(len);

            for size in [1, 3, 16, 64] {
                let from_buffer = collect(ChunkSource::buffer(&data, size).unwrap());
                let from_stream =
                    collect(ChunkSource::stream(Cursor::new(data.clone()), size).unwrap());

                assert_eq!(from_buffer, from_stream);
                assert_eq!(from_buffer.concat(), data);
                assert!(from_buffer
                    .iter()
                    .rev()
                    .skip(1)
                    .all(|chunk| chunk.len() == size));
            }
        }
    }

    /// Test the length of the final chunk.
    #[test]
    fn test_last_chunk_length() {
        let data = sample(37);
        let chunks = collect(ChunkSource::buffer(&data, 16).unwrap());

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].len(), 5);

        let data = sample(32);
        let chunks = collect(ChunkSource::buffer(&data, 16).unwrap());

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].len(), 16);
    }

    /// Test that buffer chunks are borrowed from the input.
    #[test]
    fn test_buffer_chunks_borrow() {
        let data = sample(20);
        let mut source = ChunkSource::buffer(&data, 16).unwrap();
        let chunk = source.next_chunk().unwrap().unwrap();

        assert!(matches!(chunk.0, Cow::Borrowed(_)));
        assert_eq!(chunk.as_ptr(), data.as_ptr());
    }

    /// Test that partial reads are merged into full chunks.
    #[test]
    fn test_stream_short_reads() {
        let data = sample(40);
        let chunks = collect(ChunkSource::stream(Trickle(Cursor::new(data.clone())), 16).unwrap());

        let lengths: Vec<usize> = chunks.iter().map(Vec::len).collect();
        assert_eq!(lengths, vec![16, 16, 8]);
        assert_eq!(chunks.concat(), data);
    }

    /// Test that a read error ends the sequence.
    #[test]
    fn test_stream_read_error() {
        let mut reader = MockReader::new();
        reader
            .expect_read()
            .times(1)
            .returning(|_| Err(io::Error::new(io::ErrorKind::Other, "device gone")));

        let mut source = ChunkSource::stream(reader, 16).unwrap();

        assert!(matches!(source.next(), Some(Err(DumpError::Io(_)))));
        assert!(source.next().is_none());
    }

    /// Test rejection of empty chunks.
    #[test]
    fn test_zero_chunk_size() {
        assert!(matches!(
            ChunkSource::buffer(b"abc", 0),
            Err(DumpError::InvalidChunkSize)
        ));
        assert!(matches!(
            ChunkSource::stream(Cursor::new(vec![1u8]), 0),
            Err(DumpError::InvalidChunkSize)
        ));
    }
}
