use crate::core::Sample;
use crate::error::{SimError, SimResult};
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncSeek, AsyncSeekExt, BufReader};

/// Sequential reader over a trajectory log
///
/// The reader position is the playback cursor. Rewinding seeks back to the
/// first byte so a looping stream can replay the same source.
pub struct TraceReader<R> {
    reader: R,
    line_no: usize,
    line: String,
}

impl TraceReader<BufReader<File>> {
    /// Open a trajectory file from disk
    pub async fn open(path: &Path) -> SimResult<Self> {
        let file = File::open(path)
            .await
            .map_err(|source| SimError::SourceUnavailable {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R> TraceReader<R>
where
    R: AsyncBufRead + AsyncSeek + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            line: String::new(),
        }
    }

    /// 1-based number of the last line read
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// Read the next record, skipping blank lines
    ///
    /// Returns `Ok(None)` at end of source.
    pub async fn next_sample(&mut self) -> SimResult<Option<Sample>> {
        loop {
            self.line.clear();
            let n = self.reader.read_line(&mut self.line).await?;
            if n == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            if self.line.trim().is_empty() {
                continue;
            }

            return Sample::parse(&self.line, self.line_no).map(Some);
        }
    }

    /// Move the cursor back to the start of the source
    pub async fn rewind(&mut self) -> SimResult<()> {
        self.reader.seek(SeekFrom::Start(0)).await?;
        self.line_no = 0;
        Ok(())
    }
}
