//! Results archive handling: unwrapping the outer tar stream and opening the
//! nested gzip payload.

pub mod pipe;

use std::io::{self, Read};
use std::thread;

use flate2::read::MultiGzDecoder;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::debug;

pub use pipe::{pipe, PipeReader, PipeWriter};

/// Name suffix of the nested results archive inside the outer tar stream.
pub const NESTED_ARCHIVE_SUFFIX: &str = ".tar.gz";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("no compliance results archive found")]
    NotFound,

    #[error(transparent)]
    Read(#[from] io::Error),
}

/// Receives the error of a background copy, if it failed.
///
/// The sender is dropped when the copy finishes, so a closed channel means
/// the copy succeeded.
pub type CopyErrors = oneshot::Receiver<io::Error>;

/// Walk the tar stream `src` until the first entry whose name ends in
/// [`NESTED_ARCHIVE_SUFFIX`], then stream that entry's bytes through a pipe.
///
/// Returns as soon as the entry is located. A background thread keeps
/// copying the entry into the returned reader; any copy failure is delivered
/// on the returned [`CopyErrors`] channel. The thread closes the pipe and the
/// channel when it exits, whether or not the copy succeeded. Entries after
/// the first match are never read.
///
/// Blocks the calling thread while scanning.
pub fn untar_results<R>(src: R) -> Result<(PipeReader, CopyErrors), ArchiveError>
where
    R: Read + Send + 'static,
{
    let (reader, mut writer) = pipe(pipe::DEFAULT_CAPACITY);
    let (ready_tx, ready_rx) = oneshot::channel::<Result<String, ArchiveError>>();
    let (copy_tx, copy_rx) = oneshot::channel();

    thread::Builder::new()
        .name("results-untar".to_string())
        .spawn(move || {
            let mut archive = tar::Archive::new(src);
            let mut entry = match first_nested_entry(&mut archive) {
                Ok(entry) => entry,
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                    return;
                }
            };

            let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            if ready_tx.send(Ok(name)).is_err() {
                return;
            }

            match io::copy(&mut entry, &mut writer) {
                Ok(bytes) => debug!(bytes, "nested results archive copied"),
                Err(err) => {
                    let _ = copy_tx.send(err);
                }
            }
            // `writer` and `copy_tx` drop here, closing the pipe and the channel.
        })?;

    match ready_rx.blocking_recv() {
        Ok(Ok(name)) => {
            debug!(entry = %name, "found nested results archive");
            Ok((reader, copy_rx))
        }
        Ok(Err(err)) => Err(err),
        Err(_) => Err(ArchiveError::Read(io::Error::other(
            "archive reader exited before reporting",
        ))),
    }
}

fn first_nested_entry<R: Read>(
    archive: &mut tar::Archive<R>,
) -> Result<tar::Entry<'_, R>, ArchiveError> {
    for entry in archive.entries()? {
        let entry = entry?;
        if entry
            .path_bytes()
            .ends_with(NESTED_ARCHIVE_SUFFIX.as_bytes())
        {
            return Ok(entry);
        }
    }
    Err(ArchiveError::NotFound)
}

/// Wrap `reader` in a gzip decoder after checking the stream header.
///
/// Concatenated gzip members are decoded as one stream. Fails up front on an empty stream or one that does not start with the
/// gzip magic bytes, instead of on the first read.
pub fn gzip_reader<R: Read>(
    mut reader: R,
) -> io::Result<MultiGzDecoder<io::Chain<io::Cursor<[u8; 2]>, R>>> {
    let mut magic = [0u8; 2];
    reader.read_exact(&mut magic)?;
    if magic != GZIP_MAGIC {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid gzip header",
        ));
    }
    Ok(MultiGzDecoder::new(io::Cursor::new(magic).chain(reader)))
}
