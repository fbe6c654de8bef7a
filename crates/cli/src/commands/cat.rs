//! cat and zcat commands - Display object contents
//!
//! `cat` streams the object to stdout as it arrives. `zcat` gunzips it on
//! the way, accepting concatenated gzip members.

use std::io::{self, Write};

use anyhow::Context;
use clap::Args;
use flate2::write::MultiGzDecoder;
use futures::{Stream, TryStreamExt};
use s3sum_core::{Error, ObjectStore, Settings, parse_remote};
use s3sum_s3::S3Client;
use tokio::io::AsyncWriteExt;

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Display object contents
#[derive(Args, Debug)]
pub struct CatArgs {
    /// Object path (bucket/key)
    pub path: String,
}

/// How the object body is turned into output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decode {
    Plain,
    Gzip,
}

/// Execute the cat or zcat command
pub async fn execute(
    args: CatArgs,
    decode: Decode,
    settings: &Settings,
    formatter: &Formatter,
) -> ExitCode {
    match run(&args, decode, settings).await {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            e.downcast_ref::<Error>()
                .map_or(ExitCode::GeneralError, ExitCode::from_error)
        }
    }
}

async fn run(args: &CatArgs, decode: Decode, settings: &Settings) -> anyhow::Result<()> {
    let path = parse_remote(&args.path)?;
    if path.is_dir() {
        return Err(Error::InvalidPath(format!("Object key cannot be empty: {}", args.path)).into());
    }

    let client = S3Client::new(settings).await?;
    let body = client.get_object(&path).await?;
    tracing::debug!(path = %path, size = ?body.size, ?decode, "reading object");

    match decode {
        Decode::Plain => {
            let mut stdout = tokio::io::stdout();
            let mut chunks = body.chunks;
            while let Some(chunk) = chunks.try_next().await? {
                stdout
                    .write_all(&chunk)
                    .await
                    .context("Failed to write to stdout")?;
            }
            stdout.flush().await.context("Failed to write to stdout")?;
        }
        Decode::Gzip => {
            let mut stdout = gunzip_stream(body.chunks, io::stdout()).await?;
            stdout.flush().context("Failed to write to stdout")?;
        }
    }

    Ok(())
}

/// Decompress every gzip member into `out` as chunks arrive
async fn gunzip_stream<S, W>(mut chunks: S, out: W) -> anyhow::Result<W>
where
    S: Stream<Item = s3sum_core::Result<Vec<u8>>> + Unpin,
    W: Write,
{
    let mut decoder = MultiGzDecoder::new(out);
    while let Some(chunk) = chunks.try_next().await? {
        decoder.write_all(&chunk).context("Failed to decompress")?;
    }
    decoder.finish().context("Failed to decompress")
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use futures::stream;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    /// Split into small chunks so members straddle chunk boundaries
    fn chunked(data: Vec<u8>) -> impl Stream<Item = s3sum_core::Result<Vec<u8>>> + Unpin {
        let chunks: Vec<s3sum_core::Result<Vec<u8>>> =
            data.chunks(7).map(|c| Ok(c.to_vec())).collect();
        stream::iter(chunks)
    }

    #[tokio::test]
    async fn test_gunzip_single_member() {
        let out = gunzip_stream(chunked(gzip(b"hello world\n")), Vec::new())
            .await
            .unwrap();
        assert_eq!(out, b"hello world\n");
    }

    #[tokio::test]
    async fn test_gunzip_concatenated_members() {
        let mut input = gzip(b"first\n");
        input.extend(gzip(b"second\n"));

        let out = gunzip_stream(chunked(input), Vec::new()).await.unwrap();
        assert_eq!(out, b"first\nsecond\n");
    }

    #[tokio::test]
    async fn test_gunzip_rejects_plain_input() {
        let result = gunzip_stream(chunked(b"not gzip".to_vec()), Vec::new()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_gunzip_keeps_stream_error() {
        let chunks = stream::iter(vec![
            Ok(gzip(b"partial")[..4].to_vec()),
            Err(Error::Transport("reset".into())),
        ]);
        let err = gunzip_stream(chunks, Vec::new()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::Transport(_))
        ));
    }
}
