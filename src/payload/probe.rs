//! Bounded buffering probe.
//!
//! Reads a source into a buffer of exactly `limit` bytes and then asks for
//! one more byte to tell "fits exactly" apart from "too big".

use tokio::io::{AsyncRead, AsyncReadExt};

/// Outcome of [`read_bounded`].
#[derive(Debug)]
pub enum Probe {
    /// The whole source, `len() <= limit`.
    Complete(Vec<u8>),
    /// The source is longer than the limit; holds the first `limit + 1` bytes.
    Overflow(Vec<u8>),
}

/// Try to read all of `reader` into at most `limit` bytes.
///
/// I/O errors are propagated as-is; overflow is not an error at this level.
pub async fn read_bounded<R>(reader: &mut R, limit: usize) -> std::io::Result<Probe>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = vec![0u8; limit];
    let mut filled = 0;
    while filled < limit {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            buf.truncate(filled);
            return Ok(Probe::Complete(buf));
        }
        filled += n;
    }

    let mut extra = [0u8; 1];
    let n = reader.read(&mut extra).await?;
    if n == 0 {
        return Ok(Probe::Complete(buf));
    }
    buf.push(extra[0]);
    Ok(Probe::Overflow(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASES: &[(&str, usize, bool)] = &[
        ("", 0, true),
        ("", 1, true),
        ("", 2, true),
        ("", 3, true),
        ("a", 1, true),
        ("aa", 1, false),
        ("aaa", 1, false),
        ("aaaa", 1, false),
        ("b", 2, true),
        ("bb", 2, true),
        ("bbb", 2, false),
        ("bbbb", 2, false),
        ("foobar", 8, true),
        ("foobar", 7, true),
        ("foobar", 6, true),
        ("foobar", 5, false),
        ("foobar", 4, false),
        ("foobar", 3, false),
        ("foobar", 2, false),
        ("foobar", 1, false),
        ("foobar", 0, false),
    ];

    #[tokio::test]
    async fn probe_table() {
        for (i, &(input, limit, fits)) in CASES.iter().enumerate() {
            let mut source = input.as_bytes();
            let probe = read_bounded(&mut source, limit).await.unwrap();
            match probe {
                Probe::Complete(buf) => {
                    assert!(fits, "{i}: {input:?} with limit {limit} should overflow");
                    assert_eq!(buf, input.as_bytes(), "{i}: buffered bytes differ");
                }
                Probe::Overflow(buf) => {
                    assert!(!fits, "{i}: {input:?} with limit {limit} should fit");
                    assert_eq!(buf.len(), limit + 1, "{i}: overflow prefix length");
                    assert_eq!(buf, &input.as_bytes()[..limit + 1], "{i}: prefix differs");
                }
            }
        }
    }

    #[tokio::test]
    async fn short_reads_still_fill_the_buffer() {
        let (mut client, mut server) = tokio::io::duplex(2);
        let writer = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            for chunk in [b"ab".as_slice(), b"cd", b"e"] {
                server.write_all(chunk).await.unwrap();
            }
        });

        let probe = read_bounded(&mut client, 5).await;
        writer.await.unwrap();
        // The writer half is dropped, so the extra read sees end-of-source.
        match probe.unwrap() {
            Probe::Complete(buf) => assert_eq!(buf, b"abcde"),
            Probe::Overflow(_) => panic!("five bytes fit a five byte limit"),
        }
    }
}
