//! Byte-range header parsing and clamping.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{Error, Result};

static RANGE_RE: OnceLock<Regex> = OnceLock::new();

/// An inclusive byte span `[start, end]` within a resource of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Parse the single-range form `bytes=<start>-<end?>` against a resource
    /// of `size` bytes.
    ///
    /// An open-ended or oversized end is clamped to `size - 1`. A start at
    /// or beyond the resource end is rejected as unsatisfiable; anything
    /// that does not match the grammar, and reversed ranges, are rejected
    /// as validation failures.
    pub fn parse(header: &str, size: u64) -> Result<Self> {
        let re = RANGE_RE.get_or_init(|| Regex::new(r"^bytes=(\d+)-(\d*)$").unwrap());
        let caps = re
            .captures(header)
            .ok_or_else(|| Error::Validation(format!("invalid Range header: {header:?}")))?;

        let start: u64 = caps[1]
            .parse()
            .map_err(|_| Error::Validation("range start out of representable bounds".into()))?;

        let end = match caps.get(2).map(|m| m.as_str()) {
            Some("") | None => size.saturating_sub(1),
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::Validation("range end out of representable bounds".into()))?,
        };

        if start >= size {
            return Err(Error::UnsatisfiableRange { start, size });
        }

        let end = end.min(size.saturating_sub(1));
        if end < start {
            return Err(Error::Validation(format!(
                "range end {end} precedes start {start}"
            )));
        }

        Ok(Self { start, end })
    }

    /// Number of bytes covered by the span.
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_ended_range_covers_the_tail() {
        let range = ByteRange::parse("bytes=0-", 1000).unwrap();
        assert_eq!(range, ByteRange { start: 0, end: 999 });
        assert_eq!(range.length(), 1000);
    }

    #[test]
    fn bounded_range_is_exact() {
        let range = ByteRange::parse("bytes=100-199", 1000).unwrap();
        assert_eq!(
            range,
            ByteRange {
                start: 100,
                end: 199
            }
        );
        assert_eq!(range.length(), 100);
    }

    #[test]
    fn oversized_end_clamps_to_last_byte() {
        let range = ByteRange::parse("bytes=990-2000", 1000).unwrap();
        assert_eq!(
            range,
            ByteRange {
                start: 990,
                end: 999
            }
        );
        assert_eq!(range.length(), 10);
    }

    #[test]
    fn start_beyond_size_is_unsatisfiable() {
        match ByteRange::parse("bytes=1000-", 1000) {
            Err(Error::UnsatisfiableRange { start, size }) => {
                assert_eq!(start, 1000);
                assert_eq!(size, 1000);
            }
            other => panic!("expected UnsatisfiableRange, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_is_unsatisfiable() {
        assert!(matches!(
            ByteRange::parse("bytes=0-", 0),
            Err(Error::UnsatisfiableRange { .. })
        ));
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert!(matches!(
            ByteRange::parse("bytes=500-100", 1000),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn malformed_headers_are_rejected() {
        for header in [
            "bytes=-500",
            "bytes=a-b",
            "bytes=0-10,20-30",
            "bits=0-10",
            "bytes = 0-10",
            "0-10",
        ] {
            assert!(
                matches!(ByteRange::parse(header, 1000), Err(Error::Validation(_))),
                "expected {header:?} to be rejected"
            );
        }
    }
}
