//! Content fingerprints used for compare-and-swap plan updates.

use std::fmt;

use md5::{Digest, Md5};

/// Lowercase hex MD5 digest of a plan's edit text, as the server computes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Computes the fingerprint of `text` over its UTF-8 bytes.
    pub fn of(text: &str) -> Self {
        let digest = Md5::digest(text.as_bytes());
        Self(hex::encode(digest))
    }

    /// Wraps a digest declared by the server. Case is normalized.
    pub fn declared(hex_digest: &str) -> Self {
        Self(hex_digest.trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digests() {
        let cases = [
            ("plain text", "31bc5c2b8fd4f20cd747347b7504a385"),
            ("<b>so excited</b>", "5353151279a27d0cf3622a38ac296eac"),
            (
                "<hr>contact info blah blah<hr>",
                "73513621200053706fae792102065dac",
            ),
            ("Newline at the end\n", "c5628b1e47bcf016ba500b68e5bbe809"),
            ("Linefeed\r\nnewline", "3e5ad339a8329429027960e549edcba9"),
            ("Black ★ star", "7b2c53532dce380bf22c94e24683da14"),
            ("Pile of 💩!", "206f15e259a0216f1818ff230c339dc4"),
            (
                "<tt># 10 11 12 -----------------</tt>",
                "6523a6215d386e0e9c9a9ead96984bbe",
            ),
        ];
        for (text, expected) in cases {
            assert_eq!(Fingerprint::of(text).as_str(), expected, "digest of {text:?}");
        }
    }

    #[test]
    fn test_declared_is_case_insensitive() {
        assert_eq!(
            Fingerprint::declared(" 31BC5C2B8FD4F20CD747347B7504A385 "),
            Fingerprint::of("plain text")
        );
    }
}
