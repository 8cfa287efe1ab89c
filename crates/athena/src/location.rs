use std::fmt;
use std::str::FromStr;

use crate::client::AthenaError;

/// A parsed `s3://<bucket>/<key>` object reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Location {
    pub bucket: String,
    pub key: String,
}

impl FromStr for S3Location {
    type Err = AthenaError;

    /// The bucket is everything up to the first `/` after the scheme and must
    /// be non-empty; the key is the non-empty remainder, slashes included.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AthenaError::InvalidOutputLocation(s.to_string());

        let rest = s.strip_prefix("s3://").ok_or_else(invalid)?;
        let (bucket, key) = rest.split_once('/').ok_or_else(invalid)?;
        if bucket.is_empty() || key.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }
}

impl fmt::Display for S3Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}
