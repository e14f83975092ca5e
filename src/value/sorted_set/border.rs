//! # Score border
//!
//! Parses the `min`/`max` arguments accepted by `ZRANGEBYSCORE`-style
//! commands: a bare number, `+inf`/`-inf`, or a number prefixed with `(` to
//! exclude it from the range.
use crate::error::Error;

/// One endpoint of a score range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBorder {
    /// `-inf`
    NegInf,
    /// `+inf`
    PosInf,
    /// A bare number, inclusive.
    Included(f64),
    /// A number prefixed with `(`, exclusive.
    Excluded(f64),
}

impl ScoreBorder {
    /// Parses one `ZRANGEBYSCORE`-style range endpoint.
    pub fn parse(raw: &[u8]) -> Result<Self, Error> {
        let s = std::str::from_utf8(raw).map_err(|_| Error::NotAFloat)?;
        match s {
            "+inf" | "+Inf" | "inf" => Ok(ScoreBorder::PosInf),
            "-inf" | "-Inf" => Ok(ScoreBorder::NegInf),
            _ => {
                if let Some(rest) = s.strip_prefix('(') {
                    let value: f64 = rest.parse().map_err(|_| Error::NotAFloat)?;
                    Ok(ScoreBorder::Excluded(value))
                } else {
                    let value: f64 = s.parse().map_err(|_| Error::NotAFloat)?;
                    Ok(ScoreBorder::Included(value))
                }
            }
        }
    }

    /// True if `score` lies at or after this border used as a lower bound.
    pub fn allows_min(&self, score: f64) -> bool {
        match self {
            ScoreBorder::NegInf => true,
            ScoreBorder::PosInf => false,
            ScoreBorder::Included(v) => score >= *v,
            ScoreBorder::Excluded(v) => score > *v,
        }
    }

    /// True if `score` lies at or before this border used as an upper bound.
    pub fn allows_max(&self, score: f64) -> bool {
        match self {
            ScoreBorder::PosInf => true,
            ScoreBorder::NegInf => false,
            ScoreBorder::Included(v) => score <= *v,
            ScoreBorder::Excluded(v) => score < *v,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_inf() {
        assert_eq!(ScoreBorder::parse(b"+inf").unwrap(), ScoreBorder::PosInf);
        assert_eq!(ScoreBorder::parse(b"-inf").unwrap(), ScoreBorder::NegInf);
    }

    #[test]
    fn parses_exclusive() {
        assert_eq!(
            ScoreBorder::parse(b"(1.5").unwrap(),
            ScoreBorder::Excluded(1.5)
        );
        assert_eq!(
            ScoreBorder::parse(b"1.5").unwrap(),
            ScoreBorder::Included(1.5)
        );
    }

    #[test]
    fn min_max_checks() {
        let min = ScoreBorder::Excluded(1.0);
        assert!(!min.allows_min(1.0));
        assert!(min.allows_min(1.1));

        let max = ScoreBorder::Included(2.0);
        assert!(max.allows_max(2.0));
        assert!(!max.allows_max(2.1));
    }
}
