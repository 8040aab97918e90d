use super::types::{PositiveU64, PositiveUsize};
use crate::error::{AppError, AppResult, ValidationError};

pub(super) fn parse_positive_u64(s: &str) -> AppResult<PositiveU64> {
    s.parse::<PositiveU64>().map_err(AppError::from)
}

pub(super) fn parse_positive_usize(s: &str) -> AppResult<PositiveUsize> {
    s.parse::<PositiveUsize>().map_err(AppError::from)
}

/// Histogram precision accepted by hdrhistogram.
pub(crate) fn parse_sigfig(s: &str) -> AppResult<u8> {
    let value: u8 = s
        .trim()
        .parse()
        .map_err(|err| AppError::validation(ValidationError::InvalidNumber { source: err }))?;
    if !(1..=5).contains(&value) {
        return Err(AppError::metrics(crate::error::MetricsError::InvalidSigfig {
            value,
        }));
    }
    Ok(value)
}

/// Splits a URL list file into targets, one per line. Blank lines and
/// surrounding whitespace are ignored.
pub(crate) fn parse_url_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}
