//! Optional convenience parser for the original string-prefixed range
//! convention (`"<1.5"`, `">=100"`), for callers migrating off it. The
//! compiler itself only ever consumes the explicit `RangeClause` triple.

use crate::options::{RangeClause, RangeField, RangeOp, RangeValue};

#[derive(Debug, thiserror::Error)]
pub enum RangeParseError {
    #[error("range string {0:?} has no recognized operator prefix")]
    MissingOperator(String),
    #[error("range string {0:?} has a malformed numeric value")]
    MalformedValue(String),
}

/// Parses `"<100"`, `"<=100"`, `">100"`, `">=100"` into an explicit
/// `RangeClause` for `field`. A malformed numeric tail is a caller error
/// this function surfaces directly (the original lets it propagate to
/// the backend as-is; here it is rejected before ever reaching the
/// compiler).
pub fn parse_range_string(field: RangeField, raw: &str) -> Result<RangeClause, RangeParseError> {
    let (op, rest) = if let Some(rest) = raw.strip_prefix("<=") {
        (RangeOp::Lte, rest)
    } else if let Some(rest) = raw.strip_prefix(">=") {
        (RangeOp::Gte, rest)
    } else if let Some(rest) = raw.strip_prefix('<') {
        (RangeOp::Lt, rest)
    } else if let Some(rest) = raw.strip_prefix('>') {
        (RangeOp::Gt, rest)
    } else {
        return Err(RangeParseError::MissingOperator(raw.to_owned()));
    };

    let value = if let Ok(i) = rest.parse::<i64>() {
        RangeValue::Int(i)
    } else if let Ok(f) = rest.parse::<f64>() {
        RangeValue::Float(f)
    } else {
        return Err(RangeParseError::MalformedValue(raw.to_owned()));
    };

    Ok(RangeClause { field, op, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gt_float() {
        let clause = parse_range_string(RangeField::FeeAmount, ">1.5").unwrap();
        assert_eq!(clause.op, RangeOp::Gt);
        assert_eq!(clause.value, RangeValue::Float(1.5));
    }

    #[test]
    fn parses_lte_int() {
        let clause = parse_range_string(RangeField::Height, "<=100").unwrap();
        assert_eq!(clause.op, RangeOp::Lte);
        assert_eq!(clause.value, RangeValue::Int(100));
    }

    #[test]
    fn rejects_missing_operator() {
        assert!(parse_range_string(RangeField::Height, "100").is_err());
    }

    #[test]
    fn rejects_malformed_value() {
        assert!(parse_range_string(RangeField::Height, "<abc").is_err());
    }
}
