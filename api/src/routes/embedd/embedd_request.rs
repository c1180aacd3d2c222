use chrono::{Days, NaiveDate};
use serde::Deserialize;

use crate::error_handler::AppError;

/// Query string of `GET /embedd`.
#[derive(Debug, Default, Deserialize)]
pub struct EmbeddRequest {
    /// `YYYY-MM-DD`; only rows dated strictly after it are processed.
    #[serde(default)]
    pub filter_date: Option<String>,
}

impl EmbeddRequest {
    /// Resolves the threshold date.
    ///
    /// An absent or blank `filter_date` means `today - lookback_days`.
    pub fn threshold(&self, today: NaiveDate, lookback_days: u32) -> Result<NaiveDate, AppError> {
        match self.filter_date.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
                AppError::BadRequest(format!("invalid filter_date `{raw}` (expected YYYY-MM-DD): {e}"))
            }),
            None => today
                .checked_sub_days(Days::new(u64::from(lookback_days)))
                .ok_or_else(|| AppError::BadRequest("look-back window is out of range".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn req(filter_date: Option<&str>) -> EmbeddRequest {
        EmbeddRequest {
            filter_date: filter_date.map(str::to_string),
        }
    }

    #[test]
    fn explicit_date_is_used_verbatim() {
        assert_eq!(
            req(Some("2024-03-01")).threshold(day("2024-03-15"), 8).unwrap(),
            day("2024-03-01")
        );
    }

    #[test]
    fn missing_or_blank_date_looks_back_eight_days() {
        let today = day("2024-03-15");
        assert_eq!(req(None).threshold(today, 8).unwrap(), day("2024-03-07"));
        assert_eq!(req(Some("")).threshold(today, 8).unwrap(), day("2024-03-07"));
        assert_eq!(req(None).threshold(today, 0).unwrap(), today);
    }

    #[test]
    fn malformed_date_is_a_bad_request() {
        for bad in ["15/03/2024", "2024-02-30", "yesterday", "2024-03-01' OR 1=1 --"] {
            let err = req(Some(bad)).threshold(day("2024-03-15"), 8).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{bad}");
        }
    }
}
