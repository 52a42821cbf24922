use crate::domain::EventRow;

/// Number of steps in the misery score bar (and its color palette).
pub const MISERY_PALETTE_SIZE: u32 = 10;

const MISERY_PREFIX: &str = "user_misery";
const UNIQUE_USER_FIELD: &str = "count_unique_user";

/// A computed misery score, ready for the score-bar renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct MiseryScore {
    /// Filled bar segments, 0..=MISERY_PALETTE_SIZE.
    pub score: u32,
    pub affected_users: f64,
    pub total_users: f64,
    pub percentage: f64,
    /// Users counted as miserable waited longer than this.
    pub threshold_ms: u64,
}

impl MiseryScore {
    pub fn tooltip(&self) -> String {
        format!(
            "{} out of {} ({:.1}%) unique users waited more than {}ms",
            self.affected_users, self.total_users, self.percentage, self.threshold_ms
        )
    }
}

/// First field on the row whose name carries the misery prefix, in key
/// order.
pub fn find_misery_field(row: &EventRow) -> Option<&str> {
    row.field_names()
        .find(|name| name.starts_with(MISERY_PREFIX))
}

/// The response-time limit encoded in the field name's trailing digits:
/// `user_misery_300` means a 300ms limit.
pub fn misery_limit(field: &str) -> Option<u64> {
    let digits: String = field
        .chars()
        .rev()
        .take_while(char::is_ascii_digit)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().ok()
}

/// Computes the score for `misery_field` on `row`, or None when either the
/// misery value or the unique-user count is unavailable (the renderer then
/// falls back to the raw value or a placeholder).
pub fn compute_misery(row: &EventRow, misery_field: &str) -> Option<MiseryScore> {
    let misery = row.number(misery_field)?;
    let unique_users = row.number(UNIQUE_USER_FIELD)?;

    let total = unique_users.max(1.0);
    let ratio = misery / total;
    let score = (ratio * f64::from(MISERY_PALETTE_SIZE)).floor() as u32;

    // Users counted as miserable waited more than 4x the response-time
    // limit encoded in the field name.
    let threshold_ms = misery_limit(misery_field).unwrap_or(0) * 4;

    Some(MiseryScore {
        score: score.min(MISERY_PALETTE_SIZE),
        affected_users: misery,
        total_users: unique_users,
        percentage: ratio * 100.0,
        threshold_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finds_first_misery_field_in_key_order() {
        let row = EventRow::from([
            ("user_misery_600", json!(4)),
            ("user_misery_300", json!(10)),
            ("count", json!(2)),
        ]);
        // BTreeMap order: user_misery_300 before user_misery_600.
        assert_eq!(find_misery_field(&row), Some("user_misery_300"));
    }

    #[test]
    fn no_misery_field_yields_none() {
        let row = EventRow::from([("count", json!(2))]);
        assert_eq!(find_misery_field(&row), None);
    }

    #[test]
    fn parses_limit_from_trailing_digits() {
        assert_eq!(misery_limit("user_misery_300"), Some(300));
        assert_eq!(misery_limit("user_misery_4000"), Some(4000));
        assert_eq!(misery_limit("user_misery"), None);
    }

    #[test]
    fn computes_score_and_threshold() {
        let row = EventRow::from([
            ("count_unique_user", json!(100)),
            ("user_misery_300", json!(10)),
        ]);
        let score = compute_misery(&row, "user_misery_300").unwrap();
        assert_eq!(score.score, 1);
        assert_eq!(score.threshold_ms, 1200);
        assert!((score.percentage - 10.0).abs() < f64::EPSILON);
        assert_eq!(
            score.tooltip(),
            "10 out of 100 (10.0%) unique users waited more than 1200ms"
        );
    }

    #[test]
    fn zero_unique_users_clamps_the_denominator() {
        let row = EventRow::from([
            ("count_unique_user", json!(0)),
            ("user_misery_300", json!(0.5)),
        ]);
        let score = compute_misery(&row, "user_misery_300").unwrap();
        assert_eq!(score.score, 5);
    }

    #[test]
    fn missing_unique_user_count_yields_none() {
        let row = EventRow::from([("user_misery_300", json!(10))]);
        assert_eq!(compute_misery(&row, "user_misery_300"), None);
    }
}
