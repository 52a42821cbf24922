use crate::domain::{FieldType, MetaTypes};

/// Fields with custom rendering and their declared sort keys.
///
/// `issue` has no direct sort column; everything else sorts on itself.
/// Lookup is exact, first match wins in table order.
pub const SPECIAL_FIELD_SORT_KEYS: &[(&str, Option<&str>)] = &[
    ("id", Some("id")),
    ("issue.id", Some("issue.id")),
    ("issue", None),
    ("project", Some("project")),
    ("user", Some("user")),
    ("release", Some("release")),
];

/// Known aggregate-function name prefixes and whether the aggregate can be
/// used as a sort column. Longer prefixes come first so `count_unique(...)`
/// is not swallowed by `count`.
pub const AGGREGATE_FUNCTIONS: &[(&str, bool)] = &[
    ("count_unique", true),
    ("count", true),
    ("failure_rate", true),
    ("user_misery", true),
    ("percentile", true),
    ("apdex", true),
    ("p100", true),
    ("p99", true),
    ("p95", true),
    ("p75", true),
    ("p50", true),
    ("last_seen", true),
    ("eps", true),
    ("epm", true),
];

/// Every generic formatter type is sortable. Kept as an explicit map so the
/// sort resolver and the formatter registry cannot drift apart.
pub fn sortable_field_type(field_type: FieldType) -> bool {
    match field_type {
        FieldType::Boolean
        | FieldType::Date
        | FieldType::Duration
        | FieldType::Integer
        | FieldType::Number
        | FieldType::Percentage
        | FieldType::String => true,
    }
}

pub fn special_field_sort_key(field: &str) -> Option<Option<&'static str>> {
    SPECIAL_FIELD_SORT_KEYS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, sort)| *sort)
}

/// Normalizes a function expression to its column alias:
/// `count_unique(user)` becomes `count_unique_user`. Every non-word
/// character maps to `_`; leading and trailing underscores are trimmed.
pub fn aggregate_alias(field: &str) -> String {
    let replaced: String = field
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    replaced.trim_matches('_').to_string()
}

/// Whether `field` names a known aggregate, and if so whether that
/// aggregate sorts.
pub fn aggregate_sortable(field: &str) -> Option<bool> {
    AGGREGATE_FUNCTIONS
        .iter()
        .find(|(prefix, _)| field.starts_with(prefix))
        .map(|(_, sortable)| *sortable)
}

/// Resolves the sort column for `field`, or None when the field cannot be
/// sorted on.
///
/// Special fields answer first (with their declared key, possibly none).
/// Without metadata the field is assumed sortable as-is. Aggregates answer
/// by prefix; plain fields by their meta-declared type's sortability.
pub fn get_sort_field(field: &str, meta: Option<&MetaTypes>) -> Option<String> {
    if let Some(sort_key) = special_field_sort_key(field) {
        return sort_key.map(str::to_string);
    }

    let Some(meta) = meta else {
        return Some(field.to_string());
    };

    if let Some(sortable) = aggregate_sortable(field) {
        return sortable.then(|| field.to_string());
    }

    match meta.get(field) {
        Some(field_type) if sortable_field_type(*field_type) => Some(field.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn meta(entries: &[(&str, FieldType)]) -> MetaTypes {
        entries
            .iter()
            .map(|(field, field_type)| (field.to_string(), *field_type))
            .collect()
    }

    #[test]
    fn aggregate_alias_flattens_function_expressions() {
        assert_eq!(aggregate_alias("count_unique(user)"), "count_unique_user");
        assert_eq!(aggregate_alias("p95()"), "p95");
        assert_eq!(
            aggregate_alias("percentile(transaction.duration, 0.95)"),
            "percentile_transaction_duration__0_95"
        );
        assert_eq!(aggregate_alias("plain_field"), "plain_field");
    }

    #[test]
    fn issue_never_sorts_regardless_of_meta() {
        let meta = meta(&[("issue", FieldType::String)]);
        assert_eq!(get_sort_field("issue", Some(&meta)), None);
        assert_eq!(get_sort_field("issue", None), None);
    }

    #[test]
    fn missing_meta_assumes_field_is_sortable() {
        assert_eq!(get_sort_field("id", None), Some("id".to_string()));
        assert_eq!(
            get_sort_field("anything.else", None),
            Some("anything.else".to_string())
        );
    }

    #[test]
    fn special_fields_declare_their_own_sort_keys() {
        let meta = meta(&[]);
        assert_eq!(
            get_sort_field("issue.id", Some(&meta)),
            Some("issue.id".to_string())
        );
        assert_eq!(
            get_sort_field("release", Some(&meta)),
            Some("release".to_string())
        );
    }

    #[test]
    fn aggregates_sort_by_prefix_match() {
        let meta = meta(&[]);
        assert_eq!(
            get_sort_field("count_unique_user", Some(&meta)),
            Some("count_unique_user".to_string())
        );
        assert_eq!(
            get_sort_field("user_misery_300", Some(&meta)),
            Some("user_misery_300".to_string())
        );
    }

    #[test]
    fn plain_fields_sort_only_with_a_known_meta_type() {
        let typed = meta(&[("transaction.duration", FieldType::Duration)]);
        assert_eq!(
            get_sort_field("transaction.duration", Some(&typed)),
            Some("transaction.duration".to_string())
        );
        assert_eq!(get_sort_field("undeclared", Some(&typed)), None);
    }
}
