use crate::store::JobRecord;

/// Case-insensitive match on display name or key. A blank term matches all.
pub fn matches_filter(record: &JobRecord, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    record.display_name.to_lowercase().contains(&term)
        || record.key.as_str().to_lowercase().contains(&term)
}

pub fn filter_records<'a>(records: &'a [JobRecord], term: &str) -> Vec<&'a JobRecord> {
    records.iter().filter(|r| matches_filter(r, term)).collect()
}
