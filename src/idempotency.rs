use chrono::NaiveDate;
use sha2::{Digest, Sha256};

/// Deterministic document key for one logical event.
///
/// Subject and title are trimmed and lower-cased so re-collected events overwrite
/// their earlier copy instead of piling up beside it.
pub fn compute_event_key(subject: &str, date: NaiveDate, title: &str) -> String {
    let mut s = String::new();
    s.push_str(&subject.trim().to_lowercase());
    s.push('|');
    s.push_str(&date.format("%Y-%m-%d").to_string());
    s.push('|');
    s.push_str(&title.trim().to_lowercase());

    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hex::encode(hasher.finalize())
}

/// Storage key for an event within one partition.
///
/// Two partitions holding the same event keep separate documents; both still carry the
/// shared `event_key` so calendar entries can be joined back to either.
pub fn compute_document_key(partition: &str, event_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(partition.trim().as_bytes());
    hasher.update(b"|");
    hasher.update(event_key.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn same_event_same_key() {
        let a = compute_event_key("BTS", date(), "World Tour Seoul");
        let b = compute_event_key(" bts ", date(), "world tour seoul ");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn any_component_changes_key() {
        let base = compute_event_key("BTS", date(), "World Tour");
        assert_ne!(base, compute_event_key("IU", date(), "World Tour"));
        assert_ne!(base, compute_event_key("BTS", date().succ_opt().unwrap(), "World Tour"));
        assert_ne!(base, compute_event_key("BTS", date(), "Fan Meeting"));
    }

    #[test]
    fn document_key_is_scoped_by_partition() {
        let event_key = compute_event_key("IU", date(), "Arena");
        let alice = compute_document_key("alice", &event_key);
        assert_eq!(alice, compute_document_key("alice", &event_key));
        assert_ne!(alice, compute_document_key("bob", &event_key));
        assert_ne!(alice, event_key);
    }
}
