// Identity generator - session-unique widget ids
use crate::domain::widget::WidgetId;
use chrono::Utc;
use std::collections::HashSet;
use uuid::Uuid;

const ID_PREFIX: &str = "comp";
const SUFFIX_LEN: usize = 6;

/// Issues `comp-<unix millis>-<random suffix>` ids and never hands out the same
/// value twice in one session, including ids restored from a snapshot.
#[derive(Debug, Default)]
pub struct IdGenerator {
    issued: HashSet<WidgetId>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_id(&mut self) -> WidgetId {
        loop {
            let millis = Utc::now().timestamp_millis();
            let random = Uuid::new_v4().simple().to_string();
            let candidate = WidgetId::new(format!(
                "{}-{}-{}",
                ID_PREFIX,
                millis,
                &random[..SUFFIX_LEN]
            ));

            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
            tracing::debug!("Widget id collision on {}, retrying", candidate);
        }
    }

    /// Marks an externally known id (e.g. loaded from a snapshot) as taken
    pub fn reserve(&mut self, id: &WidgetId) {
        self.issued.insert(id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let mut ids = IdGenerator::new();
        let issued: HashSet<WidgetId> = (0..5_000).map(|_| ids.new_id()).collect();
        assert_eq!(issued.len(), 5_000);
    }

    #[test]
    fn test_id_format() {
        let id = IdGenerator::new().new_id();
        let parts: Vec<&str> = id.as_str().split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "comp");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), SUFFIX_LEN);
    }

    #[test]
    fn test_reserved_ids_are_not_reissued() {
        let mut ids = IdGenerator::new();
        let first = ids.new_id();
        ids.reserve(&first);
        assert_ne!(ids.new_id(), first);
    }
}
