// Query filtering and ordering for requests

use crate::models::{Priority, Request, Status};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Which requests a query keeps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    /// Case-insensitive substring matched against name or description
    pub search: Option<String>,
    /// `None` matches every status
    pub status: Option<Status>,
    /// `None` matches every priority
    pub priority: Option<Priority>,
}

impl FilterSpec {
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn matches(&self, request: &Request) -> bool {
        if self.status.is_some_and(|status| request.status != status) {
            return false;
        }
        if self.priority.is_some_and(|priority| request.priority != priority) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                request.name.to_lowercase().contains(&term) || request.description.to_lowercase().contains(&term)
            }
        }
    }
}

/// Display order of a query. Pinned requests always come first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    Due,
    Priority,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Newest => "newest",
            SortKey::Oldest => "oldest",
            SortKey::Due => "due",
            SortKey::Priority => "priority",
        }
    }

    fn compare(self, a: &Request, b: &Request) -> Ordering {
        match self {
            SortKey::Newest => b.created_at.cmp(&a.created_at),
            SortKey::Oldest => a.created_at.cmp(&b.created_at),
            SortKey::Due => match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SortKey::Priority => b.priority.rank().cmp(&a.priority.rank()),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(SortKey::Newest),
            "oldest" => Ok(SortKey::Oldest),
            "due" => Ok(SortKey::Due),
            "priority" => Ok(SortKey::Priority),
            other => Err(format!(
                "unknown sort key: {} (expected newest, oldest, due or priority)",
                other
            )),
        }
    }
}

/// Filter and order a collection without touching it
///
/// The sort is stable, so requests with equal keys keep their collection order.
pub fn query(requests: &[Request], filter: &FilterSpec, sort: SortKey) -> Vec<Request> {
    let mut results: Vec<Request> = requests.iter().filter(|r| filter.matches(r)).cloned().collect();
    results.sort_by(|a, b| b.pinned.cmp(&a.pinned).then_with(|| sort.compare(a, b)));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn request(id: &str, minutes: i64) -> Request {
        Request {
            id: id.to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes),
            name: format!("Requester {}", id),
            description: format!("Part {}", id),
            due_date: None,
            priority: Priority::Normal,
            status: Status::New,
            dev_notes: String::new(),
            pinned: false,
            synced: true,
        }
    }

    fn ids(requests: &[Request]) -> Vec<&str> {
        requests.iter().map(|r| r.id.as_str()).collect()
    }

    fn mixed_collection() -> Vec<Request> {
        let mut a = request("a", 0);
        a.priority = Priority::Low;
        a.due_date = NaiveDate::from_ymd_opt(2026, 10, 5);
        let mut b = request("b", 10);
        b.priority = Priority::Urgent;
        b.pinned = true;
        let mut c = request("c", 20);
        c.priority = Priority::High;
        c.due_date = NaiveDate::from_ymd_opt(2026, 10, 3);
        let mut d = request("d", 30);
        d.priority = Priority::Urgent;
        d.status = Status::Done;
        let mut e = request("e", 40);
        e.pinned = true;
        e.due_date = NaiveDate::from_ymd_opt(2026, 10, 9);
        vec![e, d, c, b, a]
    }

    #[test]
    fn test_sort_newest_and_oldest() {
        let collection = mixed_collection();
        let newest = query(&collection, &FilterSpec::default(), SortKey::Newest);
        assert_eq!(ids(&newest), vec!["e", "b", "d", "c", "a"]);

        let oldest = query(&collection, &FilterSpec::default(), SortKey::Oldest);
        assert_eq!(ids(&oldest), vec!["b", "e", "a", "c", "d"]);
    }

    #[test]
    fn test_sort_due_puts_missing_dates_last() {
        let collection = mixed_collection();
        let due = query(&collection, &FilterSpec::default(), SortKey::Due);
        assert_eq!(ids(&due), vec!["e", "b", "c", "a", "d"]);
    }

    #[test]
    fn test_sort_priority_non_increasing_within_partition() {
        let collection = mixed_collection();
        let sorted = query(&collection, &FilterSpec::default(), SortKey::Priority);
        assert_eq!(ids(&sorted), vec!["b", "e", "d", "c", "a"]);

        for pinned in [true, false] {
            let ranks: Vec<u8> = sorted
                .iter()
                .filter(|r| r.pinned == pinned)
                .map(|r| r.priority.rank())
                .collect();
            assert!(ranks.windows(2).all(|w| w[0] >= w[1]), "ranks {:?}", ranks);
        }
    }

    #[test]
    fn test_pinned_first_for_every_key() {
        let collection = mixed_collection();
        for key in [SortKey::Newest, SortKey::Oldest, SortKey::Due, SortKey::Priority] {
            let sorted = query(&collection, &FilterSpec::default(), key);
            let first_unpinned = sorted.iter().position(|r| !r.pinned).unwrap();
            assert!(sorted[first_unpinned..].iter().all(|r| !r.pinned), "key {}", key);
        }
    }

    #[test]
    fn test_stable_for_equal_keys() {
        let collection = vec![request("x", 0), request("y", 0), request("z", 0)];
        let sorted = query(&collection, &FilterSpec::default(), SortKey::Priority);
        assert_eq!(ids(&sorted), vec!["x", "y", "z"]);
        let sorted = query(&collection, &FilterSpec::default(), SortKey::Due);
        assert_eq!(ids(&sorted), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_query_does_not_mutate_input() {
        let collection = mixed_collection();
        let before = collection.clone();
        let sorted = query(&collection, &FilterSpec::default().search("part"), SortKey::Oldest);
        assert_eq!(collection, before);
        assert!(sorted.len() <= collection.len());
    }

    #[test]
    fn test_search_is_case_insensitive_over_name_and_description() {
        let mut collection = mixed_collection();
        collection[2].description = "Spool HOLDER for the MK4".to_string();
        collection[4].name = "Holden".to_string();

        let hits = query(&collection, &FilterSpec::default().search("hold"), SortKey::Newest);
        assert_eq!(ids(&hits), vec!["c", "a"]);

        let all = query(&collection, &FilterSpec::default().search("   "), SortKey::Newest);
        assert_eq!(all.len(), collection.len());
    }

    #[test]
    fn test_status_and_priority_filters() {
        let collection = mixed_collection();
        let done = query(&collection, &FilterSpec::default().status(Status::Done), SortKey::Newest);
        assert_eq!(ids(&done), vec!["d"]);

        let urgent = query(
            &collection,
            &FilterSpec::default().priority(Priority::Urgent),
            SortKey::Newest,
        );
        assert_eq!(ids(&urgent), vec!["b", "d"]);

        let none = query(
            &collection,
            &FilterSpec::default().priority(Priority::Urgent).status(Status::Archived),
            SortKey::Newest,
        );
        assert!(none.is_empty());
    }

    #[test]
    fn test_sort_key_parse_and_display() {
        assert_eq!("Due".parse::<SortKey>().unwrap(), SortKey::Due);
        assert_eq!(SortKey::Priority.to_string(), "priority");
        assert!("alphabetical".parse::<SortKey>().is_err());
    }
}
