// Due-date triage buckets

use crate::models::{Request, Status};
use chrono::{Local, NaiveDate};

/// Requests needing attention, derived fresh from a collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Triage {
    /// Due before today and not done
    pub overdue: Vec<Request>,
    /// Due today, any status
    pub due_today: Vec<Request>,
}

impl Triage {
    pub fn is_empty(&self) -> bool {
        self.overdue.is_empty() && self.due_today.is_empty()
    }
}

/// Bucket requests against the local calendar date
pub fn triage(requests: &[Request]) -> Triage {
    triage_on(requests, Local::now().date_naive())
}

/// Bucket requests against an explicit `today`
pub fn triage_on(requests: &[Request], today: NaiveDate) -> Triage {
    let mut buckets = Triage::default();
    for request in requests {
        let Some(due) = request.due_date else {
            continue;
        };
        if due < today {
            if request.status != Status::Done {
                buckets.overdue.push(request.clone());
            }
        } else if due == today {
            buckets.due_today.push(request.clone());
        }
    }
    buckets
}
