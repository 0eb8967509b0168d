// Lead and contact list queries backing the dashboard screens

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{ContactStatus, EmailContact, Lead, LeadStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSort {
    #[default]
    Newest,
    Oldest,
    Score,
    Name,
}

/// Filters accepted by `GET /v1/leads`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadQuery {
    pub status: Option<LeadStatus>,
    pub funnel_id: Option<i32>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort: LeadSort,
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl LeadQuery {
    fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Search matches name, email or source, case-insensitively
    pub fn matches(&self, lead: &Lead) -> bool {
        if self.status.is_some_and(|status| lead.status != status) {
            return false;
        }
        if self.funnel_id.is_some() && lead.funnel_id != self.funnel_id {
            return false;
        }
        match self.needle() {
            None => true,
            Some(needle) => {
                contains_folded(&lead.name, &needle)
                    || contains_folded(&lead.email, &needle)
                    || lead
                        .source
                        .as_deref()
                        .is_some_and(|source| contains_folded(source, &needle))
            },
        }
    }

    pub fn apply(&self, leads: Vec<Lead>) -> Vec<Lead> {
        let mut leads: Vec<Lead> = leads.into_iter().filter(|l| self.matches(l)).collect();
        match self.sort {
            LeadSort::Newest => leads.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))),
            LeadSort::Oldest => leads.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id))),
            LeadSort::Score => leads.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id))),
            LeadSort::Name => leads.sort_by(|a, b| {
                a.name
                    .to_lowercase()
                    .cmp(&b.name.to_lowercase())
                    .then(a.id.cmp(&b.id))
            }),
        }
        leads
    }
}

/// Pipeline counts shown above the lead table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadSummary {
    pub total: usize,
    pub by_status: BTreeMap<&'static str, usize>,
    pub average_score: f64,
}

pub fn summarize_leads(leads: &[Lead]) -> LeadSummary {
    let mut by_status: BTreeMap<&'static str, usize> =
        LeadStatus::VALUES.iter().map(|status| (*status, 0)).collect();
    for lead in leads {
        *by_status.entry(lead.status.as_str()).or_default() += 1;
    }

    let average_score = if leads.is_empty() {
        0.0
    } else {
        leads.iter().map(|l| f64::from(l.score)).sum::<f64>() / leads.len() as f64
    };

    LeadSummary {
        total: leads.len(),
        by_status,
        average_score,
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactQuery {
    pub status: Option<ContactStatus>,
    pub tag: Option<String>,
    pub search: Option<String>,
}

impl ContactQuery {
    pub fn matches(&self, contact: &EmailContact) -> bool {
        if self.status.is_some_and(|status| contact.status != status) {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !contact.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                return false;
            }
        }
        let Some(needle) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
        else {
            return true;
        };

        contains_folded(&contact.email, &needle)
            || contact
                .full_name()
                .is_some_and(|name| contains_folded(&name, &needle))
    }

    /// Matching contacts in id order
    pub fn apply(&self, contacts: Vec<EmailContact>) -> Vec<EmailContact> {
        let mut contacts: Vec<EmailContact> =
            contacts.into_iter().filter(|c| self.matches(c)).collect();
        contacts.sort_by_key(|c| c.id);
        contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn lead(id: i32, name: &str, status: LeadStatus, score: i32, age_days: i64) -> Lead {
        let created = Utc::now() - Duration::days(age_days);
        Lead {
            id,
            user_id: Some(1),
            funnel_id: None,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            source: Some("webinar".to_string()),
            status,
            score,
            notes: None,
            custom_fields: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn sample() -> Vec<Lead> {
        vec![
            lead(1, "Ada", LeadStatus::New, 10, 3),
            lead(2, "Grace", LeadStatus::Qualified, 80, 1),
            lead(3, "Linus", LeadStatus::Qualified, 40, 2),
        ]
    }

    #[test]
    fn test_filter_by_status_sorted_by_score() {
        let query = LeadQuery {
            status: Some(LeadStatus::Qualified),
            sort: LeadSort::Score,
            ..Default::default()
        };
        let ids: Vec<i32> = query.apply(sample()).iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        let ids: Vec<i32> = LeadQuery::default()
            .apply(sample())
            .iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let query = LeadQuery {
            search: Some("  GRACE ".to_string()),
            ..Default::default()
        };
        let found = query.apply(sample());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Grace");
    }

    #[test]
    fn test_summary_counts_every_status() {
        let summary = summarize_leads(&sample());
        assert_eq!(summary.total, 3);
        assert_eq!(summary.by_status["qualified"], 2);
        assert_eq!(summary.by_status["converted"], 0);
        assert!((summary.average_score - 130.0 / 3.0).abs() < f64::EPSILON * 100.0);
    }
}
