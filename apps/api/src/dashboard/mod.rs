//! Dashboard view model: the owner's applications plus filter, search and view
//! mode, with the derived overview figures (KPIs, recent activity, monthly chart)
//! and the Kanban board. Serializable so it can be handed to any view layer.

pub mod board;
pub mod handlers;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::application::{ApplicationRecord, ApplicationStatus};

const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Overview,
    Applications,
    Board,
}

/// `ALL` or a single status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Only(ApplicationStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: ApplicationStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() || s.trim().eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

impl TryFrom<String> for StatusFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("ALL"),
            StatusFilter::Only(status) => write!(f, "{status}"),
        }
    }
}

impl From<StatusFilter> for String {
    fn from(filter: StatusFilter) -> Self {
        filter.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Kpis {
    pub total: usize,
    pub applied: usize,
    pub interviews: usize,
    pub offers: usize,
    pub rejected: usize,
}

/// Applications per calendar month of the originating email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityPoint {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct BoardColumn<'a> {
    pub status: ApplicationStatus,
    pub cards: Vec<&'a ApplicationRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardView {
    pub applications: Vec<ApplicationRecord>,
    #[serde(default)]
    pub filter: StatusFilter,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub view: ViewMode,
    /// Record open in the detail panel.
    #[serde(default)]
    pub selected: Option<Uuid>,
}

/// What a view layer needs to render the current view mode.
#[derive(Debug, Serialize)]
pub struct DashboardSnapshot<'a> {
    pub view: ViewMode,
    pub filter: StatusFilter,
    pub search: &'a str,
    pub kpis: Kpis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<&'a ApplicationRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent: Option<Vec<&'a ApplicationRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<Vec<ActivityPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applications: Option<Vec<&'a ApplicationRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<Vec<BoardColumn<'a>>>,
}

impl DashboardView {
    pub fn new(applications: Vec<ApplicationRecord>) -> Self {
        Self {
            applications,
            ..Self::default()
        }
    }

    pub fn find(&self, id: Uuid) -> Option<&ApplicationRecord> {
        self.applications.iter().find(|a| a.id == id)
    }

    /// The selected record, if it is still part of the view.
    pub fn selected(&self) -> Option<&ApplicationRecord> {
        self.selected.and_then(|id| self.find(id))
    }

    /// Search (company or role, case-insensitive) AND status filter.
    pub fn filtered(&self) -> Vec<&ApplicationRecord> {
        let needle = self.search.trim().to_lowercase();
        self.applications
            .iter()
            .filter(|a| {
                needle.is_empty()
                    || a.company.to_lowercase().contains(&needle)
                    || a.role.to_lowercase().contains(&needle)
            })
            .filter(|a| self.filter.matches(a.status))
            .collect()
    }

    pub fn kpis(&self) -> Kpis {
        let count = |s: ApplicationStatus| self.applications.iter().filter(|a| a.status == s).count();
        Kpis {
            total: self.applications.len(),
            applied: count(ApplicationStatus::Applied),
            interviews: count(ApplicationStatus::Interview),
            offers: count(ApplicationStatus::Offer),
            rejected: count(ApplicationStatus::Rejected),
        }
    }

    pub fn recent(&self, limit: usize) -> Vec<&ApplicationRecord> {
        let mut sorted: Vec<_> = self.applications.iter().collect();
        sorted.sort_by(|a, b| b.email_date.cmp(&a.email_date));
        sorted.truncate(limit);
        sorted
    }

    /// Oldest month first.
    pub fn activity(&self) -> Vec<ActivityPoint> {
        let mut months: BTreeMap<(i32, u32), (String, usize)> = BTreeMap::new();
        for app in &self.applications {
            let key = (app.email_date.year(), app.email_date.month());
            months
                .entry(key)
                .or_insert_with(|| (app.email_date.format("%b").to_string(), 0))
                .1 += 1;
        }
        months
            .into_iter()
            .map(|((year, month), (label, count))| ActivityPoint {
                year,
                month,
                label,
                count,
            })
            .collect()
    }

    /// One column per status in fixed order, cards newest first.
    pub fn board(&self) -> Vec<BoardColumn<'_>> {
        let ordered = self.recent(usize::MAX);
        ApplicationStatus::ALL
            .iter()
            .map(|&status| BoardColumn {
                status,
                cards: ordered
                    .iter()
                    .copied()
                    .filter(|a| a.status == status)
                    .collect(),
            })
            .collect()
    }

    pub fn snapshot(&self) -> DashboardSnapshot<'_> {
        let mut snapshot = DashboardSnapshot {
            view: self.view,
            filter: self.filter,
            search: &self.search,
            kpis: self.kpis(),
            selected: self.selected(),
            recent: None,
            activity: None,
            applications: None,
            board: None,
        };
        match self.view {
            ViewMode::Overview => {
                snapshot.recent = Some(self.recent(RECENT_LIMIT));
                snapshot.activity = Some(self.activity());
            }
            ViewMode::Applications => snapshot.applications = Some(self.filtered()),
            ViewMode::Board => snapshot.board = Some(self.board()),
        }
        snapshot
    }
}
