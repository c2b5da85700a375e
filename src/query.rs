use clap::ValueEnum;
use feruca::Collator;

use crate::models::RankedStudent;
use crate::ranking::compare_names;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    #[default]
    Rank,
    Name,
    Percentage,
}

#[derive(Debug, Clone, Default)]
pub struct LeaderboardFilter {
    pub search: Option<String>,
    pub group_id: Option<String>,
    pub representatives_only: bool,
    pub sort: SortKey,
}

impl LeaderboardFilter {
    fn matches(&self, student: &RankedStudent) -> bool {
        if let Some(query) = self.search.as_deref().map(str::to_lowercase) {
            let hit = student.name.to_lowercase().contains(&query)
                || student.group_name.to_lowercase().contains(&query)
                || (student.is_representative && "cr".contains(query.as_str()));
            if !hit {
                return false;
            }
        }
        if let Some(group_id) = self.group_id.as_deref() {
            if student.group_id != group_id {
                return false;
            }
        }
        !self.representatives_only || student.is_representative
    }
}

/// Narrows and reorders a leaderboard. Input is expected in rank order.
pub fn apply(ranked: Vec<RankedStudent>, filter: &LeaderboardFilter) -> Vec<RankedStudent> {
    let mut rows: Vec<RankedStudent> = ranked
        .into_iter()
        .filter(|student| filter.matches(student))
        .collect();

    match filter.sort {
        SortKey::Rank => {}
        SortKey::Name => {
            let mut collator = Collator::default();
            rows.sort_by(|a, b| compare_names(&mut collator, &a.name, &b.name));
        }
        SortKey::Percentage => rows.sort_by(|a, b| b.percentage.cmp(&a.percentage)),
    }
    rows
}
