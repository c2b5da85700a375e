use std::cmp::Ordering;

use feruca::Collator;

use crate::models::{Dataset, RankedStudent};

pub const UNKNOWN_GROUP: &str = "Unknown";

/// Builds the leaderboard: percentage descending, then name, then id, with
/// standard competition ranks ("1224") where only equal percentages tie.
pub fn compute_ranks(dataset: &Dataset) -> Vec<RankedStudent> {
    let mut ranked: Vec<RankedStudent> = dataset
        .students
        .iter()
        .map(|student| {
            let group = dataset.group(&student.group_id);
            RankedStudent {
                id: student.id.clone(),
                name: student.name.clone(),
                group_id: student.group_id.clone(),
                group_name: group.map_or_else(|| UNKNOWN_GROUP.to_string(), |g| g.name.clone()),
                photo: student.photo.clone(),
                percentage: student.percentage,
                is_representative: group
                    .and_then(|g| g.cr.as_deref())
                    .is_some_and(|cr| cr == student.id),
                rank: 0,
            }
        })
        .collect();

    let mut collator = Collator::default();
    ranked.sort_by(|a, b| {
        b.percentage
            .cmp(&a.percentage)
            .then_with(|| compare_names(&mut collator, &a.name, &b.name))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut rank = 1;
    for index in 0..ranked.len() {
        if index > 0 && ranked[index - 1].percentage != ranked[index].percentage {
            rank = index + 1;
        }
        ranked[index].rank = rank;
    }

    tracing::debug!(students = ranked.len(), "computed ranks");
    ranked
}

/// Unicode collation order (CLDR root): accents and case only matter when
/// the base letters are equal, and lowercase sorts first.
pub fn compare_names(collator: &mut Collator, a: &str, b: &str) -> Ordering {
    collator.collate(a, b)
}
