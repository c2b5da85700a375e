/// Maps a percentage to a star tier using ascending upper-bound thresholds.
///
/// Returns `1 + index` of the first threshold `>= percentage`, or the top
/// tier when the percentage exceeds every threshold. `None` only when
/// `thresholds` is empty, which `roster::validate` rules out for any
/// accepted dataset.
pub fn star_rating(percentage: i32, thresholds: &[i32]) -> Option<usize> {
    if thresholds.is_empty() {
        return None;
    }

    let tier = thresholds
        .iter()
        .position(|&upper| percentage <= upper)
        .map_or(thresholds.len(), |index| index + 1);
    Some(tier)
}

/// Renders a tier as filled and empty stars, e.g. `★★★☆☆`.
pub fn stars_label(stars: usize, max_stars: usize) -> String {
    let filled = stars.min(max_stars);
    let mut label = "★".repeat(filled);
    label.push_str(&"☆".repeat(max_stars - filled));
    label
}
