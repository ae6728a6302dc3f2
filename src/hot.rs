//! Hot-feed scoring.
//!
//! score = likes * 2 + comments * 1, plus a recency bonus for posts younger
//! than 24 hours: (1 - age_hours / 24) * 10. A brand-new post gets the full
//! 10-point boost; the bonus decays linearly to zero at the 24-hour mark and
//! stays zero afterwards.

use chrono::NaiveDateTime;

const LIKE_WEIGHT: f64 = 2.0;
const COMMENT_WEIGHT: f64 = 1.0;
const RECENCY_WINDOW_HOURS: f64 = 24.0;
const RECENCY_MAX_BONUS: f64 = 10.0;

/// Compute the hot score for one post. Pure; `now` is passed in.
pub fn hot_score(like_count: i64, comment_count: i64, created_at: NaiveDateTime, now: NaiveDateTime) -> f64 {
    let age_hours = (now - created_at).num_seconds() as f64 / 3600.0;

    let mut score = like_count as f64 * LIKE_WEIGHT + comment_count as f64 * COMMENT_WEIGHT;

    if age_hours < RECENCY_WINDOW_HOURS {
        let time_weight = 1.0 - age_hours / RECENCY_WINDOW_HOURS;
        score += time_weight * RECENCY_MAX_BONUS;
    }

    score
}

/// Sort descending by hot score. Ties order newest-first; the score alone
/// does not define a total order and callers depend on a stable result.
pub fn sort_by_hot_score<T, F>(items: &mut [T], now: NaiveDateTime, key: F)
where
    F: Fn(&T) -> (i64, i64, NaiveDateTime),
{
    items.sort_by(|a, b| {
        let (a_likes, a_comments, a_created) = key(a);
        let (b_likes, b_comments, b_created) = key(b);
        let a_score = hot_score(a_likes, a_comments, a_created, now);
        let b_score = hot_score(b_likes, b_comments, b_created, now);

        b_score
            .partial_cmp(&a_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b_created.cmp(&a_created))
    });
}
