use crate::facts::PackageRecord;
use chrono::NaiveDate;

/// Recency adjustment for a release `age_days` old.
///
/// Buckets are inclusive at their upper bound.
#[must_use]
pub const fn recency_bonus(age_days: i64) -> i64 {
    match age_days {
        i64::MIN..=30 => 3,
        31..=60 => 2,
        61..=120 => 1,
        121..=180 => 0,
        181..=270 => -1,
        271..=360 => -2,
        _ => -3,
    }
}

/// Compute the score of a record as of `today`.
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "counts far below 2^52 are exact and larger ones only need magnitude")]
pub fn score(record: &PackageRecord, today: NaiveDate) -> i64 {
    let Some(last_release) = record.last_release_date else {
        return 0;
    };

    let mut total = 0.0_f64;

    if let Some(downloads) = record.downloads.filter(|&d| d > 0) {
        total += (downloads as f64).log10();
    }

    if let Some(stars) = record.stars.filter(|&s| s > 0) {
        total += (stars as f64).log2();
    }

    let age_days = (today - last_release).num_days();
    total += recency_bonus(age_days) as f64;

    round_score(total)
}

/// Round half-to-even, so a raw score of 2.5 becomes 2 and 3.5 becomes 4.
#[expect(clippy::cast_possible_truncation, reason = "the sum of two logarithms and a small bonus is far inside i64")]
fn round_score(total: f64) -> i64 {
    total.round_ties_even() as i64
}

/// Order records by descending score, breaking ties by name.
#[must_use]
pub fn rank(mut records: Vec<PackageRecord>) -> Vec<PackageRecord> {
    records.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
    records
}
