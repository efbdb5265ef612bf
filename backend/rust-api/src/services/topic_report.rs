use std::collections::HashMap;

use crate::{
    models::reporting::{CorrectionRecord, TopicSummary},
    services::grading::percent,
    utils::text::{topic_key, topic_label},
};

/// Groups graded questions by topic, weakest topics first.
///
/// Topics are bucketed by their normalized key, so labels differing only in
/// case or accents share a bucket; the first label seen is the one reported.
/// Ordering is by wrong answers (descending), then accuracy (ascending), and
/// otherwise keeps first-seen order.
pub fn summarize_topics(records: &[CorrectionRecord]) -> Vec<TopicSummary> {
    let mut buckets: Vec<TopicSummary> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = topic_key(&record.topic);
        let slot = *by_key.entry(key).or_insert_with(|| {
            buckets.push(TopicSummary {
                topic: topic_label(&record.topic),
                total: 0,
                correct: 0,
                wrong: 0,
                accuracy_percent: 0,
            });
            buckets.len() - 1
        });

        let bucket = &mut buckets[slot];
        bucket.total += 1;
        if record.is_correct {
            bucket.correct += 1;
        } else {
            bucket.wrong += 1;
        }
    }

    for bucket in &mut buckets {
        bucket.accuracy_percent = percent(bucket.correct, bucket.total);
    }

    buckets.sort_by(|x, y| {
        y.wrong
            .cmp(&x.wrong)
            .then(x.accuracy_percent.cmp(&y.accuracy_percent))
    });
    buckets
}
