use crate::drill_engine::{
    dataset::Dataset,
    models::CompoundRecord,
    topic_map::{build_topic_map, TopicMap, CANONICAL_TOPICS},
};

/// The dataset together with its topic map. Built once per load and shared
/// read-only by every session (wrap it in an `Arc`).
#[derive(Debug, Clone)]
pub struct QuestionBank {
    dataset: Dataset,
    topic_map: TopicMap,
}

impl QuestionBank {
    pub fn new(dataset: Dataset) -> Self {
        let topic_map = build_topic_map(&CANONICAL_TOPICS, &dataset.topics());
        QuestionBank { dataset, topic_map }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn topic_map(&self) -> &TopicMap {
        &self.topic_map
    }

    /// Records for a selection of canonical topic labels.
    pub fn pool_for<S: AsRef<str>>(&self, canonical_topics: &[S]) -> Vec<CompoundRecord> {
        let labels = self.topic_map.resolve_all(canonical_topics);
        self.dataset.filter_topics(&labels)
    }
}
