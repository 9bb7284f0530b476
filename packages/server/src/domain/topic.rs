//! Topic resolution: reducing per-participant proposals to one topic.

use std::sync::{Mutex, PoisonError};

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};

use super::{
    entity::TopicProposal,
    error::ValueObjectError,
    value_object::{ParticipantId, Topic},
};

/// Wire values that ask for a random topic.
const RANDOM_SENTINELS: [&str; 2] = ["RANDOM", "__RANDOM__"];

const DEFAULT_TOPICS: [&str; 32] = [
    "apple",
    "banana",
    "bicycle",
    "bird",
    "book",
    "butterfly",
    "car",
    "cat",
    "clock",
    "cloud",
    "cup",
    "dog",
    "donut",
    "eye",
    "fish",
    "flower",
    "guitar",
    "hamburger",
    "house",
    "ice cream",
    "key",
    "moon",
    "mountain",
    "pizza",
    "rabbit",
    "scissors",
    "snowman",
    "star",
    "sun",
    "tree",
    "umbrella",
    "whale",
];

impl TopicProposal {
    /// `None`, blank strings and the random sentinels all mean "random".
    pub fn from_request(topic: Option<String>) -> Result<Self, ValueObjectError> {
        match topic.map(|t| t.trim().to_string()) {
            None => Ok(TopicProposal::Random),
            Some(t) if t.is_empty() || RANDOM_SENTINELS.contains(&t.as_str()) => {
                Ok(TopicProposal::Random)
            }
            Some(t) => Topic::new(t).map(TopicProposal::Specific),
        }
    }
}

/// ランダム指定のときに選ばれるお題の一覧
#[derive(Debug, Clone)]
pub struct TopicCatalog {
    topics: Vec<Topic>,
}

impl TopicCatalog {
    pub fn new(topics: Vec<Topic>) -> Result<Self, ValueObjectError> {
        if topics.is_empty() {
            return Err(ValueObjectError::EmptyTopicCatalog);
        }
        Ok(Self { topics })
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn contains(&self, topic: &Topic) -> bool {
        self.topics.contains(topic)
    }
}

impl Default for TopicCatalog {
    fn default() -> Self {
        Self {
            topics: DEFAULT_TOPICS
                .iter()
                .filter_map(|t| Topic::new(t.to_string()).ok())
                .collect(),
        }
    }
}

/// 決定したお題と、その提案者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChosenTopic {
    pub topic: Topic,
    pub chosen_by: ParticipantId,
}

/// お題の決定器
///
/// 提案のうち 1 つを等確率で選ぶ（マージはしない）。ランダム指定の提案が
/// 選ばれた場合に限り、その場でカタログから抽選する。乱数はシード指定できる。
pub struct TopicResolver {
    catalog: TopicCatalog,
    rng: Mutex<StdRng>,
}

impl TopicResolver {
    pub fn new(catalog: TopicCatalog, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            catalog,
            rng: Mutex::new(rng),
        }
    }

    pub fn catalog(&self) -> &TopicCatalog {
        &self.catalog
    }

    /// Picks one proposal uniformly. Returns `None` for an empty list.
    pub fn resolve(&self, proposals: Vec<(ParticipantId, TopicProposal)>) -> Option<ChosenTopic> {
        if proposals.is_empty() {
            return None;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let index = rng.random_range(0..proposals.len());
        let (chosen_by, proposal) = proposals.into_iter().nth(index)?;
        let topic = match proposal {
            TopicProposal::Specific(topic) => topic,
            TopicProposal::Random => self.catalog.topics.choose(&mut *rng)?.clone(),
        };
        Some(ChosenTopic { topic, chosen_by })
    }
}
