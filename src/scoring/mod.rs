// Pillar and scan-level scoring

pub mod aggregator;
pub mod pillar;

pub use aggregator::ScoreAggregator;
pub use pillar::{round_two, score_pillar};
