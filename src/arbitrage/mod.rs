pub mod calculator;
pub mod detector;

pub use detector::{
    EvaluationStats, Evaluation, EvaluatorOptions, OpportunityEvaluator, Thresholds,
};
