pub mod answer;
pub mod directive;
pub mod knowledge;
pub mod truth;
