pub mod engine;
pub mod policy;
pub mod session;

pub use engine::{EngineParams, InferenceEngine};
pub use policy::{BayesianPolicy, Policy, PolicyKind, RandomPolicy};
pub use session::{
    DEFAULT_QUESTION_BUDGET, Session, SessionError, SessionReport, SessionState, TranscriptEntry,
    Turn,
};
