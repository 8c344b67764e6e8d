// Filtering feature - the classifier chain, per-user state, and the
// enforcement pipeline that ties them together.

pub mod classifiers;
pub mod filter_models;
pub mod filter_service;
pub mod pipeline;
pub mod user_state;

pub use filter_models::{
    ActionResult, BadWordConfig, FilterKind, FilterPolicy, LinkChannelConfig, MessageSnapshot,
    SpamConfig, StickyConfig, Verdict,
};
pub use filter_service::{FilterConfigStore, FilterService, StoreError};
pub use pipeline::{EnforcementPipeline, PipelineOutcome, PlatformActions, STICKY_REMINDER};
