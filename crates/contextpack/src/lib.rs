//! Token budgeting for report generation.
//!
//! Everything here is pure and synchronous: character-ratio token
//! estimates, per-model cost projection, per-call context packing and
//! whole-report cost projection. No network, no clocks.

pub mod cost;
pub mod injection;
pub mod optimizer;
pub mod projector;
pub mod report;
pub mod tokens;
pub mod truncation;

pub use cost::{CostEstimate, CostEstimator, RateLimitStatus};
pub use optimizer::ContextOptimizer;
pub use projector::GenerationCostProjector;
pub use report::{CostBreakdown, OptimizedContext, SectionProjection};
pub use tokens::TokenEstimator;
