//! Advice Generation
//!
//! Rule-based recommendation text for the nutrient and irrigation estimates.
//! Both generators are pure and order-preserving: callers display the list
//! top to bottom.

pub mod fertilizer;
pub mod irrigation;

pub use fertilizer::{fertilizer_recommendations, FertilizerAdvice};
pub use irrigation::{irrigation_recommendations, IrrigationAdvice, IrrigationStatus};
