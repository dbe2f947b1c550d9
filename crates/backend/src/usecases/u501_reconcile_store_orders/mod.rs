pub mod executor;
pub mod reconciler;
pub mod tag_classifier;
