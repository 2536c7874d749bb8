//! Model loading and inference components

pub mod inference;
pub mod loader;

pub use inference::{InferenceEngine, Predictor};
pub use loader::ModelLoader;
