//! Tailor Generation - natural-language explanations for ranked outfits
//!
//! Builds a prompt from the top ranked catalog items and the user's
//! context, calls a text-generation backend with bounded retries, and
//! extracts the image references the answer mentions. When every attempt
//! fails the result is a degraded explanation rather than an error.
//!
//! ```
//! use tailor_generation::extract_image_references;
//!
//! let refs = extract_image_references("Try the blazer (image: 15970.jpg).");
//! assert_eq!(refs, vec!["15970.jpg"]);
//! ```

pub mod backend;
pub mod error;
pub mod generator;
pub mod prompt;
pub mod references;
pub mod sizing;

pub use backend::{BackendConfig, GenerationBackend, HttpBackend};
pub use error::BackendError;
pub use generator::{
    parse_output, AttemptOutcome, Explanation, ExplanationGenerator, GeneratedOutput,
    GenerationConfig, GenerationStatus, DEGRADED_TEXT,
};
pub use prompt::{FewShotExample, Prompt, PromptBuilder, UserContext, ANSWER_MARKER};
pub use references::extract_image_references;
pub use sizing::{size_suggestion, SizeSuggestion};
