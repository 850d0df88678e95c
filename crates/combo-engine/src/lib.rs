pub mod annotate;
pub mod audit;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod hashing;
pub mod migrate;
pub mod pipeline;
pub mod registries;
pub mod select;
pub mod signature;
pub mod similarity;
pub mod usage;

pub use annotate::{Annotation, AnnotationSource, Annotator, HttpAnnotator, OfflineAnnotator};
pub use config::GeneratorConfig;
pub use engine::{CombinationEngine, EngineSettings, RejectReason, RunReport, StopReason};
pub use pipeline::{run_generation, GenerationOutcome};
pub use registries::Registries;
