#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Request-to-recognizer pipeline: validate the request, stage the image in a scoped
//! temporary file, run the external recognizer against it, and always clean up.
//!
//! Layout: `request.rs` (parameter validation), `scratch.rs` (temporary resources),
//! `acquire.rs` (remote fetch and upload writes), `recognizer.rs` (subprocess invocation),
//! `pipeline.rs` (stage composition), `error.rs` (error taxonomy).

pub mod acquire;
pub mod error;
pub mod pipeline;
pub mod recognizer;
pub mod request;
pub mod scratch;

pub use acquire::{AcquiredImage, HttpImageFetcher, ImageFetcher, write_upload};
pub use error::{BoxError, PipelineError, PipelineResult, RecognizerFailure, Stage};
pub use pipeline::RecognitionPipeline;
pub use recognizer::{CommandRecognizer, RecognitionResult, Recognizer};
pub use request::{
    ImageSource, RequestDescriptor, RequestParams, RequestStyle, RequestValidator, Validation,
};
pub use scratch::{ScratchSpace, TempResource};
