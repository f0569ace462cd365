//! Run artifacts: screenshots and summary documents.

mod fs_sink;
mod sink;

pub use fs_sink::FsArtifactSink;
pub use sink::{ArtifactError, ArtifactSink};
