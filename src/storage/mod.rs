mod artifact;
mod profile;

pub use artifact::{ArtifactError, UploadedArtifact};
pub use profile::{MemoryProfileSink, ProfileError, ProfileSink, ProfileUpdate, UserProfile};
