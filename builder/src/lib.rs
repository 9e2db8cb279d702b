pub mod builder;
pub mod encoder;
pub mod report;

pub use builder::{table_to_text, GraphBuilder};
pub use encoder::{
    BoxFuture, DeterministicImageEncoder, DeterministicTextEncoder, EncoderError, ImageEncoder,
    TextEncoder,
};
pub use report::{BuildIssue, BuildReport};
