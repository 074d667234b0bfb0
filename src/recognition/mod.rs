pub mod client;
pub mod entry;
pub mod error;
pub mod worker;

pub use client::{HttpRecognitionClient, RecognitionService};
pub use entry::{parse_entries, RecognitionEntry};
pub use error::RecognitionError;
pub use worker::{RecognitionReply, RecognitionWorker};
