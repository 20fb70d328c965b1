pub mod upload_intent;

pub use upload_intent::{UploadIntentRepository, UploadIntentStore};
