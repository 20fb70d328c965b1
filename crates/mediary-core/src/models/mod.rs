pub mod session;
pub mod upload_intent;
pub mod user;

pub use session::Session;
pub use upload_intent::{
    ConfirmUploadRequest, NewUploadIntent, UploadIntent, UploadRequest, UploadStatus, UploadTicket,
};
pub use user::{AccountTier, ExternalProfile, NewUser, User};
