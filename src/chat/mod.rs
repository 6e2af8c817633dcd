// Chat components: conversation state, message pipeline, history and uploads

pub mod conversation;
pub mod history;
pub mod pipeline;
pub mod upload;

pub use conversation::{Conversation, ConversationStore};
pub use history::{HistoryController, HistoryOutcome};
pub use pipeline::{ChatPipeline, SendOutcome, ALTERNATIVE_REQUEST};
pub use upload::{UploadOutcome, UploadSlot};
