//! Library domain - persisted chat records.
//!
//! These are the server-side shapes the CRUD routes operate on:
//! conversations and their stored messages, folders, votes, feedback, and
//! share links.

mod conversation;
mod feedback;
mod folder;
mod share;
mod vote;

pub use conversation::{derive_title, ConversationRecord, StoredMessage, MAX_TITLE_LEN};
pub use feedback::{Feedback, FeedbackId};
pub use folder::{Folder, MAX_FOLDER_NAME_LEN};
pub use share::Share;
pub use vote::{Vote, VoteValue};
