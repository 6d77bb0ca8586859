pub mod anchor;
pub mod store;

pub use anchor::last_recommended_book;
pub use store::ConversationStore;
