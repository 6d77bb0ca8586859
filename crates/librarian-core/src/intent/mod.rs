//! Book-domain intent heuristics: lexicons and the classifier built from them.

pub mod classifier;
pub mod lexicon;

pub use classifier::DomainClassifier;
pub use lexicon::Lexicon;
