//! Book-domain classification of incoming messages.

use crate::text::normalize;

use super::lexicon::Lexicon;

/// Decides whether a message is about books, is a terse follow-up, or asks
/// for the whole catalog. Every check folds the message first.
#[derive(Debug, Clone)]
pub struct DomainClassifier {
    lexicon: Lexicon,
}

impl DomainClassifier {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    /// Classifier over the built-in Romanian + English lexicon.
    pub fn bilingual() -> Result<Self, regex::Error> {
        Ok(Self::new(Lexicon::bilingual()?))
    }

    /// A follow-up pattern match wins outright. Otherwise the message needs a
    /// book-domain term AND (an action term, the read-intent phrase, or an
    /// info term).
    pub fn is_book_related(&self, message: &str) -> bool {
        let folded = normalize(message);
        if self.matches_followup_pattern(&folded) {
            return true;
        }

        let has_domain = contains_any(&folded, &self.lexicon.book_terms);
        if !has_domain {
            return false;
        }
        let has_action = contains_any(&folded, &self.lexicon.action_terms)
            || self.lexicon.read_intent().is_match(&folded);
        let has_info = contains_any(&folded, &self.lexicon.info_terms);
        has_action || has_info
    }

    /// Follow-up patterns or a follow-up hint, with no domain requirement.
    /// Only meaningful when the conversation already has an anchor book.
    pub fn is_followup_loose(&self, message: &str) -> bool {
        let folded = normalize(message);
        self.matches_followup_pattern(&folded) || contains_any(&folded, &self.lexicon.followup_hints)
    }

    /// "list all books" in either language, or the `/books` command.
    pub fn is_all_books_query(&self, message: &str) -> bool {
        self.lexicon.all_books().is_match(&normalize(message))
    }

    /// Explicit request for a summary ("rezumat", "summary").
    pub fn mentions_summary(&self, message: &str) -> bool {
        contains_any(&normalize(message), &self.lexicon.summary_keywords)
    }

    fn matches_followup_pattern(&self, folded: &str) -> bool {
        self.lexicon
            .followup_patterns()
            .iter()
            .any(|re| re.is_match(folded))
    }
}

fn contains_any(haystack: &str, terms: &[String]) -> bool {
    terms.iter().any(|t| haystack.contains(t.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> DomainClassifier {
        DomainClassifier::bilingual().unwrap()
    }

    #[test]
    fn test_followup_patterns_override_missing_domain_terms() {
        let c = classifier();
        for message in [
            "Spune-mi mai multe despre ea",
            "despre cartea asta?",
            "Rezumatul ei, te rog",
            "tell me about it",
            "more details about that",
            "Is this book any good",
            "summary please",
            "Cine este autorul ei?",
        ] {
            assert!(c.is_book_related(message), "expected book-related: {message}");
        }
    }

    #[test]
    fn test_domain_term_without_intent_is_rejected() {
        let c = classifier();
        for message in ["I have a book", "am o carte", "my library card expired"] {
            assert!(!c.is_book_related(message), "expected unrelated: {message}");
        }
    }

    #[test]
    fn test_domain_plus_action_or_info() {
        let c = classifier();
        assert!(c.is_book_related("Can you recommend a fantasy book?"));
        assert!(c.is_book_related("Recomandă-mi o carte despre prietenie"));
        assert!(c.is_book_related("Who wrote the novel Ion?"));
        assert!(c.is_book_related("Care este tema romanului?"));
    }

    #[test]
    fn test_read_intent_phrase_counts_as_action() {
        let c = classifier();
        assert!(c.is_book_related("ce sa citesc din literatura rusa"));
        assert!(c.is_book_related("What should I read from this series"));
    }

    #[test]
    fn test_no_domain_terms_is_rejected() {
        let c = classifier();
        assert!(!c.is_book_related("What's the weather like?"));
        assert!(!c.is_book_related("Cât costă o pizza?"));
        assert!(!c.is_book_related(""));
    }

    #[test]
    fn test_followup_loose_accepts_hints() {
        let c = classifier();
        assert!(c.is_followup_loose("tell me more details?"));
        assert!(c.is_followup_loose("tell me more"));
        assert!(c.is_followup_loose("Spune-mi mai multe"));
        assert!(c.is_followup_loose("și personajele?"));
        assert!(c.is_followup_loose("what's the plot"));
        assert!(!c.is_followup_loose("thanks, bye"));
    }

    #[test]
    fn test_all_books_query() {
        let c = classifier();
        assert!(c.is_all_books_query("/books"));
        assert!(c.is_all_books_query("listeaza toate cartile"));
        assert!(c.is_all_books_query("Listează toate cărțile"));
        assert!(c.is_all_books_query("arata-mi lista carti"));
        assert!(c.is_all_books_query("Show all books"));
        assert!(c.is_all_books_query("toate cartile!"));
        assert!(!c.is_all_books_query("recommend a book"));
        assert!(!c.is_all_books_query("/books please recommend"));
    }

    #[test]
    fn test_mentions_summary() {
        let c = classifier();
        assert!(c.mentions_summary("Dă-mi un rezumat"));
        assert!(c.mentions_summary("SUMMARY"));
        assert!(!c.mentions_summary("tell me more"));
    }
}
