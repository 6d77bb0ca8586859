//! Bilingual (Romanian/English) term sets and pattern banks.
//!
//! Terms are stored already folded (see [`crate::text::normalize`]) and match
//! as substrings of the folded message, so `"carti"` also matches `"cartile"`.

use regex::Regex;

const BOOK_TERMS: &[&str] = &[
    // ro
    "carte", "carti", "roman", "romane", "titlu", "titluri", "volum", "volume", "serie", "serii",
    "trilogie", "saga", "autor", "autori", "scriitor", "scriitori", "editor", "editura", "editie",
    "biblioteca", "lectura", "literatura", "capitol", "capitole", "personaj", "personaje", "tema",
    "teme", "gen", "genuri",
    // en
    "book", "books", "novel", "novels", "title", "titles", "volume", "volumes", "series",
    "trilogy", "saga", "author", "authors", "writer", "writers", "publisher", "edition",
    "library", "reading", "literature", "chapter", "chapters", "character", "characters", "theme",
    "themes", "genre", "genres",
];

const ACTION_TERMS: &[&str] = &[
    // ro
    "recomanda", "recomandare", "recomandari", "recomanzi", "recomandati", "sugereaza", "sugestie",
    "sugestii", "propune", "propuneri", "arata", "arata-mi", "da-mi", "da mi", "dami", "gaseste",
    "gasi", "cauta", "vreau", "as dori", "imi poti recomanda", "poti recomanda", "merita citita",
    "top", "lista", "ce sa citesc", "ce sa mai citesc", "must read", "de citit", "sugerezi",
    "sugerati", "sugerez", "sugereste",
    // en
    "recommend", "recommendation", "recommendations", "suggest", "suggestion", "suggestions",
    "propose", "show me", "give me", "find", "search", "looking for", "i want", "i would like",
    "what to read", "good read", "must read", "top", "list",
];

const INFO_TERMS: &[&str] = &[
    // ro
    "rezumat", "sinopsis", "descriere", "detalii", "informatii", "subiect", "poveste", "tema",
    "teme", "gen", "genul", "tematica", "autorul", "cine a scris", "anul aparitiei", "publicata",
    "pagini", "capitole", "editura", "editie", "traducere", "personaje", "finalul", "compara cu",
    "similar cu", "alternative", "carti similare", "recenzie", "pareri", "rating", "note",
    // en
    "summary", "synopsis", "description", "details", "information", "plot", "story", "author",
    "who wrote", "published", "year", "pages", "edition", "publisher", "translation",
    "characters", "ending", "compare with", "similar to", "alternatives", "review", "reviews",
    "opinions", "rating", "score",
];

const FOLLOWUP_HINTS: &[&str] = &[
    "detalii", "rezumat", "autor", "tema", "subiect", "personaje", "mai multe", "details",
    "more details", "tell me more", "more about", "summary", "author", "plot", "characters",
];

const SUMMARY_KEYWORDS: &[&str] = &["rezumat", "summary"];

const FOLLOWUP_PATTERNS: &[&str] = &[
    r"(?i)\bdespre (ea|el|aceasta carte|cartea asta|cartea aceea)\b",
    r"(?i)\b(mai multe )?detalii (despre|legate de)\b",
    r"(?i)\bspune[- ]mi (mai multe|detalii) (despre|de)\b",
    r"(?i)\brezumat(ul)?( ei| al ei| al cartii| al acestei carti)?\b",
    r"(?i)\bautor(ul)?( ei| al ei| al cartii)?\b",
    r"(?i)\bthis (book|novel)\b",
    r"(?i)\bthat (book|novel)\b",
    r"(?i)\babout (it|this|that|the book|the novel)\b",
    r"(?i)\bmore details (about|on)\b",
    r"(?i)\bsummary (please)?\b",
];

const READ_INTENT_PATTERN: &str = r"(?i)\b(ce sa( mai)?|what (should i|to)) (citesc|read)\b";

const ALL_BOOKS_PATTERN: &str = concat!(
    r"^(?:",
    r"/books",
    r"|(?:(?:da mi|da-mi|arata-mi|arata|afiseaza|listeaza)\s*)?(?:toate|lista)\s+carti(?:le)?",
    r"|(?:(?:show me|show|list|give me)\s+)?all\s+(?:the\s+)?books",
    r")[.!?]*$",
);

/// Immutable classifier vocabulary, built once at startup and injected.
#[derive(Debug, Clone)]
pub struct Lexicon {
    pub book_terms: Vec<String>,
    pub action_terms: Vec<String>,
    pub info_terms: Vec<String>,
    pub followup_hints: Vec<String>,
    pub summary_keywords: Vec<String>,
    followup_patterns: Vec<Regex>,
    read_intent: Regex,
    all_books: Regex,
}

impl Lexicon {
    /// The built-in Romanian + English vocabulary.
    pub fn bilingual() -> Result<Self, regex::Error> {
        Ok(Self {
            book_terms: owned(BOOK_TERMS),
            action_terms: owned(ACTION_TERMS),
            info_terms: owned(INFO_TERMS),
            followup_hints: owned(FOLLOWUP_HINTS),
            summary_keywords: owned(SUMMARY_KEYWORDS),
            followup_patterns: FOLLOWUP_PATTERNS
                .iter()
                .map(|p| Regex::new(p))
                .collect::<Result<_, _>>()?,
            read_intent: Regex::new(READ_INTENT_PATTERN)?,
            all_books: Regex::new(ALL_BOOKS_PATTERN)?,
        })
    }

    pub fn followup_patterns(&self) -> &[Regex] {
        &self.followup_patterns
    }

    pub fn read_intent(&self) -> &Regex {
        &self.read_intent
    }

    pub fn all_books(&self) -> &Regex {
        &self.all_books
    }
}

fn owned(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|t| (*t).to_string()).collect()
}
