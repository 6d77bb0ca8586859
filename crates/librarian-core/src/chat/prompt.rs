//! Fixed librarian texts and generation prompt composition.

use librarian_types::lang::Lang;
use librarian_types::llm::Message;

const SYSTEM_RO: &str = "Ești Smart Librarian. Folosește contextul furnizat pentru a răspunde, \
dar dacă nu găsești informații exacte, poți sugera titluri similare sau să explici de ce nu \
există o recomandare directă.";

const SYSTEM_EN: &str = "You are Smart Librarian. Answer STRICTLY using only the provided \
CONTEXT. If the answer is not in CONTEXT, say you don't know. Do not invent titles, authors, \
or details.";

/// System instruction for the detected language.
pub fn system_instruction(lang: Lang) -> &'static str {
    match lang {
        Lang::Ro => SYSTEM_RO,
        Lang::En => SYSTEM_EN,
    }
}

/// Reply to messages outside the book domain.
pub fn refusal(lang: Lang) -> &'static str {
    match lang {
        Lang::Ro => {
            "Sunt un bibliotecar virtual și pot discuta doar despre cărți, autori sau recomandări de lectură."
        }
        Lang::En => {
            "I am a virtual librarian and can only talk about books, authors, or reading recommendations."
        }
    }
}

/// Reply when retrieval and the summary fallback both come back empty.
pub fn no_information(lang: Lang) -> &'static str {
    match lang {
        Lang::Ro => {
            "Nu am găsit informații relevante în biblioteca noastră pentru întrebarea ta. \
             Încearcă să reformulezi sau întreabă de un titlu/autor."
        }
        Lang::En => {
            "I could not find relevant information in our library for your question. \
             Try rephrasing or ask about a specific title/author."
        }
    }
}

/// Catalog listing reply.
pub fn all_titles(lang: Lang, titles: &[String]) -> String {
    if titles.is_empty() {
        return match lang {
            Lang::Ro => "Nu am găsit nicio carte în colecție.".to_string(),
            Lang::En => "I could not find any books in the collection.".to_string(),
        };
    }
    let header = match lang {
        Lang::Ro => format!("Iată toate titlurile ({}):", titles.len()),
        Lang::En => format!("Here are all titles ({}):", titles.len()),
    };
    let items: Vec<String> = titles.iter().map(|t| format!("- {t}")).collect();
    format!("{header}\n{}", items.join("\n"))
}

/// System instruction, then caller-supplied history, then the grounded question.
pub fn build_messages(lang: Lang, history: &[Message], context: &str, question: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system_instruction(lang)));
    messages.extend(history.iter().cloned());
    messages.push(Message::user(format!(
        "CONTEXT:\n{context}\n\nQUESTION: {question}"
    )));
    messages
}
