use crate::model::{NoteModel, QUIZ_MODEL};
use crate::quiz::{QuestionType, QuizRecord};
use log::{debug, info};
use rand::Rng;

const MIN_ID: i64 = 1 << 30;
const MAX_ID: i64 = 1 << 31;

/// Identifiers the package format uses to tell this deck and its note type
/// apart from others already in a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeckIds {
    pub model_id: i64,
    pub deck_id: i64,
}

impl DeckIds {
    /// Draws both ids from `[2^30, 2^31)`, redrawing the deck id until the two
    /// differ.
    pub fn random<R: Rng>(rng: &mut R) -> DeckIds {
        let model_id = rng.random_range(MIN_ID..MAX_ID);
        let mut deck_id = rng.random_range(MIN_ID..MAX_ID);
        while deck_id == model_id {
            deck_id = rng.random_range(MIN_ID..MAX_ID);
        }

        DeckIds { model_id, deck_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub front_html: String,
    pub back_html: String,
    pub type_label: String,
}

impl Note {
    /// Field values in the order of [`QUIZ_MODEL`]'s fields.
    pub fn fields(&self) -> [&str; 3] {
        [&self.front_html, &self.back_html, &self.type_label]
    }
}

#[derive(Debug, Clone)]
pub struct Deck {
    pub name: String,
    pub ids: DeckIds,
    pub model: NoteModel,
    notes: Vec<Note>,
}

impl Deck {
    pub fn new(name: &str, ids: DeckIds) -> Deck {
        Deck {
            name: name.to_string(),
            ids,
            model: QUIZ_MODEL,
            notes: Vec::new(),
        }
    }

    pub fn add_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Letter label for the option at `index`: `A`..`Z`, then `AA`, `AB`, ...
/// the way spreadsheet columns are named.
pub fn option_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }

    letters.iter().rev().collect()
}

/// Turns one record into a note, or `None` when no answer is marked correct.
pub fn note_from_record(record: &QuizRecord) -> Option<Note> {
    let correct: Vec<&str> = record
        .correct_answers()
        .map(|answer| answer.text.as_str())
        .collect();
    if correct.is_empty() {
        return None;
    }

    let mut front_html = record.question_text.clone();
    if record.question_type == QuestionType::MultipleChoice {
        front_html.push_str(r#"<ul class="options-list">"#);
        for (i, option) in record.answers.iter().enumerate() {
            front_html.push_str(&format!("<li>{}. {}</li>", option_letter(i), option.text));
        }
        front_html.push_str("</ul>");
    }

    Some(Note {
        front_html,
        back_html: correct.join("<br>"),
        type_label: record.question_type.label().to_string(),
    })
}

/// Builds a deck holding one note per record that has a correct answer.
///
/// Returns `None` when there are no records at all. Records without a correct
/// answer are skipped, so the returned deck may still be empty.
pub fn build_deck(records: &[QuizRecord], name: &str, ids: DeckIds) -> Option<Deck> {
    if records.is_empty() {
        debug!("[Deck] No records, not creating a deck.");
        return None;
    }

    let mut deck = Deck::new(name, ids);
    for record in records {
        match note_from_record(record) {
            Some(note) => deck.add_note(note),
            None => debug!(
                "[Deck] Skipping question {:?}: no correct answer found.",
                record.id
            ),
        }
    }
    info!(
        "[Deck] Added {} of {} questions to '{}'.",
        deck.len(),
        records.len(),
        deck.name
    );

    Some(deck)
}

#[cfg(test)]
mod tests;
