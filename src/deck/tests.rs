use super::*;
use crate::quiz::AnswerOption;
use rand::rngs::StdRng;
use rand::SeedableRng;

const IDS: DeckIds = DeckIds {
    model_id: 1_500_000_000,
    deck_id: 1_600_000_000,
};

fn answer(text: &str, is_correct: bool) -> AnswerOption {
    AnswerOption {
        text: text.to_string(),
        is_correct,
    }
}

fn record(question_text: &str, question_type: QuestionType, answers: Vec<AnswerOption>) -> QuizRecord {
    QuizRecord {
        id: None,
        question_text: question_text.to_string(),
        question_type,
        answers,
    }
}

#[test]
fn test_multiple_choice_note() {
    let record = record(
        "Which city?",
        QuestionType::MultipleChoice,
        vec![answer("Paris", false), answer("Lyon", true)],
    );

    let note = note_from_record(&record).unwrap();

    assert!(note.front_html.starts_with("Which city?"));
    assert!(note.front_html.contains("A. Paris"));
    assert!(note.front_html.contains("B. Lyon"));
    assert_eq!(
        note.front_html,
        r#"Which city?<ul class="options-list"><li>A. Paris</li><li>B. Lyon</li></ul>"#
    );
    assert_eq!(note.back_html, "Lyon");
    assert_eq!(note.type_label, "Multiple Choice");
}

#[test]
fn test_multiple_correct_answers_keep_input_order() {
    let record = record(
        "Pets?",
        QuestionType::Other("multiple_answers_question".to_string()),
        vec![answer("Cat", true), answer("Fish", false), answer("Dog", true)],
    );

    let note = note_from_record(&record).unwrap();

    assert_eq!(note.back_html, "Cat<br>Dog");
    assert_eq!(note.front_html, "Pets?");
    assert_eq!(note.type_label, "Question");
}

#[test]
fn test_true_false_front_is_unchanged() {
    let record = record(
        "<p>The sky is green.</p>",
        QuestionType::TrueFalse,
        vec![answer("True", false), answer("False", true)],
    );

    let note = note_from_record(&record).unwrap();

    assert_eq!(note.front_html, "<p>The sky is green.</p>");
    assert_eq!(note.back_html, "False");
    assert_eq!(note.type_label, "True / False");
}

#[test]
fn test_record_without_correct_answer_is_skipped() {
    let none_correct = record(
        "Q",
        QuestionType::MultipleChoice,
        vec![answer("A", false), answer("B", false)],
    );
    let no_answers = record("Q", QuestionType::TrueFalse, Vec::new());

    assert!(note_from_record(&none_correct).is_none());
    assert!(note_from_record(&no_answers).is_none());
}

#[test]
fn test_build_deck_counts_only_answerable_records() {
    let records = vec![
        record("one", QuestionType::TrueFalse, vec![answer("True", true)]),
        record("two", QuestionType::MultipleChoice, vec![answer("x", false)]),
        record("three", QuestionType::default(), vec![answer("y", true)]),
        record("four", QuestionType::default(), Vec::new()),
    ];

    let deck = build_deck(&records, "My Deck", IDS).unwrap();

    assert_eq!(deck.len(), 2);
    assert_eq!(deck.name, "My Deck");
    assert_eq!(deck.ids, IDS);
    let fronts: Vec<&str> = deck.notes().iter().map(|n| n.front_html.as_str()).collect();
    assert_eq!(fronts, vec!["one", "three"]);
}

#[test]
fn test_build_deck_without_records_is_none() {
    assert!(build_deck(&[], "Empty", IDS).is_none());
}

#[test]
fn test_build_deck_all_skipped_is_empty_deck() {
    let records = vec![record("Q", QuestionType::TrueFalse, vec![answer("True", false)])];

    let deck = build_deck(&records, "Nothing", IDS).unwrap();

    assert!(deck.is_empty());
}

#[test]
fn test_note_fields_follow_model_order() {
    let note = Note {
        front_html: "front".to_string(),
        back_html: "back".to_string(),
        type_label: "label".to_string(),
    };

    assert_eq!(note.fields(), ["front", "back", "label"]);
    assert_eq!(QUIZ_MODEL.fields, &["Question", "Answer", "ExtraInfo"]);
}

#[test]
fn test_option_letters() {
    assert_eq!(option_letter(0), "A");
    assert_eq!(option_letter(1), "B");
    assert_eq!(option_letter(25), "Z");
    assert_eq!(option_letter(26), "AA");
    assert_eq!(option_letter(27), "AB");
    assert_eq!(option_letter(51), "AZ");
    assert_eq!(option_letter(52), "BA");
    assert_eq!(option_letter(701), "ZZ");
    assert_eq!(option_letter(702), "AAA");
}

#[test]
fn test_more_than_26_options_get_double_letters() {
    let answers: Vec<AnswerOption> = (0..28).map(|i| answer(&format!("opt{i}"), i == 0)).collect();
    let record = record("Many", QuestionType::MultipleChoice, answers);

    let note = note_from_record(&record).unwrap();

    assert!(note.front_html.contains("<li>Z. opt25</li>"));
    assert!(note.front_html.contains("<li>AA. opt26</li>"));
    assert!(note.front_html.contains("<li>AB. opt27</li>"));
}

#[test]
fn test_random_ids_are_in_range_and_distinct() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..1000 {
        let ids = DeckIds::random(&mut rng);
        assert!((MIN_ID..MAX_ID).contains(&ids.model_id));
        assert!((MIN_ID..MAX_ID).contains(&ids.deck_id));
        assert_ne!(ids.model_id, ids.deck_id);
    }
}

#[test]
fn test_identical_input_same_notes_different_ids() {
    let records = vec![
        record("a", QuestionType::MultipleChoice, vec![answer("1", true), answer("2", false)]),
        record("b", QuestionType::TrueFalse, vec![answer("True", true)]),
    ];

    let first = build_deck(&records, "Run", DeckIds::random(&mut StdRng::seed_from_u64(1))).unwrap();
    let second = build_deck(&records, "Run", DeckIds::random(&mut StdRng::seed_from_u64(2))).unwrap();

    assert_ne!(first.ids, second.ids);
    assert_eq!(first.notes(), second.notes());
}
