/// A card template: the front (`qfmt`) and back (`afmt`) layouts.
#[derive(Debug, Clone, Copy)]
pub struct CardTemplate {
    pub name: &'static str,
    pub qfmt: &'static str,
    pub afmt: &'static str,
}

/// The note type shared by every generated note.
#[derive(Debug, Clone, Copy)]
pub struct NoteModel {
    pub name: &'static str,
    pub fields: &'static [&'static str],
    pub templates: &'static [CardTemplate],
    pub css: &'static str,
}

impl NoteModel {
    /// Ordinals of the fields the template's front side references.
    ///
    /// A card is generated when any of them is non-empty.
    pub fn required_fields(&self, template: &CardTemplate) -> Vec<usize> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, name)| template.qfmt.contains(&format!("{{{{{}}}}}", name)))
            .map(|(ord, _)| ord)
            .collect()
    }
}

pub const QUIZ_MODEL: NoteModel = NoteModel {
    name: "Question with Options and Answer",
    fields: &["Question", "Answer", "ExtraInfo"],
    templates: &[CardTemplate {
        name: "Card 1",
        qfmt: r#"<div class="question">{{Question}}</div><br><div class="type">({{ExtraInfo}})</div>"#,
        afmt: r#"{{FrontSide}}<hr id="answer"><div class="answer_label">Correct Answer:</div><div class="answer_content">{{Answer}}</div>"#,
    }],
    css: QUIZ_CSS,
};

const QUIZ_CSS: &str = r#"
.card {
    font-family: arial;
    font-size: 20px;
    text-align: center;
    color: black;
    background-color: white;
}
.question { font-weight: bold; }
.type { font-size: 14px; color: #666; font-style: italic; }
.options-list {
    list-style: none;
    padding: 0;
    margin-top: 15px;
    text-align: left;
    display: inline-block;
}
.options-list li {
    margin-bottom: 5px;
    padding: 5px;
    border: 1px solid #eee;
    border-radius: 3px;
    background-color: #f9f9f9;
}
.answer_label {
    font-weight: bold;
    color: #008000;
    margin-top: 10px;
}
.answer_content {
    color: #000080;
    font-size: 22px;
    font-weight: bold;
}
"#;
