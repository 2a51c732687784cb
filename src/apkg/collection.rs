use crate::deck::Deck;
use crate::model::NoteModel;
use log::{debug, error, info};
use rusqlite::{params, Connection, DatabaseName, Result};
use serde_json::{json, Value};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

const SCHEMA_VERSION: i64 = 11;
const DEFAULT_DECK_ID: i64 = 1;
const DEFAULT_CONF_ID: i64 = 1;
const FIELD_SEPARATOR: &str = "\x1f";
const SORT_FIELD: usize = 0;
const BASE91_TABLE: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!#$%&()*+,-./:;<=>?@[]^_`{|}~";

/// Wall-clock time the collection is stamped with.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Timestamp {
    pub secs: i64,
    pub millis: i64,
}

impl Timestamp {
    pub fn now() -> Timestamp {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp {
            secs: elapsed.as_secs() as i64,
            millis: elapsed.as_millis() as i64,
        }
    }
}

/// Builds an in-memory collection holding `deck`.
pub(crate) fn create_collection(deck: &Deck, now: Timestamp) -> Result<Connection> {
    let started = Instant::now();
    let conn = init_collection(Connection::open_in_memory()?)?;
    insert_col(&conn, deck, now)?;
    insert_notes(&conn, deck, now)?;
    debug!(
        "[APKG] Building the collection took {} ms.",
        started.elapsed().as_millis()
    );
    Ok(conn)
}

/// Copies the in-memory collection to `dest`.
pub(crate) fn export_collection(conn: &Connection, dest: &Path) -> Result<()> {
    let started = Instant::now();
    match conn.backup(DatabaseName::Main, dest, None) {
        Ok(_) => {
            debug!(
                "[APKG] Saving the collection took {} ms.",
                started.elapsed().as_millis()
            );
            Ok(())
        }
        Err(err) => {
            error!("[APKG] Failed to save the collection to {:?}: {}", dest, err);
            Err(err)
        }
    }
}

pub(crate) fn close_collection(conn: Connection) -> Result<()> {
    debug!("[APKG] Closing collection");
    match conn.close() {
        Ok(_) => Ok(()),
        Err((conn, _)) => {
            error!("[APKG] Cannot close collection. Retrying...");
            conn.close().map_err(|(_, err)| err)
        }
    }
}

fn init_collection(conn: Connection) -> Result<Connection> {
    info!("[APKG INIT] Creating tables");
    conn.execute(
        "CREATE TABLE col (
              id INTEGER PRIMARY KEY,
              crt INTEGER NOT NULL,
              mod INTEGER NOT NULL,
              scm INTEGER NOT NULL,
              ver INTEGER NOT NULL,
              dty INTEGER NOT NULL,
              usn INTEGER NOT NULL,
              ls INTEGER NOT NULL,
              conf TEXT NOT NULL,
              models TEXT NOT NULL,
              decks TEXT NOT NULL,
              dconf TEXT NOT NULL,
              tags TEXT NOT NULL
            )",
        (),
    )?;
    debug!("[APKG INIT] Created table col");
    conn.execute(
        "CREATE TABLE notes (
              id INTEGER PRIMARY KEY,
              guid TEXT NOT NULL,
              mid INTEGER NOT NULL,
              mod INTEGER NOT NULL,
              usn INTEGER NOT NULL,
              tags TEXT NOT NULL,
              flds TEXT NOT NULL,
              sfld INTEGER NOT NULL,
              csum INTEGER NOT NULL,
              flags INTEGER NOT NULL,
              data TEXT NOT NULL
            )",
        (),
    )?;
    debug!("[APKG INIT] Created table notes");
    conn.execute(
        "CREATE TABLE cards (
              id INTEGER PRIMARY KEY,
              nid INTEGER NOT NULL,
              did INTEGER NOT NULL,
              ord INTEGER NOT NULL,
              mod INTEGER NOT NULL,
              usn INTEGER NOT NULL,
              type INTEGER NOT NULL,
              queue INTEGER NOT NULL,
              due INTEGER NOT NULL,
              ivl INTEGER NOT NULL,
              factor INTEGER NOT NULL,
              reps INTEGER NOT NULL,
              lapses INTEGER NOT NULL,
              left INTEGER NOT NULL,
              odue INTEGER NOT NULL,
              odid INTEGER NOT NULL,
              flags INTEGER NOT NULL,
              data TEXT NOT NULL
            )",
        (),
    )?;
    debug!("[APKG INIT] Created table cards");
    conn.execute(
        "CREATE TABLE revlog (
              id INTEGER PRIMARY KEY,
              cid INTEGER NOT NULL,
              usn INTEGER NOT NULL,
              ease INTEGER NOT NULL,
              ivl INTEGER NOT NULL,
              lastIvl INTEGER NOT NULL,
              factor INTEGER NOT NULL,
              time INTEGER NOT NULL,
              type INTEGER NOT NULL
            )",
        (),
    )?;
    debug!("[APKG INIT] Created table revlog");
    conn.execute(
        "CREATE TABLE graves (
              usn INTEGER NOT NULL,
              oid INTEGER NOT NULL,
              type INTEGER NOT NULL
            )",
        (),
    )?;
    debug!("[APKG INIT] Created table graves");
    conn.execute_batch(
        "CREATE INDEX ix_notes_usn ON notes (usn);
         CREATE INDEX ix_cards_usn ON cards (usn);
         CREATE INDEX ix_revlog_usn ON revlog (usn);
         CREATE INDEX ix_cards_nid ON cards (nid);
         CREATE INDEX ix_cards_sched ON cards (did, queue, due);
         CREATE INDEX ix_revlog_cid ON revlog (cid);
         CREATE INDEX ix_notes_csum ON notes (csum);",
    )?;
    debug!("[APKG INIT] Created indexes");
    info!("[APKG INIT] Collection creation successful!");

    Ok(conn)
}

fn insert_col(conn: &Connection, deck: &Deck, now: Timestamp) -> Result<()> {
    let models = json!({ deck.ids.model_id.to_string(): model_json(&deck.model, deck, now) });
    let decks = json!({
        DEFAULT_DECK_ID.to_string(): deck_json(DEFAULT_DECK_ID, "Default", 0, now),
        deck.ids.deck_id.to_string(): deck_json(deck.ids.deck_id, &deck.name, -1, now),
    });
    conn.execute(
        "INSERT INTO col (id, crt, mod, scm, ver, dty, usn, ls, conf, models, decks, dconf, tags)
         VALUES (1, ?1, ?2, ?3, ?4, 0, 0, 0, ?5, ?6, ?7, ?8, '{}')",
        params![
            now.secs,
            now.millis,
            now.millis,
            SCHEMA_VERSION,
            conf_json(deck).to_string(),
            models.to_string(),
            decks.to_string(),
            dconf_json().to_string(),
        ],
    )?;
    debug!(
        "[APKG] Wrote collection metadata for model {} and deck {}",
        deck.ids.model_id, deck.ids.deck_id
    );
    Ok(())
}

fn insert_notes(conn: &Connection, deck: &Deck, now: Timestamp) -> Result<()> {
    let mut note_stmt = conn.prepare(
        "INSERT INTO notes (id, guid, mid, mod, usn, tags, flds, sfld, csum, flags, data)
         VALUES (?1, ?2, ?3, ?4, -1, '', ?5, ?6, ?7, 0, '')",
    )?;
    let mut card_stmt = conn.prepare(
        "INSERT INTO cards (id, nid, did, ord, mod, usn, type, queue, due, ivl, factor, reps,
                            lapses, left, odue, odid, flags, data)
         VALUES (?1, ?2, ?3, 0, ?4, -1, 0, 0, ?5, 0, 0, 0, 0, 0, 0, 0, 0, '')",
    )?;

    // Note and card ids come from one increasing millisecond counter.
    let mut next_id = now.millis;
    for (position, note) in deck.notes().iter().enumerate() {
        let fields = note.fields();
        let sort_field = strip_html(fields[SORT_FIELD]);
        let note_id = next_id;
        note_stmt.execute(params![
            note_id,
            guid_for(&fields),
            deck.ids.model_id,
            now.secs,
            fields.join(FIELD_SEPARATOR),
            sort_field,
            field_checksum(&sort_field),
        ])?;
        let card_id = next_id + 1;
        card_stmt.execute(params![card_id, note_id, deck.ids.deck_id, now.secs, position as i64])?;
        next_id += 2;
    }
    info!("[APKG] Wrote {} notes", deck.len());

    Ok(())
}

fn conf_json(deck: &Deck) -> Value {
    json!({
        "activeDecks": [DEFAULT_DECK_ID],
        "addToCur": true,
        "collapseTime": 1200,
        "curDeck": DEFAULT_DECK_ID,
        "curModel": deck.ids.model_id.to_string(),
        "dueCounts": true,
        "estTimes": true,
        "newBury": true,
        "newSpread": 0,
        "nextPos": deck.len() + 1,
        "sortBackwards": false,
        "sortType": "noteFld",
        "timeLim": 0,
    })
}

fn dconf_json() -> Value {
    json!({
        DEFAULT_CONF_ID.to_string(): {
            "autoplay": true,
            "id": DEFAULT_CONF_ID,
            "lapse": {
                "delays": [10],
                "leechAction": 0,
                "leechFails": 8,
                "minInt": 1,
                "mult": 0,
            },
            "maxTaken": 60,
            "mod": 0,
            "name": "Default",
            "new": {
                "bury": true,
                "delays": [1, 10],
                "initialFactor": 2500,
                "ints": [1, 4, 7],
                "order": 1,
                "perDay": 20,
                "separate": true,
            },
            "replayq": true,
            "rev": {
                "bury": true,
                "ease4": 1.3,
                "fuzz": 0.05,
                "ivlFct": 1,
                "maxIvl": 36500,
                "minSpace": 1,
                "perDay": 100,
            },
            "timer": 0,
            "usn": 0,
        }
    })
}

fn deck_json(id: i64, name: &str, usn: i64, now: Timestamp) -> Value {
    json!({
        "collapsed": false,
        "conf": DEFAULT_CONF_ID,
        "desc": "",
        "dyn": 0,
        "extendNew": 10,
        "extendRev": 50,
        "id": id,
        "lrnToday": [0, 0],
        "mod": now.secs,
        "name": name,
        "newToday": [0, 0],
        "revToday": [0, 0],
        "timeToday": [0, 0],
        "usn": usn,
    })
}

fn model_json(model: &NoteModel, deck: &Deck, now: Timestamp) -> Value {
    let flds: Vec<Value> = model
        .fields
        .iter()
        .enumerate()
        .map(|(ord, name)| {
            json!({
                "name": name,
                "ord": ord,
                "font": "Arial",
                "media": [],
                "rtl": false,
                "size": 20,
                "sticky": false,
            })
        })
        .collect();
    let tmpls: Vec<Value> = model
        .templates
        .iter()
        .enumerate()
        .map(|(ord, template)| {
            json!({
                "name": template.name,
                "ord": ord,
                "qfmt": template.qfmt,
                "afmt": template.afmt,
                "bqfmt": "",
                "bafmt": "",
                "bfont": "",
                "bsize": 0,
                "did": null,
            })
        })
        .collect();
    let req: Vec<Value> = model
        .templates
        .iter()
        .enumerate()
        .map(|(ord, template)| json!([ord, "any", model.required_fields(template)]))
        .collect();

    json!({
        "id": deck.ids.model_id.to_string(),
        "name": model.name,
        "type": 0,
        "mod": now.secs,
        "usn": -1,
        "sortf": SORT_FIELD,
        "did": deck.ids.deck_id,
        "tmpls": tmpls,
        "flds": flds,
        "css": model.css,
        "latexPre": "\\documentclass[12pt]{article}\n\\special{papersize=3in,5in}\n\\usepackage[utf8]{inputenc}\n\\usepackage{amssymb,amsmath}\n\\pagestyle{empty}\n\\setlength{\\parindent}{0in}\n\\begin{document}\n",
        "latexPost": "\\end{document}",
        "latexsvg": false,
        "req": req,
        "tags": [],
        "vers": [],
    })
}

/// Stable note guid: base91 of the first 8 bytes of the SHA-256 of the
/// fields joined by `__`.
pub(crate) fn guid_for(fields: &[&str]) -> String {
    let digest = Sha256::digest(fields.join("__").as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let mut value = u64::from_be_bytes(bytes);

    let mut reversed = Vec::new();
    while value > 0 {
        reversed.push(BASE91_TABLE[(value % 91) as usize]);
        value /= 91;
    }
    reversed.iter().rev().map(|&b| char::from(b)).collect()
}

/// First 8 hex digits of the SHA-1 of `sort_field`, as Anki uses for
/// duplicate detection.
pub(crate) fn field_checksum(sort_field: &str) -> i64 {
    let digest = Sha1::digest(sort_field.as_bytes());
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&digest[..4]);
    u32::from_be_bytes(bytes) as i64
}

/// Drops HTML tags and decodes entities, leaving the text Anki sorts and
/// checksums a note by.
pub(crate) fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    html_escape::decode_html_entities(&text)
        .replace('\u{a0}', " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<p>Capital of <b>France</b>?</p>"), "Capital of France?");
        assert_eq!(strip_html("a &lt; b &amp;&amp; c"), "a < b && c");
        assert_eq!(strip_html("  plain  "), "plain");
        assert_eq!(strip_html(""), "");
    }

    #[test]
    fn test_strip_html_decodes_named_and_numeric_entities() {
        assert_eq!(
            strip_html("<p>Caf&eacute; &#233; &#x27;q&#x27; &mdash;</p>"),
            "Café é 'q' —"
        );
        assert_eq!(strip_html("a&nbsp;b"), "a b");
    }

    #[test]
    fn test_checksum_uses_decoded_text() {
        assert_eq!(
            field_checksum(&strip_html("<b>Caf&eacute;</b>")),
            field_checksum("Café")
        );
    }

    #[test]
    fn test_field_checksum_is_sha1_prefix() {
        // sha1("abc") = a9993e36...
        assert_eq!(field_checksum("abc"), 0xa9993e36);
    }

    #[test]
    fn test_guid_is_stable_and_field_sensitive() {
        let first = guid_for(&["front", "back", "label"]);
        let again = guid_for(&["front", "back", "label"]);
        let other = guid_for(&["front", "back", "other"]);

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert!(!first.is_empty());
        assert!(first.bytes().all(|b| BASE91_TABLE.contains(&b)));
    }
}
