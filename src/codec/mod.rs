//! Semicolon-delimited CSV interchange for document records.
//!
//! `encode` and `decode` are pure functions over text. Decoding is
//! deliberately permissive: rows that do not carry enough fields are dropped
//! instead of failing the whole payload.

use std::borrow::Cow;

use crate::models::{Document, NewDocument};

/// Field delimiter.
pub const DELIMITER: char = ';';

const QUOTE: char = '"';

/// Column labels of the header row, in field order.
pub const HEADERS: [&str; 7] = [
    "№ п/п",
    "№ дела",
    "Наименование",
    "Шифр",
    "Дата утверждения",
    "Область действия",
    "Ссылка",
];

/// Minimum number of fields a data row needs to be imported.
pub const FIELD_COUNT: usize = HEADERS.len();

/// Suggested file name for a downloaded export.
pub const EXPORT_FILE_NAME: &str = "documents_smk_smbpp.csv";

/// Prefix of the downloadable resource locator built by [`to_data_uri`].
pub const DATA_URI_PREFIX: &str = "data:text/csv;charset=utf-8,";

/// Encode documents as a header line followed by one line per document.
///
/// `name` and `scope` are always quoted with inner quotes doubled. The other
/// fields are written as-is unless they contain a delimiter, quote or line
/// break, in which case they are quoted the same way.
pub fn encode<'a, I>(documents: I) -> String
where
    I: IntoIterator<Item = &'a Document>,
{
    let separator = DELIMITER.to_string();
    let mut out = HEADERS.join(separator.as_str());
    out.push('\n');

    for doc in documents {
        let row: [Cow<'_, str>; FIELD_COUNT] = [
            plain(&doc.number),
            plain(&doc.case_number),
            Cow::Owned(quoted(&doc.name)),
            plain(&doc.code),
            plain(&doc.date),
            Cow::Owned(quoted(&doc.scope)),
            plain(&doc.link),
        ];
        out.push_str(&row.join(separator.as_str()));
        out.push('\n');
    }

    out
}

/// Decode delimited text into create payloads.
///
/// The first line is the header and is always skipped. Blank lines are
/// ignored, as are rows with fewer than [`FIELD_COUNT`] fields. Extra
/// trailing fields are ignored. Field contents are not validated.
pub fn decode(text: &str) -> Vec<NewDocument> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    split_rows(text)
        .into_iter()
        .skip(1)
        .filter(|row| !row.blank)
        .filter_map(|row| {
            let line = row.line;
            if row.unterminated {
                tracing::debug!(line, "Skipping CSV row with an unterminated quote");
                return None;
            }
            let doc = row_to_document(row.fields);
            if doc.is_none() {
                tracing::debug!(line, "Skipping CSV row with fewer than {} fields", FIELD_COUNT);
            }
            doc
        })
        .collect()
}

/// Wrap encoded CSV as a `data:` URI with the payload escaped the way
/// browsers' `encodeURI` does.
pub fn to_data_uri(csv: &str) -> String {
    let mut out = String::with_capacity(DATA_URI_PREFIX.len() + csv.len());
    out.push_str(DATA_URI_PREFIX);

    let mut buf = [0u8; 4];
    for c in csv.chars() {
        if is_uri_safe(c) {
            out.push(c);
        } else {
            for byte in c.encode_utf8(&mut buf).as_bytes() {
                out.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    out
}

fn is_uri_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || ";,/?:@&=+$-_.!~*'()#".contains(c)
}

fn quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push(QUOTE);
    out.push_str(&value.replace(QUOTE, "\"\""));
    out.push(QUOTE);
    out
}

fn plain(value: &str) -> Cow<'_, str> {
    if value.contains([DELIMITER, QUOTE, '\n', '\r']) {
        Cow::Owned(quoted(value))
    } else {
        Cow::Borrowed(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Unquoted,
    Quoted,
}

/// One physical record of the payload.
#[derive(Debug)]
struct Row {
    fields: Vec<String>,
    /// No delimiter, quote or non-whitespace character was seen
    blank: bool,
    /// A quoted section was still open at end of input
    unterminated: bool,
    /// Zero-based line the row starts on
    line: usize,
}

/// Split the payload into rows, one [`scan_row`] at a time.
fn split_rows(text: &str) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut pos = 0usize;
    let mut line = 0usize;

    while pos < text.len() {
        let (row, next) = scan_row(text, pos, line);
        line += text[pos..next].matches('\n').count();
        rows.push(row);
        pos = next;
    }

    rows
}

/// Two-state scanner for the row starting at byte `start`.
///
/// Outside quotes a `"` opens a quoted section, the delimiter ends a field
/// and a line break ends the row. Inside quotes `""` is a literal quote, a
/// lone `"` closes the section and everything else, line breaks included,
/// belongs to the field.
///
/// A quoted section still open at end of input is a stray quote: the row
/// then ends at its first line break and is marked unterminated, so the rows
/// after it are scanned normally. Returns the row and the byte offset where
/// the next row begins.
fn scan_row(text: &str, start: usize, line: usize) -> (Row, usize) {
    let rest = &text[start..];
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut blank = true;
    let mut state = ScanState::Unquoted;

    let mut chars = rest.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let next_char = chars.peek().map(|&(_, n)| n);
        match state {
            ScanState::Quoted => match c {
                QUOTE if next_char == Some(QUOTE) => {
                    chars.next();
                    field.push(QUOTE);
                }
                QUOTE => state = ScanState::Unquoted,
                _ => field.push(c),
            },
            ScanState::Unquoted => match c {
                QUOTE => {
                    state = ScanState::Quoted;
                    blank = false;
                }
                DELIMITER => {
                    fields.push(std::mem::take(&mut field));
                    blank = false;
                }
                '\r' if next_char == Some('\n') => {}
                '\n' => {
                    fields.push(field);
                    let row = Row {
                        fields,
                        blank,
                        unterminated: false,
                        line,
                    };
                    return (row, start + i + 1);
                }
                _ => {
                    if !c.is_whitespace() {
                        blank = false;
                    }
                    field.push(c);
                }
            },
        }
    }

    if state == ScanState::Quoted {
        let end = rest.find('\n').map_or(text.len(), |i| start + i + 1);
        let row = Row {
            fields: Vec::new(),
            blank: false,
            unterminated: true,
            line,
        };
        return (row, end);
    }

    fields.push(field);
    let row = Row {
        fields,
        blank,
        unterminated: false,
        line,
    };
    (row, text.len())
}

fn row_to_document(fields: Vec<String>) -> Option<NewDocument> {
    if fields.len() < FIELD_COUNT {
        return None;
    }
    let mut it = fields.into_iter();
    Some(NewDocument {
        number: it.next()?,
        case_number: it.next()?,
        name: it.next()?,
        code: it.next()?,
        date: it.next()?,
        scope: it.next()?,
        link: it.next()?,
    })
}
