// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extraction of the `<GP>` reply from a raw printer response.
//
// The printer happily surrounds its reply with greeting bytes, stray NULs
// and partial lines.  The envelope is located by the *first* `<GP` and the
// *last* `</GP>`; everything between (inclusive) must be a well-formed XML
// element named `GP`.  Only the immediate children are modelled:
//
//   junk<GP><STATE>READY</STATE><ERR/></GP>\0   →   { STATE: "READY", ERR: "" }
//
// Two complete envelopes in one buffer therefore merge into one fragment
// with content after the root, which fails as `MalformedXml`.

use std::borrow::Cow;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::debug;

use alphajet_core::error::{AlphaJetError, Result};
use alphajet_core::types::GpFields;

use crate::envelope::{CLOSE_TAG, ENVELOPE_TAG, OPEN_PREFIX};

/// Locate the envelope in `raw` and return the slice from the first `<GP`
/// through the last `</GP>` inclusive.
pub fn locate_envelope(raw: &str) -> Result<&str> {
    let (Some(start), Some(end)) = (raw.find(OPEN_PREFIX), raw.rfind(CLOSE_TAG)) else {
        return Err(AlphaJetError::EnvelopeNotFound {
            raw: raw.to_string(),
        });
    };

    if end < start {
        return Err(AlphaJetError::MalformedXml {
            detail: "closing GP tag precedes the opening tag".into(),
            fragment: String::new(),
        });
    }

    Ok(&raw[start..end + CLOSE_TAG.len()])
}

/// Parse a raw printer response into its GP fields.
pub fn parse_response(raw: &str) -> Result<GpFields> {
    let fragment = locate_envelope(raw)?;
    let fields = parse_fragment(fragment)?;
    debug!(
        fields = fields.len(),
        noise = raw.len() - fragment.len(),
        "parsed GP response"
    );
    Ok(fields)
}

/// Child element of the root whose text is still being collected.
struct OpenField {
    name: String,
    text: String,
    /// Set once the first grandchild starts; later text belongs to that
    /// grandchild's tail, not to this field.
    text_done: bool,
}

/// Parse a fragment that starts at `<GP` and ends at `</GP>`.
fn parse_fragment(fragment: &str) -> Result<GpFields> {
    let malformed = |detail: String| AlphaJetError::MalformedXml {
        detail,
        fragment: fragment.to_string(),
    };

    let mut reader = Reader::from_str(fragment);
    reader.config_mut().check_end_names = true;

    let mut fields = GpFields::new();
    let mut open: Option<OpenField> = None;
    let mut depth = 0usize;
    let mut root_closed = false;

    loop {
        match reader.read_event() {
            Err(e) => return Err(malformed(e.to_string())),
            Ok(Event::Eof) => break,

            Ok(Event::Start(e)) => {
                check_element(&e, depth, root_closed).map_err(malformed)?;
                match depth {
                    1 => {
                        open = Some(OpenField {
                            name: element_name(&e),
                            text: String::new(),
                            text_done: false,
                        })
                    }
                    2 => {
                        if let Some(field) = open.as_mut() {
                            field.text_done = true;
                        }
                    }
                    _ => {}
                }
                depth += 1;
            }

            Ok(Event::Empty(e)) => {
                check_element(&e, depth, root_closed).map_err(malformed)?;
                match depth {
                    0 => root_closed = true,
                    1 => {
                        fields.insert(element_name(&e), String::new());
                    }
                    2 => {
                        if let Some(field) = open.as_mut() {
                            field.text_done = true;
                        }
                    }
                    _ => {}
                }
            }

            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                match depth {
                    0 => root_closed = true,
                    1 => {
                        if let Some(field) = open.take() {
                            fields.insert(field.name, field.text);
                        }
                    }
                    _ => {}
                }
            }

            Ok(Event::Text(t)) => {
                // Line ends are normalized before unescaping so `&#13;`
                // survives as a literal carriage return.
                let raw = std::str::from_utf8(&t).map_err(|e| malformed(e.to_string()))?;
                let text = unescape(&normalize_line_ends(raw))
                    .map_err(|e| malformed(e.to_string()))?
                    .into_owned();
                if depth == 0 {
                    if !text.trim().is_empty() {
                        return Err(malformed("text outside the GP element".into()));
                    }
                } else if depth == 2 {
                    append_text(open.as_mut(), &text);
                }
            }

            Ok(Event::CData(c)) => {
                if depth == 0 {
                    return Err(malformed("CDATA outside the GP element".into()));
                }
                if depth == 2 {
                    let raw = String::from_utf8_lossy(&c);
                    append_text(open.as_mut(), &normalize_line_ends(&raw));
                }
            }

            Ok(Event::Decl(_)) => {
                return Err(malformed("XML declaration inside the GP element".into()));
            }

            Ok(Event::DocType(_)) => {
                return Err(malformed("DOCTYPE inside the GP element".into()));
            }

            // Comments and processing instructions carry no field data.
            Ok(_) => {}
        }
    }

    if depth != 0 || !root_closed {
        return Err(malformed("GP element is not closed".into()));
    }

    Ok(fields)
}

/// Validate a start or empty tag at `depth`: the root must be `GP`, nothing
/// may follow the closed root, and attributes must be well-formed.
fn check_element(
    e: &BytesStart<'_>,
    depth: usize,
    root_closed: bool,
) -> std::result::Result<(), String> {
    if root_closed {
        return Err(format!(
            "element <{}> after the GP element closed",
            element_name(e)
        ));
    }
    if depth == 0 && e.name().as_ref() != ENVELOPE_TAG.as_bytes() {
        return Err(format!(
            "root element is <{}>, expected <{ENVELOPE_TAG}>",
            element_name(e)
        ));
    }
    for attr in e.attributes() {
        attr.map_err(|err| format!("bad attribute on <{}>: {err}", element_name(e)))?;
    }
    Ok(())
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

/// XML end-of-line handling: `\r\n` and lone `\r` both become `\n`.
fn normalize_line_ends(raw: &str) -> Cow<'_, str> {
    if raw.contains('\r') {
        Cow::Owned(raw.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(raw)
    }
}

fn append_text(field: Option<&mut OpenField>, text: &str) {
    if let Some(field) = field {
        if !field.text_done {
            field.text.push_str(text);
        }
    }
}
