//! The `<?xml …?>` declaration.
//!
//! The declaration is collected like any processing instruction and its
//! body re-scanned here as `name = 'value'` pseudo-attributes. Recognized
//! keys, in their required order: `version` (must be `1.0`), `encoding`,
//! `standalone` (`yes`/`no`, accepted but not acted upon).

use super::*;

pub(super) struct XmlDecl {
    /// The declared encoding label, to be resolved by the driver.
    pub(super) encoding: Option<String>,
}

pub(super) fn parse(data: &str) -> Result<XmlDecl, Error> {
    let pairs = pseudo_attrs(data)?;

    let mut pairs = pairs.into_iter().peekable();
    match pairs.next() {
        Some((key, value)) if key == "version" => {
            if value != "1.0" {
                syntax!("unsupported XML version `{value}`");
            }
        }
        _ => syntax!("the XML declaration must start with version=\"1.0\""),
    }

    let mut encoding = None;
    if matches!(pairs.peek(), Some((key, _)) if key == "encoding") {
        if let Some((_, value)) = pairs.next() {
            if !is_enc_name(&value) {
                syntax!("`{value}` is not a valid encoding name");
            }
            encoding = Some(value);
        }
    }

    if matches!(pairs.peek(), Some((key, _)) if key == "standalone") {
        if let Some((_, value)) = pairs.next() {
            if value != "yes" && value != "no" {
                syntax!("standalone must be 'yes' or 'no', not `{value}`");
            }
        }
    }

    if let Some((key, _)) = pairs.next() {
        syntax!("unexpected `{key}` in the XML declaration");
    }

    Ok(XmlDecl { encoding })
}

fn pseudo_attrs(data: &str) -> Result<Vec<(String, String)>, Error> {
    let mut chars = data.chars().peekable();
    let mut pairs = Vec::new();
    loop {
        while matches!(chars.peek(), Some(&c) if is_space(c)) {
            chars.next();
        }
        let Some(&c) = chars.peek() else { break };
        if !is_first_namechar(c) {
            syntax!("malformed XML declaration");
        }

        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if is_namechar(c) {
                name.push(c);
                chars.next();
            } else {
                break;
            }
        }

        while matches!(chars.peek(), Some(&c) if is_space(c)) {
            chars.next();
        }
        if chars.next() != Some('=') {
            syntax!("expected '=' after `{name}` in the XML declaration");
        }
        while matches!(chars.peek(), Some(&c) if is_space(c)) {
            chars.next();
        }

        let quote = match chars.next() {
            Some(q @ ('"' | '\'')) => q,
            _ => syntax!("expected a quoted value for `{name}` in the XML declaration"),
        };
        let mut value = String::new();
        loop {
            match chars.next() {
                Some(c) if c == quote => break,
                Some(c) => value.push(c),
                None => syntax!("unterminated value for `{name}` in the XML declaration"),
            }
        }
        pairs.push((name, value));
    }
    Ok(pairs)
}

fn is_enc_name(label: &str) -> bool {
    let mut chars = label.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}
