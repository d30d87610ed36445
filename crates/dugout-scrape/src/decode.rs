// Text cleanup for scraped cells: entities, bracketed annotations, whitespace.

/// Decode a scraped cell into plain text. Leftover HTML entities are decoded,
/// `[...]` and `(...)` annotations are dropped, and runs of whitespace
/// collapse to single spaces.
pub fn clean_text(s: &str) -> String {
    normalize_ws(&strip_annotations(&decode_entities(s)))
}

/// Decode the named entities the league pages use plus numeric `&#NN;` and
/// `&#xHH;` forms. Unknown entities are left as written.
pub fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';').filter(|end| *end <= 10) {
            Some(end) => match decode_entity(&tail[1..end]) {
                Some(ch) => {
                    out.push(ch);
                    rest = &tail[end + 1..];
                }
                None => {
                    out.push('&');
                    rest = &tail[1..];
                }
            },
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "nbsp" => Some(' '),
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            // Non-breaking space decodes to a plain space like its named form.
            if code == 0xA0 {
                return Some(' ');
            }
            char::from_u32(code)
        }
    }
}

/// Remove `[ ... ]` and `( ... )` annotations, e.g. `Smith, Jo [C]` or
/// `Bats (forfeit)`. No nesting.
pub fn strip_annotations(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut closer: Option<char> = None;
    for ch in s.chars() {
        match (closer, ch) {
            (None, '[') => closer = Some(']'),
            (None, '(') => closer = Some(')'),
            (None, _) => out.push(ch),
            (Some(end), _) if ch == end => closer = None,
            (Some(_), _) => {}
        }
    }
    out
}

pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
