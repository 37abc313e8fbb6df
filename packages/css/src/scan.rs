use std::ops::Range;

/// One `name: value` pair found in a raw style chunk. Ranges are byte
/// offsets into the scanned text; `range` includes the terminator when one
/// is present.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedDeclaration {
    pub name: String,
    pub value: String,
    pub name_range: Range<usize>,
    pub value_range: Range<usize>,
    pub range: Range<usize>,
}

/// Collects top-level declarations from a raw chunk of style text. Nested
/// blocks are skipped whole, selectors and stray text are ignored, and the
/// final declaration may run to the end of the chunk without a terminator.
/// Template chunks are scanned with this rather than the full parser since
/// a chunk can stop mid-rule at an interpolation hole.
pub fn scan_declarations(chunk: &str) -> Vec<ScannedDeclaration> {
    let bytes = chunk.as_bytes();
    let mut out = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        pos = skip_blank(chunk, pos);
        if pos >= bytes.len() {
            break;
        }
        match bytes[pos] {
            b'{' => pos = skip_block(chunk, pos),
            b'}' | b';' => pos += 1,
            _ => {
                let name_start = pos;
                let name_end = scan_ident(bytes, pos);
                let mut colon = name_end;
                while colon < bytes.len() && matches!(bytes[colon], b' ' | b'\t') {
                    colon += 1;
                }
                if name_end == name_start || colon >= bytes.len() || bytes[colon] != b':' {
                    pos = skip_fragment(chunk, pos);
                    continue;
                }
                let mut value_start = colon + 1;
                while value_start < bytes.len() && matches!(bytes[value_start], b' ' | b'\t') {
                    value_start += 1;
                }
                let (stop, stopper) = scan_value(chunk, value_start);
                if stopper == Some(b'{') {
                    // `div:hover {` reads like a declaration until the brace.
                    pos = skip_block(chunk, stop);
                    continue;
                }
                let value_end = chunk[..stop].trim_end().len().max(value_start);
                let range_end = if stopper == Some(b';') { stop + 1 } else { value_end };
                out.push(ScannedDeclaration {
                    name: chunk[name_start..name_end].to_string(),
                    value: chunk[value_start..value_end].to_string(),
                    name_range: name_start..name_end,
                    value_range: value_start..value_end,
                    range: name_start..range_end,
                });
                pos = if stopper == Some(b';') { stop + 1 } else { stop };
            }
        }
    }
    out
}

/// Cuts a scanned declaration out of `chunk`. When the declaration is the
/// only content on its line the line break goes with it, so removal does
/// not leave a blank line behind.
pub fn remove_declaration(chunk: &str, decl: &ScannedDeclaration) -> String {
    let mut start = decl.range.start;
    let mut end = decl.range.end;
    let line_start = chunk[..start].rfind('\n').map_or(0, |i| i + 1);
    if chunk[line_start..start].chars().all(|c| c == ' ' || c == '\t') {
        if line_start > 0 {
            start = line_start - 1;
        } else {
            start = line_start;
            if chunk[end..].starts_with('\n') {
                end += 1;
            }
        }
    } else {
        while start > line_start && matches!(chunk.as_bytes()[start - 1], b' ' | b'\t') {
            start -= 1;
        }
    }
    format!("{}{}", &chunk[..start], &chunk[end..])
}

/// Indentation of the first indented line, falling back to two spaces.
pub fn detect_indent(chunk: &str) -> String {
    for line in chunk.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let ws: String = line
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();
        if !ws.is_empty() {
            return ws;
        }
    }
    "  ".to_string()
}

fn scan_ident(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len()
        && (bytes[pos].is_ascii_alphanumeric() || matches!(bytes[pos], b'-' | b'_'))
    {
        pos += 1;
    }
    pos
}

/// Scans a declaration value, protecting strings and balanced parens.
/// Returns the stop offset and the byte that ended the scan, if any.
fn scan_value(chunk: &str, mut pos: usize) -> (usize, Option<u8>) {
    let bytes = chunk.as_bytes();
    let mut depth = 0usize;
    while pos < bytes.len() {
        match bytes[pos] {
            b'"' | b'\'' => pos = skip_string(bytes, pos),
            b'(' => {
                depth += 1;
                pos += 1;
            }
            b')' => {
                depth = depth.saturating_sub(1);
                pos += 1;
            }
            b';' | b'}' | b'{' | b'\n' if depth == 0 => return (pos, Some(bytes[pos])),
            _ => pos += 1,
        }
    }
    (pos, None)
}

/// Skips something that is not a declaration, up to its closing brace or
/// the next boundary.
fn skip_fragment(chunk: &str, mut pos: usize) -> usize {
    let bytes = chunk.as_bytes();
    while pos < bytes.len() {
        match bytes[pos] {
            b'"' | b'\'' => pos = skip_string(bytes, pos),
            b'{' => return skip_block(chunk, pos),
            b';' | b'\n' => return pos + 1,
            b'}' => return pos,
            _ => pos += 1,
        }
    }
    pos
}

/// From an opening `{`, returns the offset just past its matching `}`.
fn skip_block(chunk: &str, mut pos: usize) -> usize {
    let bytes = chunk.as_bytes();
    let mut depth = 0usize;
    while pos < bytes.len() {
        match bytes[pos] {
            b'"' | b'\'' => {
                pos = skip_string(bytes, pos);
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return pos + 1;
                }
            }
            _ => {}
        }
        pos += 1;
    }
    pos
}

fn skip_string(bytes: &[u8], mut pos: usize) -> usize {
    let quote = bytes[pos];
    pos += 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b if b == quote => return pos + 1,
            _ => pos += 1,
        }
    }
    pos
}

fn skip_blank(chunk: &str, mut pos: usize) -> usize {
    let bytes = chunk.as_bytes();
    while pos < bytes.len() {
        match bytes[pos] {
            b' ' | b'\t' | b'\n' | b'\r' => pos += 1,
            b'/' if pos + 1 < bytes.len() && bytes[pos + 1] == b'*' => {
                pos = match chunk[pos + 2..].find("*/") {
                    Some(end) => pos + 2 + end + 2,
                    None => bytes.len(),
                };
            }
            b'/' if pos + 1 < bytes.len() && bytes[pos + 1] == b'/' => {
                pos = match chunk[pos..].find('\n') {
                    Some(end) => pos + end + 1,
                    None => bytes.len(),
                };
            }
            _ => break,
        }
    }
    pos
}
