use super::types::{DiffFile, Hunk};
use super::PrError;

/// Parse a unified diff string into a vector of DiffFile structs.
///
/// The input is the raw text printed by `gh pr diff`.
///
/// Each file section starts with:
///   diff --git a/{path} b/{path}
///
/// New files have: `--- /dev/null`
/// Deleted files have: `+++ /dev/null`
///
/// Hunks start with: @@ -{old_start},{old_count} +{new_start},{new_count} @@ {section}
///
/// Lines are prefixed with:
///   '+' for additions
///   '-' for deletions
///   ' ' for context (unchanged)
///   '\' for "No newline at end of file" markers
pub fn parse_diff(raw_diff: &str) -> Result<Vec<DiffFile>, PrError> {
    if raw_diff.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let mut current_file: Option<DiffFile> = None;
    let mut current_hunk: Option<Hunk> = None;

    let finish_hunk = |file: &mut Option<DiffFile>, hunk: &mut Option<Hunk>| {
        if let (Some(file), Some(hunk)) = (file.as_mut(), hunk.take()) {
            file.hunks.push(hunk);
        }
    };

    let finish_file =
        |files: &mut Vec<DiffFile>, file: &mut Option<DiffFile>, hunk: &mut Option<Hunk>| {
            finish_hunk(file, hunk);
            if let Some(file) = file.take() {
                files.push(file);
            }
        };

    // Path from the `--- a/...` line; a deleted file has no `+++ b/...` line.
    let mut old_path: Option<String> = None;

    for line in raw_diff.lines() {
        if let Some(rest) = line.strip_prefix("diff --git ") {
            finish_file(&mut files, &mut current_file, &mut current_hunk);
            old_path = None;
            current_file = Some(DiffFile {
                path: path_from_git_header(rest)?,
                is_new: false,
                is_deleted: false,
                additions: 0,
                deletions: 0,
                hunks: Vec::new(),
            });
            continue;
        }

        if line.starts_with("@@") {
            finish_hunk(&mut current_file, &mut current_hunk);
            current_hunk = Some(parse_hunk_header(line)?);
            continue;
        }

        // Header lines only occur between `diff --git` and the first hunk.
        if current_hunk.is_none() {
            if let Some(file) = current_file.as_mut() {
                if let Some(raw) = line.strip_prefix("--- ") {
                    old_path = marker_path(raw)?;
                    file.is_new = old_path.is_none();
                } else if let Some(raw) = line.strip_prefix("+++ ") {
                    match marker_path(raw)? {
                        Some(path) => file.path = path,
                        None => {
                            file.is_deleted = true;
                            if let Some(path) = old_path.take() {
                                file.path = path;
                            }
                        }
                    }
                } else if let Some(raw) = line.strip_prefix("rename to ") {
                    file.path = unquote_path(raw)?;
                }
            }
            continue;
        }

        if let (Some(file), Some(hunk)) = (current_file.as_mut(), current_hunk.as_mut()) {
            if line.starts_with('+') {
                file.additions += 1;
                hunk.lines.push(line.to_string());
            } else if line.starts_with('-') {
                file.deletions += 1;
                hunk.lines.push(line.to_string());
            } else if line.starts_with(' ') || line.starts_with('\\') {
                hunk.lines.push(line.to_string());
            } else if line.is_empty() {
                // Some tools strip the space off blank context lines.
                hunk.lines.push(" ".to_string());
            }
        }
    }

    finish_file(&mut files, &mut current_file, &mut current_hunk);
    Ok(files)
}

/// Path of the new side of a `diff --git a/X b/Y` header (the text after
/// `diff --git `). Unquoted paths may contain spaces, so the header is split
/// where both halves name the same file; renames fall back to the first
/// ` b/` and are corrected later by `rename to` or `+++`.
fn path_from_git_header(rest: &str) -> Result<String, PrError> {
    let missing = || PrError::DiffParse(format!("Malformed diff header: {}", rest));
    let rest = rest.trim_end();

    if rest.starts_with('"') {
        let (a_path, remainder) = unquote(rest)?;
        let remainder = remainder.trim_start();
        let b_path = if remainder.starts_with('"') {
            unquote(remainder)?.0
        } else {
            remainder.to_string()
        };
        return Ok(strip_side(&b_path, "b/")
            .or_else(|| strip_side(&a_path, "a/"))
            .unwrap_or(b_path));
    }

    let body = rest.strip_prefix("a/").ok_or_else(missing)?;
    if let Some(idx) = body.find(" \"b/") {
        let (b_path, _) = unquote(&body[idx + 1..])?;
        return Ok(strip_side(&b_path, "b/").unwrap_or(b_path));
    }

    if body.len() > 3 && (body.len() - 3) % 2 == 0 {
        let half = (body.len() - 3) / 2;
        if body.is_char_boundary(half)
            && body[half..].starts_with(" b/")
            && body[..half] == body[half + 3..]
        {
            return Ok(body[..half].to_string());
        }
    }

    body.split_once(" b/")
        .map(|(_, b_path)| b_path.to_string())
        .ok_or_else(missing)
}

/// Path on a `---`/`+++` line with its `a/`/`b/` prefix removed; None for
/// `/dev/null`. Git appends a tab after names that contain spaces.
fn marker_path(raw: &str) -> Result<Option<String>, PrError> {
    let raw = raw.trim_end_matches(['\t', '\r']);
    if raw == "/dev/null" {
        return Ok(None);
    }
    let path = unquote_path(raw)?;
    Ok(Some(
        strip_side(&path, "a/")
            .or_else(|| strip_side(&path, "b/"))
            .unwrap_or(path),
    ))
}

fn strip_side(path: &str, prefix: &str) -> Option<String> {
    path.strip_prefix(prefix).map(str::to_string)
}

/// A path that may be wrapped in git's C-style quotes.
fn unquote_path(raw: &str) -> Result<String, PrError> {
    let raw = raw.trim_end_matches(['\t', '\r']);
    if raw.starts_with('"') {
        Ok(unquote(raw)?.0)
    } else {
        Ok(raw.to_string())
    }
}

/// Decode a leading git-quoted string (`"..."` with backslash escapes and
/// octal-encoded bytes). Returns the decoded text and the remainder after the
/// closing quote.
fn unquote(quoted: &str) -> Result<(String, &str), PrError> {
    let invalid = || PrError::DiffParse(format!("Invalid quoted path: {}", quoted));
    let body = quoted.strip_prefix('"').ok_or_else(invalid)?;
    let bytes = body.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                return Ok((String::from_utf8_lossy(&decoded).into_owned(), &body[i + 1..]));
            }
            b'\\' => {
                let escape = *bytes.get(i + 1).ok_or_else(invalid)?;
                if escape.is_ascii_digit() {
                    let digits = body.get(i + 1..i + 4).ok_or_else(invalid)?;
                    decoded.push(u8::from_str_radix(digits, 8).map_err(|_| invalid())?);
                    i += 4;
                    continue;
                }
                decoded.push(match escape {
                    b'a' => 0x07,
                    b'b' => 0x08,
                    b't' => b'\t',
                    b'n' => b'\n',
                    b'v' => 0x0b,
                    b'f' => 0x0c,
                    b'r' => b'\r',
                    other => other,
                });
                i += 2;
            }
            byte => {
                decoded.push(byte);
                i += 1;
            }
        }
    }

    Err(invalid())
}

fn parse_hunk_header(line: &str) -> Result<Hunk, PrError> {
    let header = line
        .strip_prefix("@@")
        .ok_or_else(|| PrError::DiffParse("Invalid hunk header".to_string()))?;
    let (ranges, section) = header
        .split_once("@@")
        .ok_or_else(|| PrError::DiffParse(format!("Unterminated hunk header: {}", line)))?;

    let mut parts = ranges.split_whitespace();
    let old_part = parts
        .next()
        .ok_or_else(|| PrError::DiffParse("Missing old range".to_string()))?;
    let new_part = parts
        .next()
        .ok_or_else(|| PrError::DiffParse("Missing new range".to_string()))?;

    let (old_start, old_count) = parse_range(old_part, '-')?;
    let (new_start, new_count) = parse_range(new_part, '+')?;

    Ok(Hunk {
        old_start,
        old_count,
        new_start,
        new_count,
        section: section.trim().to_string(),
        lines: Vec::new(),
    })
}

fn parse_range(part: &str, prefix: char) -> Result<(usize, usize), PrError> {
    let range = part
        .strip_prefix(prefix)
        .ok_or_else(|| PrError::DiffParse("Invalid range prefix".to_string()))?;
    let (start_str, count_str) = match range.split_once(',') {
        Some((start, count)) => (start, count),
        None => (range, "1"),
    };
    let start = start_str
        .parse::<usize>()
        .map_err(|_| PrError::DiffParse(format!("Invalid range start in {}", part)))?;
    let count = count_str
        .parse::<usize>()
        .map_err(|_| PrError::DiffParse(format!("Invalid range count in {}", part)))?;
    Ok((start, count))
}
