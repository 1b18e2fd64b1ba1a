//! Glob matching for frozen-key listings
//!
//! Supported syntax: `*` any run of bytes, `?` any single byte, `[abc]`
//! byte classes with `a-z` ranges and `[^...]` negation, `\` to match the
//! next byte literally. Matching is bytewise and case sensitive.

/// Whether `text` matches the glob `pattern` in full
///
/// Runs in `O(pattern.len() * text.len())`. Only the most recent `*` is
/// kept as a backtrack point.
pub fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let mut p = 0;
    let mut t = 0;
    // (pattern index after the last `*`, text index it currently absorbs up to)
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if pattern.get(p) == Some(&b'*') {
            p += 1;
            backtrack = Some((p, t));
            continue;
        }
        if let Some(used) = match_token(pattern, p, text[t]) {
            p += used;
            t += 1;
            continue;
        }
        let Some((star_p, star_t)) = backtrack else {
            return false;
        };
        p = star_p;
        t = star_t + 1;
        backtrack = Some((star_p, t));
    }

    pattern[p..].iter().all(|&b| b == b'*')
}

/// Match the single-byte token at `pattern[p]` against `byte`
///
/// Returns how many pattern bytes the token used, or `None` on a mismatch
/// or at the end of the pattern.
fn match_token(pattern: &[u8], p: usize, byte: u8) -> Option<usize> {
    match *pattern.get(p)? {
        b'?' => Some(1),
        b'[' => {
            let (matched, consumed) = match_class(&pattern[p + 1..], byte);
            matched.then_some(1 + consumed)
        }
        b'\\' if p + 1 < pattern.len() => (pattern[p + 1] == byte).then_some(2),
        literal => (literal == byte).then_some(1),
    }
}

/// Match `byte` against the class that follows an opening `[`
///
/// Returns the verdict and how many pattern bytes the class used, closing
/// `]` included. An unterminated class runs to the end of the pattern.
fn match_class(class: &[u8], byte: u8) -> (bool, usize) {
    let negate = class.first() == Some(&b'^');
    let mut i = usize::from(negate);
    let mut matched = false;

    while i < class.len() && class[i] != b']' {
        if class[i] == b'\\' && i + 1 < class.len() {
            matched |= class[i + 1] == byte;
            i += 2;
        } else if i + 2 < class.len() && class[i + 1] == b'-' && class[i + 2] != b']' {
            let (lo, hi) = if class[i] <= class[i + 2] {
                (class[i], class[i + 2])
            } else {
                (class[i + 2], class[i])
            };
            matched |= (lo..=hi).contains(&byte);
            i += 3;
        } else {
            matched |= class[i] == byte;
            i += 1;
        }
    }

    (matched != negate, (i + 1).min(class.len()))
}
