use std::borrow::Cow;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

const DOT: char = '.';
const HYPHEN: char = '-';

/// Fold a raw name into a lowercase ASCII token usable as an email local part.
///
/// Whitespace becomes `.`, diacritics are folded to their base letters, any other
/// character outside `[a-z0-9.-]` is dropped. Separator runs collapse to a single
/// separator (`-` wins over `.`) and never lead or trail the token.
pub fn normalize_name(raw: &str) -> String {
    let mut token = String::with_capacity(raw.len());
    let mut pending: Option<char> = None;

    for ch in raw.trim().nfd() {
        if is_combining_mark(ch) {
            continue;
        }

        if ch.is_whitespace() || ch == DOT || ch == HYPHEN {
            pending = match (pending, ch) {
                (Some(HYPHEN), _) | (_, HYPHEN) => Some(HYPHEN),
                _ => Some(DOT),
            };
            continue;
        }

        let folded = fold_letter(ch);
        let mut chars = folded.chars().filter(|c| c.is_ascii_alphanumeric()).peekable();
        if chars.peek().is_none() {
            continue;
        }

        if let Some(separator) = pending.take()
            && !token.is_empty()
        {
            token.push(separator);
        }
        token.extend(chars.map(|c| c.to_ascii_lowercase()));
    }

    token
}

/// `first.last` token, absent unless both name parts are present.
pub fn first_last(first_name: Option<&str>, last_name: Option<&str>) -> Option<String> {
    let (first, last) = (first_name?, last_name?);
    Some(format!("{}.{}", normalize_name(first), normalize_name(last)))
}

/// Letters with no canonical decomposition into an ASCII base.
fn fold_letter(ch: char) -> Cow<'static, str> {
    let folded = match ch {
        'ß' => "ss",
        'æ' => "ae",
        'Æ' => "AE",
        'œ' => "oe",
        'Œ' => "OE",
        'ø' => "o",
        'Ø' => "O",
        'ð' => "d",
        'Ð' => "D",
        'đ' => "d",
        'Đ' => "D",
        'þ' => "th",
        'Þ' => "TH",
        'ł' => "l",
        'Ł' => "L",
        'ı' => "i",
        'ĳ' => "ij",
        'Ĳ' => "IJ",
        'ŀ' => "l",
        'Ŀ' => "L",
        'ħ' => "h",
        'Ħ' => "H",
        'ŧ' => "t",
        'Ŧ' => "T",
        _ => return Cow::Owned(ch.to_string()),
    };
    Cow::Borrowed(folded)
}
