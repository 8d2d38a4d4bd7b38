use crate::error::{AppError, AppResult};

/// Builds a URL-safe slug: lower-case ASCII, diacritics folded, words joined by `-`.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;
    let mut buf = [0u8; 4];

    for c in text.chars().flat_map(char::to_lowercase) {
        if is_combining_mark(c) {
            continue;
        }
        let folded =
            if c.is_ascii_alphanumeric() { Some(&*c.encode_utf8(&mut buf)) } else { fold(c) };
        let Some(folded) = folded else {
            pending_dash = !out.is_empty();
            continue;
        };
        if pending_dash {
            out.push('-');
            pending_dash = false;
        }
        out.push_str(folded);
    }

    out
}

pub fn validate_slug(slug: &str) -> AppResult<()> {
    let valid = !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid { Ok(()) } else { Err(AppError::bad_request(format!("invalid slug: {slug:?}"))) }
}

/// Uses the explicit slug when given, otherwise derives one from `name`.
pub fn resolve_slug(explicit: Option<&str>, name: &str) -> AppResult<String> {
    let slug = match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.to_string(),
        None => slugify(name),
    };
    validate_slug(&slug)?;
    Ok(slug)
}

fn is_combining_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

fn fold(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'ạ' | 'ả' | 'ã' | 'â' | 'ầ' | 'ấ' | 'ậ' | 'ẩ' | 'ẫ' | 'ă' | 'ằ' | 'ắ' | 'ặ'
        | 'ẳ' | 'ẵ' | 'ä' | 'å' => "a",
        'è' | 'é' | 'ẹ' | 'ẻ' | 'ẽ' | 'ê' | 'ề' | 'ế' | 'ệ' | 'ể' | 'ễ' | 'ë' => "e",
        'ì' | 'í' | 'ị' | 'ỉ' | 'ĩ' | 'î' | 'ï' => "i",
        'ò' | 'ó' | 'ọ' | 'ỏ' | 'õ' | 'ô' | 'ồ' | 'ố' | 'ộ' | 'ổ' | 'ỗ' | 'ơ' | 'ờ' | 'ớ' | 'ợ'
        | 'ở' | 'ỡ' | 'ö' | 'ø' => "o",
        'ù' | 'ú' | 'ụ' | 'ủ' | 'ũ' | 'ư' | 'ừ' | 'ứ' | 'ự' | 'ử' | 'ữ' | 'û' | 'ü' => "u",
        'ỳ' | 'ý' | 'ỵ' | 'ỷ' | 'ỹ' | 'ÿ' => "y",
        'đ' => "d",
        'ç' => "c",
        'ñ' => "n",
        'ß' => "ss",
        'æ' => "ae",
        _ => return None,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_folds_vietnamese() {
        assert_eq!(slugify("Hành Động"), "hanh-dong");
        assert_eq!(slugify("Phim Bộ"), "phim-bo");
        assert_eq!(slugify("Việt Nam"), "viet-nam");
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Spider-Man: No Way Home (2021) "), "spider-man-no-way-home-2021");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn validate_slug_rejects_bad_input() {
        assert!(validate_slug("hanh-dong").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("-lead").is_err());
        assert!(validate_slug("Upper").is_err());
        assert!(validate_slug("a--b").is_err());
    }

    #[test]
    fn resolve_slug_prefers_explicit() {
        assert_eq!(resolve_slug(Some("custom"), "Hành Động").unwrap(), "custom");
        assert_eq!(resolve_slug(Some("  "), "Hành Động").unwrap(), "hanh-dong");
        assert!(resolve_slug(None, "!!!").is_err());
    }
}
