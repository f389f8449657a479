//! URL slugs for products and categories
//!
//! French accents are folded to ASCII, everything else that is not
//! alphanumeric collapses into a single `-`.

/// Build a slug from a display name
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        let folded = if c.is_ascii_alphanumeric() {
            Folded::Ascii(c.to_ascii_lowercase())
        } else {
            fold_accent(c).map_or(Folded::Separator, Folded::Text)
        };
        if matches!(folded, Folded::Separator) {
            pending_dash = !out.is_empty();
            continue;
        }
        if pending_dash {
            out.push('-');
            pending_dash = false;
        }
        match folded {
            Folded::Ascii(a) => out.push(a),
            Folded::Text(t) => out.push_str(t),
            Folded::Separator => {}
        }
    }
    out
}

/// `base`, then `base-2`, `base-3`, ... for collision resolution
pub fn with_suffix(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}

enum Folded {
    Ascii(char),
    Text(&'static str),
    Separator,
}

fn fold_accent(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'â' | 'ä' | 'á' | 'ã' | 'å' | 'À' | 'Â' | 'Ä' | 'Á' | 'Ã' | 'Å' => "a",
        'ç' | 'Ç' => "c",
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => "e",
        'î' | 'ï' | 'í' | 'ì' | 'Î' | 'Ï' | 'Í' | 'Ì' => "i",
        'ô' | 'ö' | 'ó' | 'ò' | 'õ' | 'Ô' | 'Ö' | 'Ó' | 'Ò' | 'Õ' => "o",
        'ù' | 'û' | 'ü' | 'ú' | 'Ù' | 'Û' | 'Ü' | 'Ú' => "u",
        'ÿ' | 'ý' | 'Ÿ' | 'Ý' => "y",
        'ñ' | 'Ñ' => "n",
        'œ' | 'Œ' => "oe",
        'æ' | 'Æ' => "ae",
        'ß' => "ss",
        _ => return None,
    };
    Some(folded)
}
