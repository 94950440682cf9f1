//! URL slugs for cities and venues

use std::collections::HashSet;

/// Longest slug stored for a venue
pub const MAX_VENUE_SLUG_CHARS: usize = 100;

/// Longest `-N` suffix a free-slug search is expected to append
const MAX_SUFFIX_CHARS: usize = 8;

fn transliterate(c: char) -> Option<&'static str> {
    let latin = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(latin)
}

/// Latin slug for a city name, e.g. "Нижний Новгород" -> "nizhniy-novgorod"
pub fn city_slug(name: &str) -> String {
    let mut latin = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        match transliterate(c) {
            Some(s) => latin.push_str(s),
            None => latin.push(c),
        }
    }

    let mut slug = String::with_capacity(latin.len());
    let mut pending_dash = false;
    for c in latin.chars() {
        if c.is_whitespace() || c == '-' {
            pending_dash = true;
        } else if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        }
    }

    slug
}

/// Base slug for a venue name; Cyrillic letters are kept as-is
pub fn venue_base_slug(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .filter(|c| {
            c.is_ascii_lowercase()
                || c.is_ascii_digit()
                || ('а'..='я').contains(c)
                || *c == 'ё'
                || c.is_whitespace()
                || *c == '-'
        })
        .collect();

    let slug = cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .take(MAX_VENUE_SLUG_CHARS)
        .collect::<String>();

    match slug.trim_matches('-') {
        "" => "venue".to_string(),
        slug => slug.to_string(),
    }
}

/// Leading part shared by `base` and every suffixed slug derived from it
pub fn slug_family_prefix(base: &str) -> String {
    base.chars()
        .take(MAX_VENUE_SLUG_CHARS - MAX_SUFFIX_CHARS - 1)
        .collect()
}

fn with_suffix(base: &str, n: u32) -> String {
    let suffix = format!("-{}", n);
    let room = MAX_VENUE_SLUG_CHARS.saturating_sub(suffix.len());
    let stem: String = base.chars().take(room).collect();
    format!("{}{}", stem.trim_end_matches('-'), suffix)
}

/// First of `base`, `base-1`, `base-2`, ... not present in `taken`
///
/// The base is shortened when needed so that a suffixed slug still fits in
/// [`MAX_VENUE_SLUG_CHARS`].
pub fn next_free_slug(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }

    (1..)
        .map(|n| with_suffix(base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}
