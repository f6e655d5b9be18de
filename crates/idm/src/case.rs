//! Identifier case conversion
//!
//! Generators derive every identifier they emit through these functions, so
//! they must be deterministic for any input. Words are found by splitting on
//! any non-alphanumeric character and on case humps:
//!
//! - `fooBar` and `FooBar` split before `B`
//! - an upper case run followed by a lower case letter hands its last letter
//!   to the next word (`FOOBar` -> `FOO`, `Bar`)
//! - a single leading lower case letter does not form a word of its own
//!   (`bAr` stays one word)
//!
//! With `preserve_acronyms`, a word of two or more upper case letters that is
//! followed by another word is kept verbatim in Pascal and camel case output.

/// Split `input` into words.
pub fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    for chunk in input.split(|c: char| !c.is_alphanumeric()) {
        if !chunk.is_empty() {
            split_chunk(chunk, &mut words);
        }
    }
    words
}

fn split_chunk(chunk: &str, words: &mut Vec<String>) {
    let chars: Vec<char> = chunk.chars().collect();
    let mut current = String::new();
    let mut current_len = 0usize;

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            let boundary = if prev.is_lowercase() || prev.is_numeric() {
                match next {
                    Some(n) if n.is_lowercase() => current_len >= 2,
                    Some(n) if n.is_uppercase() => true,
                    _ => false,
                }
            } else if prev.is_uppercase() {
                matches!(next, Some(n) if n.is_lowercase()) && current_len >= 2
            } else {
                false
            };

            if boundary {
                words.push(std::mem::take(&mut current));
                current_len = 0;
            }
        }
        current.push(c);
        current_len += 1;
    }

    if !current.is_empty() {
        words.push(current);
    }
}

fn is_acronym(word: &str) -> bool {
    let mut letters = 0;
    for c in word.chars().filter(|c| c.is_alphabetic()) {
        if !c.is_uppercase() {
            return false;
        }
        letters += 1;
    }
    letters >= 2
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn join_words(words: &[String], separator: &str, upper: bool) -> String {
    words
        .iter()
        .map(|w| if upper { w.to_uppercase() } else { w.to_lowercase() })
        .collect::<Vec<_>>()
        .join(separator)
}

fn camel(input: &str, preserve_acronyms: bool, lower_first: bool) -> String {
    let words = split_words(input);
    let last = words.len().saturating_sub(1);
    let mut out = String::with_capacity(input.len());

    for (i, word) in words.iter().enumerate() {
        if i == 0 && lower_first {
            out.push_str(&word.to_lowercase());
        } else if preserve_acronyms && i < last && is_acronym(word) {
            out.push_str(word);
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

/// `FooBar baz` -> `foo_bar_baz`
pub fn to_snake_case(input: &str) -> String {
    join_words(&split_words(input), "_", false)
}

/// `FooBar baz` -> `FOO_BAR_BAZ`
pub fn to_constant_case(input: &str) -> String {
    join_words(&split_words(input), "_", true)
}

/// `FooBar baz` -> `foo-bar-baz`
pub fn to_spinal_case(input: &str) -> String {
    join_words(&split_words(input), "-", false)
}

/// `foo_bar baz` -> `FooBarBaz`, keeping acronyms
pub fn to_pascal_case(input: &str) -> String {
    camel(input, true, false)
}

pub fn to_pascal_case_with(input: &str, preserve_acronyms: bool) -> String {
    camel(input, preserve_acronyms, false)
}

/// Same as [`to_pascal_case`]
pub fn to_upper_camel_case(input: &str) -> String {
    to_pascal_case(input)
}

pub fn to_upper_camel_case_with(input: &str, preserve_acronyms: bool) -> String {
    to_pascal_case_with(input, preserve_acronyms)
}

/// `foo_bar baz` -> `fooBarBaz`, keeping acronyms after the first word
pub fn to_lower_camel_case(input: &str) -> String {
    camel(input, true, true)
}

pub fn to_lower_camel_case_with(input: &str, preserve_acronyms: bool) -> String {
    camel(input, preserve_acronyms, true)
}
