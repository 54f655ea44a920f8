//! Identifier helpers shared by the name resolver and the emitter

/// Words that cannot name a variable or function in emitted JavaScript
const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
    "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Split text into words on non-alphanumeric characters and lower-to-upper
/// case boundaries.
///
/// `"movie-quotes"`, `"movie_quotes"` and `"movieQuotes"` all give
/// `["movie", "quotes"]` (original casing is kept).
pub fn split_words(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;

    for ch in s.chars() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev = None;
            continue;
        }
        let boundary = matches!(prev, Some(p) if (p.is_lowercase() || p.is_ascii_digit()) && ch.is_uppercase());
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(ch);
        prev = Some(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Uppercase the first character, keep the rest
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `"movie quotes"` → `"MovieQuotes"`
pub fn pascal_case(s: &str) -> String {
    split_words(s).iter().map(|w| capitalize(w)).collect()
}

/// `"movie quotes"` → `"movieQuotes"`
pub fn camel_case(s: &str) -> String {
    let words = split_words(s);
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(&word.to_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

/// Whether `name` can be written as a bare JavaScript identifier
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        .unwrap_or(false);
    starts_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !RESERVED_WORDS.contains(&name)
}

/// Property key as it must appear in an object literal or interface
pub fn property_key(name: &str) -> String {
    let bare = name
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        .unwrap_or(false)
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if bare {
        name.to_string()
    } else {
        quote(name)
    }
}

/// Double-quoted string literal, valid in both JSON and JavaScript
pub fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Turn arbitrary text into a usable type name
pub fn type_name(raw: &str) -> String {
    let name = pascal_case(raw);
    if name.is_empty() {
        return "Anonymous".to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) || !is_identifier(&name) {
        let cleaned: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        return format!("T{}", cleaned);
    }
    name
}

/// Turn arbitrary text into a usable variable/function name
pub fn value_name(raw: &str) -> String {
    if is_identifier(raw) {
        return raw.to_string();
    }
    let name = camel_case(raw);
    if is_identifier(&name) {
        name
    } else {
        let cleaned: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        format!("_{}", cleaned)
    }
}
