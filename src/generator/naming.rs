//! Identifier normalization.
//!
//! Turns arbitrary source identifiers (wire names, enum values such as
//! `RSA-OAEP-256` or `V7.6_preview.1`) into idiomatic Rust identifiers.
//! Every function here is pure and total.

use crate::spec::ValueKind;
use once_cell::sync::Lazy;
use regex::Regex;

static DIGIT_DOT_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d)\.(\d)").expect("valid digit-dot regex"));
static LETTER_DOT_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z])\.(\d)").expect("valid letter-dot regex"));

/// Rust strict, reserved and weak keywords.
const RESERVED_WORDS: &[&str] = &[
    "'static", "abstract", "as", "async", "await", "become", "box", "break", "const", "continue",
    "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if",
    "impl", "in", "let", "loop", "macro", "macro_rules", "match", "mod", "move", "mut", "override",
    "priv", "pub", "raw", "ref", "return", "safe", "self", "Self", "static", "struct", "super",
    "trait", "true", "try", "type", "typeof", "union", "unsafe", "unsized", "use", "virtual",
    "where", "while", "yield",
];

/// Where a name will be used; selects the suffix appended to reserved words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameContext {
    Type,
    Module,
    Method,
    Parameter,
    Property,
}

impl NameContext {
    fn suffix(self) -> &'static str {
        match self {
            NameContext::Type => "Type",
            NameContext::Module => "_mod",
            NameContext::Method => "_fn",
            NameContext::Parameter => "_param",
            NameContext::Property => "_prop",
        }
    }
}

pub fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS.contains(&word)
}

/// Append the context suffix when `name` is a reserved word.
pub fn escape_reserved(name: String, context: NameContext) -> String {
    if is_reserved(&name) {
        format!("{}{}", name, context.suffix())
    } else {
        name
    }
}

/// Normalize `raw` into a PascalCase identifier.
///
/// ```
/// use sdkgen::generator::naming::normalize;
/// use sdkgen::spec::ValueKind;
///
/// assert_eq!(normalize("V7.6_preview.1", ValueKind::String), "V7Dot6Preview1");
/// assert_eq!(normalize("3.14", ValueKind::Float), "FloatValue3Point14");
/// ```
pub fn normalize(raw: &str, kind: ValueKind) -> String {
    let mut name = if raw.starts_with(|c: char| c.is_ascii_digit()) {
        format!("{}Value{}", kind.word(), raw)
    } else {
        raw.to_string()
    };

    let dot_word = if kind.is_fractional() { "Point" } else { "Dot" };
    let replacement = format!("${{1}}{}${{2}}", dot_word);
    // overlapping matches such as 1.2.3 need a second pass
    while DIGIT_DOT_DIGIT.is_match(&name) {
        name = DIGIT_DOT_DIGIT.replace_all(&name, replacement.as_str()).into_owned();
    }
    name = LETTER_DOT_DIGIT.replace_all(&name, "${1}${2}").into_owned();

    name = name.replace(',', "").replace("/*+", "/All/");

    let tokens = split_into_tokens(&name);
    let normalized = match tokens.len() {
        0 => format!("{}Value", kind.word()),
        1 => capitalize(&tokens[0]),
        _ => {
            let mut out = String::with_capacity(name.len());
            for (i, token) in tokens.iter().enumerate() {
                out.push_str(&transform_token(token));
                let ends_with_digit = token.ends_with(|c: char| c.is_ascii_digit());
                let next_starts_with_digit = tokens
                    .get(i + 1)
                    .is_some_and(|t| t.starts_with(|c: char| c.is_ascii_digit()));
                if ends_with_digit && next_starts_with_digit {
                    out.push('_');
                }
            }
            out
        }
    };
    // leading separators are dropped by the tokenizer and can expose a digit
    if normalized.starts_with(|c: char| c.is_ascii_digit()) {
        format!("{}Value{}", kind.word(), normalized)
    } else {
        normalized
    }
}

/// Normalize a type name (record, enum, union, client).
pub fn type_name(raw: &str) -> String {
    escape_reserved(normalize(raw, ValueKind::String), NameContext::Type)
}

/// Lower snake_case using the same tokenizer as [`normalize`].
///
/// Leading digits get a `_` prefix so the result is always an identifier.
pub fn to_snake_case(raw: &str) -> String {
    let tokens = split_into_tokens(&raw.replace(',', ""));
    if tokens.is_empty() {
        return "_unnamed".to_string();
    }
    let joined = tokens
        .iter()
        .map(|t| t.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("_");
    if joined.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{}", joined)
    } else {
        joined
    }
}

/// snake_case name escaped for the given context.
pub fn snake_name(raw: &str, context: NameContext) -> String {
    escape_reserved(to_snake_case(raw), context)
}

/// Split on explicit separators (anything that is not an ASCII letter or
/// digit), then on implicit word boundaries within each part.
fn split_into_tokens(name: &str) -> Vec<String> {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .flat_map(split_on_word_boundaries)
        .collect()
}

fn split_on_word_boundaries(part: &str) -> Vec<String> {
    let chars: Vec<char> = part.chars().collect();
    let mut tokens = Vec::new();
    let mut start = 0;
    for i in 1..chars.len() {
        let prev = chars[i - 1];
        let cur = chars[i];
        let boundary = (prev.is_ascii_digit() && cur.is_ascii_alphabetic())
            || (prev.is_ascii_alphabetic() && cur.is_ascii_digit())
            || (prev.is_ascii_lowercase() && cur.is_ascii_uppercase())
            || (prev.is_ascii_uppercase()
                && cur.is_ascii_uppercase()
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase()));
        if boundary {
            tokens.push(chars[start..i].iter().collect());
            start = i;
        }
    }
    if start < chars.len() {
        tokens.push(chars[start..].iter().collect());
    }
    tokens
}

fn transform_token(token: &str) -> String {
    if token.len() >= 2 && token.chars().all(|c| c.is_ascii_alphabetic()) {
        let lower = token.to_ascii_lowercase();
        capitalize(&lower)
    } else {
        capitalize(token)
    }
}

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(raw: &str) -> String {
        normalize(raw, ValueKind::String)
    }

    #[test]
    fn test_normalize_fixed_points() {
        assert_eq!(n("A"), "A");
        assert_eq!(n("ABCD"), "ABCD");
        assert_eq!(n("abcd"), "Abcd");
        assert_eq!(n(""), "StringValue");
        assert_eq!(normalize("", ValueKind::Int32), "Int32Value");
    }

    #[test]
    fn test_normalize_separators_and_boundaries() {
        assert_eq!(n("fooBar"), "FooBar");
        assert_eq!(n("foo_bar"), "FooBar");
        assert_eq!(n("V2022_12_01_preview"), "V2022_12_01Preview");
        assert_eq!(n("V7.6_preview.1"), "V7Dot6Preview1");
        assert_eq!(n("RSA_AES_KEY_WRAP_256"), "RsaAesKeyWrap256");
        assert_eq!(n("CKM_AES_KEY_WRAP"), "CkmAesKeyWrap");
        assert_eq!(n("RSA1_5"), "Rsa1_5");
        assert_eq!(n("RSA-OAEP"), "RsaOaep");
        assert_eq!(n("RSA-OAEP-256"), "RsaOaep256");
        assert_eq!(n("RSA_OAEP256"), "RsaOaep256");
        assert_eq!(n("P-256K"), "P256K");
        assert_eq!(n("A128CBC"), "A128Cbc");
        assert_eq!(n("A128CBCPAD"), "A128Cbcpad");
        assert_eq!(n("aaBBcc"), "AaBBcc");
        assert_eq!(n("aa12BBB"), "Aa12Bbb");
        assert_eq!(n("XMLHttpRequest"), "XmlHttpRequest");
        assert_eq!(n("HTTPSConnection"), "HttpsConnection");
        assert_eq!(n("IOError"), "IoError");
        assert_eq!(n("someHTTPConnection"), "SomeHttpConnection");
        assert_eq!(n("value123ABC"), "Value123Abc");
        assert_eq!(n("testABC123DEF456"), "TestAbc123Def456");
        assert_eq!(n("a-1-bb-BB"), "A1BbBb");
        assert_eq!(n("my-var-NAME"), "MyVarName");
        assert_eq!(n("CKM_AES256_WRAP"), "CkmAes256Wrap");
        assert_eq!(n("a1b2c3"), "A1B2C3");
    }

    #[test]
    fn test_normalize_value_kinds() {
        assert_eq!(normalize("42", ValueKind::Integer), "IntegerValue42");
        assert_eq!(normalize("42", ValueKind::Int32), "Int32Value42");
        assert_eq!(normalize("3.14", ValueKind::Float), "FloatValue3Point14");
        assert_eq!(normalize("3.14", ValueKind::Float64), "Float64Value3Point14");
        assert_eq!(n("123"), "StringValue123");
        assert_eq!(n("1.2.3"), "StringValue1Dot2Dot3");
    }

    #[test]
    fn test_normalize_leading_separator_before_digit() {
        assert_eq!(normalize("-1", ValueKind::Int32), "Int32Value1");
        assert_eq!(n("_2"), "StringValue2");
        assert_eq!(normalize(".5", ValueKind::Float), "FloatValue5");
        assert_eq!(n("--"), "StringValue");
        for raw in ["-1", "_2", ".5", " 7 days", "/3/x"] {
            assert!(!n(raw).starts_with(|c: char| c.is_ascii_digit()), "{}", raw);
        }
    }

    #[test]
    fn test_normalize_commas_and_media_ranges() {
        assert_eq!(n("Foo,Bar"), "FooBar");
        assert_eq!(n("application/*+json"), "ApplicationAllJson");
        assert_eq!(n("text/plain"), "TextPlain");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "fooBar",
            "foo_bar",
            "V2022_12_01_preview",
            "V7.6_preview.1",
            "RSA-OAEP-256",
            "XMLHttpRequest",
            "aaBBcc",
            "a-1-bb-BB",
            "ABCD",
            "a1b2c3",
            "application/*+json",
        ];
        for raw in inputs {
            let once = n(raw);
            assert_eq!(n(&once), once, "normalize not idempotent for {raw}");
        }
        let once = normalize("3.14", ValueKind::Float);
        assert_eq!(normalize(&once, ValueKind::Float), once);
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("apiVersion"), "api_version");
        assert_eq!(to_snake_case("x-ms-client-request-id"), "x_ms_client_request_id");
        assert_eq!(to_snake_case("WidgetsClient"), "widgets_client");
        assert_eq!(to_snake_case("XMLHttpRequest"), "xml_http_request");
        assert_eq!(to_snake_case("2fa"), "_2_fa");
        assert_eq!(to_snake_case(""), "_unnamed");
    }

    #[test]
    fn test_reserved_words_get_context_suffix() {
        assert_eq!(snake_name("type", NameContext::Property), "type_prop");
        assert_eq!(snake_name("self", NameContext::Parameter), "self_param");
        assert_eq!(snake_name("move", NameContext::Method), "move_fn");
        assert_eq!(snake_name("mod", NameContext::Module), "mod_mod");
        assert_eq!(type_name("self"), "SelfType");
        assert_eq!(snake_name("kind", NameContext::Property), "kind");
    }
}
