//! Line tokenizer: whitespace splitting with quoted groups.
//!
//! `search res.partner "name,email" '[["id", ">", 3]]'` becomes
//! `["search", "res.partner", "name,email", "[[\"id\", \">\", 3]]"]`.
//! Groups are rejoined with single spaces; an unterminated quote passes the
//! rest of the line through verbatim.

const QUOTES: [char; 2] = ['"', '\''];

/// Quote used when an argument is written back into a command line.
pub const CANONICAL_QUOTE: char = '"';

/// Split a raw input line into arguments.
pub fn tokenize(line: &str) -> Vec<String> {
    let raw: Vec<&str> = line.split_whitespace().collect();
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        let tok = raw[i];
        let Some(quote) = opening_quote(tok) else {
            out.push(tok.to_string());
            i += 1;
            continue;
        };

        let close = (i..raw.len()).find(|&j| closes_group(raw[j], quote, j == i));
        match close {
            Some(j) => {
                out.push(strip_group(&raw[i..=j].join(" "), quote));
                i = j + 1;
            }
            None => {
                out.extend(raw[i..].iter().map(|t| t.to_string()));
                break;
            }
        }
    }
    out
}

fn opening_quote(tok: &str) -> Option<char> {
    tok.chars().next().filter(|c| QUOTES.contains(c))
}

fn closes_group(tok: &str, quote: char, is_opener: bool) -> bool {
    if is_opener && tok.chars().count() < 2 {
        return false;
    }
    tok.ends_with(quote)
}

fn strip_group(joined: &str, quote: char) -> String {
    let q = quote.len_utf8();
    joined[q..joined.len() - q].to_string()
}

/// Rewrite every quote inside a structured argument to the canonical one.
///
/// Lets users type `{'name': 'Azure'}` for a JSON payload.
pub fn normalize_quotes(arg: &str) -> String {
    arg.replace('\'', &CANONICAL_QUOTE.to_string())
}

/// Quote an argument for re-insertion into a command line.
///
/// Plain words are returned as-is. Empty arguments, arguments with whitespace
/// and arguments starting with a quote are wrapped in a quote character they
/// do not contain, so `tokenize` gives back exactly the same argument (runs of
/// whitespace collapse to one space). When both quote characters occur, inner
/// canonical quotes become `'`; structured payloads survive that through
/// `normalize_quotes`.
pub fn quote_argument(arg: &str) -> String {
    let needs_quotes =
        arg.is_empty() || arg.starts_with(QUOTES) || arg.chars().any(char::is_whitespace);
    if !needs_quotes {
        return arg.to_string();
    }
    match QUOTES.iter().find(|q| !arg.contains(**q)) {
        Some(q) => format!("{q}{arg}{q}"),
        None => {
            let inner = arg.replace(CANONICAL_QUOTE, "'");
            format!("{CANONICAL_QUOTE}{inner}{CANONICAL_QUOTE}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_words() {
        assert_eq!(tokenize("help  search "), vec!["help", "search"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn double_quoted_group() {
        assert_eq!(
            tokenize(r#"alias foo "bar baz""#),
            vec!["alias", "foo", "bar baz"]
        );
    }

    #[test]
    fn single_quoted_group_keeps_inner_double_quotes() {
        assert_eq!(
            tokenize(r#"write res.partner 5 '{"name": "Foo Bar"}'"#),
            vec!["write", "res.partner", "5", r#"{"name": "Foo Bar"}"#]
        );
    }

    #[test]
    fn several_groups_in_one_line() {
        assert_eq!(
            tokenize(r#"a "b c" d 'e  f' g"#),
            vec!["a", "b c", "d", "e f", "g"]
        );
    }

    #[test]
    fn self_contained_quotes() {
        assert_eq!(tokenize(r#"view "res.partner" '7'"#), vec!["view", "res.partner", "7"]);
        assert_eq!(tokenize(r#"x """#), vec!["x", ""]);
    }

    #[test]
    fn group_closes_only_on_matching_quote() {
        assert_eq!(
            tokenize(r#"alias q "search 'x y' *""#),
            vec!["alias", "q", "search 'x y' *"]
        );
    }

    #[test]
    fn unterminated_quote_passes_through() {
        assert_eq!(
            tokenize(r#"alias foo "bar baz 'q r'"#),
            vec!["alias", "foo", "\"bar", "baz", "'q", "r'"]
        );
        assert_eq!(tokenize("\" x"), vec!["\"", "x"]);
    }

    #[test]
    fn quote_argument_round_trips() {
        assert_eq!(quote_argument("res.partner"), "res.partner");
        for arg in [
            r#"{"name": "Foo Bar"}"#,
            r#"say "hi there""#,
            "it's late",
            "",
            "'x'",
        ] {
            let quoted = quote_argument(arg);
            let back = tokenize(&format!("create x {quoted} tail"));
            assert_eq!(back, vec!["create", "x", arg, "tail"], "quoted as {quoted}");
        }
    }

    #[test]
    fn quote_argument_picks_unused_quote() {
        assert_eq!(quote_argument(""), r#""""#);
        assert_eq!(quote_argument("a b"), r#""a b""#);
        assert_eq!(quote_argument(r#"say "hi there""#), r#"'say "hi there"'"#);
    }

    #[test]
    fn quote_argument_with_both_quotes_normalizes() {
        let arg = r#"{"name": "Foo's Bar"}"#;
        let quoted = quote_argument(arg);
        assert_eq!(quoted, r#""{'name': 'Foo's Bar'}""#);
        let back = tokenize(&format!("create x {quoted}"));
        assert_eq!(back[2], "{'name': 'Foo's Bar'}");
    }
}
