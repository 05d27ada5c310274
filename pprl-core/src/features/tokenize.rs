// pprl-core/src/features/tokenize.rs
//
// Low-level string tokenizers shared by the column-kind feature functions:
// word splitting, n-grams, and skip-2-grams. All pure functions over
// already-lowercased strings.

/// Split `s` on any run of space, `+`, `-`, `_`, `,`, `.`, dropping empty
/// pieces, and wrap each surviving word as `_word_`. The underscores are
/// word-boundary sentinels so n-grams at the edges of a word stay
/// distinguishable from n-grams that happen to span a word boundary.
pub fn split_string_underscore(s: &str) -> Vec<String> {
    s.split(|c: char| c.is_whitespace() || matches!(c, '+' | '-' | '_' | ',' | '.'))
        .filter(|w| !w.is_empty())
        .map(|w| format!("_{w}_"))
        .collect()
}

/// Yield every contiguous substring of each token whose length is in
/// `lengths`, skipping the all-underscore n-gram (e.g. `"__"` for a 2-gram
/// of the empty word `"__"`).
pub fn gen_ngram(tokens: &[String], lengths: &[usize]) -> Vec<String> {
    let mut out = Vec::new();
    for &n in lengths {
        if n == 0 {
            continue;
        }
        for token in tokens {
            let chars: Vec<char> = token.chars().collect();
            if chars.len() < n {
                continue;
            }
            for i in 0..=(chars.len() - n) {
                let gram: String = chars[i..i + n].iter().collect();
                if gram.chars().all(|c| c == '_') {
                    continue;
                }
                out.push(gram);
            }
        }
    }
    out
}

/// Yield the skip-2-gram `t[i] . t[i+2]` for every valid `i` in each token.
pub fn gen_skip_grams(tokens: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for token in tokens {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() < 3 {
            continue;
        }
        for i in 0..(chars.len() - 2) {
            out.push(format!("{}{}", chars[i], chars[i + 2]));
        }
    }
    out
}
