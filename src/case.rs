//! Identifier casing shared by the build pipeline and the preview runtime.
//!
//! Type names and preview keys must come out byte-identical on both sides,
//! so word splitting follows one set of rules: non-alphanumerics separate
//! words, a lowercase or digit followed by an uppercase starts a word, an
//! uppercase run followed by a lowercase letter gives up its last letter to
//! the next word, and digit runs are words of their own.

/// Split an identifier into words.
pub fn words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            flush(&mut current, &mut words);
            continue;
        }

        if let Some(prev) = current.chars().last() {
            let next = chars.get(i + 1).copied();
            let boundary = (prev.is_lowercase() && c.is_uppercase())
                || (prev.is_ascii_digit() != c.is_ascii_digit())
                || (prev.is_uppercase()
                    && c.is_uppercase()
                    && next.map(|n| n.is_lowercase()).unwrap_or(false));
            if boundary {
                flush(&mut current, &mut words);
            }
        }

        current.push(c);
    }

    flush(&mut current, &mut words);
    words
}

fn flush(current: &mut String, words: &mut Vec<String>) {
    if !current.is_empty() {
        words.push(std::mem::take(current));
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

/// `"Blog Post"` → `"blogPost"`, `"PrismicBlogPost"` → `"prismicBlogPost"`.
pub fn camel_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (i, word) in words(input).iter().enumerate() {
        if i == 0 {
            out.push_str(&word.to_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

/// `"blog_post"` → `"BlogPost"`.
pub fn pascal_case(input: &str) -> String {
    words(input).iter().map(|w| capitalize(w)).collect()
}
