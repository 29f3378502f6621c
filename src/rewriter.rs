use crate::errors::Result;
use regex::{Captures, Regex};
use std::borrow::Cow;

/// How `old_value` is applied to the inner text of each tag occurrence.
///
/// Resolved once per job: if `old_value` compiles as a regex it is used as a
/// pattern, otherwise it is matched as a literal substring.
#[derive(Debug, Clone)]
pub enum Replacement {
    Pattern(Regex),
    Literal(String),
}

impl Replacement {
    /// Compiles `old_value`, falling back to a literal when it is not a valid pattern.
    pub fn resolve(old_value: &str) -> Self {
        match Regex::new(old_value) {
            Ok(regex) => Replacement::Pattern(regex),
            Err(_) => Replacement::Literal(old_value.to_string()),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Replacement::Literal(_))
    }

    /// Applies the replacement to one inner text.
    ///
    /// In pattern mode `new_value` may reference capture groups (`$1`, `${name}`).
    pub fn apply<'a>(&self, inner: &'a str, new_value: &str) -> Cow<'a, str> {
        match self {
            Replacement::Pattern(regex) => regex.replace_all(inner, new_value),
            Replacement::Literal(old) => {
                if inner.contains(old.as_str()) {
                    Cow::Owned(inner.replace(old.as_str(), new_value))
                } else {
                    Cow::Borrowed(inner)
                }
            }
        }
    }
}

/// Rewrites the inner text of every `<tag>...</tag>` occurrence in a document.
///
/// Matching is purely textual: the tag body may span lines, occurrences are
/// found left to right without overlap, and anything that is not a plain
/// `<tag>` ... `</tag>` pair (attributes, self-closing tags, other names) is
/// left untouched.
#[derive(Debug, Clone)]
pub struct TagRewriter {
    tag_name: String,
    tag: Regex,
    replacement: Replacement,
    new_value: String,
}

impl TagRewriter {
    /// Creates a rewriter for one tag/old/new triple.
    ///
    /// Fails only if the escaped tag pattern exceeds the regex size limit.
    pub fn new(tag_name: &str, old_value: &str, new_value: &str) -> Result<Self> {
        let escaped = regex::escape(tag_name);
        let tag = Regex::new(&format!(r"(?s)<{escaped}>(.*?)</{escaped}>"))?;

        Ok(Self {
            tag_name: tag_name.to_string(),
            tag,
            replacement: Replacement::resolve(old_value),
            new_value: new_value.to_string(),
        })
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn replacement(&self) -> &Replacement {
        &self.replacement
    }

    /// Returns the rewritten content, borrowing the input when no tag occurs.
    pub fn rewrite<'a>(&self, content: &'a str) -> Cow<'a, str> {
        self.tag.replace_all(content, |caps: &Captures| {
            let inner = caps.get(1).map_or("", |m| m.as_str());
            let replaced = self.replacement.apply(inner, &self.new_value);
            format!("<{0}>{1}</{0}>", self.tag_name, replaced)
        })
    }
}

/// One-shot helper: rewrites `content` for a single tag/old/new triple.
pub fn rewrite(content: &str, tag_name: &str, old_value: &str, new_value: &str) -> Result<String> {
    let rewriter = TagRewriter::new(tag_name, old_value, new_value)?;
    Ok(rewriter.rewrite(content).into_owned())
}
