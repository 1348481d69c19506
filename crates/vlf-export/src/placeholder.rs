//! `{{ key }}` placeholders inside WordprocessingML.
//!
//! Word freely splits the text a user typed into several runs, so a
//! placeholder typed as `{{ nombreProyecto }}` may reach us as
//! `{</w:t></w:r><w:r><w:t>{ nombre</w:t>...`. [`Placeholders::repair`]
//! glues such placeholders back together before substitution.

use std::borrow::Cow;

use regex::Regex;
use serde_json::Value;

/// Compiled placeholder patterns.
#[derive(Debug, Clone)]
pub struct Placeholders {
    split_open: Regex,
    split_close: Regex,
    span: Regex,
    tag: Regex,
    key: Regex,
}

impl Placeholders {
    /// Compile the patterns.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] if a pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            split_open: Regex::new(r"\{(?:<[^>]*>)+\{")?,
            split_close: Regex::new(r"\}(?:<[^>]*>)+\}")?,
            span: Regex::new(r"(?s)\{\{.*?\}\}")?,
            tag: Regex::new(r"<[^>]*>")?,
            key: Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}")?,
        })
    }

    /// Remove markup Word inserted inside placeholders.
    #[must_use]
    pub fn repair(&self, xml: &str) -> String {
        let joined = self.split_open.replace_all(xml, "{{");
        let joined = self.split_close.replace_all(&joined, "}}");
        self.span
            .replace_all(&joined, |caps: &regex::Captures<'_>| {
                self.tag.replace_all(&caps[0], "").into_owned()
            })
            .into_owned()
    }

    /// Keys of every placeholder in `xml`, in document order.
    #[must_use]
    pub fn keys<'x>(&self, xml: &'x str) -> Vec<&'x str> {
        self.key
            .captures_iter(xml)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect()
    }

    /// Replace each placeholder with the markup `resolve` returns for its key.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first error from `resolve`.
    pub fn substitute<E>(
        &self,
        xml: &str,
        mut resolve: impl FnMut(&str) -> Result<String, E>,
    ) -> Result<String, E> {
        let mut out = String::with_capacity(xml.len());
        let mut last = 0;
        for caps in self.key.captures_iter(xml) {
            let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&xml[last..whole.start()]);
            out.push_str(&resolve(key.as_str())?);
            last = whole.end();
        }
        out.push_str(&xml[last..]);
        Ok(out)
    }
}

/// Plain-text form of a context value.
///
/// Whole numbers drop the fractional part, `null` is empty.
#[must_use]
pub fn display_value(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                Cow::Owned(n.to_string())
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => Cow::Owned(format!("{f:.0}")),
                    _ => Cow::Owned(n.to_string()),
                }
            }
        }
        Value::Bool(b) => Cow::Owned(b.to_string()),
        Value::Array(_) | Value::Object(_) => Cow::Owned(value.to_string()),
    }
}

/// Run-content markup for a text value: escaped, line breaks as `<w:br/>`.
#[must_use]
pub fn text_markup(value: &Value) -> String {
    let text = display_value(value);
    let escaped = quick_xml::escape::escape(text.as_ref());
    escaped.replace('\n', r#"</w:t><w:br/><w:t xml:space="preserve">"#)
}
