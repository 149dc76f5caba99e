//! Named-placeholder URL building.
//!
//! Templates are path-and-query patterns such as
//! `/api/quotes/{asset_class}/{ticker}`. Each `{name}` is substituted by
//! name, never by position, and every value is percent-encoded.

use crate::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlTemplate {
    pattern: &'static str,
}

impl UrlTemplate {
    pub const fn new(pattern: &'static str) -> Self {
        Self { pattern }
    }

    pub const fn pattern(&self) -> &'static str {
        self.pattern
    }

    /// Placeholder names in order of appearance.
    pub fn placeholders(&self) -> Result<Vec<&'static str>, ValidationError> {
        let mut names = Vec::new();
        for segment in self.segments() {
            if let Segment::Placeholder(name) = segment? {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Renders the template onto `base`.
    ///
    /// Fails when a placeholder has no value, when a value is empty after
    /// trimming, or when the pattern itself has an unbalanced brace.
    pub fn render(&self, base: &str, values: &[(&str, &str)]) -> Result<String, ValidationError> {
        let mut url = String::with_capacity(base.len() + self.pattern.len() + 16);
        url.push_str(base.trim_end_matches('/'));

        for segment in self.segments() {
            match segment? {
                Segment::Literal(text) => url.push_str(text),
                Segment::Placeholder(name) => {
                    let value = values
                        .iter()
                        .find(|(key, _)| *key == name)
                        .map(|(_, value)| value.trim())
                        .ok_or_else(|| ValidationError::MissingPlaceholder {
                            name: name.to_owned(),
                        })?;

                    if value.is_empty() {
                        return Err(ValidationError::EmptyPlaceholder {
                            name: name.to_owned(),
                        });
                    }
                    url.push_str(&urlencoding::encode(value));
                }
            }
        }

        Ok(url)
    }

    fn segments(&self) -> Segments {
        Segments {
            rest: self.pattern,
            pattern: self.pattern,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Literal(&'static str),
    Placeholder(&'static str),
}

struct Segments {
    rest: &'static str,
    pattern: &'static str,
}

impl Segments {
    fn malformed(&mut self) -> Option<Result<Segment, ValidationError>> {
        self.rest = "";
        Some(Err(ValidationError::MalformedTemplate {
            template: self.pattern.to_owned(),
        }))
    }
}

impl Iterator for Segments {
    type Item = Result<Segment, ValidationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        if let Some(after_open) = self.rest.strip_prefix('{') {
            let Some(close) = after_open.find('}') else {
                return self.malformed();
            };
            let name = &after_open[..close];
            if name.is_empty() || name.contains('{') {
                return self.malformed();
            }
            self.rest = &after_open[close + 1..];
            return Some(Ok(Segment::Placeholder(name)));
        }

        let end = self.rest.find('{').unwrap_or(self.rest.len());
        let literal = &self.rest[..end];
        if literal.contains('}') {
            return self.malformed();
        }
        self.rest = &self.rest[end..];
        Some(Ok(Segment::Literal(literal)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTE: UrlTemplate = UrlTemplate::new("/api/quotes/{asset_class}/{ticker}");

    #[test]
    fn renders_placeholders_by_name() {
        let url = QUOTE
            .render(
                "https://api.stockanalysis.com/",
                &[("ticker", "AAPL"), ("asset_class", "s")],
            )
            .expect("template should render");

        assert_eq!(url, "https://api.stockanalysis.com/api/quotes/s/AAPL");
    }

    #[test]
    fn values_are_percent_encoded() {
        let template = UrlTemplate::new("/stocks/{ticker}/?q={query}");
        let url = template
            .render("https://site.test", &[("ticker", "BRK.B"), ("query", "a b&c")])
            .expect("template should render");

        assert_eq!(url, "https://site.test/stocks/BRK.B/?q=a%20b%26c");
    }

    #[test]
    fn empty_value_is_rejected() {
        let error = QUOTE
            .render("https://api.test", &[("ticker", "  "), ("asset_class", "s")])
            .expect_err("blank ticker should fail");

        assert_eq!(
            error,
            ValidationError::EmptyPlaceholder {
                name: String::from("ticker")
            }
        );
    }

    #[test]
    fn missing_value_is_rejected() {
        let error = QUOTE
            .render("https://api.test", &[("ticker", "AAPL")])
            .expect_err("asset class is missing");

        assert_eq!(
            error,
            ValidationError::MissingPlaceholder {
                name: String::from("asset_class")
            }
        );
    }

    #[test]
    fn unbalanced_braces_are_malformed() {
        for pattern in ["/a/{ticker", "/a/{}/b", "/a/ticker}", "/a/{{ticker}"] {
            let error = UrlTemplate::new(pattern)
                .render("https://api.test", &[("ticker", "AAPL")])
                .expect_err("pattern should be rejected");
            assert!(matches!(error, ValidationError::MalformedTemplate { .. }));
        }
    }

    #[test]
    fn lists_placeholders_in_order() {
        let template = UrlTemplate::new("/api/symbol/{asset_class}/{ticker}/history?range={range}&period={period}");

        assert_eq!(
            template.placeholders().expect("valid template"),
            vec!["asset_class", "ticker", "range", "period"]
        );
    }
}
