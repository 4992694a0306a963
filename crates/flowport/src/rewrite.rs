//! Literal rewrites of serialized documents.
//!
//! Flow content is located by parsing it but mutated as text, so the
//! original formatting and key order survive the export. All replacements
//! for one document are located first and applied in a single pass.

/// A located replacement.
#[derive(Clone, Debug, PartialEq)]
struct Span {
    start: usize,
    end: usize,
    replacement: String,
}

/// A document and the replacements pending against it.
#[derive(Debug)]
pub struct SpanEdits<'a> {
    content: &'a str,
    spans: Vec<Span>,
}

impl<'a> SpanEdits<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            spans: vec![],
        }
    }

    /// Schedules every occurrence of `needle` to be replaced.
    ///
    /// Returns the number of occurrences found.
    pub fn replace_all(&mut self, needle: &str, replacement: &str) -> usize {
        if needle.is_empty() {
            return 0;
        }
        let before = self.spans.len();
        self.spans.extend(
            self.content
                .match_indices(needle)
                .map(|(start, found)| Span {
                    start,
                    end: start + found.len(),
                    replacement: replacement.to_owned(),
                }),
        );
        self.spans.len() - before
    }

    /// Whether no replacement is scheduled.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Applies all scheduled replacements.
    ///
    /// When two spans overlap the one starting first wins, and of two spans
    /// starting at the same offset the longer wins.
    pub fn apply(mut self) -> String {
        self.spans
            .sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
        let mut output = String::with_capacity(self.content.len());
        let mut cursor = 0;
        for span in self.spans {
            if span.start < cursor {
                log::trace!(
                    "dropping overlapped replacement of '{}'",
                    &self.content[span.start..span.end]
                );
                continue;
            }
            output.push_str(&self.content[cursor..span.start]);
            output.push_str(&span.replacement);
            cursor = span.end;
        }
        output.push_str(&self.content[cursor..]);
        output
    }
}
