use application::SearchRequest;
use chrono::{DateTime, Utc};
use domain::Document;
use tracing::trace;

/// Checks a document against every category of the request.
///
/// Categories are ANDed. An absent or empty list in the request is no
/// constraint; a present date bound rejects documents without `created`.
pub fn matches(doc: &Document, request: &SearchRequest) -> bool {
    let matched = title_matches(doc, request.title_prefixes.as_deref())
        && content_matches(doc, request.contains_contents.as_deref())
        && author_matches(doc, request.author_ids.as_deref())
        && created_from_matches(doc, request.created_from)
        && created_to_matches(doc, request.created_to);
    trace!(doc_id = ?doc.id, matched, "Applied search filters");
    matched
}

/// The list to match against, or `None` when it places no constraint.
fn constraint(values: Option<&[String]>) -> Option<&[String]> {
    values.filter(|values| !values.is_empty())
}

/// Title starts with at least one of the prefixes.
pub fn title_matches(doc: &Document, prefixes: Option<&[String]>) -> bool {
    let Some(prefixes) = constraint(prefixes) else {
        return true;
    };
    doc.title
        .as_deref()
        .is_some_and(|title| prefixes.iter().any(|prefix| title.starts_with(prefix.as_str())))
}

/// Content contains at least one of the substrings.
pub fn content_matches(doc: &Document, needles: Option<&[String]>) -> bool {
    let Some(needles) = constraint(needles) else {
        return true;
    };
    doc.content
        .as_deref()
        .is_some_and(|content| needles.iter().any(|needle| content.contains(needle.as_str())))
}

/// Author id is one of the listed ids.
pub fn author_matches(doc: &Document, author_ids: Option<&[String]>) -> bool {
    let Some(author_ids) = constraint(author_ids) else {
        return true;
    };
    doc.author_id()
        .is_some_and(|author_id| author_ids.iter().any(|id| id == author_id))
}

/// Inclusive lower bound on `created`.
pub fn created_from_matches(doc: &Document, from: Option<DateTime<Utc>>) -> bool {
    match (from, doc.created) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(from), Some(created)) => created >= from,
    }
}

/// Inclusive upper bound on `created`.
pub fn created_to_matches(doc: &Document, to: Option<DateTime<Utc>>) -> bool {
    match (to, doc.created) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(to), Some(created)) => created <= to,
    }
}
