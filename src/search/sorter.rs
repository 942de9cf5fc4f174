use std::cmp::Ordering;

use crate::core::error::Result;
use crate::core::types::{DocId, FieldValue};
use crate::storage::documents::{DocumentStore, SortOrder};

/// One sort key of the legacy non-cursor path: a named field plus
/// direction. Multiple specs form a multi-key sort, first spec primary.
#[derive(Debug, Clone)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

/// Secondary, non-indexed, multi-field ordering over an id list. Field
/// values come from the fields projection, falling back to the full
/// document record.
pub struct Sorter<'a> {
    documents: &'a DocumentStore,
}

impl<'a> Sorter<'a> {
    pub fn new(documents: &'a DocumentStore) -> Self {
        Sorter { documents }
    }

    pub fn sort(&self, doc_ids: &[DocId], specs: &[SortSpec]) -> Result<Vec<DocId>> {
        let mut keyed: Vec<(DocId, Vec<Option<FieldValue>>)> = Vec::with_capacity(doc_ids.len());
        for &id in doc_ids {
            let mut values = Vec::with_capacity(specs.len());
            for spec in specs {
                values.push(self.resolve_field(id, &spec.field)?);
            }
            keyed.push((id, values));
        }

        // Stable sort keeps input order for full ties.
        keyed.sort_by(|(_, a), (_, b)| {
            for (i, spec) in specs.iter().enumerate() {
                let ordering = compare_values(&a[i], &b[i], spec.order);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });

        Ok(keyed.into_iter().map(|(id, _)| id).collect())
    }

    fn resolve_field(&self, id: DocId, field: &str) -> Result<Option<FieldValue>> {
        if let Some(fields) = self.documents.fields(id)? {
            if let Some(value) = fields.get(field) {
                return Ok(Some(value.clone()));
            }
        }
        Ok(self
            .documents
            .get(id)?
            .and_then(|doc| doc.get_field(field).cloned()))
    }
}

/// Null/absent values sort last regardless of direction; present values
/// compare by type: numeric, temporal, boolean, else lexicographic.
fn compare_values(a: &Option<FieldValue>, b: &Option<FieldValue>, order: SortOrder) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ordering = compare_present(a, b);
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        }
    }
}

fn compare_present(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a, b) {
        (FieldValue::Number(a), FieldValue::Number(b)) => {
            a.partial_cmp(b).unwrap_or(Ordering::Equal)
        }
        (FieldValue::Date(a), FieldValue::Date(b)) => a.cmp(b),
        (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a.cmp(b),
        (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
        // Mixed types compare by their text rendering.
        _ => render(a).cmp(&render(b)),
    }
}

fn render(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(s) => s.clone(),
        FieldValue::Number(n) => n.to_string(),
        FieldValue::Date(d) => d.to_rfc3339(),
        FieldValue::Boolean(b) => b.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Document;
    use crate::storage::memory::MemoryStore;
    use std::sync::Arc;

    fn fixture() -> DocumentStore {
        DocumentStore::new(Arc::new(MemoryStore::new()))
    }

    fn put(docs: &DocumentStore, id: u64, fields: &[(&str, FieldValue)]) {
        let mut doc = Document::new(DocId(id));
        for (name, value) in fields {
            doc.add_field(*name, value.clone());
        }
        docs.put(&doc).unwrap();
    }

    fn spec(field: &str, order: SortOrder) -> SortSpec {
        SortSpec {
            field: field.to_string(),
            order,
        }
    }

    #[test]
    fn sorts_numeric_fields() {
        let docs = fixture();
        put(&docs, 1, &[("price", FieldValue::Number(9.5))]);
        put(&docs, 2, &[("price", FieldValue::Number(2.0))]);
        put(&docs, 3, &[("price", FieldValue::Number(30.0))]);

        let sorted = Sorter::new(&docs)
            .sort(&[DocId(1), DocId(2), DocId(3)], &[spec("price", SortOrder::Asc)])
            .unwrap();
        assert_eq!(sorted, vec![DocId(2), DocId(1), DocId(3)]);
    }

    #[test]
    fn absent_values_sort_last_in_both_directions() {
        let docs = fixture();
        put(&docs, 1, &[]);
        put(&docs, 2, &[("rank", FieldValue::Number(1.0))]);
        put(&docs, 3, &[("rank", FieldValue::Number(2.0))]);

        let ids = [DocId(1), DocId(2), DocId(3)];
        let sorter = Sorter::new(&docs);

        let asc = sorter.sort(&ids, &[spec("rank", SortOrder::Asc)]).unwrap();
        assert_eq!(asc, vec![DocId(2), DocId(3), DocId(1)]);

        let desc = sorter.sort(&ids, &[spec("rank", SortOrder::Desc)]).unwrap();
        assert_eq!(desc, vec![DocId(3), DocId(2), DocId(1)]);
    }

    #[test]
    fn secondary_spec_breaks_ties_stably() {
        let docs = fixture();
        put(&docs, 1, &[("group", FieldValue::Text("a".into())), ("n", FieldValue::Number(2.0))]);
        put(&docs, 2, &[("group", FieldValue::Text("a".into())), ("n", FieldValue::Number(1.0))]);
        put(&docs, 3, &[("group", FieldValue::Text("b".into())), ("n", FieldValue::Number(0.0))]);

        let sorted = Sorter::new(&docs)
            .sort(
                &[DocId(1), DocId(2), DocId(3)],
                &[spec("group", SortOrder::Asc), spec("n", SortOrder::Asc)],
            )
            .unwrap();
        assert_eq!(sorted, vec![DocId(2), DocId(1), DocId(3)]);
    }
}
