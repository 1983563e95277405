//! Out-of-band updates
//!
//! Pushed HTML fragments whose flagged elements replace the live element with
//! the same id, wherever it sits in the shadow forest.

use mesh_dom::{Document, NodeId};
use mesh_html::parse_fragment;
use mesh_net::SseEvent;
use serde::Deserialize;

/// Single-fragment event
pub const UPDATE_EVENT: &str = "oob-update";
/// Batch envelope event
pub const BATCH_EVENT: &str = "oob-batch";

/// Decoded stream payload
#[derive(Debug, Clone, PartialEq)]
pub enum OobPayload {
    Fragment(String),
    Batch(OobBatch),
    /// Nothing to apply (handshakes, unknown events, bad envelopes)
    Ignored(String),
}

/// Batch envelope. Entries stay raw so one bad entry cannot fail the batch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OobBatch {
    #[serde(rename = "batchID", alias = "batchId", default)]
    pub batch_id: String,
    #[serde(default)]
    pub updates: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct BatchUpdate {
    id: String,
    html: String,
}

impl OobPayload {
    /// Decode a stream event
    pub fn decode(event: &SseEvent) -> Self {
        match event.event_type.as_str() {
            UPDATE_EVENT => OobPayload::Fragment(event.data.clone()),
            BATCH_EVENT => Self::decode_batch(&event.data),
            "message" => {
                let data = event.data.trim_start();
                if data.starts_with('{') || data.starts_with('[') {
                    Self::decode_batch(data)
                } else {
                    OobPayload::Fragment(event.data.clone())
                }
            }
            other => OobPayload::Ignored(format!("unhandled event '{}'", other)),
        }
    }

    fn decode_batch(data: &str) -> Self {
        match serde_json::from_str::<OobBatch>(data) {
            Ok(batch) if batch.updates.is_empty() => {
                OobPayload::Ignored(format!("batch '{}' has no updates", batch.batch_id))
            }
            Ok(batch) => OobPayload::Batch(batch),
            Err(e) => OobPayload::Ignored(format!("invalid batch: {}", e)),
        }
    }
}

/// What applying a payload did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Ids of replaced elements
    pub applied: Vec<String>,
    /// Newly attached elements, in the order they were swapped in
    pub inserted: Vec<NodeId>,
    /// Ids with no live counterpart
    pub missing: Vec<String>,
    /// Fragments or entries that could not be applied
    pub malformed: usize,
    /// Arena slots freed with the replaced subtrees
    pub released: Vec<NodeId>,
}

impl UpdateReport {
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.missing.is_empty() && self.malformed == 0
    }

    fn merge(&mut self, other: UpdateReport) {
        self.applied.extend(other.applied);
        self.inserted.extend(other.inserted);
        self.missing.extend(other.missing);
        self.malformed += other.malformed;
        self.released.extend(other.released);
    }
}

/// Applies out-of-band payloads to a live document
#[derive(Debug, Clone)]
pub struct OobApplier {
    attribute: String,
}

impl OobApplier {
    pub fn new(attribute: &str) -> Self {
        Self {
            attribute: attribute.to_string(),
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn apply(&self, doc: &mut Document, payload: &OobPayload) -> UpdateReport {
        match payload {
            OobPayload::Fragment(html) => self.apply_fragment(doc, html),
            OobPayload::Batch(batch) => self.apply_batch(doc, batch),
            OobPayload::Ignored(reason) => {
                tracing::debug!("Ignoring stream payload: {}", reason);
                UpdateReport::default()
            }
        }
    }

    /// Apply every entry independently; failures are counted, not fatal
    pub fn apply_batch(&self, doc: &mut Document, batch: &OobBatch) -> UpdateReport {
        tracing::debug!(
            "Applying batch '{}' ({} updates)",
            batch.batch_id,
            batch.updates.len()
        );
        let mut report = UpdateReport::default();
        for (i, entry) in batch.updates.iter().enumerate() {
            match BatchUpdate::deserialize(entry) {
                Ok(update) => {
                    tracing::debug!("Batch '{}' update for {}", batch.batch_id, update.id);
                    report.merge(self.apply_fragment(doc, &update.html));
                }
                Err(e) => {
                    tracing::warn!("Batch '{}' entry {} malformed: {}", batch.batch_id, i, e);
                    report.malformed += 1;
                }
            }
        }
        report
    }

    /// Replace the live counterpart of every flagged element in `html`
    pub fn apply_fragment(&self, doc: &mut Document, html: &str) -> UpdateReport {
        let mut report = UpdateReport::default();
        let fragment = match parse_fragment(html) {
            Ok(fragment) => fragment,
            Err(e) => {
                tracing::warn!("Malformed OOB fragment: {}", e);
                report.malformed += 1;
                return report;
            }
        };

        for node in fragment.flagged(&self.attribute) {
            let Some(id) = fragment.tree().element_id(node).filter(|id| !id.is_empty()) else {
                tracing::warn!("OOB element without an id");
                report.malformed += 1;
                continue;
            };
            let Some(target) = doc.resolve(id) else {
                tracing::warn!("OOB target not found: {}", id);
                report.missing.push(id.to_string());
                continue;
            };

            let tree = doc.tree_mut();
            let swapped = tree
                .import_subtree(fragment.tree(), node)
                .and_then(|new| tree.replace_node(target, new).map(|()| new));
            match swapped {
                Ok(new) => {
                    tracing::debug!("OOB swapped {} ({} -> {})", id, target, new);
                    report.applied.push(id.to_string());
                    report.inserted.push(new);
                    match tree.release(target) {
                        Ok(freed) => report.released.extend(freed),
                        Err(e) => tracing::warn!("Could not release replaced {}: {}", target, e),
                    }
                }
                Err(e) => {
                    tracing::error!("OOB swap of {} failed: {}", id, e);
                    report.malformed += 1;
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_html::parse_document;

    const PAGE: &str = concat!(
        r#"<mesh-board id="board"><template shadowrootmode="open">"#,
        r#"<mesh-column id="column-1"><template shadowrootmode="open">"#,
        r#"<mesh-card id="card-1"><template shadowrootmode="open"><h3>Old</h3></template></mesh-card>"#,
        r#"<mesh-card id="card-2"><template shadowrootmode="open"><h3>Two</h3></template></mesh-card>"#,
        r#"</template></mesh-column>"#,
        r#"</template></mesh-board>"#,
    );

    fn title(doc: &Document, id: &str) -> String {
        let card = doc.resolve(id).unwrap();
        let shadow = doc.tree().shadow_root(card).unwrap();
        doc.tree().text_content(shadow)
    }

    #[test]
    fn test_decode_named_events() {
        assert_eq!(
            OobPayload::decode(&SseEvent::named("oob-update", "<p></p>")),
            OobPayload::Fragment("<p></p>".to_string())
        );
        let batch = OobPayload::decode(&SseEvent::named(
            "oob-batch",
            r#"{"batchId":"b1","updates":[{"id":"x","html":"<p></p>"}]}"#,
        ));
        match batch {
            OobPayload::Batch(b) => {
                assert_eq!(b.batch_id, "b1");
                assert_eq!(b.updates.len(), 1);
            }
            other => panic!("expected batch, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_sniffs_message() {
        assert!(matches!(
            OobPayload::decode(&SseEvent::message(r#"{"batchID":"b","updates":[{"id":"a","html":""}]}"#)),
            OobPayload::Batch(_)
        ));
        assert!(matches!(
            OobPayload::decode(&SseEvent::message("<mesh-card></mesh-card>")),
            OobPayload::Fragment(_)
        ));
    }

    #[test]
    fn test_decode_ignores_handshake_and_garbage() {
        assert!(matches!(
            OobPayload::decode(&SseEvent::message(r#"{"status":"connected"}"#)),
            OobPayload::Ignored(_)
        ));
        assert!(matches!(
            OobPayload::decode(&SseEvent::named("oob-batch", "{not json")),
            OobPayload::Ignored(_)
        ));
        assert!(matches!(
            OobPayload::decode(&SseEvent::named("ping", "")),
            OobPayload::Ignored(_)
        ));
    }

    #[test]
    fn test_fragment_replaces_nested_card() {
        let mut doc = parse_document(PAGE, "about:blank");
        let old = doc.resolve("card-1").unwrap();
        let applier = OobApplier::new("mesh-swap-oob");

        let report = applier.apply_fragment(
            &mut doc,
            r#"<mesh-card id="card-1" mesh-swap-oob><template shadowrootmode="open"><h3>New</h3></template></mesh-card>"#,
        );

        assert_eq!(report.applied, vec!["card-1".to_string()]);
        let new = doc.resolve("card-1").unwrap();
        assert_ne!(new, old);
        assert_eq!(report.inserted, vec![new]);
        assert_eq!(title(&doc, "card-1"), "New");
        assert!(!doc.tree().is_connected(old));
        // Sibling order is kept
        let parent = doc.tree().parent(new).unwrap();
        let cards = doc.tree().element_children(parent);
        assert_eq!(cards[0], new);
    }

    #[test]
    fn test_unflagged_elements_are_ignored() {
        let mut doc = parse_document(PAGE, "about:blank");
        let report = OobApplier::new("mesh-swap-oob")
            .apply_fragment(&mut doc, r#"<mesh-card id="card-1"><h3>Nope</h3></mesh-card>"#);
        assert!(report.is_empty());
        assert_eq!(title(&doc, "card-1"), "Old");
    }

    #[test]
    fn test_miss_is_reported() {
        let mut doc = parse_document(PAGE, "about:blank");
        let report = OobApplier::new("mesh-swap-oob")
            .apply_fragment(&mut doc, r#"<mesh-card id="card-404" mesh-swap-oob></mesh-card>"#);
        assert_eq!(report.missing, vec!["card-404".to_string()]);
        assert!(report.applied.is_empty());
    }

    #[test]
    fn test_batch_with_malformed_middle_entry() {
        let mut doc = parse_document(PAGE, "about:blank");
        let batch: OobBatch = serde_json::from_str(
            r#"{"batchID":"b7","updates":[
                {"id":"card-1","html":"<mesh-card id=\"card-1\" mesh-swap-oob><template shadowrootmode=\"open\"><h3>One!</h3></template></mesh-card>"},
                {"id":"card-x","html":42},
                {"id":"card-w","html":"   "},
                {"id":"card-2","html":"<mesh-card id=\"card-2\" mesh-swap-oob><template shadowrootmode=\"open\"><h3>Two!</h3></template></mesh-card>"}
            ]}"#,
        )
        .unwrap();

        let report = OobApplier::new("mesh-swap-oob").apply_batch(&mut doc, &batch);
        assert_eq!(report.applied, vec!["card-1".to_string(), "card-2".to_string()]);
        // One shape error, one fragment with no elements
        assert_eq!(report.malformed, 2);
        assert_eq!(title(&doc, "card-1"), "One!");
        assert_eq!(title(&doc, "card-2"), "Two!");
    }

    #[test]
    fn test_repeated_updates_reuse_the_arena() {
        let mut doc = parse_document(PAGE, "about:blank");
        let applier = OobApplier::new("mesh-swap-oob");
        let update = concat!(
            r#"<mesh-column id="column-1" mesh-swap-oob><template shadowrootmode="open">"#,
            r#"<mesh-card id="card-1"><template shadowrootmode="open"><h3>Same</h3></template></mesh-card>"#,
            r#"</template></mesh-column>"#,
        );

        applier.apply_fragment(&mut doc, update);
        let live = doc.tree().len();
        let capacity = doc.tree().capacity();
        for _ in 0..1000 {
            let report = applier.apply_fragment(&mut doc, update);
            assert_eq!(report.applied, vec!["column-1".to_string()]);
            assert!(!report.released.is_empty());
        }

        assert_eq!(doc.tree().len(), live);
        // The replacement is imported before the old subtree is freed
        assert!(doc.tree().capacity() <= capacity + live);
        assert_eq!(title(&doc, "card-1"), "Same");
    }

    #[test]
    fn test_unparseable_fragment_is_malformed() {
        let mut doc = parse_document(PAGE, "about:blank");
        let report = OobApplier::new("mesh-swap-oob").apply_fragment(&mut doc, "   ");
        assert_eq!(report.malformed, 1);
    }
}
