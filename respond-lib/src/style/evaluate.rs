use crate::style::rules::{RuleBody, RuleStore};

/// CSS fragments whose conditions hold, grouped by media type.
///
/// Buckets keep the order their media type was first seen in; fragments
/// keep descriptor registration order, so later rules still win when the
/// bucket is concatenated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveSet {
    buckets: Vec<MediaBucket>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaBucket {
    pub media_type: String,
    pub fragments: Vec<String>,
}

impl MediaBucket {
    /// The bucket's CSS, fragments joined by newlines.
    pub fn css(&self) -> String {
        self.fragments.join("\n")
    }
}

impl ActiveSet {
    /// Appends a fragment to its media bucket, once per active descriptor.
    fn push(&mut self, media_type: &str, css: &str) {
        let position = match self.buckets.iter().position(|b| b.media_type == media_type) {
            Some(position) => position,
            None => {
                self.buckets.push(MediaBucket {
                    media_type: media_type.to_string(),
                    fragments: Vec::new(),
                });
                self.buckets.len() - 1
            }
        };
        self.buckets[position].fragments.push(css.to_string());
    }

    pub fn buckets(&self) -> &[MediaBucket] {
        &self.buckets
    }

    pub fn get(&self, media_type: &str) -> Option<&MediaBucket> {
        self.buckets.iter().find(|b| b.media_type == media_type)
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Computes the active CSS at `width`.
///
/// Live queries referenced by the store get their per-pass match flag reset
/// and then set if any of their conditions holds; committing that flag and
/// notifying listeners is left to the caller.
pub fn evaluate(store: &RuleStore, width: f64) -> ActiveSet {
    for query in store.queries() {
        query.begin_pass();
    }

    let mut active = ActiveSet::default();
    for descriptor in store.descriptors() {
        let is_active = descriptor.condition.is_active(width);
        log::trace!(
            "{} min={:?} max={:?} at {}px: {}",
            descriptor.condition.media_type,
            descriptor.condition.min_width,
            descriptor.condition.max_width,
            width,
            is_active
        );
        match store.body(descriptor.rule_index) {
            Some(RuleBody::Query(query)) => query.record_match(is_active),
            Some(RuleBody::Css(css)) if is_active => {
                active.push(&descriptor.condition.media_type, css);
            }
            _ => {}
        }
    }
    active
}
