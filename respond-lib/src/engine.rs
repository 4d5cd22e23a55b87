//! The polyfill engine: owns every piece of state and runs evaluation passes.

use crate::config::EngineConfig;
use crate::dom::dom_tree::{Document, NodeRef};
use crate::error::{RespondError, Result};
use crate::parser::media::{parse_media_blocks, parse_media_query_list};
use crate::query::{dispatch_changes, MediaQueryList};
use crate::sheets::{is_same_origin, SheetSource};
use crate::style::evaluate::evaluate;
use crate::style::inject::StyleInjector;
use crate::style::rules::{RuleBody, RuleDescriptor, RuleStore};
use crate::throttle::{Clock, ResizeAction, ResizeThrottle, SystemClock};
use crate::viewport::{effective_width, Viewport};
use html5ever::interface::QuirksMode;
use std::collections::HashSet;

/// Conditional-stylesheet engine for one document.
///
/// Everything runs synchronously on the calling thread. Each pass reads the
/// viewport, recomputes the active CSS, re-injects the `<style>` elements
/// and then notifies live-query listeners.
pub struct Engine {
    config: EngineConfig,
    document: Document,
    viewport: Box<dyn Viewport>,
    clock: Box<dyn Clock>,
    store: RuleStore,
    injector: StyleInjector,
    throttle: ResizeThrottle,
    parsed_sheets: HashSet<String>,
}

impl Engine {
    /// Creates an engine with the default configuration and the system clock.
    pub fn new(document: Document, viewport: impl Viewport + 'static) -> Self {
        let config = EngineConfig::default();
        Engine {
            throttle: ResizeThrottle::new(config.throttle_ms),
            config,
            document,
            viewport: Box::new(viewport),
            clock: Box::new(SystemClock::new()),
            store: RuleStore::new(),
            injector: StyleInjector::new(),
            parsed_sheets: HashSet::new(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.throttle = ResizeThrottle::new(config.throttle_ms);
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Parses stylesheet text and runs one pass.
    ///
    /// `base_href` is the sheet's own URL, used to absolutize relative
    /// `url(...)` references. `media_attr` guards the whole sheet when it has
    /// no `@media` blocks. Returns the descriptors this call added.
    pub fn parse(
        &mut self,
        style_text: &str,
        base_href: &str,
        media_attr: Option<&str>,
    ) -> Result<Vec<RuleDescriptor>> {
        let mut added = Vec::new();
        for block in parse_media_blocks(style_text, base_href, media_attr) {
            let index = self.store.push_body(RuleBody::Css(block.body));
            for condition in block.conditions {
                added.extend(self.store.push_descriptor(condition, index).cloned());
            }
        }
        log::debug!(
            "parsed {} conditional rule(s) from `{}`",
            added.len(),
            base_href
        );
        self.apply()?;
        Ok(added)
    }

    /// Creates a live query, `matchMedia`-style.
    ///
    /// The query is evaluated before this returns, so `matches()` is already
    /// accurate.
    ///
    /// If a listener of an older query fails during that first pass, the
    /// error is returned instead of the handle. The new query stays
    /// registered and evaluated, and is the last entry of `rules().queries()`.
    pub fn match_media(&mut self, query: &str) -> Result<MediaQueryList> {
        let list = MediaQueryList::new(query);
        let index = self.store.push_body(RuleBody::Query(list.clone()));
        for condition in parse_media_query_list(query) {
            self.store.push_descriptor(condition, index);
        }
        self.apply()?;
        Ok(list)
    }

    /// Runs one full pass: evaluate, inject, notify.
    ///
    /// A failing listener aborts the remaining notifications and its error
    /// is returned; the injected styles are already up to date by then.
    pub fn apply(&mut self) -> Result<()> {
        let quirks = self.document.compat_mode() == QuirksMode::Quirks;
        let width = effective_width(&*self.viewport, quirks);
        let active = evaluate(&self.store, width);
        log::debug!(
            "pass at {}px: {} active media type(s)",
            width,
            active.buckets().len()
        );
        self.injector.inject(&self.document, &active);
        self.throttle.record_run(self.clock.now_ms());
        dispatch_changes(self.store.queries())
    }

    /// Viewport-change signal. Runs a pass now or defers one, see
    /// [`ResizeThrottle`].
    pub fn on_viewport_change(&mut self) -> Result<()> {
        match self.throttle.signal(self.clock.now_ms()) {
            ResizeAction::RunNow => self.apply(),
            ResizeAction::Deferred { due_ms } => {
                log::trace!("resize deferred until {}ms", due_ms);
                Ok(())
            }
        }
    }

    /// When the deferred pass, if any, is due.
    pub fn next_deadline(&self) -> Option<u64> {
        self.throttle.deferred()
    }

    /// Runs the deferred pass if it is due. Returns whether a pass ran.
    pub fn run_pending(&mut self) -> Result<bool> {
        if !self.throttle.is_due(self.clock.now_ms()) {
            return Ok(false);
        }
        self.apply()?;
        Ok(true)
    }

    /// Bootstraps the engine, or re-runs it after stylesheets were added.
    ///
    /// With native media-query support only a pass runs. Otherwise each
    /// same-origin stylesheet link not parsed before is fetched from `source`
    /// and parsed. Sheets that fail to load are skipped.
    pub fn update(&mut self, source: &mut dyn SheetSource) -> Result<()> {
        if self.config.native_media_queries {
            return self.apply();
        }
        let base_href = self.document.base_href();
        for link in self.document.stylesheet_links() {
            if self.parsed_sheets.contains(&link.href) {
                continue;
            }
            if !is_same_origin(
                &link.href,
                base_href.as_deref(),
                self.config.page_host.as_deref(),
            ) {
                log::debug!("skipping cross-origin stylesheet `{}`", link.href);
                continue;
            }
            self.parsed_sheets.insert(link.href.clone());
            match source.fetch(&link.href) {
                Ok(Some(text)) => {
                    self.parse(&text, &link.href, link.media.as_deref())?;
                }
                Ok(None) => log::debug!("no source for stylesheet `{}`", link.href),
                Err(err) => log::warn!("{}{}", err, source_suffix(&err)),
            }
        }
        Ok(())
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleStore {
        &self.store
    }

    pub fn descriptors(&self) -> &[RuleDescriptor] {
        self.store.descriptors()
    }

    /// The `<style>` elements currently injected by the engine.
    pub fn injected(&self) -> &[NodeRef] {
        self.injector.injected()
    }
}

fn source_suffix(err: &RespondError) -> String {
    std::error::Error::source(err).map_or_else(String::new, |source| format!(": {}", source))
}
