// ABOUTME: Session state for the bibslide application
// ABOUTME: Owns the active source, chunking parameters, export options and the presenter

use crate::chunk::{build_deck, Deck, Slide};
use crate::content::{BibleContent, ChunkingParameters, ExportOptions, Mode, SourceContent, StyleOptions};
use crate::lookup::{LookupError, LookupTicket, LookupTracker, PassageLookup};
use crate::preview::Presenter;
use crate::store::Preferences;
use log::{debug, info};

/// The single active source and everything derived from it.
///
/// Slides are recomputed on every change to the source or the chunking
/// parameters and pushed to the presenter.
#[derive(Debug)]
pub struct Session {
    mode: Mode,
    source: Option<SourceContent>,
    params: ChunkingParameters,
    options: ExportOptions,
    presenter: Presenter,
    lookups: LookupTracker,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Mode::Bible)
    }
}

impl Session {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            source: None,
            params: ChunkingParameters::default(),
            options: ExportOptions::default(),
            presenter: Presenter::default(),
            lookups: LookupTracker::new(),
        }
    }

    pub fn from_preferences(mode: Mode, preferences: &Preferences) -> Self {
        let mut session = Self::new(mode);
        session.params = preferences.chunking;
        session.options = ExportOptions {
            style: preferences.style.clone(),
            theme: preferences.theme,
            church_name: preferences.church_name.clone(),
        };
        session
    }

    /// Snapshot of the persistable choices
    pub fn preferences(&self) -> Preferences {
        Preferences {
            style: self.options.style.clone(),
            chunking: self.params,
            theme: self.options.theme,
            church_name: self.options.church_name.clone(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn source(&self) -> Option<&SourceContent> {
        self.source.as_ref()
    }

    pub fn params(&self) -> ChunkingParameters {
        self.params
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut Presenter {
        &mut self.presenter
    }

    pub fn slides(&self) -> &[Slide] {
        self.presenter.slides()
    }

    /// Structured deck for exporters, `None` when there is nothing to show
    pub fn deck(&self) -> Option<Deck> {
        self.source
            .as_ref()
            .map(|source| build_deck(source, &self.params))
            .filter(|deck| !deck.is_empty())
    }

    /// Replace the active source. The mode follows the source variant.
    pub fn set_source(&mut self, source: SourceContent) {
        info!("Active source set ({} mode)", source.mode());
        self.mode = source.mode();
        self.source = Some(source);
        self.rechunk();
    }

    /// Change mode. Content of the previous mode is dropped.
    pub fn switch_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }
        debug!("Switching mode from {} to {}", self.mode, mode);
        self.mode = mode;
        self.lookups.cancel();
        self.clear();
    }

    pub fn clear(&mut self) {
        self.source = None;
        self.rechunk();
    }

    pub fn set_params(&mut self, params: ChunkingParameters) {
        self.params = params;
        self.rechunk();
    }

    pub fn set_style(&mut self, style: StyleOptions) {
        self.options.style = style;
    }

    pub fn set_options(&mut self, options: ExportOptions) {
        self.options = options;
    }

    /// Start a lookup. Any displayed passage is cleared and earlier
    /// lookups become stale.
    pub fn begin_lookup(&mut self) -> LookupTicket {
        self.mode = Mode::Bible;
        self.clear();
        self.lookups.begin()
    }

    /// Apply a lookup response.
    ///
    /// Returns `Ok(false)` when the ticket is no longer current; the response
    /// is discarded and the session is untouched.
    pub fn complete_lookup(
        &mut self,
        ticket: LookupTicket,
        response: Result<BibleContent, LookupError>,
    ) -> Result<bool, LookupError> {
        if !self.lookups.is_current(ticket) {
            debug!("Discarding stale lookup response {:?}", ticket);
            return Ok(false);
        }
        let content = response?;
        self.set_source(SourceContent::Bible(content));
        Ok(true)
    }

    /// Blocking lookup through a passage service
    pub fn lookup(
        &mut self,
        service: &dyn PassageLookup,
        query: &str,
        translation: &str,
    ) -> Result<(), LookupError> {
        let ticket = self.begin_lookup();
        let response = service.fetch(query, translation);
        self.complete_lookup(ticket, response).map(|_| ())
    }

    fn rechunk(&mut self) {
        let slides = self
            .deck()
            .map(|deck| deck.texts())
            .unwrap_or_default();
        self.presenter.set_slides(slides);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{PasteType, PastedContent, Verse};

    fn passage(n: u32) -> BibleContent {
        BibleContent {
            book: "John".to_string(),
            chapter: 3,
            verses: (1..=n)
                .map(|number| Verse {
                    number,
                    text: format!("v{}", number),
                })
                .collect(),
            translation: None,
        }
    }

    struct FixedLookup(Result<BibleContent, LookupError>);

    impl PassageLookup for FixedLookup {
        fn fetch(&self, _query: &str, _translation: &str) -> Result<BibleContent, LookupError> {
            self.0.clone()
        }
    }

    #[test]
    fn test_index_resets_when_slide_count_shrinks() {
        let mut session = Session::default();
        session.set_source(SourceContent::Bible(passage(5)));
        assert_eq!(session.slides().len(), 5);

        session.presenter_mut().go_to(4);
        assert_eq!(session.presenter().current(), 4);

        session.set_params(ChunkingParameters::new(3, 2));
        assert_eq!(session.slides().len(), 2);
        assert_eq!(session.presenter().current(), 0);
    }

    #[test]
    fn test_switching_mode_clears_source() {
        let mut session = Session::default();
        session.set_source(SourceContent::Bible(passage(2)));
        session.switch_mode(Mode::Song);
        assert!(session.source().is_none());
        assert!(session.slides().is_empty());
        assert!(session.deck().is_none());
    }

    #[test]
    fn test_set_source_follows_variant() {
        let mut session = Session::default();
        session.set_source(SourceContent::Pasted(PastedContent {
            text: "a\nb".to_string(),
            paste_type: PasteType::Song,
        }));
        assert_eq!(session.mode(), Mode::Paste);
        assert_eq!(session.slides(), ["a\nb".to_string()]);
    }

    #[test]
    fn test_stale_lookup_is_discarded() {
        let mut session = Session::default();
        let first = session.begin_lookup();
        let second = session.begin_lookup();

        assert_eq!(session.complete_lookup(first, Ok(passage(3))), Ok(false));
        assert!(session.source().is_none());

        assert_eq!(session.complete_lookup(second, Ok(passage(2))), Ok(true));
        assert_eq!(session.slides().len(), 2);
    }

    #[test]
    fn test_new_lookup_clears_displayed_passage() {
        let mut session = Session::default();
        session.set_source(SourceContent::Bible(passage(3)));
        let _ticket = session.begin_lookup();
        assert!(session.source().is_none());
        assert!(session.presenter().is_empty());
    }

    #[test]
    fn test_failed_lookup_leaves_nothing_to_render() {
        let mut session = Session::default();
        let service = FixedLookup(Err(LookupError::Offline));
        assert_eq!(
            session.lookup(&service, "John 3", "kjv"),
            Err(LookupError::Offline)
        );
        assert!(session.deck().is_none());

        let service = FixedLookup(Ok(passage(4)));
        session.lookup(&service, "John 3", "kjv").unwrap();
        assert_eq!(session.deck().unwrap().slides.len(), 4);
    }

    #[test]
    fn test_preferences_round_trip() {
        let mut preferences = Preferences::default();
        preferences.chunking = ChunkingParameters::new(2, 3);
        preferences.church_name = Some("Grace Church".to_string());
        let session = Session::from_preferences(Mode::Song, &preferences);
        assert_eq!(session.preferences(), preferences);
        assert_eq!(session.mode(), Mode::Song);
    }

    #[test]
    fn test_style_changes_keep_slides() {
        let mut session = Session::default();
        session.set_source(SourceContent::Pasted(PastedContent {
            text: "a\nb\nc".to_string(),
            paste_type: PasteType::Bible,
        }));
        session.presenter_mut().go_to(2);

        let style = StyleOptions {
            bg_color: "#0f172a".to_string(),
            ..Default::default()
        };
        session.set_style(style.clone());
        assert_eq!(session.options().style, style);
        assert_eq!(session.presenter().current(), 2);

        session.set_options(ExportOptions {
            church_name: Some("Bethel".to_string()),
            ..Default::default()
        });
        assert_eq!(session.options().church_name(), Some("Bethel"));
        assert_eq!(session.options().style, StyleOptions::default());
        assert_eq!(session.slides().len(), 3);
    }
}
