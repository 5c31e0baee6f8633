//! Filtered, selectable view of the device's source catalog
//!
//! A reload is a full replace-on-snapshot: the new filtered list replaces
//! the old one in one assignment. Each reload takes a [`ReloadTicket`]; only
//! the most recently issued ticket may apply, so a slow reload that
//! finishes after a newer one (or after a disconnect) is dropped.
//!
//! Selection follows the device. [`SourceCatalog::set_selected`] only
//! produces the `setSource` command; the selected flag moves when the
//! device confirms with a SourceChange notification.

use std::collections::HashSet;

use remote_core::{DeviceCommand, Source, SourceType};

/// One displayed catalog row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: String,
    pub display_name: String,
    pub source_type: SourceType,
    pub selected: bool,
}

/// Identifies one reload request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadTicket(u64);

#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    hide_types: HashSet<String>,
    entries: Vec<CatalogEntry>,
    current_source_id: Option<String>,
    latest_ticket: u64,
}

impl SourceCatalog {
    /// Create a catalog that hides the given source types
    ///
    /// Matching is case-insensitive and exact: "line in" hides "LINE IN" but
    /// not "LINE IN 2".
    pub fn new<I, T>(hide_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self {
            hide_types: hide_types
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .collect(),
            ..Self::default()
        }
    }

    pub fn is_hidden(&self, source_type: &SourceType) -> bool {
        self.hide_types
            .contains(&source_type.as_str().to_lowercase())
    }

    /// Start a reload; any reload still in flight is superseded
    pub fn begin_reload(&mut self) -> ReloadTicket {
        self.latest_ticket += 1;
        ReloadTicket(self.latest_ticket)
    }

    /// Replace the displayed list with `sources`, filtered
    ///
    /// Returns `false` (and changes nothing) if `ticket` has been superseded.
    pub fn apply_reload(&mut self, ticket: ReloadTicket, sources: Vec<Source>) -> bool {
        if ticket.0 != self.latest_ticket {
            tracing::debug!("Discarding superseded source reload {:?}", ticket);
            return false;
        }

        let entries: Vec<CatalogEntry> = sources
            .into_iter()
            .filter(|source| !self.is_hidden(&source.source_type))
            .map(|source| {
                let display_name = source.display_name();
                tracing::debug!("source id: {}, source name: {}", source.id, display_name);
                CatalogEntry {
                    selected: self.current_source_id.as_deref() == Some(source.id.as_str()),
                    id: source.id,
                    display_name,
                    source_type: source.source_type,
                }
            })
            .collect();

        self.entries = entries;
        true
    }

    /// Drop the displayed list and any reload in flight (disconnect)
    pub fn invalidate(&mut self) {
        self.latest_ticket += 1;
        self.entries.clear();
        self.current_source_id = None;
    }

    /// The device switched to `source`
    pub fn on_source_change(&mut self, source: &Source) {
        tracing::debug!("source: {}", source.id);
        self.current_source_id = Some(source.id.clone());
        for entry in &mut self.entries {
            entry.selected = entry.id == source.id;
        }
    }

    /// Command that asks the device to switch to `id`
    ///
    /// The selection itself is not touched.
    pub fn set_selected(&self, id: &str) -> DeviceCommand {
        tracing::debug!("setSource: {}", id);
        DeviceCommand::SetSource(id.to_string())
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn current_source_id(&self) -> Option<&str> {
        self.current_source_id.as_deref()
    }

    pub fn selected(&self) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.selected)
    }

    /// The sources section should be shown
    pub fn is_visible(&self) -> bool {
        !self.entries.is_empty()
    }

    /// A TuneIn source survived filtering
    pub fn has_tune_in(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.source_type == SourceType::TuneIn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sources() -> Vec<Source> {
        vec![
            Source::new("a", "TuneIn", "TUNEIN"),
            Source::new("b", "Line-In", "LINE IN"),
        ]
    }

    #[test]
    fn test_hide_list_filters_case_insensitive() {
        let mut catalog = SourceCatalog::new(["line in"]);
        let ticket = catalog.begin_reload();

        assert!(catalog.apply_reload(ticket, sources()));

        let ids: Vec<&str> = catalog.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
        assert!(catalog.is_visible());
        assert!(catalog.has_tune_in());
    }

    #[rstest]
    #[case(&["LINE IN"], "LINE IN", true)]
    #[case(&["line in"], "Line In", true)]
    #[case(&["line"], "LINE IN", false)]
    #[case(&["line in"], "LINE IN 2", false)]
    #[case(&[], "TUNEIN", false)]
    fn test_is_hidden_exact_match(
        #[case] hide: &[&str],
        #[case] source_type: &str,
        #[case] hidden: bool,
    ) {
        let catalog = SourceCatalog::new(hide.iter());
        assert_eq!(catalog.is_hidden(&SourceType::parse(source_type)), hidden);
    }

    #[test]
    fn test_everything_hidden_makes_catalog_invisible() {
        let mut catalog = SourceCatalog::new(["tunein", "line in"]);
        let ticket = catalog.begin_reload();
        catalog.apply_reload(ticket, sources());

        assert!(catalog.entries().is_empty());
        assert!(!catalog.is_visible());
    }

    #[test]
    fn test_reload_preserves_order_and_borrowed_names() {
        let mut catalog = SourceCatalog::new(Vec::<String>::new());
        let ticket = catalog.begin_reload();
        catalog.apply_reload(
            ticket,
            vec![
                Source::new("z", "Spotify", "SPOTIFY").borrowed_from("Kitchen"),
                Source::new("y", "Spotify", "SPOTIFY"),
                Source::new("x", "Bluetooth", "BLUETOOTH"),
            ],
        );

        let names: Vec<&str> = catalog
            .entries()
            .iter()
            .map(|e| e.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["Spotify (Kitchen)", "Spotify", "Bluetooth"]);
    }

    #[test]
    fn test_newer_reload_supersedes_older() {
        let mut catalog = SourceCatalog::new(Vec::<String>::new());
        let older = catalog.begin_reload();
        let newer = catalog.begin_reload();

        assert!(catalog.apply_reload(newer, vec![Source::new("new", "New", "SPOTIFY")]));
        assert!(!catalog.apply_reload(older, vec![Source::new("old", "Old", "SPOTIFY")]));

        assert_eq!(catalog.entries().len(), 1);
        assert_eq!(catalog.entries()[0].id, "new");
    }

    #[test]
    fn test_invalidate_discards_in_flight_reload() {
        let mut catalog = SourceCatalog::new(Vec::<String>::new());
        let ticket = catalog.begin_reload();
        catalog.invalidate();

        assert!(!catalog.apply_reload(ticket, sources()));
        assert!(!catalog.is_visible());
    }

    #[test]
    fn test_selection_follows_source_change() {
        let mut catalog = SourceCatalog::new(Vec::<String>::new());
        let ticket = catalog.begin_reload();
        catalog.apply_reload(ticket, sources());

        catalog.on_source_change(&Source::new("b", "Line-In", "LINE IN"));
        assert_eq!(catalog.selected().map(|e| e.id.as_str()), Some("b"));
        assert_eq!(catalog.entries().iter().filter(|e| e.selected).count(), 1);

        catalog.on_source_change(&Source::new("unknown", "Other", "DLNA"));
        assert_eq!(catalog.selected(), None);
        assert_eq!(catalog.current_source_id(), Some("unknown"));
    }

    #[test]
    fn test_reload_marks_current_source() {
        let mut catalog = SourceCatalog::new(Vec::<String>::new());
        catalog.on_source_change(&Source::new("a", "TuneIn", "TUNEIN"));

        let ticket = catalog.begin_reload();
        catalog.apply_reload(ticket, sources());

        assert_eq!(catalog.selected().map(|e| e.id.as_str()), Some("a"));
    }

    #[test]
    fn test_set_selected_is_not_optimistic() {
        let mut catalog = SourceCatalog::new(Vec::<String>::new());
        let ticket = catalog.begin_reload();
        catalog.apply_reload(ticket, sources());

        let command = catalog.set_selected("b");

        assert_eq!(command, DeviceCommand::SetSource("b".to_string()));
        assert_eq!(catalog.selected(), None);
    }
}
