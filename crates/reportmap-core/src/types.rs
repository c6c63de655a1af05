//! Canonical records shared by every stage.
//!
//! Identifiers are plain strings assigned by the report definition and are
//! never rewritten. Fields that the engine fills in later are wrapped in
//! [`Resolution`] so that "not determined" never collapses into "empty".

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value::norm_text;

/// A derived field that may or may not have been determined.
///
/// `Resolved(String::new())` is present-but-empty data; `Unresolved` means no
/// authoritative source was found for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Resolution<T> {
    /// No authoritative source matched.
    Unresolved,
    /// Value copied from its authoritative source.
    Resolved(T),
}

impl<T> Resolution<T> {
    /// `true` when a value was resolved.
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Borrow the resolved value, if any.
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Resolved(v) => Some(v),
            Self::Unresolved => None,
        }
    }
}

impl<T> Default for Resolution<T> {
    fn default() -> Self {
        Self::Unresolved
    }
}

impl<T> From<Option<T>> for Resolution<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unresolved, Self::Resolved)
    }
}

/// Identity of one bookmark row: a bookmark together with the visual
/// container it captured.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookmarkKey {
    /// Bookmark identifier (file stem or document `name`).
    pub bookmark_id: String,
    /// Visual container captured by the bookmark, if any.
    pub visual_id: Option<String>,
}

impl fmt::Display for BookmarkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.visual_id {
            Some(visual) => write!(f, "{}/{}", self.bookmark_id, visual),
            None => write!(f, "{}", self.bookmark_id),
        }
    }
}

/// Composite identity of a visual: visual ids are only unique within a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VisualKey {
    /// Owning page identifier.
    pub page_id: String,
    /// Visual identifier within the page.
    pub visual_id: String,
}

impl VisualKey {
    /// Build a key from borrowed parts.
    pub fn new(page_id: &str, visual_id: &str) -> Self {
        Self {
            page_id: page_id.to_string(),
            visual_id: visual_id.to_string(),
        }
    }
}

impl fmt::Display for VisualKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.page_id, self.visual_id)
    }
}

/// Scope a bookmark applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookmarkMode {
    /// Applies only to the bookmark's target (selected) visuals.
    SingleVisual,
    /// Applies to every visual on the page.
    AllVisuals,
    /// A personal bookmark owned by a report consumer.
    Personal,
    /// The source value was not recognised.
    Unknown,
}

impl BookmarkMode {
    /// Parse a mode label, ignoring case, spaces, underscores and hyphens.
    ///
    /// Returns `None` for labels that are not recognised so callers can count
    /// the coercion to [`BookmarkMode::Unknown`].
    pub fn parse(raw: &str) -> Option<Self> {
        match norm_text(raw).as_str() {
            "singlevisual" | "selectedvisuals" | "targetvisuals" => Some(Self::SingleVisual),
            "allvisuals" | "all" => Some(Self::AllVisuals),
            "personal" => Some(Self::Personal),
            _ => None,
        }
    }

    /// Stable label used in exported sheets.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SingleVisual => "single-visual",
            Self::AllVisuals => "all-visuals",
            Self::Personal => "personal",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BookmarkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a visual. The set is open: unrecognised names are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualType {
    /// `slicer`
    Slicer,
    /// `tableEx` / `table`
    Table,
    /// `pivotTable` / `matrix`
    Matrix,
    /// `card`
    Card,
    /// `actionButton`
    ActionButton,
    /// `textbox`
    Textbox,
    /// `image`
    Image,
    /// `shape`
    Shape,
    /// Any `*Chart` visual, raw name kept.
    Chart(String),
    /// Any other named visual, raw name kept.
    Other(String),
    /// No type was captured.
    Unknown,
}

impl VisualType {
    /// Classify a raw `visualType` value.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Unknown;
        }
        match norm_text(trimmed).as_str() {
            "slicer" => Self::Slicer,
            "tableex" | "table" => Self::Table,
            "pivottable" | "matrix" => Self::Matrix,
            "card" => Self::Card,
            "actionbutton" => Self::ActionButton,
            "textbox" => Self::Textbox,
            "image" => Self::Image,
            "shape" => Self::Shape,
            norm if norm.ends_with("chart") => Self::Chart(trimmed.to_string()),
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// Name as it appears in report definitions.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Slicer => "slicer",
            Self::Table => "tableEx",
            Self::Matrix => "pivotTable",
            Self::Card => "card",
            Self::ActionButton => "actionButton",
            Self::Textbox => "textbox",
            Self::Image => "image",
            Self::Shape => "shape",
            Self::Chart(raw) | Self::Other(raw) => raw,
            Self::Unknown => "",
        }
    }

    /// `true` when no type was captured.
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for VisualType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interaction behaviour attached to a visual on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Navigates to another page.
    PageNavigation,
    /// Applies a bookmark.
    Bookmark,
    /// Shows a report-page tooltip.
    Tooltip,
    /// Unrecognised action label.
    Unknown,
}

impl ActionKind {
    /// Parse an action label (`PageNavigation`, `Page Navigation`, `bookmark`…).
    pub fn parse(raw: &str) -> Option<Self> {
        match norm_text(raw).as_str() {
            "pagenavigation" => Some(Self::PageNavigation),
            "bookmark" => Some(Self::Bookmark),
            "tooltip" => Some(Self::Tooltip),
            _ => None,
        }
    }

    /// Human label used in the Action Type / Action Name columns.
    pub const fn label(self) -> &'static str {
        match self {
            Self::PageNavigation => "Page Navigation",
            Self::Bookmark => "Bookmark",
            Self::Tooltip => "Tooltip",
            Self::Unknown => "Unknown",
        }
    }
}

/// One action on a page visual, with its target resolved to a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionAnnotation {
    /// What the action does.
    pub kind: ActionKind,
    /// Target identifier (page id for navigation/tooltip, bookmark id for bookmarks).
    pub target: Option<String>,
    /// Display name of the target, filled in by the engine.
    pub target_name: Resolution<String>,
}

impl ActionAnnotation {
    /// New annotation with an unresolved target name.
    pub const fn new(kind: ActionKind, target: Option<String>) -> Self {
        Self {
            kind,
            target,
            target_name: Resolution::Unresolved,
        }
    }
}

/// A filter applied by a bookmark, rendered as a readable predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterDescriptor(pub String);

impl fmt::Display for FilterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Values selected on a slicer captured by a bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlicerSelection {
    /// Column the slicer filters on.
    pub property: String,
    /// Selected values, in source order.
    pub values: Vec<String>,
}

impl fmt::Display for SlicerSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.values.as_slice() {
            [] => f.write_str(&self.property),
            [single] => write!(f, "{} = '{}'", self.property, single),
            many => {
                let quoted: Vec<String> = many.iter().map(|v| format!("'{v}'")).collect();
                write!(f, "{} IN [{}]", self.property, quoted.join(","))
            },
        }
    }
}

/// Position and size of a visual on its page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// Layout metadata captured for a visual; opaque apart from the bounding box.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Layout {
    /// Bounding box, when the capture carried numeric `x`/`y`/`width`/`height`.
    pub bounds: Option<BoundingBox>,
    /// The captured layout object, passed through untouched.
    pub raw: Option<serde_json::Value>,
}

/// One bookmark row: a bookmark's captured state for one visual container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Unique key of this row.
    pub key: BookmarkKey,
    /// Bookmark display name.
    pub name: String,
    /// Active page of the bookmark, when recorded.
    pub page_id: Option<String>,
    /// Scope of the bookmark.
    pub mode: BookmarkMode,
    /// Whether the visual is one of the bookmark's target visuals.
    pub selected: bool,
    /// Visual type as recorded inside the bookmark.
    pub recorded_type: VisualType,
    /// Container display mode (e.g. `hidden`).
    pub display_mode: Option<String>,
    /// Filters applied to the container, in source order.
    pub filters: Vec<FilterDescriptor>,
    /// Slicer selections, in source order.
    pub slicer_selections: Vec<SlicerSelection>,
    /// Visual type, taken from the matched visual.
    pub visual_type: Resolution<VisualType>,
    /// Title of the referenced visual.
    pub visual_title: Resolution<String>,
    /// Name of the page owning the referenced visual.
    pub page_name: Resolution<String>,
    /// The visual reference is absent or matched nothing.
    pub orphaned: bool,
}

impl Bookmark {
    /// Bookmark identifier.
    pub fn id(&self) -> &str {
        &self.key.bookmark_id
    }

    /// Referenced visual, if any.
    pub fn visual_id(&self) -> Option<&str> {
        self.key.visual_id.as_deref()
    }
}

/// A visual as listed on a page definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageVisual {
    /// Visual identifier, unique within the page.
    pub id: String,
    /// Visual type from the page definition.
    pub visual_type: VisualType,
    /// Actions attached to the visual.
    pub actions: Vec<ActionAnnotation>,
    /// Fields bound to the visual (`Table.Column`).
    pub columns: Vec<String>,
    /// Visual-level filter predicates.
    pub filters: Vec<String>,
    /// Title of the captured visual with the same key.
    pub title: Resolution<String>,
}

/// A report page and the visuals placed on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page identifier (section name).
    pub id: String,
    /// Page display name.
    pub name: String,
    /// Visuals in definition order.
    pub visuals: Vec<PageVisual>,
}

/// A visual as captured from the rendered report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visual {
    /// Visual identifier, unique within its page.
    pub id: String,
    /// Owning page identifier.
    pub page_id: String,
    /// Visual type.
    pub visual_type: VisualType,
    /// Displayed title; `None` when the visual has none.
    pub title: Option<String>,
    /// Layout metadata.
    pub layout: Layout,
    /// Name of the owning page, filled in by the engine.
    pub page_name: Resolution<String>,
}

impl Visual {
    /// Composite key of this visual.
    pub fn key(&self) -> VisualKey {
        VisualKey::new(&self.page_id, &self.id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_distinguishes_empty_from_unresolved() {
        let empty: Resolution<String> = Resolution::Resolved(String::new());
        let missing: Resolution<String> = Resolution::Unresolved;
        assert_ne!(empty, missing);
        assert!(empty.is_resolved());
        assert_eq!(empty.value().map(String::as_str), Some(""));
        assert_eq!(missing.value(), None);
    }

    #[test]
    fn test_resolution_serializes_with_state_tag() {
        let json = serde_json::to_string(&Resolution::Resolved("Sales".to_string())).unwrap();
        assert_eq!(json, r#"{"state":"resolved","value":"Sales"}"#);
        let json = serde_json::to_string(&Resolution::<String>::Unresolved).unwrap();
        assert_eq!(json, r#"{"state":"unresolved"}"#);
    }

    #[test]
    fn test_bookmark_mode_parse_is_separator_insensitive() {
        assert_eq!(
            BookmarkMode::parse("Single Visual"),
            Some(BookmarkMode::SingleVisual)
        );
        assert_eq!(
            BookmarkMode::parse("all_visuals"),
            Some(BookmarkMode::AllVisuals)
        );
        assert_eq!(BookmarkMode::parse("PERSONAL"), Some(BookmarkMode::Personal));
        assert_eq!(BookmarkMode::parse("sideways"), None);
    }

    #[test]
    fn test_visual_type_classification() {
        assert_eq!(VisualType::from_raw("slicer"), VisualType::Slicer);
        assert_eq!(VisualType::from_raw("tableEx"), VisualType::Table);
        assert_eq!(
            VisualType::from_raw("clusteredColumnChart"),
            VisualType::Chart("clusteredColumnChart".to_string())
        );
        assert_eq!(
            VisualType::from_raw("multiRowCard"),
            VisualType::Other("multiRowCard".to_string())
        );
        assert_eq!(VisualType::from_raw("  "), VisualType::Unknown);
        assert_eq!(VisualType::from_raw("lineChart").as_str(), "lineChart");
    }

    #[test]
    fn test_action_kind_parse() {
        assert_eq!(
            ActionKind::parse("Page Navigation"),
            Some(ActionKind::PageNavigation)
        );
        assert_eq!(
            ActionKind::parse("page-navigation"),
            Some(ActionKind::PageNavigation)
        );
        assert_eq!(ActionKind::parse("Bookmark"), Some(ActionKind::Bookmark));
        assert_eq!(ActionKind::parse("drillthrough"), None);
    }

    #[test]
    fn test_slicer_selection_display() {
        let bare = SlicerSelection {
            property: "Region".to_string(),
            values: vec![],
        };
        let single = SlicerSelection {
            property: "Region".to_string(),
            values: vec!["West".to_string()],
        };
        let many = SlicerSelection {
            property: "Region".to_string(),
            values: vec!["West".to_string(), "East".to_string()],
        };
        assert_eq!(bare.to_string(), "Region");
        assert_eq!(single.to_string(), "Region = 'West'");
        assert_eq!(many.to_string(), "Region IN ['West','East']");
    }

    #[test]
    fn test_bookmark_key_display() {
        let with_visual = BookmarkKey {
            bookmark_id: "B1".to_string(),
            visual_id: Some("V9".to_string()),
        };
        let without = BookmarkKey {
            bookmark_id: "B2".to_string(),
            visual_id: None,
        };
        assert_eq!(with_visual.to_string(), "B1/V9");
        assert_eq!(without.to_string(), "B2");
    }
}
