//! Content blocks: the semantic text units of a page.

use serde::{Deserialize, Serialize};

use super::{LanguageInfo, MlFeatures};
use crate::geometry::BBox;

/// Semantic role of a content block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Title,
    Heading,
    Subheading,
    Author,
    #[default]
    Paragraph,
    Caption,
    Footnote,
    Metadata,
}

impl Role {
    /// Hierarchy level of the role (1 = most prominent).
    pub fn hierarchy_level(self) -> u8 {
        match self {
            Role::Title => 1,
            Role::Heading => 2,
            Role::Subheading => 3,
            Role::Author => 4,
            Role::Paragraph => 5,
            Role::Caption | Role::Metadata => 6,
            Role::Footnote => 7,
        }
    }

    /// Whether blocks of this role open a section that later blocks belong to.
    pub fn opens_section(self) -> bool {
        matches!(self, Role::Title | Role::Heading)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Title => "title",
            Role::Heading => "heading",
            Role::Subheading => "subheading",
            Role::Author => "author",
            Role::Paragraph => "paragraph",
            Role::Caption => "caption",
            Role::Footnote => "footnote",
            Role::Metadata => "metadata",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Font weight of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Horizontal alignment of a block relative to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    /// Infer alignment from a block's horizontal extent.
    pub fn detect(x0: f32, x1: f32, page_width: f32) -> Self {
        let page_center = page_width / 2.0;
        let block_center = (x0 + x1) / 2.0;

        if (block_center - page_center).abs() < page_width * 0.1 {
            Alignment::Center
        } else if x0 < page_width * 0.2 {
            Alignment::Left
        } else if x1 > page_width * 0.8 {
            Alignment::Right
        } else {
            Alignment::Left
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}

/// Typographic attributes of a block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Styling {
    /// Largest font size in the block
    pub font_size: Option<f32>,
    pub font_weight: FontWeight,
    pub alignment: Alignment,
}

/// Weak references from a block to regions and other blocks on its page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Relationships {
    pub figure_id: Option<String>,
    pub table_id: Option<String>,
    pub footnote_ids: Vec<String>,
}

impl Relationships {
    pub fn clear(&mut self) {
        self.figure_id = None;
        self.table_id = None;
        self.footnote_ids.clear();
    }
}

/// A classified unit of paragraph-level text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Page-scoped identifier, `page_{n}_block_{i}`
    pub id: String,

    /// Page number (1-indexed)
    pub page_number: u32,

    /// Always `text`
    #[serde(rename = "type")]
    pub block_type: String,

    /// Derived from `text_type`; kept in sync by [`ContentBlock::set_role`]
    pub hierarchy_level: u8,

    pub text_type: Role,

    pub content: String,

    pub language: LanguageInfo,

    pub position: BBox,

    pub styling: Styling,

    pub parent_id: Option<String>,

    pub children_ids: Vec<String>,

    pub relationships: Relationships,

    /// Set when the block was joined across a column break
    pub is_multi_column: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml_features: Option<MlFeatures>,
}

impl ContentBlock {
    /// Create a block with the given role and text.
    pub fn new(
        id: impl Into<String>,
        page_number: u32,
        role: Role,
        content: impl Into<String>,
        position: BBox,
    ) -> Self {
        Self {
            id: id.into(),
            page_number,
            block_type: "text".to_string(),
            hierarchy_level: role.hierarchy_level(),
            text_type: role,
            content: content.into(),
            language: LanguageInfo::unknown(),
            position,
            styling: Styling::default(),
            parent_id: None,
            children_ids: Vec::new(),
            relationships: Relationships::default(),
            is_multi_column: false,
            ml_features: None,
        }
    }

    /// Block identifier for the `index`-th block of a page.
    pub fn make_id(page_number: u32, index: usize) -> String {
        format!("page_{}_block_{}", page_number, index)
    }

    /// Change the role, updating the hierarchy level with it.
    pub fn set_role(&mut self, role: Role) {
        self.text_type = role;
        self.hierarchy_level = role.hierarchy_level();
    }

    /// Set styling.
    pub fn with_styling(mut self, styling: Styling) -> Self {
        self.styling = styling;
        self
    }

    /// Set language annotation.
    pub fn with_language(mut self, language: LanguageInfo) -> Self {
        self.language = language;
        self
    }

    pub fn is_bold(&self) -> bool {
        self.styling.font_weight == FontWeight::Bold
    }
}
