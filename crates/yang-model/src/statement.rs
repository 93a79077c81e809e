//! Statement keywords
//!
//! [`StatementDefinition`] is the closed set of statements the compiler
//! understands natively. Extension instances (`prefix:keyword`) all map to
//! [`StatementDefinition::Unknown`]; their actual keyword travels alongside
//! the statement.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! statement_definitions {
    ($($variant:ident => $keyword:literal),+ $(,)?) => {
        /// A recognised statement keyword.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum StatementDefinition {
            $($variant,)+
            /// Extension instance or any other prefixed keyword.
            Unknown,
        }

        impl StatementDefinition {
            /// Every native definition, in declaration order.
            pub const ALL: &'static [StatementDefinition] = &[$(StatementDefinition::$variant,)+];

            /// Keyword as written in YANG source.
            pub fn keyword(self) -> &'static str {
                match self {
                    $(StatementDefinition::$variant => $keyword,)+
                    StatementDefinition::Unknown => "<unknown>",
                }
            }

            /// Look up a native definition by its keyword.
            pub fn from_keyword(keyword: &str) -> Option<Self> {
                match keyword {
                    $($keyword => Some(StatementDefinition::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

statement_definitions! {
    Module => "module",
    Submodule => "submodule",
    YangVersion => "yang-version",
    Namespace => "namespace",
    Prefix => "prefix",
    Import => "import",
    Include => "include",
    BelongsTo => "belongs-to",
    Revision => "revision",
    RevisionDate => "revision-date",
    Organization => "organization",
    Contact => "contact",
    Description => "description",
    Reference => "reference",
    Units => "units",
    Default => "default",
    Presence => "presence",
    Status => "status",
    Config => "config",
    Mandatory => "mandatory",
    MinElements => "min-elements",
    MaxElements => "max-elements",
    OrderedBy => "ordered-by",
    When => "when",
    Must => "must",
    Key => "key",
    Container => "container",
    Leaf => "leaf",
    LeafList => "leaf-list",
    List => "list",
    Choice => "choice",
    Case => "case",
    Anydata => "anydata",
    Anyxml => "anyxml",
    Grouping => "grouping",
    Uses => "uses",
    Refine => "refine",
    Augment => "augment",
    Typedef => "typedef",
    Type => "type",
    Enum => "enum",
    Value => "value",
    Bit => "bit",
    Position => "position",
    Range => "range",
    Length => "length",
    Pattern => "pattern",
    Modifier => "modifier",
    ErrorMessage => "error-message",
    ErrorAppTag => "error-app-tag",
    Path => "path",
    RequireInstance => "require-instance",
    FractionDigits => "fraction-digits",
    Identity => "identity",
    Base => "base",
    Feature => "feature",
    IfFeature => "if-feature",
    Extension => "extension",
    Argument => "argument",
    YinElement => "yin-element",
    Deviation => "deviation",
    Deviate => "deviate",
}

impl StatementDefinition {
    /// Statements that name a node of the schema tree.
    pub fn is_schema_tree(self) -> bool {
        matches!(
            self,
            Self::Container
                | Self::Leaf
                | Self::LeafList
                | Self::List
                | Self::Choice
                | Self::Case
                | Self::Anydata
                | Self::Anyxml
        )
    }

    /// Statements that define data nodes (schema tree minus choice/case).
    pub fn is_data_definition(self) -> bool {
        matches!(
            self,
            Self::Container | Self::Leaf | Self::LeafList | Self::List | Self::Anydata | Self::Anyxml
        )
    }

    /// Root statements of a source.
    pub fn is_root(self) -> bool {
        matches!(self, Self::Module | Self::Submodule)
    }
}

impl fmt::Display for StatementDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup_is_inverse() {
        for def in StatementDefinition::ALL {
            assert_eq!(StatementDefinition::from_keyword(def.keyword()), Some(*def));
        }
        assert_eq!(StatementDefinition::from_keyword("ex:thing"), None);
    }

    #[test]
    fn test_schema_tree_classification() {
        assert!(StatementDefinition::Choice.is_schema_tree());
        assert!(!StatementDefinition::Choice.is_data_definition());
        assert!(StatementDefinition::Leaf.is_data_definition());
        assert!(!StatementDefinition::Grouping.is_schema_tree());
        assert!(!StatementDefinition::Uses.is_schema_tree());
    }
}
