use std::fmt;

/// Node types of the post graph. Every label is keyed by exactly one unique
/// property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeLabel {
    Post,
    Author,
    Timestamp,
    Claim,
    Entity,
    Keyword,
    Hashtag,
    FactCheckVerdict,
    FactCheckSource,
}

impl NodeLabel {
    pub const ALL: [NodeLabel; 9] = [
        NodeLabel::Post,
        NodeLabel::Author,
        NodeLabel::Timestamp,
        NodeLabel::Claim,
        NodeLabel::Entity,
        NodeLabel::Keyword,
        NodeLabel::Hashtag,
        NodeLabel::FactCheckVerdict,
        NodeLabel::FactCheckSource,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeLabel::Post => "Post",
            NodeLabel::Author => "Author",
            NodeLabel::Timestamp => "Timestamp",
            NodeLabel::Claim => "Claim",
            NodeLabel::Entity => "Entity",
            NodeLabel::Keyword => "Keyword",
            NodeLabel::Hashtag => "Hashtag",
            NodeLabel::FactCheckVerdict => "FactCheckVerdict",
            NodeLabel::FactCheckSource => "FactCheckSource",
        }
    }

    /// The unique key property.
    pub fn key(self) -> &'static str {
        match self {
            NodeLabel::Post => "id",
            NodeLabel::Author | NodeLabel::Entity | NodeLabel::FactCheckSource => "name",
            NodeLabel::Timestamp | NodeLabel::FactCheckVerdict => "value",
            NodeLabel::Claim | NodeLabel::Keyword => "text",
            NodeLabel::Hashtag => "tag",
        }
    }

    pub fn uniqueness_constraint(self) -> String {
        format!(
            "CREATE CONSTRAINT IF NOT EXISTS FOR (n:{label}) REQUIRE n.{key} IS UNIQUE",
            label = self.as_str(),
            key = self.key(),
        )
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelType {
    Created,
    AtTime,
    HasVerdict,
    FromSource,
    ContainsClaim,
    Mentions,
    HasKeyword,
    HasHashtag,
    MentionsUser,
}

impl RelType {
    pub fn as_str(self) -> &'static str {
        match self {
            RelType::Created => "CREATED",
            RelType::AtTime => "AT_TIME",
            RelType::HasVerdict => "HAS_VERDICT",
            RelType::FromSource => "FROM_SOURCE",
            RelType::ContainsClaim => "CONTAINS_CLAIM",
            RelType::Mentions => "MENTIONS",
            RelType::HasKeyword => "HAS_KEYWORD",
            RelType::HasHashtag => "HAS_HASHTAG",
            RelType::MentionsUser => "MENTIONS_USER",
        }
    }
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
