//! Searchable record fields addressable by `name:` markers.

use std::fmt;

/// A field that a term can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Url,
    DsId,
    Head,
    HeadDescribe,
    Branches,
    Tags,
    /// The serialized content of every metadata entry.
    Metadata,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Url,
        Field::DsId,
        Field::Head,
        Field::HeadDescribe,
        Field::Branches,
        Field::Tags,
        Field::Metadata,
    ];

    /// Looks up a field by its marker name, ignoring ASCII case.
    pub fn lookup(name: &str) -> Option<Field> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(name))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::DsId => "ds_id",
            Self::Head => "head",
            Self::HeadDescribe => "head_describe",
            Self::Branches => "branches",
            Self::Tags => "tags",
            Self::Metadata => "metadata",
        }
    }

    /// Relative cost of matching a term against this field.
    pub(crate) fn cost(self) -> u8 {
        match self {
            Self::Url | Self::DsId | Self::Head | Self::HeadDescribe => 0,
            Self::Branches | Self::Tags => 1,
            Self::Metadata => 3,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(Field::lookup("url"), Some(Field::Url));
        assert_eq!(Field::lookup("URL"), Some(Field::Url));
        assert_eq!(Field::lookup("Head_Describe"), Some(Field::HeadDescribe));
    }

    #[test]
    fn lookup_rejects_unknown_names() {
        assert_eq!(Field::lookup("name"), None);
        assert_eq!(Field::lookup(""), None);
        assert_eq!(Field::lookup("metadata[x]"), None);
    }

    #[test]
    fn names_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::lookup(field.as_str()), Some(field));
        }
    }
}
