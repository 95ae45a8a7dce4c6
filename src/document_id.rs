// Document identifiers: parsing of `id:<namespace>:<type>:<key/value>:<user id>`
// strings and the mapping of a parsed id to the path used by the
// /document/v1 API.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Everything except ASCII letters, digits and `- _ . ~` is escaped in a
/// path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid document id '{0}': expected id:<namespace>:<document-type>::<id>")]
    InvalidFormat(String),
}

/// Optional location modifier between the document type and the user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    None,
    Number(u64),
    Group(String),
}

/// A parsed document id. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentId {
    raw: String,
    namespace: String,
    document_type: String,
    locator: Locator,
    user_id: String,
}

impl DocumentId {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let invalid = || ParseError::InvalidFormat(raw.to_string());

        let rest = raw.strip_prefix("id:").ok_or_else(invalid)?;
        let mut fields = rest.splitn(4, ':');
        let namespace = fields.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let document_type = fields.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let key_value = fields.next().ok_or_else(invalid)?;
        // The user id is the colon-joined tail and may itself contain ':'
        let user_id = fields.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;

        let locator = if key_value.is_empty() {
            Locator::None
        } else if let Some(n) = key_value.strip_prefix("n=") {
            Locator::Number(n.parse().map_err(|_| invalid())?)
        } else if let Some(g) = key_value.strip_prefix("g=") {
            if g.is_empty() {
                return Err(invalid());
            }
            Locator::Group(g.to_string())
        } else {
            return Err(invalid());
        };

        Ok(DocumentId {
            raw: raw.to_string(),
            namespace: namespace.to_string(),
            document_type: document_type.to_string(),
            locator,
            user_id: user_id.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn document_type(&self) -> &str {
        &self.document_type
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Path of this document below the document service root, e.g.
    /// `document/v1/mynamespace/music/docid/a-head-full-of-dreams`.
    pub fn to_url_path(&self) -> String {
        let location = match &self.locator {
            Locator::None => "docid".to_string(),
            Locator::Number(n) => format!("number/{}", n),
            Locator::Group(g) => format!("group/{}", encode(g)),
        };
        format!(
            "document/v1/{}/{}/{}/{}",
            encode(&self.namespace),
            encode(&self.document_type),
            location,
            encode(&self.user_id)
        )
    }
}

fn encode(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

impl FromStr for DocumentId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentId::parse(s)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_id() {
        let id = DocumentId::parse("id:mynamespace:music::a-head-full-of-dreams").unwrap();
        assert_eq!(id.namespace(), "mynamespace");
        assert_eq!(id.document_type(), "music");
        assert_eq!(id.locator(), &Locator::None);
        assert_eq!(id.user_id(), "a-head-full-of-dreams");
        assert_eq!(id.to_string(), "id:mynamespace:music::a-head-full-of-dreams");
    }

    #[test]
    fn maps_to_docid_path() {
        let id: DocumentId = "id:mynamespace:music::a-head-full-of-dreams".parse().unwrap();
        assert_eq!(
            id.to_url_path(),
            "document/v1/mynamespace/music/docid/a-head-full-of-dreams"
        );
        assert_eq!(id.to_url_path(), id.to_url_path());
    }

    #[test]
    fn user_id_keeps_colons_and_is_escaped() {
        let id = DocumentId::parse("id:ns:type::a:b/c?d#e").unwrap();
        assert_eq!(id.user_id(), "a:b/c?d#e");
        assert_eq!(id.to_url_path(), "document/v1/ns/type/docid/a%3Ab%2Fc%3Fd%23e");
    }

    #[test]
    fn escapes_reserved_and_non_ascii() {
        let id = DocumentId::parse("id:ns:type::[x]@!$&'()*+,;= ~-_.é").unwrap();
        assert_eq!(
            id.to_url_path(),
            "document/v1/ns/type/docid/%5Bx%5D%40%21%24%26%27%28%29%2A%2B%2C%3B%3D%20~-_.%C3%A9"
        );
    }

    #[test]
    fn number_and_group_locators() {
        let id = DocumentId::parse("id:ns:type:n=42:doc").unwrap();
        assert_eq!(id.to_url_path(), "document/v1/ns/type/number/42/doc");

        let id = DocumentId::parse("id:ns:type:g=my group:doc").unwrap();
        assert_eq!(id.locator(), &Locator::Group("my group".into()));
        assert_eq!(id.to_url_path(), "document/v1/ns/type/group/my%20group/doc");
    }

    #[test]
    fn rejects_malformed_ids() {
        for raw in [
            "",
            "mynamespace:music::doc",
            "id:",
            "id::music::doc",
            "id:mynamespace:::doc",
            "id:mynamespace:music",
            "id:mynamespace:music:",
            "id:mynamespace:music::",
            "id:ns:type:n=abc:doc",
            "id:ns:type:g=:doc",
            "id:ns:type:x=1:doc",
        ] {
            assert_eq!(
                DocumentId::parse(raw),
                Err(ParseError::InvalidFormat(raw.to_string())),
                "{raw}"
            );
        }
    }
}
