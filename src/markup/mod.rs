//! Rendering of assembled documents as XML markup.

mod normalize;
mod serialize;

pub use normalize::normalize;
pub use serialize::to_markup;

use thiserror::Error;

/// Text that stands in for an absent value until the markup is normalized, where it
/// becomes an `xsi:nil` marker.
pub const NIL_SENTINEL: &str = "replace_xsi:nul";

#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("\"{0}\" is not a valid XML element name")]
    InvalidName(String),
    #[error("malformed markup at position {position}: {source}")]
    Malformed {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },
    #[error("element <{0}> is never closed")]
    Unclosed(String),
    #[error(transparent)]
    Write(#[from] quick_xml::Error),
    #[error(transparent)]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Whether `name` can be used as an XML element name.
pub(crate) fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    (first.is_alphabetic() || first == '_')
        && !name.to_ascii_lowercase().starts_with("xml")
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("AssessmentFull", true)]
    #[case("Designed_AP50_AP4", true)]
    #[case("ThermalBridge-E3-0", true)]
    #[case("item", true)]
    #[case("", false)]
    #[case("2ndFloor", false)]
    #[case("Gross Area", false)]
    #[case("xmlData", false)]
    #[case("U<value", false)]
    fn should_validate_element_names(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(is_element_name(name), valid);
    }
}
