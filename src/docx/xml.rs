//! Small helpers for WordprocessingML attributes.

use quick_xml::events::BytesStart;

/// Value of attribute `key`, lossily decoded.
pub(crate) fn attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// `w:val` of an on/off property such as `<w:b/>`; absent means on.
pub(crate) fn toggle(e: &BytesStart) -> bool {
    match attr(e, b"w:val") {
        Some(v) => !matches!(v.as_str(), "0" | "false" | "off" | "none"),
        None => true,
    }
}
