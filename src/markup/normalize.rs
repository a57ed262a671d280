use super::{MarkupError, NIL_SENTINEL};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::borrow::Cow;

const XSD_NAMESPACE: (&str, &str) = ("xmlns:xsd", "http://www.w3.org/2001/XMLSchema");
const XSI_NAMESPACE: (&str, &str) = ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance");
const NIL_ATTRIBUTE: (&str, &str) = ("xsi:nil", "true");

/// Element bases carrying a positional suffix, with the suffixes they may carry.
const INDEXED_TAGS: [(&str, u32, u32); 10] = [
    ("Measurement", 0, 9),
    ("ExternalWall", 0, 19),
    ("PartyWall", 0, 19),
    ("ExternalRoof", 0, 19),
    ("HeatLossFloor", 0, 19),
    ("Floor", 0, 19),
    ("Roof", 0, 19),
    ("OpeningType", 0, 19),
    ("Opening", 0, 19),
    ("CommunityHeatSource", 1, 5),
];

const THERMAL_BRIDGE_TAG: &str = "ThermalBridge";

/// Rewrites serialized markup into the form the assessment schema accepts.
///
/// * elements whose whole text is [`NIL_SENTINEL`] become empty elements marked
///   `xsi:nil="true"`
/// * positional suffixes are stripped from indexed tags (`Measurement3` becomes
///   `Measurement`, `ThermalBridge-E3-0` becomes `ThermalBridge`)
/// * the root element gains the `xsd` and `xsi` namespace declarations
///
/// Whitespace and all other content pass through untouched, so normalizing twice gives
/// the same markup as normalizing once.
pub fn normalize(markup: &str) -> Result<String, MarkupError> {
    let events = read_events(markup)?;
    let mut writer = Writer::new(Vec::new());
    let mut seen_root = false;
    let mut index = 0;

    while index < events.len() {
        match &events[index] {
            Event::Start(start) => {
                let mut element = renamed(start);
                if !seen_root {
                    declare_namespaces(&mut element);
                    seen_root = true;
                }

                if let (Some(Event::Text(text)), Some(Event::End(_))) =
                    (events.get(index + 1), events.get(index + 2))
                {
                    if text.unescape().is_ok_and(|text| text == NIL_SENTINEL) {
                        mark_nil(&mut element);
                        writer.write_event(Event::Empty(element))?;
                        index += 3;
                        continue;
                    }
                }
                writer.write_event(Event::Start(element))?;
            }
            Event::Empty(start) => {
                let mut element = renamed(start);
                if !seen_root {
                    declare_namespaces(&mut element);
                    seen_root = true;
                }
                writer.write_event(Event::Empty(element))?;
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                let tag = strip_index(&name);
                writer.write_event(Event::End(BytesEnd::new(tag.as_ref())))?;
            }
            event => writer.write_event(event.clone())?,
        }
        index += 1;
    }

    Ok(String::from_utf8(writer.into_inner())?)
}

/// Reads the whole markup up front so that sentinel elements can be recognised by
/// looking ahead.
fn read_events(markup: &str) -> Result<Vec<Event<'static>>, MarkupError> {
    let mut reader = Reader::from_str(markup);
    let mut open = Vec::new();
    let mut events = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|source| MarkupError::Malformed {
                position: reader.buffer_position(),
                source,
            })?;
        match &event {
            Event::Start(start) => {
                open.push(String::from_utf8_lossy(start.name().as_ref()).into_owned())
            }
            Event::End(_) => {
                open.pop();
            }
            Event::Eof => break,
            _ => {}
        }
        events.push(event.into_owned());
    }

    match open.pop() {
        Some(unclosed) => Err(MarkupError::Unclosed(unclosed)),
        None => Ok(events),
    }
}

fn renamed(start: &BytesStart) -> BytesStart<'static> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = start.clone().into_owned();
    if let Cow::Owned(tag) = strip_index(&name) {
        element.set_name(tag.as_bytes());
    }
    element
}

/// Base tag of an index-suffixed element; any other tag is returned unchanged.
fn strip_index(tag: &str) -> Cow<'_, str> {
    if tag.starts_with("ThermalBridge-") {
        return Cow::Owned(THERMAL_BRIDGE_TAG.to_string());
    }

    INDEXED_TAGS
        .iter()
        .find(|(base, first, last)| {
            tag.strip_prefix(base)
                .and_then(|suffix| {
                    suffix
                        .parse::<u32>()
                        .ok()
                        .filter(|index| index.to_string() == suffix)
                })
                .is_some_and(|index| (*first..=*last).contains(&index))
        })
        .map_or(Cow::Borrowed(tag), |(base, _, _)| Cow::Owned(base.to_string()))
}

fn declare_namespaces(root: &mut BytesStart) {
    for (key, value) in [XSD_NAMESPACE, XSI_NAMESPACE] {
        if !has_attribute(root, key) {
            root.push_attribute((key, value));
        }
    }
}

fn mark_nil(element: &mut BytesStart) {
    if !has_attribute(element, NIL_ATTRIBUTE.0) {
        element.push_attribute(NIL_ATTRIBUTE);
    }
}

fn has_attribute(element: &BytesStart, key: &str) -> bool {
    element
        .attributes()
        .flatten()
        .any(|attribute| attribute.key.as_ref() == key.as_bytes())
}
