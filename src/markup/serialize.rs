use super::{is_element_name, MarkupError, NIL_SENTINEL};
use crate::core::document::{Document, Node, Record, ROOT_TAG};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

/// Tag wrapping each entry of a [`Node::List`].
const LIST_ITEM_TAG: &str = "item";

/// Writes the document as indented markup rooted at [`ROOT_TAG`], without an XML
/// declaration. Absent values are written as [`NIL_SENTINEL`].
pub fn to_markup(document: &Document) -> Result<String, MarkupError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write_record(&mut writer, ROOT_TAG, &document.root)?;

    let mut markup = String::from_utf8(writer.into_inner())?;
    markup.push('\n');
    Ok(markup)
}

fn write_node<W: Write>(writer: &mut Writer<W>, tag: &str, node: &Node) -> Result<(), MarkupError> {
    match node {
        Node::Repeated(items) => {
            for item in items {
                write_node(writer, tag, item)?;
            }
        }
        _ if node.is_empty_element() => {
            writer.write_event(Event::Empty(start(tag)?))?;
        }
        Node::Scalar(scalar) => write_text_element(writer, tag, &scalar.to_string())?,
        Node::Nil => write_text_element(writer, tag, NIL_SENTINEL)?,
        Node::Map(record) => write_record(writer, tag, record)?,
        Node::List(items) => {
            writer.write_event(Event::Start(start(tag)?))?;
            for item in items {
                write_node(writer, LIST_ITEM_TAG, item)?;
            }
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
        }
    }

    Ok(())
}

fn write_record<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    record: &Record,
) -> Result<(), MarkupError> {
    if !record.values().any(Node::emits_element) {
        writer.write_event(Event::Empty(start(tag)?))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start(tag)?))?;
    for (key, child) in record.iter() {
        write_node(writer, key, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> Result<(), MarkupError> {
    writer.write_event(Event::Start(start(tag)?))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn start(tag: &str) -> Result<BytesStart<'_>, MarkupError> {
    if !is_element_name(tag) {
        return Err(MarkupError::InvalidName(tag.to_string()));
    }
    Ok(BytesStart::new(tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn should_write_nested_document() {
        let document = Document::new(
            Record::new()
                .with(
                    "Assessment",
                    Record::new()
                        .with("Reference", "Flat 1")
                        .with("Storeys", 2)
                        .with("GrossArea", 10.)
                        .with("Basement", false)
                        .with("PropertyAgeBand", Node::Nil)
                        .with("InternalPartitions", Node::empty_list())
                        .with(
                            "ExternalWalls",
                            Record::new().with(
                                "ExternalWall",
                                Node::Repeated(vec![
                                    Record::new().with("Description", "W1").into(),
                                    Record::new().with("Description", "W2").into(),
                                ]),
                            ),
                        )
                        .with("PartyWalls", Record::new().with("PartyWall", Node::Repeated(vec![]))),
                )
                .with("Plot", Record::new().with("Postcode", Node::List(vec!["AB1".into()]))),
        );

        let markup = to_markup(&document).unwrap();

        assert_eq!(
            markup,
            "<AssessmentFull>
  <Assessment>
    <Reference>Flat 1</Reference>
    <Storeys>2</Storeys>
    <GrossArea>10.0</GrossArea>
    <Basement>false</Basement>
    <PropertyAgeBand>replace_xsi:nul</PropertyAgeBand>
    <InternalPartitions/>
    <ExternalWalls>
      <ExternalWall>
        <Description>W1</Description>
      </ExternalWall>
      <ExternalWall>
        <Description>W2</Description>
      </ExternalWall>
    </ExternalWalls>
    <PartyWalls/>
  </Assessment>
  <Plot>
    <Postcode>
      <item>AB1</item>
    </Postcode>
  </Plot>
</AssessmentFull>
"
        );
    }

    #[test]
    fn should_escape_text() {
        let document = Document::new(Record::new().with("Description", "Wall <north> & east"));

        let markup = to_markup(&document).unwrap();

        assert!(markup.contains("<Description>Wall &lt;north&gt; &amp; east</Description>"));
    }

    #[test]
    fn should_reject_invalid_tag() {
        let document = Document::new(Record::new().with("Gross Area", 1));

        assert!(matches!(
            to_markup(&document),
            Err(MarkupError::InvalidName(name)) if name == "Gross Area"
        ));
    }
}
