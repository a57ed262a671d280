use crate::sheet::Cell;
use indexmap::IndexMap;
use std::fmt::{Display, Formatter};

/// Tag of the document root element.
pub const ROOT_TAG: &str = "AssessmentFull";

/// A leaf value of the document.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Scalar {
    /// Converts a populated sheet cell into a scalar; empty cells have no scalar.
    pub fn from_cell(cell: &Cell) -> Option<Self> {
        match cell {
            cell if cell.is_empty() => None,
            Cell::Number(number) => Some(Scalar::Float(*number)),
            Cell::Text(text) => Some(Scalar::Text(text.trim().to_string())),
            Cell::Empty => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Int(value) => write!(f, "{value}"),
            // whole floats keep a trailing ".0" so they stay distinguishable from integers
            Scalar::Float(value) if value.is_finite() && value.fract() == 0. => {
                write!(f, "{value:.1}")
            }
            Scalar::Float(value) => write!(f, "{value}"),
            Scalar::Bool(value) => write!(f, "{value}"),
            Scalar::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value.into())
    }
}

impl From<usize> for Scalar {
    fn from(value: usize) -> Self {
        Scalar::Int(value as i64)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

/// A node of the generic nested document.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    /// A field that is intentionally absent; rendered as a nil-marked element.
    Nil,
    Map(Record),
    /// An ordered list whose items are each wrapped in an anonymous `item` element.
    List(Vec<Node>),
    /// Sibling elements that all share the tag of the field holding them.
    Repeated(Vec<Node>),
}

impl Node {
    pub fn empty_list() -> Self {
        Node::List(vec![])
    }

    /// Whether serializing this node under a tag produces at least one element.
    pub(crate) fn emits_element(&self) -> bool {
        match self {
            Node::Repeated(items) => items.iter().any(Node::emits_element),
            _ => true,
        }
    }

    /// Whether the element for this node would have neither text nor child elements.
    pub(crate) fn is_empty_element(&self) -> bool {
        match self {
            Node::Map(record) => !record.values().any(Node::emits_element),
            Node::List(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Node::Map(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn items(&self) -> &[Node] {
        match self {
            Node::Repeated(items) | Node::List(items) => items,
            _ => &[],
        }
    }
}

impl From<Scalar> for Node {
    fn from(value: Scalar) -> Self {
        Node::Scalar(value)
    }
}

impl From<Record> for Node {
    fn from(value: Record) -> Self {
        Node::Map(value)
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::Scalar(value.into())
    }
}

impl From<i32> for Node {
    fn from(value: i32) -> Self {
        Node::Scalar(value.into())
    }
}

impl From<usize> for Node {
    fn from(value: usize) -> Self {
        Node::Scalar(value.into())
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Node::Scalar(value.into())
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Scalar(value.into())
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Scalar(value.into())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Scalar(value.into())
    }
}

impl From<&Scalar> for Node {
    fn from(value: &Scalar) -> Self {
        Node::Scalar(value.clone())
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(value: Option<T>) -> Self {
        value.map_or(Node::Nil, Into::into)
    }
}

/// An ordered mapping of field names to nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record(IndexMap<String, Node>);

impl Record {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Node>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Node>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.0.iter().map(|(key, node)| (key.as_str(), node))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Node> {
        self.0.values()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The assembled document for one unit, rooted at [`ROOT_TAG`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub root: Record,
}

impl Document {
    pub fn new(root: Record) -> Self {
        Self { root }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Looks up a node by its path of field names from the root.
    pub fn at(&self, path: &[&str]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.root.get(first)?;
        for key in rest {
            node = node.as_record()?.get(key)?;
        }
        Some(node)
    }
}
