use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use annomerge_domain::{BbF, Line, Mask, Points, Polygon, ShapeI};
use serde::{Deserialize, Serialize};

/// Tag identifying which payload variant an [`Annotation`] carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnnotationType {
    Label,
    Bbox,
    Polygon,
    Mask,
    Polyline,
    Points,
    Caption,
}

impl std::fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A scalar attribute value: string, number, or bool.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttrValue::Bool(a), AttrValue::Bool(b)) => a == b,
            (AttrValue::Number(a), AttrValue::Number(b)) => a.to_bits() == b.to_bits(),
            (AttrValue::Text(a), AttrValue::Text(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for AttrValue {}
impl Hash for AttrValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            AttrValue::Bool(b) => {
                0u8.hash(state);
                b.hash(state);
            }
            AttrValue::Number(n) => {
                1u8.hash(state);
                n.to_bits().hash(state);
            }
            AttrValue::Text(s) => {
                2u8.hash(state);
                s.hash(state);
            }
        }
    }
}

/// Reserved attribute name carrying a merged/source annotation's confidence.
pub const SCORE_ATTR: &str = "score";

/// Ordered name → value map, insertion order preserved. Overriding a key
/// updates its value in place rather than moving it to the end, so a
/// merged annotation's own attributes can override vote winners without
/// disturbing iteration order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes(Vec<(String, AttrValue)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: AttrValue) {
        let name = name.into();
        if let Some(slot) = self.0.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = value;
        } else {
            self.0.push((name, value));
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        if let Some(pos) = self.0.iter().position(|(k, _)| k == name) {
            Some(self.0.remove(pos).1)
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, AttrValue)> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn score(&self) -> f64 {
        match self.get(SCORE_ATTR) {
            Some(AttrValue::Number(n)) => *n,
            _ => 1.0,
        }
    }

    pub fn set_score(&mut self, score: f64) {
        self.insert(SCORE_ATTR, AttrValue::Number(score));
    }
}

/// The shape (or caption text) payload an annotation carries; `Label`
/// carries none.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    None,
    Bbox(BbF),
    Polygon(Polygon),
    Mask(Mask),
    Polyline(Line),
    Points(Points),
    Caption(String),
}

impl Payload {
    pub fn ann_type(&self) -> AnnotationType {
        match self {
            Payload::None => AnnotationType::Label,
            Payload::Bbox(_) => AnnotationType::Bbox,
            Payload::Polygon(_) => AnnotationType::Polygon,
            Payload::Mask(_) => AnnotationType::Mask,
            Payload::Polyline(_) => AnnotationType::Polyline,
            Payload::Points(_) => AnnotationType::Points,
            Payload::Caption(_) => AnnotationType::Caption,
        }
    }

    pub fn bbox(&self) -> Option<BbF> {
        match self {
            Payload::Bbox(b) => Some(*b),
            Payload::Polygon(p) => Some(p.enclosing_bb()),
            Payload::Mask(m) => Some(m.bb.into()),
            Payload::Polyline(l) => l.bbox().ok(),
            Payload::Points(p) => p.bbox(),
            Payload::None | Payload::Caption(_) => None,
        }
    }
}

/// One annotation on an item: a label, a shape with an optional label, or
/// (unsupported) a caption.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub payload: Payload,
    /// Index into the label catalog; `None` only valid for shape-only votes
    /// that failed label quorum.
    pub label: Option<usize>,
    pub group: u32,
    pub z_order: i32,
    pub attributes: Attributes,
}

impl Annotation {
    pub fn new(payload: Payload, label: Option<usize>) -> Self {
        Self {
            payload,
            label,
            group: 0,
            z_order: 0,
            attributes: Attributes::new(),
        }
    }

    pub fn ann_type(&self) -> AnnotationType {
        self.payload.ann_type()
    }

    pub fn score(&self) -> f64 {
        self.attributes.score()
    }
}

/// `(label index → name)` catalog shared by every source for one
/// annotation kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategoryBundle {
    pub labels: Vec<String>,
}

impl CategoryBundle {
    pub fn find(&self, name: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == name)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Categories(pub BTreeMap<AnnotationType, CategoryBundle>);

impl Categories {
    pub fn merge(sources: &[Categories]) -> Result<Categories, (AnnotationType, CategoryBundle, CategoryBundle)> {
        let mut merged = Categories::default();
        for cats in sources {
            for (ty, bundle) in &cats.0 {
                match merged.0.get(ty) {
                    Some(existing) if existing != bundle => {
                        return Err((*ty, existing.clone(), bundle.clone()));
                    }
                    Some(_) => {}
                    None => {
                        merged.0.insert(*ty, bundle.clone());
                    }
                }
            }
        }
        Ok(merged)
    }
}

pub type ItemId = (String, Option<String>);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Image {
    pub shape: Option<ShapeI>,
    pub data: Option<Vec<u8>>,
    pub channels: u32,
}

impl Image {
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Item {
    pub id: String,
    pub subset: Option<String>,
    pub annotations: Vec<Annotation>,
    pub image: Option<Image>,
}

impl Item {
    pub fn item_id(&self) -> ItemId {
        (self.id.clone(), self.subset.clone())
    }
}

pub type MergedItem = Item;
