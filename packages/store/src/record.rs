//! # Record model
//!
//! Every addressable entity in a document is a `Record`: pages, sections,
//! stacks, items, and the layout edges that bind children to containers.
//! Records round-trip to the wire shape
//! `{id, type, parentId, orderKey?, x, y, props, meta}` and the variant
//! set is closed; capability dispatch matches on [`RecordType`] rather
//! than open-ended polymorphism.
//!
//! Inbound records of an unrecognized type are preserved verbatim in
//! [`Props::Unknown`] so that nothing is silently dropped on the way
//! through migration and merge.

use crate::meta::Meta;
use pagestack_common::{OrderKey, RecordId, Vec2};
use serde::{de, ser, Deserialize, Serialize};
use serde_json::Value;

/// Closed discriminant over the record variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Page,
    Section,
    Stack,
    Item,
    Edge,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageProps {
    pub width: f64,
    pub height: f64,
}

impl Default for PageProps {
    fn default() -> Self {
        PageProps {
            width: 1200.0,
            height: 600.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextStyle {
    Heading,
    Subheading,
    Body,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SectionProps {
    pub w: f64,
    pub h: f64,
    pub text: String,
    pub bg: String,
    pub text_style: TextStyle,
}

impl Default for SectionProps {
    fn default() -> Self {
        SectionProps {
            w: 1200.0,
            h: 500.0,
            text: "Section".to_string(),
            bg: "rgba(255,255,255,0.5)".to_string(),
            text_style: TextStyle::Heading,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StackProps {
    pub width: f64,
    pub height: f64,
    pub gap: f64,
}

impl Default for StackProps {
    fn default() -> Self {
        StackProps {
            width: 300.0,
            height: 400.0,
            gap: 8.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemProps {
    pub w: f64,
    pub h: f64,
    pub text: String,
    pub is_complete: bool,
}

impl Default for ItemProps {
    fn default() -> Self {
        ItemProps {
            w: 200.0,
            h: 50.0,
            text: "New todo".to_string(),
            is_complete: false,
        }
    }
}

/// The relation kind carried by an edge. Only layout bindings exist
/// today, but the tag is on the wire so new kinds stay additive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Layout,
}

/// A directed binding: `from_id` is the container, `to_id` the child.
/// `placeholder` marks a provisional mid-drag position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeProps {
    pub from_id: RecordId,
    pub to_id: RecordId,
    pub kind: EdgeKind,
    pub placeholder: bool,
}

/// Variant-specific record attributes, tagged by the wire `type` field.
#[derive(Debug, Clone, PartialEq)]
pub enum Props {
    Page(PageProps),
    Section(SectionProps),
    Stack(StackProps),
    Item(ItemProps),
    Edge(EdgeProps),
    /// Unrecognized inbound record, preserved verbatim.
    Unknown { ty: String, raw: Value },
}

impl Props {
    pub fn record_type(&self) -> RecordType {
        match self {
            Props::Page(_) => RecordType::Page,
            Props::Section(_) => RecordType::Section,
            Props::Stack(_) => RecordType::Stack,
            Props::Item(_) => RecordType::Item,
            Props::Edge(_) => RecordType::Edge,
            Props::Unknown { .. } => RecordType::Unknown,
        }
    }

    pub fn type_tag(&self) -> &str {
        match self {
            Props::Page(_) => "page",
            Props::Section(_) => "section",
            Props::Stack(_) => "stack",
            Props::Item(_) => "item",
            Props::Edge(_) => "edge",
            Props::Unknown { ty, .. } => ty,
        }
    }

    /// Rebuild a variant from a wire `type` tag and `props` value.
    pub fn from_parts(ty: &str, props: Value) -> Result<Props, serde_json::Error> {
        Ok(match ty {
            "page" => Props::Page(serde_json::from_value(props)?),
            "section" => Props::Section(serde_json::from_value(props)?),
            "stack" => Props::Stack(serde_json::from_value(props)?),
            "item" => Props::Item(serde_json::from_value(props)?),
            "edge" => Props::Edge(serde_json::from_value(props)?),
            other => Props::Unknown {
                ty: other.to_string(),
                raw: props,
            },
        })
    }

    fn props_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Props::Page(p) => serde_json::to_value(p),
            Props::Section(p) => serde_json::to_value(p),
            Props::Stack(p) => serde_json::to_value(p),
            Props::Item(p) => serde_json::to_value(p),
            Props::Edge(p) => serde_json::to_value(p),
            Props::Unknown { raw, .. } => Ok(raw.clone()),
        }
    }
}

/// An addressable document entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    /// Ownership: the record is laid out and reparented as a unit of this
    /// parent. Root records point at [`RecordId::root`].
    pub parent_id: RecordId,
    /// Sibling ordering token; edges carry the binding's key here.
    pub order_key: Option<OrderKey>,
    pub x: f64,
    pub y: f64,
    pub props: Props,
    pub meta: Meta,
}

impl Record {
    pub fn new(props: Props, parent_id: RecordId) -> Self {
        Record {
            id: RecordId::new(),
            parent_id,
            order_key: None,
            x: 0.0,
            y: 0.0,
            props,
            meta: Meta::default(),
        }
    }

    pub fn ty(&self) -> RecordType {
        self.props.record_type()
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn edge_props(&self) -> Option<&EdgeProps> {
        match &self.props {
            Props::Edge(p) => Some(p),
            _ => None,
        }
    }

    pub fn edge_props_mut(&mut self) -> Option<&mut EdgeProps> {
        match &mut self.props {
            Props::Edge(p) => Some(p),
            _ => None,
        }
    }

    pub fn width(&self) -> Option<f64> {
        match &self.props {
            Props::Page(p) => Some(p.width),
            Props::Section(p) => Some(p.w),
            Props::Stack(p) => Some(p.width),
            Props::Item(p) => Some(p.w),
            Props::Edge(_) | Props::Unknown { .. } => None,
        }
    }

    pub fn height(&self) -> Option<f64> {
        match &self.props {
            Props::Page(p) => Some(p.height),
            Props::Section(p) => Some(p.h),
            Props::Stack(p) => Some(p.height),
            Props::Item(p) => Some(p.h),
            Props::Edge(_) | Props::Unknown { .. } => None,
        }
    }

    pub fn set_width(&mut self, w: f64) {
        match &mut self.props {
            Props::Page(p) => p.width = w,
            Props::Section(p) => p.w = w,
            Props::Stack(p) => p.width = w,
            Props::Item(p) => p.w = w,
            Props::Edge(_) | Props::Unknown { .. } => {}
        }
    }

    pub fn set_height(&mut self, h: f64) {
        match &mut self.props {
            Props::Page(p) => p.height = h,
            Props::Section(p) => p.h = h,
            Props::Stack(p) => p.height = h,
            Props::Item(p) => p.h = h,
            Props::Edge(_) | Props::Unknown { .. } => {}
        }
    }
}

/// Flat wire representation; `Record` serde goes through this.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    id: RecordId,
    #[serde(rename = "type")]
    ty: String,
    parent_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    order_key: Option<OrderKey>,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    props: Value,
    #[serde(default)]
    meta: Meta,
}

impl Serialize for Record {
    fn serialize<S: ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let props = self.props.props_value().map_err(ser::Error::custom)?;
        RawRecord {
            id: self.id.clone(),
            ty: self.props.type_tag().to_string(),
            parent_id: self.parent_id.clone(),
            order_key: self.order_key.clone(),
            x: self.x,
            y: self.y,
            props,
            meta: self.meta.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawRecord::deserialize(deserializer)?;
        let props = Props::from_parts(&raw.ty, raw.props).map_err(de::Error::custom)?;
        Ok(Record {
            id: raw.id,
            parent_id: raw.parent_id,
            order_key: raw.order_key,
            x: raw.x,
            y: raw.y,
            props,
            meta: raw.meta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_round_trips_to_wire_shape() {
        let mut record = Record::new(Props::Section(SectionProps::default()), RecordId::root());
        record.x = 10.0;
        record.y = 20.0;
        record.order_key = Some(OrderKey::default_key());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "section");
        assert_eq!(json["parentId"], "root");
        assert_eq!(json["orderKey"], "a1");
        assert_eq!(json["props"]["textStyle"], "heading");
        assert_eq!(json["props"]["w"], 1200.0);

        let back: Record = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn unknown_type_is_preserved_verbatim() {
        let json = serde_json::json!({
            "id": "x1",
            "type": "sticker",
            "parentId": "root",
            "x": 1.0,
            "y": 2.0,
            "props": { "emoji": "🦀", "spin": 3 },
            "meta": { "source": "w9", "version": 7 }
        });

        let record: Record = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(record.ty(), RecordType::Unknown);
        assert_eq!(record.props.type_tag(), "sticker");
        assert_eq!(record.meta.version, 7);

        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out, json);
    }

    #[test]
    fn missing_props_fill_with_defaults() {
        let json = serde_json::json!({
            "id": "p1",
            "type": "page",
            "parentId": "root",
            "props": {},
        });
        let record: Record = serde_json::from_value(json).unwrap();
        assert_eq!(record.height(), Some(600.0));
        assert_eq!(record.width(), Some(1200.0));
        assert_eq!(record.meta, Meta::default());
    }

    #[test]
    fn item_completion_survives_the_round_trip() {
        let json = serde_json::json!({
            "id": "i1",
            "type": "item",
            "parentId": "stack-1",
            "props": { "w": 200.0, "h": 50.0, "text": "done thing", "isComplete": true },
            "meta": { "source": "w2", "version": 4 }
        });
        let record: Record = serde_json::from_value(json).unwrap();
        let Props::Item(props) = &record.props else {
            panic!("expected an item");
        };
        assert!(props.is_complete);

        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["props"]["isComplete"], true);
    }

    #[test]
    fn edge_props_round_trip() {
        let props = Props::Edge(EdgeProps {
            from_id: "c1".into(),
            to_id: "s1".into(),
            kind: EdgeKind::Layout,
            placeholder: true,
        });
        let mut record = Record::new(props, RecordId::root());
        record.order_key = Some(OrderKey::new("a2"));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["props"]["fromId"], "c1");
        assert_eq!(json["props"]["kind"], "layout");
        assert_eq!(json["props"]["placeholder"], true);

        let back: Record = serde_json::from_value(json).unwrap();
        assert_eq!(back.edge_props().unwrap().to_id, "s1".into());
    }
}
