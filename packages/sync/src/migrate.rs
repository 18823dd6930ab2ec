//! # Migration Pass
//!
//! Upgrades a single record's wire shape from legacy document versions
//! to the current one. Runs once per record on snapshot load and once
//! per inbound record before merge; running it again over its own
//! output is a no-op, so mixed-version peers can re-migrate freely.
//!
//! Upgrades:
//! - legacy type tags `builder` → `item` and `container` → `page`;
//! - flat top-level `w`/`h` folded into `props` (defaults 200 x 50);
//! - the legacy `content` prop renamed to `text` (default `"New todo"`),
//!   and `isComplete` given its `false` baseline;
//! - missing `x`/`y` given centered defaults (500, 100);
//! - a missing `meta` given an empty baseline.
//!
//! Ids are never touched, and unrecognized types pass through verbatim.

use serde_json::{json, Map, Value};
use tracing::warn;

const DEFAULT_W: f64 = 200.0;
const DEFAULT_H: f64 = 50.0;
const DEFAULT_X: f64 = 500.0;
const DEFAULT_Y: f64 = 100.0;
const DEFAULT_TEXT: &str = "New todo";

/// Upgrade one record's wire value. Idempotent.
pub fn migrate(mut value: Value) -> Value {
    let Some(obj) = value.as_object_mut() else {
        return value;
    };

    let ty = match obj.get("type").and_then(Value::as_str) {
        Some(t) => t.to_string(),
        None => return value,
    };
    let current = match ty.as_str() {
        "builder" => "item",
        "container" => "page",
        other => other,
    };
    match current {
        "page" | "section" | "stack" | "item" | "edge" => {}
        other => {
            warn!(ty = other, "unmigratable record type, passing through");
            return value;
        }
    }
    if current != ty {
        obj.insert("type".to_string(), json!(current));
    }

    if !obj.get("x").is_some_and(Value::is_number) {
        obj.insert("x".to_string(), json!(DEFAULT_X));
    }
    if !obj.get("y").is_some_and(Value::is_number) {
        obj.insert("y".to_string(), json!(DEFAULT_Y));
    }
    if !obj.get("meta").is_some_and(Value::is_object) {
        obj.insert("meta".to_string(), json!({}));
    }

    // legacy extents live at the top level; fold them under props
    let flat_w = obj.remove("w").filter(Value::is_number);
    let flat_h = obj.remove("h").filter(Value::is_number);
    if !obj.get("props").is_some_and(Value::is_object) {
        obj.insert("props".to_string(), json!({}));
    }

    if current == "item" {
        // props is known to be an object at this point
        if let Some(props) = obj.get_mut("props").and_then(Value::as_object_mut) {
            fill_extent(props, "w", flat_w, DEFAULT_W);
            fill_extent(props, "h", flat_h, DEFAULT_H);
            if !props.get("text").is_some_and(Value::is_string) {
                let text = props
                    .remove("content")
                    .and_then(|c| c.as_str().map(str::to_string))
                    .unwrap_or_else(|| DEFAULT_TEXT.to_string());
                props.insert("text".to_string(), json!(text));
            }
            props.remove("content");
            if !props.get("isComplete").is_some_and(Value::is_boolean) {
                props.insert("isComplete".to_string(), json!(false));
            }
        }
    } else if let Some(props) = obj.get_mut("props").and_then(Value::as_object_mut) {
        if let Some(w) = flat_w {
            props.entry(width_prop(current)).or_insert(w);
        }
        if let Some(h) = flat_h {
            props.entry(height_prop(current)).or_insert(h);
        }
    }

    value
}

fn fill_extent(props: &mut Map<String, Value>, key: &str, flat: Option<Value>, default: f64) {
    if props.get(key).is_some_and(Value::is_number) {
        return;
    }
    props.insert(key.to_string(), flat.unwrap_or(json!(default)));
}

fn width_prop(ty: &str) -> String {
    match ty {
        "section" => "w",
        _ => "width",
    }
    .to_string()
}

fn height_prop(ty: &str) -> String {
    match ty {
        "section" => "h",
        _ => "height",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_builder_becomes_item() {
        let legacy = json!({
            "id": "shape-1",
            "type": "builder",
            "parentId": "root",
            "w": 180.0,
            "h": 40.0,
            "props": { "content": "buy milk" }
        });
        let migrated = migrate(legacy);
        assert_eq!(migrated["type"], "item");
        assert_eq!(migrated["props"]["w"], 180.0);
        assert_eq!(migrated["props"]["h"], 40.0);
        assert_eq!(migrated["props"]["text"], "buy milk");
        assert_eq!(migrated["props"]["isComplete"], false);
        assert!(migrated["props"].get("content").is_none());
        assert_eq!(migrated["x"], 500.0);
        assert_eq!(migrated["y"], 100.0);
        assert_eq!(migrated["id"], "shape-1");
    }

    #[test]
    fn legacy_container_becomes_page() {
        let legacy = json!({
            "id": "c-1",
            "type": "container",
            "parentId": "root",
            "w": 900.0,
            "h": 700.0
        });
        let migrated = migrate(legacy);
        assert_eq!(migrated["type"], "page");
        assert_eq!(migrated["props"]["width"], 900.0);
        assert_eq!(migrated["props"]["height"], 700.0);
        assert_eq!(migrated["meta"], json!({}));
    }

    #[test]
    fn item_defaults_fill_in() {
        let migrated = migrate(json!({ "id": "b", "type": "builder" }));
        assert_eq!(migrated["props"]["w"], 200.0);
        assert_eq!(migrated["props"]["h"], 50.0);
        assert_eq!(migrated["props"]["text"], "New todo");
        assert_eq!(migrated["props"]["isComplete"], false);
    }

    #[test]
    fn completed_items_stay_completed() {
        let migrated = migrate(json!({
            "id": "i",
            "type": "item",
            "props": { "w": 200.0, "h": 50.0, "text": "done", "isComplete": true }
        }));
        assert_eq!(migrated["props"]["isComplete"], true);
    }

    #[test]
    fn migrate_is_idempotent() {
        let fixtures = [
            json!({ "id": "a", "type": "builder", "w": 10.0, "props": { "content": "x" } }),
            json!({ "id": "b", "type": "container", "h": 20.0 }),
            json!({
                "id": "c", "type": "section", "parentId": "p", "x": 0.0, "y": 0.0,
                "props": { "w": 1200.0, "h": 500.0 },
                "meta": { "source": "w1", "version": 3 }
            }),
            json!({ "id": "d", "type": "edge", "props": { "fromId": "p", "toId": "c" } }),
        ];
        for fixture in fixtures {
            let once = migrate(fixture);
            let twice = migrate(once.clone());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn unknown_types_pass_through_verbatim() {
        let alien = json!({ "id": "z", "type": "sticker", "glitter": true });
        assert_eq!(migrate(alien.clone()), alien);
    }

    #[test]
    fn current_records_are_untouched_where_it_matters() {
        let current = json!({
            "id": "s-1",
            "type": "section",
            "parentId": "page-1",
            "x": 0.0,
            "y": 200.0,
            "props": { "w": 1200.0, "h": 500.0, "text": "Hero", "bg": "#fff", "textStyle": "heading" },
            "meta": { "source": "w2", "version": 9 }
        });
        let migrated = migrate(current.clone());
        assert_eq!(migrated, current);
    }
}
