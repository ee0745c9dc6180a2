//! Entity registry and field introspector for the admin surface.
//!
//! Instead of runtime reflection, every admin-exposed entity carries an
//! explicit field-descriptor table (`FieldSpec`). Registration derives the
//! presentation metadata (labels, search fields, display fields) from that
//! table once, at startup, and builds type-erased CRUD closures over the
//! generic resource engine so the admin handlers can operate on any
//! registered entity by name.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::resource::{self, Resource};

/// Scalar kind of a field, used by admin tooling to pick widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Bool,
    Int,
    Float,
    Timestamp,
}

/// Compile-time descriptor for one JSON-visible field of an entity.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// camelCase name as it appears in the serialized entity.
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

/// Derived per-field metadata served to the admin UI.
#[derive(Debug, Clone, Serialize)]
pub struct FieldMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub label: String,
    pub required: bool,
    pub editable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    List,
    View,
    Edit,
    Create,
    Delete,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetadata {
    pub name: String,
    pub plural_name: String,
    pub capabilities: Vec<Capability>,
    pub fields: Vec<FieldMeta>,
    pub search_fields: Vec<String>,
    pub display_fields: Vec<String>,
}

/// Fields the admin surface never edits, regardless of entity.
const SYSTEM_FIELDS: &[&str] = &["id", "createdAt", "updatedAt", "deletedAt", "passwordHash"];

/// Display-field priority: identity-ish fields first.
const DISPLAY_PRIORITY: &[&str] = &["name", "title", "email", "slug", "status"];

const MAX_DISPLAY_FIELDS: usize = 5;

fn is_system_field(name: &str) -> bool {
    SYSTEM_FIELDS.contains(&name)
}

/// "firstName" -> "First Name": capitalize the first letter and insert a
/// space at each case boundary.
fn to_label(name: &str) -> String {
    let mut label = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i == 0 {
            label.extend(c.to_uppercase());
        } else {
            if c.is_ascii_uppercase() {
                label.push(' ');
            }
            label.push(c);
        }
    }
    label
}

fn pluralize(name: &str) -> String {
    if let Some(stem) = name.strip_suffix('y') {
        format!("{}ies", stem)
    } else if name.ends_with('s') {
        format!("{}es", name)
    } else {
        format!("{}s", name)
    }
}

fn derive_metadata(name: &str, specs: &[FieldSpec], capabilities: &[Capability]) -> ResourceMetadata {
    let fields: Vec<FieldMeta> = specs
        .iter()
        .map(|s| FieldMeta {
            name: s.name.to_string(),
            kind: s.kind,
            label: to_label(s.name),
            required: s.required,
            editable: !is_system_field(s.name),
        })
        .collect();

    let search_fields: Vec<String> = fields
        .iter()
        .filter(|f| f.kind == FieldKind::String && f.editable)
        .map(|f| f.name.clone())
        .collect();

    let mut display_fields: Vec<String> = Vec::new();
    for p in DISPLAY_PRIORITY {
        if let Some(f) = fields.iter().find(|f| f.name.eq_ignore_ascii_case(p)) {
            display_fields.push(f.name.clone());
        }
    }
    for f in &fields {
        if display_fields.len() >= MAX_DISPLAY_FIELDS {
            break;
        }
        if f.editable && !display_fields.contains(&f.name) {
            display_fields.push(f.name.clone());
        }
    }

    ResourceMetadata {
        name: name.to_string(),
        plural_name: pluralize(name),
        capabilities: capabilities.to_vec(),
        fields,
        search_fields,
        display_fields,
    }
}

/// An entity that can be browsed and edited through the admin registry.
pub trait AdminResource: Resource + DeserializeOwned + Clone {
    /// Descriptor table for the entity's JSON-visible fields.
    const FIELDS: &'static [FieldSpec];

    /// Copy fields the serializer hides (secrets) from the previously
    /// stored row after a round-trip edit, so they survive updates.
    fn restore_hidden(&mut self, _prev: &Self) {}
}

type ListFn = Box<dyn Fn(&Connection) -> Result<Value> + Send + Sync>;
type GetFn = Box<dyn Fn(&Connection, &str) -> Result<Value> + Send + Sync>;
type UpdateFn = Box<dyn Fn(&Connection, &str, &Map<String, Value>) -> Result<Value> + Send + Sync>;
type DeleteFn = Box<dyn Fn(&Connection, &str) -> Result<()> + Send + Sync>;
type CountFn = Box<dyn Fn(&Connection) -> Result<i64> + Send + Sync>;

pub struct AdminEntry {
    pub meta: ResourceMetadata,
    list: ListFn,
    get: GetFn,
    update: UpdateFn,
    delete: DeleteFn,
    count: CountFn,
}

impl AdminEntry {
    pub fn can(&self, capability: Capability) -> bool {
        self.meta.capabilities.contains(&capability)
    }

    pub fn list(&self, conn: &Connection) -> Result<Value> {
        (self.list)(conn)
    }

    pub fn get(&self, conn: &Connection, id: &str) -> Result<Value> {
        (self.get)(conn, id)
    }

    pub fn update(&self, conn: &Connection, id: &str, patch: &Map<String, Value>) -> Result<Value> {
        (self.update)(conn, id, patch)
    }

    pub fn delete(&self, conn: &Connection, id: &str) -> Result<()> {
        (self.delete)(conn, id)
    }

    pub fn count(&self, conn: &Connection) -> Result<i64> {
        (self.count)(conn)
    }
}

/// Registry of admin-exposed entities, built once at startup.
#[derive(Default)]
pub struct AdminRegistry {
    entries: BTreeMap<String, AdminEntry>,
}

impl AdminRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity under `name`. Duplicate names are an error:
    /// registration happens exactly once, in startup order.
    pub fn register<T: AdminResource + 'static>(
        &mut self,
        name: &'static str,
        capabilities: &[Capability],
    ) -> Result<()> {
        if self.entries.contains_key(name) {
            return Err(AppError::Internal(format!(
                "Admin resource '{}' registered twice",
                name
            )));
        }

        let meta = derive_metadata(name, T::FIELDS, capabilities);
        let editable: Vec<String> = meta
            .fields
            .iter()
            .filter(|f| f.editable)
            .map(|f| f.name.clone())
            .collect();

        let entry = AdminEntry {
            meta,
            list: Box::new(|conn| {
                let items = resource::list_all::<T>(conn)?;
                Ok(serde_json::to_value(items)?)
            }),
            get: Box::new(|conn, id| {
                let item = resource::fetch::<T>(conn, id)?;
                Ok(serde_json::to_value(item)?)
            }),
            update: Box::new(move |conn, id, patch| {
                let prev = resource::fetch::<T>(conn, id)?;
                let mut value = serde_json::to_value(&prev)?;
                let obj = value
                    .as_object_mut()
                    .ok_or_else(|| AppError::Internal("Entity did not serialize to an object".into()))?;
                for (key, val) in patch {
                    if editable.iter().any(|f| f == key) {
                        obj.insert(key.clone(), val.clone());
                    }
                }
                let mut updated: T = serde_json::from_value(value)
                    .map_err(|e| AppError::Validation(format!("Invalid field value: {}", e)))?;
                updated.restore_hidden(&prev);
                resource::save(conn, &mut updated)?;
                Ok(serde_json::to_value(updated)?)
            }),
            delete: Box::new(|conn, id| resource::delete::<T>(conn, id)),
            count: Box::new(|conn| {
                let sql = format!(
                    "SELECT COUNT(*) FROM {} WHERE deleted_at IS NULL",
                    T::TABLE
                );
                let count = conn.query_row(&sql, [], |row| row.get(0))?;
                Ok(count)
            }),
        };

        self.entries.insert(name.to_string(), entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&AdminEntry> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AdminEntry)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_label_inserts_spaces_at_case_boundaries() {
        assert_eq!(to_label("firstName"), "First Name");
        assert_eq!(to_label("maxOrganizations"), "Max Organizations");
        assert_eq!(to_label("email"), "Email");
        assert_eq!(to_label("isPublic"), "Is Public");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("organization"), "organizations");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("status"), "statuses");
    }

    #[test]
    fn test_metadata_derivation_is_pure() {
        const SPECS: &[FieldSpec] = &[
            FieldSpec { name: "id", kind: FieldKind::String, required: true },
            FieldSpec { name: "name", kind: FieldKind::String, required: true },
            FieldSpec { name: "slug", kind: FieldKind::String, required: true },
            FieldSpec { name: "description", kind: FieldKind::String, required: false },
            FieldSpec { name: "createdAt", kind: FieldKind::Timestamp, required: true },
        ];

        let a = derive_metadata("organization", SPECS, &[Capability::List]);
        let b = derive_metadata("organization", SPECS, &[Capability::List]);
        assert_eq!(serde_json::to_value(&a).unwrap(), serde_json::to_value(&b).unwrap());

        // Priority fields come first, system fields are excluded from the
        // fill-up portion.
        assert_eq!(a.display_fields, vec!["name", "slug", "description"]);
        assert!(a.fields.iter().find(|f| f.name == "id").is_some_and(|f| !f.editable));
        assert_eq!(a.search_fields, vec!["name", "slug", "description"]);
    }
}
