//! EDMX (XML) metadata interpretation for OData v2 and v4 documents.

use std::collections::{HashMap, HashSet};

use roxmltree::{Document, Node};

use super::{Degradation, ParsedSchema, ParserVariant};
use crate::model::{
    EntityDef, NavigationDef, ODataVersion, PropertyDef, ServiceSchema, DEFAULT_EDM_TYPE,
};

type TypeIndex<'a, 'input> = HashMap<&'a str, Node<'a, 'input>>;

pub(super) fn parse(raw: &str, variant: ParserVariant) -> ParsedSchema {
    let doc = match Document::parse(raw) {
        Ok(doc) => doc,
        Err(err) => return ParsedSchema::degraded(Degradation::MalformedXml(err.to_string())),
    };

    // Matches both `<edmx:Edmx>` and a bare `<Edmx>`: tag comparison is on local names.
    let root = doc.root_element();
    if !is_named(root, "Edmx") {
        return ParsedSchema::degraded(Degradation::MissingEdmxRoot);
    }
    let Some(data_services) = children_named(root, "DataServices").next() else {
        return ParsedSchema::degraded(Degradation::MissingDataServices);
    };

    let version = root
        .attribute("Version")
        .map_or(ODataVersion::V2, ODataVersion::from_version_str);

    let schemas: Vec<Node<'_, '_>> = children_named(data_services, "Schema").collect();
    let entities = match variant {
        ParserVariant::Rich => rich_entities(&schemas),
        ParserVariant::Minimal => minimal_entities(&schemas),
    };

    ParsedSchema::complete(ServiceSchema { version, entities })
}

/// Entity sets resolved against their entity types.
fn rich_entities(schemas: &[Node<'_, '_>]) -> Vec<EntityDef> {
    let local_indexes: Vec<TypeIndex<'_, '_>> = schemas.iter().map(|s| index_types(*s)).collect();

    // Cross-schema fallback: v4 services often split types and containers.
    let mut global: TypeIndex<'_, '_> = HashMap::new();
    for index in &local_indexes {
        for (name, node) in index {
            global.entry(*name).or_insert(*node);
        }
    }

    let mut seen = HashSet::new();
    let mut entities = Vec::new();

    for (schema, local) in schemas.iter().zip(&local_indexes) {
        for set in entity_sets(*schema) {
            let Some(name) = non_empty_attribute(set, "Name") else {
                tracing::debug!("dropping entity set without a name");
                continue;
            };
            if !seen.insert(name) {
                tracing::debug!(entity = name, "dropping duplicate entity set");
                continue;
            }

            let type_name = set.attribute("EntityType").map(strip_namespace);
            let entity_type = type_name.and_then(|t| local.get(t).or_else(|| global.get(t)));

            let entity = match entity_type {
                Some(entity_type) => EntityDef {
                    name: name.to_string(),
                    keys: keys(*entity_type),
                    properties: children_named(*entity_type, "Property")
                        .filter_map(property)
                        .collect(),
                    navigation: children_named(*entity_type, "NavigationProperty")
                        .filter_map(navigation)
                        .collect(),
                },
                None => {
                    tracing::debug!(
                        entity = name,
                        entity_type = type_name.unwrap_or_default(),
                        "entity type not found; emitting entity without properties",
                    );
                    EntityDef {
                        name: name.to_string(),
                        ..EntityDef::default()
                    }
                }
            };
            entities.push(entity);
        }
    }

    entities
}

/// Entity set names only.
fn minimal_entities(schemas: &[Node<'_, '_>]) -> Vec<EntityDef> {
    let mut seen = HashSet::new();
    schemas
        .iter()
        .flat_map(|schema| entity_sets(*schema))
        .filter_map(|set| non_empty_attribute(set, "Name"))
        .filter(|name| seen.insert(*name))
        .map(|name| EntityDef {
            name: name.to_string(),
            ..EntityDef::default()
        })
        .collect()
}

fn index_types<'a, 'input>(schema: Node<'a, 'input>) -> TypeIndex<'a, 'input> {
    let mut index = HashMap::new();
    for entity_type in children_named(schema, "EntityType") {
        if let Some(name) = non_empty_attribute(entity_type, "Name") {
            index.entry(name).or_insert(entity_type);
        }
    }
    index
}

fn entity_sets<'a, 'input>(schema: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    children_named(schema, "EntityContainer")
        .flat_map(|container| children_named(container, "EntitySet"))
}

fn keys(entity_type: Node<'_, '_>) -> Vec<String> {
    children_named(entity_type, "Key")
        .flat_map(|key| children_named(key, "PropertyRef"))
        .filter_map(|r| non_empty_attribute(r, "Name"))
        .map(str::to_string)
        .collect()
}

fn property(node: Node<'_, '_>) -> Option<PropertyDef> {
    let name = non_empty_attribute(node, "Name")?;
    Some(PropertyDef {
        name: name.to_string(),
        type_name: non_empty_attribute(node, "Type")
            .unwrap_or(DEFAULT_EDM_TYPE)
            .to_string(),
        filterable: vendor_attribute(node, "filterable") != Some("false"),
        nullable: node.attribute("Nullable") != Some("false"),
        label: vendor_attribute(node, "label").map(str::to_string),
        max_length: node.attribute("MaxLength").and_then(|v| v.trim().parse().ok()),
    })
}

fn navigation(node: Node<'_, '_>) -> Option<NavigationDef> {
    let name = non_empty_attribute(node, "Name")?;
    // v4 declares the target type; v2 only names the target association role.
    let target = non_empty_attribute(node, "Type")
        .map(|t| {
            let inner = t
                .strip_prefix("Collection(")
                .and_then(|s| s.strip_suffix(')'))
                .unwrap_or(t);
            strip_namespace(inner).to_string()
        })
        .or_else(|| non_empty_attribute(node, "ToRole").map(str::to_string));
    Some(NavigationDef {
        name: name.to_string(),
        target,
    })
}

/// `Namespace.TypeName` → `TypeName`.
fn strip_namespace(qualified: &str) -> &str {
    qualified
        .rsplit_once('.')
        .map_or(qualified, |(_, local)| local)
}

fn is_named(node: Node<'_, '_>, local: &str) -> bool {
    node.is_element() && node.tag_name().name().eq_ignore_ascii_case(local)
}

fn children_named<'a, 'input>(
    node: Node<'a, 'input>,
    local: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |child| is_named(*child, local))
}

fn non_empty_attribute<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute(name).filter(|v| !v.is_empty())
}

/// A namespaced vendor extension attribute (e.g. `sap:filterable`), by local name.
fn vendor_attribute<'a>(node: Node<'a, '_>, local: &str) -> Option<&'a str> {
    node.attributes()
        .find(|attr| attr.namespace().is_some() && attr.name() == local)
        .map(|attr| attr.value())
}
