//! Metadata parsing through the public API, from store row to routes.

use indoc::indoc;
use odata_rest_core::{
    describe_service, load_active_services, parse, parse_detailed, parse_with, MetadataEncoding,
    ODataVersion, ParseOptions, ParserVariant, RawServiceRow, RouteOptions,
};
use pretty_assertions::assert_eq;
use serde_json::json;

const NORTHWIND_V4: &str = indoc! {r#"
    <?xml version="1.0" encoding="utf-8"?>
    <edmx:Edmx Version="4.0" xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx">
      <edmx:DataServices>
        <Schema Namespace="NorthwindModel" xmlns="http://docs.oasis-open.org/odata/ns/edm">
          <EntityType Name="Category">
            <Key><PropertyRef Name="CategoryID"/></Key>
            <Property Name="CategoryID" Type="Edm.Int32" Nullable="false"/>
            <Property Name="CategoryName" Type="Edm.String" Nullable="false" MaxLength="15"/>
            <Property Name="Description" Type="Edm.String" MaxLength="max"/>
          </EntityType>
          <EntityType Name="Product">
            <Key><PropertyRef Name="ProductID"/></Key>
            <Property Name="ProductID" Type="Edm.Int32" Nullable="false"/>
            <Property Name="ProductName" Type="Edm.String" Nullable="false" MaxLength="40"/>
            <Property Name="UnitPrice" Type="Edm.Decimal" Precision="19" Scale="4"/>
            <Property Name="Discontinued" Type="Edm.Boolean" Nullable="false"/>
            <NavigationProperty Name="Category" Type="NorthwindModel.Category"/>
          </EntityType>
          <EntityType Name="Shipper">
            <Key><PropertyRef Name="ShipperID"/></Key>
            <Property Name="ShipperID" Type="Edm.Int32" Nullable="false"/>
          </EntityType>
          <EntityContainer Name="NorthwindEntities">
            <EntitySet Name="Categories" EntityType="NorthwindModel.Category"/>
            <EntitySet Name="Products" EntityType="NorthwindModel.Product"/>
            <EntitySet Name="Shippers" EntityType="NorthwindModel.Shipper"/>
          </EntityContainer>
        </Schema>
      </edmx:DataServices>
    </edmx:Edmx>
"#};

#[test]
fn v4_document_yields_every_entity_set() {
    let schema = parse(NORTHWIND_V4, MetadataEncoding::Xml);
    assert_eq!(schema.version, ODataVersion::V4);

    let names: Vec<&str> = schema.entities.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Categories", "Products", "Shippers"]);
    assert!(schema.entities.iter().all(|e| !e.properties.is_empty()));

    let products = schema.entity("Products").unwrap();
    let props: Vec<(&str, &str)> = products
        .properties
        .iter()
        .map(|p| (p.name.as_str(), p.type_name.as_str()))
        .collect();
    assert_eq!(
        props,
        vec![
            ("ProductID", "Edm.Int32"),
            ("ProductName", "Edm.String"),
            ("UnitPrice", "Edm.Decimal"),
            ("Discontinued", "Edm.Boolean"),
        ],
    );
    assert_eq!(products.navigation[0].target.as_deref(), Some("Category"));
}

#[test]
fn malformed_inputs_never_fail() {
    let inputs = [
        "",
        "<",
        "<edmx:Edmx xmlns:edmx=\"x\"><edmx:DataServices>",
        "plain text",
        "<?xml version=\"1.0\"?>",
        "<html><body>502 Bad Gateway</body></html>",
    ];
    for raw in inputs {
        let schema = parse(raw, MetadataEncoding::Xml);
        assert!(schema.entities.is_empty(), "{raw:?}");
        assert_eq!(schema.version, ODataVersion::V2, "{raw:?}");
    }
}

#[test]
fn parsing_is_deterministic() {
    let first = parse_detailed(NORTHWIND_V4, MetadataEncoding::Xml, ParseOptions::default());
    let second = parse_detailed(NORTHWIND_V4, MetadataEncoding::Xml, ParseOptions::default());
    assert_eq!(first, second);
}

#[test]
fn minimal_variant_keeps_names() {
    let schema = parse_with(
        NORTHWIND_V4,
        MetadataEncoding::Xml,
        ParseOptions::variant(ParserVariant::Minimal),
    );
    assert_eq!(schema.entities.len(), 3);
    assert!(schema.entities.iter().all(|e| e.properties.is_empty()));
}

#[test]
fn rows_to_routes() {
    let rows: Vec<RawServiceRow> = vec![
        serde_json::from_value(json!({
            "service_name": "northwind",
            "service_base_url": "https://services.odata.org/V4",
            "metadata": NORTHWIND_V4,
            "active": 1,
        }))
        .unwrap(),
        serde_json::from_value(json!({
            "service_name": "retired",
            "metadata": NORTHWIND_V4,
            "active": 0,
        }))
        .unwrap(),
    ];

    let records = load_active_services(&rows);
    assert_eq!(records.len(), 1);

    let record = &records[0];
    let schema = parse(&record.raw_metadata, record.metadata_encoding);
    let routes = describe_service(record, &schema, &RouteOptions::default());

    let paths: Vec<&str> = routes.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "/northwind/Categories",
            "/northwind/Products",
            "/northwind/Shippers",
        ],
    );
}
