use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Read-only tables the compiler needs from outside the sheet. They are passed to every
/// compilation explicitly.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Lookups {
    #[serde(default)]
    pub thermal_bridges: ThermalBridgeNames,
    #[serde(default)]
    pub levels: LevelNaming,
}

impl Lookups {
    pub fn from_json(json: impl Read) -> anyhow::Result<Self> {
        Ok(serde_json::from_reader(json)?)
    }
}

/// Maps the thermal-bridge column keys of a sheet to the junction names the schema
/// expects. Iteration order is the order bridges are written out.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ThermalBridgeNames(IndexMap<String, String>);

impl ThermalBridgeNames {
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn name(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ThermalBridgeNames {
    /// Junction types of SAP 10 Table K1.
    fn default() -> Self {
        Self(
            [
                ("E1", "Steel lintel with perforated steel base plate"),
                ("E2", "Other lintels (including other steel lintels)"),
                ("E3", "Sill"),
                ("E4", "Jamb"),
                ("E5", "Ground floor (normal)"),
                ("E6", "Intermediate floor within a dwelling"),
                ("E7", "Party floor between dwellings (in blocks of flats)"),
                ("E8", "Balcony within a dwelling, wall insulation continuous"),
                ("E9", "Balcony between dwellings, wall insulation continuous"),
                ("E10", "Eaves (insulation at ceiling level)"),
                ("E11", "Eaves (insulation at rafter level)"),
                ("E12", "Gable (insulation at ceiling level)"),
                ("E13", "Gable (insulation at rafter level)"),
                ("E14", "Flat roof"),
                ("E15", "Flat roof with parapet"),
                ("E16", "Corner (normal)"),
                ("E17", "Corner (inverted - internal area greater than external area)"),
                ("E18", "Party wall between dwellings"),
                ("E19", "Ground floor (inverted)"),
                ("E20", "Exposed floor (normal)"),
                ("E21", "Exposed floor (inverted)"),
                ("E22", "Basement floor"),
                ("E23", "Balcony within or between dwellings, balcony support penetrates wall insulation"),
                ("E24", "Eaves (insulation at ceiling level - inverted)"),
                ("E25", "Staggered party wall between dwellings"),
                ("P1", "Ground floor"),
                ("P2", "Intermediate floor within a dwelling"),
                ("P3", "Intermediate floor between dwellings (in blocks of flats)"),
                ("P4", "Roof (insulation at ceiling level)"),
                ("P5", "Roof (insulation at rafter level)"),
                ("P6", "Ground floor (inverted)"),
                ("P7", "Exposed floor (normal)"),
                ("P8", "Exposed floor (inverted)"),
                ("R1", "Head of roof window"),
                ("R2", "Sill of roof window"),
                ("R3", "Jamb of roof window"),
                ("R4", "Ridge (vaulted ceiling)"),
                ("R5", "Ridge (inverted)"),
                ("R6", "Flat ceiling"),
                ("R7", "Flat ceiling (inverted)"),
                ("R8", "Roof to wall (rafter)"),
                ("R9", "Roof to wall (flat ceiling)"),
            ]
            .into_iter()
            .map(|(key, name)| (key.to_string(), name.to_string()))
            .collect(),
        )
    }
}

/// Maps zero-based level numbers (as decimal strings) to the storey tokens of the schema.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LevelNaming(IndexMap<String, String>);

impl LevelNaming {
    /// Storey token for a one-based sheet level number. Fractional levels truncate.
    pub fn storey_index(&self, level: f64) -> Option<&str> {
        if !level.is_finite() {
            return None;
        }
        let key = (level - 1.).trunc() as i64;
        self.0.get(&key.to_string()).map(String::as_str)
    }
}

impl Default for LevelNaming {
    fn default() -> Self {
        Self(
            [
                "Ground", "First", "Second", "Third", "Fourth", "Fifth", "Sixth", "Seventh",
            ]
            .into_iter()
            .enumerate()
            .map(|(index, name)| (index.to_string(), name.to_string()))
            .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case(1., Some("Ground"))]
    #[case(3., Some("Second"))]
    #[case(2.7, Some("First"))]
    #[case(8., Some("Seventh"))]
    #[case(9., None)]
    #[case(0., None)]
    #[case(f64::NAN, None)]
    fn should_resolve_storey_index(#[case] level: f64, #[case] expected: Option<&str>) {
        assert_eq!(LevelNaming::default().storey_index(level), expected);
    }

    #[test]
    fn should_keep_bridge_order() {
        let names = ThermalBridgeNames::default();
        assert_eq!(names.keys().next(), Some("E1"));
        assert_eq!(names.keys().last(), Some("R9"));
        assert_eq!(names.len(), 42);
        assert_eq!(names.name("E3"), Some("Sill"));
    }

    #[test]
    fn should_load_lookups_from_json() {
        let json = r#"{
            "thermal_bridges": {"E2": "Lintel", "E3": "Sill"},
            "levels": {"0": "Lowest"}
        }"#;

        let lookups = Lookups::from_json(json.as_bytes()).unwrap();

        assert_eq!(lookups.thermal_bridges.keys().collect::<Vec<_>>(), vec!["E2", "E3"]);
        assert_eq!(lookups.levels.storey_index(1.), Some("Lowest"));
    }

    #[test]
    fn should_fall_back_to_default_tables_when_omitted() {
        let lookups = Lookups::from_json(r#"{"levels": {"0": "Lowest"}}"#.as_bytes()).unwrap();
        assert_eq!(lookups.thermal_bridges, ThermalBridgeNames::default());
    }
}
