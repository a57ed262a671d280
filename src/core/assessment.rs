//! Assembles the full `AssessmentFull` document for one unit.
//!
//! Field order matters to the consumer of the document and follows the assessment schema:
//! general information, fabric, thermal bridges, ventilation and lighting, heating and hot
//! water, then the plot details.

use crate::core::document::{Document, Node, Record};
use crate::core::fabric;
use crate::core::references::References;
use crate::core::services;
use crate::errors::CompileError;
use crate::input::Unit;
use crate::lookups::Lookups;

/// Transaction type of a new-build assessment.
const NEW_DWELLING_TRANSACTION: i64 = 6;

pub fn build_document(unit: &Unit, lookups: &Lookups) -> Result<Document, CompileError> {
    let references = References::new(unit, &lookups.levels);

    let assessment = assessment(unit, lookups, &references)?;
    let root = Record::new()
        .with("Assessment", assessment)
        .with("Plot", plot(unit));

    Ok(Document::new(root))
}

fn assessment(
    unit: &Unit,
    lookups: &Lookups,
    references: &References,
) -> Result<Record, CompileError> {
    let general = &unit.general;
    let opaque = fabric::opaque_elements(unit, references)?;
    let opening_types = fabric::opening_types(unit, references)?;
    let openings = fabric::openings(unit, references)?;
    let thermal_bridges = fabric::thermal_bridges(unit, &lookups.thermal_bridges);
    let (photovoltaic_unit_type, photovoltaic_units) =
        services::photovoltaics(&unit.photovoltaics);

    let mut assessment = Record::new()
        .with("Reference", unit.name.as_str())
        .with("DwellingOrientation", &general.dwelling_orientation)
        .with("CalculationType", &general.calculation_type)
        .with("Tenure", "ND")
        .with("TransactionType", NEW_DWELLING_TRANSACTION)
        .with("TerrainType", &general.terrain_type)
        .with("SimpleComplianceScotland", false)
        .with("PropertyType1", &general.property_type_1)
        .with("PropertyType2", &general.property_type_2)
        .with("PositionOfFlat", &general.position_of_flat)
        .with("FlatWhichFloor", general.which_floor)
        .with("StoreysInBlock", general.storeys_in_block)
        .with("Storeys", fabric::storeys(&unit.levels))
        .with("DateBuilt", general.date_built)
        .with("PropertyAgeBand", Node::Nil)
        .with("ShelteredSides", general.sheltered_sides)
        .with("SunlightShade", &general.sunlight_shade)
        .with("Basement", false)
        .with("LivingArea", &general.living_area)
        .with("ThermalMass", "EnterTmpValue")
        .with("ThermalMassValue", &general.thermal_mass_parameter)
        .with("LowestFloorHasUnheatedSpace", Node::Nil)
        .with("UnheatedFloorArea", Node::Nil)
        .with("Measurements", fabric::measurements(unit))
        .with("ExternalWalls", group("ExternalWall", opaque.external_walls))
        .with("PartyWalls", group("PartyWall", opaque.party_walls))
        .with("InternalPartitions", Node::empty_list())
        .with("ExternalRoofs", group("ExternalRoof", opaque.external_roofs))
        .with("PartyRoofs", group("Roof", opaque.party_roofs))
        .with("InternalCeilings", Node::empty_list())
        .with("HeatlossFloors", group("HeatLossFloor", opaque.heat_loss_floors))
        .with("PartyFloors", group("Floor", opaque.party_floors))
        .with("InternalFloors", Node::empty_list())
        .with("ThermalBridgesCalculation", "CalculateBridges")
        .with("ThermalBridgingSpreadsheet", "Summary")
        .with("ThermalBridgesYvalue", 0)
        .with("ThermalBridgesDescription", Node::empty_list())
        .with("PointThermalBridgingX", Node::Nil)
        .with("OpenChimneys", 0)
        .with("OpenFlues", 0)
        .with("ChimneysFluesClosedFire", 0)
        .with("FluesSolidFuelBoiler", 0)
        .with("FluesOtherHeater", 0)
        .with("BlockedChimneys", 0)
        .with("IntermittentFans", 0)
        .with("PassiveVents", 0)
        .with("FluelessGasFires", 0)
        .with("NoFixedLighting", false)
        .with("LightingCapacityCalculation", Node::Nil)
        .with("Lightings", services::lightings(&unit.lighting))
        .with("ElectricityTariff", "Standard")
        .with("SmartElectricityMeterFitted", false)
        .with("SmartGasMeterFitted", false)
        .with("SolarPanelPresent", false)
        .with("PressureTest", true)
        .with("PressureTestMethod", "BlowerDoor")
        .with("Designed_AP50_AP4", &unit.ventilation.air_permeability)
        .with("AsBuilt_AP50_AP4", 0)
        .with("PropertyTested", true)
        .with("SmokeControlArea", "Unknown")
        .with("ThermallySeparated", "NoConservatory")
        .with("DraughtProofing", 100)
        .with("DraughtLobby", false)
        .with("Floor1AreaCalculated", false)
        .with("PhotovoltaicUnitApportionedEnergy", Node::Nil)
        .with("ConnectedToDwelling", "Yes")
        .with("Diverter", "No")
        .with("BatteryCapacity", 0)
        .with("PhotovoltaicUnitType", photovoltaic_unit_type)
        .with("PhotovoltaicUnits", photovoltaic_units)
        .with("OpeningTypes", group("OpeningType", opening_types))
        .with("Openings", group("Opening", openings))
        .with("ThermalBridges", group("ThermalBridge", thermal_bridges));

    if let Some(ventilation) = services::mechanical_ventilation(&unit.ventilation) {
        assessment.insert("MechanicalVentilation", ventilation);
    }

    assessment.insert("MechanicalVentilationDecentralised", Node::empty_list());
    assessment.insert("HeatingsInteraction", "SeparatePartsOfHouse");
    for system in 1..=services::MAIN_HEATING_SYSTEMS {
        assessment.insert(
            format!("MainHeatingSystem{system}"),
            services::main_heating_system(),
        );
    }

    Ok(assessment
        .with("SecondaryHeating", services::secondary_heating())
        .with("CommunityHeating", services::community_heating(&unit.heat_network))
        .with("WaterHeatingSystem", services::water_heating_system(&unit.water_heating))
        .with("Showers", services::showers(&unit.water_heating))
        .with("WindTurbineType", "None")
        .with("WindTurbines", Node::empty_list())
        .with("ApportionedEnergy", Node::Nil)
        .with("SpecialTechnology", Node::empty_list())
        .with("RelatedPartyDisclosure", 1)
        .with("Recomm_N", true)
        .with("Recomm_U", true)
        .with("Recomm_V2", true)
        .with("IATSReference", Node::empty_list())
        .with("IATSDataExists", false)
        .with("IATSTestDate", Node::Nil)
        .with("ExportCapableMeter", false)
        .with("ShowSpaceHeatDemand", Node::Nil))
}

/// A container holding its items as same-tag siblings.
fn group(tag: &str, items: Vec<Node>) -> Record {
    Record::new().with(tag, Node::Repeated(items))
}

fn plot(unit: &Unit) -> Record {
    Record::new()
        .with("Reference", unit.name.as_str())
        .with("TypeReference", unit.name.as_str())
        .with("RegsRegion", "England")
        .with("Region", "Thames")
        .with("HouseName", Node::empty_list())
        .with("HouseNumber", Node::empty_list())
        .with("Postcode", Node::empty_list())
        .with("Street", Node::empty_list())
        .with("Town", Node::empty_list())
        .with("County", Node::empty_list())
        .with("ClientId", Node::Nil)
        .with("UPRN", Node::empty_list())
        .with("AddressLine1", Node::empty_list())
        .with("AddressLine2", Node::empty_list())
        .with("AddressLine3", Node::empty_list())
        .with("TownAsDesigned", Node::empty_list())
        .with("PostcodeAsDesigned", Node::empty_list())
        .with("AssessorId", "47929")
        .with("Id", "231765")
        .with("GroupId", "32079")
        .with("SubGroupId", Node::Nil)
        .with("AssessorCode", Node::empty_list())
        .with("AssessorTitle", Node::empty_list())
        .with("AssessorName", Node::empty_list())
        .with("AssessorSurname", Node::empty_list())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::Scalar;
    use crate::tests::fixtures::unit;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn should_place_plot_after_assessment(unit: Unit) {
        let document = build_document(&unit, &Lookups::default()).unwrap();

        assert_eq!(
            document.root.keys().collect::<Vec<_>>(),
            vec!["Assessment", "Plot"]
        );
        assert_eq!(
            document.at(&["Plot", "TypeReference"]),
            Some(&Node::from("Flat 1"))
        );
    }

    #[rstest]
    fn should_keep_schema_field_order(unit: Unit) {
        let document = build_document(&unit, &Lookups::default()).unwrap();
        let assessment = document.at(&["Assessment"]).and_then(Node::as_record).unwrap();
        let keys = assessment.keys().collect::<Vec<_>>();
        let position = |key: &str| keys.iter().position(|k| *k == key).unwrap();

        assert_eq!(keys[0], "Reference");
        assert_eq!(keys.last(), Some(&"ShowSpaceHeatDemand"));
        assert!(position("Measurements") < position("ExternalWalls"));
        assert!(position("ThermalBridges") < position("MechanicalVentilationDecentralised"));
        assert!(position("MainHeatingSystem1") < position("MainHeatingSystem2"));
        assert!(position("MainHeatingSystem2") < position("SecondaryHeating"));
    }

    #[rstest]
    fn should_write_constant_scaffolding(unit: Unit) {
        let document = build_document(&unit, &Lookups::default()).unwrap();

        assert_eq!(
            document.at(&["Assessment", "TransactionType"]),
            Some(&Node::Scalar(Scalar::Int(6)))
        );
        assert_eq!(document.at(&["Assessment", "PropertyAgeBand"]), Some(&Node::Nil));
        assert_eq!(
            document.at(&["Assessment", "Basement"]),
            Some(&Node::from(false))
        );
    }

    #[rstest]
    fn should_leave_out_ventilation_when_not_fitted(mut unit: Unit) {
        unit.ventilation.present = false;

        let document = build_document(&unit, &Lookups::default()).unwrap();

        assert_eq!(document.at(&["Assessment", "MechanicalVentilation"]), None);
        assert!(document
            .at(&["Assessment", "MechanicalVentilationDecentralised"])
            .is_some());
    }
}
