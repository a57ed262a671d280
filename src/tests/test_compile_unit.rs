use crate::errors::{CompileError, UnresolvedReference};
use crate::lookups::Lookups;
use crate::markup::{normalize, NIL_SENTINEL};
use crate::read_unit_sheet::sheet_from_csv;
use crate::sheet::{Cell, Sheet};
use crate::tests::fixtures::{entered, set_column, unit_sheet};
use crate::{compile_sheet, compile_sheets};
use pretty_assertions::assert_eq;
use rstest::*;

fn compile(sheet: &Sheet) -> Result<String, CompileError> {
    compile_sheet(sheet, &Lookups::default()).map(|unit| unit.markup)
}

fn add_window(sheet: &mut Sheet, parent: &str, area: f64) {
    set_column(sheet, "Opening type name", entered("Win A"));
    set_column(sheet, "Type", entered("Window"));
    set_column(sheet, "U-value", entered(1.2));
    set_column(sheet, "Solar transmittance", entered(0.63));
    set_column(sheet, "Frame factor", entered(0.7));
    set_column(sheet, "Opening name", entered("G1"));
    set_column(sheet, "Opening level ref.", entered(1.));
    set_column(sheet, "Opening type", entered("Win A"));
    set_column(sheet, "Belongs to opaque element", entered(parent));
    set_column(sheet, "Orientation", entered("North"));
    set_column(sheet, "Width", entered(1.));
    set_column(sheet, "Height", entered(area));
    set_column(sheet, "Area", entered(area));
    set_column(sheet, "Floor to ceiling?", entered("No"));
}

#[rstest]
fn should_compile_single_wall_unit(unit_sheet: Sheet) {
    let compiled = compile_sheet(&unit_sheet, &Lookups::default()).unwrap();

    assert_eq!(compiled.sheet_name, "Unit 1");
    assert_eq!(compiled.reference, "Flat 1");
    assert!(compiled.markup.starts_with(
        "<AssessmentFull xmlns:xsd=\"http://www.w3.org/2001/XMLSchema\" xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\n  <Assessment>\n    <Reference>Flat 1</Reference>\n"
    ));
    assert!(compiled.markup.contains(
        "    <ExternalWalls>
      <ExternalWall>
        <Description>W1</Description>
        <Construction>Other</Construction>
        <Kappa>0</Kappa>
        <GrossArea>10.0</GrossArea>
        <Uvalue>0.3</Uvalue>
        <ShelterFactor>0</ShelterFactor>
        <ShelterCode>None</ShelterCode>
        <Type>Cavity</Type>
        <AreaCalculationType>Gross</AreaCalculationType>
        <OpeningsArea xsi:nil=\"true\"/>
        <NettArea>0</NettArea>
      </ExternalWall>
    </ExternalWalls>
    <PartyWalls/>
"
    ));
    assert_eq!(compiled.markup.matches("<ExternalWall>").count(), 1);
    assert!(!compiled.markup.contains("<Opening>"));
    assert!(compiled.markup.contains("    <Openings/>\n"));
    assert!(compiled.markup.ends_with("</Plot>\n</AssessmentFull>\n"));
}

#[rstest]
fn should_always_write_nine_measurements(unit_sheet: Sheet) {
    let markup = compile(&unit_sheet).unwrap();

    assert_eq!(markup.matches("<Measurement>").count(), 9);
    assert!(markup.contains(
        "      <Measurement>
        <Storey>0</Storey>
        <InternalPerimeter>0</InternalPerimeter>
        <InternalFloorArea>0</InternalFloorArea>
        <StoreyHeight>0</StoreyHeight>
      </Measurement>
      <Measurement>
        <Storey>1</Storey>
        <InternalPerimeter>18.2</InternalPerimeter>
        <InternalFloorArea>62.5</InternalFloorArea>
        <StoreyHeight>2.7</StoreyHeight>
      </Measurement>
"
    ));
    assert!(markup.contains("<Storeys>1</Storeys>"));
}

#[rstest]
fn should_pair_level_values_by_entry_order(mut unit_sheet: Sheet) {
    set_column(&mut unit_sheet, "Floor to slab", entered(2.5));
    set_column(&mut unit_sheet, "Heated internal floor area", entered(50.));
    set_column(
        &mut unit_sheet,
        "Heat loss perimeter",
        vec![Cell::Empty, Cell::Empty, 30.0.into()],
    );

    let markup = compile(&unit_sheet).unwrap();

    assert!(markup.contains(
        "      <Measurement>
        <Storey>1</Storey>
        <InternalPerimeter>30.0</InternalPerimeter>
        <InternalFloorArea>50.0</InternalFloorArea>
        <StoreyHeight>2.5</StoreyHeight>
      </Measurement>
      <Measurement>
        <Storey>2</Storey>
        <InternalPerimeter>0</InternalPerimeter>
"
    ));
    assert!(markup.contains("<Storeys>1</Storeys>"));
}

#[rstest]
fn should_never_leave_sentinel_text_in_output(unit_sheet: Sheet) {
    let markup = compile(&unit_sheet).unwrap();

    assert!(!markup.contains(NIL_SENTINEL));
    assert!(markup.contains("<PropertyAgeBand xsi:nil=\"true\"/>"));
    assert!(markup.contains("<ClientId xsi:nil=\"true\"/>"));
}

#[rstest]
fn should_produce_already_normalized_output(unit_sheet: Sheet) {
    let markup = compile(&unit_sheet).unwrap();

    assert_eq!(normalize(&markup).unwrap(), markup);
}

#[rstest]
fn should_write_five_community_heat_sources(unit_sheet: Sheet) {
    let markup = compile(&unit_sheet).unwrap();

    assert_eq!(markup.matches("<CommunityHeatSource>").count(), 5);
    assert!(markup.contains("<MainHeatingSystem1>"));
    assert!(markup.contains("<MainHeatingSystem2>"));
    assert!(markup.contains("<RatedPower>10.5</RatedPower>"));
}

#[rstest]
fn should_write_window_with_resolved_indices(mut unit_sheet: Sheet) {
    add_window(&mut unit_sheet, "W1", 1.5);

    let markup = compile(&unit_sheet).unwrap();

    assert!(markup.contains(
        "    <Openings>
      <Opening>
        <OpeningTypeIndex>0</OpeningTypeIndex>
        <Description>G1</Description>
        <LocationBuildingPartIndex>0</LocationBuildingPartIndex>
        <LocationWallIndex>0</LocationWallIndex>
        <LocationRoofIndex xsi:nil=\"true\"/>
        <Orientation>North</Orientation>
        <AreaType>Total</AreaType>
        <AreaScaleType>Meters</AreaScaleType>
        <Area>1.5</Area>
        <AreaRecCalculation/>
        <RoofLightsPitch>0</RoofLightsPitch>
      </Opening>
    </Openings>
"
    ));
    assert!(markup.contains("<SolarTrans>0.63</SolarTrans>"));
}

#[rstest]
fn should_leave_out_opening_without_area_even_with_bad_parent(mut unit_sheet: Sheet) {
    add_window(&mut unit_sheet, "Nowhere", 0.);

    let markup = compile(&unit_sheet).unwrap();

    assert!(!markup.contains("<Opening>"));
    assert_eq!(markup.matches("<OpeningType>").count(), 1);
}

#[rstest]
fn should_fail_on_opening_with_unknown_parent(mut unit_sheet: Sheet) {
    add_window(&mut unit_sheet, "Nowhere", 1.5);

    let error = compile(&unit_sheet).unwrap_err();

    assert!(matches!(
        error,
        CompileError::UnresolvedReference {
            reference: UnresolvedReference::ParentElementMissing { ref opening, .. },
            ..
        } if opening == "G1"
    ));
}

#[rstest]
fn should_fail_on_party_wall_without_area(mut unit_sheet: Sheet) {
    set_column(&mut unit_sheet, "Element type", entered("Party wall"));
    set_column(&mut unit_sheet, "External wall length", vec![]);
    set_column(&mut unit_sheet, "Party wall length", entered(4.));
    set_column(&mut unit_sheet, "Party wall area", entered(0.));

    assert!(matches!(
        compile(&unit_sheet).unwrap_err(),
        CompileError::IncompleteElement { .. }
    ));
}

#[rstest]
fn should_fail_on_duplicate_element_names(mut unit_sheet: Sheet) {
    set_column(
        &mut unit_sheet,
        "Element type",
        vec![Cell::Empty, "External wall".into(), "Party wall".into()],
    );
    set_column(
        &mut unit_sheet,
        "Element name",
        vec![Cell::Empty, "W1".into(), "W1".into()],
    );

    assert!(matches!(
        compile(&unit_sheet).unwrap_err(),
        CompileError::DuplicateName { ref name, .. } if name == "W1"
    ));
}

#[rstest]
fn should_fail_on_bridge_without_psi(mut unit_sheet: Sheet) {
    set_column(&mut unit_sheet, "R4", vec!["ERROR".into()]);

    let error = compile(&unit_sheet).unwrap_err();

    assert_eq!(error.unit(), "Flat 1");
    assert!(matches!(
        error,
        CompileError::MissingRequiredField { ref field, .. } if field == "R4"
    ));
}

#[rstest]
fn should_write_one_thermal_bridge_per_length(mut unit_sheet: Sheet) {
    set_column(
        &mut unit_sheet,
        "E3",
        vec![0.04.into(), Cell::Empty, 1.2.into(), 2.4.into()],
    );

    let markup = compile(&unit_sheet).unwrap();

    assert_eq!(markup.matches("<ThermalBridge>").count(), 2);
    assert!(markup.contains(
        "      <ThermalBridge>
        <TypeSource>IndependentlyAssessed</TypeSource>
        <Length>1.2</Length>
        <PsiValue>0.04</PsiValue>
        <K1Index>Sill</K1Index>
        <Imported>False</Imported>
        <Adjusted>0.04</Adjusted>
        <Reference/>
      </ThermalBridge>
"
    ));
}

#[rstest]
fn should_report_each_sheet_independently(unit_sheet: Sheet) {
    let mut broken = unit_sheet.clone();
    broken.remove_column("Living area");
    let sheets = vec![unit_sheet.clone(), broken, unit_sheet];

    let results = compile_sheets(&sheets, &Lookups::default());

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(CompileError::MissingRequiredField { ref field, .. }) if field == "Living area"
    ));
    assert_eq!(results[0].as_ref().unwrap(), results[2].as_ref().unwrap());
}

#[test]
fn should_compile_sheet_read_from_csv() {
    let bridges = Lookups::default()
        .thermal_bridges
        .keys()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let general = [
        ("Property name", "Flat 2"),
        ("Dwelling orientation", "South"),
        ("Calculation type", "NewDwellingAsDesigned"),
        ("Terrain type", "Suburban"),
        ("Property type 1", "House"),
        ("Property type 2", "Detached"),
        ("Position of flat", "NotApplicable"),
        ("Which floor", "0"),
        ("Tot no. storeys in block", "2"),
        ("No. storeys", "2"),
        ("Date built", "2025"),
        ("Sheltered sides", "0"),
        ("Sunlight/sunshade", "Average"),
        ("Thermal mass parameter", "250"),
        ("Living area", "20"),
        ("Mech vent present", "No"),
        ("Ventilation data type", "Database"),
        ("Mech vent type", "MVHR"),
        ("Vent brand model", "Vent 300"),
        ("MVHR SFP", "0.6"),
        ("MVHR HR", "90"),
        ("Wet rooms", "3"),
        ("System location", "Inside"),
        ("Duct insulation", "Insulated"),
        ("Duct installation specs", "Level1"),
        ("Duct type", "Rigid"),
        ("Air permeability @50Pa", "4"),
        ("Lighting name", "LED"),
        ("Efficacy", "80"),
        ("Power", "10"),
        ("Capacity", "800"),
        ("Count", "8"),
        ("Heating network type", "Community"),
        ("Distribution loss space", "Calculated"),
        ("Heating source 1 - source", "Boiler"),
        ("Fuel type", "Gas"),
        ("Distribution loss", "1.5"),
        ("Heating controls", "2306"),
        ("Percentage of heat", "100"),
        ("Overall efficiency", "90"),
        ("Heating use", "SpaceAndWater"),
        ("Water heating", "FromMainSystem"),
        ("Cold water source", "Mains"),
        ("Bath count", "1"),
        ("Shower type", "Vented"),
        ("Shower flowrate", "8"),
        ("Storage type", "None"),
        ("PV present?", "No"),
        ("PV type", "Peak"),
        ("Cells peak", "0"),
        ("PV orientation", "South"),
        ("PV elevation", "30"),
        ("PV overshading", "None"),
    ];

    let headers = general
        .iter()
        .map(|(header, _)| *header)
        .chain(["Floor to slab", "Heated internal floor area", "Heat loss perimeter"])
        .chain(bridges.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(",");
    let psi_row = vec![""; general.len() + 3]
        .into_iter()
        .chain(bridges.iter().map(|_| "0.05"))
        .collect::<Vec<_>>()
        .join(",");
    let first_row = general
        .iter()
        .map(|(_, value)| *value)
        .chain(["2.5", "40", "26"])
        .collect::<Vec<_>>()
        .join(",");
    let second_row = vec![""; general.len()]
        .into_iter()
        .chain(["2.6", "40", "26"])
        .collect::<Vec<_>>()
        .join(",");
    let csv = format!("{headers}\n{psi_row}\n{first_row}\n{second_row}\n");

    let sheet = sheet_from_csv("Unit 2", csv.as_bytes()).unwrap();
    let markup = compile(&sheet).unwrap();

    assert!(markup.contains("<Reference>Flat 2</Reference>"));
    assert!(markup.contains("<Storeys>2</Storeys>"));
    assert!(markup.contains("<ExternalWalls/>"));
    assert!(markup.contains("<PhotovoltaicUnitType>None</PhotovoltaicUnitType>"));
    assert!(markup.contains("<PhotovoltaicUnits/>"));
    assert!(!markup.contains("<MechanicalVentilation>"));
}
