use crate::core::document::{Node, Record};
use crate::core::references::References;
use crate::errors::CompileError;
use crate::input::{ElementProperties, Level, OpeningKind, Unit};
use crate::lookups::ThermalBridgeNames;
use tracing::{debug, warn};

/// Number of measurement slots the schema expects, including the always-empty storey 0.
pub(crate) const MEASUREMENT_SLOTS: usize = 9;

const CONSTRUCTION: &str = "Other";
const KAPPA: i64 = 0;
const NO_SHELTER_CODE: &str = "None";
const AREA_CALCULATION_TYPE: &str = "Gross";

/// The `Measurements` block: storey 0 zeroed, then one slot per entered level.
pub(crate) fn measurements(unit: &Unit) -> Record {
    let slots = MEASUREMENT_SLOTS - 1;
    if unit.levels.len() > slots {
        warn!(
            unit = %unit.name,
            levels = unit.levels.len(),
            "only the first {slots} levels are written"
        );
    }

    let measurements = (0..MEASUREMENT_SLOTS)
        .map(|storey| {
            let level = storey.checked_sub(1).and_then(|row| unit.levels.get(row));
            Node::from(measurement(storey, level))
        })
        .collect::<Vec<_>>();

    Record::new().with("Measurement", Node::Repeated(measurements))
}

/// Storey 0 and storeys past the entered levels are written as integer zeros.
fn measurement(storey: usize, level: Option<&Level>) -> Record {
    let record = Record::new().with("Storey", storey);
    match level {
        Some(level) => record
            .with("InternalPerimeter", level.heat_loss_perimeter)
            .with("InternalFloorArea", level.heated_floor_area)
            .with("StoreyHeight", level.floor_to_slab),
        None => record
            .with("InternalPerimeter", 0)
            .with("InternalFloorArea", 0)
            .with("StoreyHeight", 0),
    }
}

/// Number of storeys with a positive floor-to-slab height.
pub(crate) fn storeys(levels: &[Level]) -> usize {
    levels
        .iter()
        .filter(|level| level.floor_to_slab > 0.)
        .count()
}

/// Opaque elements sorted into the groups the document lists them under, each in
/// element order.
#[derive(Debug, Default)]
pub(crate) struct OpaqueGroups {
    pub(crate) external_walls: Vec<Node>,
    pub(crate) party_walls: Vec<Node>,
    pub(crate) external_roofs: Vec<Node>,
    pub(crate) party_roofs: Vec<Node>,
    pub(crate) heat_loss_floors: Vec<Node>,
    pub(crate) party_floors: Vec<Node>,
}

pub(crate) fn opaque_elements(
    unit: &Unit,
    references: &References,
) -> Result<OpaqueGroups, CompileError> {
    let mut groups = OpaqueGroups::default();

    for element in &unit.opaque_elements {
        let description = element.name.as_str();
        match &element.properties {
            ElementProperties::ExternalWall {
                gross_area,
                u_value,
            } => groups
                .external_walls
                .push(wall(description, *gross_area, *u_value, Node::from(0)).into()),
            ElementProperties::ShelteredWall {
                gross_area,
                u_value,
                shelter_factor,
            } => groups.external_walls.push(
                wall(description, *gross_area, *u_value, Node::from(*shelter_factor)).into(),
            ),
            ElementProperties::PartyWall { gross_area } => groups.party_walls.push(
                Record::new()
                    .with("Description", description)
                    .with("Construction", CONSTRUCTION)
                    .with("Kappa", KAPPA)
                    .with("GrossArea", round_to(*gross_area, 3))
                    .with("Uvalue", 0)
                    .with("ShelterFactor", 0)
                    .with("ShelterCode", NO_SHELTER_CODE)
                    .with("Type", "FilledWithEdge")
                    .into(),
            ),
            ElementProperties::ExternalRoof {
                gross_area,
                u_value,
                roof_type,
                shelter_factor,
            } => groups.external_roofs.push(
                Record::new()
                    .with("Description", description)
                    .with("StoreyIndex", references.element_storey(element)?)
                    .with("Construction", CONSTRUCTION)
                    .with("Kappa", KAPPA)
                    .with("GrossArea", *gross_area)
                    .with("Type", roof_type)
                    .with("UValue", *u_value)
                    .with("ShelterFactor", *shelter_factor)
                    .with("ShelterCode", NO_SHELTER_CODE)
                    .with("AreaCalculationType", AREA_CALCULATION_TYPE)
                    .with("OpeningsArea", Node::Nil)
                    .with("NettArea", 0)
                    .into(),
            ),
            ElementProperties::HeatLossFloor {
                area,
                u_value,
                floor_type,
                shelter_factor,
            } => groups.heat_loss_floors.push(
                Record::new()
                    .with("Description", description)
                    .with("Construction", CONSTRUCTION)
                    .with("Kappa", KAPPA)
                    .with("Area", *area)
                    .with("StoreyIndex", references.element_storey(element)?)
                    .with("Type", floor_type)
                    .with("UValue", *u_value)
                    .with("ShelterFactor", *shelter_factor)
                    .with("ShelterCode", NO_SHELTER_CODE)
                    .into(),
            ),
            ElementProperties::PartyCeiling { gross_area } => groups.party_roofs.push(
                Record::new()
                    .with("Description", description)
                    .with("StoreyIndex", references.element_storey(element)?)
                    .with("Construction", CONSTRUCTION)
                    .with("Kappa", KAPPA)
                    .with("GrossArea", *gross_area)
                    .into(),
            ),
            ElementProperties::PartyFloor { area } => groups.party_floors.push(
                Record::new()
                    .with("Description", description)
                    .with("Construction", CONSTRUCTION)
                    .with("Kappa", KAPPA)
                    .with("Area", *area)
                    .with("StoreyIndex", references.element_storey(element)?)
                    .into(),
            ),
        }
    }

    Ok(groups)
}

/// External and sheltered walls share one shape; only the shelter factor differs.
fn wall(description: &str, gross_area: f64, u_value: f64, shelter_factor: Node) -> Record {
    Record::new()
        .with("Description", description)
        .with("Construction", CONSTRUCTION)
        .with("Kappa", KAPPA)
        .with("GrossArea", round_to(gross_area, 3))
        .with("Uvalue", u_value)
        .with("ShelterFactor", shelter_factor)
        .with("ShelterCode", NO_SHELTER_CODE)
        .with("Type", "Cavity")
        .with("AreaCalculationType", AREA_CALCULATION_TYPE)
        .with("OpeningsArea", Node::Nil)
        .with("NettArea", 0)
}

pub(crate) fn opening_types(
    unit: &Unit,
    references: &References,
) -> Result<Vec<Node>, CompileError> {
    for excluded in unit.opening_types.iter().filter(|t| !t.is_entered()) {
        debug!(unit = %unit.name, opening_type = %excluded.name, "opening type without a U-value left out");
    }

    references
        .opening_types()
        .iter()
        .map(|opening_type| {
            let kind = opening_type
                .kind
                .ok_or_else(|| CompileError::MissingRequiredField {
                    unit: unit.name.clone(),
                    field: format!("Type of opening type \"{}\"", opening_type.name),
                })?;
            let (glazing, solar_transmittance) = match kind {
                OpeningKind::Window => (
                    Node::from("Double"),
                    Node::from(opening_type.solar_transmittance),
                ),
                OpeningKind::Door => (Node::Nil, Node::from(0)),
            };

            Ok(Node::from(
                Record::new()
                    .with("Description", opening_type.name.as_str())
                    .with("DataSource", "Manufacturer")
                    .with("Type", kind.to_string())
                    .with("Glazing", glazing)
                    .with("GlazingGap", Node::Nil)
                    .with("GlazingFillingType", "None")
                    .with("SolarTrans", solar_transmittance)
                    .with("FrameType", "Wood")
                    .with("FrameFactor", opening_type.frame_factor.as_ref())
                    .with("UValue", opening_type.u_value),
            ))
        })
        .collect()
}

pub(crate) fn openings(unit: &Unit, references: &References) -> Result<Vec<Node>, CompileError> {
    unit.openings
        .iter()
        .filter(|opening| {
            if !opening.has_area() {
                debug!(unit = %unit.name, opening = %opening.name, "opening without an area left out");
            }
            opening.has_area()
        })
        .map(|opening| {
            let name = opening.name.as_str();
            references.opening_storey(name, opening.level)?;
            let opening_type_index = references
                .opening_type_index(name, opening.opening_type.as_deref().unwrap_or_default())?;
            let wall_index =
                references.wall_index(name, opening.parent_element.as_deref().unwrap_or_default())?;

            Ok(Node::from(
                Record::new()
                    .with("OpeningTypeIndex", opening_type_index)
                    .with("Description", name)
                    .with("LocationBuildingPartIndex", 0)
                    .with("LocationWallIndex", wall_index)
                    .with("LocationRoofIndex", Node::Nil)
                    .with("Orientation", opening.orientation.as_ref())
                    .with("AreaType", "Total")
                    .with("AreaScaleType", "Meters")
                    .with("Area", opening.area)
                    .with("AreaRecCalculation", Node::empty_list())
                    .with("RoofLightsPitch", 0),
            ))
        })
        .collect()
}

/// One `ThermalBridge` per entered length, in table order.
pub(crate) fn thermal_bridges(unit: &Unit, names: &ThermalBridgeNames) -> Vec<Node> {
    unit.thermal_bridges
        .iter()
        .flat_map(|bridge| {
            let name = names.name(&bridge.key).unwrap_or(bridge.key.as_str());
            bridge.lengths.iter().map(move |length| {
                Node::from(
                    Record::new()
                        .with("TypeSource", "IndependentlyAssessed")
                        .with("Length", *length)
                        .with("PsiValue", bridge.psi)
                        .with("K1Index", name)
                        .with("Imported", "False")
                        .with("Adjusted", bridge.psi)
                        .with("Reference", Node::empty_list()),
                )
            })
        })
        .collect()
}

/// Rounds half away from zero, so `0.0005` becomes `0.001` rather than the
/// half-to-even `0.0`.
fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
