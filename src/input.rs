use crate::core::document::Scalar;
use crate::errors::CompileError;
use crate::lookups::ThermalBridgeNames;
use crate::sheet::{Cell, Sheet};
use indexmap::IndexSet;
use itertools::izip;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::warn;

/// Spreadsheet error literal entered in place of a psi value that has not been worked out.
const PSI_NOT_ENTERED: &str = "ERROR";

/// Row of a thermal-bridge column holding the psi value.
const PSI_ROW: usize = 0;

/// First row of a thermal-bridge column holding a length.
const FIRST_LENGTH_ROW: usize = 2;

pub fn ingest_unit(sheet: &Sheet, bridge_names: &ThermalBridgeNames) -> Result<Unit, CompileError> {
    UnitReader::new(sheet)?.read(bridge_names)
}

/// One dwelling's full input record.
#[derive(Clone, Debug, PartialEq)]
pub struct Unit {
    pub name: String,
    pub general: GeneralInformation,
    pub levels: Vec<Level>,
    pub opaque_elements: Vec<OpaqueElement>,
    pub opening_types: Vec<OpeningType>,
    pub openings: Vec<Opening>,
    pub thermal_bridges: Vec<ThermalBridge>,
    pub ventilation: MechanicalVentilation,
    pub lighting: Lighting,
    pub heat_network: HeatNetwork,
    pub water_heating: WaterHeating,
    pub photovoltaics: Photovoltaics,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeneralInformation {
    pub dwelling_orientation: Scalar,
    pub calculation_type: Scalar,
    pub terrain_type: Scalar,
    pub property_type_1: Scalar,
    pub property_type_2: Scalar,
    pub position_of_flat: Scalar,
    pub which_floor: i64,
    pub storeys_in_block: i64,
    pub number_of_storeys: i64,
    pub date_built: i64,
    pub sheltered_sides: i64,
    pub sunlight_shade: Scalar,
    pub thermal_mass_parameter: Scalar,
    pub living_area: Scalar,
}

/// Measurements of one storey. The n-th entered value of each level column belongs to
/// storey n, wherever in the column it was entered.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Level {
    pub floor_to_slab: f64,
    pub heated_floor_area: f64,
    pub heat_loss_perimeter: f64,
}

#[derive(Clone, Copy, Debug, Display, EnumIter, EnumString, Eq, Hash, PartialEq)]
pub enum ElementCategory {
    #[strum(serialize = "External wall")]
    ExternalWall,
    #[strum(serialize = "Sheltered wall")]
    ShelteredWall,
    #[strum(serialize = "Party wall")]
    PartyWall,
    #[strum(serialize = "External roof")]
    ExternalRoof,
    #[strum(serialize = "Heat loss floor")]
    HeatLossFloor,
    #[strum(serialize = "Party ceiling")]
    PartyCeiling,
    #[strum(serialize = "Party floor")]
    PartyFloor,
}

impl ElementCategory {
    /// Column whose populated cells must number exactly the elements of this category.
    pub(crate) fn measure_column(&self) -> &'static str {
        match self {
            ElementCategory::ExternalWall => "External wall length",
            ElementCategory::ShelteredWall => "Sheltered wall length",
            ElementCategory::PartyWall => "Party wall length",
            ElementCategory::ExternalRoof => "External roof area",
            ElementCategory::HeatLossFloor => "Heat loss floor area",
            ElementCategory::PartyCeiling => "Party ceiling area",
            ElementCategory::PartyFloor => "Party floor area",
        }
    }

    /// Whether openings may be placed in elements of this category.
    pub fn is_wall(&self) -> bool {
        matches!(
            self,
            ElementCategory::ExternalWall | ElementCategory::ShelteredWall
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OpaqueElement {
    pub name: String,
    pub level: Option<f64>,
    pub properties: ElementProperties,
}

impl OpaqueElement {
    pub fn category(&self) -> ElementCategory {
        self.properties.category()
    }
}

/// Category-specific properties of an opaque element. Every variant is complete: an
/// element missing one of its required properties is rejected while reading.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementProperties {
    ExternalWall {
        gross_area: f64,
        u_value: f64,
    },
    ShelteredWall {
        gross_area: f64,
        u_value: f64,
        shelter_factor: f64,
    },
    PartyWall {
        gross_area: f64,
    },
    ExternalRoof {
        gross_area: f64,
        u_value: f64,
        roof_type: Scalar,
        shelter_factor: f64,
    },
    HeatLossFloor {
        area: f64,
        u_value: f64,
        floor_type: Scalar,
        shelter_factor: f64,
    },
    PartyCeiling {
        gross_area: f64,
    },
    PartyFloor {
        area: f64,
    },
}

impl ElementProperties {
    pub fn category(&self) -> ElementCategory {
        match self {
            ElementProperties::ExternalWall { .. } => ElementCategory::ExternalWall,
            ElementProperties::ShelteredWall { .. } => ElementCategory::ShelteredWall,
            ElementProperties::PartyWall { .. } => ElementCategory::PartyWall,
            ElementProperties::ExternalRoof { .. } => ElementCategory::ExternalRoof,
            ElementProperties::HeatLossFloor { .. } => ElementCategory::HeatLossFloor,
            ElementProperties::PartyCeiling { .. } => ElementCategory::PartyCeiling,
            ElementProperties::PartyFloor { .. } => ElementCategory::PartyFloor,
        }
    }
}

#[derive(Clone, Copy, Debug, Display, EnumIter, EnumString, Eq, PartialEq)]
pub enum OpeningKind {
    Window,
    Door,
}

impl OpeningKind {
    /// Columns every named opening type of this kind must populate.
    fn required_columns(&self) -> &'static [&'static str] {
        match self {
            OpeningKind::Window => &[
                OPENING_KIND,
                OPENING_U_VALUE,
                OPENING_SOLAR_TRANSMITTANCE,
                OPENING_FRAME_FACTOR,
            ],
            OpeningKind::Door => &[OPENING_KIND, OPENING_U_VALUE, OPENING_FRAME_FACTOR],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OpeningType {
    pub name: String,
    pub kind: Option<OpeningKind>,
    pub u_value: Option<f64>,
    pub solar_transmittance: Option<f64>,
    pub frame_factor: Option<Scalar>,
}

impl OpeningType {
    /// Only opening types with a positive U-value make it into the document.
    pub fn is_entered(&self) -> bool {
        self.u_value.is_some_and(|u_value| u_value > 0.)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Opening {
    pub name: String,
    pub level: Option<f64>,
    pub opening_type: Option<String>,
    pub parent_element: Option<String>,
    pub orientation: Option<Scalar>,
    pub area: Option<f64>,
}

impl Opening {
    /// Openings without a positive area are left out of the document.
    pub fn has_area(&self) -> bool {
        self.area.is_some_and(|area| area > 0.)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ThermalBridge {
    pub key: String,
    pub psi: f64,
    pub lengths: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MechanicalVentilation {
    pub present: bool,
    pub data_type: Scalar,
    pub ventilation_type: Scalar,
    pub brand_model: Scalar,
    pub specific_fan_power: Scalar,
    pub heat_recovery_efficiency: Scalar,
    pub wet_rooms: i64,
    pub system_location: Scalar,
    pub duct_insulation: Scalar,
    pub duct_installation: Scalar,
    pub duct_type: Scalar,
    pub air_permeability: Scalar,
}

impl MechanicalVentilation {
    pub fn is_outside(&self) -> bool {
        self.system_location.as_text() == Some("Outside")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Lighting {
    pub name: Scalar,
    pub efficacy: Scalar,
    pub power: i64,
    pub capacity: i64,
    pub count: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeatNetwork {
    pub network_type: Scalar,
    pub distribution_loss_space: Scalar,
    pub source: Scalar,
    pub fuel_type: Scalar,
    pub distribution_loss: Scalar,
    pub controls: i64,
    pub heat_fraction: Scalar,
    pub overall_efficiency: Scalar,
    pub heating_use: Scalar,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WaterHeating {
    pub water_heating: Scalar,
    pub cold_water_source: Scalar,
    pub bath_count: i64,
    pub shower_type: Scalar,
    pub shower_flow_rate: f64,
    pub storage_type: Scalar,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Photovoltaics {
    pub present: bool,
    pub pv_type: Scalar,
    pub cells_peak: Scalar,
    pub orientation: Scalar,
    pub elevation: Scalar,
    pub overshading: Scalar,
}

pub(crate) const PROPERTY_NAME: &str = "Property name";

const FLOOR_TO_SLAB: &str = "Floor to slab";
const HEATED_FLOOR_AREA: &str = "Heated internal floor area";
const HEAT_LOSS_PERIMETER: &str = "Heat loss perimeter";

const ELEMENT_LEVEL: &str = "Level of opaque element";
const ELEMENT_TYPE: &str = "Element type";
const ELEMENT_NAME: &str = "Element name";
const EXTERNAL_WALL_AREA: &str = "External wall area";
const EXTERNAL_WALL_U_VALUE: &str = "External wall U-value";
const SHELTERED_WALL_AREA: &str = "Sheltered wall area";
const SHELTERED_WALL_U_VALUE: &str = "Sheltered wall U-value";
const SHELTERED_WALL_SHELTER_FACTOR: &str = "Sheltered wall shelter factor";
const PARTY_WALL_AREA: &str = "Party wall area";
const EXTERNAL_ROOF_AREA: &str = "External roof area";
const EXTERNAL_ROOF_U_VALUE: &str = "External roof U-value";
const EXTERNAL_ROOF_TYPE: &str = "External roof type";
const EXTERNAL_ROOF_SHELTER_FACTOR: &str = "External roof shelter factor";
const HEAT_LOSS_FLOOR_AREA: &str = "Heat loss floor area";
const HEAT_LOSS_FLOOR_U_VALUE: &str = "Heat loss floor U-value";
const HEAT_LOSS_FLOOR_TYPE: &str = "Heat loss floor type";
const HEAT_LOSS_FLOOR_SHELTER_FACTOR: &str = "Heat loss floor shelter factor";
const PARTY_CEILING_AREA: &str = "Party ceiling area";
const PARTY_FLOOR_AREA: &str = "Party floor area";

const OPENING_TYPE_NAME: &str = "Opening type name";
const OPENING_KIND: &str = "Type";
const OPENING_U_VALUE: &str = "U-value";
const OPENING_SOLAR_TRANSMITTANCE: &str = "Solar transmittance";
const OPENING_FRAME_FACTOR: &str = "Frame factor";

const OPENING_NAME: &str = "Opening name";
const OPENING_LEVEL: &str = "Opening level ref.";
const OPENING_TYPE: &str = "Opening type";
const OPENING_PARENT: &str = "Belongs to opaque element";
const OPENING_ORIENTATION: &str = "Orientation";
const OPENING_AREA: &str = "Area";
const OPENING_COLUMNS: [&str; 8] = [
    OPENING_LEVEL,
    OPENING_TYPE,
    OPENING_PARENT,
    OPENING_ORIENTATION,
    "Width",
    "Height",
    OPENING_AREA,
    "Floor to ceiling?",
];

struct UnitReader<'a> {
    sheet: &'a Sheet,
    unit: String,
}

impl<'a> UnitReader<'a> {
    fn new(sheet: &'a Sheet) -> Result<Self, CompileError> {
        let unit = cell_name(sheet.cell(PROPERTY_NAME, 1)).ok_or_else(|| {
            CompileError::MissingRequiredField {
                unit: sheet.name().to_string(),
                field: PROPERTY_NAME.to_string(),
            }
        })?;

        Ok(Self { sheet, unit })
    }

    fn read(self, bridge_names: &ThermalBridgeNames) -> Result<Unit, CompileError> {
        let general = self.general_information()?;
        let levels = self.levels()?;
        let opaque_elements = self.opaque_elements()?;
        let opening_types = self.opening_types()?;
        let openings = self.openings()?;
        let thermal_bridges = self.thermal_bridges(bridge_names)?;
        let ventilation = self.mechanical_ventilation()?;
        let lighting = self.lighting()?;
        let heat_network = self.heat_network()?;
        let water_heating = self.water_heating()?;
        let photovoltaics = self.photovoltaics()?;

        Ok(Unit {
            name: self.unit,
            general,
            levels,
            opaque_elements,
            opening_types,
            openings,
            thermal_bridges,
            ventilation,
            lighting,
            heat_network,
            water_heating,
            photovoltaics,
        })
    }

    fn general_information(&self) -> Result<GeneralInformation, CompileError> {
        Ok(GeneralInformation {
            dwelling_orientation: self.scalar("Dwelling orientation")?,
            calculation_type: self.scalar("Calculation type")?,
            terrain_type: self.scalar("Terrain type")?,
            property_type_1: self.scalar("Property type 1")?,
            property_type_2: self.scalar("Property type 2")?,
            position_of_flat: self.scalar("Position of flat")?,
            which_floor: self.integer("Which floor")?,
            storeys_in_block: self.integer("Tot no. storeys in block")?,
            number_of_storeys: self.integer("No. storeys")?,
            date_built: self.integer("Date built")?,
            sheltered_sides: self.integer("Sheltered sides")?,
            sunlight_shade: self.scalar("Sunlight/sunshade")?,
            thermal_mass_parameter: self.scalar("Thermal mass parameter")?,
            living_area: self.scalar("Living area")?,
        })
    }

    fn levels(&self) -> Result<Vec<Level>, CompileError> {
        let floor_to_slab = self.entered_numbers(FLOOR_TO_SLAB)?;
        let heated_floor_area = self.entered_numbers(HEATED_FLOOR_AREA)?;
        let heat_loss_perimeter = self.entered_numbers(HEAT_LOSS_PERIMETER)?;

        if heated_floor_area.len() != floor_to_slab.len() {
            return Err(self.count_mismatch(FLOOR_TO_SLAB, HEATED_FLOOR_AREA));
        }
        if heat_loss_perimeter.len() != floor_to_slab.len() {
            return Err(self.count_mismatch(FLOOR_TO_SLAB, HEAT_LOSS_PERIMETER));
        }

        Ok(izip!(floor_to_slab, heated_floor_area, heat_loss_perimeter)
            .map(|(floor_to_slab, heated_floor_area, heat_loss_perimeter)| Level {
                floor_to_slab,
                heated_floor_area,
                heat_loss_perimeter,
            })
            .collect())
    }

    fn opaque_elements(&self) -> Result<Vec<OpaqueElement>, CompileError> {
        if self.sheet.populated_count(ELEMENT_TYPE) != self.sheet.populated_count(ELEMENT_NAME) {
            return Err(self.count_mismatch(ELEMENT_TYPE, ELEMENT_NAME));
        }

        let mut names = IndexSet::new();
        for cell in self.sheet.data_cells(ELEMENT_NAME) {
            if let Some(name) = cell_name(cell) {
                if !names.insert(name.clone()) {
                    return Err(CompileError::DuplicateName {
                        unit: self.unit.clone(),
                        name,
                    });
                }
            }
        }

        let mut categories = Vec::new();
        for (row, cell) in self.sheet.data_cells(ELEMENT_TYPE).iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let category = cell
                .as_text()
                .and_then(|text| ElementCategory::from_str(text).ok())
                .ok_or_else(|| self.invalid_value(ELEMENT_TYPE, cell))?;
            categories.push((row + 1, category));
        }

        for category in ElementCategory::iter() {
            let declared = categories.iter().filter(|(_, c)| *c == category).count();
            if declared != self.sheet.populated_count(category.measure_column()) {
                return Err(self.count_mismatch(&category.to_string(), "properties"));
            }
        }

        categories
            .into_iter()
            .map(|(row, category)| {
                let name = cell_name(self.sheet.cell(ELEMENT_NAME, row))
                    .ok_or_else(|| self.missing_field(ELEMENT_NAME))?;
                let properties = self
                    .element_properties(row, category)
                    .ok_or_else(|| CompileError::IncompleteElement {
                        unit: self.unit.clone(),
                        category,
                        name: name.clone(),
                    })?;

                Ok(OpaqueElement {
                    level: self.sheet.cell(ELEMENT_LEVEL, row).as_f64(),
                    name,
                    properties,
                })
            })
            .collect()
    }

    /// Builds the properties for the element on the given row, or `None` when any
    /// required property is missing or invalid.
    fn element_properties(
        &self,
        row: usize,
        category: ElementCategory,
    ) -> Option<ElementProperties> {
        let number = |column: &str| self.sheet.cell(column, row).as_f64();
        let positive = |column: &str| number(column).filter(|value| *value > 0.);
        let text = |column: &str| Scalar::from_cell(self.sheet.cell(column, row));

        Some(match category {
            ElementCategory::ExternalWall => ElementProperties::ExternalWall {
                gross_area: number(EXTERNAL_WALL_AREA)?,
                u_value: number(EXTERNAL_WALL_U_VALUE)?,
            },
            ElementCategory::ShelteredWall => ElementProperties::ShelteredWall {
                gross_area: number(SHELTERED_WALL_AREA)?,
                u_value: number(SHELTERED_WALL_U_VALUE)?,
                shelter_factor: number(SHELTERED_WALL_SHELTER_FACTOR)?,
            },
            ElementCategory::PartyWall => ElementProperties::PartyWall {
                gross_area: positive(PARTY_WALL_AREA)?,
            },
            ElementCategory::ExternalRoof => ElementProperties::ExternalRoof {
                gross_area: number(EXTERNAL_ROOF_AREA)?,
                u_value: number(EXTERNAL_ROOF_U_VALUE)?,
                roof_type: text(EXTERNAL_ROOF_TYPE)?,
                shelter_factor: number(EXTERNAL_ROOF_SHELTER_FACTOR)?,
            },
            ElementCategory::HeatLossFloor => ElementProperties::HeatLossFloor {
                area: number(HEAT_LOSS_FLOOR_AREA)?,
                u_value: number(HEAT_LOSS_FLOOR_U_VALUE)?,
                floor_type: text(HEAT_LOSS_FLOOR_TYPE)?,
                shelter_factor: number(HEAT_LOSS_FLOOR_SHELTER_FACTOR)?,
            },
            ElementCategory::PartyCeiling => ElementProperties::PartyCeiling {
                gross_area: positive(PARTY_CEILING_AREA)?,
            },
            ElementCategory::PartyFloor => ElementProperties::PartyFloor {
                area: positive(PARTY_FLOOR_AREA)?,
            },
        })
    }

    fn opening_types(&self) -> Result<Vec<OpeningType>, CompileError> {
        for kind in OpeningKind::iter() {
            let rows = self.rows_of_kind(kind);
            let named = self.populated_in_rows(OPENING_TYPE_NAME, &rows);
            for column in kind.required_columns() {
                if self.populated_in_rows(column, &rows) != named {
                    return Err(self.count_mismatch(OPENING_TYPE_NAME, column));
                }
            }
        }

        self.named_rows(OPENING_TYPE_NAME)
            .map(|(row, name)| {
                let kind_cell = self.sheet.cell(OPENING_KIND, row);
                let kind = match kind_cell.as_text() {
                    Some(text) => Some(
                        OpeningKind::from_str(text)
                            .map_err(|_| self.invalid_value(OPENING_KIND, kind_cell))?,
                    ),
                    None if kind_cell.is_empty() => None,
                    None => return Err(self.invalid_value(OPENING_KIND, kind_cell)),
                };

                Ok(OpeningType {
                    name,
                    kind,
                    u_value: self.optional_number(OPENING_U_VALUE, row)?,
                    solar_transmittance: self.optional_number(OPENING_SOLAR_TRANSMITTANCE, row)?,
                    frame_factor: Scalar::from_cell(self.sheet.cell(OPENING_FRAME_FACTOR, row)),
                })
            })
            .collect()
    }

    fn rows_of_kind(&self, kind: OpeningKind) -> Vec<usize> {
        let label = kind.to_string();
        self.sheet
            .data_cells(OPENING_KIND)
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.as_text() == Some(label.as_str()))
            .map(|(row, _)| row + 1)
            .collect()
    }

    fn populated_in_rows(&self, column: &str, rows: &[usize]) -> usize {
        rows.iter()
            .filter(|row| !self.sheet.cell(column, **row).is_empty())
            .count()
    }

    fn openings(&self) -> Result<Vec<Opening>, CompileError> {
        let named = self.sheet.populated_count(OPENING_NAME);
        for column in OPENING_COLUMNS {
            if self.sheet.populated_count(column) != named {
                return Err(self.count_mismatch(OPENING_NAME, column));
            }
        }

        self.named_rows(OPENING_NAME)
            .map(|(row, name)| {
                Ok(Opening {
                    name,
                    level: self.sheet.cell(OPENING_LEVEL, row).as_f64(),
                    opening_type: cell_name(self.sheet.cell(OPENING_TYPE, row)),
                    parent_element: cell_name(self.sheet.cell(OPENING_PARENT, row)),
                    orientation: Scalar::from_cell(self.sheet.cell(OPENING_ORIENTATION, row)),
                    area: self.optional_number(OPENING_AREA, row)?,
                })
            })
            .collect()
    }

    fn thermal_bridges(
        &self,
        bridge_names: &ThermalBridgeNames,
    ) -> Result<Vec<ThermalBridge>, CompileError> {
        bridge_names
            .keys()
            .map(|key| {
                let psi_cell = self.sheet.cell(key, PSI_ROW);
                let psi = match psi_cell {
                    Cell::Text(text) if text.trim() == PSI_NOT_ENTERED => None,
                    cell => cell.as_f64(),
                }
                .ok_or_else(|| self.missing_field(key))?;

                let lengths = self
                    .sheet
                    .column(key)
                    .iter()
                    .skip(FIRST_LENGTH_ROW)
                    .filter(|cell| !cell.is_empty())
                    .map(|cell| cell.as_f64().ok_or_else(|| self.invalid_value(key, cell)))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(ThermalBridge {
                    key: key.to_string(),
                    psi,
                    lengths,
                })
            })
            .collect()
    }

    fn mechanical_ventilation(&self) -> Result<MechanicalVentilation, CompileError> {
        Ok(MechanicalVentilation {
            present: self.flag("Mech vent present")?,
            data_type: self.scalar("Ventilation data type")?,
            ventilation_type: self.scalar("Mech vent type")?,
            brand_model: self.scalar("Vent brand model")?,
            specific_fan_power: self.scalar("MVHR SFP")?,
            heat_recovery_efficiency: self.scalar("MVHR HR")?,
            wet_rooms: self.integer("Wet rooms")?,
            system_location: self.scalar("System location")?,
            duct_insulation: self.scalar("Duct insulation")?,
            duct_installation: self.scalar("Duct installation specs")?,
            duct_type: self.scalar("Duct type")?,
            air_permeability: self.scalar("Air permeability @50Pa")?,
        })
    }

    fn lighting(&self) -> Result<Lighting, CompileError> {
        Ok(Lighting {
            name: self.scalar("Lighting name")?,
            efficacy: self.scalar("Efficacy")?,
            power: self.integer("Power")?,
            capacity: self.integer("Capacity")?,
            count: self.integer("Count")?,
        })
    }

    fn heat_network(&self) -> Result<HeatNetwork, CompileError> {
        Ok(HeatNetwork {
            network_type: self.scalar("Heating network type")?,
            distribution_loss_space: self.scalar("Distribution loss space")?,
            source: self.scalar("Heating source 1 - source")?,
            fuel_type: self.scalar("Fuel type")?,
            distribution_loss: self.scalar("Distribution loss")?,
            controls: self.integer("Heating controls")?,
            heat_fraction: self.scalar("Percentage of heat")?,
            overall_efficiency: self.scalar("Overall efficiency")?,
            heating_use: self.scalar("Heating use")?,
        })
    }

    fn water_heating(&self) -> Result<WaterHeating, CompileError> {
        Ok(WaterHeating {
            water_heating: self.scalar("Water heating")?,
            cold_water_source: self.scalar("Cold water source")?,
            bath_count: self.integer("Bath count")?,
            shower_type: self.scalar("Shower type")?,
            shower_flow_rate: self.number("Shower flowrate")?,
            storage_type: self.scalar("Storage type")?,
        })
    }

    fn photovoltaics(&self) -> Result<Photovoltaics, CompileError> {
        Ok(Photovoltaics {
            present: self.flag("PV present?")?,
            pv_type: self.scalar("PV type")?,
            cells_peak: self.scalar("Cells peak")?,
            orientation: self.scalar("PV orientation")?,
            elevation: self.scalar("PV elevation")?,
            overshading: self.scalar("PV overshading")?,
        })
    }

    /// Rows (from row 1) with a populated name in the given column, paired with that name.
    fn named_rows(&self, column: &'a str) -> impl Iterator<Item = (usize, String)> + 'a {
        self.sheet
            .data_cells(column)
            .iter()
            .enumerate()
            .filter_map(|(row, cell)| cell_name(cell).map(|name| (row + 1, name)))
    }

    fn scalar(&self, field: &str) -> Result<Scalar, CompileError> {
        Scalar::from_cell(self.sheet.cell(field, 1)).ok_or_else(|| self.missing_field(field))
    }

    fn number(&self, field: &str) -> Result<f64, CompileError> {
        self.optional_number(field, 1)?
            .ok_or_else(|| self.missing_field(field))
    }

    fn integer(&self, field: &str) -> Result<i64, CompileError> {
        self.number(field).map(|number| number.trunc() as i64)
    }

    fn flag(&self, field: &str) -> Result<bool, CompileError> {
        Ok(self.scalar(field)?.as_text() == Some("Yes"))
    }

    fn optional_number(&self, field: &str, row: usize) -> Result<Option<f64>, CompileError> {
        let cell = self.sheet.cell(field, row);
        match cell {
            cell if cell.is_empty() => Ok(None),
            Cell::Number(number) => Ok(Some(*number)),
            cell => Err(self.invalid_value(field, cell)),
        }
    }

    /// Entered values of a numeric column from row 1 on, in row order, skipping blanks.
    fn entered_numbers(&self, field: &str) -> Result<Vec<f64>, CompileError> {
        self.sheet
            .data_cells(field)
            .iter()
            .filter(|cell| !cell.is_empty())
            .map(|cell| cell.as_f64().ok_or_else(|| self.invalid_value(field, cell)))
            .collect()
    }

    fn missing_field(&self, field: &str) -> CompileError {
        CompileError::MissingRequiredField {
            unit: self.unit.clone(),
            field: field.to_string(),
        }
    }

    fn invalid_value(&self, field: &str, cell: &Cell) -> CompileError {
        CompileError::InvalidValue {
            unit: self.unit.clone(),
            field: field.to_string(),
            value: cell.to_string(),
        }
    }

    fn count_mismatch(&self, main: &str, other: &str) -> CompileError {
        warn!(unit = %self.unit, main, other, "population counts disagree");
        CompileError::CountMismatch {
            unit: self.unit.clone(),
            main: main.to_string(),
            other: other.to_string(),
        }
    }
}

/// Text identifying a named entity. Numeric names are written without a fractional part
/// when they are whole numbers.
fn cell_name(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Text(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Cell::Number(number) if number.is_finite() && number.fract() == 0. => {
            Some(format!("{}", *number as i64))
        }
        Cell::Number(number) if !number.is_nan() => Some(number.to_string()),
        _ => None,
    }
}
