use crate::core::document::{Node, Record};
use crate::input::{HeatNetwork, Lighting, MechanicalVentilation, Photovoltaics, WaterHeating};

/// Heat sources listed under a community heating block; only the first carries data.
const COMMUNITY_HEAT_SOURCES: usize = 5;

/// Main heating systems the schema expects, all written empty.
pub(crate) const MAIN_HEATING_SYSTEMS: usize = 2;

const SHOWER_POWER_PER_FLOW_RATE: f64 = 1.1625;

pub(crate) fn lightings(lighting: &Lighting) -> Record {
    Record::new().with(
        "Lighting",
        Record::new()
            .with("Name", &lighting.name)
            .with("Efficacy", &lighting.efficacy)
            .with("Power", lighting.power)
            .with("Capacity", lighting.capacity)
            .with("Count", lighting.count),
    )
}

/// `PhotovoltaicUnitType` followed by the `PhotovoltaicUnits` block, which stays empty
/// when no panels are fitted.
pub(crate) fn photovoltaics(photovoltaics: &Photovoltaics) -> (Node, Record) {
    if !photovoltaics.present {
        return (Node::from("None"), Record::new());
    }

    let unit = Record::new()
        .with("CellsPeak", &photovoltaics.cells_peak)
        .with("Orientation", &photovoltaics.orientation)
        .with("Elevation", &photovoltaics.elevation)
        .with("Overshading", &photovoltaics.overshading)
        .with("Fghrs", false)
        .with("MCSCertificate", false)
        .with("OvershadingFactor", 0);

    (
        Node::from(&photovoltaics.pv_type),
        Record::new().with("PhotovoltaicUnit", unit),
    )
}

/// The `MechanicalVentilation` block, present only when a system is fitted.
pub(crate) fn mechanical_ventilation(ventilation: &MechanicalVentilation) -> Option<Record> {
    if !ventilation.present {
        return None;
    }

    let duct_insulated = if ventilation.is_outside() {
        Node::from(&ventilation.duct_insulation)
    } else {
        Node::Nil
    };

    Some(
        Record::new()
            .with("DataType", &ventilation.data_type)
            .with("Type", &ventilation.ventilation_type)
            .with("PcdfIndex", Node::Nil)
            .with("PcdfItem", Node::Nil)
            .with("ManufacturerSFP", &ventilation.specific_fan_power)
            .with("DuctType", &ventilation.duct_type)
            .with("WetRooms", ventilation.wet_rooms)
            .with("BrandModel", &ventilation.brand_model)
            .with("MVHRDuctInsulated", duct_insulated)
            .with("DuctInsulation", Node::Nil)
            .with("MVHREfficiency", &ventilation.heat_recovery_efficiency)
            .with("ApprovedInstallation", false)
            .with("SFPFromInstallerCertificate", false)
            .with("MVHRSystemLocation", &ventilation.system_location)
            .with("DuctInsulationLevel", &ventilation.duct_installation),
    )
}

/// An unused main heating system.
pub(crate) fn main_heating_system() -> Record {
    Record::new()
        .with("HeatingDataType", "None")
        .with("Fraction", 0)
        .with("PcdfIndex", 0)
        .with("BoilerEfficiencyType", Node::Nil)
        .with("EfficiencyWinter", 0)
        .with("EfficiencySummer", 0)
        .with("TestMethod", Node::Nil)
        .with("MHSCtrlPcdfIndex", Node::Nil)
        .with("CompensatorPcdfIndex", Node::Nil)
        .with("HetasApprovedSystem", false)
        .with("FlueType", Node::Nil)
        .with("FanAssistedFlue", false)
        .with("McsCertificate", false)
        .with("Pumped", Node::Nil)
        .with("HeatingPumpAge", Node::Nil)
        .with("OilPumpInside", false)
        .with("HeatEmitter", Node::Nil)
        .with("UnderfloorHeating", Node::Nil)
        .with("CombiType", Node::Nil)
        .with("CombiKeepHotType", Node::Nil)
        .with("CombiStoreType", Node::Nil)
        .with("ElectricCPSUtemperature", Node::Nil)
        .with("FIcase", Node::Nil)
        .with("FIwater", Node::Nil)
        .with("BurnerControl", Node::Nil)
        .with("DelayedStartStat", false)
        .with("FlowTemperature", Node::Nil)
        .with("BoilerInterlock", false)
        .with("StorageHeaters", Record::new())
        .with("FlowTemperatureValue", Node::Nil)
        .with("SapCode", Node::Nil)
        .with("FuelType", Node::Nil)
        .with("CtrlSapCode", Node::Nil)
}

pub(crate) fn secondary_heating() -> Record {
    Record::new()
        .with("HeatingDataType", "None")
        .with("TestMethod", Node::Nil)
        .with("HetasApprovedSystems", false)
        .with("Efficiency", Node::Nil)
        .with("SapCode", 0)
        .with("FuelType", Node::Nil)
}

pub(crate) fn community_heating(network: &HeatNetwork) -> Record {
    let sources = (0..COMMUNITY_HEAT_SOURCES)
        .map(|index| Node::from(heat_source(network, index == 0)))
        .collect::<Vec<_>>();

    Record::new()
        .with("Type", &network.network_type)
        .with("DistributionLossSpace", &network.distribution_loss_space)
        .with("DistributionLossWater", Node::Nil)
        .with("ChargingLinked", Node::Nil)
        .with(
            "HeatSource",
            Record::new().with("CommunityHeatSource", Node::Repeated(sources)),
        )
        .with("DistributionLossSpaceValue", &network.distribution_loss)
        .with("DistributionLossWaterValue", Node::Nil)
        .with("SpacePCDFIndex", Node::Nil)
        .with("WaterPCDFIndex", Node::Nil)
        .with("CtrlSapCode", network.controls)
        .with("ExistingSpace", Node::Nil)
        .with("ExistingWater", Node::Nil)
        .with("UseNotionalSpace", Node::Nil)
        .with("UseNotionalWater", Node::Nil)
}

fn heat_source(network: &HeatNetwork, primary: bool) -> Record {
    let (source, fraction, fuel_type, efficiency) = if primary {
        (
            Node::from(&network.source),
            Node::from(&network.heat_fraction),
            Node::from(&network.fuel_type),
            Node::from(&network.overall_efficiency),
        )
    } else {
        (Node::from("None"), Node::Nil, Node::Nil, Node::Nil)
    };

    Record::new()
        .with("Source", source)
        .with("Fraction", fraction)
        .with("FuelType", fuel_type)
        .with("OveralEfficiency", efficiency)
        .with("HeatPowerRatio", Node::Nil)
        .with("ElectricalEfficiency", Node::Nil)
        .with("HeatEfficiency", Node::Nil)
        .with("HeatingUse", &network.heating_use)
        .with("CHPFuelFactor", Node::Nil)
        .with("EfficiencyType", Node::Nil)
}

pub(crate) fn water_heating_system(water: &WaterHeating) -> Record {
    Record::new()
        .with("WaterHeatingType", &water.water_heating)
        .with("LowWaterUse", false)
        .with("ImmersionHeaterType", Node::Nil)
        .with("SummerImmersion", false)
        .with("SuplementaryImmersion", false)
        .with("ImmersionOnlyHeatingHotWater", false)
        .with("ThermalStore", "None")
        .with("ThermalStorePipework", Node::Nil)
        .with("HotWaterCylinder", &water.storage_type)
        .with("InsulationType", Node::Nil)
        .with("InsulationThickness", Node::Nil)
        .with("InsulationThicknessType", Node::Nil)
        .with("Volume", Node::Nil)
        .with("CylinderStat", false)
        .with("PipeworkInsulation", Node::Nil)
        .with("InHeatedSpace", false)
        .with("InAiringCupboard", false)
        .with("SeparateTimeControl", 0)
        .with("LossFactor", 1.46)
        .with("SolarPanelType", Node::Nil)
        .with("SolarAreaType", "Aperture")
        .with("SolarArea", 0)
        .with("SolarNi", 0)
        .with("SolarA1", 0)
        .with("SolarA2", 0)
        .with("SolarAGRatio", 0)
        .with("SolarLoopEfficiency", 0.9)
        .with("SolarKhem", 0)
        .with("SolarHeatLossCoeff", Node::Nil)
        .with("SolarIsFromCommunity", false)
        .with("SolarServiceProvision", Node::Nil)
        .with("SolarPanelOrientation", Node::Nil)
        .with("SolarElevation", Node::Nil)
        .with("SolarOvershadingType", Node::Nil)
        .with("SolarVolume", Node::Nil)
        .with("SolarPumpElectricallyPowered", false)
        .with("SolarCombinedCylinder", false)
        .with("ColdWaterSource", &water.cold_water_source)
        .with("BathCount", water.bath_count)
        .with("WWHRSBathCount", Node::Nil)
        .with("SapCode", 901)
        .with("FuelType", Node::Nil)
        .with("HIUPcdfIndex", Node::Nil)
}

/// A single shower connected to the stored hot water. The rated power is rounded to one
/// decimal place, half away from zero.
pub(crate) fn showers(water: &WaterHeating) -> Record {
    let rated_power =
        (SHOWER_POWER_PER_FLOW_RATE * water.shower_flow_rate * 10.).round() / 10.;

    Record::new().with(
        "Shower",
        Record::new()
            .with("Description", "Shower1")
            .with("ShowerType", &water.shower_type)
            .with("FlowRate", water.shower_flow_rate)
            .with("RatedPower", rated_power)
            .with("Connected", true)
            .with("ConnectedTo", "Storage"),
    )
}
