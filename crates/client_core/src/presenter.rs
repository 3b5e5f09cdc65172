//! Display formatting for prediction results.

use shared::protocol::PredictionResult;

const HEADLINE_DECIMALS: usize = 2;
const MASS_FLOW_DECIMALS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionDisplay {
    pub engine_rpm: String,
    pub intake_gas_mass_flow: String,
    pub fuel_mass_flow: String,
    pub air_fuel_ratio: String,
    pub engine_torque: String,
    pub power_transferred: String,
    pub efficiency: String,
    pub bsfc: String,
    pub power_from_fuel: String,
}

impl PredictionDisplay {
    pub fn rows(&self) -> [(&'static str, &str); 9] {
        [
            ("Engine speed (RPM)", self.engine_rpm.as_str()),
            ("Intake gas mass flow", self.intake_gas_mass_flow.as_str()),
            ("Fuel mass flow", self.fuel_mass_flow.as_str()),
            ("Air-fuel ratio", self.air_fuel_ratio.as_str()),
            ("Engine torque", self.engine_torque.as_str()),
            ("Power transferred", self.power_transferred.as_str()),
            ("Efficiency", self.efficiency.as_str()),
            ("BSFC", self.bsfc.as_str()),
            ("Power from fuel", self.power_from_fuel.as_str()),
        ]
    }
}

pub fn present(result: &PredictionResult) -> PredictionDisplay {
    let engine = &result.engine_parameters;
    let outputs = &result.final_outputs;
    PredictionDisplay {
        engine_rpm: fixed(engine.engine_rpm, HEADLINE_DECIMALS),
        intake_gas_mass_flow: fixed(engine.intake_gas_mass_flow, MASS_FLOW_DECIMALS),
        fuel_mass_flow: fixed(engine.fuel_mass_flow, MASS_FLOW_DECIMALS),
        air_fuel_ratio: fixed(engine.air_fuel_ratio, HEADLINE_DECIMALS),
        engine_torque: fixed(outputs.engine_torque, HEADLINE_DECIMALS),
        power_transferred: fixed(outputs.power_transferred, HEADLINE_DECIMALS),
        efficiency: fixed(outputs.efficiency, HEADLINE_DECIMALS),
        bsfc: fixed(outputs.bsfc, HEADLINE_DECIMALS),
        power_from_fuel: fixed(outputs.power_from_fuel, HEADLINE_DECIMALS),
    }
}

fn fixed(value: f64, decimals: usize) -> String {
    let rendered = format!("{value:.decimals$}");
    // Negative zero prints unsigned.
    match rendered.strip_prefix('-') {
        Some(magnitude) if magnitude.chars().all(|c| c == '0' || c == '.') => {
            magnitude.to_string()
        }
        _ => rendered,
    }
}
