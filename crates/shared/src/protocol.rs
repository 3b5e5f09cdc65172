use serde::{Deserialize, Serialize};

use crate::domain::InputState;

pub const PREDICT_PATH: &str = "/api/predict";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub throttle_pos: f64,
    pub gear: u8,
}

impl From<InputState> for PredictRequest {
    fn from(value: InputState) -> Self {
        Self {
            throttle_pos: value.throttle_position(),
            gear: value.gear(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineParameters {
    #[serde(rename = "ENGINE_RPM")]
    pub engine_rpm: f64,
    #[serde(rename = "IntakeGasMassFlow")]
    pub intake_gas_mass_flow: f64,
    #[serde(rename = "FuelMassFlow")]
    pub fuel_mass_flow: f64,
    #[serde(rename = "AirFuelRatio")]
    pub air_fuel_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinalOutputs {
    #[serde(rename = "EngineTorque")]
    pub engine_torque: f64,
    #[serde(rename = "PowerTransferred")]
    pub power_transferred: f64,
    #[serde(rename = "Efficiency")]
    pub efficiency: f64,
    #[serde(rename = "BSFC")]
    pub bsfc: f64,
    #[serde(rename = "PowerFromFuel")]
    pub power_from_fuel: f64,
}

/// Response of the inference service. Every field is required.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub engine_parameters: EngineParameters,
    pub final_outputs: FinalOutputs,
}
