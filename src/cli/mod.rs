//! Command-line parsing.
//!
//! Argument parsing and command dispatch stay separate from the model and
//! pipeline code. Every input flag is optional; omitted inputs keep their
//! form default.

use clap::{Parser, Subcommand};

use crate::domain::{InputError, InputField, InputValues};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "solar",
    version,
    about = "Solar power output prediction from weather readings"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive form (default when no subcommand is given).
    ///
    /// Input flags set the starting values of the form.
    Tui(InputArgs),
    /// Predict once from the given inputs and print the result.
    Predict(PredictArgs),
    /// Print every input with its range, default, and the value it would take.
    Inputs(InputArgs),
}

/// Starting values for the twelve model inputs.
#[derive(Debug, Parser, Clone, Default)]
pub struct InputArgs {
    /// Distance to solar noon in hours [0, 6] (default 1.5).
    #[arg(long, allow_negative_numbers = true)]
    pub distance_to_solar_noon: Option<f64>,

    /// Temperature in °C [-10, 50] (default 25).
    #[arg(long, allow_negative_numbers = true)]
    pub temperature: Option<f64>,

    /// Solar intensity factor [0, 1] (default 0.9).
    #[arg(long, allow_negative_numbers = true)]
    pub solar_intensity_factor: Option<f64>,

    /// Sky cover [0, 1] (default 0.2).
    #[arg(long, allow_negative_numbers = true)]
    pub sky_cover: Option<f64>,

    /// Wind speed in m/s [0, 15] (default 3).
    #[arg(long, allow_negative_numbers = true)]
    pub wind_speed: Option<f64>,

    /// Wind direction in whole degrees [0, 360] (default 90).
    #[arg(long, allow_negative_numbers = true)]
    pub wind_direction: Option<f64>,

    /// Wind U component in m/s [-5, 5] (default 1).
    #[arg(long, allow_negative_numbers = true)]
    pub wind_u: Option<f64>,

    /// Wind V component in m/s [-5, 5] (default -0.5).
    #[arg(long, allow_negative_numbers = true)]
    pub wind_v: Option<f64>,

    /// Average wind speed in m/s [0, 15] (default 2.8).
    #[arg(long, allow_negative_numbers = true)]
    pub average_wind_speed: Option<f64>,

    /// Average pressure in whole hPa [950, 1050] (default 1012).
    #[arg(long, allow_negative_numbers = true)]
    pub average_pressure: Option<f64>,

    /// Humidity in whole percent [0, 100] (default 40).
    #[arg(long, allow_negative_numbers = true)]
    pub humidity: Option<f64>,

    /// Temperature-humidity interaction term [0, 50] (default 10).
    #[arg(long, allow_negative_numbers = true)]
    pub temp_humidity_interaction: Option<f64>,
}

impl InputArgs {
    /// Flag values paired with their field, in model column order.
    pub fn overrides(&self) -> [(InputField, Option<f64>); 12] {
        [
            (InputField::DistanceToSolarNoon, self.distance_to_solar_noon),
            (InputField::Temperature, self.temperature),
            (InputField::SolarIntensityFactor, self.solar_intensity_factor),
            (InputField::SkyCover, self.sky_cover),
            (InputField::WindSpeed, self.wind_speed),
            (InputField::WindDirection, self.wind_direction),
            (InputField::WindU, self.wind_u),
            (InputField::WindV, self.wind_v),
            (InputField::AverageWindSpeed, self.average_wind_speed),
            (InputField::AveragePressure, self.average_pressure),
            (InputField::Humidity, self.humidity),
            (InputField::TempHumidityInteraction, self.temp_humidity_interaction),
        ]
    }

    /// Defaults with the given flags applied. Out-of-range values are errors.
    pub fn to_inputs(&self) -> Result<InputValues, InputError> {
        let mut values = InputValues::default();
        for (field, value) in self.overrides() {
            if let Some(value) = value {
                values.set(field, value)?;
            }
        }
        Ok(values)
    }
}

/// Options for a one-shot prediction.
#[derive(Debug, Parser, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Also print the assembled feature vector (model column order).
    #[arg(long)]
    pub show_features: bool,
}
