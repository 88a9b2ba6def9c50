//! Shared domain types.
//!
//! The column order of [`InputField::ALL`] is the column order the model was
//! trained on. Every place that turns form values into model input goes through
//! that array, so the order is defined exactly once.

use nalgebra::DMatrix;
use thiserror::Error;

/// Number of model input columns.
pub const FEATURE_COUNT: usize = 12;

/// Panel a field is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldGroup {
    General,
    Wind,
    Advanced,
}

impl FieldGroup {
    pub const ALL: [FieldGroup; 3] = [FieldGroup::General, FieldGroup::Wind, FieldGroup::Advanced];

    pub fn title(self) -> &'static str {
        match self {
            FieldGroup::General => "General Features",
            FieldGroup::Wind => "Wind Features",
            FieldGroup::Advanced => "Advanced Features",
        }
    }

    /// Fields belonging to this group, in feature order.
    pub fn fields(self) -> impl Iterator<Item = InputField> {
        InputField::ALL
            .into_iter()
            .filter(move |f| f.spec().group == self)
    }
}

/// One of the twelve model inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputField {
    DistanceToSolarNoon,
    Temperature,
    SolarIntensityFactor,
    SkyCover,
    WindSpeed,
    WindDirection,
    WindU,
    WindV,
    AverageWindSpeed,
    AveragePressure,
    Humidity,
    TempHumidityInteraction,
}

impl InputField {
    /// Model column order.
    pub const ALL: [InputField; FEATURE_COUNT] = [
        InputField::DistanceToSolarNoon,
        InputField::Temperature,
        InputField::SolarIntensityFactor,
        InputField::SkyCover,
        InputField::WindSpeed,
        InputField::WindDirection,
        InputField::WindU,
        InputField::WindV,
        InputField::AverageWindSpeed,
        InputField::AveragePressure,
        InputField::Humidity,
        InputField::TempHumidityInteraction,
    ];

    /// Column index in the feature vector.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn spec(self) -> &'static FieldSpec {
        &FIELD_SPECS[self.index()]
    }

    /// Snake-case column name, as written in model artifacts.
    pub fn key(self) -> &'static str {
        self.spec().key
    }

    pub fn from_key(key: &str) -> Option<InputField> {
        InputField::ALL.into_iter().find(|f| f.key() == key)
    }
}

/// UI bounds and presentation for one input.
///
/// The bounds are slider bounds, not a statement about the domain the model was
/// trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub unit: Option<&'static str>,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub step: f64,
    /// Integer sliders only take whole values.
    pub integer: bool,
    pub group: FieldGroup,
}

impl FieldSpec {
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    /// Label with unit suffix, e.g. `Wind Speed (m/s)`.
    pub fn display_label(&self) -> String {
        match self.unit {
            Some(unit) => format!("{} ({unit})", self.label),
            None => self.label.to_string(),
        }
    }

    pub fn format_value(&self, value: f64) -> String {
        if self.integer {
            format!("{value:.0}")
        } else {
            format!("{value:.2}")
        }
    }

    /// Snap a value onto the slider grid (`min + k * step`) and into bounds.
    pub fn snap(&self, value: f64) -> f64 {
        let clamped = value.clamp(self.min, self.max);
        let k = ((clamped - self.min) / self.step).round();
        let snapped = (self.min + k * self.step).clamp(self.min, self.max);
        // Strip accumulated float noise (e.g. 0.30000000000000004).
        (snapped * 1e6).round() / 1e6
    }
}

static FIELD_SPECS: [FieldSpec; FEATURE_COUNT] = [
    FieldSpec {
        key: "distance_to_solar_noon",
        label: "Distance to Solar Noon",
        unit: Some("hours"),
        min: 0.0,
        max: 6.0,
        default: 1.5,
        step: 0.05,
        integer: false,
        group: FieldGroup::General,
    },
    FieldSpec {
        key: "temperature",
        label: "Temperature",
        unit: Some("°C"),
        min: -10.0,
        max: 50.0,
        default: 25.0,
        step: 0.05,
        integer: false,
        group: FieldGroup::General,
    },
    FieldSpec {
        key: "solar_intensity_factor",
        label: "Solar Intensity Factor",
        unit: None,
        min: 0.0,
        max: 1.0,
        default: 0.9,
        step: 0.01,
        integer: false,
        group: FieldGroup::General,
    },
    FieldSpec {
        key: "sky_cover",
        label: "Sky Cover",
        unit: Some("0-1"),
        min: 0.0,
        max: 1.0,
        default: 0.2,
        step: 0.01,
        integer: false,
        group: FieldGroup::General,
    },
    FieldSpec {
        key: "wind_speed",
        label: "Wind Speed",
        unit: Some("m/s"),
        min: 0.0,
        max: 15.0,
        default: 3.0,
        step: 0.01,
        integer: false,
        group: FieldGroup::Wind,
    },
    FieldSpec {
        key: "wind_direction",
        label: "Wind Direction",
        unit: Some("degrees"),
        min: 0.0,
        max: 360.0,
        default: 90.0,
        step: 1.0,
        integer: true,
        group: FieldGroup::Wind,
    },
    FieldSpec {
        key: "wind_u",
        label: "Wind U Component",
        unit: Some("m/s"),
        min: -5.0,
        max: 5.0,
        default: 1.0,
        step: 0.01,
        integer: false,
        group: FieldGroup::Wind,
    },
    FieldSpec {
        key: "wind_v",
        label: "Wind V Component",
        unit: Some("m/s"),
        min: -5.0,
        max: 5.0,
        default: -0.5,
        step: 0.01,
        integer: false,
        group: FieldGroup::Wind,
    },
    FieldSpec {
        key: "average_wind_speed",
        label: "Average Wind Speed",
        unit: Some("m/s"),
        min: 0.0,
        max: 15.0,
        default: 2.8,
        step: 0.01,
        integer: false,
        group: FieldGroup::Wind,
    },
    FieldSpec {
        key: "average_pressure",
        label: "Average Pressure",
        unit: Some("hPa"),
        min: 950.0,
        max: 1050.0,
        default: 1012.0,
        step: 1.0,
        integer: true,
        group: FieldGroup::Advanced,
    },
    FieldSpec {
        key: "humidity",
        label: "Humidity",
        unit: Some("%"),
        min: 0.0,
        max: 100.0,
        default: 40.0,
        step: 1.0,
        integer: true,
        group: FieldGroup::Advanced,
    },
    FieldSpec {
        key: "temp_humidity_interaction",
        label: "Temp-Humidity Interaction",
        unit: None,
        min: 0.0,
        max: 50.0,
        default: 10.0,
        step: 0.01,
        integer: false,
        group: FieldGroup::Advanced,
    },
];

/// Rejected input value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{field} takes whole numbers only (got {value})")]
    NotInteger { field: &'static str, value: f64 },
    #[error("{field}: '{raw}' is not a number")]
    Unparsable { field: &'static str, raw: String },
}

/// Current value of every input, always within its bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct InputValues {
    values: [f64; FEATURE_COUNT],
}

impl Default for InputValues {
    fn default() -> Self {
        let mut values = [0.0; FEATURE_COUNT];
        for field in InputField::ALL {
            values[field.index()] = field.spec().default;
        }
        Self { values }
    }
}

impl InputValues {
    pub fn get(&self, field: InputField) -> f64 {
        self.values[field.index()]
    }

    /// Set an exact value. Out-of-range values are rejected, not clamped.
    pub fn set(&mut self, field: InputField, value: f64) -> Result<(), InputError> {
        let spec = field.spec();
        if !spec.contains(value) {
            return Err(InputError::OutOfRange {
                field: spec.key,
                value,
                min: spec.min,
                max: spec.max,
            });
        }
        if spec.integer && value.fract() != 0.0 {
            return Err(InputError::NotInteger {
                field: spec.key,
                value,
            });
        }
        self.values[field.index()] = value;
        Ok(())
    }

    /// Parse and set a typed-in value.
    pub fn set_from_str(&mut self, field: InputField, raw: &str) -> Result<(), InputError> {
        let trimmed = raw.trim();
        let value = trimmed.parse::<f64>().map_err(|_| InputError::Unparsable {
            field: field.key(),
            raw: trimmed.to_string(),
        })?;
        self.set(field, value)
    }

    /// Move a field by `steps` slider increments, stopping at the bounds.
    pub fn step(&mut self, field: InputField, steps: i32) -> f64 {
        let spec = field.spec();
        let next = spec.snap(self.get(field) + f64::from(steps) * spec.step);
        self.values[field.index()] = next;
        next
    }

    pub fn set_to_min(&mut self, field: InputField) {
        self.values[field.index()] = field.spec().min;
    }

    pub fn set_to_max(&mut self, field: InputField) {
        self.values[field.index()] = field.spec().max;
    }

    pub fn reset(&mut self, field: InputField) {
        self.values[field.index()] = field.spec().default;
    }

    /// All fields at their lower bound.
    pub fn minimums() -> Self {
        let mut out = Self::default();
        for field in InputField::ALL {
            out.set_to_min(field);
        }
        out
    }

    /// All fields at their upper bound.
    pub fn maximums() -> Self {
        let mut out = Self::default();
        for field in InputField::ALL {
            out.set_to_max(field);
        }
        out
    }
}

/// One model input row in training column order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn get(&self, field: InputField) -> f64 {
        self.0[field.index()]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Single-row batch.
    pub fn to_batch(&self) -> DMatrix<f64> {
        to_batch(std::slice::from_ref(self))
    }
}

/// Stack feature vectors into an `n x FEATURE_COUNT` matrix, one row each.
pub fn to_batch(rows: &[FeatureVector]) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), FEATURE_COUNT, |r, c| rows[r].0[c])
}
