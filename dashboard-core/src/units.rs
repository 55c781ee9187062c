use serde::{Deserialize, Serialize};

/// Display unit for temperatures. Snapshots always store Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn toggle(self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }
}

/// Render a stored Celsius temperature in the requested unit.
///
/// Fahrenheit values are rounded to the nearest whole degree.
pub fn format_temperature(temp_celsius: i32, unit: TemperatureUnit) -> String {
    match unit {
        TemperatureUnit::Celsius => format!("{temp_celsius}{}", unit.symbol()),
        TemperatureUnit::Fahrenheit => {
            let fahrenheit = round_half_up(f64::from(temp_celsius) * 9.0 / 5.0 + 32.0);
            format!("{fahrenheit}{}", unit.symbol())
        }
    }
}

/// Nearest whole number, with halves rounded toward positive infinity.
pub(crate) fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
