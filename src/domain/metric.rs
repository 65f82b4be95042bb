// Metric catalog - static registry of every chartable battery/weather metric
use enum_map::Enum;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Enum, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    OverallVoltage,
    Current,
    Power,
    StateOfCharge,
    RemainingCapacity,
    FullCapacity,
    Health,
    Temperature,
    MosTemperature,
    CellVoltageDifference,
    Clouds,
    Uvi,
    WeatherTemperature,
    Irradiance,
}

impl MetricKey {
    pub fn descriptor(self) -> &'static MetricDescriptor {
        &METRICS[self.into_usize()]
    }
}

/// Where a metric's raw value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricSource {
    Device,
    Weather,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

/// Threshold predicate evaluated against a raw (pre-multiplier) value.
pub type AnomalyRule = fn(f64) -> Option<(Severity, &'static str)>;

#[derive(Debug, Clone, Copy)]
pub struct MetricDescriptor {
    pub key: MetricKey,
    pub label: &'static str,
    pub unit: &'static str,
    pub color: &'static str,
    pub multiplier: f64,
    pub source: MetricSource,
    pub group: &'static str,
    /// Field name in the source record; `None` for derived metrics.
    pub field: Option<&'static str>,
    pub anomaly: Option<AnomalyRule>,
}

impl MetricDescriptor {
    /// Run the anomaly rule, if any, against a raw value.
    pub fn check(&self, raw: f64) -> Option<(Severity, &'static str)> {
        self.anomaly.and_then(|rule| rule(raw))
    }
}

fn state_of_charge_rule(v: f64) -> Option<(Severity, &'static str)> {
    if v < 10.0 {
        Some((Severity::Critical, "Critically low state of charge"))
    } else if v < 20.0 {
        Some((Severity::Warning, "Low state of charge"))
    } else {
        None
    }
}

fn temperature_rule(v: f64) -> Option<(Severity, &'static str)> {
    if v > 50.0 {
        Some((Severity::Critical, "Battery over-temperature"))
    } else if v > 45.0 {
        Some((Severity::Warning, "High battery temperature"))
    } else {
        None
    }
}

fn mos_temperature_rule(v: f64) -> Option<(Severity, &'static str)> {
    if v > 80.0 {
        Some((Severity::Critical, "MOS over-temperature"))
    } else if v > 65.0 {
        Some((Severity::Warning, "High MOS temperature"))
    } else {
        None
    }
}

// Raw unit is volts; thresholds stay in volts even though the chart shows mV.
fn cell_imbalance_rule(v: f64) -> Option<(Severity, &'static str)> {
    if v > 0.1 {
        Some((Severity::Critical, "Severe cell imbalance"))
    } else if v > 0.05 {
        Some((Severity::Warning, "Cell imbalance"))
    } else {
        None
    }
}

fn health_rule(v: f64) -> Option<(Severity, &'static str)> {
    if v < 70.0 {
        Some((Severity::Critical, "Battery health degraded"))
    } else if v < 80.0 {
        Some((Severity::Warning, "Battery health declining"))
    } else {
        None
    }
}

const fn device(
    key: MetricKey,
    label: &'static str,
    unit: &'static str,
    color: &'static str,
    group: &'static str,
    field: Option<&'static str>,
) -> MetricDescriptor {
    MetricDescriptor {
        key,
        label,
        unit,
        color,
        multiplier: 1.0,
        source: MetricSource::Device,
        group,
        field,
        anomaly: None,
    }
}

const fn weather(
    key: MetricKey,
    label: &'static str,
    unit: &'static str,
    color: &'static str,
    field: &'static str,
) -> MetricDescriptor {
    MetricDescriptor {
        key,
        label,
        unit,
        color,
        multiplier: 1.0,
        source: MetricSource::Weather,
        group: "weather",
        field: Some(field),
        anomaly: None,
    }
}

/// Indexed by `MetricKey::into_usize`; order must follow the enum.
pub static METRICS: [MetricDescriptor; 14] = [
    device(
        MetricKey::OverallVoltage,
        "Voltage",
        "V",
        "#60a5fa",
        "voltage",
        Some("overallVoltage"),
    ),
    device(
        MetricKey::Current,
        "Current",
        "A",
        "#f472b6",
        "current",
        Some("current"),
    ),
    MetricDescriptor {
        multiplier: 1000.0,
        ..device(
            MetricKey::Power,
            "Power",
            "W",
            "#facc15",
            "power",
            Some("power"),
        )
    },
    MetricDescriptor {
        anomaly: Some(state_of_charge_rule),
        ..device(
            MetricKey::StateOfCharge,
            "State of Charge",
            "%",
            "#34d399",
            "percent",
            Some("stateOfCharge"),
        )
    },
    device(
        MetricKey::RemainingCapacity,
        "Remaining Capacity",
        "Ah",
        "#a78bfa",
        "capacity",
        Some("remainingCapacity"),
    ),
    device(
        MetricKey::FullCapacity,
        "Full Capacity",
        "Ah",
        "#c084fc",
        "capacity",
        Some("fullCapacity"),
    ),
    MetricDescriptor {
        anomaly: Some(health_rule),
        ..device(
            MetricKey::Health,
            "Health",
            "%",
            "#22d3ee",
            "percent",
            None,
        )
    },
    MetricDescriptor {
        anomaly: Some(temperature_rule),
        ..device(
            MetricKey::Temperature,
            "Temperature",
            "°C",
            "#fb923c",
            "temperature",
            Some("temperature"),
        )
    },
    MetricDescriptor {
        anomaly: Some(mos_temperature_rule),
        ..device(
            MetricKey::MosTemperature,
            "MOS Temperature",
            "°C",
            "#f87171",
            "temperature",
            Some("mosTemperature"),
        )
    },
    MetricDescriptor {
        multiplier: 1000.0,
        anomaly: Some(cell_imbalance_rule),
        ..device(
            MetricKey::CellVoltageDifference,
            "Cell Voltage Diff",
            "mV",
            "#e879f9",
            "voltage-delta",
            Some("cellVoltageDifference"),
        )
    },
    weather(MetricKey::Clouds, "Cloud Cover", "%", "#94a3b8", "clouds"),
    weather(MetricKey::Uvi, "UV Index", "UVI", "#fde047", "uvi"),
    weather(
        MetricKey::WeatherTemperature,
        "Air Temperature",
        "°C",
        "#fdba74",
        "temp",
    ),
    weather(
        MetricKey::Irradiance,
        "Solar Irradiance",
        "W/m²",
        "#fbbf24",
        "estimated_irradiance_w_m2",
    ),
];

/// Every registered descriptor, in key order.
pub fn all() -> impl Iterator<Item = &'static MetricDescriptor> {
    METRICS.iter()
}
