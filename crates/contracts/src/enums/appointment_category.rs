use serde::{Deserialize, Serialize};

/// Appointment categories recognised by the studio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentCategory {
    /// First visit, usually before a first purchase
    Measurement,
    /// Follow-up / adjustment visit
    Fitting,
}

impl AppointmentCategory {
    /// Wire code (query strings, JSON)
    pub fn code(&self) -> &'static str {
        match self {
            AppointmentCategory::Measurement => "measurement",
            AppointmentCategory::Fitting => "fitting",
        }
    }

    /// Parse a wire code
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "measurement" => Some(AppointmentCategory::Measurement),
            "fitting" => Some(AppointmentCategory::Fitting),
            _ => None,
        }
    }

    /// Parse a stored literal. Accepts the accented and unaccented spelling
    /// as well as the wire code; anything else is unrecognised.
    pub fn from_storage(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "medición" | "medicion" | "measurement" => Some(AppointmentCategory::Measurement),
            "fitting" => Some(AppointmentCategory::Fitting),
            _ => None,
        }
    }
}

impl std::fmt::Display for AppointmentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
