//! Clinical measurements and their positional model encoding.

/// Number of columns the classifier was fitted on.
pub const FEATURE_COUNT: usize = 8;

/// Training-time column order. The artifact carries no schema of its own, so
/// every record handed to a model is assembled in exactly this order.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
];

/// A fully validated set of measurements for one patient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatientFeatures {
    pub pregnancies: i64,
    pub glucose: i64,
    pub blood_pressure: i64,
    pub skin_thickness: i64,
    pub insulin: i64,
    pub bmi: f64,
    pub diabetes_pedigree_function: f64,
    pub age: i64,
}

impl PatientFeatures {
    pub fn to_record(&self) -> FeatureRecord {
        FeatureRecord::new([
            self.pregnancies as f64,
            self.glucose as f64,
            self.blood_pressure as f64,
            self.skin_thickness as f64,
            self.insulin as f64,
            self.bmi,
            self.diabetes_pedigree_function,
            self.age as f64,
        ])
    }
}

/// Single-row feature record in [`FEATURE_COLUMNS`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRecord([f64; FEATURE_COUNT]);

impl FeatureRecord {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }
}
