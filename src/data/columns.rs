//! Column names of the source dataset.
//! The upstream CSV uses French headers; they are kept verbatim.

pub const DATE: &str = "Date";
pub const CITY: &str = "Ville";
pub const POSITIVE: &str = "Positif";
pub const NEGATIVE: &str = "Negatif";
pub const DECEASED: &str = "Décédé";
pub const RECOVERED: &str = "Guéri";
pub const FACTOR: &str = "Facteur";
pub const ORIGIN: &str = "Source/Voyage";
pub const AGE: &str = "Age";
pub const MALE: &str = "Homme";
pub const FEMALE: &str = "Femme";
pub const RESIDENT: &str = "Resident Senegal";
pub const HOSPITAL_DAYS: &str = "Temps Hospitalisation (j)";

/// Known values of the infection factor column.
pub const FACTOR_IMPORTED: &str = "Importé";
pub const FACTOR_CONTACT: &str = "Contact";
pub const FACTOR_COMMUNITY: &str = "Communauté";

/// Columns every load must provide.
pub const REQUIRED: [&str; 13] = [
    DATE,
    CITY,
    POSITIVE,
    NEGATIVE,
    DECEASED,
    RECOVERED,
    FACTOR,
    ORIGIN,
    AGE,
    MALE,
    FEMALE,
    RESIDENT,
    HOSPITAL_DAYS,
];
