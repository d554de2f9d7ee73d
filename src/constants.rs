//! Fixed names and formatting knobs shared by the store and the CLI.

/// UTF-8 byte-order mark. Tolerated on read, never written.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Indentation used when writing collection documents.
pub const DOCUMENT_INDENT: &[u8] = b"    ";

pub const MODELS_FILE_NAME: &str = "car_models.json";
pub const MARKET_FILE_NAME: &str = "model_market.json";
pub const RELIABILITY_FILE_NAME: &str = "model_reliability.json";
pub const FAULTS_FILE_NAME: &str = "major_faults.json";

/// Optional reliability field filled in by the backfill pass.
pub const MILEAGE_LOGIC_FIELD: &str = "mileage_logic_text";

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "autofacts.toml";

/// Upper bound of the reliability score scale.
pub const MAX_RELIABILITY_SCORE: u32 = 100;
