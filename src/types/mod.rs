//! Public types exposed by the `autofacts-core` crate.

pub mod collection;
pub mod integrity;
pub mod mileage;
pub mod records;
pub mod report;

pub use collection::{CollectionKind, Record};
pub use integrity::{FindingCode, FindingSeverity, IntegrityFinding, IntegrityReport};
pub use mileage::{MileageLogic, MileageNote};
pub use records::{
    FaultEntry, FaultRecord, MarketRecord, Milestone, ModelDefinition, ReliabilityRecord,
};
pub use report::{BackfillReport, InjectReport, ModelOutcome, OutcomeStatus};
