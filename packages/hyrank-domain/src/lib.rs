pub mod corpus;
pub mod document;
pub mod error;
pub mod fusion;
pub mod lexeme;
pub mod ranked;
pub mod time_serde;
pub mod trap;
pub mod window;

pub use corpus::{Corpus, CorpusStats, DemoQuery};
pub use document::{DocKey, Document, TrapType};
pub use error::{ConfigurationError, CorpusError};
pub use fusion::{Contribution, Degradation, EmptyReason, FusedEntry, FusedResult, FusionParams};
pub use ranked::{Candidate, Eligibility, Method, RankedEntry, RankedList};
pub use trap::{BaitPlacement, BaitVerdict, ExpectedOutcome, TrapVerdict, WinnerVerdict};
pub use window::{TimeRange, TimeWindow, WindowUnit};
