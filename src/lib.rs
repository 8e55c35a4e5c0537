//! This crate gathers the academic tasks of a student into a single list.
//!
//! Tasks come from two sources:
//! * an iCal export of a learning management system, parsed by the [`ical`] module
//! * a classroom API (Google Classroom-like), whose coursework is parsed by the [`classroom`] module
//!
//! Both are converted into [`NormalizedTask`]s. \
//! A [`SyncEngine`] fetches both sources concurrently, and merges their tasks into one deduplicated list. \
//! A failing source never aborts a sync: its failure is reported in the [`SyncResult`], next to the tasks of the other one.
//!
//! The sources are abstracted behind the traits of the [`traits`] module. The crate provides HTTP implementations
//! ([`HttpIcalSource`] and [`ClassroomClient`]), and mocked ones in the [`mock_sources`] module (that requires the
//! `mock_sources` feature).

pub mod traits;

pub mod task;
pub use task::{CourseRef, DedupKey, NormalizedTask, TaskSource, TaskType};

pub mod ical;
pub mod ical_source;
pub use ical_source::HttpIcalSource;
pub mod classroom;
pub use classroom::ClassroomClient;

pub mod merge;
pub mod engine;
pub use engine::{SyncConfig, SyncEngine, SyncResult};

pub mod settings;
pub use settings::{HttpSyncEngine, Settings};

pub mod mock_behaviour;
pub mod mock_sources;
