pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod pipeline;
pub mod reward;
pub mod worker;
pub(crate) mod wot_api;

pub use client::{BattleProgress, WotClient};
pub use config::{ClientConfig, Realm};
pub use error::{ExportError, FailureKind, Result, RewardError, WotError};
pub use model::*;
pub use pipeline::{
    run_pipeline, CancelFlag, PipelineOutcome, PipelineRequest, PipelineStage, Progress,
};
pub use reward::{compute_rewards, sort_by_battles};
pub use worker::{RunHandle, Worker, WorkerBusy};
