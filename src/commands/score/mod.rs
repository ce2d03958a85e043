use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cli::{CompareMetric, ScoreArgs};
use crate::commands::compare::{ModelScores, compare_all};
use crate::commands::resolve_config;
use crate::config::{BootstrapConfig, ScoringConfig};
use crate::model::{
    ExtractionRecord, PosterCounts, PosterId, PosterManifestEntry, PredictionMeta, RunMeta,
    RunSummary, ScoreStatistics,
};
use crate::scoring::{
    PosterScore, PredictionStatus, ScoreBreakdown, decode_text, load_record, score_poster_bytes,
};
use crate::stats::{bootstrap_mean_seeded, mean, population_std};
use crate::util::{
    now_utc_string, read_json, sha256_files, utc_compact_string, write_json_pretty,
};

const RUN_MANIFEST_VERSION: u32 = 1;

mod aggregate;
mod dataset;
mod run;

pub use run::run;

use aggregate::*;
use dataset::*;
