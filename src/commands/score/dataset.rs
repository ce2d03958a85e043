use super::*;

pub(super) struct ModelPredictions {
    pub name: String,
    pub predictions: HashMap<PosterId, Vec<u8>>,
    pub cost_usd: f64,
    pub seeds: Vec<u64>,
}

impl ModelPredictions {
    pub fn prediction(&self, poster_id: &str) -> Option<&[u8]> {
        self.predictions.get(poster_id).map(Vec::as_slice)
    }
}

/// Everything a scoring run reads, loaded up front. Ground truth is sorted
/// by poster id.
pub(super) struct Dataset {
    pub ground_truth: Vec<ExtractionRecord>,
    pub ground_truth_paths: Vec<PathBuf>,
    pub ground_truth_cost_usd: f64,
    pub counts: PosterCounts,
    pub models: Vec<ModelPredictions>,
}

pub(super) fn load_dataset(args: &ScoreArgs) -> Result<Dataset> {
    let poster_ids = match args.manifest_path.as_deref() {
        Some(path) => manifest_poster_ids(path)?,
        None => ground_truth_stems(&args.ground_truth_dir)?,
    };

    let mut ground_truth = Vec::<ExtractionRecord>::new();
    let mut ground_truth_paths = Vec::<PathBuf>::new();
    let mut ground_truth_cost_usd = 0.0_f64;
    let mut missing_ground_truth = 0_usize;
    let mut invalid_ground_truth = 0_usize;

    for poster_id in &poster_ids {
        let path = args.ground_truth_dir.join(format!("{poster_id}.json"));
        if !path.is_file() {
            debug!(poster = %poster_id, "no ground truth for poster");
            missing_ground_truth += 1;
            continue;
        }

        let bytes = fs::read(&path)
            .with_context(|| format!("failed to read ground truth: {}", path.display()))?;
        let record = match decode_text(&bytes).and_then(|raw| load_record(poster_id, raw)) {
            Ok(record) => record,
            Err(failure) => {
                warn!(
                    poster = %poster_id,
                    error = %failure.errors.join("; "),
                    "skipping unreadable ground truth"
                );
                invalid_ground_truth += 1;
                continue;
            }
        };

        let meta_path = args.ground_truth_dir.join(format!("{poster_id}.meta.json"));
        if let Some(meta) = read_meta(&meta_path) {
            ground_truth_cost_usd += meta.estimated_cost_usd.unwrap_or(0.0);
        }

        ground_truth.push(record);
        ground_truth_paths.push(path);
    }

    if ground_truth.is_empty() {
        bail!(
            "no usable ground truth found in {}",
            args.ground_truth_dir.display()
        );
    }
    if missing_ground_truth > 0 || invalid_ground_truth > 0 {
        warn!(
            missing = missing_ground_truth,
            invalid = invalid_ground_truth,
            "some posters have no usable ground truth"
        );
    }

    let models = discover_models(&args.predictions_dir, &args.models)?
        .into_iter()
        .map(|name| load_model_predictions(&args.predictions_dir, name, &ground_truth))
        .collect::<Result<Vec<ModelPredictions>>>()?;

    let counts = PosterCounts {
        posters_manifest_ok: poster_ids.len(),
        ground_truth_available: ground_truth.len(),
        missing_ground_truth,
        invalid_ground_truth,
    };

    Ok(Dataset {
        ground_truth,
        ground_truth_paths,
        ground_truth_cost_usd,
        counts,
        models,
    })
}

fn manifest_poster_ids(path: &Path) -> Result<Vec<PosterId>> {
    let entries = read_json::<Vec<PosterManifestEntry>>(path)?;
    let skipped = entries.iter().filter(|entry| !entry.is_ok()).count();
    if skipped > 0 {
        info!(skipped, "ignoring manifest posters without ok status");
    }

    Ok(entries
        .into_iter()
        .filter(PosterManifestEntry::is_ok)
        .map(|entry| entry.id)
        .collect::<BTreeSet<PosterId>>()
        .into_iter()
        .collect())
}

fn ground_truth_stems(dir: &Path) -> Result<Vec<PosterId>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    let mut ids = BTreeSet::<PosterId>::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if name.ends_with(".meta.json") {
            continue;
        }
        if let Some(stem) = name.strip_suffix(".json") {
            ids.insert(stem.to_string());
        }
    }

    Ok(ids.into_iter().collect())
}

fn discover_models(predictions_dir: &Path, requested: &[String]) -> Result<Vec<String>> {
    let entries = fs::read_dir(predictions_dir)
        .with_context(|| format!("failed to read {}", predictions_dir.display()))?;

    let mut found = BTreeSet::<String>::new();
    for entry in entries {
        let entry = entry.with_context(|| {
            format!("failed to read entry in {}", predictions_dir.display())
        })?;
        if !entry.path().is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            found.insert(name.to_string());
        }
    }

    if !requested.is_empty() {
        for name in requested {
            if !found.contains(name) {
                bail!(
                    "model {name} has no prediction directory under {}",
                    predictions_dir.display()
                );
            }
        }
        found.retain(|name| requested.contains(name));
    }

    if found.is_empty() {
        bail!(
            "no model prediction directories found in {}",
            predictions_dir.display()
        );
    }

    Ok(found.into_iter().collect())
}

fn load_model_predictions(
    predictions_dir: &Path,
    name: String,
    ground_truth: &[ExtractionRecord],
) -> Result<ModelPredictions> {
    let model_dir = predictions_dir.join(&name);
    let mut predictions = HashMap::<PosterId, Vec<u8>>::new();
    let mut cost_usd = 0.0_f64;
    let mut seeds = BTreeSet::<u64>::new();

    for record in ground_truth {
        let path = model_dir.join(format!("{}.json", record.poster_id));
        if path.is_file() {
            let bytes = fs::read(&path)
                .with_context(|| format!("failed to read prediction: {}", path.display()))?;
            predictions.insert(record.poster_id.clone(), bytes);
        }

        let meta_path = model_dir.join(format!("{}.meta.json", record.poster_id));
        if let Some(meta) = read_meta(&meta_path) {
            cost_usd += meta.estimated_cost_usd.unwrap_or(0.0);
            seeds.extend(meta.seed);
        }
    }

    info!(
        model = %name,
        predictions = predictions.len(),
        posters = ground_truth.len(),
        "loaded model predictions"
    );

    Ok(ModelPredictions {
        name,
        predictions,
        cost_usd,
        seeds: seeds.into_iter().collect(),
    })
}

fn read_meta(path: &Path) -> Option<PredictionMeta> {
    if !path.is_file() {
        return None;
    }
    match read_json::<PredictionMeta>(path) {
        Ok(meta) => Some(meta),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring unreadable meta file");
            None
        }
    }
}
